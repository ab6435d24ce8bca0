//! Client registrations: static OAuth 2.0 client descriptors keyed by registration id.
//!
//! A [`ClientRegistration`] names the token endpoint, the client credentials, and the
//! grant the client uses. Registrations are built once (programmatically through
//! [`ClientRegistrationBuilder`] or from [`crate::config`]) and looked up at request time
//! through a [`ClientRegistrationRepository`].

/// Builder API for assembling registrations.
pub mod builder;
/// Grant type labels.
pub mod grant;
/// Registration lookup contract and the in-memory repository.
pub mod repository;

pub use builder::*;
pub use grant::*;
pub use repository::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet, TokenSecret},
};

/// Immutable OAuth 2.0 client descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
	/// Unique key of the registration.
	pub registration_id: RegistrationId,
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// Client secret used for HTTP Basic authentication at the token endpoint.
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint.
	pub token_uri: Url,
	/// Grant the client performs.
	pub authorization_grant_type: AuthorizationGrantType,
	/// Scopes requested during token acquisition; empty means none are sent.
	#[serde(default)]
	pub scopes: ScopeSet,
}
impl ClientRegistration {
	/// Creates a new builder for the provided identifier.
	pub fn builder(registration_id: RegistrationId) -> ClientRegistrationBuilder {
		ClientRegistrationBuilder::new(registration_id)
	}

	/// Checks whether the registration performs the given grant.
	pub fn uses(&self, grant: AuthorizationGrantType) -> bool {
		self.authorization_grant_type == grant
	}
}
