//! Authorized client: a registration, a resource owner, and the token issued for them.

// self
use crate::{
	_prelude::*,
	auth::{PrincipalName, RegistrationId, token::access::AccessToken},
	registration::ClientRegistration,
};

/// Runtime pairing of a client registration, a principal name, and an access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizedClient {
	/// Registration the token was issued for.
	pub registration: ClientRegistration,
	/// Name of the resource owner the token acts for.
	pub principal_name: PrincipalName,
	/// Issued access token.
	pub access_token: AccessToken,
}
impl AuthorizedClient {
	/// Creates a new authorized client.
	pub fn new(
		registration: ClientRegistration,
		principal_name: PrincipalName,
		access_token: AccessToken,
	) -> Self {
		Self { registration, principal_name, access_token }
	}

	/// Registration identifier half of the store key.
	pub fn registration_id(&self) -> &RegistrationId {
		&self.registration.registration_id
	}
}
