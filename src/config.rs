//! Declarative registration configuration loaded from JSON.
//!
//! ```json
//! {
//!   "registrations": {
//!     "general-messaging": {
//!       "client_id": "messaging-client",
//!       "client_secret": "secret",
//!       "token_uri": "https://auth.example.com/oauth2/token",
//!       "authorization_grant_type": "client_credentials",
//!       "scopes": ["message.read", "message.write"]
//!     }
//!   }
//! }
//! ```
//!
//! Every entry passes through [`ClientRegistrationBuilder`](crate::registration::ClientRegistrationBuilder),
//! so documents are held to the same validation as programmatic registrations.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet},
	error::ConfigError,
	registration::{AuthorizationGrantType, ClientRegistration, InMemoryClientRegistrationRepository},
};

/// Top-level configuration document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationsConfig {
	/// Registrations keyed by registration id.
	#[serde(default)]
	pub registrations: BTreeMap<RegistrationId, RegistrationConfig>,
}
impl RegistrationsConfig {
	/// Parses a JSON document, reporting the path of the first invalid field.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(document);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::InvalidDocument { source })
	}

	/// Parses a JSON document from raw bytes.
	pub fn from_json_slice(document: &[u8]) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_slice(document);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::InvalidDocument { source })
	}

	/// Validates every entry and returns the resulting registrations in id order.
	pub fn into_registrations(self) -> Result<Vec<ClientRegistration>, ConfigError> {
		self.registrations
			.into_iter()
			.map(|(registration_id, entry)| entry.into_registration(registration_id))
			.collect()
	}

	/// Validates every entry and indexes them in an in-memory repository.
	pub fn into_repository(self) -> Result<InMemoryClientRegistrationRepository, ConfigError> {
		Ok(InMemoryClientRegistrationRepository::new(self.into_registrations()?))
	}
}

/// One registration entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// Client secret; required by the client credentials grant.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// Token endpoint.
	pub token_uri: Url,
	/// Grant the client performs.
	pub authorization_grant_type: AuthorizationGrantType,
	/// Scopes requested during token acquisition.
	#[serde(default)]
	pub scopes: ScopeSet,
}
impl RegistrationConfig {
	fn into_registration(
		self,
		registration_id: RegistrationId,
	) -> Result<ClientRegistration, ConfigError> {
		let mut builder = ClientRegistration::builder(registration_id)
			.client_id(self.client_id)
			.token_uri(self.token_uri)
			.authorization_grant_type(self.authorization_grant_type)
			.scopes(self.scopes);

		if let Some(secret) = self.client_secret {
			builder = builder.client_secret(secret);
		}

		Ok(builder.build()?)
	}
}
