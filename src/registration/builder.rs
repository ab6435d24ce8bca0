// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet, TokenSecret},
	registration::{AuthorizationGrantType, ClientRegistration},
};

/// Errors raised while constructing or validating registrations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ClientRegistrationError {
	/// A client identifier is mandatory.
	#[error("Registration `{registration_id}` is missing a client id.")]
	MissingClientId {
		/// Registration being built.
		registration_id: RegistrationId,
	},
	/// The token endpoint is mandatory.
	#[error("Registration `{registration_id}` is missing a token URI.")]
	MissingTokenUri {
		/// Registration being built.
		registration_id: RegistrationId,
	},
	/// A grant type is mandatory.
	#[error("Registration `{registration_id}` is missing an authorization grant type.")]
	MissingGrantType {
		/// Registration being built.
		registration_id: RegistrationId,
	},
	/// Confidential grants need a client secret for HTTP Basic authentication.
	#[error("Registration `{registration_id}` requires a client secret for the {grant} grant.")]
	MissingClientSecret {
		/// Registration being built.
		registration_id: RegistrationId,
		/// Grant label.
		grant: &'static str,
	},
	/// The token endpoint must be an HTTP(S) URL.
	#[error("The token URI must use http or https: {url}.")]
	UnsupportedScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ClientRegistration`] values.
#[derive(Debug)]
pub struct ClientRegistrationBuilder {
	/// Identifier for the registration being constructed.
	pub registration_id: RegistrationId,
	/// OAuth 2.0 client identifier.
	pub client_id: Option<ClientId>,
	/// Client secret.
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint.
	pub token_uri: Option<Url>,
	/// Grant the client performs.
	pub authorization_grant_type: Option<AuthorizationGrantType>,
	/// Scopes requested during token acquisition.
	pub scopes: ScopeSet,
}
impl ClientRegistrationBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(registration_id: RegistrationId) -> Self {
		Self {
			registration_id,
			client_id: None,
			client_secret: None,
			token_uri: None,
			authorization_grant_type: None,
			scopes: ScopeSet::default(),
		}
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the token endpoint.
	pub fn token_uri(mut self, url: Url) -> Self {
		self.token_uri = Some(url);

		self
	}

	/// Sets the grant type.
	pub fn authorization_grant_type(mut self, grant: AuthorizationGrantType) -> Self {
		self.authorization_grant_type = Some(grant);

		self
	}

	/// Sets the scopes requested during token acquisition.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Consumes the builder and validates the resulting registration.
	pub fn build(self) -> Result<ClientRegistration, ClientRegistrationError> {
		let registration_id = self.registration_id;
		let Some(client_id) = self.client_id else {
			return Err(ClientRegistrationError::MissingClientId { registration_id });
		};
		let Some(token_uri) = self.token_uri else {
			return Err(ClientRegistrationError::MissingTokenUri { registration_id });
		};
		let Some(authorization_grant_type) = self.authorization_grant_type else {
			return Err(ClientRegistrationError::MissingGrantType { registration_id });
		};
		let registration = ClientRegistration {
			registration_id,
			client_id,
			client_secret: self.client_secret.filter(|secret| !secret.is_empty()),
			token_uri,
			authorization_grant_type,
			scopes: self.scopes,
		};

		registration.validate()?;

		Ok(registration)
	}
}

impl ClientRegistration {
	/// Validates invariants for the registration.
	pub(crate) fn validate(&self) -> Result<(), ClientRegistrationError> {
		if !matches!(self.token_uri.scheme(), "http" | "https") {
			return Err(ClientRegistrationError::UnsupportedScheme {
				url: self.token_uri.to_string(),
			});
		}
		if self.uses(AuthorizationGrantType::ClientCredentials) && self.client_secret.is_none() {
			return Err(ClientRegistrationError::MissingClientSecret {
				registration_id: self.registration_id.clone(),
				grant: AuthorizationGrantType::ClientCredentials.as_str(),
			});
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder() -> ClientRegistrationBuilder {
		ClientRegistration::builder(
			RegistrationId::new("general-messaging").expect("Registration fixture should be valid."),
		)
		.client_id(ClientId::new("messaging-client").expect("Client fixture should be valid."))
		.token_uri(Url::parse("https://auth.example.com/token").expect("Token URI should parse."))
		.authorization_grant_type(AuthorizationGrantType::ClientCredentials)
	}

	#[test]
	fn builds_client_credentials_registration() {
		let registration =
			builder().client_secret("secret").build().expect("Registration should build.");

		assert!(registration.uses(AuthorizationGrantType::ClientCredentials));
		assert_eq!(registration.client_id.as_ref(), "messaging-client");
		assert!(registration.scopes.is_empty());
		assert!(!format!("{registration:?}").contains("\"secret\""));
	}

	#[test]
	fn client_credentials_require_a_secret() {
		let err = builder()
			.client_secret("")
			.build()
			.expect_err("Empty secrets must not satisfy the client credentials grant.");

		assert!(matches!(err, ClientRegistrationError::MissingClientSecret { .. }));
	}

	#[test]
	fn rejects_missing_fields_and_foreign_schemes() {
		let registration_id =
			RegistrationId::new("incomplete").expect("Registration fixture should be valid.");
		let err = ClientRegistration::builder(registration_id)
			.build()
			.expect_err("Builder should reject a missing client id.");

		assert!(matches!(err, ClientRegistrationError::MissingClientId { .. }));

		let err = builder()
			.client_secret("secret")
			.token_uri(Url::parse("ftp://auth.example.com/token").expect("URL should parse."))
			.build()
			.expect_err("Builder should reject non-HTTP token endpoints.");

		assert!(matches!(err, ClientRegistrationError::UnsupportedScheme { .. }));
	}
}
