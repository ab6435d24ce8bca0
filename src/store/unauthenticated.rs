//! Authorized-client repository for callers that never carry an authenticated identity.
//!
//! Scheduled jobs and other machine-to-machine callers act on their own behalf. This wrapper
//! maps the missing principal to the configured placeholder and refuses authenticated
//! principals outright.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizedClient, Principal, PrincipalResolver, RegistrationId},
	error::PrecheckViolation,
	store::AuthorizedClientStore,
};

/// Store facade that only accepts absent or anonymous principals.
#[derive(Clone)]
pub struct UnauthenticatedClientRepository {
	store: Arc<dyn AuthorizedClientStore>,
	resolver: PrincipalResolver,
}
impl UnauthenticatedClientRepository {
	/// Wraps `store`, substituting the default `unauthenticatedPrincipal` placeholder.
	pub fn new(store: Arc<dyn AuthorizedClientStore>) -> Self {
		Self { store, resolver: PrincipalResolver::default() }
	}

	/// Replaces the resolver used for missing principals.
	pub fn with_resolver(mut self, resolver: PrincipalResolver) -> Self {
		self.resolver = resolver;

		self
	}

	/// Underlying store.
	pub fn store(&self) -> &Arc<dyn AuthorizedClientStore> {
		&self.store
	}

	/// Loads the authorized client stored for `registration_id` and the resolved principal.
	pub async fn load(
		&self,
		registration_id: &RegistrationId,
		principal: Option<&Principal>,
	) -> Result<Option<AuthorizedClient>> {
		ensure_unauthenticated(principal)?;

		let principal_name = self.resolver.resolve_name(principal);

		Ok(self.store.load(registration_id, &principal_name).await?)
	}

	/// Saves `client` under the resolved principal.
	pub async fn save(&self, client: AuthorizedClient, principal: Option<&Principal>) -> Result<()> {
		ensure_unauthenticated(principal)?;

		let principal = self.resolver.resolve(principal);

		Ok(self.store.save(client, &principal).await?)
	}

	/// Removes the authorized client stored for `registration_id` and the resolved principal.
	pub async fn remove(
		&self,
		registration_id: &RegistrationId,
		principal: Option<&Principal>,
	) -> Result<Option<AuthorizedClient>> {
		ensure_unauthenticated(principal)?;

		let principal_name = self.resolver.resolve_name(principal);

		Ok(self.store.remove(registration_id, &principal_name).await?)
	}
}
impl Debug for UnauthenticatedClientRepository {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UnauthenticatedClientRepository")
			.field("resolver", &self.resolver)
			.finish_non_exhaustive()
	}
}

fn ensure_unauthenticated(principal: Option<&Principal>) -> Result<(), PrecheckViolation> {
	match principal {
		Some(Principal::Authenticated(principal)) =>
			Err(PrecheckViolation::AuthenticatedPrincipal { name: principal.name.clone() }),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{AccessToken, ClientId, PrincipalName, UNAUTHENTICATED_PRINCIPAL_NAME},
		registration::{AuthorizationGrantType, ClientRegistration},
		store::MemoryStore,
	};

	fn authorized_client() -> AuthorizedClient {
		let registration = ClientRegistration::builder(
			RegistrationId::new("messaging").expect("Registration fixture should be valid."),
		)
		.client_id(ClientId::new("messaging-client").expect("Client fixture should be valid."))
		.client_secret("secret")
		.token_uri(Url::parse("https://auth.example.com/token").expect("Token URI should parse."))
		.authorization_grant_type(AuthorizationGrantType::ClientCredentials)
		.build()
		.expect("Registration fixture should build.");

		AuthorizedClient::new(
			registration,
			PrincipalName::new(UNAUTHENTICATED_PRINCIPAL_NAME)
				.expect("Placeholder name should be valid."),
			AccessToken::builder("abc").bearer().build().expect("Token fixture should build."),
		)
	}

	#[tokio::test]
	async fn missing_principal_uses_placeholder_key() {
		let backend = Arc::new(MemoryStore::default());
		let repository = UnauthenticatedClientRepository::new(backend.clone());
		let registration_id =
			RegistrationId::new("messaging").expect("Registration fixture should be valid.");

		repository.save(authorized_client(), None).await.expect("Anonymous save should succeed.");

		let placeholder = PrincipalName::new(UNAUTHENTICATED_PRINCIPAL_NAME)
			.expect("Placeholder name should be valid.");

		assert!(
			backend
				.load(&registration_id, &placeholder)
				.await
				.expect("Backend load should succeed.")
				.is_some()
		);
		assert!(
			repository
				.load(&registration_id, None)
				.await
				.expect("Anonymous load should succeed.")
				.is_some()
		);
		assert!(
			repository
				.remove(&registration_id, None)
				.await
				.expect("Anonymous remove should succeed.")
				.is_some()
		);
		assert!(backend.is_empty());
	}

	#[tokio::test]
	async fn authenticated_principals_are_rejected() {
		let repository = UnauthenticatedClientRepository::new(Arc::new(MemoryStore::default()));
		let registration_id =
			RegistrationId::new("messaging").expect("Registration fixture should be valid.");
		let joe = Principal::authenticated(
			PrincipalName::new("joe").expect("Principal fixture should be valid."),
		);
		let err = repository
			.load(&registration_id, Some(&joe))
			.await
			.expect_err("Authenticated principals must be rejected.");

		assert!(matches!(err, Error::Precheck(PrecheckViolation::AuthenticatedPrincipal { .. })));
		assert!(err.to_string().contains("should not be authenticated"));

		let err = repository
			.save(authorized_client(), Some(&joe))
			.await
			.expect_err("Authenticated principals must be rejected on save.");

		assert!(matches!(err, Error::Precheck(_)));

		let guest = Principal::anonymous(
			PrincipalName::new("guest").expect("Principal fixture should be valid."),
		);

		assert!(
			repository
				.load(&registration_id, Some(&guest))
				.await
				.expect("Anonymous principals are accepted.")
				.is_none()
		);
	}
}
