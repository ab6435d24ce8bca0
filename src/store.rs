//! Storage contracts and built-in stores for authorized clients.

pub mod memory;
pub mod unauthenticated;

pub use memory::MemoryStore;
pub use unauthenticated::UnauthenticatedClientRepository;

// self
use crate::{
	_prelude::*,
	auth::{AuthorizedClient, Principal, PrincipalName, RegistrationId},
};

/// Boxed future returned by [`AuthorizedClientStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for authorized clients keyed by registration id + principal name.
///
/// Implementations must be safe to call concurrently; interceptors share one store across
/// every request built from the same client.
pub trait AuthorizedClientStore
where
	Self: Send + Sync,
{
	/// Fetches the authorized client stored for the key, if any.
	fn load<'a>(
		&'a self,
		registration_id: &'a RegistrationId,
		principal_name: &'a PrincipalName,
	) -> StoreFuture<'a, Option<AuthorizedClient>>;

	/// Persists or replaces the authorized client under its registration id and the name of
	/// `principal`.
	fn save<'a>(&'a self, client: AuthorizedClient, principal: &'a Principal)
	-> StoreFuture<'a, ()>;

	/// Removes the authorized client stored for the key, returning it when present.
	fn remove<'a>(
		&'a self,
		registration_id: &'a RegistrationId,
		principal_name: &'a PrincipalName,
	) -> StoreFuture<'a, Option<AuthorizedClient>>;
}

/// Error type produced by [`AuthorizedClientStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored authorized client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Registration the token was issued for.
	pub registration_id: RegistrationId,
	/// Resource owner the token acts for.
	pub principal_name: PrincipalName,
}
impl StoreKey {
	/// Builds a key from borrowed parts.
	pub fn new(registration_id: &RegistrationId, principal_name: &PrincipalName) -> Self {
		Self { registration_id: registration_id.clone(), principal_name: principal_name.clone() }
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.registration_id, self.principal_name)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn store_keys_distinguish_principals() {
		let registration_id =
			RegistrationId::new("messaging").expect("Registration fixture should be valid.");
		let joe = StoreKey::new(
			&registration_id,
			&PrincipalName::new("joe").expect("Principal fixture should be valid."),
		);
		let placeholder = StoreKey::new(
			&registration_id,
			&PrincipalName::new("unauthenticatedPrincipal")
				.expect("Principal fixture should be valid."),
		);

		assert_ne!(joe, placeholder);
		assert_eq!(joe.to_string(), "messaging/joe");
	}
}
