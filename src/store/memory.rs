//! Thread-safe in-memory [`AuthorizedClientStore`] for services and tests.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizedClient, Principal, PrincipalName, RegistrationId},
	store::{AuthorizedClientStore, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, AuthorizedClient>>>;

/// Keeps authorized clients in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored authorized clients.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: &StoreMap, client: AuthorizedClient, principal_name: &PrincipalName) {
		let key = StoreKey::new(client.registration_id(), principal_name);

		map.write().insert(key, client);
	}
}
impl AuthorizedClientStore for MemoryStore {
	fn load<'a>(
		&'a self,
		registration_id: &'a RegistrationId,
		principal_name: &'a PrincipalName,
	) -> StoreFuture<'a, Option<AuthorizedClient>> {
		let key = StoreKey::new(registration_id, principal_name);
		let found = self.0.read().get(&key).cloned();

		Box::pin(async move { Ok(found) })
	}

	fn save<'a>(
		&'a self,
		client: AuthorizedClient,
		principal: &'a Principal,
	) -> StoreFuture<'a, ()> {
		Self::save_now(&self.0, client, principal.name());

		Box::pin(async { Ok(()) })
	}

	fn remove<'a>(
		&'a self,
		registration_id: &'a RegistrationId,
		principal_name: &'a PrincipalName,
	) -> StoreFuture<'a, Option<AuthorizedClient>> {
		let key = StoreKey::new(registration_id, principal_name);
		let removed = self.0.write().remove(&key);

		Box::pin(async move { Ok(removed) })
	}
}
