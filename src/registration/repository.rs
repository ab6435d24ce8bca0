// self
use crate::{_prelude::*, auth::RegistrationId, registration::ClientRegistration};

/// Lookup contract for client registrations.
///
/// Registrations are static configuration, so lookups are synchronous.
pub trait ClientRegistrationRepository
where
	Self: Send + Sync,
{
	/// Returns the registration stored under `registration_id`, if any.
	fn find_by_registration_id(&self, registration_id: &RegistrationId)
	-> Option<ClientRegistration>;
}

/// Registrations held in memory, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct InMemoryClientRegistrationRepository(Arc<HashMap<RegistrationId, ClientRegistration>>);
impl InMemoryClientRegistrationRepository {
	/// Indexes the provided registrations by id; later duplicates replace earlier ones.
	pub fn new(registrations: impl IntoIterator<Item = ClientRegistration>) -> Self {
		Self(Arc::new(
			registrations
				.into_iter()
				.map(|registration| (registration.registration_id.clone(), registration))
				.collect(),
		))
	}

	/// Number of registrations.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no registrations are configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over every registration.
	pub fn iter(&self) -> impl Iterator<Item = &ClientRegistration> {
		self.0.values()
	}
}
impl ClientRegistrationRepository for InMemoryClientRegistrationRepository {
	fn find_by_registration_id(
		&self,
		registration_id: &RegistrationId,
	) -> Option<ClientRegistration> {
		self.0.get(registration_id).cloned()
	}
}
