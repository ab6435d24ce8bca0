//! Attribute-carrying requests.
//!
//! Every outbound request travels through the interceptor chain together with a snapshot of
//! [`RequestAttributes`]. The well-known attributes are typed fields; caller-defined
//! attributes live in string maps. A request never exposes a way to change its attributes
//! after construction.

// std
use std::mem;
// crates.io
use oauth2::{
	HttpRequest,
	http::{HeaderMap, Method, Uri},
};
// self
use crate::{
	_prelude::*,
	auth::{Principal, RegistrationId},
	error::ConfigError,
	registration::ClientRegistrationRepository,
	store::AuthorizedClientStore,
};

/// Names of the attributes the standard interceptors understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeName {
	/// Registry used to resolve client registrations. Shared.
	ClientRegistrationRepository,
	/// Store holding authorized clients. Shared.
	AuthorizedClientService,
	/// Registration to authorize the request with. Per request.
	ClientRegistrationIdentifier,
	/// Resource owner the request acts for. Per request.
	ResourceOwnerPrincipal,
}
impl AttributeName {
	/// Every well-known name, in a stable order.
	pub const ALL: [AttributeName; 4] = [
		AttributeName::ClientRegistrationRepository,
		AttributeName::AuthorizedClientService,
		AttributeName::ClientRegistrationIdentifier,
		AttributeName::ResourceOwnerPrincipal,
	];

	/// Stable label of the attribute.
	pub const fn as_str(self) -> &'static str {
		match self {
			AttributeName::ClientRegistrationRepository => "CLIENT_REGISTRATION_REPOSITORY",
			AttributeName::AuthorizedClientService => "AUTHORIZED_CLIENT_SERVICE",
			AttributeName::ClientRegistrationIdentifier => "CLIENT_REGISTRATION_IDENTIFIER",
			AttributeName::ResourceOwnerPrincipal => "RESOURCE_OWNER_PRINCIPAL",
		}
	}

	/// Returns true for attributes that are captured from the shared layer.
	pub const fn is_shared(self) -> bool {
		matches!(
			self,
			AttributeName::ClientRegistrationRepository | AttributeName::AuthorizedClientService
		)
	}
}
impl Display for AttributeName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AttributeName {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		AttributeName::ALL.into_iter().find(|name| name.as_str() == s).ok_or(())
	}
}

/// Borrowed view of an attribute value.
#[derive(Clone, Copy)]
pub enum AttributeValue<'a> {
	/// Value of [`AttributeName::ClientRegistrationRepository`].
	Registrations(&'a Arc<dyn ClientRegistrationRepository>),
	/// Value of [`AttributeName::AuthorizedClientService`].
	Store(&'a Arc<dyn AuthorizedClientStore>),
	/// Value of [`AttributeName::ClientRegistrationIdentifier`].
	RegistrationId(&'a RegistrationId),
	/// Value of [`AttributeName::ResourceOwnerPrincipal`].
	Principal(&'a Principal),
	/// Caller-defined attribute.
	Text(&'a str),
}
impl Debug for AttributeValue<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			AttributeValue::Registrations(_) => f.write_str("Registrations(..)"),
			AttributeValue::Store(_) => f.write_str("Store(..)"),
			AttributeValue::RegistrationId(id) => f.debug_tuple("RegistrationId").field(id).finish(),
			AttributeValue::Principal(principal) =>
				f.debug_tuple("Principal").field(principal).finish(),
			AttributeValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
		}
	}
}

/// Shared and per-request attributes attached to an outbound request.
#[derive(Clone, Default)]
pub struct RequestAttributes {
	registrations: Option<Arc<dyn ClientRegistrationRepository>>,
	store: Option<Arc<dyn AuthorizedClientStore>>,
	shared_extra: BTreeMap<String, String>,
	registration_id: Option<RegistrationId>,
	principal: Option<Principal>,
	request_extra: BTreeMap<String, String>,
}
impl RequestAttributes {
	/// Sets the shared registration repository.
	pub fn with_registrations(mut self, registrations: Arc<dyn ClientRegistrationRepository>) -> Self {
		self.registrations = Some(registrations);

		self
	}

	/// Sets the shared authorized client store.
	pub fn with_store(mut self, store: Arc<dyn AuthorizedClientStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Sets the registration the request is authorized with.
	pub fn with_registration_id(mut self, registration_id: RegistrationId) -> Self {
		self.registration_id = Some(registration_id);

		self
	}

	/// Sets the resource owner.
	pub fn with_principal(mut self, principal: Principal) -> Self {
		self.principal = Some(principal);

		self
	}

	/// Adds a caller-defined per-request attribute.
	pub fn with_extra(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Result<Self, ConfigError> {
		self.insert_request_extra(name.into(), value.into())?;

		Ok(self)
	}

	/// Shared registration repository, if configured.
	pub fn registrations(&self) -> Option<&Arc<dyn ClientRegistrationRepository>> {
		self.registrations.as_ref()
	}

	/// Shared authorized client store, if configured.
	pub fn store(&self) -> Option<&Arc<dyn AuthorizedClientStore>> {
		self.store.as_ref()
	}

	/// Registration identifier, if configured.
	pub fn registration_id(&self) -> Option<&RegistrationId> {
		self.registration_id.as_ref()
	}

	/// Resource owner, if configured.
	pub fn principal(&self) -> Option<&Principal> {
		self.principal.as_ref()
	}

	/// Caller-defined attribute; per-request values shadow shared ones.
	pub fn extra(&self, name: &str) -> Option<&str> {
		self.request_extra.get(name).or_else(|| self.shared_extra.get(name)).map(String::as_str)
	}

	/// Registration repository or [`ConfigError::MissingAttribute`].
	pub fn require_registrations(
		&self,
	) -> Result<&Arc<dyn ClientRegistrationRepository>, ConfigError> {
		self.registrations.as_ref().ok_or_else(|| missing(AttributeName::ClientRegistrationRepository))
	}

	/// Authorized client store or [`ConfigError::MissingAttribute`].
	pub fn require_store(&self) -> Result<&Arc<dyn AuthorizedClientStore>, ConfigError> {
		self.store.as_ref().ok_or_else(|| missing(AttributeName::AuthorizedClientService))
	}

	/// Registration identifier or [`ConfigError::MissingAttribute`].
	pub fn require_registration_id(&self) -> Result<&RegistrationId, ConfigError> {
		self.registration_id.as_ref().ok_or_else(|| missing(AttributeName::ClientRegistrationIdentifier))
	}

	/// Looks up any attribute by name.
	pub fn attribute(&self, name: &str) -> Option<AttributeValue<'_>> {
		match name.parse::<AttributeName>() {
			Ok(AttributeName::ClientRegistrationRepository) =>
				self.registrations.as_ref().map(AttributeValue::Registrations),
			Ok(AttributeName::AuthorizedClientService) =>
				self.store.as_ref().map(AttributeValue::Store),
			Ok(AttributeName::ClientRegistrationIdentifier) =>
				self.registration_id.as_ref().map(AttributeValue::RegistrationId),
			Ok(AttributeName::ResourceOwnerPrincipal) =>
				self.principal.as_ref().map(AttributeValue::Principal),
			Err(()) => self.extra(name).map(AttributeValue::Text),
		}
	}

	/// Names of every populated attribute, well-known names first.
	pub fn attribute_names(&self) -> Vec<&str> {
		let mut names = AttributeName::ALL
			.into_iter()
			.filter(|name| self.attribute(name.as_str()).is_some())
			.map(AttributeName::as_str)
			.collect::<Vec<_>>();
		let extras = self
			.shared_extra
			.keys()
			.chain(self.request_extra.keys().filter(|name| !self.shared_extra.contains_key(*name)))
			.map(String::as_str);

		names.extend(extras);

		names
	}

	pub(crate) fn insert_shared_extra(
		&mut self,
		name: String,
		value: String,
	) -> Result<(), ConfigError> {
		validate_name(&name)?;
		self.shared_extra.insert(name, value);

		Ok(())
	}

	pub(crate) fn insert_request_extra(
		&mut self,
		name: String,
		value: String,
	) -> Result<(), ConfigError> {
		validate_name(&name)?;
		self.request_extra.insert(name, value);

		Ok(())
	}

	pub(crate) fn set_registrations(&mut self, registrations: Arc<dyn ClientRegistrationRepository>) {
		self.registrations = Some(registrations);
	}

	pub(crate) fn set_store(&mut self, store: Arc<dyn AuthorizedClientStore>) {
		self.store = Some(store);
	}

	pub(crate) fn set_registration_id(&mut self, registration_id: RegistrationId) {
		self.registration_id = Some(registration_id);
	}

	pub(crate) fn set_principal(&mut self, principal: Principal) {
		self.principal = Some(principal);
	}

	/// Returns a copy of every attribute and clears the per-request layer in place.
	pub(crate) fn take_snapshot(&mut self) -> Self {
		Self {
			registrations: self.registrations.clone(),
			store: self.store.clone(),
			shared_extra: self.shared_extra.clone(),
			registration_id: self.registration_id.take(),
			principal: self.principal.take(),
			request_extra: mem::take(&mut self.request_extra),
		}
	}
}
impl Debug for RequestAttributes {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestAttributes")
			.field("registrations", &self.registrations.is_some())
			.field("store", &self.store.is_some())
			.field("registration_id", &self.registration_id)
			.field("principal", &self.principal)
			.field("shared_extra", &self.shared_extra)
			.field("request_extra", &self.request_extra)
			.finish()
	}
}

/// HTTP request paired with an immutable attribute snapshot.
#[derive(Debug)]
pub struct AttributedRequest {
	inner: HttpRequest,
	attributes: RequestAttributes,
}
impl AttributedRequest {
	/// Pairs `request` with `attributes`.
	pub fn new(request: HttpRequest, attributes: RequestAttributes) -> Self {
		Self { inner: request, attributes }
	}

	/// Request method.
	pub fn method(&self) -> &Method {
		self.inner.method()
	}

	/// Request URI.
	pub fn uri(&self) -> &Uri {
		self.inner.uri()
	}

	/// Request headers.
	pub fn headers(&self) -> &HeaderMap {
		self.inner.headers()
	}

	/// Mutable request headers.
	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		self.inner.headers_mut()
	}

	/// Request body.
	pub fn body(&self) -> &[u8] {
		self.inner.body()
	}

	/// Mutable request body.
	pub fn body_mut(&mut self) -> &mut Vec<u8> {
		self.inner.body_mut()
	}

	/// Attribute snapshot captured when the request was built.
	pub fn attributes(&self) -> &RequestAttributes {
		&self.attributes
	}

	/// Shorthand for [`RequestAttributes::attribute`].
	pub fn attribute(&self, name: &str) -> Option<AttributeValue<'_>> {
		self.attributes.attribute(name)
	}

	/// Unwraps the HTTP request, dropping the attributes.
	pub fn into_inner(self) -> HttpRequest {
		self.inner
	}
}

fn missing(name: AttributeName) -> ConfigError {
	ConfigError::MissingAttribute { name: name.as_str() }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
	if name.trim().is_empty() {
		return Err(ConfigError::EmptyAttributeName);
	}

	Ok(())
}
