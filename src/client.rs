//! Client construction and request execution.
//!
//! [`OAuth2ClientBuilder`] collects the shared attributes (registration repository,
//! authorized client store), the interceptor list, and per-call attributes (registration
//! id, resource owner). [`OAuth2ClientBuilder::build`] snapshots all of them into an
//! [`OAuth2Client`] and then clears the per-call layer, so one builder can mint clients for
//! different registrations without leaking state between them.
//!
//! ```no_run
//! # async fn demo(
//! # 	repository: std::sync::Arc<dyn oauth2_outbound::registration::ClientRegistrationRepository>,
//! # 	store: std::sync::Arc<dyn oauth2_outbound::store::AuthorizedClientStore>,
//! # ) -> oauth2_outbound::error::Result<()> {
//! use oauth2_outbound::{auth::RegistrationId, client::OAuth2ClientBuilder, error::ConfigError};
//!
//! let mut builder = OAuth2ClientBuilder::new();
//!
//! builder.registrations(repository).authorized_client_store(store).standard_interceptors();
//!
//! let registration_id = RegistrationId::new("general-messaging").map_err(ConfigError::from)?;
//! let client = builder.registration_id(registration_id).build();
//! let response = client.get("https://api.example.com/messages").send().await?;
//!
//! assert!(response.status().is_success());
//! # Ok(())
//! # }
//! ```

// crates.io
use oauth2::{
	HttpResponse,
	http::{
		HeaderName, HeaderValue, Method, Request,
		header::ACCEPT,
		request::Builder as RequestBuilder,
	},
};
use serde::de::DeserializeOwned;
// self
#[cfg(feature = "reqwest")]
use crate::http::{MappedTransport, ReqwestHttpClient, ReqwestTransportErrorMapper};
use crate::{
	_prelude::*,
	auth::{Principal, PrincipalResolver, RegistrationId},
	chain::{Interceptor, Next},
	error::{ConfigError, TransportError},
	http::{Dispatcher, parse_retry_after},
	interceptor,
	registration::ClientRegistrationRepository,
	request::{AttributedRequest, RequestAttributes},
	store::AuthorizedClientStore,
};

/// Mutable factory for [`OAuth2Client`] values.
pub struct OAuth2ClientBuilder {
	dispatcher: Arc<dyn Dispatcher>,
	interceptors: Vec<Arc<dyn Interceptor>>,
	attributes: RequestAttributes,
	resolver: Option<PrincipalResolver>,
}
impl OAuth2ClientBuilder {
	/// Creates a builder backed by a default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn new() -> Self {
		Self::with_reqwest_client(ReqwestClient::default())
	}

	/// Creates a builder backed by the provided reqwest client.
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest_client(client: ReqwestClient) -> Self {
		Self::with_dispatcher(Arc::new(MappedTransport::new(
			ReqwestHttpClient::with_client(client),
			ReqwestTransportErrorMapper,
		)))
	}

	/// Creates a builder that sends every request through `dispatcher`.
	pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>) -> Self {
		Self {
			dispatcher,
			interceptors: Vec::new(),
			attributes: RequestAttributes::default(),
			resolver: None,
		}
	}

	/// Sets the shared registration repository.
	pub fn registrations(
		&mut self,
		registrations: Arc<dyn ClientRegistrationRepository>,
	) -> &mut Self {
		self.attributes.set_registrations(registrations);

		self
	}

	/// Sets the shared authorized client store.
	pub fn authorized_client_store(&mut self, store: Arc<dyn AuthorizedClientStore>) -> &mut Self {
		self.attributes.set_store(store);

		self
	}

	/// Adds a caller-defined attribute copied into every client built afterwards.
	pub fn shared_attribute(
		&mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Result<&mut Self, ConfigError> {
		self.attributes.insert_shared_extra(name.into(), value.into())?;

		Ok(self)
	}

	/// Appends one interceptor to the chain.
	pub fn interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
		self.interceptors.push(interceptor);

		self
	}

	/// Replaces the chain with `interceptors`, run in the given order.
	pub fn interceptors(&mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> &mut Self {
		self.interceptors = interceptors;

		self
	}

	/// Replaces the chain with [`interceptor::standard_chain`] over this builder's dispatcher.
	pub fn standard_interceptors(&mut self) -> &mut Self {
		self.interceptors = interceptor::standard_chain(self.dispatcher.clone());

		self
	}

	/// Sets the registration for the next built client.
	pub fn registration_id(&mut self, registration_id: RegistrationId) -> &mut Self {
		self.attributes.set_registration_id(registration_id);

		self
	}

	/// Sets the resource owner for the next built client.
	pub fn resource_owner(&mut self, principal: Principal) -> &mut Self {
		self.attributes.set_principal(principal);

		self
	}

	/// Supplies the placeholder identity for clients built without a resource owner.
	///
	/// The placeholder is written into each snapshot, so every interceptor in the chain
	/// resolves the same principal name.
	pub fn principal_resolver(&mut self, resolver: PrincipalResolver) -> &mut Self {
		self.resolver = Some(resolver);

		self
	}

	/// Adds a caller-defined attribute for the next built client.
	pub fn request_attribute(
		&mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Result<&mut Self, ConfigError> {
		self.attributes.insert_request_extra(name.into(), value.into())?;

		Ok(self)
	}

	/// Read-only view of the attributes the next client will capture.
	pub fn attributes(&self) -> &RequestAttributes {
		&self.attributes
	}

	/// Captures the current attributes and interceptors, then clears per-call attributes.
	pub fn build(&mut self) -> OAuth2Client {
		let mut attributes = self.attributes.take_snapshot();

		let placeholder = match (&self.resolver, attributes.principal()) {
			(Some(resolver), None) => Some(resolver.resolve(None)),
			_ => None,
		};

		if let Some(principal) = placeholder {
			attributes.set_principal(principal);
		}

		OAuth2Client {
			dispatcher: self.dispatcher.clone(),
			interceptors: Arc::from(self.interceptors.clone()),
			attributes,
		}
	}
}
#[cfg(feature = "reqwest")]
impl Default for OAuth2ClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for OAuth2ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2ClientBuilder")
			.field("interceptors", &interceptor_names(&self.interceptors))
			.field("attributes", &self.attributes)
			.field("resolver", &self.resolver)
			.finish_non_exhaustive()
	}
}

/// Immutable client whose requests run through the interceptor chain.
///
/// Cloning is cheap; clones share the transport, the interceptors, and the attribute
/// snapshot.
#[derive(Clone)]
pub struct OAuth2Client {
	dispatcher: Arc<dyn Dispatcher>,
	interceptors: Arc<[Arc<dyn Interceptor>]>,
	attributes: RequestAttributes,
}
impl OAuth2Client {
	/// Attribute snapshot captured at build time.
	pub fn attributes(&self) -> &RequestAttributes {
		&self.attributes
	}

	/// Starts a request with an arbitrary method.
	pub fn request(&self, method: Method, url: impl AsRef<str>) -> PendingRequest<'_> {
		PendingRequest {
			client: self,
			builder: Request::builder().method(method).uri(url.as_ref()),
			body: Vec::new(),
			attributes: self.attributes.clone(),
			error: None,
		}
	}

	/// Starts a `GET` request.
	pub fn get(&self, url: impl AsRef<str>) -> PendingRequest<'_> {
		self.request(Method::GET, url)
	}

	/// Starts a `POST` request.
	pub fn post(&self, url: impl AsRef<str>) -> PendingRequest<'_> {
		self.request(Method::POST, url)
	}

	/// Sends a `GET` request and decodes a successful JSON response body.
	///
	/// Non-success statuses surface as [`TransportError::Status`] for the `resource` endpoint.
	pub async fn get_json<T>(&self, url: impl AsRef<str>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response =
			self.get(url).header(ACCEPT, HeaderValue::from_static("application/json")).send().await?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransportError::Status {
				endpoint: "resource",
				status: status.as_u16(),
				oauth_error: None,
				retry_after: parse_retry_after(response.headers()),
			}
			.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::ResponseDecode { source })
	}

	/// Runs `request` through the interceptor chain and the dispatcher.
	pub async fn execute(&self, request: AttributedRequest) -> Result<HttpResponse> {
		Next::new(&self.interceptors, self.dispatcher.as_ref()).run(request).await
	}
}
impl Debug for OAuth2Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("interceptors", &interceptor_names(&self.interceptors))
			.field("attributes", &self.attributes)
			.finish_non_exhaustive()
	}
}

/// Request under construction; nothing is sent until [`PendingRequest::send`].
pub struct PendingRequest<'c> {
	client: &'c OAuth2Client,
	builder: RequestBuilder,
	body: Vec<u8>,
	attributes: RequestAttributes,
	error: Option<ConfigError>,
}
impl PendingRequest<'_> {
	/// Appends a header.
	pub fn header<K, V>(mut self, name: K, value: V) -> Self
	where
		K: TryInto<HeaderName>,
		<K as TryInto<HeaderName>>::Error: Into<oauth2::http::Error>,
		V: TryInto<HeaderValue>,
		<V as TryInto<HeaderValue>>::Error: Into<oauth2::http::Error>,
	{
		self.builder = self.builder.header(name, value);

		self
	}

	/// Replaces the body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Overrides the registration for this request only.
	pub fn registration_id(mut self, registration_id: RegistrationId) -> Self {
		self.attributes.set_registration_id(registration_id);

		self
	}

	/// Overrides the resource owner for this request only.
	pub fn resource_owner(mut self, principal: Principal) -> Self {
		self.attributes.set_principal(principal);

		self
	}

	/// Adds a caller-defined attribute for this request only.
	///
	/// An invalid name is reported by [`PendingRequest::send`].
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		if let Err(e) = self.attributes.insert_request_extra(name.into(), value.into()) {
			self.error.get_or_insert(e);
		}

		self
	}

	/// Builds the request and runs it through the interceptor chain.
	pub async fn send(self) -> Result<HttpResponse> {
		if let Some(e) = self.error {
			return Err(e.into());
		}

		let request = self.builder.body(self.body).map_err(ConfigError::from)?;

		self.client.execute(AttributedRequest::new(request, self.attributes)).await
	}
}
impl Debug for PendingRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingRequest")
			.field("builder", &self.builder)
			.field("attributes", &self.attributes)
			.finish_non_exhaustive()
	}
}

fn interceptor_names(interceptors: &[Arc<dyn Interceptor>]) -> Vec<&'static str> {
	interceptors.iter().map(|interceptor| interceptor.name()).collect()
}
