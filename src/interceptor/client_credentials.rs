//! Lazy client credentials token acquisition.
//!
//! Before a request leaves, the interceptor makes sure the store holds an authorized client
//! for the request's registration and principal. A stored client with a live token is
//! reused as-is. Otherwise the registration is resolved, one client credentials exchange is
//! performed, and the result is saved. Concurrent requests for the same key share a
//! single-flight guard, so only the first of them talks to the token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizedClient, PrincipalName, PrincipalResolver, RegistrationId},
	chain::{InterceptFuture, Interceptor, Next},
	error::ConfigError,
	http::Dispatcher,
	oauth,
	obs::{self, InterceptOutcome, InterceptSpan, trace_event},
	registration::AuthorizationGrantType,
	request::{AttributedRequest, RequestAttributes},
	store::{AuthorizedClientStore, StoreKey},
};

const NAME: &str = "client_credentials";

/// Acquires and stores client credentials tokens on demand.
pub struct ClientCredentialsInterceptor {
	dispatcher: Arc<dyn Dispatcher>,
	resolver: PrincipalResolver,
	expiry_skew: Duration,
	flow_guards: Mutex<HashMap<StoreKey, Arc<AsyncMutex<()>>>>,
}
impl ClientCredentialsInterceptor {
	/// Creates an interceptor that sends token requests through `dispatcher`.
	pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
		Self {
			dispatcher,
			resolver: PrincipalResolver::default(),
			expiry_skew: Duration::ZERO,
			flow_guards: Default::default(),
		}
	}

	/// Replaces the resolver used when a request has no principal.
	pub fn with_resolver(mut self, resolver: PrincipalResolver) -> Self {
		self.resolver = resolver;

		self
	}

	/// Treats tokens expiring within `skew` as already expired.
	///
	/// Negative values are clamped to zero.
	pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
		self.expiry_skew = skew.max(Duration::ZERO);

		self
	}

	/// Ensures an authorized client with a live token is stored for the request's key.
	pub async fn authorize(&self, attributes: &RequestAttributes) -> Result<AuthorizedClient> {
		let registration_id = attributes.require_registration_id()?;
		attributes.require_registrations()?;

		let store = attributes.require_store()?;
		let principal_name = self.resolver.resolve_name(attributes.principal());

		if let Some(current) = self.load_live(store.as_ref(), registration_id, &principal_name).await?
		{
			obs::record_intercept_outcome(NAME, InterceptOutcome::CacheHit);
			trace_event!(registration_id = %registration_id, principal = %principal_name, "authorized client reused");

			return Ok(current);
		}

		let key = StoreKey::new(registration_id, &principal_name);
		let guard = self.flow_guard(&key);
		let result = {
			let _singleflight = guard.lock().await;

			self.acquire(attributes, store.as_ref(), registration_id, principal_name).await
		};

		self.release_flow_guard(&key, guard);

		result
	}

	async fn acquire(
		&self,
		attributes: &RequestAttributes,
		store: &dyn AuthorizedClientStore,
		registration_id: &RegistrationId,
		principal_name: PrincipalName,
	) -> Result<AuthorizedClient> {
		// Another request may have finished the exchange while this one waited.
		if let Some(current) = self.load_live(store, registration_id, &principal_name).await? {
			obs::record_intercept_outcome(NAME, InterceptOutcome::CacheHit);

			return Ok(current);
		}

		let registrations = attributes.require_registrations()?;
		let registration = registrations.find_by_registration_id(registration_id).ok_or_else(
			|| ConfigError::UnknownRegistration { registration_id: registration_id.clone() },
		)?;

		if !registration.uses(AuthorizationGrantType::ClientCredentials) {
			return Err(ConfigError::UnsupportedGrant {
				registration_id: registration_id.clone(),
				grant: AuthorizationGrantType::ClientCredentials.as_str(),
			}
			.into());
		}

		let access_token =
			oauth::exchange_client_credentials(self.dispatcher.as_ref(), &registration).await?;

		trace_event!(registration_id = %registration_id, expires_at = ?access_token.expires_at, "access token acquired");

		let principal = self.resolver.resolve(attributes.principal());
		let client = AuthorizedClient::new(registration, principal_name, access_token);

		store.save(client.clone(), &principal).await?;

		Ok(client)
	}

	async fn load_live(
		&self,
		store: &dyn AuthorizedClientStore,
		registration_id: &RegistrationId,
		principal_name: &PrincipalName,
	) -> Result<Option<AuthorizedClient>> {
		// A skew reaching past the supported date range leaves no token live.
		let Some(threshold) = OffsetDateTime::now_utc().checked_add(self.expiry_skew) else {
			return Ok(None);
		};
		let current = store.load(registration_id, principal_name).await?;

		Ok(current.filter(|client| !client.access_token.is_expired_at(threshold)))
	}

	fn flow_guard(&self, key: &StoreKey) -> Arc<AsyncMutex<()>> {
		self.flow_guards
			.lock()
			.entry(key.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone()
	}

	// New handles are only cloned under the map lock, so a count of two (map and `guard`)
	// means nobody else is waiting on this key.
	fn release_flow_guard(&self, key: &StoreKey, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.flow_guards.lock();

		if Arc::strong_count(&guard) == 2 {
			guards.remove(key);
		}
	}
}
impl Interceptor for ClientCredentialsInterceptor {
	fn name(&self) -> &'static str {
		NAME
	}

	fn intercept<'a>(&'a self, request: AttributedRequest, next: Next<'a>) -> InterceptFuture<'a> {
		let span = InterceptSpan::new(NAME, "authorize");

		Box::pin(span.instrument(async move {
			obs::record_intercept_outcome(NAME, InterceptOutcome::Attempt);

			match self.authorize(request.attributes()).await {
				Ok(_) => obs::record_intercept_outcome(NAME, InterceptOutcome::Success),
				Err(e) => {
					obs::record_intercept_outcome(NAME, InterceptOutcome::Failure);

					return Err(e);
				},
			}

			next.run(request).await
		}))
	}
}
impl Debug for ClientCredentialsInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsInterceptor")
			.field("resolver", &self.resolver)
			.field("expiry_skew", &self.expiry_skew)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use oauth2::{HttpRequest, HttpResponse, http::Request};
	// self
	use super::*;
	use crate::{
		auth::{AccessToken, ClientId, Principal},
		http::ResponseFuture,
		registration::{ClientRegistration, InMemoryClientRegistrationRepository},
		store::{MemoryStore, UnauthenticatedClientRepository},
	};

	#[derive(Default)]
	struct TokenEndpoint {
		calls: AtomicUsize,
	}
	impl Dispatcher for TokenEndpoint {
		fn dispatch(&self, _: HttpRequest) -> ResponseFuture<'_> {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			Box::pin(async move {
				tokio::task::yield_now().await;

				Ok(HttpResponse::new(
					format!(r#"{{"access_token":"token-{call}","token_type":"bearer","expires_in":3600}}"#)
						.into_bytes(),
				))
			})
		}
	}

	fn registration(grant: AuthorizationGrantType) -> ClientRegistration {
		ClientRegistration::builder(
			RegistrationId::new("messaging").expect("Registration fixture should be valid."),
		)
		.client_id(ClientId::new("messaging-client").expect("Client fixture should be valid."))
		.client_secret("secret")
		.token_uri(Url::parse("https://auth.example.com/token").expect("Token URI should parse."))
		.authorization_grant_type(grant)
		.build()
		.expect("Registration fixture should build.")
	}

	fn attributes(store: Arc<MemoryStore>, grant: AuthorizationGrantType) -> RequestAttributes {
		RequestAttributes::default()
			.with_registrations(Arc::new(InMemoryClientRegistrationRepository::new([
				registration(grant),
			])))
			.with_store(store)
			.with_registration_id(
				RegistrationId::new("messaging").expect("Registration fixture should be valid."),
			)
	}

	fn placeholder() -> PrincipalName {
		PrincipalName::new("unauthenticatedPrincipal").expect("Placeholder name should be valid.")
	}

	#[tokio::test]
	async fn stores_token_under_placeholder_and_reuses_it() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let store = Arc::new(MemoryStore::default());
		let interceptor = ClientCredentialsInterceptor::new(endpoint.clone());
		let attributes = attributes(store.clone(), AuthorizationGrantType::ClientCredentials);
		let first = interceptor.authorize(&attributes).await.expect("First call should acquire.");
		let second = interceptor.authorize(&attributes).await.expect("Second call should reuse.");

		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
		assert_eq!(first.access_token.value.expose(), "token-1");
		assert_eq!(second.access_token.value.expose(), "token-1");
		assert_eq!(first.principal_name, placeholder());
		assert!(
			UnauthenticatedClientRepository::new(store)
				.load(first.registration_id(), None)
				.await
				.expect("Placeholder lookup should succeed.")
				.is_some()
		);
	}

	#[tokio::test]
	async fn expired_tokens_are_replaced() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let store = Arc::new(MemoryStore::default());
		let stale = AccessToken::builder("stale")
			.bearer()
			.issued_at(OffsetDateTime::now_utc() - Duration::hours(2))
			.expires_in(Duration::hours(1))
			.build()
			.expect("Stale token fixture should build.");
		let placeholder_principal = Principal::anonymous(placeholder());

		store
			.save(
				AuthorizedClient::new(
					registration(AuthorizationGrantType::ClientCredentials),
					placeholder(),
					stale,
				),
				&placeholder_principal,
			)
			.await
			.expect("Seeding the store should succeed.");

		let client = ClientCredentialsInterceptor::new(endpoint.clone())
			.authorize(&attributes(store.clone(), AuthorizationGrantType::ClientCredentials))
			.await
			.expect("Expired token should be re-acquired.");

		assert_eq!(client.access_token.value.expose(), "token-1");
		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
		assert_eq!(store.len(), 1);
	}

	#[tokio::test]
	async fn skew_refreshes_tokens_close_to_expiry() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let store = Arc::new(MemoryStore::default());
		let attributes = attributes(store, AuthorizationGrantType::ClientCredentials);
		let interceptor = ClientCredentialsInterceptor::new(endpoint.clone())
			.with_expiry_skew(Duration::hours(2));

		interceptor.authorize(&attributes).await.expect("First call should acquire.");
		interceptor.authorize(&attributes).await.expect("Second call should re-acquire.");

		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn concurrent_misses_share_one_exchange() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let interceptor = ClientCredentialsInterceptor::new(endpoint.clone());
		let attributes =
			attributes(Arc::new(MemoryStore::default()), AuthorizationGrantType::ClientCredentials);
		let (a, b, c) = tokio::join!(
			interceptor.authorize(&attributes),
			interceptor.authorize(&attributes),
			interceptor.authorize(&attributes),
		);

		for client in [a, b, c] {
			assert_eq!(
				client.expect("Every caller should observe the token.").access_token.value.expose(),
				"token-1"
			);
		}

		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
		assert!(interceptor.flow_guards.lock().is_empty());
	}

	#[tokio::test]
	async fn skew_past_the_date_range_always_exchanges() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let interceptor =
			ClientCredentialsInterceptor::new(endpoint.clone()).with_expiry_skew(Duration::MAX);
		let attributes =
			attributes(Arc::new(MemoryStore::default()), AuthorizationGrantType::ClientCredentials);

		for _ in 0..2 {
			interceptor.authorize(&attributes).await.expect("Exchange should succeed.");
		}

		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
		assert!(interceptor.flow_guards.lock().is_empty());
	}

	#[tokio::test]
	async fn rejects_unknown_registrations_and_foreign_grants() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let interceptor = ClientCredentialsInterceptor::new(endpoint.clone());
		let store = Arc::new(MemoryStore::default());
		let unknown = attributes(store.clone(), AuthorizationGrantType::ClientCredentials)
			.with_registration_id(
				RegistrationId::new("unknown").expect("Registration fixture should be valid."),
			);
		let err = interceptor.authorize(&unknown).await.expect_err("Unknown ids must fail.");

		assert!(matches!(err, Error::Config(ConfigError::UnknownRegistration { .. })));

		let err = interceptor
			.authorize(&attributes(store, AuthorizationGrantType::AuthorizationCode))
			.await
			.expect_err("Registrations for other grants must fail.");

		assert!(matches!(err, Error::Config(ConfigError::UnsupportedGrant { .. })));
		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn missing_attributes_fail_before_any_exchange() {
		let endpoint = Arc::new(TokenEndpoint::default());
		let interceptor = ClientCredentialsInterceptor::new(endpoint.clone());
		let err = interceptor
			.authorize(&RequestAttributes::default())
			.await
			.expect_err("Missing registration id must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingAttribute { name: "CLIENT_REGISTRATION_IDENTIFIER" })
		));

		let inner = Request::builder()
			.uri("https://api.example.com/messages")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(interceptor)];
		let err = Next::new(&interceptors, endpoint.as_ref())
			.run(AttributedRequest::new(inner, RequestAttributes::default()))
			.await
			.expect_err("The chain must stop when authorization fails.");

		assert!(matches!(err, Error::Config(ConfigError::MissingAttribute { .. })));
		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
	}
}
