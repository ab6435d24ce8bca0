// crates.io
use httpmock::prelude::*;
use oauth2_outbound::oauth2::{
	HttpResponse,
	http::{HeaderValue, StatusCode},
};
// self
use oauth2_outbound::{
	_preludet::*,
	auth::{AnonymousPrincipal, PrincipalName, PrincipalResolver, RegistrationId},
	chain::{InterceptFuture, Interceptor, Next},
	client::OAuth2ClientBuilder,
	error::PrecheckViolation,
	interceptor::{BearerTokenInterceptor, ClientCredentialsInterceptor},
	request::AttributedRequest,
	store::{AuthorizedClientStore, MemoryStore},
};

/// Copies the `tenant` attribute into a header so the resource server can see it.
struct TenantHeader;
impl Interceptor for TenantHeader {
	fn name(&self) -> &'static str {
		"tenant_header"
	}

	fn intercept<'a>(&'a self, mut request: AttributedRequest, next: Next<'a>) -> InterceptFuture<'a> {
		if let Some(tenant) =
			request.attributes().extra("tenant").and_then(|value| HeaderValue::from_str(value).ok())
		{
			request.headers_mut().insert("x-tenant", tenant);
		}

		next.run(request)
	}
}

/// Answers every request locally.
struct Offline;
impl Interceptor for Offline {
	fn name(&self) -> &'static str {
		"offline"
	}

	fn intercept<'a>(&'a self, _: AttributedRequest, _: Next<'a>) -> InterceptFuture<'a> {
		Box::pin(async {
			let mut response = HttpResponse::new(b"offline".to_vec());

			*response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;

			Ok(response)
		})
	}
}

fn registration_id() -> RegistrationId {
	RegistrationId::new("general-messaging").expect("Registration identifier should be valid.")
}

fn builder_with(server: &MockServer) -> OAuth2ClientBuilder {
	let registration = test_registration(
		"general-messaging",
		"messaging-client",
		"messaging-secret",
		&server.url("/oauth2/token"),
	);
	let (builder, _store) = build_reqwest_test_builder([registration]);

	builder
}

#[tokio::test]
async fn custom_interceptors_see_request_attributes() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"token_type\":\"bearer\"}");
		})
		.await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/messages")
				.header("authorization", "Bearer abc")
				.header("x-tenant", "acme");
			then.status(200).body("[]");
		})
		.await;
	let mut builder = builder_with(&server);

	builder
		.interceptor(Arc::new(TenantHeader))
		.shared_attribute("tenant", "acme")
		.expect("Non-empty attribute names are accepted.");

	let client = builder.registration_id(registration_id()).build();

	client.get(server.url("/messages")).send().await.expect("Request should succeed.");

	token.assert_calls_async(1).await;
	messages.assert_calls_async(1).await;
}

#[tokio::test]
async fn short_circuit_keeps_requests_off_the_network() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).body("{\"access_token\":\"abc\",\"token_type\":\"bearer\"}");
		})
		.await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages");
			then.status(200);
		})
		.await;
	let mut builder = builder_with(&server);

	builder.interceptors(vec![Arc::new(Offline)]);

	let response = builder
		.registration_id(registration_id())
		.build()
		.get(server.url("/messages"))
		.send()
		.await
		.expect("Short-circuit responses are returned to the caller.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(response.body().as_slice(), b"offline");

	token.assert_calls_async(0).await;
	messages.assert_calls_async(0).await;
}

#[tokio::test]
async fn bearer_without_acquisition_is_a_precheck_violation() {
	let server = MockServer::start_async().await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages");
			then.status(200);
		})
		.await;
	let mut builder = builder_with(&server);

	builder.interceptors(vec![Arc::new(BearerTokenInterceptor::default())]);

	let err = builder
		.registration_id(registration_id())
		.build()
		.get(server.url("/messages"))
		.send()
		.await
		.expect_err("Bearer injection needs a stored authorized client.");

	assert!(matches!(err, Error::Precheck(PrecheckViolation::MissingAuthorizedClient { .. })));

	messages.assert_calls_async(0).await;
}

#[tokio::test]
async fn unrecognized_token_type_is_not_sent_as_bearer() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"token_type\":\"mac\"}");
		})
		.await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages");
			then.status(200);
		})
		.await;
	let err = builder_with(&server)
		.registration_id(registration_id())
		.build()
		.get(server.url("/messages"))
		.send()
		.await
		.expect_err("Unrecognized token types must not be presented as bearer tokens.");

	assert!(matches!(err, Error::Precheck(PrecheckViolation::UnsupportedTokenType { .. })));

	token.assert_calls_async(1).await;
	messages.assert_calls_async(0).await;
}

#[tokio::test]
async fn acquisition_order_matters() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"token_type\":\"bearer\"}");
		})
		.await;
	let dispatcher = test_dispatcher();
	let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());
	let mut builder = OAuth2ClientBuilder::with_dispatcher(dispatcher.clone());

	builder
		.registrations(Arc::new(
			oauth2_outbound::registration::InMemoryClientRegistrationRepository::new([
				test_registration(
					"general-messaging",
					"messaging-client",
					"messaging-secret",
					&server.url("/oauth2/token"),
				),
			]),
		))
		.authorized_client_store(store.clone())
		.interceptors(vec![
			Arc::new(BearerTokenInterceptor::default()),
			Arc::new(ClientCredentialsInterceptor::new(dispatcher)),
		]);

	let err = builder
		.registration_id(registration_id())
		.build()
		.get(server.url("/messages"))
		.send()
		.await
		.expect_err("Bearer injection before acquisition must fail.");

	assert!(matches!(err, Error::Precheck(PrecheckViolation::MissingAuthorizedClient { .. })));
	assert!(store.is_empty());

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn custom_placeholder_principal_flows_through_the_standard_chain() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"token_type\":\"bearer\"}");
		})
		.await;
	let messages = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages").header("authorization", "Bearer abc");
			then.status(200).body("[]");
		})
		.await;
	let registration = test_registration(
		"general-messaging",
		"messaging-client",
		"messaging-secret",
		&server.url("/oauth2/token"),
	);
	let (mut builder, store) = build_reqwest_test_builder([registration]);
	let scheduler = PrincipalName::new("scheduler").expect("Principal name should be valid.");

	builder.principal_resolver(PrincipalResolver::with_supplier({
		let scheduler = scheduler.clone();

		move || AnonymousPrincipal::new(scheduler.clone())
	}));

	let client = builder.registration_id(registration_id()).build();

	client.get(server.url("/messages")).send().await.expect("Request should succeed.");
	client.get(server.url("/messages")).send().await.expect("Request should succeed.");

	let stored = store
		.load(&registration_id(), &scheduler)
		.await
		.expect("Store lookup should succeed.")
		.expect("Authorized client should be stored under the custom placeholder.");
	let placeholder =
		PrincipalName::new("unauthenticatedPrincipal").expect("Principal name should be valid.");

	assert_eq!(stored.principal_name, scheduler);
	assert!(
		store
			.load(&registration_id(), &placeholder)
			.await
			.expect("Store lookup should succeed.")
			.is_none()
	);

	token.assert_calls_async(1).await;
	messages.assert_calls_async(2).await;
}
