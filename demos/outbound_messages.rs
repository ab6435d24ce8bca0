//! Fetches messages from a protected API: the first call acquires a client-credentials token,
//! the second reuses the stored authorized client.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_outbound::{
	auth::RegistrationId,
	client::OAuth2ClientBuilder,
	config::RegistrationsConfig,
	reqwest::Client,
	store::{AuthorizedClientStore, MemoryStore},
};

#[derive(Debug, serde::Deserialize)]
struct Message {
	id: u64,
	body: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let messages_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/messages").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"body\":\"hello\"},{\"id\":2,\"body\":\"world\"}]");
		})
		.await;
	let document = format!(
		"{{\"registrations\":{{\"general-messaging\":{{\
		\"client_id\":\"messaging-client\",\
		\"client_secret\":\"messaging-secret\",\
		\"token_uri\":\"{}\",\
		\"authorization_grant_type\":\"client_credentials\",\
		\"scopes\":[\"message.read\"]}}}}}}",
		server.url("/oauth2/token"),
	);
	let repository = RegistrationsConfig::from_json_str(&document)?.into_repository()?;
	let store = Arc::new(MemoryStore::default());
	let http_client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let mut builder = OAuth2ClientBuilder::with_reqwest_client(http_client);

	builder
		.registrations(Arc::new(repository))
		.authorized_client_store(store.clone() as Arc<dyn AuthorizedClientStore>)
		.standard_interceptors();

	let client = builder.registration_id(RegistrationId::new("general-messaging")?).build();

	for _ in 0..2 {
		let messages = client.get_json::<Vec<Message>>(server.url("/messages")).await?;

		for message in messages {
			println!("Message {}: {}.", message.id, message.body);
		}
	}

	println!("Stored authorized clients: {}.", store.len());

	token_mock.assert_calls_async(1).await;
	messages_mock.assert_calls_async(2).await;

	Ok(())
}
