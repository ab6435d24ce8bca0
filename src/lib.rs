//! Outbound OAuth 2.0 request authorization: an interceptor chain that lazily acquires
//! client-credentials tokens and attaches them as bearer credentials before dispatch.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod oauth;
pub mod obs;
pub mod registration;
pub mod request;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, RegistrationId},
		client::OAuth2ClientBuilder,
		http::{Dispatcher, MappedTransport, ReqwestHttpClient, ReqwestTransportErrorMapper},
		registration::{
			AuthorizationGrantType, ClientRegistration, ClientRegistrationRepository,
			InMemoryClientRegistrationRepository,
		},
		store::{AuthorizedClientStore, MemoryStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Wraps [`test_reqwest_http_client`] into a shareable [`Dispatcher`].
	pub fn test_dispatcher() -> Arc<dyn Dispatcher> {
		Arc::new(MappedTransport::new(test_reqwest_http_client(), ReqwestTransportErrorMapper))
	}

	/// Builds a client-credentials registration pointing at `token_uri`.
	pub fn test_registration(
		registration_id: &str,
		client_id: &str,
		client_secret: &str,
		token_uri: &str,
	) -> ClientRegistration {
		ClientRegistration::builder(
			RegistrationId::new(registration_id)
				.expect("Registration identifier fixture should be valid."),
		)
		.client_id(ClientId::new(client_id).expect("Client identifier fixture should be valid."))
		.client_secret(client_secret)
		.token_uri(Url::parse(token_uri).expect("Token URI fixture should parse."))
		.authorization_grant_type(AuthorizationGrantType::ClientCredentials)
		.build()
		.expect("Registration fixture should build successfully.")
	}

	/// Constructs an [`OAuth2ClientBuilder`] wired with the standard interceptor chain, an
	/// in-memory store, and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_builder(
		registrations: impl IntoIterator<Item = ClientRegistration>,
	) -> (OAuth2ClientBuilder, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn AuthorizedClientStore> = store_backend.clone();
		let repository: Arc<dyn ClientRegistrationRepository> =
			Arc::new(InMemoryClientRegistrationRepository::new(registrations));
		let mut builder = OAuth2ClientBuilder::with_dispatcher(test_dispatcher());

		builder.registrations(repository).authorized_client_store(store).standard_interceptors();

		(builder, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
