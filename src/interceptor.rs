//! Built-in interceptors and the standard chain layout.
//!
//! The standard chain runs [`ClientCredentialsInterceptor`] first, so the authorized client
//! exists in the store by the time [`BearerTokenInterceptor`] reads it.

pub mod bearer;
pub mod client_credentials;

pub use bearer::BearerTokenInterceptor;
pub use client_credentials::ClientCredentialsInterceptor;

// self
use crate::{_prelude::*, chain::Interceptor, http::Dispatcher};

/// Token acquisition followed by bearer injection; token exchanges go through `dispatcher`.
pub fn standard_chain(dispatcher: Arc<dyn Dispatcher>) -> Vec<Arc<dyn Interceptor>> {
	vec![
		Arc::new(ClientCredentialsInterceptor::new(dispatcher)),
		Arc::new(BearerTokenInterceptor::default()),
	]
}
