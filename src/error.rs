//! Crate-level error types shared by interceptors, stores, and transports.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, PrincipalName, RegistrationId},
	registration::ClientRegistrationError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced to the caller of an outbound request.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Precondition violated by the caller or by the chain layout.
	#[error(transparent)]
	Precheck(#[from] PrecheckViolation),
	/// Transport failure or non-success status.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint answered with a payload that cannot yield an access token.
	#[error(transparent)]
	MalformedTokenResponse(#[from] TokenResponseError),
	/// A resource response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	ResponseDecode {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures detected at the call boundary.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An identifier supplied by the caller failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// A client registration failed validation.
	#[error(transparent)]
	InvalidRegistration(#[from] ClientRegistrationError),
	/// A caller-defined attribute name was empty or whitespace.
	#[error("Attribute names cannot be empty.")]
	EmptyAttributeName,
	/// A required request attribute was not configured.
	#[error("Request attribute `{name}` is required but was not set.")]
	MissingAttribute {
		/// Well-known attribute name.
		name: &'static str,
	},
	/// No registration exists for the requested identifier.
	#[error("No client registration found for `{registration_id}`.")]
	UnknownRegistration {
		/// Identifier that failed to resolve.
		registration_id: RegistrationId,
	},
	/// The registration does not use the grant the interceptor performs.
	#[error("Registration `{registration_id}` does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Registration identifier.
		registration_id: RegistrationId,
		/// Grant label.
		grant: &'static str,
	},
	/// A configuration document could not be parsed.
	#[error("Configuration document is invalid.")]
	InvalidDocument {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Violated preconditions; these indicate a programming error rather than bad input.
#[derive(Debug, ThisError)]
pub enum PrecheckViolation {
	/// An authenticated principal reached a store that only accepts anonymous principals.
	#[error("The principal `{name}` should not be authenticated.")]
	AuthenticatedPrincipal {
		/// Name of the offending principal.
		name: PrincipalName,
	},
	/// Bearer injection ran without a stored authorized client.
	#[error(
		"No authorized client for registration `{registration_id}` and principal `{principal_name}`; the client credentials interceptor must run first."
	)]
	MissingAuthorizedClient {
		/// Registration identifier.
		registration_id: RegistrationId,
		/// Resolved principal name.
		principal_name: PrincipalName,
	},
	/// The stored access token is not a bearer token.
	#[error("Access token for registration `{registration_id}` has no recognized token type.")]
	UnsupportedTokenType {
		/// Registration identifier.
		registration_id: RegistrationId,
	},
}

/// Transport-level failures (network, IO, status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
	/// The request did not complete in time.
	#[error("Request timed out.")]
	Timeout {
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport reported a failure that carries only a message.
	#[error("HTTP client error: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The remote endpoint answered with a non-success status.
	#[error("The {endpoint} endpoint returned HTTP {status}{}.", describe_oauth_error(.oauth_error))]
	Status {
		/// Which endpoint answered (`token` or `resource`).
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// OAuth `error` code parsed from the body, if any.
		oauth_error: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status associated with the failure, when known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Timeout { status } | Self::Other { status, .. } => *status,
			Self::Status { status, .. } => Some(*status),
			Self::Network { .. } | Self::Io(_) => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Token endpoint payload problems.
#[derive(Debug, ThisError)]
pub enum TokenResponseError {
	/// Body was not valid JSON (or not a JSON object).
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// `access_token` was missing or empty.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// `expires_in` was not a non-negative integer.
	#[error("Token endpoint returned an invalid expires_in value: {value}.")]
	InvalidExpiresIn {
		/// Raw value as received.
		value: String,
	},
	/// The access token contains characters that cannot travel in an HTTP header.
	#[error("Access token cannot be encoded as an HTTP header value.")]
	AccessTokenNotHeaderSafe,
}

fn describe_oauth_error(code: &Option<String>) -> String {
	code.as_ref().map(|code| format!(" ({code})")).unwrap_or_default()
}
