//! Client credentials wire contract: token request construction and response parsing.
//!
//! Requests follow RFC 6749 §4.4 with HTTP Basic client authentication. Response parsing
//! is deliberately lenient about fields servers disagree on (`token_type` casing,
//! `expires_in` sent as a string) and strict about the one field that matters
//! (`access_token`).

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AccessTokenBuilderError, ScopeSet, TokenSecret, TokenType},
	error::{ConfigError, TokenResponseError, TransportError},
	http::{Dispatcher, parse_retry_after},
	registration::{AuthorizationGrantType, ClientRegistration},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Runs one client credentials exchange for `registration` and returns the issued token.
///
/// Non-success statuses surface as [`TransportError::Status`] for the `token` endpoint;
/// nothing is retried.
pub async fn exchange_client_credentials(
	dispatcher: &dyn Dispatcher,
	registration: &ClientRegistration,
) -> Result<AccessToken> {
	let request = client_credentials_request(registration)?;
	let issued_at = OffsetDateTime::now_utc();
	let response = dispatcher.dispatch(request).await?;

	parse_token_response(&response, issued_at)
}

/// Builds the token endpoint request for the client credentials grant.
///
/// The body carries `grant_type=client_credentials` and, when the registration lists
/// scopes, a space-delimited `scope`. Client credentials travel in an HTTP Basic
/// `Authorization` header; registrations without a secret send `client_id` in the body.
pub fn client_credentials_request(registration: &ClientRegistration) -> Result<HttpRequest> {
	let mut form = form_urlencoded::Serializer::new(String::new());

	form.append_pair("grant_type", AuthorizationGrantType::ClientCredentials.as_str());

	if !registration.scopes.is_empty() {
		form.append_pair("scope", &registration.scopes.normalized());
	}

	let mut builder = Request::builder()
		.method(Method::POST)
		.uri(registration.token_uri.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE);

	match &registration.client_secret {
		Some(secret) => {
			builder = builder.header(AUTHORIZATION, basic_credentials(registration, secret)?);
		},
		None => {
			form.append_pair("client_id", registration.client_id.as_ref());
		},
	}

	Ok(builder.body(form.finish().into_bytes()).map_err(ConfigError::from)?)
}

/// Interprets a token endpoint response received at `issued_at`.
pub fn parse_token_response(
	response: &HttpResponse,
	issued_at: OffsetDateTime,
) -> Result<AccessToken> {
	let status = response.status();

	if !status.is_success() {
		return Err(TransportError::Status {
			endpoint: "token",
			status: status.as_u16(),
			oauth_error: oauth_error_code(response.body()),
			retry_after: parse_retry_after(response.headers()),
		}
		.into());
	}

	Ok(parse_token_body(response.body(), Some(status), issued_at)?)
}

/// Parses a successful token endpoint payload.
///
/// - `access_token` must be a non-empty string that can be sent in a header.
/// - `token_type` is recognized case-insensitively; unknown values are kept as `None`.
/// - `expires_in` may be an integer or a numeric string; `0` or absence means no known expiry.
/// - `scope` is split on whitespace; an absent key yields `None`.
pub fn parse_token_body(
	body: &[u8],
	status: Option<StatusCode>,
	issued_at: OffsetDateTime,
) -> Result<AccessToken, TokenResponseError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let payload: TokenResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TokenResponseError::Parse {
			source,
			status: status.map(|code| code.as_u16()),
		})?;
	let access_token = payload
		.access_token
		.filter(|value| !value.is_empty())
		.ok_or(TokenResponseError::MissingAccessToken)?;

	if TokenSecret::new(access_token.as_str()).header_value(TokenType::Bearer.as_str()).is_none() {
		return Err(TokenResponseError::AccessTokenNotHeaderSafe);
	}

	let expires_in = match payload.expires_in {
		Some(raw) => raw.seconds()?,
		None => 0,
	};

	AccessToken::builder(access_token)
		.token_type(payload.token_type.as_deref().and_then(TokenType::recognize))
		.issued_at(issued_at)
		.expires_in(Duration::seconds(expires_in))
		.scopes(payload.scope.as_deref().map(ScopeSet::from_delimited))
		.build()
		.map_err(|e| match e {
			AccessTokenBuilderError::MissingValue => TokenResponseError::MissingAccessToken,
			AccessTokenBuilderError::ExpiryOutOfRange =>
				TokenResponseError::InvalidExpiresIn { value: expires_in.to_string() },
		})
}

fn basic_credentials(
	registration: &ClientRegistration,
	secret: &TokenSecret,
) -> Result<HeaderValue, ConfigError> {
	let encoded = STANDARD.encode(format!("{}:{}", registration.client_id, secret.expose()));
	let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
		.map_err(|e| ConfigError::HttpRequest(e.into()))?;

	value.set_sensitive(true);

	Ok(value)
}

fn oauth_error_code(body: &[u8]) -> Option<String> {
	serde_json::from_slice::<OAuthErrorBody>(body).ok().map(|payload| payload.error)
}

#[derive(Deserialize)]
struct TokenResponseBody {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<ExpiresIn>,
	#[serde(default)]
	scope: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
	Seconds(i64),
	Text(String),
}
impl ExpiresIn {
	fn seconds(self) -> Result<i64, TokenResponseError> {
		let (parsed, raw) = match self {
			ExpiresIn::Seconds(value) => (Some(value), value.to_string()),
			ExpiresIn::Text(text) => (text.trim().parse::<i64>().ok(), text),
		};

		parsed.filter(|value| *value >= 0).ok_or(TokenResponseError::InvalidExpiresIn { value: raw })
	}
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
}
