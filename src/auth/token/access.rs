//! Immutable access token value object, lifecycle helpers, and builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Token types recognized when presenting credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
	/// RFC 6750 bearer token.
	Bearer,
}
impl TokenType {
	/// Wire label of the token type.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenType::Bearer => "Bearer",
		}
	}

	/// Recognizes a `token_type` value; comparison is case-insensitive.
	///
	/// Anything other than `bearer` yields `None`, which downstream code treats as unset.
	pub fn recognize(raw: &str) -> Option<Self> {
		raw.eq_ignore_ascii_case("bearer").then_some(TokenType::Bearer)
	}
}
impl Display for TokenType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle status of an access token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is usable; tokens without a known expiry are always active.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`AccessTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AccessTokenBuilderError {
	/// Issued when no token value was provided.
	#[error("Access token value is required.")]
	MissingValue,
	/// Issued when the relative lifetime ends outside the representable date range.
	#[error("Access token lifetime overflows the supported date range.")]
	ExpiryOutOfRange,
}

/// Access token issued by an authorization server.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Token value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Recognized token type, `None` when the server sent something unrecognized.
	pub token_type: Option<TokenType>,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant; `None` means the server did not state a lifetime.
	pub expires_at: Option<OffsetDateTime>,
	/// Granted scopes; `None` when the server omitted the `scope` parameter.
	pub scopes: Option<ScopeSet>,
}
impl AccessToken {
	/// Returns a builder for the provided token value.
	pub fn builder(value: impl Into<String>) -> AccessTokenBuilder {
		AccessTokenBuilder::new(value)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self.expires_at {
			Some(expires_at) if instant >= expires_at => TokenStatus::Expired,
			_ => TokenStatus::Active,
		}
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token is a bearer token.
	pub fn is_bearer(&self) -> bool {
		self.token_type == Some(TokenType::Bearer)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("value", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("scopes", &self.scopes)
			.finish()
	}
}

/// Builder for [`AccessToken`].
#[derive(Clone, Debug)]
pub struct AccessTokenBuilder {
	value: TokenSecret,
	token_type: Option<TokenType>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	scopes: Option<ScopeSet>,
}
impl AccessTokenBuilder {
	fn new(value: impl Into<String>) -> Self {
		Self {
			value: TokenSecret::new(value),
			token_type: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
			scopes: None,
		}
	}

	/// Sets the token type.
	pub fn token_type(mut self, token_type: Option<TokenType>) -> Self {
		self.token_type = token_type;

		self
	}

	/// Shorthand for a bearer token.
	pub fn bearer(self) -> Self {
		self.token_type(Some(TokenType::Bearer))
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative lifetime; zero or negative values leave the expiry unspecified.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = duration.is_positive().then_some(duration);

		self
	}

	/// Sets the granted scopes.
	pub fn scopes(mut self, scopes: Option<ScopeSet>) -> Self {
		self.scopes = scopes;

		self
	}

	/// Consumes the builder and produces an [`AccessToken`].
	pub fn build(self) -> Result<AccessToken, AccessTokenBuilderError> {
		if self.value.is_empty() {
			return Err(AccessTokenBuilderError::MissingValue);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(
				issued_at.checked_add(delta).ok_or(AccessTokenBuilderError::ExpiryOutOfRange)?,
			),
			(None, None) => None,
		};

		Ok(AccessToken {
			value: self.value,
			token_type: self.token_type,
			issued_at,
			expires_at,
			scopes: self.scopes,
		})
	}
}
