//! Secret wrapper shared by access tokens and client secrets.

// crates.io
use oauth2::http::HeaderValue;
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping token values and client secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Builds a sensitive header value of the form `<prefix> <secret>`.
	///
	/// Returns `None` when the secret contains bytes that are not allowed in header values.
	pub fn header_value(&self, prefix: &str) -> Option<HeaderValue> {
		let mut value = HeaderValue::from_str(&format!("{prefix} {}", self.0)).ok()?;

		value.set_sensitive(true);

		Some(value)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
