// self
use crate::_prelude::*;

/// OAuth 2.0 grant types a registration may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationGrantType {
	/// Authorization Code grant, completed by the login flow.
	AuthorizationCode,
	/// Refresh Token grant.
	RefreshToken,
	/// Client Credentials grant for machine-to-machine tokens.
	ClientCredentials,
}
impl AuthorizationGrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			AuthorizationGrantType::AuthorizationCode => "authorization_code",
			AuthorizationGrantType::RefreshToken => "refresh_token",
			AuthorizationGrantType::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for AuthorizationGrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
