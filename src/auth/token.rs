//! Access tokens, redacted secrets, and authorized-client associations.

pub mod access;
pub mod authorized;
pub mod secret;
