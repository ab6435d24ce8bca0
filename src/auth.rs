//! Auth-domain identifiers, principals, scope sets, and token models.

pub mod id;
pub mod principal;
pub mod scope;
pub mod token;

pub use id::*;
pub use principal::*;
pub use scope::*;
pub use token::{access::*, authorized::*, secret::*};
