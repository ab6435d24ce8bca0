//! Resource-owner identities and the unauthenticated placeholder.
//!
//! A request is made on behalf of a [`Principal`]. Machine-to-machine calls have no real user,
//! so a [`PrincipalResolver`] substitutes an [`AnonymousPrincipal`] whose only property is its
//! name. That name keeps authorized-client lookups stable across calls.

// self
use crate::{_prelude::*, auth::PrincipalName};

/// Name given to the placeholder identity when no principal is supplied.
pub const UNAUTHENTICATED_PRINCIPAL_NAME: &str = "unauthenticatedPrincipal";

/// Supplier for the placeholder identity used when a call has no principal.
pub type UnauthenticatedPrincipalSupplier = Arc<dyn Fn() -> AnonymousPrincipal + Send + Sync>;

/// Identity on whose behalf an outbound request is made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
	/// A real, authenticated user or service.
	Authenticated(AuthenticatedPrincipal),
	/// An anonymous identity that only carries a name.
	Anonymous(AnonymousPrincipal),
}
impl Principal {
	/// Shorthand for [`Principal::Authenticated`] with no authorities.
	pub fn authenticated(name: PrincipalName) -> Self {
		Self::Authenticated(AuthenticatedPrincipal::new(name))
	}

	/// Shorthand for [`Principal::Anonymous`].
	pub fn anonymous(name: PrincipalName) -> Self {
		Self::Anonymous(AnonymousPrincipal::new(name))
	}

	/// Name used as the principal half of authorized-client keys.
	pub fn name(&self) -> &PrincipalName {
		match self {
			Self::Authenticated(principal) => &principal.name,
			Self::Anonymous(principal) => principal.name(),
		}
	}

	/// Returns `true` when the identity is anonymous.
	pub fn is_anonymous(&self) -> bool {
		matches!(self, Self::Anonymous(_))
	}
}
impl From<AuthenticatedPrincipal> for Principal {
	fn from(value: AuthenticatedPrincipal) -> Self {
		Self::Authenticated(value)
	}
}
impl From<AnonymousPrincipal> for Principal {
	fn from(value: AnonymousPrincipal) -> Self {
		Self::Anonymous(value)
	}
}

/// Authenticated identity produced by a completed login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
	/// Principal name.
	pub name: PrincipalName,
	/// Granted authorities (roles, scopes) attached by the login flow.
	#[serde(default)]
	pub authorities: Vec<String>,
}
impl AuthenticatedPrincipal {
	/// Creates an authenticated principal without authorities.
	pub fn new(name: PrincipalName) -> Self {
		Self { name, authorities: Vec::new() }
	}

	/// Appends a granted authority.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authorities.push(authority.into());

		self
	}
}

/// Anonymous identity; exposes nothing but its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousPrincipal {
	name: PrincipalName,
}
impl AnonymousPrincipal {
	/// Creates an anonymous principal.
	pub fn new(name: PrincipalName) -> Self {
		Self { name }
	}

	/// The placeholder named [`UNAUTHENTICATED_PRINCIPAL_NAME`].
	pub fn unauthenticated() -> Self {
		Self { name: PrincipalName(UNAUTHENTICATED_PRINCIPAL_NAME.to_owned()) }
	}

	/// Principal name.
	pub fn name(&self) -> &PrincipalName {
		&self.name
	}
}

/// Maps an optional principal to a stable name, substituting a placeholder for `None`.
#[derive(Clone)]
pub struct PrincipalResolver {
	supplier: UnauthenticatedPrincipalSupplier,
}
impl PrincipalResolver {
	/// Creates a resolver that substitutes the result of `supplier` for missing principals.
	pub fn with_supplier(supplier: impl Fn() -> AnonymousPrincipal + Send + Sync + 'static) -> Self {
		Self { supplier: Arc::new(supplier) }
	}

	/// Placeholder identity produced by the configured supplier.
	pub fn unauthenticated(&self) -> AnonymousPrincipal {
		(self.supplier)()
	}

	/// Resolves the lookup name for `principal`.
	pub fn resolve_name(&self, principal: Option<&Principal>) -> PrincipalName {
		match principal {
			Some(principal) => principal.name().clone(),
			None => self.unauthenticated().name,
		}
	}

	/// Returns `principal` or the placeholder identity when absent.
	pub fn resolve(&self, principal: Option<&Principal>) -> Principal {
		principal.cloned().unwrap_or_else(|| Principal::Anonymous(self.unauthenticated()))
	}
}
impl Default for PrincipalResolver {
	fn default() -> Self {
		Self::with_supplier(AnonymousPrincipal::unauthenticated)
	}
}
impl Debug for PrincipalResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PrincipalResolver").field("placeholder", &self.unauthenticated()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn name(value: &str) -> PrincipalName {
		PrincipalName::new(value).expect("Principal name fixture should be valid.")
	}

	#[test]
	fn missing_principal_resolves_to_placeholder() {
		let resolver = PrincipalResolver::default();

		assert_eq!(resolver.resolve_name(None).as_ref(), UNAUTHENTICATED_PRINCIPAL_NAME);
		assert!(resolver.resolve(None).is_anonymous());
	}

	#[test]
	fn custom_supplier_changes_placeholder_name() {
		let resolver =
			PrincipalResolver::with_supplier(|| AnonymousPrincipal::new(name("scheduler")));

		assert_eq!(resolver.resolve_name(None).as_ref(), "scheduler");
	}

	#[test]
	fn present_principals_keep_their_names() {
		let resolver = PrincipalResolver::default();
		let user = Principal::from(AuthenticatedPrincipal::new(name("joe")).with_authority("USER"));
		let guest = Principal::anonymous(name("guest"));

		assert_eq!(resolver.resolve_name(Some(&user)).as_ref(), "joe");
		assert_eq!(resolver.resolve_name(Some(&guest)).as_ref(), "guest");
		assert!(!user.is_anonymous());
	}

	#[test]
	fn principal_serializes_with_kind_tag() {
		let payload = serde_json::to_value(Principal::authenticated(name("joe")))
			.expect("Principal should serialize to JSON.");

		assert_eq!(payload["kind"], "authenticated");
		assert_eq!(payload["name"], "joe");
	}
}
