//! Optional observability for the interceptor chain.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `oauth2_outbound.intercept` with the `interceptor`
//!   and `stage` fields, plus `debug` events at notable points (cache hit, token acquired).
//! - Enable `metrics` to increment the `oauth2_outbound_intercept_total` counter labeled by
//!   `interceptor` + `outcome`.
//!
//! Both compile to no-ops when their feature is disabled.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded per interceptor invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterceptOutcome {
	/// Interceptor entered.
	Attempt,
	/// A stored authorized client satisfied the request without a token exchange.
	CacheHit,
	/// Interceptor finished its own work and forwarded the request.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl InterceptOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			InterceptOutcome::Attempt => "attempt",
			InterceptOutcome::CacheHit => "cache_hit",
			InterceptOutcome::Success => "success",
			InterceptOutcome::Failure => "failure",
		}
	}
}
impl Display for InterceptOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a `debug` event inside the current span when `tracing` is enabled.
macro_rules! trace_event {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)+);
		}
	};
}
pub(crate) use trace_event;
