// self
use crate::obs::InterceptOutcome;

/// Records an interceptor outcome via the global metrics recorder (when enabled).
pub fn record_intercept_outcome(interceptor: &'static str, outcome: InterceptOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_outbound_intercept_total",
			"interceptor" => interceptor,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (interceptor, outcome);
	}
}
