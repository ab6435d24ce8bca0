// self
use crate::_prelude::*;

/// Future type produced by [`InterceptSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedIntercept<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedIntercept<F> = F;

/// Span wrapping one interceptor invocation.
#[derive(Clone, Debug)]
pub struct InterceptSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl InterceptSpan {
	/// Creates a span tagged with the interceptor name + stage.
	pub fn new(interceptor: &'static str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("oauth2_outbound.intercept", interceptor, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (interceptor, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedIntercept<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_preserves_output() {
		let span = InterceptSpan::new("bearer", "instrument_preserves_output");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
