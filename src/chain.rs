//! Interceptor chain: ordered request processing ending at a [`Dispatcher`].
//!
//! Each interceptor receives the request and a [`Next`] continuation. It may modify the
//! request and call [`Next::run`], or return a response of its own without calling it.
//! Order is fixed by the caller and matters: token acquisition has to run before bearer
//! injection.

// crates.io
use oauth2::HttpResponse;
// self
use crate::{_prelude::*, http::Dispatcher, request::AttributedRequest};

/// Boxed future returned by [`Interceptor::intercept`].
pub type InterceptFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// One processing step applied to every outbound request.
pub trait Interceptor
where
	Self: Send + Sync,
{
	/// Stable label used in spans and metrics.
	fn name(&self) -> &'static str;

	/// Processes `request` and either forwards it through `next` or answers it directly.
	fn intercept<'a>(&'a self, request: AttributedRequest, next: Next<'a>) -> InterceptFuture<'a>;
}

/// Continuation over the interceptors that have not run yet.
#[derive(Clone, Copy)]
pub struct Next<'a> {
	interceptors: &'a [Arc<dyn Interceptor>],
	dispatcher: &'a dyn Dispatcher,
}
impl<'a> Next<'a> {
	/// Positions a continuation at the start of `interceptors`.
	pub fn new(interceptors: &'a [Arc<dyn Interceptor>], dispatcher: &'a dyn Dispatcher) -> Self {
		Self { interceptors, dispatcher }
	}

	/// Number of interceptors still ahead of the dispatcher.
	pub fn remaining(&self) -> usize {
		self.interceptors.len()
	}

	/// Runs the next interceptor, or dispatches once none remain.
	pub fn run(self, request: AttributedRequest) -> InterceptFuture<'a> {
		match self.interceptors.split_first() {
			Some((current, rest)) => {
				let next = Next { interceptors: rest, dispatcher: self.dispatcher };

				current.intercept(request, next)
			},
			None => self.dispatcher.dispatch(request.into_inner()),
		}
	}
}
impl Debug for Next<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Next")
			.field(
				"interceptors",
				&self.interceptors.iter().map(|interceptor| interceptor.name()).collect::<Vec<_>>(),
			)
			.finish_non_exhaustive()
	}
}
