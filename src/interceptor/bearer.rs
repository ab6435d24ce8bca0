//! Bearer credential injection.

// crates.io
use oauth2::http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::{PrincipalResolver, TokenType},
	chain::{InterceptFuture, Interceptor, Next},
	error::{PrecheckViolation, TokenResponseError},
	obs::{self, InterceptOutcome, InterceptSpan, trace_event},
	request::AttributedRequest,
};

const NAME: &str = "bearer";

/// Sets `Authorization: Bearer <token>` from the stored authorized client.
///
/// The authorized client has to exist already, which is why this interceptor runs after
/// [`ClientCredentialsInterceptor`](crate::interceptor::ClientCredentialsInterceptor).
/// Any `Authorization` header present on the request is replaced.
#[derive(Clone, Debug, Default)]
pub struct BearerTokenInterceptor {
	resolver: PrincipalResolver,
}
impl BearerTokenInterceptor {
	/// Replaces the resolver used when a request has no principal.
	pub fn with_resolver(resolver: PrincipalResolver) -> Self {
		Self { resolver }
	}

	/// Writes the bearer header into `request`.
	pub async fn apply(&self, request: &mut AttributedRequest) -> Result<()> {
		let attributes = request.attributes();
		let registration_id = attributes.require_registration_id()?;
		let store = attributes.require_store()?;
		let principal_name = self.resolver.resolve_name(attributes.principal());
		let Some(client) = store.load(registration_id, &principal_name).await? else {
			return Err(PrecheckViolation::MissingAuthorizedClient {
				registration_id: registration_id.clone(),
				principal_name,
			}
			.into());
		};

		if !client.access_token.is_bearer() {
			return Err(
				PrecheckViolation::UnsupportedTokenType { registration_id: registration_id.clone() }
					.into(),
			);
		}

		let value = client
			.access_token
			.value
			.header_value(TokenType::Bearer.as_str())
			.ok_or(TokenResponseError::AccessTokenNotHeaderSafe)?;

		trace_event!(registration_id = %registration_id, principal = %principal_name, "bearer credentials attached");

		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}
}
impl Interceptor for BearerTokenInterceptor {
	fn name(&self) -> &'static str {
		NAME
	}

	fn intercept<'a>(
		&'a self,
		mut request: AttributedRequest,
		next: Next<'a>,
	) -> InterceptFuture<'a> {
		let span = InterceptSpan::new(NAME, "apply");

		Box::pin(span.instrument(async move {
			obs::record_intercept_outcome(NAME, InterceptOutcome::Attempt);

			if let Err(e) = self.apply(&mut request).await {
				obs::record_intercept_outcome(NAME, InterceptOutcome::Failure);

				return Err(e);
			}

			obs::record_intercept_outcome(NAME, InterceptOutcome::Success);

			next.run(request).await
		}))
	}
}
