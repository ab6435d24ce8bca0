//! Classification of transport failures into crate [`Error`] values.

// crates.io
use oauth2::HttpClientError;
// self
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};
use crate::{_prelude::*, http::ResponseMetadata};

/// Maps failures emitted by an [`HttpTransport`](crate::http::HttpTransport) into [`Error`].
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts `error` using whatever the handle recorded in `metadata`.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TransportError::Other { message, status: meta_status(meta) }.into(),
			_ => TransportError::Other {
				message: "unrecognized transport failure".into(),
				status: meta_status(meta),
			}
			.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout {
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn non_reqwest_failures_keep_recorded_status() {
		let meta = ResponseMetadata { status: Some(502), retry_after: None };
		let err = ReqwestTransportErrorMapper
			.map_transport_error(Some(&meta), HttpClientError::Other("upstream reset".into()));

		assert!(matches!(
			err,
			Error::Transport(TransportError::Other { status: Some(502), ref message })
				if message == "upstream reset"
		));

		let err = ReqwestTransportErrorMapper.map_transport_error(
			None,
			HttpClientError::Io(std::io::Error::other("connection refused")),
		);

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));
	}
}
