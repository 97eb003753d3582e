//! Pipeline-level error types shared across signing, auth flows, publishing, and stores.

// self
use crate::{_prelude::*, platform::Endpoint};

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pipeline error exposed by public APIs.
///
/// Every variant maps onto exactly one [`ErrorKind`] so UI layers can render a distinct
/// message per kind without parsing strings.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Credentials are missing a required field; this is a caller bug.
	#[error("Credentials are missing the {field} field.")]
	InvalidCredentials {
		/// Name of the missing field.
		field: &'static str,
	},
	/// The user cancelled or the platform refused the interactive authorization step.
	#[error("Authorization was denied: {reason}.")]
	AuthorizationDenied {
		/// Platform- or client-supplied reason string.
		reason: String,
	},
	/// The token endpoint rejected the authorization code.
	#[error("Authorization code exchange failed: {reason}.")]
	ExchangeFailed {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Platform- or client-supplied reason string.
		reason: String,
	},
	/// No token state is stored for the account.
	#[error("Account is not authenticated; connect it first.")]
	NotAuthenticated,
	/// Refreshing the bearer token failed; the stored state has already been cleared.
	#[error("Session expired and could not be refreshed: {reason}.")]
	SessionExpired {
		/// Underlying refresh failure.
		reason: String,
	},
	/// A network call exceeded its timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	NetworkTimeout {
		/// Endpoint that timed out.
		endpoint: Endpoint,
	},
	/// A single media item could not be uploaded; the item is dropped from the post.
	#[error("Media item #{index} could not be uploaded: {reason}.")]
	MediaUploadFailed {
		/// Position of the item inside the draft.
		index: usize,
		/// Underlying failure summary.
		reason: String,
	},
	/// The platform refused to create the post.
	#[error("Post was rejected with HTTP {status}: {message}.")]
	PublishRejected {
		/// HTTP status code returned by the post endpoint.
		status: u16,
		/// Platform-supplied message.
		message: String,
	},
}
impl Error {
	/// Returns the closed classification tag for this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Storage(_) => ErrorKind::Storage,
			Self::Config(_) => ErrorKind::Config,
			Self::Transport(_) => ErrorKind::Transport,
			Self::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
			Self::AuthorizationDenied { .. } => ErrorKind::AuthorizationDenied,
			Self::ExchangeFailed { .. } => ErrorKind::ExchangeFailed,
			Self::NotAuthenticated => ErrorKind::NotAuthenticated,
			Self::SessionExpired { .. } => ErrorKind::SessionExpired,
			Self::NetworkTimeout { .. } => ErrorKind::NetworkTimeout,
			Self::MediaUploadFailed { .. } => ErrorKind::MediaUploadFailed,
			Self::PublishRejected { .. } => ErrorKind::PublishRejected,
		}
	}
}

/// Closed classification of [`Error`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// See [`Error::Storage`].
	Storage,
	/// See [`Error::Config`].
	Config,
	/// See [`Error::Transport`].
	Transport,
	/// See [`Error::InvalidCredentials`].
	InvalidCredentials,
	/// See [`Error::AuthorizationDenied`].
	AuthorizationDenied,
	/// See [`Error::ExchangeFailed`].
	ExchangeFailed,
	/// See [`Error::NotAuthenticated`].
	NotAuthenticated,
	/// See [`Error::SessionExpired`].
	SessionExpired,
	/// See [`Error::NetworkTimeout`].
	NetworkTimeout,
	/// See [`Error::MediaUploadFailed`].
	MediaUploadFailed,
	/// See [`Error::PublishRejected`].
	PublishRejected,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and events.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Storage => "storage",
			Self::Config => "config",
			Self::Transport => "transport",
			Self::InvalidCredentials => "invalid_credentials",
			Self::AuthorizationDenied => "authorization_denied",
			Self::ExchangeFailed => "exchange_failed",
			Self::NotAuthenticated => "not_authenticated",
			Self::SessionExpired => "session_expired",
			Self::NetworkTimeout => "network_timeout",
			Self::MediaUploadFailed => "media_upload_failed",
			Self::PublishRejected => "publish_rejected",
		}
	}

	/// Returns `true` when the caller may retry the same call unchanged.
	pub const fn is_retryable(self) -> bool {
		matches!(self, Self::NetworkTimeout | Self::Transport)
	}

	/// Returns `true` when the user must run the authorization flow again.
	pub const fn requires_reauthorization(self) -> bool {
		matches!(
			self,
			Self::NotAuthenticated
				| Self::SessionExpired
				| Self::AuthorizationDenied
				| Self::ExchangeFailed
		)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the pipeline.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Platform descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Platform descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::platform::PlatformDescriptorError),
	/// Interactive authorization needs a redirect URI.
	#[error("A redirect URI must be configured before starting authorization.")]
	MissingRedirect,
	/// The descriptor does not configure an optional endpoint the call needs.
	#[error("The platform descriptor has no {endpoint} endpoint.")]
	MissingEndpoint {
		/// Endpoint that is not configured.
		endpoint: Endpoint,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Nonce source produced a value the signer refuses to use.
	#[error("Nonce must contain at least {min} ASCII alphanumeric characters.")]
	InvalidNonce {
		/// Minimum accepted length.
		min: usize,
	},
	/// HMAC rejected the signing key.
	#[error("Signing key was rejected by the HMAC implementation.")]
	InvalidSigningKey,
	/// Signing target URL has no host.
	#[error("Cannot sign a request for `{url}` because it has no host.")]
	UnsignableUrl {
		/// Offending URL.
		url: String,
	},
	/// Token state builder validation failed.
	#[error("Unable to build token state.")]
	TokenBuild(#[from] crate::auth::TokenStateBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, malformed bodies).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// Endpoint answered with a body that could not be parsed.
	#[error("The {endpoint} endpoint returned a malformed response.")]
	MalformedResponse {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Endpoint answered with an unexpected, non-JSON failure.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Summary of the failure.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: Endpoint, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_classify_retry_and_reauthorization() {
		let timeout = Error::NetworkTimeout { endpoint: Endpoint::PostCreate };

		assert_eq!(timeout.kind(), ErrorKind::NetworkTimeout);
		assert!(timeout.kind().is_retryable());
		assert!(!timeout.kind().requires_reauthorization());

		let expired = Error::SessionExpired { reason: "refresh rejected".into() };

		assert!(expired.kind().requires_reauthorization());
		assert!(!expired.kind().is_retryable());
		assert!(!ErrorKind::PublishRejected.is_retryable());
	}

	#[test]
	fn error_kind_serializes_as_snake_case() {
		let payload = serde_json::to_string(&ErrorKind::MediaUploadFailed)
			.expect("ErrorKind should serialize to JSON.");

		assert_eq!(payload, "\"media_upload_failed\"");
		assert_eq!(ErrorKind::SessionExpired.to_string(), "session_expired");
	}

	#[test]
	fn rejection_message_carries_structured_context() {
		let err = Error::PublishRejected { status: 403, message: "duplicate content".into() };

		assert_eq!(err.to_string(), "Post was rejected with HTTP 403: duplicate content.");
	}
}
