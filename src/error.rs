//! Crate-level error types shared by the signer, handshake, connection, and facade.

// self
use crate::{_prelude::*, handshake::HandshakeStage};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Nothing in this crate retries; every variant means the caller has to restart the operation.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The three-legged handshake failed.
	#[error(transparent)]
	Handshake(#[from] HandshakeError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Requested HTTP verb is not one of `GET`, `POST`, or `PUT`.
	#[error("Invalid method `{method}`; valid values are GET, POST, and PUT.")]
	InvalidMethod {
		/// Verb supplied by the caller.
		method: String,
	},
	/// Provider answered a data call with a non-success status.
	#[error("Server returned HTTP status code {status}: {body}.")]
	Upstream {
		/// HTTP status code.
		status: u16,
		/// Response body text.
		body: String,
	},
	/// Provider answered with JSON that does not match the expected shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A mandatory credential field is missing or empty.
	#[error("Missing mandatory credential `{field}`.")]
	MissingCredential {
		/// Name of the missing field.
		field: &'static str,
	},
	/// The API endpoint cannot be parsed.
	#[error("API endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The API endpoint uses a scheme other than `http`/`https`.
	#[error("API endpoint must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The HMAC signing key was rejected.
	#[error("HMAC-SHA1 signing key was rejected.")]
	InvalidSigningKey,
	/// Batched sends need a Tokio runtime to spawn onto.
	#[error("No Tokio runtime is available to dispatch prepared requests.")]
	RuntimeUnavailable,
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

/// Failures raised while exchanging tokens with the provider.
#[derive(Debug, ThisError)]
pub enum HandshakeError {
	/// Provider answered a handshake step with a non-success status.
	#[error("The {stage} step was rejected with HTTP status code {status}: {body}.")]
	Rejected {
		/// Step that failed.
		stage: HandshakeStage,
		/// HTTP status code.
		status: u16,
		/// Response body text.
		body: String,
	},
	/// Provider response did not carry an expected key.
	#[error("The {stage} response is missing `{field}`.")]
	MissingField {
		/// Step that failed.
		stage: HandshakeStage,
		/// Missing key.
		field: &'static str,
	},
	/// The authorizer could not collect a verifier.
	#[error("User authorization failed: {reason}.")]
	Authorization {
		/// Authorizer-supplied reason string.
		reason: String,
	},
	/// The authorizer returned a blank verifier.
	#[error("User authorization returned an empty oauth_verifier.")]
	EmptyVerifier,
	/// The user did not return a verifier in time.
	#[error("User authorization timed out after {after:?}.")]
	AuthorizationTimedOut {
		/// Configured bound on the authorization step.
		after: StdDuration,
	},
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn messages_carry_context() {
		let err = Error::from(ConfigError::MissingCredential { field: "consumer_key" });

		assert_eq!(err.to_string(), "Missing mandatory credential `consumer_key`.");

		let err = Error::InvalidMethod { method: "DELETE".into() };

		assert_eq!(err.to_string(), "Invalid method `DELETE`; valid values are GET, POST, and PUT.");

		let err = Error::from(HandshakeError::MissingField {
			stage: HandshakeStage::Initiate,
			field: "oauth_token_secret",
		});

		assert_eq!(err.to_string(), "The initiate response is missing `oauth_token_secret`.");
	}

	#[test]
	fn network_errors_keep_their_source() {
		let err = Error::from(TransportError::network(std::io::Error::new(
			std::io::ErrorKind::ConnectionRefused,
			"connection refused",
		)));
		let source = std::error::Error::source(&err)
			.expect("Network error should expose the transport failure.");

		assert_eq!(source.to_string(), "connection refused");
	}
}
