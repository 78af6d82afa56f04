//! Consumer and token key/secret pairs.

// self
use crate::{_prelude::*, auth::Secret};

/// Registered application identity (`oauth_consumer_key` + consumer secret).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
	/// Public consumer key.
	pub key: String,
	/// Consumer secret; first half of every signing key.
	pub secret: Secret,
}
impl Consumer {
	/// Creates a consumer from its key and secret.
	pub fn new(key: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self { key: key.into(), secret: secret.into() }
	}
}

/// OAuth 1.0a token pair.
///
/// The same shape serves both lifecycle variants: the short-lived request token carried through
/// the handshake and the long-lived access token used for every data call. Access tokens should be
/// persisted by the caller so later sessions can skip the handshake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Public `oauth_token` value.
	pub key: String,
	/// Token secret; second half of the signing key.
	pub secret: Secret,
}
impl Token {
	/// Creates a token from its key and secret.
	pub fn new(key: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self { key: key.into(), secret: secret.into() }
	}
}
