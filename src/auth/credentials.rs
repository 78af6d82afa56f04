//! Credential source shape consumed by [`Connection`](crate::Connection) construction.

// self
use crate::{
	_prelude::*,
	auth::{Consumer, Secret, Token},
	error::ConfigError,
	provider::ApiEndpoints,
};

/// Environment variable holding the API endpoint.
pub const ENV_API_ENDPOINT: &str = "PPAPI_API_ENDPOINT";
/// Environment variable holding the consumer key.
pub const ENV_CONSUMER_KEY: &str = "PPAPI_CONSUMER_KEY";
/// Environment variable holding the consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "PPAPI_CONSUMER_SECRET";
/// Environment variable holding a stored access token key.
pub const ENV_OAUTH_TOKEN: &str = "PPAPI_OAUTH_TOKEN";
/// Environment variable holding a stored access token secret.
pub const ENV_OAUTH_TOKEN_SECRET: &str = "PPAPI_OAUTH_TOKEN_SECRET";

/// Provider endpoint plus consumer (and optionally user) credentials.
///
/// Every field defaults when deserializing so [`Credentials::validate`] is the single place that
/// reports missing values. The two token fields only count when both are present and non-empty;
/// otherwise connection construction falls back to the interactive handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
	/// Base URL of the API, e.g. `https://api.projectplace.com`.
	pub api_endpoint: String,
	/// Registered application key.
	pub consumer_key: String,
	/// Registered application secret.
	pub consumer_secret: Secret,
	/// Stored access token key, if the user already authorized the application.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oauth_token: Option<String>,
	/// Stored access token secret, if the user already authorized the application.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oauth_token_secret: Option<Secret>,
}
impl Credentials {
	/// Creates consumer-only credentials.
	pub fn new(
		api_endpoint: impl Into<String>,
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
	) -> Self {
		Self {
			api_endpoint: api_endpoint.into(),
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			oauth_token: None,
			oauth_token_secret: None,
		}
	}

	/// Attaches a stored access token so connection construction skips the handshake.
	pub fn with_access_token(
		mut self,
		oauth_token: impl Into<String>,
		oauth_token_secret: impl Into<Secret>,
	) -> Self {
		self.oauth_token = Some(oauth_token.into());
		self.oauth_token_secret = Some(oauth_token_secret.into());

		self
	}

	/// Reads credentials from the `PPAPI_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads credentials through an arbitrary key lookup; empty values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let credentials = Self {
			api_endpoint: read(ENV_API_ENDPOINT).unwrap_or_default(),
			consumer_key: read(ENV_CONSUMER_KEY).unwrap_or_default(),
			consumer_secret: read(ENV_CONSUMER_SECRET).map(Secret::new).unwrap_or_default(),
			oauth_token: read(ENV_OAUTH_TOKEN),
			oauth_token_secret: read(ENV_OAUTH_TOKEN_SECRET).map(Secret::new),
		};

		credentials.validate()?;

		Ok(credentials)
	}

	/// Checks the mandatory fields in order: endpoint, consumer key, consumer secret.
	///
	/// Whitespace-only values count as missing, matching [`Credentials::from_lookup`].
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (field, value) in [
			("api_endpoint", self.api_endpoint.as_str()),
			("consumer_key", self.consumer_key.as_str()),
			("consumer_secret", self.consumer_secret.expose()),
		] {
			if value.trim().is_empty() {
				return Err(ConfigError::MissingCredential { field });
			}
		}

		ApiEndpoints::parse(&self.api_endpoint)?;

		Ok(())
	}

	/// Derives the handshake and data endpoints.
	pub fn endpoints(&self) -> Result<ApiEndpoints, ConfigError> {
		ApiEndpoints::parse(&self.api_endpoint)
	}

	/// Consumer identity described by these credentials.
	pub fn consumer(&self) -> Consumer {
		Consumer::new(self.consumer_key.clone(), self.consumer_secret.clone())
	}

	/// Stored access token, only when both halves are present and non-empty.
	pub fn access_token(&self) -> Option<Token> {
		let key = self.oauth_token.as_deref().filter(|key| !key.is_empty())?;
		let secret = self.oauth_token_secret.as_ref().filter(|secret| !secret.is_empty())?;

		Some(Token::new(key, secret.clone()))
	}
}
