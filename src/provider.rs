//! Endpoints derived from the configured API base URL.

// self
use crate::{_prelude::*, error::ConfigError};

const INITIATE_PATH: &str = "/initiate";
const AUTHORIZE_PATH: &str = "/authorize";
const TOKEN_PATH: &str = "/token";

/// Handshake endpoints plus the base used for data calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiEndpoints {
	/// API base without a trailing slash.
	pub base: String,
	/// Request-token endpoint (`{base}/initiate`).
	pub initiate: Url,
	/// User authorization endpoint (`{base}/authorize`).
	pub authorize: Url,
	/// Access-token endpoint (`{base}/token`).
	pub token: Url,
}
impl ApiEndpoints {
	/// Parses the API base URL and derives every endpoint from it.
	pub fn parse(api_endpoint: &str) -> Result<Self, ConfigError> {
		let base = api_endpoint.trim().trim_end_matches('/').to_owned();
		let parsed =
			Url::parse(&base).map_err(|source| ConfigError::InvalidEndpoint { source })?;

		validate_scheme(&parsed)?;

		Ok(Self {
			initiate: join(&base, INITIATE_PATH)?,
			authorize: join(&base, AUTHORIZE_PATH)?,
			token: join(&base, TOKEN_PATH)?,
			base,
		})
	}

	/// Builds `{base}{path}` for a data call, inserting the leading slash when missing.
	pub fn data_url(&self, path: &str) -> Result<Url, ConfigError> {
		if path.starts_with('/') { join(&self.base, path) } else { join(&self.base, &format!("/{path}")) }
	}

	/// Builds the URL the user visits to approve a request token.
	pub fn authorize_url(&self, request_token: &str) -> Url {
		let mut url = self.authorize.clone();

		url.query_pairs_mut().append_pair("oauth_token", request_token);

		url
	}
}

fn join(base: &str, path: &str) -> Result<Url, ConfigError> {
	Url::parse(&format!("{base}{path}")).map_err(|source| ConfigError::InvalidEndpoint { source })
}

fn validate_scheme(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		other => Err(ConfigError::UnsupportedScheme { scheme: other.to_owned() }),
	}
}
