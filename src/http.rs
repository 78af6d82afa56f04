//! Transport primitives for signed API calls.
//!
//! The crate depends on an HTTP stack only through [`ApiTransport`]. A transport receives a
//! fully signed [`SignedRequest`] and returns the raw [`ApiResponse`]; it never interprets the
//! status code, retries, or follows OAuth-specific logic. Implementations must be
//! `Send + Sync + 'static` because batched sends share one transport across spawned tasks.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransportError, sign::SignedRequest};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, sign::Method};

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients capable of dispatching signed requests.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Transmits the request and resolves with the untouched response.
	fn send(&self, request: SignedRequest) -> TransportFuture<'_>;
}

/// Raw HTTP response surfaced to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header, when the provider sent one.
	pub content_type: Option<String>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from a status code and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, content_type: None, body: body.into() }
	}

	/// Sets the `Content-Type` header value.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the JSON body, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source, status: self.status })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport from a configured reqwest builder (timeouts, proxies, TLS roots).
	pub fn with_builder(builder: reqwest::ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: SignedRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let SignedRequest { method, url, authorization, content_type, body } = request;
			let method = match method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
			};
			let mut builder =
				client.request(method, url).header(reqwest::header::AUTHORIZATION, authorization);

			if let Some(content_type) = content_type {
				builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(reqwest::header::CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let body = response.bytes().await?.to_vec();
			let response = ApiResponse::new(status, body);

			Ok(match content_type {
				Some(content_type) => response.with_content_type(content_type),
				None => response,
			})
		})
	}
}
