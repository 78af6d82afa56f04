//! Caller-owned connection that signs and dispatches API calls.
//!
//! A [`Connection`] is built once per credential set. Construction either trusts a stored access
//! token or runs the three-legged handshake; afterwards the consumer and access token are
//! read-only, so batch workers share them through an [`Arc`] without locking. The only mutable
//! state is the prepared-request queue and the per-batch completion counter.

pub mod batch;

pub use batch::*;

// std
use std::mem;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{Consumer, Credentials, Token},
	error::ConfigError,
	handshake::{Authorizer, HandshakeOptions, TokenExchanger},
	http::{ApiResponse, ApiTransport},
	obs::{self, Operation, OperationSpan, Outcome},
	provider::ApiEndpoints,
	sign::{Method, SignedRequest, Signer},
};

#[cfg(feature = "reqwest")]
/// Connection specialized for the crate's default reqwest transport.
pub type ReqwestConnection = Connection<ReqwestTransport>;

/// Authorized session against a single API endpoint.
pub struct Connection<T>
where
	T: ?Sized + ApiTransport,
{
	shared: Arc<Shared<T>>,
	queue: Mutex<Vec<PreparedRequest>>,
}
impl<T> Connection<T>
where
	T: ?Sized + ApiTransport,
{
	/// Validates `credentials` and authorizes, running the handshake when no access token is
	/// stored.
	pub async fn establish(
		credentials: Credentials,
		transport: impl Into<Arc<T>>,
		authorizer: &dyn Authorizer,
	) -> Result<Self> {
		Self::establish_with(credentials, transport, authorizer, HandshakeOptions::default()).await
	}

	/// Same as [`Connection::establish`] with explicit handshake options.
	///
	/// Credential problems surface as [`ConfigError`] before any network call. With both token
	/// fields present no request is made; otherwise the initiate, authorize, and token steps run
	/// in order and the resulting access token is available through
	/// [`Connection::access_token`] for persisting.
	pub async fn establish_with(
		credentials: Credentials,
		transport: impl Into<Arc<T>>,
		authorizer: &dyn Authorizer,
		options: HandshakeOptions,
	) -> Result<Self> {
		credentials.validate()?;

		let endpoints = credentials.endpoints()?;
		let signer = Signer::new(credentials.consumer());
		let transport = transport.into();
		let access_token = match credentials.access_token() {
			Some(token) => token,
			None => {
				if credentials.oauth_token.is_some() || credentials.oauth_token_secret.is_some() {
					obs::partial_token_ignored();
				}

				TokenExchanger::new(transport.as_ref(), &signer, &endpoints, authorizer)
					.with_options(options)
					.run()
					.await?
			},
		};

		Ok(Self::with_signer(endpoints, signer, access_token, transport))
	}

	/// Assembles a connection from an already authorized access token.
	pub fn from_parts(
		endpoints: ApiEndpoints,
		consumer: Consumer,
		access_token: Token,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self::with_signer(endpoints, Signer::new(consumer), access_token, transport.into())
	}

	fn with_signer(
		endpoints: ApiEndpoints,
		signer: Signer,
		access_token: Token,
		transport: Arc<T>,
	) -> Self {
		Self {
			shared: Arc::new(Shared { endpoints, signer, access_token, transport }),
			queue: Mutex::new(Vec::new()),
		}
	}

	/// Endpoints derived from the configured API base.
	pub fn endpoints(&self) -> &ApiEndpoints {
		&self.shared.endpoints
	}

	/// Consumer identity signing every call.
	pub fn consumer(&self) -> &Consumer {
		self.shared.signer.consumer()
	}

	/// Access token signing every call; persist it after a handshake.
	pub fn access_token(&self) -> &Token {
		&self.shared.access_token
	}

	/// Transport shared by single and batched calls.
	pub fn transport(&self) -> &Arc<T> {
		&self.shared.transport
	}

	/// Signs and sends a single call to `{endpoint}{path}`.
	///
	/// The method is validated before anything else, so an unsupported verb never reaches the
	/// network. The response comes back untouched; status interpretation is up to the caller.
	pub async fn request(
		&self,
		method: &str,
		path: &str,
		params: &[(&str, &str)],
		body: &str,
	) -> Result<ApiResponse> {
		const OPERATION: Operation = Operation::Request;

		let method = method.parse::<Method>()?;
		let params = owned_params(params);
		let span = OperationSpan::new(OPERATION, method.as_str());

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span.instrument(self.shared.dispatch(method, path, &params, body)).await;

		obs::record_outcome(OPERATION, Outcome::of(&result));

		result
	}

	/// Queues `times` unsigned copies of a call for the next [`Connection::send_prepared`].
	pub fn prepare(
		&self,
		method: &str,
		path: &str,
		params: &[(&str, &str)],
		body: &str,
		times: usize,
	) -> Result<()> {
		let entry = PreparedRequest {
			method: method.parse()?,
			path: path.to_owned(),
			params: owned_params(params),
			body: body.to_owned(),
		};
		let mut queue = self.queue.lock();

		queue.extend(std::iter::repeat_n(entry, times));

		Ok(())
	}

	/// Number of queued entries awaiting [`Connection::send_prepared`].
	pub fn pending(&self) -> usize {
		self.queue.lock().len()
	}

	/// Drains the queue and dispatches every entry as its own task.
	///
	/// The queue is empty when this returns, whether or not any unit has finished. Each entry is
	/// signed inside its task, so nonces and timestamps reflect dispatch time rather than queue
	/// time. Completions race freely; nothing is retried.
	pub fn send_prepared(&self) -> Result<BatchHandle> {
		let runtime =
			tokio::runtime::Handle::try_current().map_err(|_| ConfigError::RuntimeUnavailable)?;
		let queued = mem::take(&mut *self.queue.lock());

		Ok(BatchHandle::spawn(&self.shared, queued, &runtime))
	}
}
#[cfg(feature = "reqwest")]
impl Connection<ReqwestTransport> {
	/// Establishes a connection over a default reqwest transport.
	pub async fn connect(credentials: Credentials, authorizer: &dyn Authorizer) -> Result<Self> {
		Self::establish(credentials, ReqwestTransport::default(), authorizer).await
	}
}
impl<T> Debug for Connection<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connection")
			.field("endpoint", &self.shared.endpoints.base)
			.field("consumer_key", &self.shared.signer.consumer().key)
			.field("oauth_token", &self.shared.access_token.key)
			.field("pending", &self.pending())
			.finish()
	}
}

/// Read-only state shared by the connection and its batch workers.
pub(crate) struct Shared<T>
where
	T: ?Sized + ApiTransport,
{
	endpoints: ApiEndpoints,
	signer: Signer,
	access_token: Token,
	transport: Arc<T>,
}
impl<T> Shared<T>
where
	T: ?Sized + ApiTransport,
{
	pub(crate) async fn dispatch(
		&self,
		method: Method,
		path: &str,
		params: &[(String, String)],
		body: &str,
	) -> Result<ApiResponse> {
		let url = self.endpoints.data_url(path)?;
		let parts = self.signer.sign(method, &url, params, Some((&self.access_token).into()))?;
		let request = SignedRequest::new(method, url, parts, body);

		Ok(self.transport.send(request).await?)
	}
}

fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
	params.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect()
}
