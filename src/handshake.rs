//! Three-legged OAuth 1.0a handshake.
//!
//! The exchange is a typestate chain: [`TokenExchanger::request_token`] yields a
//! [`RequestToken`], [`TokenExchanger::authorize`] turns it into a [`VerifiedRequestToken`] by
//! asking an [`Authorizer`] for the user's `oauth_verifier`, and
//! [`TokenExchanger::access_token`] trades that for the long-lived access [`Token`]. Any failure
//! is fatal; the caller restarts from the first step.

pub mod authorizer;

pub use authorizer::*;

// self
use crate::{
	_prelude::*,
	auth::Token,
	error::HandshakeError,
	http::{ApiResponse, ApiTransport},
	obs::{self, Operation, OperationSpan, Outcome},
	provider::ApiEndpoints,
	sign::{Method, SignedRequest, Signer, SigningToken},
};

/// Steps of the three-legged exchange, used to label spans and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeStage {
	/// Fetching the request token from `{endpoint}/initiate`.
	Initiate,
	/// Waiting for the user to approve the request token.
	Authorize,
	/// Trading the verified request token at `{endpoint}/token`.
	AccessToken,
}
impl HandshakeStage {
	/// Returns a stable label suitable for span fields and messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandshakeStage::Initiate => "initiate",
			HandshakeStage::Authorize => "authorize",
			HandshakeStage::AccessToken => "access_token",
		}
	}
}
impl Display for HandshakeStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Tunables for the interactive part of the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandshakeOptions {
	/// Upper bound on the wait for the user's verifier; `None` waits forever.
	pub authorize_timeout: Option<StdDuration>,
}
impl HandshakeOptions {
	/// Default bound on the authorization step (10 minutes).
	pub const DEFAULT_AUTHORIZE_TIMEOUT: StdDuration = StdDuration::from_secs(600);

	/// Overrides the authorization timeout.
	pub fn with_authorize_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.authorize_timeout = timeout;

		self
	}
}
impl Default for HandshakeOptions {
	fn default() -> Self {
		Self { authorize_timeout: Some(Self::DEFAULT_AUTHORIZE_TIMEOUT) }
	}
}

/// Short-lived token issued by `{endpoint}/initiate`; invalid once exchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestToken(pub Token);

/// Request token the user approved, paired with the returned verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedRequestToken {
	/// Request token issued by the initiate step.
	pub token: Token,
	/// One-time `oauth_verifier` proving the approval.
	pub verifier: String,
}

/// Drives the three network/human round-trips that mint an access token.
pub struct TokenExchanger<'a, T>
where
	T: ?Sized + ApiTransport,
{
	transport: &'a T,
	signer: &'a Signer,
	endpoints: &'a ApiEndpoints,
	authorizer: &'a dyn Authorizer,
	options: HandshakeOptions,
}
impl<'a, T> TokenExchanger<'a, T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an exchanger with default [`HandshakeOptions`].
	pub fn new(
		transport: &'a T,
		signer: &'a Signer,
		endpoints: &'a ApiEndpoints,
		authorizer: &'a dyn Authorizer,
	) -> Self {
		Self { transport, signer, endpoints, authorizer, options: HandshakeOptions::default() }
	}

	/// Replaces the handshake options.
	pub fn with_options(mut self, options: HandshakeOptions) -> Self {
		self.options = options;

		self
	}

	/// Runs every step and returns the access token.
	pub async fn run(&self) -> Result<Token> {
		const OPERATION: Operation = Operation::Handshake;

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = async {
			let request_token = self.request_token().await?;
			let verified = self.authorize(request_token).await?;

			self.access_token(verified).await
		}
		.await;

		obs::record_outcome(OPERATION, Outcome::of(&result));

		if let Ok(token) = &result {
			obs::access_token_obtained(&token.key);
		}

		result
	}

	/// Fetches a request token signed with consumer credentials only.
	pub async fn request_token(&self) -> Result<RequestToken> {
		let stage = HandshakeStage::Initiate;
		let token = self.exchange(stage, &self.endpoints.initiate, None).await?;

		Ok(RequestToken(token))
	}

	/// Hands the authorize URL to the [`Authorizer`] and waits for the verifier.
	pub async fn authorize(&self, request_token: RequestToken) -> Result<VerifiedRequestToken> {
		let RequestToken(token) = request_token;
		let span = OperationSpan::new(Operation::Handshake, HandshakeStage::Authorize.as_str());
		let authorize_url = self.endpoints.authorize_url(&token.key);
		let pending = span.instrument(self.authorizer.authorize(&authorize_url));
		let verifier = match self.options.authorize_timeout {
			Some(after) => tokio::time::timeout(after, pending)
				.await
				.map_err(|_| HandshakeError::AuthorizationTimedOut { after })??,
			None => pending.await?,
		};
		let verifier = verifier.trim();

		if verifier.is_empty() {
			return Err(HandshakeError::EmptyVerifier.into());
		}

		Ok(VerifiedRequestToken { token, verifier: verifier.to_owned() })
	}

	/// Trades the verified request token for the access token.
	pub async fn access_token(&self, verified: VerifiedRequestToken) -> Result<Token> {
		let signing = SigningToken::from(&verified.token).with_verifier(&verified.verifier);

		self.exchange(HandshakeStage::AccessToken, &self.endpoints.token, Some(signing)).await
	}

	async fn exchange(
		&self,
		stage: HandshakeStage,
		url: &Url,
		token: Option<SigningToken<'_>>,
	) -> Result<Token> {
		let span = OperationSpan::new(Operation::Handshake, stage.as_str());

		span.instrument(async move {
			let parts = self.signer.sign(Method::Get, url, &[], token)?;
			let request = SignedRequest::new(Method::Get, url.clone(), parts, "");
			let response = self.transport.send(request).await?;

			token_from_response(stage, &response)
		})
		.await
	}
}

/// Parses an `application/x-www-form-urlencoded` body; the first value wins on repeated keys.
pub fn parse_form_response(body: &str) -> BTreeMap<String, String> {
	let mut parsed = BTreeMap::new();

	for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
		parsed.entry(key.into_owned()).or_insert_with(|| value.into_owned());
	}

	parsed
}

fn token_from_response(stage: HandshakeStage, response: &ApiResponse) -> Result<Token> {
	if !response.is_success() {
		return Err(HandshakeError::Rejected {
			stage,
			status: response.status,
			body: response.text(),
		}
		.into());
	}

	let mut parsed = parse_form_response(&response.text());
	let mut take = |field: &'static str| {
		parsed
			.remove(field)
			.filter(|value| !value.is_empty())
			.ok_or(HandshakeError::MissingField { stage, field })
	};
	let key = take("oauth_token")?;
	let secret = take("oauth_token_secret")?;

	Ok(Token::new(key, secret))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_token_pairs() {
		let parsed = parse_form_response("oauth_token=ABC&oauth_token_secret=XYZ");

		assert_eq!(parsed.get("oauth_token").map(String::as_str), Some("ABC"));
		assert_eq!(parsed.get("oauth_token_secret").map(String::as_str), Some("XYZ"));
		assert_eq!(parsed.len(), 2);
	}

	#[test]
	fn first_value_wins_on_repeated_keys() {
		let parsed = parse_form_response("oauth_token=first&oauth_token=second&x=a%20b\n");

		assert_eq!(parsed.get("oauth_token").map(String::as_str), Some("first"));
		assert_eq!(parsed.get("x").map(String::as_str), Some("a b"));
	}

	#[test]
	fn token_from_response_requires_both_fields() {
		let token = token_from_response(
			HandshakeStage::Initiate,
			&ApiResponse::new(200, "oauth_token=ABC&oauth_token_secret=XYZ&oauth_callback_confirmed=true"),
		)
		.expect("Complete response should yield a token.");

		assert_eq!(token.key, "ABC");
		assert_eq!(token.secret.expose(), "XYZ");

		let err = token_from_response(
			HandshakeStage::AccessToken,
			&ApiResponse::new(200, "oauth_token=ABC"),
		)
		.expect_err("Response without a secret must fail.");

		assert!(matches!(
			err,
			Error::Handshake(HandshakeError::MissingField {
				stage: HandshakeStage::AccessToken,
				field: "oauth_token_secret",
			})
		));
	}

	#[test]
	fn token_from_response_rejects_error_statuses() {
		let err = token_from_response(
			HandshakeStage::Initiate,
			&ApiResponse::new(401, "oauth_problem=signature_invalid"),
		)
		.expect_err("Non-success status must fail the handshake.");

		match err {
			Error::Handshake(HandshakeError::Rejected { stage, status, body }) => {
				assert_eq!(stage, HandshakeStage::Initiate);
				assert_eq!(status, 401);
				assert_eq!(body, "oauth_problem=signature_invalid");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn default_options_bound_authorization() {
		let options = HandshakeOptions::default();

		assert_eq!(options.authorize_timeout, Some(HandshakeOptions::DEFAULT_AUTHORIZE_TIMEOUT));
		assert_eq!(options.with_authorize_timeout(None).authorize_timeout, None);
	}
}
