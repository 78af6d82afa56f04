//! OAuth 1.0a HMAC-SHA1 request signing (RFC 5849).
//!
//! [`Signer`] owns the consumer identity and turns a `(method, url, params, token)` tuple into
//! [`SignedParts`]: the `Authorization` header plus the non-protocol parameters that still have
//! to travel in the query or body. Every call draws a fresh nonce and timestamp, so two signings
//! of the same logical request never produce the same header. The individual RFC steps
//! ([`base_string`], [`signing_key`], [`hmac_sha1_base64`]) are public so a signature can be
//! verified independently.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use sha1::Sha1;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{Consumer, Token},
	error::ConfigError,
};

type HmacSha1 = Hmac<Sha1>;

// RFC 5849 §3.6: ALPHA, DIGIT, '-', '.', '_', '~' stay literal; everything else is encoded with
// upper-case hex.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
const PROTOCOL_PREFIX: &str = "oauth_";

/// Signature method advertised in every request.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version advertised in every request.
pub const OAUTH_VERSION: &str = "1.0";
/// `Content-Type` of form-encoded `POST` bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP verbs the API accepts for signed calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`; extra parameters travel in the query string.
	Get,
	/// `POST`; extra parameters travel as a form-encoded body.
	Post,
	/// `PUT`; the caller body travels untouched.
	Put,
}
impl Method {
	/// Returns the upper-case verb used on the wire and in the base string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"GET" => Ok(Method::Get),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			_ => Err(Error::InvalidMethod { method: s.to_owned() }),
		}
	}
}

/// Nonce + timestamp pair bound into a single signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Freshness {
	/// Single-use random value, decimal digits when generated.
	pub nonce: String,
	/// Unix timestamp in UTC seconds.
	pub timestamp: i64,
}
impl Freshness {
	/// Draws a new random nonce and reads the current UTC time.
	pub fn generate() -> Self {
		Self {
			nonce: rand::rng().random::<u64>().to_string(),
			timestamp: OffsetDateTime::now_utc().unix_timestamp(),
		}
	}
}

/// Borrowed token view used while signing.
#[derive(Clone, Copy)]
pub struct SigningToken<'a> {
	/// `oauth_token` value.
	pub key: &'a str,
	/// Token secret, second half of the signing key.
	pub secret: &'a str,
	/// `oauth_verifier`, only present while exchanging an authorized request token.
	pub verifier: Option<&'a str>,
}
impl<'a> SigningToken<'a> {
	/// Attaches an `oauth_verifier` to the token view.
	pub fn with_verifier(mut self, verifier: &'a str) -> Self {
		self.verifier = Some(verifier);

		self
	}
}
impl<'a> From<&'a Token> for SigningToken<'a> {
	fn from(token: &'a Token) -> Self {
		Self { key: &token.key, secret: token.secret.expose(), verifier: None }
	}
}
impl Debug for SigningToken<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningToken")
			.field("key", &self.key)
			.field("secret", &"<redacted>")
			.field("verifier_set", &self.verifier.is_some())
			.finish()
	}
}

/// Output of a single signing pass.
#[derive(Clone, Debug)]
pub struct SignedParts {
	/// Ready-to-use `Authorization` header value.
	pub authorization: String,
	/// Caller parameters that are not OAuth protocol parameters.
	pub params: Vec<(String, String)>,
	/// Nonce bound into the signature.
	pub nonce: String,
	/// Timestamp bound into the signature.
	pub timestamp: i64,
	/// Base64 HMAC-SHA1 signature.
	pub signature: String,
	/// Signature base string the HMAC was computed over.
	pub base_string: String,
}

/// Signs requests on behalf of a single consumer.
#[derive(Clone, Debug)]
pub struct Signer {
	consumer: Consumer,
}
impl Signer {
	/// Creates a signer for the provided consumer.
	pub fn new(consumer: Consumer) -> Self {
		Self { consumer }
	}

	/// Consumer identity used for every signature.
	pub fn consumer(&self) -> &Consumer {
		&self.consumer
	}

	/// Signs with a freshly generated nonce and timestamp.
	pub fn sign(
		&self,
		method: Method,
		url: &Url,
		params: &[(String, String)],
		token: Option<SigningToken<'_>>,
	) -> Result<SignedParts> {
		self.sign_at(method, url, params, token, Freshness::generate())
	}

	/// Signs with a caller-supplied nonce and timestamp.
	///
	/// Reusing a [`Freshness`] against a live provider is a replay and will be rejected; this
	/// exists for reproducible signatures.
	pub fn sign_at(
		&self,
		method: Method,
		url: &Url,
		params: &[(String, String)],
		token: Option<SigningToken<'_>>,
		freshness: Freshness,
	) -> Result<SignedParts> {
		let Freshness { nonce, timestamp } = freshness;
		let mut protocol = vec![
			("oauth_consumer_key", self.consumer.key.clone()),
			("oauth_nonce", nonce.clone()),
			("oauth_signature_method", SIGNATURE_METHOD.to_owned()),
			("oauth_timestamp", timestamp.to_string()),
			("oauth_version", OAUTH_VERSION.to_owned()),
		];

		if let Some(token) = token {
			protocol.push(("oauth_token", token.key.to_owned()));

			if let Some(verifier) = token.verifier {
				protocol.push(("oauth_verifier", verifier.to_owned()));
			}
		}

		let extra = params
			.iter()
			.filter(|(key, _)| !key.starts_with(PROTOCOL_PREFIX))
			.cloned()
			.collect::<Vec<_>>();
		let signed_params = extra
			.iter()
			.cloned()
			.chain(protocol.iter().map(|(key, value)| ((*key).to_owned(), value.clone())))
			.collect::<Vec<_>>();
		let base_string = base_string(method, url, &signed_params);
		let key = signing_key(
			self.consumer.secret.expose(),
			token.map(|token| token.secret).unwrap_or_default(),
		);
		let signature = hmac_sha1_base64(&key, &base_string)?;

		protocol.push(("oauth_signature", signature.clone()));
		protocol.sort();

		let authorization = format!(
			"OAuth {}",
			protocol
				.iter()
				.map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
				.collect::<Vec<_>>()
				.join(", ")
		);

		Ok(SignedParts { authorization, params: extra, nonce, timestamp, signature, base_string })
	}
}

/// Fully formed request, ready to hand to a transport.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// HTTP verb.
	pub method: Method,
	/// Final URL, including any query parameters that were signed.
	pub url: Url,
	/// `Authorization` header value.
	pub authorization: String,
	/// `Content-Type` of the body, when one is sent.
	pub content_type: Option<&'static str>,
	/// Request body, when one is sent.
	pub body: Option<String>,
}
impl SignedRequest {
	/// Places the non-protocol parameters where the provider reads them.
	///
	/// `GET` and `PUT` append them to the query; `POST` form-encodes them into the body and only
	/// falls back to the raw caller body when there are none. `PUT` always sends the raw body.
	pub fn new(method: Method, mut url: Url, parts: SignedParts, body: &str) -> Self {
		let SignedParts { authorization, params, .. } = parts;
		let (content_type, body) = match method {
			Method::Post if !params.is_empty() => (
				Some(FORM_CONTENT_TYPE),
				Some(form_urlencoded::Serializer::new(String::new()).extend_pairs(&params).finish()),
			),
			Method::Get => {
				append_query(&mut url, &params);

				(None, None)
			},
			Method::Post | Method::Put => {
				if method == Method::Put {
					append_query(&mut url, &params);
				}

				if body.is_empty() { (None, None) } else { (None, Some(body.to_owned())) }
			},
		};

		Self { method, url, authorization, content_type, body }
	}
}

/// Percent-encodes a value with the RFC 3986 unreserved set.
pub fn encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Builds the RFC 5849 §3.4.1 signature base string.
///
/// Query parameters already present on `url` are folded into the parameter string alongside
/// `params`; the URL itself is reduced to scheme, authority, and path.
pub fn base_string(method: Method, url: &Url, params: &[(String, String)]) -> String {
	let mut encoded = url
		.query_pairs()
		.map(|(key, value)| (encode(&key), encode(&value)))
		.chain(params.iter().map(|(key, value)| (encode(key), encode(value))))
		.collect::<Vec<_>>();

	encoded.sort();

	let normalized =
		encoded.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&");
	let mut base_url = url.clone();

	base_url.set_query(None);
	base_url.set_fragment(None);

	format!("{}&{}&{}", method.as_str(), encode(base_url.as_str()), encode(&normalized))
}

/// Builds the HMAC key `enc(consumer_secret)&enc(token_secret)`.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
	format!("{}&{}", encode(consumer_secret), encode(token_secret))
}

/// Computes the base64-encoded HMAC-SHA1 of `base_string` under `key`.
pub fn hmac_sha1_base64(key: &str, base_string: &str) -> Result<String> {
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| ConfigError::InvalidSigningKey)?;

	mac.update(base_string.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn append_query(url: &mut Url, params: &[(String, String)]) {
	if !params.is_empty() {
		url.query_pairs_mut().extend_pairs(params);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Test URL should parse.")
	}

	fn signer(key: &str, secret: &str) -> Signer {
		Signer::new(Consumer::new(key, secret))
	}

	fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
		values.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect()
	}

	#[test]
	fn matches_published_twitter_vector() {
		let token = Token::new(
			"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
			"LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
		);
		let parts = signer("xvz1evFS4wEEPTGEFPHBog", "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw")
			.sign_at(
				Method::Post,
				&url("https://api.twitter.com/1.1/statuses/update.json?include_entities=true"),
				&pairs(&[("status", "Hello Ladies + Gentlemen, a signed OAuth request!")]),
				Some((&token).into()),
				Freshness {
					nonce: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".into(),
					timestamp: 1_318_622_958,
				},
			)
			.expect("Signing the Twitter vector should succeed.");

		assert_eq!(
			parts.base_string,
			"POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
		);
		assert_eq!(parts.signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
		assert!(parts.authorization.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
	}

	#[test]
	fn base_string_for_profile_request() {
		let token = Token::new("t", "ts");
		let parts = signer("k", "s")
			.sign_at(
				Method::Get,
				&url("https://api.example.com/1/user/me/profile.json"),
				&[],
				Some((&token).into()),
				Freshness { nonce: "1234".into(), timestamp: 1_700_000_000 },
			)
			.expect("Signing should succeed.");

		assert_eq!(
			parts.base_string,
			"GET&https%3A%2F%2Fapi.example.com%2F1%2Fuser%2Fme%2Fprofile.json&oauth_consumer_key%3Dk%26oauth_nonce%3D1234%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1700000000%26oauth_token%3Dt%26oauth_version%3D1.0"
		);
		assert_eq!(
			parts.signature,
			hmac_sha1_base64("s&ts", &parts.base_string).expect("HMAC should succeed.")
		);
		assert!(parts.authorization.starts_with("OAuth "));

		for expected in [
			"oauth_consumer_key=\"k\"",
			"oauth_token=\"t\"",
			"oauth_signature_method=\"HMAC-SHA1\"",
			"oauth_version=\"1.0\"",
			"oauth_nonce=\"1234\"",
			"oauth_timestamp=\"1700000000\"",
		] {
			assert!(parts.authorization.contains(expected), "Header is missing {expected}.");
		}
	}

	#[test]
	fn fresh_signatures_differ_but_both_verify() {
		let signer = signer("k", "s");
		let token = Token::new("t", "ts");
		let target = url("https://api.example.com/1/user/me/projects.json");
		let params = pairs(&[("limit", "10")]);
		let first = signer
			.sign(Method::Get, &target, &params, Some((&token).into()))
			.expect("First signing should succeed.");
		let second = signer
			.sign(Method::Get, &target, &params, Some((&token).into()))
			.expect("Second signing should succeed.");

		assert_ne!(first.nonce, second.nonce);
		assert!(first.nonce.chars().all(|c| c.is_ascii_digit()));

		for parts in [&first, &second] {
			let timestamp = parts.timestamp.to_string();
			let rebuilt = base_string(
				Method::Get,
				&target,
				&pairs(&[
					("limit", "10"),
					("oauth_consumer_key", "k"),
					("oauth_nonce", parts.nonce.as_str()),
					("oauth_signature_method", SIGNATURE_METHOD),
					("oauth_timestamp", timestamp.as_str()),
					("oauth_token", "t"),
					("oauth_version", OAUTH_VERSION),
				]),
			);

			assert_eq!(rebuilt, parts.base_string);
			assert_eq!(
				hmac_sha1_base64(&signing_key("s", "ts"), &rebuilt).expect("HMAC should succeed."),
				parts.signature
			);
		}
	}

	#[test]
	fn consumer_only_signature_uses_empty_token_secret() {
		let parts = signer("k", "s&x")
			.sign(Method::Get, &url("https://api.example.com/initiate"), &[], None)
			.expect("Signing without a token should succeed.");

		assert!(!parts.authorization.contains("oauth_token="));
		assert_eq!(
			parts.signature,
			hmac_sha1_base64("s%26x&", &parts.base_string).expect("HMAC should succeed.")
		);
	}

	#[test]
	fn verifier_and_protocol_params_are_handled() {
		let token = Token::new("req", "req-secret");
		let parts = signer("k", "s")
			.sign(
				Method::Get,
				&url("https://api.example.com/token"),
				&pairs(&[("oauth_nonce", "caller-nonce"), ("name", "Q3 plan")]),
				Some(SigningToken::from(&token).with_verifier("v3r")),
			)
			.expect("Signing with a verifier should succeed.");

		assert!(parts.authorization.contains("oauth_verifier=\"v3r\""));
		assert!(parts.authorization.contains("oauth_token=\"req\""));
		assert!(!parts.authorization.contains("caller-nonce"));
		assert_eq!(parts.params, pairs(&[("name", "Q3 plan")]));
		assert!(parts.base_string.contains("name%3DQ3%2520plan"));
	}

	#[test]
	fn method_parsing_rejects_unsupported_verbs() {
		assert_eq!("GET".parse::<Method>().expect("GET should parse."), Method::Get);
		assert_eq!("POST".parse::<Method>().expect("POST should parse."), Method::Post);
		assert_eq!("PUT".parse::<Method>().expect("PUT should parse."), Method::Put);

		for verb in ["DELETE", "get", "Post", "put", " GET", ""] {
			let err = verb.parse::<Method>().expect_err("Only exact upper-case verbs are accepted.");

			assert!(matches!(err, Error::InvalidMethod { ref method } if method == verb));
		}
	}

	#[test]
	fn signed_request_places_params_per_method() {
		let signer = signer("k", "s");
		let target = url("https://api.example.com/1/items.json");
		let params = pairs(&[("name", "a b")]);
		let sign = |method| {
			signer.sign(method, &target, &params, None).expect("Signing should succeed.")
		};
		let get = SignedRequest::new(Method::Get, target.clone(), sign(Method::Get), "ignored");

		assert_eq!(get.url.as_str(), "https://api.example.com/1/items.json?name=a+b");
		assert!(get.body.is_none());

		let post = SignedRequest::new(Method::Post, target.clone(), sign(Method::Post), "ignored");

		assert_eq!(post.url.as_str(), "https://api.example.com/1/items.json");
		assert_eq!(post.content_type, Some(FORM_CONTENT_TYPE));
		assert_eq!(post.body.as_deref(), Some("name=a+b"));

		let put = SignedRequest::new(Method::Put, target.clone(), sign(Method::Put), "{\"x\":1}");

		assert_eq!(put.url.as_str(), "https://api.example.com/1/items.json?name=a+b");
		assert_eq!(put.body.as_deref(), Some("{\"x\":1}"));

		let raw_post = SignedRequest::new(
			Method::Post,
			target.clone(),
			signer.sign(Method::Post, &target, &[], None).expect("Signing should succeed."),
			"raw",
		);

		assert_eq!(raw_post.body.as_deref(), Some("raw"));
		assert!(raw_post.content_type.is_none());
	}
}
