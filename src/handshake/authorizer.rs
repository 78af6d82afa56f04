//! Pluggable user-authorization step of the handshake.

// std
use std::{
	io::{BufRead, BufReader, Read},
	thread,
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, error::HandshakeError};

/// Boxed future returned by [`Authorizer::authorize`].
pub type AuthorizeFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Collects the `oauth_verifier` for an authorize URL.
///
/// Real deployments put a human in the loop (browser + prompt); automation and tests supply the
/// verifier directly with [`StaticVerifier`].
pub trait Authorizer
where
	Self: Send + Sync,
{
	/// Presents `authorize_url` and resolves with the verifier the provider handed the user.
	fn authorize<'a>(&'a self, authorize_url: &'a Url) -> AuthorizeFuture<'a>;
}

/// Interactive authorizer: prints the URL to stderr and reads the verifier from stdin.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleAuthorizer {
	open_browser: bool,
}
impl ConsoleAuthorizer {
	/// Also tries to open the URL in the default browser (needs the `browser-open` feature).
	pub fn open_browser(mut self, open: bool) -> Self {
		self.open_browser = open;

		self
	}
}
impl Authorizer for ConsoleAuthorizer {
	fn authorize<'a>(&'a self, authorize_url: &'a Url) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			eprintln!();
			eprintln!("Missing user specific credentials. Starting the authorization process.");
			eprintln!(" - 1. Open this URL in a browser: {authorize_url}");
			eprintln!(" - 2. Sign in and grant the application access.");
			eprintln!(" - 3. Copy the oauth_verifier value the provider shows afterwards.");

			if self.open_browser && !try_open_in_browser(authorize_url) {
				eprintln!("      (Could not open a browser; use the URL above.)");
			}

			eprint!(" - 4. Enter OAuth verifier: ");

			read_verifier(std::io::stdin()).await
		})
	}
}

/// Authorizer that answers every request with a fixed verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticVerifier(String);
impl StaticVerifier {
	/// Wraps the verifier to return.
	pub fn new(verifier: impl Into<String>) -> Self {
		Self(verifier.into())
	}
}
impl Authorizer for StaticVerifier {
	fn authorize<'a>(&'a self, _authorize_url: &'a Url) -> AuthorizeFuture<'a> {
		Box::pin(async move { Ok(self.0.clone()) })
	}
}

/// Reads one line from `input` on a detached thread.
///
/// The blocking read never runs on a runtime worker, so dropping the returned future (for example
/// when the authorization timeout fires) leaves runtime shutdown unaffected.
async fn read_verifier<R>(input: R) -> Result<String>
where
	R: 'static + Read + Send,
{
	let (tx, rx) = oneshot::channel();

	thread::Builder::new()
		.name("ppapi-access-verifier".into())
		.spawn(move || {
			let mut line = String::new();
			let read = BufReader::new(input).read_line(&mut line);

			// The receiver is gone once the handshake gave up waiting.
			let _ = tx.send(read.map(|read| (read, line)));
		})
		.map_err(|e| HandshakeError::Authorization { reason: e.to_string() })?;

	let (read, line) = rx
		.await
		.map_err(|_| HandshakeError::Authorization {
			reason: "verifier reader stopped without an answer".into(),
		})?
		.map_err(|e| HandshakeError::Authorization { reason: e.to_string() })?;

	if read == 0 {
		return Err(HandshakeError::Authorization {
			reason: "stdin closed before a verifier was entered".into(),
		}
		.into());
	}

	Ok(line.trim().to_owned())
}

#[cfg(feature = "browser-open")]
fn try_open_in_browser(url: &Url) -> bool {
	webbrowser::open(url.as_str()).is_ok()
}
#[cfg(not(feature = "browser-open"))]
fn try_open_in_browser(_url: &Url) -> bool {
	false
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn static_verifier_ignores_url() {
		let authorizer = StaticVerifier::new("v3r");
		let url = Url::parse("https://api.example.com/authorize?oauth_token=req")
			.expect("Authorize URL fixture should parse.");
		let verifier =
			authorizer.authorize(&url).await.expect("Static verifier should always succeed.");

		assert_eq!(verifier, "v3r");
	}

	/// Blocks every read for a long time, like a terminal nobody types into.
	struct StalledInput(StdDuration);
	impl Read for StalledInput {
		fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
			thread::sleep(self.0);

			Ok(0)
		}
	}

	#[tokio::test]
	async fn verifier_is_read_and_trimmed() {
		let verifier = read_verifier(std::io::Cursor::new(b"  v3r \nleftover\n".to_vec()))
			.await
			.expect("A line of input should yield a verifier.");

		assert_eq!(verifier, "v3r");
	}

	#[tokio::test]
	async fn closed_input_is_an_authorization_error() {
		let err = read_verifier(std::io::empty()).await.expect_err("EOF should not yield a verifier.");

		assert!(matches!(err, Error::Handshake(HandshakeError::Authorization { .. })));
	}

	#[test]
	fn timed_out_read_does_not_hold_runtime_shutdown() {
		let runtime = tokio::runtime::Builder::new_multi_thread()
			.worker_threads(1)
			.enable_time()
			.build()
			.expect("Test runtime should build.");
		let outcome = runtime.block_on(async {
			tokio::time::timeout(
				StdDuration::from_millis(50),
				read_verifier(StalledInput(StdDuration::from_secs(30))),
			)
			.await
		});

		assert!(outcome.is_err(), "Stalled input should hit the timeout.");

		let started = std::time::Instant::now();

		drop(runtime);

		assert!(
			started.elapsed() < StdDuration::from_secs(5),
			"Runtime shutdown should not wait for the pending stdin read."
		);
	}

	#[test]
	fn console_authorizer_defaults_to_no_browser() {
		assert!(!ConsoleAuthorizer::default().open_browser);
		assert!(ConsoleAuthorizer::default().open_browser(true).open_browser);
	}
}
