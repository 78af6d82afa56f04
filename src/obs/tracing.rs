// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by connection operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("ppapi_access.operation", operation = operation.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports a freshly exchanged access token so the caller remembers to persist it.
pub fn access_token_obtained(token_key: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		oauth_token = token_key,
		"Access token obtained; persist it to skip the handshake."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = token_key;
}

/// Reports credentials that carried only one half of an access token.
pub fn partial_token_ignored() {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		"Credentials carry only one of oauth_token/oauth_token_secret; running the handshake."
	);
}

/// Reports a finished batch unit; `status` is `None` when the transport failed.
pub fn batch_unit_finished(index: usize, status: Option<u16>, done: usize, total: usize) {
	#[cfg(feature = "tracing")]
	{
		match status {
			Some(status) => tracing::debug!(index, status, done, total, "Batch unit finished."),
			None => tracing::debug!(index, done, total, "Batch unit failed before a response."),
		}

		if done == total {
			tracing::info!(total, "Batch done.");
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (index, status, done, total);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = OperationSpan::new(Operation::Request, "instrument_passes_output_through");

		assert_eq!(span.instrument(async { "done" }).await, "done");
	}

	#[test]
	fn event_helpers_accept_all_inputs() {
		access_token_obtained("token");
		partial_token_ignored();
		batch_unit_finished(0, Some(200), 1, 2);
		batch_unit_finished(1, None, 2, 2);
	}
}
