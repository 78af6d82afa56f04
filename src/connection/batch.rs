//! Concurrent dispatch of prepared requests.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use tokio::{runtime::Handle, task::JoinSet};
// self
use crate::{
	_prelude::*,
	connection::Shared,
	http::{ApiResponse, ApiTransport},
	obs::{self, Operation, OperationSpan, Outcome},
	sign::Method,
};

/// Unsigned call stored by [`Connection::prepare`](crate::Connection::prepare).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	/// Verb to send with.
	pub method: Method,
	/// Path appended to the API base.
	pub path: String,
	/// Non-protocol parameters.
	pub params: Vec<(String, String)>,
	/// Raw body; empty for none.
	pub body: String,
}

/// Result of one batch unit.
#[derive(Debug)]
pub struct BatchOutcome {
	/// Position of the unit in the drained queue.
	pub index: usize,
	/// Raw response, or the error that prevented one.
	pub result: Result<ApiResponse>,
}
impl BatchOutcome {
	/// HTTP status when a response arrived.
	pub fn status(&self) -> Option<u16> {
		self.result.as_ref().ok().map(|response| response.status)
	}
}

/// Outcomes collected by [`BatchHandle::join_or_cancel`].
#[derive(Debug)]
pub struct BatchReport {
	/// Finished units in completion order.
	pub outcomes: Vec<BatchOutcome>,
	/// `true` when the cancel signal fired before every unit finished.
	pub cancelled: bool,
}

#[derive(Debug)]
struct BatchProgress {
	total: usize,
	done: AtomicUsize,
}
impl BatchProgress {
	fn new(total: usize) -> Self {
		Self { total, done: AtomicUsize::new(0) }
	}

	/// Marks one unit finished and returns the new count.
	fn record(&self) -> usize {
		self.done.fetch_add(1, Ordering::AcqRel) + 1
	}

	fn done(&self) -> usize {
		self.done.load(Ordering::Acquire)
	}
}

/// Handle over an in-flight batch returned by
/// [`Connection::send_prepared`](crate::Connection::send_prepared).
///
/// Dropping the handle detaches the remaining units; they keep running to completion in the
/// background and their outcomes are discarded.
pub struct BatchHandle {
	units: JoinSet<BatchOutcome>,
	progress: Arc<BatchProgress>,
}
impl BatchHandle {
	pub(crate) fn spawn<T>(
		shared: &Arc<Shared<T>>,
		queued: Vec<PreparedRequest>,
		runtime: &Handle,
	) -> Self
	where
		T: ?Sized + ApiTransport,
	{
		let progress = Arc::new(BatchProgress::new(queued.len()));
		let mut units = JoinSet::new();

		for (index, entry) in queued.into_iter().enumerate() {
			let shared = Arc::clone(shared);
			let progress = Arc::clone(&progress);

			units.spawn_on(
				async move {
					const OPERATION: Operation = Operation::BatchUnit;

					let span = OperationSpan::new(OPERATION, entry.method.as_str());

					obs::record_outcome(OPERATION, Outcome::Attempt);

					let result = span
						.instrument(shared.dispatch(
							entry.method,
							&entry.path,
							&entry.params,
							&entry.body,
						))
						.await;

					obs::record_outcome(OPERATION, Outcome::of(&result));

					let outcome = BatchOutcome { index, result };
					let done = progress.record();

					obs::batch_unit_finished(index, outcome.status(), done, progress.total);

					outcome
				},
				runtime,
			);
		}

		Self { units, progress }
	}

	/// Number of units in the batch.
	pub fn len(&self) -> usize {
		self.progress.total
	}

	/// Returns `true` when the drained queue was empty.
	pub fn is_empty(&self) -> bool {
		self.progress.total == 0
	}

	/// Units finished so far, including detached ones.
	pub fn completed(&self) -> usize {
		self.progress.done()
	}

	/// Waits for every unit and returns the outcomes in completion order.
	pub async fn join(mut self) -> Vec<BatchOutcome> {
		let mut outcomes = Vec::with_capacity(self.len());

		while let Some(joined) = self.units.join_next().await {
			outcomes.extend(unwrap_joined(joined));
		}

		outcomes
	}

	/// Collects outcomes until every unit finishes or `cancel` resolves.
	///
	/// Cancellation is best-effort: units already on the wire are detached rather than aborted,
	/// so the server may still observe them.
	pub async fn join_or_cancel<F>(mut self, cancel: F) -> BatchReport
	where
		F: Future,
	{
		let mut outcomes = Vec::with_capacity(self.len());
		let mut cancel = std::pin::pin!(cancel);

		loop {
			tokio::select! {
				biased;

				joined = self.units.join_next() => match joined {
					Some(joined) => outcomes.extend(unwrap_joined(joined)),
					None => return BatchReport { outcomes, cancelled: false },
				},
				_ = &mut cancel => return BatchReport { outcomes, cancelled: true },
			}
		}
	}
}
impl Debug for BatchHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BatchHandle")
			.field("total", &self.progress.total)
			.field("completed", &self.progress.done())
			.finish()
	}
}
impl Drop for BatchHandle {
	fn drop(&mut self) {
		self.units.detach_all();
	}
}

fn unwrap_joined(joined: Result<BatchOutcome, tokio::task::JoinError>) -> Option<BatchOutcome> {
	match joined {
		Ok(outcome) => Some(outcome),
		Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
		// Units are never aborted, so this only happens during runtime shutdown.
		Err(_) => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn progress_counts_completions() {
		let progress = BatchProgress::new(2);

		assert_eq!(progress.record(), 1);
		assert_eq!(progress.record(), 2);
		assert_eq!(progress.done(), 2);
	}

	#[test]
	fn outcome_status_reflects_result() {
		let ok = BatchOutcome { index: 0, result: Ok(ApiResponse::new(201, "")) };
		let failed =
			BatchOutcome { index: 1, result: Err(Error::Upstream { status: 500, body: String::new() }) };

		assert_eq!(ok.status(), Some(201));
		assert_eq!(failed.status(), None);
	}
}
