use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locked hand-off between a background producer and a cooperative consumer.
///
/// The lock is only held to move items in or out. Consumers take everything
/// queued with [`CandidateQueue::drain_into`] and do their filtering after the
/// lock has been released.
#[derive(Debug)]
pub struct CandidateQueue<T> {
	items: Mutex<VecDeque<T>>,
	done: AtomicBool,
}

impl<T> Default for CandidateQueue<T> {
	fn default() -> Self {
		Self {
			items: Mutex::new(VecDeque::new()),
			done: AtomicBool::new(false),
		}
	}
}

impl<T> CandidateQueue<T> {
	/// Create an empty, unfinished queue.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Push a single candidate.
	pub fn push(&self, item: T) {
		self.lock().push_back(item);
	}

	/// Push every candidate from `batch`, leaving it empty for reuse.
	pub fn push_batch(&self, batch: &mut Vec<T>) {
		if batch.is_empty() {
			return;
		}
		self.lock().extend(batch.drain(..));
	}

	/// Move everything currently queued onto the back of `out`.
	///
	/// Returns the number of items moved.
	pub fn drain_into(&self, out: &mut VecDeque<T>) -> usize {
		let mut items = self.lock();
		let moved = items.len();
		out.extend(items.drain(..));
		moved
	}

	/// Number of queued candidates.
	#[must_use]
	pub fn len(&self) -> usize {
		self.lock().len()
	}

	/// Whether nothing is queued right now.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Record that the producer will not push anything else.
	pub fn mark_done(&self) {
		self.done.store(true, Ordering::Release);
	}

	/// Whether the producer has finished.
	#[must_use]
	pub fn is_done(&self) -> bool {
		self.done.load(Ordering::Acquire)
	}

	/// Whether the producer has finished and everything it pushed was taken.
	///
	/// The done flag is read before the queue is inspected, so a producer that
	/// pushes its last batch and then marks itself done can never be observed
	/// as finished while that batch is still queued.
	#[must_use]
	pub fn is_finished(&self) -> bool {
		let done = self.is_done();
		done && self.is_empty()
	}

	fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
		self.items.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
