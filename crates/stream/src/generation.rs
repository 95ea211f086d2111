use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Owner of the live generation counter.
///
/// Exactly one generation is live at a time. Calling [`Generation::advance`]
/// makes every previously issued [`GenerationToken`] stale immediately; the
/// work holding those tokens notices on its next [`GenerationToken::is_live`]
/// check and exits on its own.
#[derive(Clone, Default)]
pub struct Generation {
	live: Arc<AtomicU64>,
}

impl Generation {
	/// Create a counter with no work started yet.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Supersede the live generation and return a token for the new one.
	pub fn advance(&self) -> GenerationToken {
		let id = self.live.fetch_add(1, Ordering::AcqRel) + 1;
		GenerationToken {
			id,
			live: Arc::clone(&self.live),
		}
	}

	/// Invalidate the live generation without starting new work.
	pub fn cancel(&self) {
		self.live.fetch_add(1, Ordering::AcqRel);
	}

	/// Identifier of the live generation.
	#[must_use]
	pub fn live_id(&self) -> u64 {
		self.live.load(Ordering::Acquire)
	}

	/// Token for the generation that is live right now.
	#[must_use]
	pub fn current(&self) -> GenerationToken {
		GenerationToken {
			id: self.live_id(),
			live: Arc::clone(&self.live),
		}
	}
}

impl fmt::Debug for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Generation")
			.field("live", &self.live_id())
			.finish()
	}
}

/// Captured generation identifier that can be compared against the live one.
#[derive(Clone)]
pub struct GenerationToken {
	id: u64,
	live: Arc<AtomicU64>,
}

impl GenerationToken {
	/// Identifier captured when the token was issued.
	#[must_use]
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Whether no newer generation has started since this token was issued.
	#[must_use]
	pub fn is_live(&self) -> bool {
		self.live.load(Ordering::Acquire) == self.id
	}

	/// Whether both tokens were issued for the same generation of the same counter.
	#[must_use]
	pub fn same_generation(&self, other: &GenerationToken) -> bool {
		self.id == other.id && Arc::ptr_eq(&self.live, &other.live)
	}
}

impl fmt::Debug for GenerationToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenerationToken")
			.field("id", &self.id)
			.field("live", &self.is_live())
			.finish()
	}
}
