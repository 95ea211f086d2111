use std::time::{Duration, Instant};

/// Outcome of one cooperative tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
	/// The budget ran out with work still pending; call again next tick.
	Yield,
	/// Nothing left to do until new work is started.
	Done,
}

impl Tick {
	/// Whether the task wants to be resumed.
	#[must_use]
	pub fn is_pending(self) -> bool {
		matches!(self, Tick::Yield)
	}

	/// Combine the outcome of two tasks sharing one host tick.
	#[must_use]
	pub fn merge(self, other: Tick) -> Tick {
		if self.is_pending() || other.is_pending() {
			Tick::Yield
		} else {
			Tick::Done
		}
	}
}

/// Wall-clock allowance for cooperative work on the host loop.
///
/// Loops call [`FrameBudget::is_exhausted`] after each unit of work and
/// return [`Tick::Yield`] once it reports `true`. The host resumes them on its
/// next tick with a budget that has been [`reset`](FrameBudget::reset).
#[derive(Clone, Copy, Debug)]
pub struct FrameBudget {
	limit: Duration,
	started: Instant,
}

impl FrameBudget {
	/// Start a budget of `limit` measured from now.
	#[must_use]
	pub fn new(limit: Duration) -> Self {
		Self {
			limit,
			started: Instant::now(),
		}
	}

	/// Start a budget in milliseconds.
	#[must_use]
	pub fn from_millis(millis: u64) -> Self {
		Self::new(Duration::from_millis(millis))
	}

	/// Budget that never runs out, for synchronous callers and tests.
	#[must_use]
	pub fn unlimited() -> Self {
		Self::new(Duration::MAX)
	}

	/// Restart the measurement window.
	pub fn reset(&mut self) {
		self.started = Instant::now();
	}

	/// Configured allowance.
	#[must_use]
	pub fn limit(&self) -> Duration {
		self.limit
	}

	/// Time spent since the last reset.
	#[must_use]
	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}

	/// Time left before the task must yield.
	#[must_use]
	pub fn remaining(&self) -> Duration {
		self.limit.saturating_sub(self.elapsed())
	}

	/// Whether the allowance has been used up. A zero budget is always exhausted.
	#[must_use]
	pub fn is_exhausted(&self) -> bool {
		self.elapsed() >= self.limit
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use super::*;

	#[test]
	fn zero_budget_is_always_exhausted() {
		let budget = FrameBudget::new(Duration::ZERO);
		assert!(budget.is_exhausted());
		assert_eq!(budget.remaining(), Duration::ZERO);
	}

	#[test]
	fn unlimited_budget_never_runs_out() {
		let budget = FrameBudget::unlimited();
		assert!(!budget.is_exhausted());
		assert!(budget.remaining() > Duration::from_secs(60 * 60 * 24 * 365));
	}

	#[test]
	fn reset_restarts_the_window() {
		let mut budget = FrameBudget::from_millis(5);
		thread::sleep(Duration::from_millis(10));
		assert!(budget.is_exhausted());
		budget.reset();
		assert!(budget.elapsed() < Duration::from_millis(10));
	}

	#[test]
	fn merged_ticks_stay_pending_while_either_side_is() {
		assert_eq!(Tick::Done.merge(Tick::Yield), Tick::Yield);
		assert_eq!(Tick::Yield.merge(Tick::Done), Tick::Yield);
		assert_eq!(Tick::Done.merge(Tick::Done), Tick::Done);
	}
}
