use std::fmt;

/// Tracks how many entries the indexing sweep has processed relative to how
/// many were queued for it.
///
/// Hosts query this to decide whether to show a busy indicator and to format
/// a label that stays stable once the sweep has caught up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexProgress {
	queued: usize,
	swept: usize,
	complete: bool,
}

impl IndexProgress {
	/// Tracker with nothing queued yet.
	#[must_use]
	pub const fn new() -> Self {
		Self {
			queued: 0,
			swept: 0,
			complete: false,
		}
	}

	/// Forget every count, for a new generation.
	pub fn reset(&mut self) {
		*self = Self::new();
	}

	/// Record that `count` more entries were queued.
	pub fn record_queued(&mut self, count: usize) {
		self.queued += count;
		self.complete = false;
	}

	/// Record that one queued entry was processed.
	///
	/// The swept count never overtakes the queued count, so the label stays
	/// truthful if an entry is swept twice.
	pub fn record_swept(&mut self) {
		self.swept = (self.swept + 1).min(self.queued);
	}

	/// Mark the sweep as caught up with its queue.
	pub fn mark_complete(&mut self) {
		self.swept = self.queued;
		self.complete = true;
	}

	#[must_use]
	pub fn queued(&self) -> usize {
		self.queued
	}

	#[must_use]
	pub fn swept(&self) -> usize {
		self.swept
	}

	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Formatted status label and a completion flag.
	#[must_use]
	pub fn status(&self, label: &str) -> (String, bool) {
		let progress = if self.complete || self.queued == 0 {
			ProgressDisplay::Fixed(self.swept)
		} else {
			ProgressDisplay::Ratio {
				swept: self.swept,
				queued: self.queued,
			}
		};
		(format!("Indexed {label}: {progress}"), self.complete)
	}
}

#[derive(Debug)]
enum ProgressDisplay {
	Fixed(usize),
	Ratio { swept: usize, queued: usize },
}

impl fmt::Display for ProgressDisplay {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Fixed(value) => write!(f, "{value}"),
			Self::Ratio { swept, queued } => write!(f, "{swept}/{queued}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::IndexProgress;

	#[test]
	fn reports_in_progress_counts() {
		let mut progress = IndexProgress::new();
		progress.record_queued(10);
		progress.record_swept();
		progress.record_swept();
		let (label, complete) = progress.status("metadata");
		assert_eq!(label, "Indexed metadata: 2/10");
		assert!(!complete);
	}

	#[test]
	fn collapses_totals_on_completion() {
		let mut progress = IndexProgress::new();
		progress.record_queued(4);
		progress.mark_complete();
		let (label, complete) = progress.status("metadata");
		assert_eq!(label, "Indexed metadata: 4");
		assert!(complete);
	}

	#[test]
	fn new_work_reopens_a_completed_tracker() {
		let mut progress = IndexProgress::new();
		progress.record_queued(1);
		progress.mark_complete();
		progress.record_queued(2);
		assert!(!progress.is_complete());
		assert_eq!(progress.status("metadata").0, "Indexed metadata: 1/3");
	}

	#[test]
	fn swept_never_exceeds_queued() {
		let mut progress = IndexProgress::new();
		progress.record_queued(1);
		progress.record_swept();
		progress.record_swept();
		assert_eq!(progress.swept(), 1);
		progress.reset();
		assert_eq!(progress.status("metadata"), ("Indexed metadata: 0".to_string(), false));
	}
}
