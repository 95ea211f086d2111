//! Background indexing sweep.
//!
//! A low-priority cooperative task that extracts metadata for entries the
//! consumer could not resolve. It yields every few entries, flushes the
//! persistent index periodically, and nudges the host through a throttled
//! refresh callback so facet counts can catch up.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use varlens_stream::{FrameBudget, GenerationToken, Tick};

use crate::config::SweepOptions;
use crate::entry::Entry;
use crate::metadata::MetadataExtractor;
use crate::progress::IndexProgress;

pub struct IndexingSweep {
	extractor: Arc<MetadataExtractor>,
	options: SweepOptions,
	token: Option<GenerationToken>,
	queue: VecDeque<Entry>,
	queued: HashSet<String>,
	unsaved: usize,
	last_refresh: Instant,
	progress: IndexProgress,
}

impl IndexingSweep {
	#[must_use]
	pub fn new(extractor: Arc<MetadataExtractor>, options: SweepOptions) -> Self {
		Self {
			extractor,
			options,
			token: None,
			queue: VecDeque::new(),
			queued: HashSet::new(),
			unsaved: 0,
			last_refresh: Instant::now(),
			progress: IndexProgress::new(),
		}
	}

	/// Bind the sweep to a new generation, dropping whatever was queued for
	/// the previous one.
	pub fn start(&mut self, token: GenerationToken) {
		self.flush();
		self.token = Some(token);
		self.clear();
		self.last_refresh = Instant::now();
	}

	/// Queue `entry` for extraction.
	///
	/// Returns `false` when it is already queued or its value is already known.
	pub fn enqueue(&mut self, entry: Entry) -> bool {
		if self.queued.contains(entry.uid()) || self.extractor.peek(&entry).is_some() {
			return false;
		}
		self.queued.insert(entry.uid().to_string());
		self.queue.push_back(entry);
		self.progress.record_queued(1);
		true
	}

	/// Process queued entries until the yield cadence or the budget stops it.
	///
	/// `on_refresh` fires at most once per refresh interval while entries are
	/// being processed, and once more when the queue runs dry.
	pub fn tick(&mut self, budget: &FrameBudget, on_refresh: &mut dyn FnMut(&IndexProgress)) -> Tick {
		let Some(token) = self.token.clone() else {
			return Tick::Done;
		};
		let mut processed = 0;
		loop {
			if !token.is_live() {
				self.abandon();
				return Tick::Done;
			}
			let Some(entry) = self.queue.pop_front() else {
				break;
			};
			self.queued.remove(entry.uid());
			self.extractor.extract(&entry);
			self.progress.record_swept();
			self.unsaved += 1;
			processed += 1;

			if self.unsaved >= self.options.save_every {
				self.flush();
			}
			if self.last_refresh.elapsed() >= self.options.refresh_interval() {
				self.last_refresh = Instant::now();
				on_refresh(&self.progress);
			}
			if processed >= self.options.yield_every || budget.is_exhausted() {
				return if self.queue.is_empty() {
					self.finish(on_refresh)
				} else {
					Tick::Yield
				};
			}
		}
		if processed > 0 || self.unsaved > 0 {
			return self.finish(on_refresh);
		}
		Tick::Done
	}

	/// Whether nothing is waiting to be swept.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.queue.is_empty()
	}

	/// Entries waiting to be swept.
	#[must_use]
	pub fn len(&self) -> usize {
		self.queue.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}

	#[must_use]
	pub fn progress(&self) -> &IndexProgress {
		&self.progress
	}

	fn finish(&mut self, on_refresh: &mut dyn FnMut(&IndexProgress)) -> Tick {
		self.flush();
		self.progress.mark_complete();
		self.last_refresh = Instant::now();
		on_refresh(&self.progress);
		Tick::Done
	}

	fn flush(&mut self) {
		if self.unsaved > 0 {
			self.extractor.index().save();
			self.unsaved = 0;
		}
	}

	fn abandon(&mut self) {
		log::debug!("indexing sweep abandoned with {} entries queued", self.queue.len());
		self.flush();
		self.clear();
	}

	fn clear(&mut self) {
		self.queue.clear();
		self.queued.clear();
		self.progress.reset();
	}
}
