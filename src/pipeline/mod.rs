//! Cancellable enumeration pipeline.
//!
//! [`EnumerationPipeline::start`] supersedes the previous generation and
//! launches a producer thread that walks every package and the scoped loose
//! directories, applying only the cheap filters before queueing candidates.
//! The host drives [`EnumerationPipeline::tick`], which drains the queue under
//! a frame budget, runs the full predicate chain, and hands entries with
//! unknown metadata to the [`IndexingSweep`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use varlens_stream::{CandidateQueue, FrameBudget, Generation, GenerationToken, Tick};

use crate::entry::Entry;
use crate::filter::{FilterChain, FilterState, RatingStore, TagStore};
use crate::metadata::MetadataIndex;
use crate::source::LibrarySource;
use crate::sweep::IndexingSweep;

mod producer;
#[cfg(test)]
mod tests;

use producer::ProducerJob;

/// Collaborators the full predicate chain consults.
#[derive(Clone)]
pub struct FilterContext {
	pub tags: Arc<dyn TagStore>,
	pub ratings: Arc<dyn RatingStore>,
	pub index: Arc<MetadataIndex>,
}

/// One pass in flight or finished.
struct Pass {
	token: GenerationToken,
	filter: Arc<FilterState>,
	queue: Arc<CandidateQueue<Entry>>,
	producer: Option<JoinHandle<()>>,
	complete: bool,
}

pub struct EnumerationPipeline {
	source: Arc<dyn LibrarySource>,
	context: FilterContext,
	generation: Generation,
	batch_size: usize,
	pass: Option<Pass>,
	pending: VecDeque<Entry>,
	results: Vec<Entry>,
	examined: usize,
}

impl EnumerationPipeline {
	#[must_use]
	pub fn new(source: Arc<dyn LibrarySource>, context: FilterContext, batch_size: usize) -> Self {
		Self {
			source,
			context,
			generation: Generation::new(),
			batch_size: batch_size.max(1),
			pass: None,
			pending: VecDeque::new(),
			results: Vec::new(),
			examined: 0,
		}
	}

	/// Counter shared with every token this pipeline issues.
	#[must_use]
	pub fn generation(&self) -> &Generation {
		&self.generation
	}

	/// Begin a new pass over the library.
	///
	/// The previous token is invalidated before anything else happens, so its
	/// producer stops at its next poll and its consumer never appends again.
	pub fn start(&mut self, filter: FilterState) -> GenerationToken {
		let token = self.generation.advance();
		self.pending.clear();
		self.results.clear();
		self.examined = 0;

		let filter = Arc::new(filter);
		let queue = Arc::new(CandidateQueue::new());
		let producer = producer::spawn(ProducerJob {
			source: Arc::clone(&self.source),
			filter: Arc::clone(&filter),
			queue: Arc::clone(&queue),
			token: token.clone(),
			batch_size: self.batch_size,
		});
		log::debug!("generation {} started", token.id());
		self.pass = Some(Pass {
			token: token.clone(),
			filter,
			queue,
			producer,
			complete: false,
		});
		token
	}

	/// Invalidate the live pass without starting a new one.
	pub fn cancel(&mut self) {
		self.generation.cancel();
	}

	/// Drain queued candidates until the budget runs out or the pass completes.
	///
	/// Returns [`Tick::Done`] once the producer has finished and every
	/// candidate was examined, or right away when the pass has been superseded.
	pub fn tick(&mut self, budget: &FrameBudget, sweep: &mut IndexingSweep) -> Tick {
		let Some(pass) = self.pass.as_mut() else {
			return Tick::Done;
		};
		if pass.complete || !pass.token.is_live() {
			return Tick::Done;
		}

		let chain = FilterChain::new(
			&pass.filter,
			self.context.tags.as_ref(),
			self.context.ratings.as_ref(),
			self.context.index.as_ref(),
		);
		let wants_metadata = pass.filter.wants_metadata();

		loop {
			if !pass.token.is_live() {
				return Tick::Done;
			}
			let Some(entry) = self.pending.pop_front() else {
				if pass.queue.is_finished() {
					pass.complete = true;
					if let Some(handle) = pass.producer.take() {
						let _ = handle.join();
					}
					log::info!(
						"generation {} complete: {} of {} candidates kept",
						pass.token.id(),
						self.results.len(),
						self.examined
					);
					return Tick::Done;
				}
				if pass.queue.drain_into(&mut self.pending) == 0 {
					return Tick::Yield;
				}
				continue;
			};

			self.examined += 1;
			if chain.passes(&entry, true) {
				let keep = if wants_metadata {
					if !self.context.index.contains(entry.uid()) {
						sweep.enqueue(entry.clone());
					}
					chain.passes_metadata(&entry)
				} else {
					true
				};
				if keep {
					self.results.push(entry);
				}
			}

			if budget.is_exhausted() {
				return Tick::Yield;
			}
		}
	}

	/// Token of the most recent pass.
	#[must_use]
	pub fn token(&self) -> Option<&GenerationToken> {
		self.pass.as_ref().map(|pass| &pass.token)
	}

	/// Filter state of the most recent pass.
	#[must_use]
	pub fn filter(&self) -> Option<&FilterState> {
		self.pass.as_ref().map(|pass| pass.filter.as_ref())
	}

	/// Whether the most recent pass finished and is still live.
	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.pass
			.as_ref()
			.is_some_and(|pass| pass.complete && pass.token.is_live())
	}

	/// Whether the most recent pass is live and still has candidates to examine.
	#[must_use]
	pub fn is_running(&self) -> bool {
		self.pass
			.as_ref()
			.is_some_and(|pass| !pass.complete && pass.token.is_live())
	}

	/// Entries accepted so far, in enumeration order.
	#[must_use]
	pub fn results(&self) -> &[Entry] {
		&self.results
	}

	/// Hand the accepted entries over, leaving the pipeline empty.
	pub fn take_results(&mut self) -> Vec<Entry> {
		std::mem::take(&mut self.results)
	}

	/// Candidates examined by the consumer in the current pass.
	#[must_use]
	pub fn examined(&self) -> usize {
		self.examined
	}

	#[must_use]
	pub fn context(&self) -> &FilterContext {
		&self.context
	}
}
