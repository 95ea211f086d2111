//! Catalog facade driven by the host loop.
//!
//! A [`Catalog`] owns one enumeration pipeline, the indexing sweep that feeds
//! its metadata index, and the sorted, paged result list of the last
//! completed pass. The host calls [`Catalog::tick`] once per frame; every
//! call returns within the configured frame budget.
//!
//! Work that scales with the result list runs in budgeted steps too: a
//! finished pass is sorted by a [`SortJob`] before its results are published,
//! and facet counts are rebuilt by a [`FacetTally`] while the previous counts
//! stay readable.

use std::mem;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use varlens_stream::{DataStream, FrameBudget, GenerationToken, StreamEnvelope, Tick};

use crate::config::CatalogConfig;
use crate::entry::Entry;
use crate::filter::{FilterChain, FilterState, MemoryRatings, MemoryTags, RatingStore, TagStore};
use crate::metadata::{ExtractionStats, MemoryStore, MetadataExtractor, MetadataIndex, MetadataStore};
use crate::pipeline::{EnumerationPipeline, FilterContext};
use crate::progress::IndexProgress;
use crate::results::{FacetCounts, FacetTally, Paginator, SortJob, SortMode};
use crate::source::LibrarySource;
use crate::sweep::IndexingSweep;

/// What a [`CatalogEnvelope`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
	/// The pass finished; the payload is the number of results.
	PassComplete,
	/// The sweep made progress; the payload is the number of entries swept.
	IndexRefreshed,
	/// Facet counts were rebuilt; the payload is the number of entries counted.
	FacetsCounted,
}

/// Notification published to subscribers, tagged with its generation.
///
/// `complete` is set once the pass has finished, the sweep has nothing left
/// to do and the facet counts are current.
pub type CatalogEnvelope = StreamEnvelope<CatalogEvent, usize>;

/// Assembles a [`Catalog`] from its collaborators.
pub struct CatalogBuilder {
	source: Arc<dyn LibrarySource>,
	store: Box<dyn MetadataStore>,
	tags: Arc<dyn TagStore>,
	ratings: Arc<dyn RatingStore>,
	config: CatalogConfig,
}

impl CatalogBuilder {
	#[must_use]
	pub fn store(mut self, store: Box<dyn MetadataStore>) -> Self {
		self.store = store;
		self
	}

	#[must_use]
	pub fn tags(mut self, tags: Arc<dyn TagStore>) -> Self {
		self.tags = tags;
		self
	}

	#[must_use]
	pub fn ratings(mut self, ratings: Arc<dyn RatingStore>) -> Self {
		self.ratings = ratings;
		self
	}

	#[must_use]
	pub fn config(mut self, config: CatalogConfig) -> Self {
		self.config = config;
		self
	}

	#[must_use]
	pub fn build(self) -> Catalog {
		let config = self.config.normalized();
		let index = Arc::new(MetadataIndex::new(self.store, config.memory_cache_capacity));
		let extractor = Arc::new(MetadataExtractor::new(
			Arc::clone(&index),
			Arc::clone(&self.source),
			config.extraction,
		));
		let context = FilterContext {
			tags: self.tags,
			ratings: self.ratings,
			index: Arc::clone(&index),
		};
		Catalog {
			pipeline: EnumerationPipeline::new(self.source, context, config.producer_batch),
			sweep: IndexingSweep::new(Arc::clone(&extractor), config.sweep),
			paginator: Paginator::new(config.page_size),
			sort: SortMode::default(),
			facets: FacetCounts::default(),
			settling: Settling::Idle,
			recount_pending: false,
			subscriber: None,
			index,
			extractor,
			config,
		}
	}
}

/// Result-list work carried over between ticks.
enum Settling {
	Idle,
	/// `staged` holds the results of a finished pass awaiting publication.
	/// Without it the installed results are being reordered in place.
	Sorting {
		job: SortJob,
		staged: Option<Vec<Entry>>,
	},
	Counting(FacetTally),
}

pub struct Catalog {
	config: CatalogConfig,
	index: Arc<MetadataIndex>,
	extractor: Arc<MetadataExtractor>,
	pipeline: EnumerationPipeline,
	sweep: IndexingSweep,
	sort: SortMode,
	paginator: Paginator<Entry>,
	facets: FacetCounts,
	settling: Settling,
	recount_pending: bool,
	subscriber: Option<Sender<CatalogEnvelope>>,
}

impl Catalog {
	/// Builder with an in-memory store, no tags, no ratings and default tunables.
	#[must_use]
	pub fn builder(source: Arc<dyn LibrarySource>) -> CatalogBuilder {
		CatalogBuilder {
			source,
			store: Box::new(MemoryStore::new()),
			tags: Arc::new(MemoryTags::new()),
			ratings: Arc::new(MemoryRatings::new()),
			config: CatalogConfig::default(),
		}
	}

	/// Receive notifications for every later generation. Replaces any
	/// previous subscriber.
	pub fn subscribe(&mut self) -> Receiver<CatalogEnvelope> {
		let (tx, rx) = mpsc::channel();
		self.subscriber = Some(tx);
		rx
	}

	/// Start a new pass, superseding the current one.
	pub fn start(&mut self, filter: FilterState) -> GenerationToken {
		let token = self.pipeline.start(filter);
		self.sweep.start(token.clone());
		self.paginator.clear();
		self.facets = FacetCounts::default();
		self.settling = Settling::Idle;
		self.recount_pending = false;
		token
	}

	/// Run the last filter again, picking up metadata derived since.
	pub fn rescan(&mut self) -> Option<GenerationToken> {
		let filter = self.pipeline.filter()?.clone();
		Some(self.start(filter))
	}

	/// One host tick with the configured frame budget.
	pub fn tick(&mut self) -> Tick {
		let budget = FrameBudget::new(self.config.frame_budget());
		self.tick_within(&budget)
	}

	/// One host tick with an explicit budget.
	///
	/// The consumer runs first, then sorting and facet counting, and the
	/// sweep only gets whatever budget is left.
	pub fn tick_within(&mut self, budget: &FrameBudget) -> Tick {
		let was_complete = self.pipeline.is_complete();
		let pass = self.pipeline.tick(budget, &mut self.sweep);
		if !was_complete && self.pipeline.is_complete() {
			self.stage_results();
		}
		if budget.is_exhausted() {
			return self.pending_tick(pass);
		}

		let settle = self.settle(budget);
		if budget.is_exhausted() {
			return self.pending_tick(pass.merge(settle));
		}

		let mut refreshed = None;
		let sweep = self
			.sweep
			.tick(budget, &mut |progress| refreshed = Some(progress.swept()));
		if let Some(swept) = refreshed {
			self.recount_pending = true;
			self.emit(CatalogEvent::IndexRefreshed, swept);
		}
		self.pending_tick(pass.merge(sweep))
	}

	/// Whether the pass has finished (or was never started), the sweep is
	/// drained and the results are sorted and counted.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		!self.pipeline.is_running() && self.sweep.is_idle() && self.is_settled()
	}

	/// Drop results that fail the metadata filter now that more values are
	/// known. Never adds entries. Returns how many were removed.
	///
	/// Applies to results still being sorted as well; their sort restarts.
	/// Facet counts follow on later ticks.
	pub fn revalidate(&mut self) -> usize {
		let Some(filter) = self.pipeline.filter() else {
			return 0;
		};
		if !filter.wants_metadata() {
			return 0;
		}
		let context = self.pipeline.context();
		let chain = FilterChain::new(
			filter,
			context.tags.as_ref(),
			context.ratings.as_ref(),
			context.index.as_ref(),
		);
		let removed = if let Settling::Sorting {
			staged: Some(staged),
			..
		} = &mut self.settling
		{
			retain_passing(staged, &chain)
		} else {
			let page = self.paginator.current_page();
			let mut items = self.paginator.take();
			let removed = retain_passing(&mut items, &chain);
			self.paginator.set_results(items);
			self.paginator.set_page(page);
			removed
		};
		if removed > 0 {
			log::debug!("revalidation removed {removed} results");
			self.restart_settling();
		}
		removed
	}

	/// Reorder the results of the last pass over the next ticks.
	///
	/// The current order stays visible until the new one is ready.
	pub fn set_sort(&mut self, sort: SortMode) {
		if sort == self.sort {
			return;
		}
		self.sort = sort;
		if let Settling::Sorting { job, staged } = &mut self.settling {
			let len = staged.as_ref().map_or(self.paginator.len(), Vec::len);
			*job = SortJob::new(sort, len);
			return;
		}
		if self.paginator.is_empty() {
			return;
		}
		if matches!(self.settling, Settling::Counting(_)) {
			self.recount_pending = true;
		}
		self.settling = Settling::Sorting {
			job: SortJob::new(sort, self.paginator.len()),
			staged: None,
		};
	}

	#[must_use]
	pub fn sort_mode(&self) -> SortMode {
		self.sort
	}

	/// Sorted results of the last completed pass. Empty until the pass's
	/// results have been sorted.
	#[must_use]
	pub fn results(&self) -> &[Entry] {
		self.paginator.items()
	}

	/// Entries accepted so far by a pass that is still running, unsorted.
	#[must_use]
	pub fn partial_results(&self) -> &[Entry] {
		self.pipeline.results()
	}

	/// Items on page `page`. Empty past the last page.
	#[must_use]
	pub fn page(&self, page: usize) -> &[Entry] {
		self.paginator.page(page)
	}

	/// What the window should show: the current page, or every result when
	/// pagination is off.
	#[must_use]
	pub fn visible(&self) -> &[Entry] {
		if self.config.paginate {
			self.paginator.current()
		} else {
			self.paginator.items()
		}
	}

	/// Select a page, clamped to the last one.
	pub fn set_page(&mut self, page: usize) -> usize {
		self.paginator.set_page(page)
	}

	#[must_use]
	pub fn current_page(&self) -> usize {
		self.paginator.current_page()
	}

	#[must_use]
	pub fn total_pages(&self) -> usize {
		self.paginator.total_pages()
	}

	/// Counts from the most recent finished tally.
	#[must_use]
	pub fn facets(&self) -> &FacetCounts {
		&self.facets
	}

	#[must_use]
	pub fn progress(&self) -> &IndexProgress {
		self.sweep.progress()
	}

	#[must_use]
	pub fn extraction_stats(&self) -> ExtractionStats {
		self.extractor.stats()
	}

	#[must_use]
	pub fn filter(&self) -> Option<&FilterState> {
		self.pipeline.filter()
	}

	#[must_use]
	pub fn token(&self) -> Option<&GenerationToken> {
		self.pipeline.token()
	}

	#[must_use]
	pub fn index(&self) -> &Arc<MetadataIndex> {
		&self.index
	}

	#[must_use]
	pub fn config(&self) -> &CatalogConfig {
		&self.config
	}

	/// Flush the metadata index. Returns whether the flush succeeded.
	pub fn save_index(&self) -> bool {
		self.index.save()
	}

	/// Move a finished pass's results into a sort job.
	fn stage_results(&mut self) {
		let results = self.pipeline.take_results();
		self.settling = Settling::Sorting {
			job: SortJob::new(self.sort, results.len()),
			staged: Some(results),
		};
		self.recount_pending = false;
	}

	/// Advance sorting and facet counting until both are done or `budget` runs out.
	fn settle(&mut self, budget: &FrameBudget) -> Tick {
		loop {
			if self.is_settled() {
				return Tick::Done;
			}
			if budget.is_exhausted() {
				return Tick::Yield;
			}
			match mem::replace(&mut self.settling, Settling::Idle) {
				Settling::Idle => {
					self.recount_pending = false;
					self.settling = Settling::Counting(FacetTally::new());
				}
				Settling::Sorting { mut job, staged } => {
					let entries = staged.as_deref().unwrap_or(self.paginator.items());
					if job.advance(entries, budget).is_pending() {
						self.settling = Settling::Sorting { job, staged };
						continue;
					}
					match staged {
						Some(mut results) => {
							job.apply(&mut results);
							self.paginator.set_results(results);
							self.recount_pending = true;
							self.emit(CatalogEvent::PassComplete, self.paginator.len());
						}
						None => job.apply(self.paginator.items_mut()),
					}
				}
				Settling::Counting(mut tally) => {
					let lookup = self.index.peeking();
					if tally.advance(self.paginator.items(), &lookup, budget).is_pending() {
						self.settling = Settling::Counting(tally);
						continue;
					}
					self.facets = tally.finish();
					self.emit(CatalogEvent::FacetsCounted, self.facets.total);
				}
			}
		}
	}

	/// Restart in-flight work after the result list changed size.
	fn restart_settling(&mut self) {
		match &mut self.settling {
			Settling::Sorting { job, staged } => {
				let len = staged.as_ref().map_or(self.paginator.len(), Vec::len);
				*job = SortJob::new(self.sort, len);
				self.recount_pending = true;
			}
			Settling::Counting(tally) => *tally = FacetTally::new(),
			Settling::Idle => self.recount_pending = true,
		}
	}

	fn is_settled(&self) -> bool {
		matches!(self.settling, Settling::Idle) && !self.recount_pending
	}

	/// `tick` while any part of the catalog still has work, [`Tick::Done`] otherwise.
	fn pending_tick(&self, tick: Tick) -> Tick {
		if tick.is_pending() || !self.sweep.is_idle() || !self.is_settled() {
			Tick::Yield
		} else {
			Tick::Done
		}
	}

	fn emit(&mut self, kind: CatalogEvent, payload: usize) {
		let (Some(tx), Some(token)) = (self.subscriber.as_ref(), self.pipeline.token()) else {
			return;
		};
		let complete = self.pipeline.is_complete() && self.sweep.is_idle() && self.is_settled();
		if !DataStream::new(tx, token.id(), kind).send(payload, complete) {
			self.subscriber = None;
		}
	}
}

/// Keep the entries that pass the metadata predicates. Returns how many were dropped.
fn retain_passing(items: &mut Vec<Entry>, chain: &FilterChain<'_>) -> usize {
	let before = items.len();
	items.retain(|entry| chain.passes_metadata(entry));
	before - items.len()
}
