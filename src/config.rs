//! Engine tunables.
//!
//! Every field has a default so configuration files only need to mention the
//! values they change.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock allowance per host tick.
pub const DEFAULT_FRAME_BUDGET_MS: u64 = 10;
/// Default number of entries held by the in-memory metadata cache.
pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 20_000;
/// Default number of entries per page.
pub const DEFAULT_PAGE_SIZE: usize = 120;
/// Default suffix length inspected by the tail read.
pub const DEFAULT_TAIL_READ_BYTES: usize = 64 * 1024;
/// Default chunk length for the forward streaming scan.
pub const DEFAULT_SCAN_CHUNK_BYTES: usize = 16 * 1024;
/// Default number of candidates the producer buffers before taking the queue lock.
pub const DEFAULT_PRODUCER_BATCH: usize = 64;

/// Tunables for the whole catalog engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
	/// Allowance per host tick, in milliseconds.
	pub frame_budget_ms: u64,
	/// Capacity of the in-memory metadata cache before it is cleared.
	pub memory_cache_capacity: usize,
	/// Entries per page.
	pub page_size: usize,
	/// Whether the window shows one page at a time or the whole result list.
	pub paginate: bool,
	/// Candidates buffered by the producer between queue pushes.
	pub producer_batch: usize,
	/// Extraction read sizes.
	pub extraction: ExtractionOptions,
	/// Background indexing cadence.
	pub sweep: SweepOptions,
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self {
			frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
			memory_cache_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
			page_size: DEFAULT_PAGE_SIZE,
			paginate: true,
			producer_batch: DEFAULT_PRODUCER_BATCH,
			extraction: ExtractionOptions::default(),
			sweep: SweepOptions::default(),
		}
	}
}

impl CatalogConfig {
	/// Allowance per host tick.
	#[must_use]
	pub fn frame_budget(&self) -> Duration {
		Duration::from_millis(self.frame_budget_ms)
	}

	/// Copy with every size clamped to a usable minimum.
	#[must_use]
	pub fn normalized(mut self) -> Self {
		self.memory_cache_capacity = self.memory_cache_capacity.max(1);
		self.page_size = self.page_size.max(1);
		self.producer_batch = self.producer_batch.max(1);
		self.extraction.tail_read_bytes = self.extraction.tail_read_bytes.max(1);
		self.extraction.scan_chunk_bytes = self.extraction.scan_chunk_bytes.max(1);
		self.sweep.yield_every = self.sweep.yield_every.max(1);
		self.sweep.save_every = self.sweep.save_every.max(1);
		self
	}
}

/// Read sizes used by the metadata extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
	/// Maximum suffix read by the tail probe.
	pub tail_read_bytes: usize,
	/// Chunk size of the forward scan.
	pub scan_chunk_bytes: usize,
}

impl Default for ExtractionOptions {
	fn default() -> Self {
		Self {
			tail_read_bytes: DEFAULT_TAIL_READ_BYTES,
			scan_chunk_bytes: DEFAULT_SCAN_CHUNK_BYTES,
		}
	}
}

/// Cadence of the background indexing sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
	/// Yield back to the host after this many extractions.
	pub yield_every: usize,
	/// Flush the persistent index after this many extractions.
	pub save_every: usize,
	/// Minimum wall time between facet refresh callbacks, in milliseconds.
	pub refresh_interval_ms: u64,
}

impl Default for SweepOptions {
	fn default() -> Self {
		Self {
			yield_every: 10,
			save_every: 100,
			refresh_interval_ms: 350,
		}
	}
}

impl SweepOptions {
	/// Minimum wall time between facet refresh callbacks.
	#[must_use]
	pub fn refresh_interval(&self) -> Duration {
		Duration::from_millis(self.refresh_interval_ms)
	}
}
