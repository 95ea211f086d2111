use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use varlens::metadata::ExtractionStats;
use varlens::{
	Catalog, CatalogEnvelope, CatalogEvent, Entry, FacetCounts, JsonMetadataStore, Library,
	MemoryRatings, MemoryStore, MemoryTags, MetadataLookup, MetadataStore, PackageManifest, Tick,
};

use crate::settings::ResolvedConfig;

/// Pause between host ticks while background work is still running.
const FRAME_GAP: Duration = Duration::from_millis(1);

/// One printed result with its derived occupant count, if known.
#[derive(Debug, Clone)]
pub(crate) struct OutcomeEntry {
	pub(crate) entry: Entry,
	pub(crate) people: Option<u32>,
}

/// Everything the output formats need after the catalog settled.
#[derive(Debug, Clone)]
pub(crate) struct CatalogOutcome {
	pub(crate) total: usize,
	pub(crate) page: usize,
	pub(crate) total_pages: usize,
	pub(crate) paginated: bool,
	pub(crate) entries: Vec<OutcomeEntry>,
	pub(crate) facets: FacetCounts,
	pub(crate) index_status: String,
	pub(crate) stats: ExtractionStats,
}

/// Coordinates building the catalog and driving it until it settles.
pub(crate) struct CatalogWorkflow {
	catalog: Catalog,
	settings: ResolvedConfig,
}

impl CatalogWorkflow {
	/// Build the library, stores and catalog from configuration.
	pub(crate) fn from_config(settings: ResolvedConfig) -> Result<Self> {
		let mut library = Library::with_root(&settings.root, settings.filesystem.clone());
		if let Some(path) = &settings.manifest {
			let manifest = PackageManifest::load(path)
				.with_context(|| format!("failed to load package manifest {}", path.display()))?;
			let base = path.parent().unwrap_or(settings.root.as_path());
			manifest.register(&mut library, base);
		}

		let store: Box<dyn MetadataStore> = match &settings.index {
			Some(path) => Box::new(JsonMetadataStore::open_or_empty(path)),
			None => Box::new(MemoryStore::new()),
		};
		let tags = match &settings.tags_file {
			Some(path) => MemoryTags::load(path)
				.with_context(|| format!("failed to load tags from {}", path.display()))?,
			None => MemoryTags::new(),
		};
		let ratings = match &settings.ratings_file {
			Some(path) => MemoryRatings::load(path)
				.with_context(|| format!("failed to load ratings from {}", path.display()))?,
			None => MemoryRatings::new(),
		};

		let mut catalog = Catalog::builder(Arc::new(library))
			.store(store)
			.tags(Arc::new(tags))
			.ratings(Arc::new(ratings))
			.config(settings.catalog.clone())
			.build();
		catalog.set_sort(settings.sort);

		Ok(Self { catalog, settings })
	}

	/// Run one pass to completion and collect the requested page.
	///
	/// When the filter depends on metadata the sweep derived during the pass,
	/// a second pass picks up the values that were unknown the first time.
	pub(crate) fn run(mut self, page: usize) -> Result<CatalogOutcome> {
		let events = self.catalog.subscribe();
		self.catalog.start(self.settings.filter.clone());
		self.settle(&events);

		if self.settings.filter.wants_metadata() && self.catalog.progress().queued() > 0 {
			log::info!(
				"re-running pass with {} newly indexed entries",
				self.catalog.progress().swept()
			);
			self.catalog.rescan();
			self.settle(&events);
		}
		if self.catalog.revalidate() > 0 {
			self.settle(&events);
		}

		if !self.catalog.save_index() {
			log::warn!("metadata index could not be saved");
		}

		let page = self.catalog.set_page(page);
		let index = self.catalog.index();
		let entries = self
			.catalog
			.visible()
			.iter()
			.map(|entry| OutcomeEntry {
				people: index.people_count(entry),
				entry: entry.clone(),
			})
			.collect();
		let (index_status, _) = self.catalog.progress().status("entries");

		Ok(CatalogOutcome {
			total: self.catalog.results().len(),
			page,
			total_pages: self.catalog.total_pages(),
			paginated: self.catalog.config().paginate,
			entries,
			facets: self.catalog.facets().clone(),
			index_status,
			stats: self.catalog.extraction_stats(),
		})
	}

	fn settle(&mut self, events: &Receiver<CatalogEnvelope>) {
		loop {
			let tick = self.catalog.tick();
			for envelope in events.try_iter() {
				match envelope.kind {
					CatalogEvent::PassComplete => {
						log::debug!("generation {}: {} results", envelope.id, envelope.payload)
					}
					CatalogEvent::IndexRefreshed => {
						log::debug!("generation {}: {} entries indexed", envelope.id, envelope.payload)
					}
					CatalogEvent::FacetsCounted => {
						log::debug!("generation {}: facets over {} results", envelope.id, envelope.payload)
					}
				}
			}
			if tick == Tick::Done && self.catalog.is_idle() {
				return;
			}
			thread::sleep(FRAME_GAP);
		}
	}
}
