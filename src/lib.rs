//! Core crate for the `varlens` catalog engine.
//!
//! The engine enumerates a library of packages and loose files, filters it
//! incrementally under a per-tick time budget, derives occupant-count metadata
//! in the background, and hands the host a sorted, paged result list plus a
//! recycling grid to show it in. The root module re-exports the types most
//! embedders need so they do not have to dig through the module hierarchy.

pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod entry;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod results;
pub mod source;
pub mod sweep;
pub mod window;

pub use catalog::{Catalog, CatalogBuilder, CatalogEnvelope, CatalogEvent};
pub use config::{CatalogConfig, ExtractionOptions, SweepOptions};
pub use entry::{Entry, EntryKind};
pub use error::{CatalogError, Result};
pub use filter::{
	Category, FilterChain, FilterState, MemoryRatings, MemoryTags, MetadataLookup, PeopleFilter,
	RatingStore, SizeBucket, SourceFilter, SubFilter, TagStore,
};
pub use metadata::{JsonMetadataStore, MemoryStore, MetadataExtractor, MetadataIndex, MetadataStore};
pub use progress::IndexProgress;
pub use results::{FacetCounts, FacetRow, FacetTally, Paginator, SortJob, SortMode};
pub use source::{FilesystemOptions, Library, LibrarySource, PackageManifest, PackageTable};
pub use varlens_stream::{FrameBudget, Generation, GenerationToken, StreamEnvelope, Tick};
pub use window::{Binding, GridLayout, SlotHost, VirtualGrid};
