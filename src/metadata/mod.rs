//! Occupant-count metadata: byte scans, the two-tier index and the extractor
//! that ties them to a [`LibrarySource`](crate::source::LibrarySource).

mod cache;
mod extract;
mod index;
mod scan;
mod store;

pub use cache::MemoryCache;
pub use extract::{ExtractionStats, MetadataExtractor};
pub use index::{MetadataIndex, Peek};
pub use scan::{
	ACCUMULATION_CAP, PEOPLE_COUNT_KEY, PeopleCountScanner, SECOND_PERSON_COUNT, SECOND_PERSON_MARKER,
	scan_buffer, scan_reader, tail_scan,
};
pub use store::{JsonMetadataStore, MemoryStore, MetadataStore};
