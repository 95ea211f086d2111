//! Result list ordering, paging and tallies.

mod facets;
mod paginator;
mod sort;

pub use facets::{FacetCounts, FacetRow, FacetTally};
pub use paginator::Paginator;
pub use sort::{SortJob, SortMode};
