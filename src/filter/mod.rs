//! Filter predicate chain.
//!
//! [`FilterChain::passes`] evaluates the predicates in a fixed order with the
//! cheap checks first and short-circuits on the first rejection. The chain
//! holds only shared references, so the same entry and state always produce
//! the same answer.

use std::collections::HashMap;

use crate::entry::Entry;

mod classify;
mod state;
mod stores;

pub use classify::{Classification, Gender, ResourceKind, classify, gender_of, resource_kind_of};
pub use state::{
	Category, FilterState, PeopleFilter, SizeBucket, SourceFilter, SubFilter, contains_ignore_case,
	provenance,
};
pub use stores::{MAX_RATING, MemoryRatings, MemoryTags, RatingStore, TagStore};

/// Occupant count assumed while the real value is unknown.
pub const DEFAULT_PEOPLE_COUNT: u32 = 1;

/// Read-only view of already-derived metadata.
pub trait MetadataLookup {
	/// Known occupant count of `entry`, or `None` when it has not been derived yet.
	fn people_count(&self, entry: &Entry) -> Option<u32>;
}

impl MetadataLookup for HashMap<String, u32> {
	fn people_count(&self, entry: &Entry) -> Option<u32> {
		self.get(entry.uid()).copied()
	}
}

/// Lookup that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataLookup for NoMetadata {
	fn people_count(&self, _entry: &Entry) -> Option<u32> {
		None
	}
}

/// The full predicate chain bound to one filter state and its collaborators.
#[derive(Clone, Copy)]
pub struct FilterChain<'a> {
	state: &'a FilterState,
	tags: &'a dyn TagStore,
	ratings: &'a dyn RatingStore,
	metadata: &'a dyn MetadataLookup,
}

impl<'a> FilterChain<'a> {
	#[must_use]
	pub fn new(
		state: &'a FilterState,
		tags: &'a dyn TagStore,
		ratings: &'a dyn RatingStore,
		metadata: &'a dyn MetadataLookup,
	) -> Self {
		Self {
			state,
			tags,
			ratings,
			metadata,
		}
	}

	#[must_use]
	pub fn state(&self) -> &'a FilterState {
		self.state
	}

	/// Whether `entry` survives every predicate.
	///
	/// With `skip_metadata_filters` set the occupant-count check is left out,
	/// so the result can only be `true` more often than without it.
	#[must_use]
	pub fn passes(&self, entry: &Entry, skip_metadata_filters: bool) -> bool {
		self.passes_sub_filter(entry)
			&& (skip_metadata_filters || self.passes_metadata(entry))
			&& self.passes_rating(entry)
			&& self.passes_size(entry)
			&& self.state.source.admits(provenance(entry.kind(), entry.path()))
			&& contains_ignore_case(entry.path(), &self.state.query)
			&& self.passes_tags(entry)
	}

	/// Whether the metadata predicate alone admits `entry`.
	#[must_use]
	pub fn passes_metadata(&self, entry: &Entry) -> bool {
		if !self.state.wants_metadata() {
			return true;
		}
		let count = self
			.metadata
			.people_count(entry)
			.unwrap_or(DEFAULT_PEOPLE_COUNT);
		self.state.people.admits(count)
	}

	fn passes_sub_filter(&self, entry: &Entry) -> bool {
		let Some(category) = self.state.category else {
			return true;
		};
		if !category.has_taxonomy() || self.state.sub_filter.is_empty() {
			return true;
		}
		let Classification { gender, resource } = classify(entry.path());
		self.state.sub_filter.admits_gender(gender) && self.state.sub_filter.admits_resource(resource)
	}

	fn passes_rating(&self, entry: &Entry) -> bool {
		self.state
			.rating
			.is_none_or(|wanted| self.ratings.rating(entry) == wanted)
	}

	fn passes_size(&self, entry: &Entry) -> bool {
		self.state
			.size
			.is_none_or(|bucket| bucket.contains(entry.size()))
	}

	fn passes_tags(&self, entry: &Entry) -> bool {
		self.state.tags.is_empty()
			|| self.state.tags.iter().any(|tag| {
				contains_ignore_case(entry.path(), tag) || self.tags.has_tag(entry.uid(), tag)
			})
	}
}
