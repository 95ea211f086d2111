use std::collections::BTreeSet;

use bitflags::bitflags;

use super::classify::{Gender, ResourceKind};
use crate::entry::{EntryKind, PACKAGE_SEPARATOR, extension_of};
use crate::source::normalize_extension;

/// Browsing category selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Scene,
	Pose,
	Clothing,
	Hair,
	Appearance,
	Other,
}

impl Category {
	/// Whether [`SubFilter`] bits apply while browsing this category.
	#[must_use]
	pub fn has_taxonomy(self) -> bool {
		matches!(self, Category::Clothing | Category::Hair | Category::Appearance)
	}

	/// Parse a category name, case-insensitively.
	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"scene" | "scenes" => Some(Category::Scene),
			"pose" | "poses" => Some(Category::Pose),
			"clothing" => Some(Category::Clothing),
			"hair" => Some(Category::Hair),
			"appearance" | "appearances" => Some(Category::Appearance),
			"other" => Some(Category::Other),
			_ => None,
		}
	}
}

bitflags! {
	/// Inclusion bits for taxonomy categories.
	///
	/// The gender bits and the kind bits form two groups. A group with no bit
	/// set does not restrict anything.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct SubFilter: u8 {
		const FEMALE = 1;
		const MALE = 1 << 1;
		const UNISEX = 1 << 2;
		const ITEMS = 1 << 3;
		const PRESETS = 1 << 4;

		const GENDERS = Self::FEMALE.bits() | Self::MALE.bits() | Self::UNISEX.bits();
		const KINDS = Self::ITEMS.bits() | Self::PRESETS.bits();
	}
}

impl SubFilter {
	/// Whether a resource of this gender is shown.
	#[must_use]
	pub fn admits_gender(self, gender: Gender) -> bool {
		let genders = self & SubFilter::GENDERS;
		if genders.is_empty() {
			return true;
		}
		let bit = match gender {
			Gender::Female => SubFilter::FEMALE,
			Gender::Male => SubFilter::MALE,
			Gender::Unisex => SubFilter::UNISEX,
		};
		genders.contains(bit)
	}

	/// Whether a resource of this kind is shown.
	#[must_use]
	pub fn admits_resource(self, resource: ResourceKind) -> bool {
		let kinds = self & SubFilter::KINDS;
		if kinds.is_empty() {
			return true;
		}
		match resource {
			ResourceKind::Item => kinds.contains(SubFilter::ITEMS),
			ResourceKind::Preset => kinds.contains(SubFilter::PRESETS),
			ResourceKind::Other => false,
		}
	}
}

bitflags! {
	/// Occupant-count split.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PeopleFilter: u8 {
		/// Exactly one person.
		const SINGLE = 1;
		/// Two or more people.
		const DUAL = 1 << 1;
	}
}

impl PeopleFilter {
	/// Whether the filter hides anything at all.
	#[must_use]
	pub fn is_active(self) -> bool {
		!self.is_empty() && !self.is_all()
	}

	/// Whether an entry with `count` occupants is shown.
	#[must_use]
	pub fn admits(self, count: u32) -> bool {
		if !self.is_active() {
			return true;
		}
		if count >= 2 {
			self.contains(PeopleFilter::DUAL)
		} else {
			self.contains(PeopleFilter::SINGLE)
		}
	}
}

/// Byte-size buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBucket {
	/// Under 1 MiB.
	Small,
	/// 1 MiB up to 10 MiB.
	Medium,
	/// 10 MiB up to 100 MiB.
	Large,
	/// 100 MiB and above.
	Huge,
}

const MIB: u64 = 1024 * 1024;

impl SizeBucket {
	/// Bucket containing `size`.
	#[must_use]
	pub fn of(size: u64) -> Self {
		match size {
			s if s < MIB => SizeBucket::Small,
			s if s < 10 * MIB => SizeBucket::Medium,
			s if s < 100 * MIB => SizeBucket::Large,
			_ => SizeBucket::Huge,
		}
	}

	#[must_use]
	pub fn contains(self, size: u64) -> bool {
		SizeBucket::of(size) == self
	}

	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"small" => Some(SizeBucket::Small),
			"medium" => Some(SizeBucket::Medium),
			"large" => Some(SizeBucket::Large),
			"huge" => Some(SizeBucket::Huge),
			_ => None,
		}
	}
}

/// Packaged vs loose provenance filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceFilter {
	#[default]
	All,
	Packaged,
	Loose,
}

impl SourceFilter {
	#[must_use]
	pub fn admits(self, provenance: EntryKind) -> bool {
		match self {
			SourceFilter::All => true,
			SourceFilter::Packaged => provenance == EntryKind::Packaged,
			SourceFilter::Loose => provenance == EntryKind::Loose,
		}
	}
}

/// Everything the user has selected to narrow the catalog.
///
/// The state is only changed by explicit user actions and is read-only while
/// a pass runs; the pipeline shares it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
	/// Allowed extensions, lowercase without the dot. Empty allows all.
	pub extensions: Vec<String>,
	/// Path prefixes. Empty allows all.
	pub scopes: Vec<String>,
	/// Case-insensitive substring of the full path.
	pub query: String,
	/// Active tags; an entry matches when any of them applies.
	pub tags: BTreeSet<String>,
	pub category: Option<Category>,
	pub sub_filter: SubFilter,
	pub people: PeopleFilter,
	/// Exact star rating to show.
	pub rating: Option<u8>,
	pub size: Option<SizeBucket>,
	pub source: SourceFilter,
}

impl FilterState {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.extensions = extensions
			.into_iter()
			.map(|ext| normalize_extension(ext.as_ref()))
			.filter(|ext| !ext.is_empty())
			.collect();
		self.extensions.sort();
		self.extensions.dedup();
		self
	}

	#[must_use]
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.scopes = scopes
			.into_iter()
			.map(|scope| scope.as_ref().trim().replace('\\', "/"))
			.filter(|scope| !scope.is_empty())
			.collect();
		self
	}

	#[must_use]
	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		self.query = query.into().trim().to_string();
		self
	}

	#[must_use]
	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.tags = tags
			.into_iter()
			.map(|tag| tag.as_ref().trim().to_lowercase())
			.filter(|tag| !tag.is_empty())
			.collect();
		self
	}

	#[must_use]
	pub fn with_category(mut self, category: Category, sub_filter: SubFilter) -> Self {
		self.category = Some(category);
		self.sub_filter = sub_filter;
		self
	}

	#[must_use]
	pub fn with_people(mut self, people: PeopleFilter) -> Self {
		self.people = people;
		self
	}

	#[must_use]
	pub fn with_rating(mut self, rating: Option<u8>) -> Self {
		self.rating = rating;
		self
	}

	#[must_use]
	pub fn with_size(mut self, size: Option<SizeBucket>) -> Self {
		self.size = size;
		self
	}

	#[must_use]
	pub fn with_source(mut self, source: SourceFilter) -> Self {
		self.source = source;
		self
	}

	/// Whether any predicate depends on extracted metadata.
	#[must_use]
	pub fn wants_metadata(&self) -> bool {
		self.people.is_active()
	}

	/// Cheap checks the producer runs before queueing a candidate.
	///
	/// `full_path` is the host-namespace path, `scoped_path` the path scopes
	/// are written against (the internal path for packaged entries).
	#[must_use]
	pub fn admits_candidate(&self, full_path: &str, scoped_path: &str) -> bool {
		self.admits_extension(full_path)
			&& self.admits_scope(full_path, scoped_path)
			&& contains_ignore_case(full_path, &self.query)
	}

	fn admits_extension(&self, path: &str) -> bool {
		if self.extensions.is_empty() {
			return true;
		}
		extension_of(path).is_some_and(|ext| {
			self.extensions
				.iter()
				.any(|allowed| allowed.eq_ignore_ascii_case(ext))
		})
	}

	fn admits_scope(&self, full_path: &str, scoped_path: &str) -> bool {
		self.scopes.is_empty()
			|| self.scopes.iter().any(|scope| {
				starts_with_ignore_case(scoped_path, scope) || starts_with_ignore_case(full_path, scope)
			})
	}
}

/// Provenance of an entry, honouring `package:` path prefixes on loose records.
#[must_use]
pub fn provenance(kind: EntryKind, path: &str) -> EntryKind {
	if kind == EntryKind::Packaged {
		return EntryKind::Packaged;
	}
	let first = path.split('/').next().unwrap_or(path);
	if first.contains(PACKAGE_SEPARATOR) && !is_drive_prefix(first) {
		EntryKind::Packaged
	} else {
		EntryKind::Loose
	}
}

fn is_drive_prefix(segment: &str) -> bool {
	let bytes = segment.as_bytes();
	bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// ASCII case-insensitive substring test, falling back to Unicode lowercase.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
	if needle.is_empty() {
		return true;
	}
	if haystack.is_ascii() && needle.is_ascii() {
		let needle = needle.as_bytes();
		return haystack
			.as_bytes()
			.windows(needle.len())
			.any(|window| window.eq_ignore_ascii_case(needle));
	}
	haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
	haystack
		.as_bytes()
		.get(..prefix.len())
		.is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sub_filter_groups_restrict_independently() {
		let filter = SubFilter::FEMALE | SubFilter::PRESETS;
		assert!(filter.admits_gender(Gender::Female));
		assert!(!filter.admits_gender(Gender::Male));
		assert!(filter.admits_resource(ResourceKind::Preset));
		assert!(!filter.admits_resource(ResourceKind::Item));

		let genders_only = SubFilter::MALE;
		assert!(genders_only.admits_resource(ResourceKind::Other));
		assert!(SubFilter::empty().admits_gender(Gender::Unisex));
	}

	#[test]
	fn people_filter_splits_single_and_dual() {
		assert!(!PeopleFilter::empty().is_active());
		assert!(!PeopleFilter::all().is_active());
		assert!(PeopleFilter::SINGLE.admits(1));
		assert!(!PeopleFilter::SINGLE.admits(2));
		assert!(PeopleFilter::DUAL.admits(3));
		assert!(PeopleFilter::all().admits(7));
	}

	#[test]
	fn size_buckets_use_mebibyte_thresholds() {
		assert_eq!(SizeBucket::of(0), SizeBucket::Small);
		assert_eq!(SizeBucket::of(MIB), SizeBucket::Medium);
		assert_eq!(SizeBucket::of(10 * MIB - 1), SizeBucket::Medium);
		assert_eq!(SizeBucket::of(100 * MIB), SizeBucket::Huge);
		assert!(SizeBucket::Large.contains(50 * MIB));
	}

	#[test]
	fn candidate_checks_extension_scope_and_query() {
		let state = FilterState::new()
			.with_extensions([".JSON"])
			.with_scopes(["A/"])
			.with_query("X");
		assert!(state.admits_candidate("p.var:A/x.json", "A/x.json"));
		assert!(!state.admits_candidate("p.var:A/y.json", "A/y.json"));
		assert!(!state.admits_candidate("p.var:B/x.json", "B/x.json"));
		assert!(!state.admits_candidate("p.var:A/x.vap", "A/x.vap"));
	}

	#[test]
	fn scopes_may_name_a_package() {
		let state = FilterState::new().with_scopes(["P.var:Saves/"]);
		assert!(state.admits_candidate("P.var:Saves/a.json", "Saves/a.json"));
		assert!(!state.admits_candidate("Q.var:Saves/a.json", "Saves/a.json"));
	}

	#[test]
	fn provenance_reads_package_prefixes() {
		assert_eq!(provenance(EntryKind::Packaged, "x.json"), EntryKind::Packaged);
		assert_eq!(provenance(EntryKind::Loose, "P.var:Saves/a.json"), EntryKind::Packaged);
		assert_eq!(provenance(EntryKind::Loose, "Saves/a.json"), EntryKind::Loose);
		assert_eq!(provenance(EntryKind::Loose, "C:/Saves/a.json"), EntryKind::Loose);
	}

	#[test]
	fn case_insensitive_contains_handles_unicode() {
		assert!(contains_ignore_case("Saves/Scene/Duo.json", "scene/duo"));
		assert!(contains_ignore_case("Ärger/Szene.json", "ärger"));
		assert!(!contains_ignore_case("short", "longer needle"));
	}
}
