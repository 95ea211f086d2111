use std::collections::BTreeMap;

use serde::Serialize;
use varlens_stream::{FrameBudget, Tick};

use crate::entry::{Entry, EntryKind};
use crate::filter::{MetadataLookup, provenance};

/// Entries tallied between budget checks.
const TALLY_CHECK_EVERY: usize = 256;

/// Label and number of matching results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetRow {
	pub name: String,
	pub count: usize,
}

impl FacetRow {
	#[must_use]
	pub fn new(name: impl Into<String>, count: usize) -> Self {
		Self {
			name: name.into(),
			count,
		}
	}
}

/// Tallies over a result list, shown next to the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
	pub total: usize,
	/// Lowercase extension to count. Entries without one are not counted.
	pub extensions: BTreeMap<String, usize>,
	pub packaged: usize,
	pub loose: usize,
	pub single: usize,
	pub dual: usize,
	/// Entries whose occupant count has not been derived yet.
	pub unknown: usize,
}

impl FacetCounts {
	#[must_use]
	pub fn from_entries(entries: &[Entry], metadata: &dyn MetadataLookup) -> Self {
		let mut tally = FacetTally::new();
		let _ = tally.advance(entries, metadata, &FrameBudget::unlimited());
		tally.finish()
	}

	fn add(&mut self, entry: &Entry, metadata: &dyn MetadataLookup) {
		if let Some(ext) = entry.extension() {
			*self.extensions.entry(ext.to_ascii_lowercase()).or_insert(0) += 1;
		}
		match provenance(entry.kind(), entry.path()) {
			EntryKind::Packaged => self.packaged += 1,
			EntryKind::Loose => self.loose += 1,
		}
		match metadata.people_count(entry) {
			Some(count) if count >= 2 => self.dual += 1,
			Some(_) => self.single += 1,
			None => self.unknown += 1,
		}
	}

	/// Rows for display, extensions first, most frequent first.
	#[must_use]
	pub fn rows(&self) -> Vec<FacetRow> {
		let mut extensions: Vec<FacetRow> = self
			.extensions
			.iter()
			.map(|(name, count)| FacetRow::new(format!(".{name}"), *count))
			.collect();
		extensions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
		extensions.extend([
			FacetRow::new("packaged", self.packaged),
			FacetRow::new("loose", self.loose),
			FacetRow::new("single", self.single),
			FacetRow::new("dual", self.dual),
			FacetRow::new("unindexed", self.unknown),
		]);
		extensions
	}
}

/// Facet recount over a result list, resumed across host ticks.
///
/// Every call to [`FacetTally::advance`] must see the same list; start a new
/// tally when the list changes.
#[derive(Debug, Default)]
pub struct FacetTally {
	counts: FacetCounts,
	cursor: usize,
}

impl FacetTally {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Entries counted so far.
	#[must_use]
	pub fn counted(&self) -> usize {
		self.cursor
	}

	/// Count until the list is exhausted or `budget` runs out.
	pub fn advance(
		&mut self,
		entries: &[Entry],
		metadata: &dyn MetadataLookup,
		budget: &FrameBudget,
	) -> Tick {
		while self.cursor < entries.len() {
			let end = (self.cursor + TALLY_CHECK_EVERY).min(entries.len());
			for entry in &entries[self.cursor..end] {
				self.counts.add(entry, metadata);
			}
			self.cursor = end;
			if self.cursor < entries.len() && budget.is_exhausted() {
				return Tick::Yield;
			}
		}
		Tick::Done
	}

	/// Counts over everything seen so far.
	#[must_use]
	pub fn finish(mut self) -> FacetCounts {
		self.counts.total = self.cursor;
		self.counts
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::time::Duration;

	use super::*;

	#[test]
	fn tallies_extensions_provenance_and_occupants() {
		let entries = vec![
			Entry::packaged("P.var", "Saves/duo.json", 0, 0),
			Entry::loose("Saves/solo.JSON", 0, 0),
			Entry::loose("Custom/look.vap", 0, 0),
		];
		let metadata: HashMap<String, u32> = HashMap::from([
			("P.var:Saves/duo.json".to_string(), 2),
			("Saves/solo.JSON".to_string(), 1),
		]);

		let counts = FacetCounts::from_entries(&entries, &metadata);
		assert_eq!(counts.total, 3);
		assert_eq!(counts.extensions.get("json"), Some(&2));
		assert_eq!(counts.extensions.get("vap"), Some(&1));
		assert_eq!((counts.packaged, counts.loose), (1, 2));
		assert_eq!((counts.single, counts.dual, counts.unknown), (1, 1, 1));

		let rows = counts.rows();
		assert_eq!(rows[0], FacetRow::new(".json", 2));
		assert_eq!(rows[1], FacetRow::new(".vap", 1));
		assert_eq!(rows.last(), Some(&FacetRow::new("unindexed", 1)));
	}

	#[test]
	fn tally_resumes_across_exhausted_budgets() {
		let entries: Vec<Entry> = (0..600)
			.map(|i| Entry::packaged("P.var", &format!("Saves/{i}.json"), 0, 0))
			.collect();
		let metadata: HashMap<String, u32> = (0..600)
			.filter(|i| i % 3 == 0)
			.map(|i| (format!("P.var:Saves/{i}.json"), if i % 2 == 0 { 2 } else { 1 }))
			.collect();

		let spent = FrameBudget::new(Duration::ZERO);
		let mut tally = FacetTally::new();
		let mut ticks = 1;
		while tally.advance(&entries, &metadata, &spent) == Tick::Yield {
			ticks += 1;
		}
		assert_eq!(ticks, 3, "one chunk per exhausted tick");
		assert_eq!(tally.counted(), 600);
		assert_eq!(tally.finish(), FacetCounts::from_entries(&entries, &metadata));
	}
}
