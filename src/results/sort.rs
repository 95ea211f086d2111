use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use varlens_stream::{FrameBudget, Tick};

use crate::entry::Entry;

/// Length of the runs sorted in one step before merging starts.
const RUN_LEN: usize = 256;
/// Merge outputs between budget checks.
const MERGE_CHECK_EVERY: usize = 1024;

/// Result ordering.
///
/// Every mode is a total order: ties on the primary key fall back to the
/// full path and then the uid, so enumeration order never shows through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
	#[default]
	NameAsc,
	NameDesc,
	DateNewest,
	DateOldest,
	SizeLargest,
	SizeSmallest,
}

impl SortMode {
	pub const ALL: [SortMode; 6] = [
		SortMode::NameAsc,
		SortMode::NameDesc,
		SortMode::DateNewest,
		SortMode::DateOldest,
		SortMode::SizeLargest,
		SortMode::SizeSmallest,
	];

	#[must_use]
	pub fn compare(self, a: &Entry, b: &Entry) -> Ordering {
		let primary = match self {
			SortMode::NameAsc => compare_names(a.file_name(), b.file_name()),
			SortMode::NameDesc => compare_names(b.file_name(), a.file_name()),
			SortMode::DateNewest => b.last_modified().cmp(&a.last_modified()),
			SortMode::DateOldest => a.last_modified().cmp(&b.last_modified()),
			SortMode::SizeLargest => b.size().cmp(&a.size()),
			SortMode::SizeSmallest => a.size().cmp(&b.size()),
		};
		primary
			.then_with(|| a.path().cmp(b.path()))
			.then_with(|| a.uid().cmp(b.uid()))
	}

	pub fn sort(self, entries: &mut [Entry]) {
		entries.sort_by(|a, b| self.compare(a, b));
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			SortMode::NameAsc => "name-asc",
			SortMode::NameDesc => "name-desc",
			SortMode::DateNewest => "date-newest",
			SortMode::DateOldest => "date-oldest",
			SortMode::SizeLargest => "size-largest",
			SortMode::SizeSmallest => "size-smallest",
		}
	}
}

impl fmt::Display for SortMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SortMode {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let wanted = value.trim().to_ascii_lowercase().replace('_', "-");
		SortMode::ALL
			.into_iter()
			.find(|mode| mode.as_str() == wanted)
			.ok_or_else(|| format!("unknown sort mode `{value}`"))
	}
}

/// Bottom-up merge sort of a result list, resumed across host ticks.
///
/// The job orders indices into the list it is given, so the list itself stays
/// untouched and readable until [`SortJob::apply`] moves every entry into
/// place in one linear pass. Every call to [`SortJob::advance`] must see the
/// same list.
#[derive(Debug)]
pub struct SortJob {
	mode: SortMode,
	order: Vec<usize>,
	scratch: Vec<usize>,
	/// Length of the sorted runs being merged. Zero while runs are still being
	/// sorted.
	width: usize,
	/// Start of the next run to sort, or of the run pair being merged.
	start: usize,
	left: usize,
	right: usize,
	out: usize,
	done: bool,
}

impl SortJob {
	#[must_use]
	pub fn new(mode: SortMode, len: usize) -> Self {
		Self {
			mode,
			order: (0..len).collect(),
			scratch: Vec::new(),
			width: 0,
			start: 0,
			left: 0,
			right: 0,
			out: 0,
			done: len <= 1,
		}
	}

	#[must_use]
	pub fn mode(&self) -> SortMode {
		self.mode
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.order.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	#[must_use]
	pub fn is_done(&self) -> bool {
		self.done
	}

	/// Sort until finished or until `budget` runs out.
	pub fn advance(&mut self, entries: &[Entry], budget: &FrameBudget) -> Tick {
		debug_assert_eq!(entries.len(), self.order.len());
		let len = self.order.len();
		let mode = self.mode;

		while self.width == 0 {
			if self.start >= len {
				self.width = RUN_LEN;
				self.scratch = vec![0; len];
				self.begin_pass();
				break;
			}
			let end = (self.start + RUN_LEN).min(len);
			self.order[self.start..end].sort_by(|&a, &b| mode.compare(&entries[a], &entries[b]));
			self.start = end;
			if budget.is_exhausted() {
				return self.progress();
			}
		}

		let mut since_check = 0;
		while !self.done {
			let mid = (self.start + self.width).min(len);
			let end = (self.start + 2 * self.width).min(len);
			if self.out == end {
				self.start = end;
				if self.start >= len {
					std::mem::swap(&mut self.order, &mut self.scratch);
					self.width *= 2;
					self.begin_pass();
				} else {
					self.left = self.start;
					self.right = (self.start + self.width).min(len);
					self.out = self.start;
				}
				continue;
			}

			let take_left = self.right >= end
				|| (self.left < mid
					&& mode.compare(&entries[self.order[self.left]], &entries[self.order[self.right]])
						!= Ordering::Greater);
			if take_left {
				self.scratch[self.out] = self.order[self.left];
				self.left += 1;
			} else {
				self.scratch[self.out] = self.order[self.right];
				self.right += 1;
			}
			self.out += 1;

			since_check += 1;
			if since_check == MERGE_CHECK_EVERY {
				since_check = 0;
				if budget.is_exhausted() {
					return Tick::Yield;
				}
			}
		}
		Tick::Done
	}

	/// Reorder `entries` into the finished order.
	///
	/// Follows each permutation cycle with swaps, so nothing is cloned or
	/// reallocated. A job that is not done leaves a partially ordered list.
	pub fn apply(mut self, entries: &mut [Entry]) {
		debug_assert_eq!(entries.len(), self.order.len());
		for first in 0..self.order.len() {
			let mut current = first;
			while self.order[current] != first {
				let next = self.order[current];
				entries.swap(current, next);
				self.order[current] = current;
				current = next;
			}
			self.order[current] = current;
		}
	}

	/// Set up the first run pair of a merge pass, or finish when one run
	/// covers the whole list.
	fn begin_pass(&mut self) {
		let len = self.order.len();
		if self.width >= len {
			self.done = true;
			self.scratch = Vec::new();
			return;
		}
		self.start = 0;
		self.left = 0;
		self.right = self.width.min(len);
		self.out = 0;
	}

	fn progress(&self) -> Tick {
		if self.done { Tick::Done } else { Tick::Yield }
	}
}

/// Case-insensitive comparison, with the raw bytes as tie-break.
fn compare_names(a: &str, b: &str) -> Ordering {
	let folded = if a.is_ascii() && b.is_ascii() {
		a.bytes()
			.map(|byte| byte.to_ascii_lowercase())
			.cmp(b.bytes().map(|byte| byte.to_ascii_lowercase()))
	} else {
		a.chars()
			.flat_map(char::to_lowercase)
			.cmp(b.chars().flat_map(char::to_lowercase))
	};
	folded.then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Vec<Entry> {
		vec![
			Entry::loose("Saves/b.json", 300, 5),
			Entry::packaged("P.var", "Saves/A.json", 100, 9),
			Entry::loose("Other/a.json", 100, 1),
			Entry::loose("Saves/c.json", 200, 9),
		]
	}

	fn paths(entries: &[Entry]) -> Vec<&str> {
		entries.iter().map(Entry::path).collect()
	}

	#[test]
	fn names_sort_case_insensitively_with_path_tie_break() {
		let mut entries = sample();
		SortMode::NameAsc.sort(&mut entries);
		assert_eq!(
			paths(&entries),
			vec!["P.var:Saves/A.json", "Other/a.json", "Saves/b.json", "Saves/c.json"]
		);
	}

	#[test]
	fn descending_names_keep_ascending_tie_break() {
		let mut entries = sample();
		SortMode::NameDesc.sort(&mut entries);
		assert_eq!(
			paths(&entries),
			vec!["Saves/c.json", "Saves/b.json", "Other/a.json", "P.var:Saves/A.json"]
		);
	}

	#[test]
	fn date_and_size_modes() {
		let mut entries = sample();
		SortMode::DateNewest.sort(&mut entries);
		assert_eq!(
			paths(&entries),
			vec!["P.var:Saves/A.json", "Saves/c.json", "Saves/b.json", "Other/a.json"]
		);
		SortMode::SizeSmallest.sort(&mut entries);
		assert_eq!(
			paths(&entries),
			vec!["Other/a.json", "P.var:Saves/A.json", "Saves/c.json", "Saves/b.json"]
		);
	}

	#[test]
	fn order_is_independent_of_input_order() {
		for mode in SortMode::ALL {
			let mut forward = sample();
			let mut reversed = sample();
			reversed.reverse();
			mode.sort(&mut forward);
			mode.sort(&mut reversed);
			assert_eq!(forward, reversed, "{mode}");
		}
	}

	#[test]
	fn parses_mode_names() {
		assert_eq!("date_newest".parse::<SortMode>(), Ok(SortMode::DateNewest));
		assert_eq!(" Size-Largest ".parse::<SortMode>(), Ok(SortMode::SizeLargest));
		assert!("random".parse::<SortMode>().is_err());
	}

	fn scrambled(count: usize) -> Vec<Entry> {
		(0..count)
			.map(|i| {
				let key = (i * 7919) % 1009;
				Entry::loose(format!("Saves/{}/{key:04}.json", i % 3), (key % 97) as u64, (i % 13) as u64)
			})
			.collect()
	}

	fn sort_in_steps(mode: SortMode, entries: &mut [Entry], budget: &FrameBudget) -> usize {
		let mut job = SortJob::new(mode, entries.len());
		let mut steps = 1;
		while job.advance(entries, budget) == Tick::Yield {
			steps += 1;
		}
		assert!(job.is_done());
		job.apply(entries);
		steps
	}

	#[test]
	fn stepwise_sort_matches_a_full_sort() {
		for count in [0, 1, 2, 255, 256, 257, 1000, 3000] {
			for mode in [SortMode::NameAsc, SortMode::SizeLargest, SortMode::DateOldest] {
				let mut expected = scrambled(count);
				mode.sort(&mut expected);
				let mut actual = scrambled(count);
				sort_in_steps(mode, &mut actual, &FrameBudget::unlimited());
				assert_eq!(actual, expected, "{mode} over {count}");
			}
		}
	}

	#[test]
	fn exhausted_budget_spreads_the_sort_over_many_steps() {
		let spent = FrameBudget::new(std::time::Duration::ZERO);
		let mut expected = scrambled(3000);
		SortMode::NameDesc.sort(&mut expected);
		let mut actual = scrambled(3000);
		let steps = sort_in_steps(SortMode::NameDesc, &mut actual, &spent);
		assert!(steps > 12, "took {steps} steps");
		assert_eq!(actual, expected);
	}
}
