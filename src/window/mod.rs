//! Virtualized, recycling grid.
//!
//! A [`VirtualGrid`] maps an arbitrarily long list onto the few visual slots
//! the viewport can show. Slots whose index scrolls out of range go back to a
//! pool and are handed to newly visible indices, so the host only ever builds
//! as many visuals as fit on screen plus a buffer row on each side.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use varlens_stream::{FrameBudget, Tick};

mod layout;

pub use layout::GridLayout;

/// Placement handed to [`SlotHost::bind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
	/// Index into the list being shown.
	pub index: usize,
	pub row: usize,
	pub column: usize,
	/// Left edge inside the content area.
	pub x: f32,
	/// Top edge inside the content area.
	pub y: f32,
	/// Width and height of the cell.
	pub size: f32,
}

/// Host side of the grid: builds, fills and hides visual slots.
pub trait SlotHost {
	type Slot;

	/// Build a new slot when the pool is empty.
	fn create_slot(&mut self) -> Self::Slot;

	/// Populate `slot` for the item at `binding.index`.
	fn bind(&mut self, slot: &mut Self::Slot, binding: &Binding);

	/// Deactivate `slot` before it returns to the pool.
	fn release(&mut self, _slot: &mut Self::Slot) {}
}

pub struct VirtualGrid<S> {
	layout: GridLayout,
	item_count: usize,
	offset: f32,
	viewport_height: f32,
	active: BTreeMap<usize, S>,
	pool: Vec<S>,
	/// Every binding is out of date and must be redone.
	stale: bool,
}

impl<S> VirtualGrid<S> {
	#[must_use]
	pub fn new(layout: GridLayout) -> Self {
		Self {
			layout,
			item_count: 0,
			offset: 0.0,
			viewport_height: 0.0,
			active: BTreeMap::new(),
			pool: Vec::new(),
			stale: false,
		}
	}

	/// Show a new list of `item_count` items. Takes effect on the next refresh.
	pub fn set_item_count(&mut self, item_count: usize) {
		self.item_count = item_count;
		self.stale = true;
	}

	/// Resize the viewport. Bindings are redone when the columns or the cell
	/// size change.
	pub fn set_viewport(&mut self, usable_width: f32, height: f32) {
		if self.layout.set_usable_width(usable_width) {
			self.stale = true;
		}
		self.viewport_height = height.max(0.0);
	}

	/// Override the column count; zero fits columns to the width.
	pub fn set_forced_columns(&mut self, columns: usize) {
		if self.layout.set_forced_columns(columns) {
			self.stale = true;
		}
	}

	/// Scroll to `offset` and rebind whatever came into view.
	pub fn on_scroll<H>(&mut self, offset: f32, host: &mut H)
	where
		H: SlotHost<Slot = S>,
	{
		self.offset = offset.max(0.0);
		self.refresh(host);
	}

	/// Bring the bound slots in line with the visible range.
	pub fn refresh<H>(&mut self, host: &mut H)
	where
		H: SlotHost<Slot = S>,
	{
		self.refresh_within(host, &FrameBudget::unlimited());
	}

	/// Like [`refresh`](Self::refresh), but stops binding once `budget` is
	/// spent. Returns [`Tick::Yield`] while visible indices are still unbound.
	pub fn refresh_within<H>(&mut self, host: &mut H, budget: &FrameBudget) -> Tick
	where
		H: SlotHost<Slot = S>,
	{
		if self.stale {
			self.recycle_all(host);
			self.stale = false;
		}

		let Some(range) = self.visible_range() else {
			self.recycle_all(host);
			return Tick::Done;
		};
		self.recycle_outside(&range, host);

		let size = self.layout.cell_size();
		for index in range.clone() {
			if self.active.contains_key(&index) {
				continue;
			}
			let (row, column, x, y) = self.layout.position(index);
			let binding = Binding {
				index,
				row,
				column,
				x,
				y,
				size,
			};
			let mut slot = match self.pool.pop() {
				Some(slot) => slot,
				None => host.create_slot(),
			};
			host.bind(&mut slot, &binding);
			self.active.insert(index, slot);

			if budget.is_exhausted() && index < *range.end() {
				return Tick::Yield;
			}
		}
		Tick::Done
	}

	/// Indices that should be bound for the current scroll position.
	#[must_use]
	pub fn visible_range(&self) -> Option<RangeInclusive<usize>> {
		self.layout
			.visible_range(self.item_count, self.offset, self.viewport_height)
	}

	/// Scrollable height of the whole list.
	#[must_use]
	pub fn content_extent(&self) -> f32 {
		self.layout.content_extent(self.item_count)
	}

	#[must_use]
	pub fn layout(&self) -> &GridLayout {
		&self.layout
	}

	#[must_use]
	pub fn item_count(&self) -> usize {
		self.item_count
	}

	/// Bound indices in ascending order.
	pub fn bound_indices(&self) -> impl Iterator<Item = usize> + '_ {
		self.active.keys().copied()
	}

	/// Bound slots with their indices, in ascending index order.
	pub fn slots(&self) -> impl Iterator<Item = (usize, &S)> {
		self.active.iter().map(|(index, slot)| (*index, slot))
	}

	#[must_use]
	pub fn slot(&self, index: usize) -> Option<&S> {
		self.active.get(&index)
	}

	#[must_use]
	pub fn active_len(&self) -> usize {
		self.active.len()
	}

	#[must_use]
	pub fn pool_len(&self) -> usize {
		self.pool.len()
	}

	fn recycle_outside<H>(&mut self, range: &RangeInclusive<usize>, host: &mut H)
	where
		H: SlotHost<Slot = S>,
	{
		let mut kept = self.active.split_off(range.start());
		let beyond = kept.split_off(&(range.end() + 1));
		let before = std::mem::replace(&mut self.active, kept);
		for (_, mut slot) in before.into_iter().chain(beyond) {
			host.release(&mut slot);
			self.pool.push(slot);
		}
	}

	fn recycle_all<H>(&mut self, host: &mut H)
	where
		H: SlotHost<Slot = S>,
	{
		for (_, mut slot) in std::mem::take(&mut self.active) {
			host.release(&mut slot);
			self.pool.push(slot);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::time::Duration;

	use super::*;

	#[derive(Debug)]
	struct TestSlot {
		id: usize,
		bound: Option<usize>,
	}

	#[derive(Default)]
	struct RecordingHost {
		created: usize,
		binds: usize,
		releases: usize,
	}

	impl SlotHost for RecordingHost {
		type Slot = TestSlot;

		fn create_slot(&mut self) -> TestSlot {
			self.created += 1;
			TestSlot {
				id: self.created,
				bound: None,
			}
		}

		fn bind(&mut self, slot: &mut TestSlot, binding: &Binding) {
			self.binds += 1;
			slot.bound = Some(binding.index);
		}

		fn release(&mut self, slot: &mut TestSlot) {
			self.releases += 1;
			slot.bound = None;
		}
	}

	fn grid(columns: usize) -> VirtualGrid<TestSlot> {
		let mut grid = VirtualGrid::new(GridLayout::new(230.0, 100.0, 10.0).with_forced_columns(columns));
		grid.set_viewport(230.0, 230.0);
		grid
	}

	fn assert_coverage(grid: &VirtualGrid<TestSlot>) {
		let expected: Vec<usize> = grid.visible_range().map(|range| range.collect()).unwrap_or_default();
		let bound: Vec<usize> = grid.bound_indices().collect();
		assert_eq!(bound, expected);

		let mut ids = HashSet::new();
		for (index, slot) in grid.slots() {
			assert_eq!(slot.bound, Some(index), "slot bound to its key");
			assert!(ids.insert(slot.id), "slot {} bound twice", slot.id);
		}
	}

	#[test]
	fn binds_exactly_the_visible_range() {
		for columns in 1..=4 {
			for item_count in [0, 1, 3, 7, 40, 250] {
				for offset in [0.0, 55.0, 480.0, 1_234.5, 90_000.0] {
					for height in [0.0, 100.0, 230.0, 700.0] {
						let mut host = RecordingHost::default();
						let mut grid = grid(columns);
						grid.set_viewport(230.0, height);
						grid.set_item_count(item_count);
						grid.on_scroll(offset, &mut host);
						assert_coverage(&grid);
					}
				}
			}
		}
	}

	#[test]
	fn scrolling_recycles_slots_instead_of_creating_them() {
		let mut host = RecordingHost::default();
		let mut grid = grid(2);
		grid.set_item_count(1_000);
		grid.refresh(&mut host);
		let initial = host.created;

		for step in 1..200 {
			grid.on_scroll(step as f32 * 37.0, &mut host);
			assert_coverage(&grid);
		}
		assert!(host.created <= initial + 4, "created {} slots", host.created);
		assert_eq!(host.created, grid.active_len() + grid.pool_len());
		assert!(host.releases > 0);
	}

	#[test]
	fn new_item_count_rebinds_everything() {
		let mut host = RecordingHost::default();
		let mut grid = grid(2);
		grid.set_item_count(100);
		grid.refresh(&mut host);
		let first_binds = host.binds;

		grid.set_item_count(3);
		grid.refresh(&mut host);
		assert_eq!(grid.bound_indices().collect::<Vec<_>>(), vec![0, 1, 2]);
		assert_eq!(host.binds, first_binds + 3);
		assert_eq!(grid.content_extent(), 2.0 * 120.0 + 10.0);

		grid.set_item_count(0);
		grid.refresh(&mut host);
		assert_eq!(grid.active_len(), 0);
	}

	#[test]
	fn column_change_rebinds_positions() {
		let mut host = RecordingHost::default();
		let mut grid = grid(2);
		grid.set_item_count(50);
		grid.refresh(&mut host);
		grid.set_forced_columns(3);
		grid.refresh(&mut host);
		assert_eq!(grid.layout().columns(), 3);
		assert_coverage(&grid);
	}

	#[test]
	fn budgeted_refresh_resumes_where_it_stopped() {
		let mut host = RecordingHost::default();
		let mut grid = grid(2);
		grid.set_item_count(100);
		let budget = FrameBudget::new(Duration::ZERO);

		let mut ticks = 1;
		while grid.refresh_within(&mut host, &budget) == Tick::Yield {
			ticks += 1;
		}
		assert_eq!(ticks, 6, "one binding per tick");
		assert_coverage(&grid);
	}
}
