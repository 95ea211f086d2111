use std::ops::RangeInclusive;

/// Grid geometry: column count and cell size derived from the usable width.
///
/// Cells are square. Rows are `cell_size + spacing` tall and the content
/// starts one `spacing` below the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
	usable_width: f32,
	min_cell_size: f32,
	spacing: f32,
	forced_columns: usize,
	columns: usize,
	cell_size: f32,
}

impl GridLayout {
	#[must_use]
	pub fn new(usable_width: f32, min_cell_size: f32, spacing: f32) -> Self {
		let mut layout = Self {
			usable_width: sanitize(usable_width),
			min_cell_size: sanitize(min_cell_size),
			spacing: sanitize(spacing),
			forced_columns: 0,
			columns: 1,
			cell_size: 0.0,
		};
		layout.recompute();
		layout
	}

	/// Fix the column count. Zero goes back to fitting columns to the width.
	#[must_use]
	pub fn with_forced_columns(mut self, columns: usize) -> Self {
		self.set_forced_columns(columns);
		self
	}

	/// Returns whether the column count or cell size changed.
	pub fn set_usable_width(&mut self, usable_width: f32) -> bool {
		self.usable_width = sanitize(usable_width);
		self.recompute()
	}

	/// Returns whether the column count or cell size changed.
	pub fn set_forced_columns(&mut self, columns: usize) -> bool {
		self.forced_columns = columns;
		self.recompute()
	}

	#[must_use]
	pub fn columns(&self) -> usize {
		self.columns
	}

	#[must_use]
	pub fn cell_size(&self) -> f32 {
		self.cell_size
	}

	#[must_use]
	pub fn spacing(&self) -> f32 {
		self.spacing
	}

	#[must_use]
	pub fn forced_columns(&self) -> usize {
		self.forced_columns
	}

	#[must_use]
	pub fn row_height(&self) -> f32 {
		self.cell_size + self.spacing
	}

	#[must_use]
	pub fn rows(&self, item_count: usize) -> usize {
		item_count.div_ceil(self.columns)
	}

	/// Scrollable height needed for `item_count` items.
	#[must_use]
	pub fn content_extent(&self, item_count: usize) -> f32 {
		self.rows(item_count) as f32 * self.row_height() + self.spacing
	}

	/// Row, column and top-left corner of `index`.
	#[must_use]
	pub fn position(&self, index: usize) -> (usize, usize, f32, f32) {
		let row = index / self.columns;
		let column = index % self.columns;
		let x = column as f32 * (self.cell_size + self.spacing);
		let y = self.spacing + row as f32 * self.row_height();
		(row, column, x, y)
	}

	/// Indices that must be bound for a viewport `viewport_height` tall,
	/// scrolled to `offset`, with one extra row above and below.
	///
	/// `None` when there is nothing to show. An offset past the end keeps the
	/// last row in range.
	#[must_use]
	pub fn visible_range(
		&self,
		item_count: usize,
		offset: f32,
		viewport_height: f32,
	) -> Option<RangeInclusive<usize>> {
		if item_count == 0 {
			return None;
		}
		let last_row = self.rows(item_count) - 1;
		let row_height = self.row_height();
		let (first, last) = if row_height > 0.0 {
			let offset = sanitize(offset);
			let top = ((offset - self.spacing).max(0.0) / row_height) as usize;
			let bottom = ((offset + sanitize(viewport_height)) / row_height) as usize;
			(top.saturating_sub(1), bottom.saturating_add(1).min(last_row))
		} else {
			(0, last_row)
		};
		let first = first.min(last);
		let start = first * self.columns;
		let end = ((last + 1) * self.columns).min(item_count) - 1;
		Some(start..=end)
	}

	fn recompute(&mut self) -> bool {
		let previous = (self.columns, self.cell_size);
		let columns = if self.forced_columns > 0 {
			self.forced_columns
		} else {
			let stride = self.min_cell_size + self.spacing;
			if stride > 0.0 {
				((self.usable_width + self.spacing) / stride) as usize
			} else {
				1
			}
		};
		self.columns = columns.max(1);
		let gaps = (self.columns - 1) as f32 * self.spacing;
		self.cell_size = ((self.usable_width - gaps) / self.columns as f32).max(0.0);
		previous != (self.columns, self.cell_size)
	}
}

fn sanitize(value: f32) -> f32 {
	if value.is_finite() { value.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fits_columns_to_width() {
		let layout = GridLayout::new(530.0, 100.0, 10.0);
		assert_eq!(layout.columns(), 4);
		assert_eq!(layout.cell_size(), (530.0 - 30.0) / 4.0);

		let narrow = GridLayout::new(50.0, 100.0, 10.0);
		assert_eq!(narrow.columns(), 1, "at least one column");
		assert_eq!(narrow.cell_size(), 50.0);
	}

	#[test]
	fn forced_columns_override_width() {
		let mut layout = GridLayout::new(530.0, 100.0, 10.0).with_forced_columns(2);
		assert_eq!(layout.columns(), 2);
		assert_eq!(layout.cell_size(), 260.0);
		assert!(layout.set_forced_columns(0));
		assert_eq!(layout.columns(), 4);
		assert!(!layout.set_usable_width(530.0), "same width changes nothing");
	}

	#[test]
	fn content_extent_counts_partial_rows() {
		let layout = GridLayout::new(230.0, 100.0, 10.0).with_forced_columns(2);
		assert_eq!(layout.row_height(), 120.0);
		assert_eq!(layout.content_extent(0), 10.0);
		assert_eq!(layout.content_extent(3), 2.0 * 120.0 + 10.0);
	}

	#[test]
	fn visible_range_adds_one_row_buffer() {
		let layout = GridLayout::new(230.0, 100.0, 10.0).with_forced_columns(2);
		assert_eq!(layout.visible_range(0, 0.0, 500.0), None);
		assert_eq!(layout.visible_range(100, 0.0, 230.0), Some(0..=5));
		assert_eq!(layout.visible_range(100, 600.0, 230.0), Some(6..=15));
		assert_eq!(layout.visible_range(9, 600.0, 230.0), Some(6..=8));
		assert_eq!(layout.visible_range(100, -50.0, 0.0), Some(0..=3));
	}

	#[test]
	fn scrolling_past_the_end_keeps_the_last_rows_bound() {
		let layout = GridLayout::new(230.0, 100.0, 10.0).with_forced_columns(2);
		let range = layout.visible_range(5, 10_000.0, 200.0).expect("range");
		assert_eq!(range, 4..=4);
	}

	#[test]
	fn positions_follow_row_major_order() {
		let layout = GridLayout::new(230.0, 100.0, 10.0).with_forced_columns(2);
		assert_eq!(layout.position(0), (0, 0, 0.0, 10.0));
		assert_eq!(layout.position(3), (1, 1, 120.0, 130.0));
	}
}
