use anyhow::Result;
use serde_json::json;
use varlens::{Binding, GridLayout, SlotHost, VirtualGrid};

use crate::workflow::CatalogOutcome;

/// Character cells between grid columns.
const GRID_SPACING: f32 = 1.0;
/// Narrowest grid cell, in characters.
const GRID_MIN_CELL: f32 = 24.0;

/// Print one uid per line followed by a page summary.
pub(crate) fn print_plain(outcome: &CatalogOutcome) {
	for item in &outcome.entries {
		println!("{}", item.entry.uid());
	}
	println!("{}", summary_line(outcome));
}

fn summary_line(outcome: &CatalogOutcome) -> String {
	if outcome.paginated {
		format!(
			"page {} of {}, {} results ({})",
			outcome.page + 1,
			outcome.total_pages,
			outcome.total,
			outcome.index_status
		)
	} else {
		format!("{} results ({})", outcome.total, outcome.index_status)
	}
}

/// Format the outcome as a JSON string.
pub(crate) fn format_outcome_json(outcome: &CatalogOutcome) -> Result<String> {
	let entries: Vec<_> = outcome
		.entries
		.iter()
		.map(|item| {
			json!({
				"uid": item.entry.uid(),
				"path": item.entry.path(),
				"package": item.entry.package(),
				"size": item.entry.size(),
				"last_modified": item.entry.last_modified(),
				"people": item.people,
			})
		})
		.collect();

	let payload = json!({
		"total": outcome.total,
		"page": outcome.page,
		"total_pages": outcome.total_pages,
		"entries": entries,
		"facets": outcome.facets.rows(),
		"index": {
			"status": outcome.index_status,
			"opened": outcome.stats.opened,
			"tail_hits": outcome.stats.tail_hits,
			"forward_scans": outcome.stats.forward_scans,
			"failures": outcome.stats.failures,
		},
	});

	Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the outcome.
pub(crate) fn print_json(outcome: &CatalogOutcome) -> Result<()> {
	println!("{}", format_outcome_json(outcome)?);
	Ok(())
}

/// Text cell bound by the grid.
#[derive(Debug, Default)]
struct TextCell {
	row: usize,
	column: usize,
	text: String,
}

/// Fills grid cells with file names truncated to the cell width.
struct TextHost<'a> {
	outcome: &'a CatalogOutcome,
}

impl SlotHost for TextHost<'_> {
	type Slot = TextCell;

	fn create_slot(&mut self) -> TextCell {
		TextCell::default()
	}

	fn bind(&mut self, slot: &mut TextCell, binding: &Binding) {
		let width = binding.size as usize;
		let name = self
			.outcome
			.entries
			.get(binding.index)
			.map_or("", |item| item.entry.file_name());
		slot.row = binding.row;
		slot.column = binding.column;
		slot.text = fit(name, width);
	}

	fn release(&mut self, slot: &mut TextCell) {
		slot.text.clear();
	}
}

/// Truncate or pad `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
	let count = text.chars().count();
	if count <= width {
		format!("{text:<width$}")
	} else if width <= 1 {
		text.chars().take(width).collect()
	} else {
		let mut truncated: String = text.chars().take(width - 1).collect();
		truncated.push('~');
		truncated
	}
}

/// Lay the page out through a virtual grid `width` characters wide.
pub(crate) fn format_grid(outcome: &CatalogOutcome, width: usize, columns: Option<usize>) -> String {
	let layout = GridLayout::new(width as f32, GRID_MIN_CELL, GRID_SPACING)
		.with_forced_columns(columns.unwrap_or(0));
	let mut grid = VirtualGrid::new(layout);
	grid.set_item_count(outcome.entries.len());
	grid.set_viewport(width as f32, grid.content_extent());

	let mut host = TextHost { outcome };
	grid.refresh(&mut host);

	let mut lines: Vec<String> = Vec::new();
	for (_, cell) in grid.slots() {
		if lines.len() <= cell.row {
			lines.resize(cell.row + 1, String::new());
		}
		let line = &mut lines[cell.row];
		if cell.column > 0 {
			line.push(' ');
		}
		line.push_str(&cell.text);
	}
	lines
		.into_iter()
		.map(|line| line.trim_end().to_string())
		.collect::<Vec<_>>()
		.join("\n")
}

/// Print the page as a grid followed by the page summary.
pub(crate) fn print_grid(outcome: &CatalogOutcome, width: usize, columns: Option<usize>) {
	let grid = format_grid(outcome, width, columns);
	if !grid.is_empty() {
		println!("{grid}");
	}
	println!("{}", summary_line(outcome));
}
