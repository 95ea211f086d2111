use std::ops::Range;

/// Fixed-size pages over a result list.
///
/// The current page is clamped into `[0, total_pages)` whenever the list or
/// the page size changes, and there is always at least one page.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
	items: Vec<T>,
	page_size: usize,
	current: usize,
}

impl<T> Paginator<T> {
	#[must_use]
	pub fn new(page_size: usize) -> Self {
		Self {
			items: Vec::new(),
			page_size: page_size.max(1),
			current: 0,
		}
	}

	/// Replace the list, keeping the current page where it still exists.
	pub fn set_results(&mut self, items: Vec<T>) {
		self.items = items;
		self.clamp();
	}

	/// Drop every item and go back to the first page.
	pub fn clear(&mut self) {
		self.items.clear();
		self.current = 0;
	}

	pub fn set_page_size(&mut self, page_size: usize) {
		self.page_size = page_size.max(1);
		self.clamp();
	}

	/// Move to page `page`, clamped to the last page. Returns the page selected.
	pub fn set_page(&mut self, page: usize) -> usize {
		self.current = page;
		self.clamp();
		self.current
	}

	pub fn next_page(&mut self) -> usize {
		self.set_page(self.current.saturating_add(1))
	}

	pub fn previous_page(&mut self) -> usize {
		self.set_page(self.current.saturating_sub(1))
	}

	#[must_use]
	pub fn page_size(&self) -> usize {
		self.page_size
	}

	#[must_use]
	pub fn current_page(&self) -> usize {
		self.current
	}

	#[must_use]
	pub fn total_pages(&self) -> usize {
		self.items.len().div_ceil(self.page_size).max(1)
	}

	/// Index range of page `page`. Empty past the last page.
	#[must_use]
	pub fn page_range(&self, page: usize) -> Range<usize> {
		let start = page.saturating_mul(self.page_size).min(self.items.len());
		let end = start.saturating_add(self.page_size).min(self.items.len());
		start..end
	}

	/// Items on page `page`.
	#[must_use]
	pub fn page(&self, page: usize) -> &[T] {
		&self.items[self.page_range(page)]
	}

	/// Items on the current page.
	#[must_use]
	pub fn current(&self) -> &[T] {
		self.page(self.current)
	}

	/// The whole list.
	#[must_use]
	pub fn items(&self) -> &[T] {
		&self.items
	}

	pub fn items_mut(&mut self) -> &mut [T] {
		&mut self.items
	}

	/// Hand the list over, leaving the paginator empty.
	pub fn take(&mut self) -> Vec<T> {
		self.current = 0;
		std::mem::take(&mut self.items)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	fn clamp(&mut self) {
		self.current = self.current.min(self.total_pages() - 1);
	}
}
