use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::index::MetadataIndex;
use super::scan::{scan_reader, tail_scan};
use crate::config::ExtractionOptions;
use crate::entry::Entry;
use crate::filter::DEFAULT_PEOPLE_COUNT;
use crate::source::{EntryReader, LibrarySource, SeekRead};

/// Counters describing the work the extractor actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
	/// Entries whose bytes were opened.
	pub opened: usize,
	/// Values found by the tail probe.
	pub tail_hits: usize,
	/// Forward scans started.
	pub forward_scans: usize,
	/// Opens or reads that failed.
	pub failures: usize,
}

#[derive(Debug, Default)]
struct Counters {
	opened: AtomicUsize,
	tail_hits: AtomicUsize,
	forward_scans: AtomicUsize,
	failures: AtomicUsize,
}

/// Derives occupant counts from entry bytes and memoizes them in the index.
pub struct MetadataExtractor {
	index: Arc<MetadataIndex>,
	source: Arc<dyn LibrarySource>,
	options: ExtractionOptions,
	counters: Counters,
}

impl MetadataExtractor {
	#[must_use]
	pub fn new(index: Arc<MetadataIndex>, source: Arc<dyn LibrarySource>, options: ExtractionOptions) -> Self {
		Self {
			index,
			source,
			options,
			counters: Counters::default(),
		}
	}

	#[must_use]
	pub fn index(&self) -> &Arc<MetadataIndex> {
		&self.index
	}

	/// Occupant count of `entry`.
	///
	/// Never fails: unreadable entries yield [`DEFAULT_PEOPLE_COUNT`] and are
	/// not memoized, so a later call tries again. A readable entry without the
	/// marker is memoized as the default.
	pub fn extract(&self, entry: &Entry) -> u32 {
		if let Some(value) = self.index.lookup(entry.uid()) {
			return value;
		}
		match self.derive(entry) {
			Ok(found) => {
				let value = found.map_or(DEFAULT_PEOPLE_COUNT, |value| value.max(DEFAULT_PEOPLE_COUNT));
				self.index.record(entry.uid(), value);
				value
			}
			Err(err) => {
				self.counters.failures.fetch_add(1, Ordering::Relaxed);
				log::debug!("metadata extraction failed for {}: {err}", entry.path());
				DEFAULT_PEOPLE_COUNT
			}
		}
	}

	/// Known value without touching entry bytes.
	#[must_use]
	pub fn peek(&self, entry: &Entry) -> Option<u32> {
		self.index.lookup(entry.uid())
	}

	#[must_use]
	pub fn stats(&self) -> ExtractionStats {
		ExtractionStats {
			opened: self.counters.opened.load(Ordering::Relaxed),
			tail_hits: self.counters.tail_hits.load(Ordering::Relaxed),
			forward_scans: self.counters.forward_scans.load(Ordering::Relaxed),
			failures: self.counters.failures.load(Ordering::Relaxed),
		}
	}

	fn derive(&self, entry: &Entry) -> io::Result<Option<u32>> {
		let reader = self.source.open(entry)?;
		self.counters.opened.fetch_add(1, Ordering::Relaxed);
		match reader {
			EntryReader::Seekable(mut reader) => {
				let (found, whole_file) = self.probe_tail(reader.as_mut())?;
				if found.is_some() {
					self.counters.tail_hits.fetch_add(1, Ordering::Relaxed);
					return Ok(found);
				}
				if whole_file {
					return Ok(None);
				}
				reader.seek(SeekFrom::Start(0))?;
				self.scan_forward(reader.as_mut())
			}
			EntryReader::Sequential(mut reader) => self.scan_forward(reader.as_mut()),
		}
	}

	/// Read the suffix of the stream and scan it. Also reports whether the
	/// suffix covered the whole stream.
	fn probe_tail(&self, reader: &mut dyn SeekRead) -> io::Result<(Option<u32>, bool)> {
		let len = reader.seek(SeekFrom::End(0))?;
		let read_len = len.min(self.options.tail_read_bytes as u64);
		reader.seek(SeekFrom::Start(len - read_len))?;
		let mut buf = Vec::with_capacity(read_len as usize);
		reader.take(read_len).read_to_end(&mut buf)?;
		Ok((tail_scan(&buf), read_len == len))
	}

	fn scan_forward<R: Read + ?Sized>(&self, reader: &mut R) -> io::Result<Option<u32>> {
		self.counters.forward_scans.fetch_add(1, Ordering::Relaxed);
		scan_reader(reader, self.options.scan_chunk_bytes)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::io::{Cursor, ErrorKind};

	use super::*;
	use crate::error::Result;
	use crate::metadata::MemoryStore;
	use crate::source::PackageTable;

	/// In-memory source that counts how often entry bytes are opened.
	struct StubSource {
		files: HashMap<String, Vec<u8>>,
		seekable: bool,
		opens: AtomicUsize,
	}

	impl StubSource {
		fn new(seekable: bool, files: &[(&str, &[u8])]) -> Self {
			Self {
				files: files
					.iter()
					.map(|(path, bytes)| ((*path).to_string(), bytes.to_vec()))
					.collect(),
				seekable,
				opens: AtomicUsize::new(0),
			}
		}
	}

	impl LibrarySource for StubSource {
		fn package_names(&self) -> Vec<String> {
			Vec::new()
		}

		fn package(&self, name: &str) -> Result<Arc<PackageTable>> {
			Err(crate::error::CatalogError::Package {
				name: name.to_string(),
				reason: "stub".to_string(),
			})
		}

		fn open(&self, entry: &Entry) -> io::Result<EntryReader> {
			self.opens.fetch_add(1, Ordering::SeqCst);
			let bytes = self
				.files
				.get(entry.path())
				.cloned()
				.ok_or_else(|| io::Error::from(ErrorKind::NotFound))?;
			Ok(if self.seekable {
				EntryReader::Seekable(Box::new(Cursor::new(bytes)))
			} else {
				EntryReader::Sequential(Box::new(Cursor::new(bytes)))
			})
		}
	}

	fn extractor(source: Arc<StubSource>, options: ExtractionOptions) -> MetadataExtractor {
		let index = Arc::new(MetadataIndex::new(Box::new(MemoryStore::new()), 100));
		MetadataExtractor::new(index, source, options)
	}

	fn padded(prefix_len: usize, tail: &[u8]) -> Vec<u8> {
		let mut bytes = br#"{"PeopleCount":"9","padding":""#.to_vec();
		bytes.resize(prefix_len, b'x');
		bytes.extend_from_slice(tail);
		bytes
	}

	#[test]
	fn tail_read_answers_without_forward_scan() {
		let file = padded(200_000, br#"","PeopleCount":2}"#);
		let source = Arc::new(StubSource::new(true, &[("scene.json", &file)]));
		let extractor = extractor(Arc::clone(&source), ExtractionOptions::default());

		assert_eq!(extractor.extract(&Entry::loose("scene.json", 0, 0)), 2);
		let stats = extractor.stats();
		assert_eq!(stats.tail_hits, 1);
		assert_eq!(stats.forward_scans, 0);
	}

	#[test]
	fn second_extraction_does_not_reread() {
		let source = Arc::new(StubSource::new(true, &[("a.json", br#"{"PeopleCount":3}"#)]));
		let extractor = extractor(Arc::clone(&source), ExtractionOptions::default());
		let entry = Entry::loose("a.json", 0, 0);

		assert_eq!(extractor.extract(&entry), 3);
		assert_eq!(extractor.extract(&entry), 3);
		assert_eq!(source.opens.load(Ordering::SeqCst), 1);
		assert_eq!(extractor.peek(&entry), Some(3));
	}

	#[test]
	fn falls_back_to_forward_scan_when_marker_is_early() {
		let file = padded(200_000, b"\"}");
		let source = Arc::new(StubSource::new(true, &[("a.json", &file)]));
		let options = ExtractionOptions {
			tail_read_bytes: 1024,
			scan_chunk_bytes: 7,
		};
		let extractor = extractor(source, options);
		assert_eq!(extractor.extract(&Entry::loose("a.json", 0, 0)), 9);
		assert_eq!(extractor.stats().forward_scans, 1);
	}

	#[test]
	fn sequential_streams_use_forward_scan() {
		let source = Arc::new(StubSource::new(false, &[("a.json", br#"{"PeopleCount" : 4 }"#)]));
		let extractor = extractor(source, ExtractionOptions::default());
		assert_eq!(extractor.extract(&Entry::loose("a.json", 0, 0)), 4);
		let stats = extractor.stats();
		assert_eq!(stats.tail_hits, 0);
		assert_eq!(stats.forward_scans, 1);
	}

	#[test]
	fn failures_yield_default_and_are_retried() {
		let source = Arc::new(StubSource::new(true, &[]));
		let extractor = extractor(Arc::clone(&source), ExtractionOptions::default());
		let entry = Entry::loose("missing.json", 0, 0);
		assert_eq!(extractor.extract(&entry), DEFAULT_PEOPLE_COUNT);
		assert_eq!(extractor.extract(&entry), DEFAULT_PEOPLE_COUNT);
		assert_eq!(source.opens.load(Ordering::SeqCst), 2);
		assert_eq!(extractor.stats().failures, 2);
		assert_eq!(extractor.peek(&entry), None);
	}

	#[test]
	fn files_without_marker_are_memoized_as_default() {
		let source = Arc::new(StubSource::new(true, &[("pose.json", br#"{"id":"Person"}"#)]));
		let extractor = extractor(Arc::clone(&source), ExtractionOptions::default());
		let entry = Entry::loose("pose.json", 0, 0);
		assert_eq!(extractor.extract(&entry), DEFAULT_PEOPLE_COUNT);
		assert_eq!(extractor.peek(&entry), Some(DEFAULT_PEOPLE_COUNT));
		assert_eq!(extractor.stats().forward_scans, 0, "whole file already probed");
	}
}
