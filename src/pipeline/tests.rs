use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use super::*;
use crate::config::{ExtractionOptions, SweepOptions};
use crate::error::Result;
use crate::filter::{MemoryRatings, MemoryTags, PeopleFilter};
use crate::metadata::{MemoryStore, MetadataExtractor};
use crate::source::{EntryReader, FilesystemOptions, Library, PackageTable};

fn context() -> FilterContext {
	FilterContext {
		tags: Arc::new(MemoryTags::new()),
		ratings: Arc::new(MemoryRatings::new()),
		index: Arc::new(MetadataIndex::new(Box::new(MemoryStore::new()), 1_000)),
	}
}

fn sweep_for(source: Arc<dyn LibrarySource>, context: &FilterContext) -> IndexingSweep {
	let extractor = MetadataExtractor::new(Arc::clone(&context.index), source, ExtractionOptions::default());
	IndexingSweep::new(Arc::new(extractor), SweepOptions::default())
}

fn three_package_library() -> Library {
	let mut library = Library::new();
	library
		.add_package("One.var", PackageTable::from_rows([("A/x.json", 1, 10)]))
		.add_package("Two.var", PackageTable::from_rows([("A/y.json", 2, 20)]))
		.add_package("Three.var", PackageTable::from_rows([("B/z.vap", 3, 30)]));
	library
}

/// Tick until the pass completes, sleeping briefly whenever the consumer
/// is waiting on the producer.
fn wait_for_results(pipeline: &mut EnumerationPipeline, sweep: &mut IndexingSweep) {
	let deadline = Instant::now() + Duration::from_secs(5);
	loop {
		let budget = FrameBudget::from_millis(10);
		if pipeline.tick(&budget, sweep) == Tick::Done {
			return;
		}
		assert!(Instant::now() < deadline, "pass did not complete in time");
		thread::sleep(Duration::from_millis(1));
	}
}

fn internal_paths(entries: &[Entry]) -> Vec<String> {
	let mut paths: Vec<String> = entries
		.iter()
		.map(|entry| entry.internal_path().to_string())
		.collect();
	paths.sort();
	paths
}

#[test]
fn filters_three_packages_by_extension_and_scope() {
	let source: Arc<dyn LibrarySource> = Arc::new(three_package_library());
	let context = context();
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 1);

	let token = pipeline.start(FilterState::new().with_extensions(["json"]).with_scopes(["A/"]));
	sweep.start(token);
	wait_for_results(&mut pipeline, &mut sweep);

	assert!(pipeline.is_complete());
	assert_eq!(internal_paths(pipeline.results()), vec!["A/x.json", "A/y.json"]);
}

#[test]
fn unreadable_packages_are_skipped() {
	let mut library = three_package_library();
	library.add_unreadable_package("Broken.var", "bad header");
	let source: Arc<dyn LibrarySource> = Arc::new(library);
	let context = context();
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 64);

	pipeline.start(FilterState::new());
	wait_for_results(&mut pipeline, &mut sweep);

	assert_eq!(
		internal_paths(pipeline.results()),
		vec!["A/x.json", "A/y.json", "B/z.vap"]
	);
}

/// Library whose package tables are large and slow to hand out, so a pass
/// is still producing when the next one starts.
struct SlowLibrary {
	packages: usize,
	rows: usize,
	served: AtomicUsize,
}

impl LibrarySource for SlowLibrary {
	fn package_names(&self) -> Vec<String> {
		(0..self.packages).map(|i| format!("P{i}.var")).collect()
	}

	fn package(&self, name: &str) -> Result<Arc<PackageTable>> {
		self.served.fetch_add(1, Ordering::SeqCst);
		thread::sleep(Duration::from_millis(2));
		let rows = (0..self.rows).map(|i| (format!("{name}/{i}.json"), 0, 0));
		Ok(Arc::new(PackageTable::from_rows(rows)))
	}

	fn open(&self, _entry: &Entry) -> std::io::Result<EntryReader> {
		Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
	}
}

#[test]
fn new_generation_supersedes_the_previous_pass() {
	let library = Arc::new(SlowLibrary {
		packages: 200,
		rows: 50,
		served: AtomicUsize::new(0),
	});
	let source: Arc<dyn LibrarySource> = library.clone();
	let context = context();
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 8);

	let first = pipeline.start(FilterState::new().with_query("P1"));
	thread::sleep(Duration::from_millis(10));
	pipeline.tick(&FrameBudget::unlimited(), &mut sweep);

	let second = pipeline.start(FilterState::new().with_query("P7.var/3"));
	assert!(!first.is_live());
	assert!(second.is_live());
	assert!(pipeline.results().is_empty(), "previous results are dropped");

	wait_for_results(&mut pipeline, &mut sweep);
	assert!(!pipeline.results().is_empty());
	for entry in pipeline.results() {
		assert!(
			entry.path().contains("P7.var/3"),
			"{} leaked from the superseded pass",
			entry.path()
		);
	}
	assert!(
		library.served.load(Ordering::SeqCst) < 2 * 200,
		"superseded producer stopped early"
	);
}

#[test]
fn stale_pipeline_tick_returns_without_appending() {
	let source: Arc<dyn LibrarySource> = Arc::new(three_package_library());
	let context = context();
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 1);

	pipeline.start(FilterState::new());
	pipeline.cancel();
	thread::sleep(Duration::from_millis(20));
	assert_eq!(pipeline.tick(&FrameBudget::unlimited(), &mut sweep), Tick::Done);
	assert!(pipeline.results().is_empty());
	assert!(!pipeline.is_complete());
}

#[test]
fn zero_budget_yields_after_each_candidate() {
	let source: Arc<dyn LibrarySource> = Arc::new(three_package_library());
	let context = context();
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 64);

	pipeline.start(FilterState::new());
	let budget = FrameBudget::new(Duration::ZERO);
	let deadline = Instant::now() + Duration::from_secs(5);
	let mut ticks = 0;
	while pipeline.tick(&budget, &mut sweep) == Tick::Yield {
		ticks += 1;
		assert!(Instant::now() < deadline, "pass did not complete in time");
		thread::sleep(Duration::from_millis(1));
	}
	assert!(ticks >= 3, "one candidate per tick");
	assert_eq!(pipeline.results().len(), 3);
}

#[test]
fn unknown_metadata_is_swept_and_used_by_the_next_pass() {
	let dir = tempdir().expect("tempdir");
	let scenes = dir.path().join("Saves/scene");
	fs::create_dir_all(&scenes).expect("mkdir");
	fs::write(scenes.join("duo.json"), br#"{"atoms":[],"PeopleCount":2}"#).expect("write duo");
	fs::write(scenes.join("solo.json"), br#"{"atoms":[],"PeopleCount":1}"#).expect("write solo");

	let source: Arc<dyn LibrarySource> =
		Arc::new(Library::with_root(dir.path(), FilesystemOptions::default()));
	let context = context();
	let index = Arc::clone(&context.index);
	let mut sweep = sweep_for(Arc::clone(&source), &context);
	let mut pipeline = EnumerationPipeline::new(Arc::clone(&source), context, 64);
	let filter = FilterState::new()
		.with_scopes(["Saves/"])
		.with_people(PeopleFilter::DUAL);

	let token = pipeline.start(filter.clone());
	sweep.start(token);
	wait_for_results(&mut pipeline, &mut sweep);
	assert!(pipeline.results().is_empty(), "unknown entries count as single");
	assert_eq!(sweep.len(), 2);

	while sweep.tick(&FrameBudget::unlimited(), &mut |_| {}) == Tick::Yield {}
	assert_eq!(index.lookup("Saves/scene/duo.json"), Some(2));

	let token = pipeline.start(filter);
	sweep.start(token);
	wait_for_results(&mut pipeline, &mut sweep);
	assert_eq!(internal_paths(pipeline.results()), vec!["Saves/scene/duo.json"]);
	assert!(sweep.is_empty(), "known entries are not queued again");
}
