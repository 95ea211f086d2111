use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use varlens_stream::{CandidateQueue, GenerationToken};

use crate::entry::Entry;
use crate::filter::FilterState;
use crate::source::{LibrarySource, LooseFile};

/// Everything one background enumeration needs, moved onto its thread.
pub(super) struct ProducerJob {
	pub source: Arc<dyn LibrarySource>,
	pub filter: Arc<FilterState>,
	pub queue: Arc<CandidateQueue<Entry>>,
	pub token: GenerationToken,
	pub batch_size: usize,
}

/// Launch the producer thread.
pub(super) fn spawn(job: ProducerJob) -> Option<JoinHandle<()>> {
	launch(job, |job| {
		thread::Builder::new()
			.name(format!("varlens-producer-{}", job.token.id()))
			.spawn(move || job.run())
	})
}

/// Hand `job` to `spawner`. If no thread can be started the queue is marked
/// done, so the pass completes empty on the next tick instead of walking the
/// library on the host thread.
fn launch(
	job: ProducerJob,
	spawner: impl FnOnce(ProducerJob) -> io::Result<JoinHandle<()>>,
) -> Option<JoinHandle<()>> {
	let queue = Arc::clone(&job.queue);
	let generation = job.token.id();
	match spawner(job) {
		Ok(handle) => Some(handle),
		Err(err) => {
			log::warn!("generation {generation}: failed to spawn enumeration thread: {err}");
			queue.mark_done();
			None
		}
	}
}

impl ProducerJob {
	/// Walk every package, then the loose files, pushing candidates that pass
	/// the cheap filters. Always marks the queue done on exit.
	pub(super) fn run(self) {
		let mut batch = Vec::with_capacity(self.batch_size);
		let completed = self.walk_packages(&mut batch) && self.walk_loose(&mut batch);
		self.queue.push_batch(&mut batch);
		self.queue.mark_done();
		if completed {
			log::debug!("generation {} enumeration finished", self.token.id());
		} else {
			log::debug!("generation {} enumeration abandoned", self.token.id());
		}
	}

	fn walk_packages(&self, batch: &mut Vec<Entry>) -> bool {
		for name in self.source.package_names() {
			if !self.token.is_live() {
				return false;
			}
			let table = match self.source.package(&name) {
				Ok(table) => table,
				Err(err) => {
					log::debug!("skipping package {name}: {err}");
					continue;
				}
			};
			for row in table.rows() {
				if !self.token.is_live() {
					return false;
				}
				let entry = Entry::packaged(&name, row.path, row.size, row.timestamp);
				if self.filter.admits_candidate(entry.path(), entry.internal_path()) {
					self.offer(batch, entry);
				}
			}
			self.queue.push_batch(batch);
		}
		true
	}

	fn walk_loose(&self, batch: &mut Vec<Entry>) -> bool {
		let mut live = true;
		let mut visit = |file: LooseFile| {
			if !self.token.is_live() {
				live = false;
				return false;
			}
			if self.filter.admits_candidate(&file.path, &file.path) {
				self.offer(batch, Entry::loose(file.path, file.size, file.modified));
			}
			true
		};
		if let Err(err) = self.source.list_loose(&self.filter.scopes, &mut visit) {
			log::debug!("skipping loose files: {err}");
		}
		live
	}

	fn offer(&self, batch: &mut Vec<Entry>, entry: Entry) {
		batch.push(entry);
		if batch.len() >= self.batch_size {
			self.queue.push_batch(batch);
		}
	}
}
