//! Streaming primitives for moving catalog work between threads without
//! blocking the host loop.
//!
//! The crate bundles the small set of building blocks the catalog engine is
//! assembled from:
//!
//! - [`Generation`] hands out [`GenerationToken`]s. Starting new work
//!   supersedes every token issued before it, and long-running loops poll
//!   [`GenerationToken::is_live`] instead of being interrupted.
//! - [`CandidateQueue`] is the locked hand-off between a background producer
//!   and a cooperative consumer.
//! - [`FrameBudget`] measures how long a cooperative task has been running so
//!   it can suspend with [`Tick::Yield`] and resume on the next host tick.
//! - [`StreamEnvelope`] and [`DataStream`] wrap an [`mpsc`] channel so
//!   producers can publish notifications tagged with the generation they
//!   belong to.
//!
//! Base usage:
//! ```
//! use std::sync::mpsc;
//!
//! use varlens_stream::{DataStream, Generation, StreamEnvelope};
//!
//! let generation = Generation::new();
//! let token = generation.advance();
//!
//! let (tx, rx) = mpsc::channel::<StreamEnvelope<&'static str, usize>>();
//! let stream = DataStream::new(&tx, token.id(), "appended");
//! stream.send(42, false);
//!
//! let envelope = rx.recv().unwrap();
//! assert_eq!(envelope.id, token.id());
//! assert_eq!(envelope.payload, 42);
//!
//! let next = generation.advance();
//! assert!(!token.is_live());
//! assert!(next.is_live());
//! ```
//!
//! [`mpsc`]: std::sync::mpsc

use std::sync::mpsc::Sender;

mod budget;
mod generation;
mod queue;

pub use budget::{FrameBudget, Tick};
pub use generation::{Generation, GenerationToken};
pub use queue::CandidateQueue;

/// Message emitted by a background system and delivered to the host loop.
#[derive(Debug, Clone)]
pub struct StreamEnvelope<M, P> {
	/// Generation the message belongs to.
	pub id: u64,
	/// Stream-specific metadata describing the payload.
	pub kind: M,
	/// Payload delivered to the consumer.
	pub payload: P,
	/// Whether the producer finished streaming for this generation.
	pub complete: bool,
}

impl<M, P> StreamEnvelope<M, P> {
	/// Transform the payload while preserving the envelope metadata.
	pub fn map_payload<N>(self, f: impl FnOnce(P) -> N) -> StreamEnvelope<M, N> {
		StreamEnvelope {
			id: self.id,
			kind: self.kind,
			payload: f(self.payload),
			complete: self.complete,
		}
	}

	/// Whether the envelope was produced under the given token.
	#[must_use]
	pub fn belongs_to(&self, token: &GenerationToken) -> bool {
		self.id == token.id()
	}
}

/// Handle for producing stream messages backed by an [`mpsc::Sender`].
///
/// [`mpsc::Sender`]: std::sync::mpsc::Sender
pub struct DataStream<'a, M, P> {
	tx: &'a Sender<StreamEnvelope<M, P>>,
	id: u64,
	kind: M,
}

impl<'a, M: Clone, P: Send + 'static> DataStream<'a, M, P> {
	/// Create a new handle backed by the provided sender.
	#[must_use]
	pub fn new(tx: &'a Sender<StreamEnvelope<M, P>>, id: u64, kind: M) -> Self {
		Self { tx, id, kind }
	}

	/// Generation identifier associated with this stream.
	#[must_use]
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Metadata associated with each emitted payload.
	#[must_use]
	pub fn kind(&self) -> &M {
		&self.kind
	}

	/// Emit a payload to the consumer. Returns `false` once the receiver hung up.
	pub fn send(&self, payload: P, complete: bool) -> bool {
		self.tx
			.send(StreamEnvelope {
				id: self.id,
				kind: self.kind.clone(),
				payload,
				complete,
			})
			.is_ok()
	}
}

impl<'a, M: Clone, P: Send + 'static> Clone for DataStream<'a, M, P> {
	fn clone(&self) -> Self {
		Self {
			tx: self.tx,
			id: self.id,
			kind: self.kind.clone(),
		}
	}
}
