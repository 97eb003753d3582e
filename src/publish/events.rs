//! Publish events consumed by analytics collaborators.

// std
use std::{
	fs::{File, OpenOptions},
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{_prelude::*, publish::PublishResult};

/// One finished publish attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEvent {
	/// Draft text that was submitted.
	pub text: String,
	/// Summary of the outcome.
	pub result: PublishResult,
	/// Instant the attempt finished, as Unix seconds on the wire.
	#[serde(with = "time::serde::timestamp")]
	pub at: OffsetDateTime,
}

/// Receiver of [`PublishEvent`] values.
pub trait PublishEventSink
where
	Self: Send + Sync,
{
	/// Records one event. Failures are logged by the caller and never fail the publish.
	fn emit(&self, event: &PublishEvent) -> io::Result<()>;
}

/// Keeps events in memory; useful for tests and in-process dashboards.
#[derive(Debug, Default)]
pub struct MemoryEventSink(Mutex<Vec<PublishEvent>>);
impl MemoryEventSink {
	/// Copies the recorded events.
	pub fn events(&self) -> Vec<PublishEvent> {
		self.0.lock().clone()
	}

	/// Number of recorded events.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns `true` when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}
}
impl PublishEventSink for MemoryEventSink {
	fn emit(&self, event: &PublishEvent) -> io::Result<()> {
		self.0.lock().push(event.clone());

		Ok(())
	}
}

/// Appends one JSON document per line to a file.
#[derive(Debug)]
pub struct JsonLinesEventSink {
	path: PathBuf,
	file: Mutex<File>,
}
impl JsonLinesEventSink {
	/// Opens `path` for appending, creating it when missing.
	pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
		let path = path.into();
		let file = OpenOptions::new().create(true).append(true).open(&path)?;

		Ok(Self { path, file: Mutex::new(file) })
	}

	/// Location of the log file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl PublishEventSink for JsonLinesEventSink {
	fn emit(&self, event: &PublishEvent) -> io::Result<()> {
		let mut line = serde_json::to_vec(event).map_err(io::Error::other)?;

		line.push(b'\n');

		let mut file = self.file.lock();

		file.write_all(&line)?;
		file.flush()
	}
}
