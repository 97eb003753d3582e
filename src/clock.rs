//! Injectable time and randomness sources.
//!
//! The signer and the auth client never read the wall clock or a random generator directly;
//! both go through [`Clock`] and [`NonceSource`] so tests can pin them.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

/// Minimum nonce length accepted by the signer.
pub const MIN_NONCE_LEN: usize = 32;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock [`Clock`] backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven [`Clock`] for tests and replays.
#[derive(Debug)]
pub struct FixedClock(Mutex<OffsetDateTime>);
impl FixedClock {
	/// Pins the clock at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Pins the clock at a Unix timestamp.
	pub fn from_unix(seconds: i64) -> Self {
		Self::new(OffsetDateTime::from_unix_timestamp(seconds).unwrap_or(OffsetDateTime::UNIX_EPOCH))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		let mut guard = self.0.lock();

		*guard += delta;
	}
}
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Source of single-use nonces for signed requests.
pub trait NonceSource
where
	Self: Send + Sync,
{
	/// Produces the next nonce.
	fn nonce(&self) -> String;
}

/// Random alphanumeric nonces drawn from the thread-local generator.
#[derive(Clone, Copy, Debug)]
pub struct RandomNonce {
	len: usize,
}
impl RandomNonce {
	/// Creates a generator that emits `len` characters (never fewer than [`MIN_NONCE_LEN`]).
	pub fn with_len(len: usize) -> Self {
		Self { len: len.max(MIN_NONCE_LEN) }
	}
}
impl Default for RandomNonce {
	fn default() -> Self {
		Self { len: MIN_NONCE_LEN }
	}
}
impl NonceSource for RandomNonce {
	fn nonce(&self) -> String {
		random_alphanumeric(self.len)
	}
}

/// Constant nonce for reproducible signatures.
#[derive(Clone, Debug)]
pub struct FixedNonce(String);
impl FixedNonce {
	/// Always returns `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}
}
impl NonceSource for FixedNonce {
	fn nonce(&self) -> String {
		self.0.clone()
	}
}

pub(crate) fn random_alphanumeric(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn random_nonces_are_alphanumeric_and_unique() {
		let source = RandomNonce::default();
		let first = source.nonce();
		let second = source.nonce();

		assert_eq!(first.len(), MIN_NONCE_LEN);
		assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(first, second);
		assert_eq!(RandomNonce::with_len(8).nonce().len(), MIN_NONCE_LEN);
		assert_eq!(RandomNonce::with_len(48).nonce().len(), 48);
	}

	#[test]
	fn fixed_clock_moves_only_when_told() {
		let clock = FixedClock::from_unix(1_700_000_000);

		assert_eq!(clock.now().unix_timestamp(), 1_700_000_000);

		clock.advance(Duration::minutes(2));

		assert_eq!(clock.now().unix_timestamp(), 1_700_000_120);

		clock.set(macros::datetime!(2025-01-01 00:00 UTC));

		assert_eq!(clock.now(), macros::datetime!(2025-01-01 00:00 UTC));
	}
}
