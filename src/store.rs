//! Storage contract and built-in backends for per-account [`TokenState`].
//!
//! Stores are dumb key-value records: they never inspect expiry or refresh tokens. Only the
//! [`AuthClient`](crate::flows::AuthClient) decides when state is written or cleared.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenState},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for per-account token state.
///
/// Each operation completes its write before the returned future resolves, so dropping a
/// caller mid-flight never leaves a half-written record.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the state stored for `account`, if any.
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenState>>;

	/// Persists or replaces the state for `account`.
	fn save<'a>(&'a self, account: &'a AccountId, state: TokenState) -> StoreFuture<'a, ()>;

	/// Removes the state for `account`; clearing an absent record is not an error.
	fn clear<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
