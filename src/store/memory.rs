//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenState},
	store::{StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<AccountId, TokenState>>>;

/// Thread-safe storage backend that keeps state in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of accounts currently holding state.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no account holds state.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Synchronous peek used by tests and diagnostics.
	pub fn snapshot(&self, account: &AccountId) -> Option<TokenState> {
		self.0.read().get(account).cloned()
	}

	fn save_now(map: StoreMap, account: AccountId, state: TokenState) -> Result<(), StoreError> {
		map.write().insert(account, state);

		Ok(())
	}

	fn clear_now(map: StoreMap, account: AccountId) -> Result<(), StoreError> {
		map.write().remove(&account);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenState>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(account).cloned()) })
	}

	fn save<'a>(&'a self, account: &'a AccountId, state: TokenState) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move { Self::save_now(map, account, state) })
	}

	fn clear<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move { Self::clear_now(map, account) })
	}
}
