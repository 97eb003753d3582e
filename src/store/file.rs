//! File-backed [`TokenStore`] for single-user installs.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenState},
	store::{StoreError, StoreFuture, TokenStore},
};

type Snapshot = BTreeMap<AccountId, TokenState>;

/// Persists token state to a JSON file after each mutation.
///
/// Writes go to a sibling `.tmp` file that is synced and then renamed over the target. The
/// in-memory view only changes once the file write succeeded.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Snapshot::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenState>> {
		Box::pin(async move { Ok(self.inner.read().get(account).cloned()) })
	}

	fn save<'a>(&'a self, account: &'a AccountId, state: TokenState) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			next.insert(account.to_owned(), state);
			self.persist_locked(&next)?;

			*guard = next;

			Ok(())
		})
	}

	fn clear<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if !guard.contains_key(account) {
				return Ok(());
			}

			let mut next = guard.clone();

			next.remove(account);
			self.persist_locked(&next)?;

			*guard = next;

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"post_broker_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_state() -> (AccountId, TokenState) {
		let account = AccountId::new("account-demo").expect("Failed to build account fixture.");
		let state = TokenState::builder()
			.access_token("access-token")
			.refresh_token("refresh-token")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Failed to build file-store test state.");

		(account, state)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("reload");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let (account, state) = build_state();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&account, state.clone()))
			.expect("Failed to save fixture state to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch(&account))
			.expect("Failed to fetch fixture state from file store.")
			.expect("File store lost state after reopen.");

		assert_eq!(fetched.access_token.expose(), state.access_token.expose());
		assert_eq!(fetched.expires_at, state.expires_at);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_is_idempotent_and_persisted() {
		let path = temp_path("clear");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let (account, state) = build_state();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&account, state)).expect("Failed to save fixture state.");
		rt.block_on(store.clear(&account)).expect("First clear should succeed.");
		rt.block_on(store.clear(&account)).expect("Second clear should be a no-op.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(
			rt.block_on(reopened.fetch(&account))
				.expect("Fetch after clear should succeed.")
				.is_none()
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_writes_leave_memory_and_disk_in_agreement() {
		let path = temp_path("failed_write");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let (account, state) = build_state();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&account, state.clone())).expect("Failed to save fixture state.");

		// A directory at the staging path makes every later write fail.
		let tmp_path = path.with_extension("tmp");

		fs::create_dir(&tmp_path).expect("Failed to block the staging path.");

		let newer = TokenState::builder()
			.access_token("access-newer")
			.expires_in(Duration::hours(2))
			.build()
			.expect("Failed to build replacement state.");
		let err = rt
			.block_on(store.save(&account, newer))
			.expect_err("Save must fail while the staging path is a directory.");

		assert!(matches!(err, StoreError::Backend { .. }));

		let visible = rt
			.block_on(store.fetch(&account))
			.expect("Fetch after failed save should succeed.")
			.expect("Previous state must stay visible.");

		assert_eq!(visible.access_token.expose(), state.access_token.expose());

		rt.block_on(store.clear(&account)).expect_err("Clear must fail while writes fail.");

		assert!(
			rt.block_on(store.fetch(&account))
				.expect("Fetch after failed clear should succeed.")
				.is_some()
		);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let on_disk = rt
			.block_on(reopened.fetch(&account))
			.expect("Fetch after reopen should succeed.")
			.expect("Disk must still hold the previous state.");

		assert_eq!(on_disk.access_token.expose(), state.access_token.expose());

		fs::remove_dir(&tmp_path).unwrap_or_else(|e| {
			panic!("Failed to remove staging directory {}: {e}", tmp_path.display())
		});
		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
