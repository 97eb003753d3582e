// crates.io
use time::macros;
// self
use post_broker::{
	_preludet::*,
	auth::{AccountId, TokenState},
	store::{MemoryStore, TokenStore},
};

fn account(raw: &str) -> AccountId {
	AccountId::new(raw).expect("Failed to build account identifier for memory store tests.")
}

fn build_state(access: &str, refresh: Option<&str>) -> TokenState {
	let issued = macros::datetime!(2025-11-10 12:00 UTC);
	let mut builder = TokenState::builder()
		.access_token(access)
		.issued_at(issued)
		.expires_at(issued + Duration::hours(1));

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	builder.build().expect("Failed to build token state fixture.")
}

#[tokio::test]
async fn save_replaces_the_previous_state() {
	let store = MemoryStore::default();
	let owner = account("account-1");

	store.save(&owner, build_state("access-1", Some("refresh-1"))).await.expect("First save.");
	store.save(&owner, build_state("access-2", None)).await.expect("Second save.");

	let fetched = store
		.fetch(&owner)
		.await
		.expect("Fetch should succeed.")
		.expect("State should be present after save.");

	assert_eq!(fetched.access_token.expose(), "access-2");
	assert!(fetched.refresh_token.is_none());
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn accounts_are_isolated() {
	let store = MemoryStore::default();
	let first = account("account-1");
	let second = account("account-2");

	store.save(&first, build_state("access-1", None)).await.expect("Save first account.");
	store.save(&second, build_state("access-2", None)).await.expect("Save second account.");
	store.clear(&first).await.expect("Clear first account.");

	assert!(store.fetch(&first).await.expect("Fetch first account.").is_none());
	assert_eq!(
		store
			.snapshot(&second)
			.map(|state| state.access_token.expose().to_owned())
			.as_deref(),
		Some("access-2"),
	);
}

#[tokio::test]
async fn clones_share_the_same_backing_map() {
	let store = MemoryStore::default();
	let shared: Arc<dyn TokenStore> = Arc::new(store.clone());
	let owner = account("account-1");

	shared.save(&owner, build_state("access-1", None)).await.expect("Save through trait object.");

	assert!(store.snapshot(&owner).is_some());

	store.clear(&owner).await.expect("Clear through the concrete handle.");
	store.clear(&owner).await.expect("Clearing twice is harmless.");

	assert!(shared.fetch(&owner).await.expect("Fetch through trait object.").is_none());
	assert!(store.is_empty());
}
