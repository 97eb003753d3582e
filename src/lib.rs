//! Signed social-media publishing pipeline: OAuth 1.0a request signing, single-flight bearer
//! refresh, and partial-failure media uploads in one crate.
//!
//! The crate is organized leaf-first:
//!
//! - [`sign`] computes one-legged OAuth 1.0a `Authorization` headers.
//! - [`store`] persists the per-account [`TokenState`](auth::TokenState).
//! - [`flows`] hosts [`AuthClient`](flows::AuthClient), which authorizes, refreshes, and
//!   disconnects accounts.
//! - [`publish`] hosts [`PublishClient`](publish::PublishClient), which uploads media and
//!   creates posts.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod platform;
pub mod publish;
pub mod sign;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AccountId, Credentials},
		clock::{Clock, FixedClock, FixedNonce, NonceSource},
		flows::AuthClient,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		platform::PlatformDescriptor,
		publish::{MemoryEventSink, PublishClient, PublishEventSink},
		store::{MemoryStore, TokenStore},
	};

	/// Auth client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestAuthClient = AuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Publish client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestPublishClient =
		PublishClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Nonce pinned by the signing fixtures.
	pub const TEST_NONCE: &str = "abcdefghijklmnopqrstuvwxyz012345";

	/// Everything a reqwest-backed integration test needs to drive the pipeline.
	pub struct TestHarness {
		/// Auth client bound to the in-memory store.
		pub auth: Arc<ReqwestTestAuthClient>,
		/// Publish client sharing the auth client above.
		pub publisher: ReqwestTestPublishClient,
		/// Store backend shared with the auth client.
		pub store: Arc<MemoryStore>,
		/// Clock shared by the auth client and the signer.
		pub clock: Arc<FixedClock>,
		/// Sink that captured every publish event.
		pub events: Arc<MemoryEventSink>,
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Credentials shared by integration tests.
	pub fn test_credentials() -> Credentials {
		Credentials::new("K", "S", "T", "TS")
	}

	/// Constructs an auth + publish client pair backed by an in-memory store, a fixed clock, a
	/// fixed nonce, and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_harness(descriptor: PlatformDescriptor) -> TestHarness {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let clock = Arc::new(FixedClock::new(time::macros::datetime!(2025-01-01 12:00 UTC)));
		let shared_clock: Arc<dyn Clock> = clock.clone();
		let nonce: Arc<dyn NonceSource> = Arc::new(FixedNonce::new(TEST_NONCE));
		let http_client = Arc::new(test_reqwest_http_client());
		let mapper = Arc::new(ReqwestTransportErrorMapper);
		let account = AccountId::new("account-test").expect("Test account id should be valid.");
		let auth = Arc::new(
			AuthClient::with_http_client(
				store,
				descriptor,
				account,
				"client-test",
				http_client.clone(),
				mapper.clone(),
			)
			.with_client_secret("client-secret-test")
			.with_redirect_uri(
				Url::parse("https://app.test/callback").expect("Test redirect URI should parse."),
			)
			.with_clock(shared_clock.clone()),
		);
		let events = Arc::new(MemoryEventSink::default());
		let sink: Arc<dyn PublishEventSink> = events.clone();
		let publisher =
			PublishClient::new(auth.clone(), test_credentials(), http_client, mapper)
				.with_clock(shared_clock)
				.with_nonce_source(nonce)
				.with_event_sink(sink);

		TestHarness { auth, publisher, store: store_backend, clock, events }
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, ErrorKind, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
