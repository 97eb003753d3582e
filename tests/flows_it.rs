// crates.io
use httpmock::prelude::*;
// self
use post_broker::{
	_preludet::*,
	auth::{PlatformId, ScopeSet, TokenState},
	clock::Clock,
	error::ConfigError,
	flows::{AuthClient, AuthPhase, AuthorizationPrompt, PromptFuture},
	platform::{ClientAuthMethod, PlatformDescriptor},
	store::TokenStore,
};

const TOKEN_BODY: &str = r#"{"access_token":"access-1","refresh_token":"refresh-1","token_type":"bearer","expires_in":3600}"#;

fn build_descriptor(server: &MockServer, method: ClientAuthMethod) -> PlatformDescriptor {
	let id = PlatformId::new("mock-x").expect("Platform identifier should be valid.");
	let endpoint =
		|path: &str| Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.");

	PlatformDescriptor::builder(id)
		.authorization_endpoint(endpoint("/oauth2/authorize"))
		.token_endpoint(endpoint("/oauth2/token"))
		.media_upload_endpoint(endpoint("/media/upload"))
		.post_endpoint(endpoint("/posts"))
		.permalink_template("https://x.test/i/status/{id}")
		.scopes(
			ScopeSet::new(["tweet.read", "tweet.write", "offline.access"])
				.expect("Scope fixture should be valid."),
		)
		.client_auth_method(method)
		.build()
		.expect("Mock descriptor should build successfully.")
}

async fn seed_session(harness: &TestHarness, refresh: Option<&str>, expires_in: Duration) {
	let now = harness.clock.now();
	let mut builder =
		TokenState::builder().access_token("access-old").issued_at(now - Duration::hours(2));

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	let state = builder
		.expires_at(now + expires_in)
		.build()
		.expect("Token state fixture should build successfully.");

	harness
		.store
		.save(&harness.auth.account, state)
		.await
		.expect("Failed to seed token state into the store.");
}

/// Simulates a user who approves the request and lands on the redirect URI.
struct ApprovingPrompt {
	tamper_state: bool,
}
impl AuthorizationPrompt for ApprovingPrompt {
	fn prompt<'a>(&'a self, authorize_url: &'a Url) -> PromptFuture<'a> {
		Box::pin(async move {
			let state = authorize_url
				.query_pairs()
				.find(|(key, _)| key == "state")
				.map(|(_, value)| value.into_owned())?;
			let state = if self.tamper_state { format!("{state}-forged") } else { state };

			Url::parse(&format!("https://app.test/callback?code=code-123&state={state}")).ok()
		})
	}
}

struct CancellingPrompt;
impl AuthorizationPrompt for CancellingPrompt {
	fn prompt<'a>(&'a self, _: &'a Url) -> PromptFuture<'a> {
		Box::pin(async { None })
	}
}

#[tokio::test]
async fn authorize_exchanges_code_with_the_session_verifier() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let state = harness
		.auth
		.authorize(&ApprovingPrompt { tamper_state: false })
		.await
		.expect("Authorization should succeed.");

	mock.assert_async().await;

	assert_eq!(state.access_token.expose(), "access-1");
	assert_eq!(state.expires_at, harness.clock.now() + Duration::hours(1));
	assert_eq!(harness.auth.phase(), AuthPhase::Authenticated);

	let stored =
		harness.store.snapshot(&harness.auth.account).expect("Authorized state should be stored.");

	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-1"));
}

#[tokio::test]
async fn authorize_url_carries_pkce_and_state() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::NoneWithPkce));
	let session = harness.auth.start_authorization().expect("Session should start.");
	let pairs: HashMap<String, String> = session.authorize_url.query_pairs().into_owned().collect();

	assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
	assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-test"));
	assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some("https://app.test/callback"));
	assert_eq!(pairs.get("code_challenge_method").map(String::as_str), Some("S256"));
	assert_eq!(pairs.get("code_challenge").map(String::as_str), Some(session.code_challenge()));
	assert_eq!(pairs.get("state"), Some(&session.state));
	assert_eq!(harness.auth.phase(), AuthPhase::Authorizing);
}

#[tokio::test]
async fn forged_state_and_cancellation_are_denied_without_exchange() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretBasic));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let forged = harness
		.auth
		.authorize(&ApprovingPrompt { tamper_state: true })
		.await
		.expect_err("A forged state must be rejected.");

	assert!(matches!(forged, Error::AuthorizationDenied { .. }));

	let cancelled = harness
		.auth
		.authorize(&CancellingPrompt)
		.await
		.expect_err("A cancelled prompt must be rejected.");

	assert!(matches!(cancelled, Error::AuthorizationDenied { .. }));
	assert_eq!(harness.auth.phase(), AuthPhase::Unauthenticated);

	mock.assert_calls_async(0).await;

	assert!(harness.store.is_empty());
}

#[tokio::test]
async fn rejected_code_exchange_reports_exchange_failed() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretBasic));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"code expired"}"#);
		})
		.await;

	let session = harness.auth.start_authorization().expect("Session should start.");
	let err = harness
		.auth
		.exchange_code(session, "stale-code")
		.await
		.expect_err("A rejected code must fail.");

	assert!(matches!(err, Error::ExchangeFailed { status: Some(400), .. }));
	assert!(err.kind().requires_reauthorization());
	assert_eq!(harness.auth.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test]
async fn start_authorization_requires_a_redirect_uri() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretBasic));
	let auth: ReqwestTestAuthClient = AuthClient::with_http_client(
		harness.auth.store.clone(),
		harness.auth.descriptor.clone(),
		harness.auth.account.clone(),
		"client-test",
		harness.auth.http_client.clone(),
		harness.auth.transport_mapper.clone(),
	);
	let err = auth.start_authorization().expect_err("Missing redirect must be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRedirect)));
}

#[tokio::test]
async fn concurrent_callers_share_a_single_refresh() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, Some("refresh-old"), Duration::minutes(-1)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body(r#"{"access_token":"access-new","token_type":"bearer","expires_in":1800}"#);
		})
		.await;
	let auth = &harness.auth;
	let (a, b, c, d) =
		tokio::join!(auth.ensure_valid(), auth.ensure_valid(), auth.ensure_valid(), auth.ensure_valid());

	mock.assert_calls_async(1).await;

	for result in [a, b, c, d] {
		let state = result.expect("Every caller should observe the refreshed state.");

		assert_eq!(state.access_token.expose(), "access-new");
		assert_eq!(state.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-old"));
	}

	assert_eq!(harness.auth.refresh_metrics.attempts(), 1);
	assert_eq!(harness.auth.phase(), AuthPhase::Authenticated);
}

#[tokio::test]
async fn abandoned_refresh_does_not_leave_the_phase_refreshing() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, Some("refresh-old"), Duration::minutes(-1)).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(500))
				.body(r#"{"access_token":"access-new","token_type":"bearer","expires_in":1800}"#);
		})
		.await;
	let phase_before = harness.auth.phase();
	let abandoned =
		tokio::time::timeout(std::time::Duration::from_millis(100), harness.auth.ensure_valid())
			.await;

	assert!(abandoned.is_err());
	assert_eq!(harness.auth.phase(), phase_before);
	assert_ne!(harness.auth.phase(), AuthPhase::Refreshing);

	let stored = harness
		.store
		.snapshot(&harness.auth.account)
		.expect("Abandoned refresh must keep the stored state.");

	assert_eq!(stored.access_token.expose(), "access-old");

	let state = harness.auth.ensure_valid().await.expect("A later refresh should succeed.");

	assert_eq!(state.access_token.expose(), "access-new");
	assert_eq!(harness.auth.phase(), AuthPhase::Authenticated);
}

#[tokio::test]
async fn failed_refresh_clears_the_session() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, Some("refresh-revoked"), Duration::seconds(0)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant"}"#);
		})
		.await;
	let err = harness.auth.ensure_valid().await.expect_err("A revoked refresh must fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::SessionExpired { .. }));
	assert_eq!(harness.auth.phase(), AuthPhase::Expired);
	assert!(harness.store.snapshot(&harness.auth.account).is_none());
	assert_eq!(harness.auth.refresh_metrics.failures(), 1);

	let again = harness.auth.ensure_valid().await.expect_err("Cleared state must stay cleared.");

	assert!(matches!(again, Error::NotAuthenticated));
	assert!(!harness.auth.is_authenticated().await);
}

#[tokio::test]
async fn expired_state_without_refresh_token_expires_the_session() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, None, Duration::minutes(-5)).await;

	let err = harness.auth.ensure_valid().await.expect_err("No refresh token means expiry.");

	assert!(matches!(err, Error::SessionExpired { .. }));
	assert!(harness.store.is_empty());
}

#[tokio::test]
async fn valid_state_is_returned_without_network_calls() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, Some("refresh-1"), Duration::minutes(10)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(500);
		})
		.await;
	let state = harness.auth.ensure_valid().await.expect("Fresh state should be reused.");

	mock.assert_calls_async(0).await;

	assert_eq!(state.access_token.expose(), "access-old");
	assert!(harness.auth.is_authenticated().await);
}

#[tokio::test]
async fn force_refresh_rotates_even_fresh_state() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretBasic));

	seed_session(&harness, Some("refresh-1"), Duration::minutes(10)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").header_exists("authorization");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"access-2","refresh_token":"refresh-2","token_type":"bearer","expires_in":300}"#,
			);
		})
		.await;
	let state = harness.auth.force_refresh().await.expect("Forced refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(state.access_token.expose(), "access-2");
	assert_eq!(state.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-2"));
	// Rotation never shortens the stored expiry.
	assert_eq!(state.expires_at, harness.clock.now() + Duration::minutes(10));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
	let server = MockServer::start_async().await;
	let harness =
		build_reqwest_test_harness(build_descriptor(&server, ClientAuthMethod::ClientSecretPost));

	seed_session(&harness, Some("refresh-1"), Duration::minutes(10)).await;

	harness.auth.disconnect().await.expect("First disconnect should succeed.");
	harness.auth.disconnect().await.expect("Second disconnect should succeed.");

	assert!(harness.store.is_empty());
	assert_eq!(harness.auth.phase(), AuthPhase::Unauthenticated);
	assert!(matches!(harness.auth.ensure_valid().await, Err(Error::NotAuthenticated)));
}
