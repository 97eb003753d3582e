//! Account authorization lifecycle: interactive handshake, bearer refresh, and disconnect.

pub mod auth_code_pkce;
pub mod refresh;

pub use auth_code_pkce::*;
pub use refresh::*;

// self
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};
use crate::{
	_prelude::*,
	auth::{AccountId, TokenState},
	clock::{Clock, SystemClock},
	http::PlatformHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	obs,
	platform::PlatformDescriptor,
	store::TokenStore,
};

#[cfg(feature = "reqwest")]
/// Auth client specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthClient = AuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Observable authorization state of the managed account.
///
/// The phase reflects the outcome of the most recent operation; the stored
/// [`TokenState`] stays the source of truth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
	/// No token state is known to exist.
	#[default]
	Unauthenticated,
	/// An authorization session was started and awaits its callback.
	Authorizing,
	/// A usable access token is stored.
	Authenticated,
	/// A refresh is in flight.
	Refreshing,
	/// The last refresh failed and the stored state was cleared.
	Expired,
}

/// Manages the bearer-token lifecycle of one account against one platform.
///
/// The client owns the HTTP transport, the token store handle, and the platform descriptor.
/// It is the only writer of [`TokenState`]: authorization and refresh save it, and
/// disconnect or a failed refresh clears it. Every read-check-refresh sequence runs under a
/// single-flight async mutex, so concurrent callers observing the same expired token trigger
/// exactly one refresh.
pub struct AuthClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound platform request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token store implementation that persists issued state.
	pub store: Arc<dyn TokenStore>,
	/// Platform descriptor that defines endpoints and auth preferences.
	pub descriptor: PlatformDescriptor,
	/// Account whose state this client manages.
	pub account: AccountId,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret for confidential authentication methods.
	pub client_secret: Option<String>,
	/// Redirect URI registered with the platform.
	pub redirect_uri: Option<Url>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	clock: Arc<dyn Clock>,
	phase: Arc<RwLock<AuthPhase>>,
	flow_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> AuthClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		descriptor: PlatformDescriptor,
		account: AccountId,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			account,
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri: None,
			refresh_metrics: Default::default(),
			clock: Arc::new(SystemClock),
			phase: Default::default(),
			flow_guard: Default::default(),
		}
	}

	/// Sets or replaces the client secret used for confidential client auth modes.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the redirect URI used by the interactive handshake.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Replaces the wall clock used for expiry checks and issue timestamps.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Current observable phase.
	pub fn phase(&self) -> AuthPhase {
		*self.phase.read()
	}

	/// Clock shared with collaborators such as the publish client.
	pub fn clock(&self) -> Arc<dyn Clock> {
		self.clock.clone()
	}

	/// Returns `true` when [`ensure_valid`](Self::ensure_valid) yields a usable token.
	pub async fn is_authenticated(&self) -> bool {
		self.ensure_valid().await.is_ok()
	}

	/// Removes the stored state unconditionally. Calling it twice is harmless.
	pub async fn disconnect(&self) -> Result<()> {
		let _singleflight = self.flow_guard.lock().await;

		self.store.clear(&self.account).await?;
		self.set_phase(AuthPhase::Unauthenticated);

		obs::session_cleared("disconnect");

		Ok(())
	}

	pub(crate) fn set_phase(&self, phase: AuthPhase) {
		*self.phase.write() = phase;
	}

	/// Switches to `transient` until the returned scope drops.
	pub(crate) fn enter_phase(&self, transient: AuthPhase) -> PhaseScope<'_> {
		let mut phase = self.phase.write();
		let previous = *phase;

		*phase = transient;

		PhaseScope { phase: &self.phase, transient, previous }
	}

	pub(crate) fn facade(&self) -> Result<BasicFacade<C, M>> {
		BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_deref(),
			self.redirect_uri.as_ref(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}

	pub(crate) async fn save_state(&self, state: TokenState) -> Result<TokenState> {
		self.store.save(&self.account, state.clone()).await?;
		self.set_phase(AuthPhase::Authenticated);

		Ok(state)
	}
}
/// Restores the previous phase on drop unless the flow already moved past `transient`.
///
/// A caller that drops a flow future mid-request leaves the stored state untouched, so the
/// phase must not keep reporting work that is no longer in flight.
pub(crate) struct PhaseScope<'a> {
	phase: &'a RwLock<AuthPhase>,
	transient: AuthPhase,
	previous: AuthPhase,
}
impl Drop for PhaseScope<'_> {
	fn drop(&mut self) {
		let mut phase = self.phase.write();

		if *phase == self.transient {
			*phase = self.previous;
		}
	}
}

#[cfg(feature = "reqwest")]
impl AuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest transport (30 second timeout, no redirects).
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: PlatformDescriptor,
		account: AccountId,
		client_id: impl Into<String>,
	) -> Result<Self> {
		Ok(Self::with_http_client(
			store,
			descriptor,
			account,
			client_id,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Debug for AuthClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("descriptor", &self.descriptor.id)
			.field("account", &self.account)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("phase", &self.phase())
			.finish()
	}
}
