//! Expiry checks and single-flight bearer refresh.
//!
//! [`AuthClient::ensure_valid`] fetches the stored state under the client's flow guard and
//! refreshes it once `now >= expires_at`. A refresh that fails for any reason, a missing
//! refresh token included, clears the stored state and surfaces [`Error::SessionExpired`];
//! the user has to authorize again.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenState},
	flows::{AuthClient, AuthPhase},
	http::PlatformHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> AuthClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a non-expired token state, refreshing it when needed.
	///
	/// Fails with [`Error::NotAuthenticated`] when nothing is stored and with
	/// [`Error::SessionExpired`] when the refresh fails (the state is cleared first).
	pub async fn ensure_valid(&self) -> Result<TokenState> {
		let _singleflight = self.flow_guard.lock().await;
		let current = self.load_current().await?;
		let now = self.clock.now();

		if !current.is_expired_at(now) {
			self.set_phase(AuthPhase::Authenticated);

			return Ok(current);
		}

		self.refresh_locked(current, "ensure_valid").await
	}

	/// Refreshes the stored state regardless of its expiry.
	pub async fn force_refresh(&self) -> Result<TokenState> {
		let _singleflight = self.flow_guard.lock().await;
		let current = self.load_current().await?;

		self.refresh_locked(current, "force_refresh").await
	}

	/// Refreshes unless another caller already replaced `stale` while this one waited.
	pub(crate) async fn refresh_replacing(&self, stale: &TokenSecret) -> Result<TokenState> {
		let _singleflight = self.flow_guard.lock().await;
		let current = self.load_current().await?;

		if current.access_token != *stale && !current.is_expired_at(self.clock.now()) {
			return Ok(current);
		}

		self.refresh_locked(current, "refresh_replacing").await
	}

	async fn load_current(&self) -> Result<TokenState> {
		match self.store.fetch(&self.account).await? {
			Some(state) => Ok(state),
			None => {
				self.set_phase(AuthPhase::Unauthenticated);

				Err(Error::NotAuthenticated)
			},
		}
	}

	/// Caller must hold the flow guard.
	async fn refresh_locked(&self, current: TokenState, stage: &'static str) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let _refreshing = self.enter_phase(AuthPhase::Refreshing);

		let result = span
			.instrument(async {
				let refreshed = match self.request_refresh(&current).await {
					Ok(refreshed) => refreshed,
					Err(err) => return Err(self.expire_session(err).await),
				};
				let updated = current.rotate(refreshed);

				self.save_state(updated).await
			})
			.await;

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		obs::record_result(KIND, &result);

		result
	}

	async fn request_refresh(&self, current: &TokenState) -> Result<TokenState> {
		let refresh_token = current.refresh_token.as_ref().ok_or_else(|| {
			Error::SessionExpired { reason: "no refresh token was issued".into() }
		})?;

		self.facade()?.refresh_token(refresh_token.expose(), self.clock.now()).await
	}

	async fn expire_session(&self, err: Error) -> Error {
		if let Err(store_err) = self.store.clear(&self.account).await {
			return store_err.into();
		}

		self.set_phase(AuthPhase::Expired);

		obs::session_cleared("refresh failed");

		match err {
			Error::SessionExpired { .. } => err,
			other => Error::SessionExpired { reason: other.to_string() },
		}
	}
}
