//! Authorization Code + PKCE handshake for connecting an account.
//!
//! [`AuthClient::authorize`] drives the whole exchange through an [`AuthorizationPrompt`].
//! Hosts that own the redirect themselves use [`AuthClient::start_authorization`] and then
//! [`AuthClient::complete_authorization`] (or [`AuthClient::exchange_code`]) with the same
//! session, so the PKCE verifier sent to the token endpoint is the one whose challenge went
//! into the authorize URL.

mod session;

pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	error::ConfigError,
	flows::{AuthClient, AuthPhase},
	http::PlatformHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Boxed future returned by [`AuthorizationPrompt::prompt`].
pub type PromptFuture<'a> = Pin<Box<dyn Future<Output = Option<Url>> + 'a + Send>>;

/// Interactive, user-facing step of the handshake.
///
/// Implementations show `authorize_url` to the user (browser window, system browser, device
/// prompt) and resolve with the full callback URL the platform redirected to, or `None` when
/// the user cancelled.
pub trait AuthorizationPrompt
where
	Self: Send + Sync,
{
	/// Presents the authorize URL and waits for the redirect.
	fn prompt<'a>(&'a self, authorize_url: &'a Url) -> PromptFuture<'a>;
}

impl<C, M> AuthClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs the full handshake: authorize URL, prompt, callback validation, code exchange.
	pub async fn authorize(&self, prompt: &dyn AuthorizationPrompt) -> Result<TokenState> {
		let session = self.start_authorization()?;
		let Some(callback) = prompt.prompt(&session.authorize_url).await else {
			self.set_phase(AuthPhase::Unauthenticated);

			return Err(Error::AuthorizationDenied { reason: "user cancelled".into() });
		};

		self.complete_authorization(session, &callback).await
	}

	/// Generates `state` and a PKCE pair and builds the authorize URL.
	pub fn start_authorization(&self) -> Result<AuthorizationSession> {
		let redirect_uri = self.redirect_uri.clone().ok_or(ConfigError::MissingRedirect)?;
		let session = session::build_session(
			&self.descriptor,
			&self.client_id,
			self.account.clone(),
			self.descriptor.scopes.clone(),
			redirect_uri,
		);

		self.set_phase(AuthPhase::Authorizing);

		Ok(session)
	}

	/// Validates the callback URL for `session` and exchanges its code.
	///
	/// An `error` parameter, a missing code, or a `state` mismatch all fail with
	/// [`Error::AuthorizationDenied`].
	pub async fn complete_authorization(
		&self,
		session: AuthorizationSession,
		callback_url: &Url,
	) -> Result<TokenState> {
		let code = match session.parse_callback(callback_url) {
			Ok(code) => code,
			Err(err) => {
				self.set_phase(AuthPhase::Unauthenticated);

				return Err(err);
			},
		};

		self.exchange_code(session, &code).await
	}

	/// Exchanges an authorization code using the session's PKCE verifier and stores the result.
	pub async fn exchange_code(
		&self,
		session: AuthorizationSession,
		code: &str,
	) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let pkce = session.into_verifier();
				let state = self
					.facade()?
					.exchange_authorization_code(code, pkce.verifier(), self.clock.now())
					.await?;
				let _singleflight = self.flow_guard.lock().await;

				self.save_state(state).await
			})
			.await;

		if result.is_err() {
			self.set_phase(AuthPhase::Unauthenticated);
		}

		obs::record_result(KIND, &result);

		result
	}
}
