//! Bearer token state persisted per account, plus its builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenStateBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenStateBuilderError {
	/// Issued when no access token (or an empty one) was provided.
	#[error("Access token is required and cannot be empty.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Bearer credentials issued by the platform's token endpoint.
///
/// A disconnected account has no state at all; an empty access token can never be built.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenState {
	/// Access token presented as `Bearer`; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token, if the platform issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the state was issued.
	pub issued_at: OffsetDateTime,
	/// Instant at which the access token stops being valid.
	pub expires_at: OffsetDateTime,
}
impl TokenState {
	/// Returns a builder for constructing token state.
	pub fn builder() -> TokenStateBuilder {
		TokenStateBuilder::default()
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Folds a freshly refreshed state into this one.
	///
	/// The refresh token is kept when the platform does not rotate it, and `expires_at` never
	/// moves backwards.
	pub fn rotate(&self, refreshed: TokenState) -> TokenState {
		TokenState {
			access_token: refreshed.access_token,
			refresh_token: refreshed.refresh_token.or_else(|| self.refresh_token.clone()),
			issued_at: refreshed.issued_at,
			expires_at: refreshed.expires_at.max(self.expires_at),
		}
	}
}
impl Debug for TokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenState")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenState`].
#[derive(Clone, Debug, Default)]
pub struct TokenStateBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenStateBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value; empty strings are treated as absent.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token)).filter(|secret| !secret.is_empty());

		self
	}

	/// Consumes the builder and produces a [`TokenState`].
	pub fn build(self) -> Result<TokenState, TokenStateBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_empty())
			.ok_or(TokenStateBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenStateBuilderError::MissingExpiry),
		};

		Ok(TokenState { access_token, refresh_token: self.refresh_token, issued_at, expires_at })
	}
}
