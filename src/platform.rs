//! Platform-facing metadata: validated endpoint descriptors and the endpoint taxonomy used by
//! errors, spans, and metrics.
//!
//! `descriptor` exposes [`PlatformDescriptor`], an HTTPS-only description of where the
//! pipeline authorizes, refreshes, uploads, and posts, plus how requests authenticate.

pub mod descriptor;

pub use descriptor::*;

// self
use crate::_prelude::*;

/// Remote endpoints the pipeline talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// Token endpoint during the authorization-code exchange.
	TokenExchange,
	/// Token endpoint during a refresh.
	TokenRefresh,
	/// Media fetch for `Uri` sources.
	MediaFetch,
	/// Media upload endpoint.
	MediaUpload,
	/// Media metadata (alt text) endpoint.
	MediaMetadata,
	/// Post creation endpoint.
	PostCreate,
	/// Authenticated profile endpoint.
	Profile,
}
impl Endpoint {
	/// Stable label used in logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::TokenExchange => "token_exchange",
			Endpoint::TokenRefresh => "token_refresh",
			Endpoint::MediaFetch => "media_fetch",
			Endpoint::MediaUpload => "media_upload",
			Endpoint::MediaMetadata => "media_metadata",
			Endpoint::PostCreate => "post_create",
			Endpoint::Profile => "profile",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
