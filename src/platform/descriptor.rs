//! Platform descriptor data structures.
//!
//! A descriptor is pure data: endpoints, the permalink template, default scopes, and the
//! authentication preferences for token calls and API calls. Construction always goes through
//! [`PlatformDescriptorBuilder`] (or [`PlatformDescriptor::from_json`]) so every descriptor in
//! circulation is validated.

/// Builder API for assembling platform descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{PlatformId, PostId, ScopeSet},
	error::ConfigError,
	sign::SignatureMethod,
};

/// Placeholder replaced by the post id inside [`PlatformDescriptor::permalink_template`].
pub const PERMALINK_PLACEHOLDER: &str = "{id}";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public clients that prove possession via PKCE only.
	NoneWithPkce,
}

/// How media and post requests authenticate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAuth {
	/// One-legged OAuth 1.0a signature over the account [`Credentials`](crate::auth::Credentials).
	#[default]
	#[serde(rename = "oauth1")]
	OAuth1,
	/// `Bearer` access token from the stored [`TokenState`](crate::auth::TokenState).
	Bearer,
}

/// Endpoint set declared by a platform descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEndpoints {
	/// Authorization endpoint used by the interactive handshake.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Binary media upload endpoint.
	pub media_upload: Url,
	/// Post creation endpoint.
	pub post_create: Url,
	/// Optional alt-text endpoint.
	#[serde(default)]
	pub media_metadata: Option<Url>,
	/// Optional authenticated-user endpoint.
	#[serde(default)]
	pub profile: Option<Url>,
}

/// Immutable platform descriptor consumed by the auth and publish clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
	/// Descriptor identifier.
	pub id: PlatformId,
	/// Endpoint definitions exposed by the platform.
	pub endpoints: PlatformEndpoints,
	/// Public URL of a created post; contains `{id}` exactly once.
	pub permalink_template: String,
	/// Scopes requested during authorization.
	#[serde(default)]
	pub scopes: ScopeSet,
	/// Client authentication mechanism for token calls.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
	/// Authentication applied to media and post calls.
	#[serde(default)]
	pub request_auth: RequestAuth,
	/// Digest used when `request_auth` is [`RequestAuth::OAuth1`].
	#[serde(default)]
	pub signature_method: SignatureMethod,
}
impl PlatformDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: PlatformId) -> PlatformDescriptorBuilder {
		PlatformDescriptorBuilder::new(id)
	}

	/// Preset for X (formerly Twitter).
	pub fn x() -> Result<Self> {
		let parse = |raw: &str| {
			Url::parse(raw).map_err(|source| ConfigError::InvalidDescriptor { source })
		};
		let id = PlatformId::new("x").map_err(|e| ConfigError::Descriptor(e.into()))?;
		let scopes = ScopeSet::new(["tweet.read", "tweet.write", "users.read", "offline.access"])
			.map_err(|e| ConfigError::Descriptor(e.into()))?;
		let descriptor = Self::builder(id)
			.authorization_endpoint(parse("https://twitter.com/i/oauth2/authorize")?)
			.token_endpoint(parse("https://api.twitter.com/2/oauth2/token")?)
			.media_upload_endpoint(parse("https://upload.twitter.com/1.1/media/upload.json")?)
			.media_metadata_endpoint(parse(
				"https://upload.twitter.com/1.1/media/metadata/create.json",
			)?)
			.post_endpoint(parse("https://api.twitter.com/2/tweets")?)
			.profile_endpoint(parse("https://api.twitter.com/2/users/me")?)
			.permalink_template("https://twitter.com/i/status/{id}")
			.scopes(scopes)
			.build()
			.map_err(ConfigError::Descriptor)?;

		Ok(descriptor)
	}

	/// Parses and validates a descriptor from JSON.
	pub fn from_json(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let descriptor: Self = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			ConfigError::Descriptor(PlatformDescriptorError::Malformed(e.to_string()))
		})?;

		descriptor.validate().map_err(ConfigError::Descriptor)?;

		Ok(descriptor)
	}

	/// Renders the public URL of a created post.
	pub fn permalink(&self, post_id: &PostId) -> String {
		self.permalink_template.replacen(PERMALINK_PLACEHOLDER, post_id.as_str(), 1)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn x_preset_is_valid_and_renders_permalinks() {
		let descriptor = PlatformDescriptor::x().expect("X preset should build.");
		let post = PostId::new("1790000000000000000").expect("Post id should be valid.");

		assert_eq!(descriptor.request_auth, RequestAuth::OAuth1);
		assert_eq!(descriptor.signature_method, SignatureMethod::HmacSha1);
		assert!(descriptor.scopes.contains("offline.access"));
		assert!(descriptor.endpoints.media_metadata.is_some());
		assert_eq!(
			descriptor.permalink(&post),
			"https://twitter.com/i/status/1790000000000000000"
		);
	}

	#[test]
	fn json_round_trip_keeps_validation() {
		let descriptor = PlatformDescriptor::x().expect("X preset should build.");
		let raw = serde_json::to_string(&descriptor).expect("Descriptor should serialize.");
		let parsed = PlatformDescriptor::from_json(&raw).expect("Descriptor should parse.");

		assert_eq!(parsed, descriptor);

		let insecure =
			raw.replace("https://api.twitter.com/2/tweets", "http://api.twitter.com/2/tweets");
		let err = PlatformDescriptor::from_json(&insecure)
			.expect_err("Plain HTTP endpoints must be rejected.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::Descriptor(PlatformDescriptorError::InsecureEndpoint {
				endpoint: "post_create",
				..
			}))
		));
	}

	#[test]
	fn request_auth_serializes_with_protocol_names() {
		assert_eq!(
			serde_json::to_string(&RequestAuth::OAuth1).expect("RequestAuth should serialize."),
			"\"oauth1\""
		);
		assert_eq!(
			serde_json::to_string(&RequestAuth::Bearer).expect("RequestAuth should serialize."),
			"\"bearer\""
		);
	}
}
