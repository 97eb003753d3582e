//! OAuth 1.0a credential bundle used by the request signer.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Consumer and access-token key pairs for one account.
///
/// Loaded once per session by the settings layer and never mutated by the pipeline. Every
/// field is wrapped in [`TokenSecret`] so formatting the struct only reveals short hints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
	/// Consumer (API) key.
	#[serde(alias = "apiKey")]
	pub consumer_key: TokenSecret,
	/// Consumer (API) secret.
	#[serde(alias = "apiSecret")]
	pub consumer_secret: TokenSecret,
	/// Account access token.
	pub access_token: TokenSecret,
	/// Account access token secret.
	pub access_token_secret: TokenSecret,
}
impl Credentials {
	/// Bundles the four key components.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		access_token: impl Into<String>,
		access_token_secret: impl Into<String>,
	) -> Self {
		Self {
			consumer_key: TokenSecret::new(consumer_key),
			consumer_secret: TokenSecret::new(consumer_secret),
			access_token: TokenSecret::new(access_token),
			access_token_secret: TokenSecret::new(access_token_secret),
		}
	}

	/// Parses credentials from the JSON document written by the settings layer.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	/// Fails with [`Error::InvalidCredentials`] naming the first empty field.
	pub fn validate(&self) -> Result<()> {
		let fields = [
			("consumer_key", &self.consumer_key),
			("consumer_secret", &self.consumer_secret),
			("access_token", &self.access_token),
			("access_token_secret", &self.access_token_secret),
		];

		match fields.into_iter().find(|(_, value)| value.is_empty()) {
			Some((field, _)) => Err(Error::InvalidCredentials { field }),
			None => Ok(()),
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("consumer_key", &self.consumer_key.hint())
			.field("consumer_secret", &"<redacted>")
			.field("access_token", &self.access_token.hint())
			.field("access_token_secret", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn validate_names_the_first_missing_field() {
		assert!(Credentials::new("K", "S", "T", "TS").validate().is_ok());

		let err = Credentials::new("K", "S", "", "")
			.validate()
			.expect_err("Missing token must be rejected.");

		assert!(matches!(err, Error::InvalidCredentials { field: "access_token" }));
	}

	#[test]
	fn settings_json_accepts_legacy_field_names() {
		let creds = Credentials::from_json(
			r#"{"apiKey":"key","apiSecret":"secret","accessToken":"token","accessTokenSecret":"token-secret"}"#,
		)
		.expect("Legacy settings payload should parse.");

		assert_eq!(creds.consumer_key.expose(), "key");
		assert_eq!(creds.consumer_secret.expose(), "secret");
		assert_eq!(creds.access_token_secret.expose(), "token-secret");
	}

	#[test]
	fn debug_never_prints_secrets() {
		let creds = Credentials::new(
			"consumer-key-1234",
			"consumer-secret-5678",
			"access-token-9012",
			"token-secret-3456",
		);
		let rendered = format!("{creds:?}");

		assert!(!rendered.contains("consumer-secret-5678"));
		assert!(!rendered.contains("token-secret-3456"));
		assert!(!rendered.contains("consumer-key-1234"));
		assert!(rendered.contains("…1234"));
	}
}
