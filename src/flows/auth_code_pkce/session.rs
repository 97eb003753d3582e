// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet},
	clock,
	platform::PlatformDescriptor,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Handshake state returned by [`AuthClient::start_authorization`](crate::flows::AuthClient::start_authorization).
///
/// The session owns the PKCE verifier; it is consumed by the exchange so a verifier is never
/// reused or regenerated between the authorize URL and the token call.
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Account being connected.
	pub account: AccountId,
	/// Requested scope set.
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed HTTPS authorize URL that callers should send the user to.
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl AuthorizationSession {
	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		&self.pkce.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		self.pkce.method
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::AuthorizationDenied { reason: "authorization state mismatch".into() })
		}
	}

	/// Extracts the authorization code from the platform callback URL.
	pub fn parse_callback(&self, callback_url: &Url) -> Result<String> {
		let params: HashMap<String, String> = callback_url.query_pairs().into_owned().collect();

		if let Some(error) = params.get("error") {
			let reason = match params.get("error_description") {
				Some(description) => format!("{error}: {description}"),
				None => error.to_owned(),
			};

			return Err(Error::AuthorizationDenied { reason });
		}

		self.validate_state(params.get("state").map(String::as_str).unwrap_or_default())?;

		params
			.get("code")
			.filter(|code| !code.is_empty())
			.cloned()
			.ok_or_else(|| Error::AuthorizationDenied { reason: "no authorization code".into() })
	}

	pub(super) fn into_verifier(self) -> PkcePair {
		self.pkce
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("account", &self.account)
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
pub(super) struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	pub(super) fn generate() -> Self {
		let verifier = clock::random_alphanumeric(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}

	pub(super) fn verifier(&self) -> &str {
		&self.verifier
	}
}

pub(super) fn build_session(
	descriptor: &PlatformDescriptor,
	client_id: &str,
	account: AccountId,
	scope: ScopeSet,
	redirect_uri: Url,
) -> AuthorizationSession {
	let state = clock::random_alphanumeric(STATE_LEN);
	let pkce = PkcePair::generate();
	let authorize_url =
		build_authorize_url(descriptor, client_id, &redirect_uri, &scope, &state, &pkce);

	AuthorizationSession { account, scope, state, redirect_uri, authorize_url, pkce }
}

fn build_authorize_url(
	descriptor: &PlatformDescriptor,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	state: &str,
	pkce: &PkcePair,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if !scope.is_empty() {
		pairs.append_pair("scope", &scope.normalized());
	}

	pairs.append_pair("state", state);
	pairs.append_pair("code_challenge", &pkce.challenge);
	pairs.append_pair("code_challenge_method", pkce.method.as_str());

	drop(pairs);

	url
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session() -> AuthorizationSession {
		let descriptor = PlatformDescriptor::x().expect("X preset should build.");

		build_session(
			&descriptor,
			"client-id",
			AccountId::new("account").expect("Account fixture should be valid."),
			descriptor.scopes.clone(),
			Url::parse("https://app.test/callback").expect("Redirect fixture should parse."),
		)
	}

	fn callback(query: &str) -> Url {
		Url::parse(&format!("https://app.test/callback?{query}"))
			.expect("Callback fixture should parse.")
	}

	#[test]
	fn authorize_url_carries_state_and_s256_challenge() {
		let session = session();
		let params: HashMap<String, String> =
			session.authorize_url.query_pairs().into_owned().collect();

		assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(params.get("state"), Some(&session.state));
		assert_eq!(params.get("code_challenge").map(String::as_str), Some(session.code_challenge()));
		assert_eq!(params.get("code_challenge_method").map(String::as_str), Some("S256"));
		assert_eq!(
			params.get("scope").map(String::as_str),
			Some("offline.access tweet.read tweet.write users.read")
		);
		assert_eq!(session.pkce.challenge, compute_pkce_challenge(session.pkce.verifier()));
	}

	#[test]
	fn pkce_challenge_matches_rfc_7636_vector() {
		assert_eq!(
			compute_pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}

	#[test]
	fn callback_parsing_enforces_state_and_errors() {
		let session = session();
		let ok = callback(&format!("code=abc&state={}", session.state));

		assert_eq!(session.parse_callback(&ok).expect("Valid callback should parse."), "abc");

		let mismatch = callback("code=abc&state=other");

		assert!(matches!(
			session.parse_callback(&mismatch),
			Err(Error::AuthorizationDenied { .. })
		));

		let denied = callback("error=access_denied&error_description=User%20declined");
		let err = session.parse_callback(&denied).expect_err("Error callback must fail.");

		assert!(
			matches!(err, Error::AuthorizationDenied { ref reason } if reason == "access_denied: User declined")
		);

		let no_code = callback(&format!("state={}", session.state));

		assert!(session.parse_callback(&no_code).is_err());
	}
}
