//! One-legged OAuth 1.0a request signing.
//!
//! [`sign`] turns a method, URL, request parameters, and [`Credentials`] into a
//! [`SignedRequest`] carrying the `oauth_*` parameter set and a ready-to-send
//! `Authorization` header value. Time and nonce come from the injected [`Clock`] and
//! [`NonceSource`], so fixing both makes the output byte-for-byte reproducible.

pub mod encode;
pub mod params;

pub use encode::percent_encode;
pub use params::RequestParams;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	clock::{Clock, MIN_NONCE_LEN, NonceSource},
	error::ConfigError,
};

const OAUTH_VERSION: &str = "1.0";
const AUTHORIZATION_SCHEME: &str = "OAuth";

/// HMAC digests supported for `oauth_signature_method`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// `HMAC-SHA1`, the method most platforms require.
	#[default]
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// `HMAC-SHA256`.
	#[serde(rename = "HMAC-SHA256")]
	HmacSha256,
}
impl SignatureMethod {
	/// Returns the protocol tag sent as `oauth_signature_method`.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
		}
	}

	fn digest_base64(self, key: &[u8], data: &[u8]) -> Result<String> {
		let digest = match self {
			SignatureMethod::HmacSha1 => {
				let mut mac = <Hmac<Sha1>>::new_from_slice(key)
					.map_err(|_| ConfigError::InvalidSigningKey)?;

				mac.update(data);
				mac.finalize().into_bytes().to_vec()
			},
			SignatureMethod::HmacSha256 => {
				let mut mac = <Hmac<Sha256>>::new_from_slice(key)
					.map_err(|_| ConfigError::InvalidSigningKey)?;

				mac.update(data);
				mac.finalize().into_bytes().to_vec()
			},
		};

		Ok(STANDARD.encode(digest))
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of signing one request. Derived per call and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
	/// Uppercased HTTP method that was signed.
	pub method: String,
	/// Target URL exactly as supplied (query string included).
	pub url: Url,
	/// `oauth_*` parameters including `oauth_signature`, keyed for sorted iteration.
	pub oauth_params: BTreeMap<String, String>,
	/// Value for the `Authorization` header.
	pub header_value: String,
}
impl SignedRequest {
	/// Returns the base64 signature.
	pub fn signature(&self) -> &str {
		self.oauth_params.get("oauth_signature").map(String::as_str).unwrap_or_default()
	}
}
impl Debug for SignedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("oauth_params", &self.oauth_params.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Reusable signer bound to a clock, a nonce source, and a digest.
#[derive(Clone)]
pub struct Signer {
	clock: Arc<dyn Clock>,
	nonce: Arc<dyn NonceSource>,
	method: SignatureMethod,
}
impl Signer {
	/// Creates a `HMAC-SHA1` signer.
	pub fn new(clock: Arc<dyn Clock>, nonce: Arc<dyn NonceSource>) -> Self {
		Self { clock, nonce, method: SignatureMethod::default() }
	}

	/// Overrides the signature method.
	pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
		self.method = method;

		self
	}

	/// Signature method in use.
	pub fn signature_method(&self) -> SignatureMethod {
		self.method
	}

	/// Signs a request. See [`sign`].
	pub fn sign(
		&self,
		method: &str,
		url: &Url,
		params: &RequestParams,
		credentials: &Credentials,
	) -> Result<SignedRequest> {
		sign(
			method,
			url,
			params,
			credentials,
			self.clock.as_ref(),
			self.nonce.as_ref(),
			self.method,
		)
	}
}
impl Debug for Signer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signer").field("method", &self.method).finish()
	}
}

/// Signs a request with one-legged OAuth 1.0a.
///
/// Query pairs already present on `url` take part in the signature alongside `params`.
/// Fails with [`Error::InvalidCredentials`] when a credential field is empty and with
/// [`ConfigError::InvalidNonce`] when the nonce is shorter than [`MIN_NONCE_LEN`] or not
/// alphanumeric.
pub fn sign(
	method: &str,
	url: &Url,
	params: &RequestParams,
	credentials: &Credentials,
	clock: &dyn Clock,
	nonce: &dyn NonceSource,
	signature_method: SignatureMethod,
) -> Result<SignedRequest> {
	credentials.validate()?;

	let nonce = nonce.nonce();

	if nonce.len() < MIN_NONCE_LEN || !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
		return Err(ConfigError::InvalidNonce { min: MIN_NONCE_LEN }.into());
	}

	let method = method.to_ascii_uppercase();
	let mut oauth_params = BTreeMap::from([
		("oauth_consumer_key".to_owned(), credentials.consumer_key.expose().to_owned()),
		("oauth_nonce".to_owned(), nonce),
		("oauth_signature_method".to_owned(), signature_method.as_str().to_owned()),
		("oauth_timestamp".to_owned(), clock.now().unix_timestamp().to_string()),
		("oauth_token".to_owned(), credentials.access_token.expose().to_owned()),
		("oauth_version".to_owned(), OAUTH_VERSION.to_owned()),
	]);
	let mut merged = params.clone();

	merged.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));
	merged.extend(oauth_params.iter().map(|(k, v)| (k.clone(), v.clone())));

	let base = signature_base_string(&method, &base_url(url)?, &merged);
	let key = signing_key(credentials);
	let signature = signature_method.digest_base64(key.as_bytes(), base.as_bytes())?;

	oauth_params.insert("oauth_signature".into(), signature);

	let header_value = authorization_header(&oauth_params);

	Ok(SignedRequest { method, url: url.to_owned(), oauth_params, header_value })
}

/// Builds `METHOD&enc(base_url)&enc(normalized_params)`.
pub fn signature_base_string(method: &str, base_url: &str, params: &RequestParams) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(base_url),
		percent_encode(&params.normalized())
	)
}

/// Formats `OAuth k1="v1", k2="v2"` with keys in sorted order and encoded values.
pub fn authorization_header(oauth_params: &BTreeMap<String, String>) -> String {
	let pairs = oauth_params
		.iter()
		.map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join(", ");

	format!("{AUTHORIZATION_SCHEME} {pairs}")
}

fn signing_key(credentials: &Credentials) -> String {
	format!(
		"{}&{}",
		percent_encode(credentials.consumer_secret.expose()),
		percent_encode(credentials.access_token_secret.expose())
	)
}

/// `scheme://host[:port]/path`; default ports, query, and fragment are dropped.
fn base_url(url: &Url) -> Result<String> {
	let host =
		url.host_str().ok_or_else(|| ConfigError::UnsignableUrl { url: url.to_string() })?;
	let mut base = format!("{}://{}", url.scheme(), host.to_ascii_lowercase());

	if let Some(port) = url.port() {
		base.push(':');
		base.push_str(&port.to_string());
	}

	base.push_str(url.path());

	Ok(base)
}
