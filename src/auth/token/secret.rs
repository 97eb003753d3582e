//! Secret wrapper that keeps tokens and signing secrets out of logs.

// self
use crate::_prelude::*;

const HINT_LEN: usize = 4;

/// Redacted secret wrapper for access tokens, refresh tokens, and consumer secrets.
///
/// `Debug` and `Display` never print the value in full; [`TokenSecret::hint`] exposes at most
/// the last four characters so operators can tell two secrets apart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for an empty secret.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Short, log-safe suffix of the secret (`…wxyz`), or `<empty>`.
	pub fn hint(&self) -> String {
		let count = self.0.chars().count();

		if count == 0 {
			return "<empty>".into();
		}
		if count <= HINT_LEN * 2 {
			return "…".into();
		}

		let tail: String = self.0.chars().skip(count - HINT_LEN).collect();

		format!("…{tail}")
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&self.hint()).finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret-value");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"…alue\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn short_secrets_reveal_nothing() {
		assert_eq!(TokenSecret::new("TS").hint(), "…");
		assert_eq!(TokenSecret::new("").hint(), "<empty>");
	}
}
