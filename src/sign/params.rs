//! Flat, multi-valued request parameter list and its normalized form.

// self
use crate::{_prelude::*, sign::encode::percent_encode};

/// Ordered list of request parameters that take part in the signature.
///
/// Keys may repeat; a multi-valued parameter contributes one pair per value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams(Vec<(String, String)>);
impl RequestParams {
	/// Creates an empty parameter list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a single `key=value` pair.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.push(key, value);

		self
	}

	/// Appends one pair per value under the same key.
	pub fn with_values<I, V>(mut self, key: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<String>,
	{
		let key = key.into();

		for value in values {
			self.push(key.clone(), value);
		}

		self
	}

	/// Appends a single `key=value` pair in place.
	pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.push((key.into(), value.into()));
	}

	/// Number of pairs (multi-valued keys count once per value).
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no pairs are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over raw (unencoded) pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Encodes every pair, sorts by encoded key then encoded value, and joins them as
	/// `k=v&k=v`.
	pub fn normalized(&self) -> String {
		let mut encoded: Vec<(String, String)> =
			self.0.iter().map(|(k, v)| (percent_encode(k), percent_encode(v))).collect();

		encoded.sort();

		let mut buf = String::new();

		for (idx, (key, value)) in encoded.iter().enumerate() {
			if idx > 0 {
				buf.push('&');
			}

			buf.push_str(key);
			buf.push('=');
			buf.push_str(value);
		}

		buf
	}
}
impl<K, V> FromIterator<(K, V)> for RequestParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl Extend<(String, String)> for RequestParams {
	fn extend<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = (String, String)>,
	{
		self.0.extend(iter);
	}
}
