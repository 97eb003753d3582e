//! Request and response bodies exchanged with the post, media, and profile endpoints.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::MediaId,
	error::TransportError,
	platform::Endpoint,
	publish::UserProfile,
};

#[derive(Debug, Serialize)]
pub(crate) struct CreatePostBody<'a> {
	pub(crate) text: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub(crate) media: Option<PostMedia<'a>>,
}
impl<'a> CreatePostBody<'a> {
	pub(crate) fn new(text: &'a str, media_ids: &'a [MediaId]) -> Self {
		let media = (!media_ids.is_empty()).then_some(PostMedia { media_ids });

		Self { text, media }
	}
}

#[derive(Debug, Serialize)]
pub(crate) struct PostMedia<'a> {
	pub(crate) media_ids: &'a [MediaId],
}

#[derive(Debug, Serialize)]
pub(crate) struct MediaMetadataBody<'a> {
	pub(crate) media_id: &'a MediaId,
	pub(crate) alt_text: AltText<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AltText<'a> {
	pub(crate) text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPost {
	pub(crate) data: CreatedPostData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPostData {
	pub(crate) id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadedMedia {
	pub(crate) media_id_string: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
	pub(crate) data: UserProfile,
}

/// Decodes a 2xx body, keeping the JSON path of the first mismatch.
pub(crate) fn parse_body<T>(endpoint: Endpoint, status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| {
		TransportError::MalformedResponse { endpoint, status: Some(status), source }.into()
	})
}

/// Best human-readable message from an error body: `detail`, `title`, `errors[0].message`,
/// then the raw body.
pub(crate) fn rejection_message(status: u16, body: &[u8]) -> String {
	if let Ok(value) = serde_json::from_slice::<Value>(body) {
		let candidates = [
			value.get("detail"),
			value.get("title"),
			value.pointer("/errors/0/message"),
			value.get("error"),
		];

		if let Some(message) = candidates.into_iter().flatten().find_map(Value::as_str) {
			return message.to_owned();
		}
	}

	let raw = String::from_utf8_lossy(body);
	let raw = raw.trim();

	if raw.is_empty() { format!("HTTP {status} without a body") } else { raw.to_owned() }
}
