//! Post drafts handed to the pipeline by the content extractor.

// self
use crate::_prelude::*;

/// Text plus ordered media for one post. Immutable once handed to
/// [`PublishClient::publish`](crate::publish::PublishClient::publish).
#[derive(Clone, Debug, Default)]
pub struct PostDraft {
	/// Post body.
	pub text: String,
	/// Media attached in display order.
	pub media: Vec<MediaItem>,
}
impl PostDraft {
	/// Creates a text-only draft.
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), media: Vec::new() }
	}

	/// Appends a media item.
	pub fn with_media(mut self, item: MediaItem) -> Self {
		self.media.push(item);

		self
	}
}

/// Media category understood by the upload endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
	/// Still image.
	#[default]
	Image,
	/// Video clip.
	Video,
	/// Animated GIF.
	Gif,
}
impl MediaKind {
	/// MIME type used when the item does not carry one.
	pub const fn default_mime_type(self) -> &'static str {
		match self {
			MediaKind::Image => "image/jpeg",
			MediaKind::Video => "video/mp4",
			MediaKind::Gif => "image/gif",
		}
	}

	/// Value sent as the `media_category` upload parameter.
	pub const fn media_category(self) -> &'static str {
		match self {
			MediaKind::Image => "tweet_image",
			MediaKind::Video => "tweet_video",
			MediaKind::Gif => "tweet_gif",
		}
	}
}

/// Where the bytes of a media item come from.
#[derive(Clone)]
pub enum MediaSource {
	/// Bytes already in memory.
	Bytes(Arc<[u8]>),
	/// `data:` URI or `http(s)` URL resolved right before upload.
	Uri(Url),
}
impl Debug for MediaSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			MediaSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
			MediaSource::Uri(url) if url.scheme() == "data" => f.write_str("Uri(data:…)"),
			MediaSource::Uri(url) => write!(f, "Uri({url})"),
		}
	}
}

/// One media attachment of a [`PostDraft`].
#[derive(Clone, Debug)]
pub struct MediaItem {
	/// Byte source.
	pub source: MediaSource,
	/// Accessibility description; empty means none.
	pub alt_text: String,
	/// Media category.
	pub kind: MediaKind,
	/// Explicit MIME type; falls back to the `data:` URI type, then the kind default.
	pub mime_type: Option<String>,
}
impl MediaItem {
	/// Wraps in-memory bytes.
	pub fn from_bytes(kind: MediaKind, bytes: impl Into<Arc<[u8]>>) -> Self {
		Self {
			source: MediaSource::Bytes(bytes.into()),
			alt_text: String::new(),
			kind,
			mime_type: None,
		}
	}

	/// Wraps a `data:` URI or `http(s)` URL.
	pub fn from_uri(kind: MediaKind, uri: Url) -> Self {
		Self { source: MediaSource::Uri(uri), alt_text: String::new(), kind, mime_type: None }
	}

	/// Sets the alt text.
	pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
		self.alt_text = alt_text.into();

		self
	}

	/// Sets an explicit MIME type.
	pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = Some(mime_type.into());

		self
	}
}
