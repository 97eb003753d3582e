//! Media resolution and per-item upload with independent failures.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
use percent_encoding::percent_decode_str;
// self
use crate::{
	_prelude::*,
	auth::{MediaId, TokenState},
	error::{ConfigError, TransportError},
	http::{self, PlatformHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	platform::Endpoint,
	publish::{
		MediaItem, MediaSource, MediaUploadResult, PublishClient,
		wire::{self, MediaMetadataBody, UploadedMedia},
	},
};

/// Bytes ready for upload plus the MIME type they were declared with, if any.
#[derive(Debug)]
pub(crate) struct ResolvedMedia {
	pub(crate) bytes: Vec<u8>,
	pub(crate) mime_type: Option<String>,
}

impl<C, M> PublishClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Uploads every item in order; one failure never stops the loop.
	pub(crate) async fn upload_all(
		&self,
		media: &[MediaItem],
		token: &TokenState,
	) -> Vec<MediaUploadResult> {
		let mut results = Vec::with_capacity(media.len());

		for (index, item) in media.iter().enumerate() {
			let outcome = self.upload_one(index, item, token).await.map_err(|err| {
				let failure = match err {
					Error::MediaUploadFailed { reason, .. } =>
						Error::MediaUploadFailed { index, reason },
					other => Error::MediaUploadFailed { index, reason: other.to_string() },
				};

				obs::media_dropped(index, &failure);

				failure
			});

			results.push(MediaUploadResult { index, item: item.clone(), outcome });
		}

		results
	}

	async fn upload_one(
		&self,
		index: usize,
		item: &MediaItem,
		token: &TokenState,
	) -> Result<MediaId> {
		const KIND: FlowKind = FlowKind::MediaUpload;

		let span = FlowSpan::new(KIND, "upload_one");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let resolved = self.resolve(item).await?;
				let mime_type = item
					.mime_type
					.clone()
					.or(resolved.mime_type)
					.unwrap_or_else(|| item.kind.default_mime_type().to_owned());
				let mut url = self.descriptor().endpoints.media_upload.clone();

				url.query_pairs_mut().append_pair("media_category", item.kind.media_category());

				let response = self
					.send_authorized(
						Endpoint::MediaUpload,
						Method::POST,
						&url,
						resolved.bytes,
						Some(&mime_type),
						token,
					)
					.await?;
				let status = response.status().as_u16();

				if !response.status().is_success() {
					return Err(Error::MediaUploadFailed {
						index,
						reason: format!(
							"HTTP {status}: {}",
							wire::rejection_message(status, response.body())
						),
					});
				}

				let uploaded: UploadedMedia =
					wire::parse_body(Endpoint::MediaUpload, status, response.body())?;
				let media_id = MediaId::new(&uploaded.media_id_string).map_err(|e| {
					Error::MediaUploadFailed { index, reason: format!("invalid media id: {e}") }
				})?;

				if let Err(err) = self.attach_alt_text(&media_id, &item.alt_text, token).await {
					obs::alt_text_skipped(index, &err);
				}

				Ok(media_id)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Loads the bytes behind a media source.
	///
	/// Failures carry index 0; [`upload_all`](Self::upload_all) stamps the real position.
	pub(crate) async fn resolve(&self, item: &MediaItem) -> Result<ResolvedMedia> {
		match &item.source {
			MediaSource::Bytes(bytes) =>
				Ok(ResolvedMedia { bytes: bytes.to_vec(), mime_type: None }),
			MediaSource::Uri(url) => match url.scheme() {
				"data" => decode_data_uri(url),
				"http" | "https" => self.fetch_remote(url).await,
				scheme => Err(Error::MediaUploadFailed {
					index: 0,
					reason: format!("unsupported media URI scheme `{scheme}`"),
				}),
			},
		}
	}

	async fn fetch_remote(&self, url: &Url) -> Result<ResolvedMedia> {
		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(ACCEPT, "*/*")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = http::send(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			Endpoint::MediaFetch,
			request,
		)
		.await?;
		let status = response.status().as_u16();

		if !response.status().is_success() {
			return Err(TransportError::UnexpectedResponse {
				endpoint: Endpoint::MediaFetch,
				status: Some(status),
				message: format!("media source answered HTTP {status}"),
			}
			.into());
		}

		let mime_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.split(';').next().unwrap_or(value).trim().to_owned())
			.filter(|value| !value.is_empty());

		Ok(ResolvedMedia { bytes: response.into_body(), mime_type })
	}

	async fn attach_alt_text(
		&self,
		media_id: &MediaId,
		alt_text: &str,
		token: &TokenState,
	) -> Result<()> {
		if alt_text.is_empty() {
			return Ok(());
		}

		let Some(url) = self.descriptor().endpoints.media_metadata.clone() else {
			return Ok(());
		};
		let body = serde_json::to_vec(&MediaMetadataBody {
			media_id,
			alt_text: wire::AltText { text: alt_text },
		})
		.map_err(|e| TransportError::Io(e.into()))?;
		let response = self
			.send_authorized(
				Endpoint::MediaMetadata,
				Method::POST,
				&url,
				body,
				Some("application/json"),
				token,
			)
			.await?;

		if response.status().is_success() {
			Ok(())
		} else {
			let status = response.status().as_u16();

			Err(TransportError::UnexpectedResponse {
				endpoint: Endpoint::MediaMetadata,
				status: Some(status),
				message: wire::rejection_message(status, response.body()),
			}
			.into())
		}
	}
}

/// Decodes `data:[<mime>][;base64],<payload>`.
pub(crate) fn decode_data_uri(url: &Url) -> Result<ResolvedMedia> {
	let malformed = |reason: &str| Error::MediaUploadFailed {
		index: 0,
		reason: format!("malformed data URI: {reason}"),
	};
	let raw = url.as_str().strip_prefix("data:").ok_or_else(|| malformed("missing scheme"))?;
	let (header, payload) = raw.split_once(',').ok_or_else(|| malformed("missing comma"))?;
	let (mime, is_base64) = match header.strip_suffix(";base64") {
		Some(mime) => (mime, true),
		None => (header, false),
	};
	let mime = mime.split(';').next().unwrap_or_default().trim();
	let bytes = if is_base64 {
		let compact: String = percent_decode_str(payload)
			.decode_utf8_lossy()
			.chars()
			.filter(|c| !c.is_ascii_whitespace())
			.collect();

		STANDARD.decode(compact).map_err(|e| malformed(&e.to_string()))?
	} else {
		percent_decode_str(payload).collect()
	};

	if bytes.is_empty() {
		return Err(malformed("empty payload"));
	}

	Ok(ResolvedMedia { bytes, mime_type: (!mime.is_empty()).then(|| mime.to_owned()) })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn data_uri(raw: &str) -> Url {
		Url::parse(raw).expect("Data URI fixture should parse.")
	}

	#[test]
	fn base64_data_uris_decode_with_their_mime_type() {
		let resolved = decode_data_uri(&data_uri("data:image/png;base64,aGVsbG8="))
			.expect("Base64 data URI should decode.");

		assert_eq!(resolved.bytes, b"hello");
		assert_eq!(resolved.mime_type.as_deref(), Some("image/png"));
	}

	#[test]
	fn plain_data_uris_are_percent_decoded() {
		let resolved =
			decode_data_uri(&data_uri("data:,a%20b")).expect("Plain data URI should decode.");

		assert_eq!(resolved.bytes, b"a b");
		assert_eq!(resolved.mime_type, None);
	}

	#[test]
	fn broken_data_uris_fail_as_media_errors() {
		for raw in ["data:image/png;base64,@@@", "data:image/png;base64,", "data:image/png"] {
			let err = decode_data_uri(&data_uri(raw)).expect_err("Broken data URI must fail.");

			assert_eq!(err.kind(), ErrorKind::MediaUploadFailed);
		}
	}
}
