//! Outcomes produced by [`PublishClient`](crate::publish::PublishClient).

// self
use crate::{
	_prelude::*,
	auth::{MediaId, PostId},
	publish::MediaItem,
};

/// Outcome of uploading one draft media item.
#[derive(Debug)]
pub struct MediaUploadResult {
	/// Position of the item inside the draft.
	pub index: usize,
	/// The item as submitted.
	pub item: MediaItem,
	/// Platform media id, or [`Error::MediaUploadFailed`].
	pub outcome: Result<MediaId>,
}
impl MediaUploadResult {
	/// Media id when the upload succeeded.
	pub fn media_id(&self) -> Option<&MediaId> {
		self.outcome.as_ref().ok()
	}

	/// Failure when the upload did not succeed.
	pub fn error(&self) -> Option<&Error> {
		self.outcome.as_ref().err()
	}
}

/// A post the platform accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPost {
	/// Platform post id.
	pub id: PostId,
	/// Public permalink rendered from the descriptor template.
	pub url: String,
}

/// Full outcome of a successful [`publish`](crate::publish::PublishClient::publish) call.
#[derive(Debug)]
pub struct PublishReport {
	/// The created post.
	pub post: PublishedPost,
	/// One entry per draft media item, in draft order.
	pub media: Vec<MediaUploadResult>,
}
impl PublishReport {
	/// Media ids attached to the post, in draft order.
	pub fn media_ids(&self) -> Vec<&MediaId> {
		self.media.iter().filter_map(MediaUploadResult::media_id).collect()
	}

	/// Items that were dropped from the post.
	pub fn failed_media(&self) -> impl Iterator<Item = &MediaUploadResult> {
		self.media.iter().filter(|result| result.outcome.is_err())
	}
}

/// Serializable summary of a publish call for UI layers and analytics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishResult {
	/// The post was created.
	Success {
		/// Platform post id.
		post_id: PostId,
		/// Public permalink.
		post_url: String,
	},
	/// The post was not created.
	Failure {
		/// Error classification.
		kind: ErrorKind,
		/// Human-readable message.
		message: String,
	},
}
impl PublishResult {
	/// Summarizes a publish outcome.
	pub fn from_outcome(outcome: &Result<PublishReport>) -> Self {
		match outcome {
			Ok(report) => Self::Success {
				post_id: report.post.id.clone(),
				post_url: report.post.url.clone(),
			},
			Err(err) => Self::Failure { kind: err.kind(), message: err.to_string() },
		}
	}

	/// Returns `true` for [`PublishResult::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}
}

/// Authenticated account as reported by the profile endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Platform user id.
	pub id: String,
	/// Handle without the leading `@`.
	pub username: String,
	/// Display name.
	pub name: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn failure_summary_serializes_with_kind() {
		let outcome: Result<PublishReport> = Err(Error::NotAuthenticated);
		let summary = PublishResult::from_outcome(&outcome);
		let payload = serde_json::to_value(&summary).expect("Summary should serialize.");

		assert!(!summary.is_success());
		assert_eq!(payload["status"], "failure");
		assert_eq!(payload["kind"], "not_authenticated");
	}

	#[test]
	fn success_summary_carries_post_url() {
		let report = PublishReport {
			post: PublishedPost {
				id: PostId::new("42").expect("Post id should be valid."),
				url: "https://twitter.com/i/status/42".into(),
			},
			media: Vec::new(),
		};
		let summary = PublishResult::from_outcome(&Ok(report));

		assert_eq!(
			summary,
			PublishResult::Success {
				post_id: PostId::new("42").expect("Post id should be valid."),
				post_url: "https://twitter.com/i/status/42".into(),
			}
		);
	}
}
