//! Connects an X account and publishes one post with optional images.
//!
//! The demo keeps the session in a JSON file, so later runs skip the browser step. It asks
//! for the OAuth 1.0a credentials JSON written by the settings layer, runs the Authorization
//! Code + PKCE handshake when no session is stored, and then publishes the text (and any
//! image paths) you type in. Every outcome is appended to `publish-events.jsonl`.

// std
use std::{
	fs,
	io::{self, Write},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use post_broker::{
	auth::{AccountId, Credentials},
	flows::{AuthClient, AuthorizationPrompt, PromptFuture},
	platform::PlatformDescriptor,
	publish::{JsonLinesEventSink, MediaItem, MediaKind, PostDraft, PublishClient},
	store::{FileStore, TokenStore},
};

/// Prints the authorize URL and reads the pasted callback URL from stdin.
struct StdinPrompt;
impl AuthorizationPrompt for StdinPrompt {
	fn prompt<'a>(&'a self, authorize_url: &'a Url) -> PromptFuture<'a> {
		Box::pin(async move {
			println!("Open this URL and approve the request:\n{authorize_url}");

			let pasted = prompt_optional("Paste the full callback URL (blank cancels)").ok()??;

			Url::parse(&pasted).ok()
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = prompt_with_default("Enter your X client ID", Some("demo-x-client"))?;
	let redirect_uri = Url::parse(&prompt_with_default(
		"Enter the redirect URI registered with X",
		Some("https://app.example.com/x/callback"),
	)?)?;
	let credentials_path =
		prompt_with_default("Path to the credentials JSON", Some("credentials.json"))?;
	let credentials = Credentials::from_json(&fs::read_to_string(credentials_path)?)?;
	let store: Arc<dyn TokenStore> = Arc::new(FileStore::open("post-broker-session.json")?);
	let auth = Arc::new(
		AuthClient::new(store, PlatformDescriptor::x()?, AccountId::new("default")?, client_id)?
			.with_redirect_uri(redirect_uri),
	);

	if !auth.is_authenticated().await {
		let state = auth.authorize(&StdinPrompt).await?;

		println!("Connected; access token valid until {}.", state.expires_at);
	}

	let publisher = PublishClient::from_auth(auth.clone(), credentials)
		.with_event_sink(Arc::new(JsonLinesEventSink::open("publish-events.jsonl")?));

	match publisher.fetch_profile().await {
		Ok(profile) => println!("Posting as @{} ({}).", profile.username, profile.name),
		Err(e) => println!("Profile lookup failed: {e}."),
	}

	let text = prompt_with_default("Post text", Some("Hello from post-broker."))?;
	let mut draft = PostDraft::new(text);

	while let Some(path) = prompt_optional("Image path (blank to finish)")? {
		draft = draft.with_media(MediaItem::from_bytes(MediaKind::Image, fs::read(path)?));
	}

	let report = publisher.publish(&draft).await?;

	for failed in report.failed_media() {
		if let Some(e) = failed.error() {
			println!("Skipped media #{}: {e}", failed.index);
		}
	}

	println!("Published {} with {} media item(s).", report.post.url, report.media_ids().len());

	Ok(())
}

fn prompt_with_default(message: &str, default: Option<&str>) -> Result<String> {
	loop {
		if let Some(value) = default {
			print!("{message} [{value}]: ");
		} else {
			print!("{message}: ");
		}

		io::stdout().flush()?;

		let mut input = String::new();

		io::stdin().read_line(&mut input)?;

		let trimmed = input.trim();

		if trimmed.is_empty() {
			if let Some(value) = default {
				return Ok(value.to_owned());
			}
		} else {
			return Ok(trimmed.to_owned());
		}
	}
}

fn prompt_optional(message: &str) -> Result<Option<String>> {
	print!("{message}: ");

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() { Ok(None) } else { Ok(Some(trimmed.to_owned())) }
}
