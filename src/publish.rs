//! Post creation: media uploads followed by one authorized post request.
//!
//! [`PublishClient::publish`] validates the session through the shared
//! [`AuthClient`](crate::flows::AuthClient), uploads every media item independently, and
//! creates the post with whatever media ids survived. Each finished attempt is summarized as
//! a [`PublishEvent`] for the configured [`PublishEventSink`].

pub mod draft;
pub mod events;
pub mod result;

mod media;
pub(crate) mod wire;

pub use draft::*;
pub use events::*;
pub use result::*;

// crates.io
use oauth2::{
	HttpResponse,
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};
use crate::{
	_prelude::*,
	auth::{Credentials, MediaId, PostId, TokenState},
	clock::{Clock, NonceSource, RandomNonce},
	error::{ConfigError, TransportError},
	flows::AuthClient,
	http::{self, PlatformHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	platform::{Endpoint, PlatformDescriptor, RequestAuth},
	publish::wire::{CreatePostBody, CreatedPost, ProfileEnvelope},
	sign::{RequestParams, Signer},
};

#[cfg(feature = "reqwest")]
/// Publish client specialized for the crate's default reqwest transport stack.
pub type ReqwestPublishClient = PublishClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Publishes drafts for the account managed by an [`AuthClient`].
pub struct PublishClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	auth: Arc<AuthClient<C, M>>,
	credentials: Credentials,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
	nonce: Arc<dyn NonceSource>,
	events: Option<Arc<dyn PublishEventSink>>,
}
impl<C, M> PublishClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that signs with `credentials` and sends through `http_client`.
	///
	/// The clock starts as the auth client's clock; nonces are random.
	pub fn new(
		auth: Arc<AuthClient<C, M>>,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let clock = auth.clock();

		Self {
			auth,
			credentials,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			clock,
			nonce: Arc::new(RandomNonce::default()),
			events: None,
		}
	}

	/// Creates a client that reuses the auth client's transport + mapper pair.
	pub fn from_auth(auth: Arc<AuthClient<C, M>>, credentials: Credentials) -> Self {
		let http_client = auth.http_client.clone();
		let mapper = auth.transport_mapper.clone();

		Self::new(auth, credentials, http_client, mapper)
	}

	/// Replaces the clock used for signature timestamps and event instants.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the nonce source used by the signer.
	pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
		self.nonce = nonce;

		self
	}

	/// Sends every finished attempt to `sink`.
	pub fn with_event_sink(mut self, sink: Arc<dyn PublishEventSink>) -> Self {
		self.events = Some(sink);

		self
	}

	/// Auth client that owns the account session.
	pub fn auth(&self) -> &Arc<AuthClient<C, M>> {
		&self.auth
	}

	/// Publishes `draft` and reports which media made it into the post.
	///
	/// Media failures never fail the call; they are listed in
	/// [`PublishReport::failed_media`]. When every item fails the post is sent text-only.
	pub async fn publish(&self, draft: &PostDraft) -> Result<PublishReport> {
		const KIND: FlowKind = FlowKind::Publish;

		let span = FlowSpan::new(KIND, "publish");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.publish_inner(draft)).await;

		obs::record_result(KIND, &result);
		self.emit(draft, &result);

		result
	}

	/// Fetches the profile of the authenticated account.
	pub async fn fetch_profile(&self) -> Result<UserProfile> {
		const KIND: FlowKind = FlowKind::Profile;

		let span = FlowSpan::new(KIND, "fetch_profile");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let url = self
					.descriptor()
					.endpoints
					.profile
					.clone()
					.ok_or(ConfigError::MissingEndpoint { endpoint: Endpoint::Profile })?;
				let token = self.auth.ensure_valid().await?;

				self.check_credentials()?;

				let response = self
					.send_authorized(Endpoint::Profile, Method::GET, &url, Vec::new(), None, &token)
					.await?;
				let status = response.status().as_u16();

				if !response.status().is_success() {
					return Err(TransportError::UnexpectedResponse {
						endpoint: Endpoint::Profile,
						status: Some(status),
						message: wire::rejection_message(status, response.body()),
					}
					.into());
				}

				let envelope: ProfileEnvelope =
					wire::parse_body(Endpoint::Profile, status, response.body())?;

				Ok(envelope.data)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn publish_inner(&self, draft: &PostDraft) -> Result<PublishReport> {
		let token = self.auth.ensure_valid().await?;

		self.check_credentials()?;

		let media = self.upload_all(&draft.media, &token).await;
		let media_ids = media.iter().filter_map(|r| r.media_id().cloned()).collect::<Vec<_>>();
		let post = self.create_post(&draft.text, &media_ids, token).await?;

		Ok(PublishReport { post, media })
	}

	async fn create_post(
		&self,
		text: &str,
		media_ids: &[MediaId],
		token: TokenState,
	) -> Result<PublishedPost> {
		let url = self.descriptor().endpoints.post_create.clone();
		let body = serde_json::to_vec(&CreatePostBody::new(text, media_ids))
			.map_err(|e| TransportError::Io(e.into()))?;
		let mut response = self
			.send_authorized(
				Endpoint::PostCreate,
				Method::POST,
				&url,
				body.clone(),
				Some("application/json"),
				&token,
			)
			.await?;

		if response.status() == StatusCode::UNAUTHORIZED
			&& self.descriptor().request_auth == RequestAuth::Bearer
		{
			let refreshed = self.auth.refresh_replacing(&token.access_token).await?;

			response = self
				.send_authorized(
					Endpoint::PostCreate,
					Method::POST,
					&url,
					body,
					Some("application/json"),
					&refreshed,
				)
				.await?;
		}

		let status = response.status().as_u16();

		if !response.status().is_success() {
			return Err(Error::PublishRejected {
				status,
				message: wire::rejection_message(status, response.body()),
			});
		}

		let created: CreatedPost = wire::parse_body(Endpoint::PostCreate, status, response.body())?;
		let id = PostId::new(&created.data.id).map_err(|e| TransportError::UnexpectedResponse {
			endpoint: Endpoint::PostCreate,
			status: Some(status),
			message: format!("invalid post id: {e}"),
		})?;
		let url = self.descriptor().permalink(&id);

		Ok(PublishedPost { id, url })
	}

	/// Builds and sends one request carrying the descriptor's authorization scheme.
	pub(crate) async fn send_authorized(
		&self,
		endpoint: Endpoint,
		method: Method,
		url: &Url,
		body: Vec<u8>,
		content_type: Option<&str>,
		token: &TokenState,
	) -> Result<HttpResponse> {
		let authorization = self.authorization_header(method.as_str(), url, token)?;
		let mut builder = Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(ACCEPT, "application/json")
			.header(AUTHORIZATION, authorization);

		if let Some(content_type) = content_type {
			builder = builder.header(CONTENT_TYPE, content_type);
		}

		let request = builder.body(body).map_err(ConfigError::from)?;

		http::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), endpoint, request)
			.await
	}

	fn authorization_header(&self, method: &str, url: &Url, token: &TokenState) -> Result<String> {
		match self.descriptor().request_auth {
			RequestAuth::OAuth1 => Ok(self
				.signer()
				.sign(method, url, &RequestParams::new(), &self.credentials)?
				.header_value),
			RequestAuth::Bearer => Ok(format!("Bearer {}", token.access_token.expose())),
		}
	}

	fn check_credentials(&self) -> Result<()> {
		match self.descriptor().request_auth {
			RequestAuth::OAuth1 => self.credentials.validate(),
			RequestAuth::Bearer => Ok(()),
		}
	}

	fn signer(&self) -> Signer {
		Signer::new(self.clock.clone(), self.nonce.clone())
			.with_signature_method(self.descriptor().signature_method)
	}

	fn descriptor(&self) -> &PlatformDescriptor {
		&self.auth.descriptor
	}

	fn emit(&self, draft: &PostDraft, outcome: &Result<PublishReport>) {
		let Some(sink) = &self.events else {
			return;
		};
		let event = PublishEvent {
			text: draft.text.clone(),
			result: PublishResult::from_outcome(outcome),
			at: self.clock.now(),
		};

		if let Err(err) = sink.emit(&event) {
			obs::event_sink_failed(&err);
		}
	}
}
impl<C, M> Debug for PublishClient<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PublishClient")
			.field("auth", &self.auth)
			.field("credentials", &self.credentials)
			.field("events", &self.events.is_some())
			.finish()
	}
}
