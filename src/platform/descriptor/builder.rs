// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, PlatformId, ScopeSet, ScopeValidationError},
	platform::{
		ClientAuthMethod, PERMALINK_PLACEHOLDER, PlatformDescriptor, PlatformEndpoints,
		RequestAuth,
	},
	sign::SignatureMethod,
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PlatformDescriptorError {
	/// Authorization endpoint is required for the interactive handshake.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for exchanges and refreshes.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Media upload endpoint is mandatory.
	#[error("Missing media upload endpoint.")]
	MissingMediaUploadEndpoint,
	/// Post endpoint is mandatory.
	#[error("Missing post endpoint.")]
	MissingPostEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Permalink template must contain `{id}` once and render an HTTPS URL.
	#[error("Permalink template is invalid: {template}.")]
	InvalidPermalinkTemplate {
		/// Template that failed validation.
		template: String,
	},
	/// Descriptor identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// Scope list failed validation.
	#[error(transparent)]
	InvalidScopes(#[from] ScopeValidationError),
	/// Serialized descriptor could not be decoded.
	#[error("Descriptor document is malformed: {0}.")]
	Malformed(String),
}

/// Builder for [`PlatformDescriptor`] values.
#[derive(Debug)]
pub struct PlatformDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: PlatformId,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Option<Url>,
	/// Binary media upload endpoint.
	pub media_upload_endpoint: Option<Url>,
	/// Post creation endpoint.
	pub post_endpoint: Option<Url>,
	/// Optional alt-text endpoint.
	pub media_metadata_endpoint: Option<Url>,
	/// Optional authenticated-user endpoint.
	pub profile_endpoint: Option<Url>,
	/// Public post URL template.
	pub permalink_template: String,
	/// Scopes requested during authorization.
	pub scopes: ScopeSet,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Authentication applied to media and post calls.
	pub request_auth: RequestAuth,
	/// Digest used for OAuth 1.0a signatures.
	pub signature_method: SignatureMethod,
}
impl PlatformDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: PlatformId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			token_endpoint: None,
			media_upload_endpoint: None,
			post_endpoint: None,
			media_metadata_endpoint: None,
			profile_endpoint: None,
			permalink_template: String::new(),
			scopes: ScopeSet::default(),
			client_auth_method: ClientAuthMethod::default(),
			request_auth: RequestAuth::default(),
			signature_method: SignatureMethod::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the media upload endpoint.
	pub fn media_upload_endpoint(mut self, url: Url) -> Self {
		self.media_upload_endpoint = Some(url);

		self
	}

	/// Sets the post creation endpoint.
	pub fn post_endpoint(mut self, url: Url) -> Self {
		self.post_endpoint = Some(url);

		self
	}

	/// Sets the optional media metadata endpoint.
	pub fn media_metadata_endpoint(mut self, url: Url) -> Self {
		self.media_metadata_endpoint = Some(url);

		self
	}

	/// Sets the optional profile endpoint.
	pub fn profile_endpoint(mut self, url: Url) -> Self {
		self.profile_endpoint = Some(url);

		self
	}

	/// Sets the permalink template; it must contain `{id}`.
	pub fn permalink_template(mut self, template: impl Into<String>) -> Self {
		self.permalink_template = template.into();

		self
	}

	/// Overrides the default scopes.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides how media and post calls authenticate.
	pub fn request_auth(mut self, auth: RequestAuth) -> Self {
		self.request_auth = auth;

		self
	}

	/// Overrides the OAuth 1.0a digest.
	pub fn signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<PlatformDescriptor, PlatformDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(PlatformDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(PlatformDescriptorError::MissingTokenEndpoint)?;
		let media_upload =
			self.media_upload_endpoint.ok_or(PlatformDescriptorError::MissingMediaUploadEndpoint)?;
		let post_create = self.post_endpoint.ok_or(PlatformDescriptorError::MissingPostEndpoint)?;
		let endpoints = PlatformEndpoints {
			authorization,
			token,
			media_upload,
			post_create,
			media_metadata: self.media_metadata_endpoint,
			profile: self.profile_endpoint,
		};
		let descriptor = PlatformDescriptor {
			id: self.id,
			endpoints,
			permalink_template: self.permalink_template,
			scopes: self.scopes,
			client_auth_method: self.client_auth_method,
			request_auth: self.request_auth,
			signature_method: self.signature_method,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl PlatformDescriptor {
	/// Validates invariants for the descriptor.
	pub(crate) fn validate(&self) -> Result<(), PlatformDescriptorError> {
		let endpoints = &self.endpoints;

		validate_endpoint("authorization", &endpoints.authorization)?;
		validate_endpoint("token", &endpoints.token)?;
		validate_endpoint("media_upload", &endpoints.media_upload)?;
		validate_endpoint("post_create", &endpoints.post_create)?;

		if let Some(metadata) = endpoints.media_metadata.as_ref() {
			validate_endpoint("media_metadata", metadata)?;
		}
		if let Some(profile) = endpoints.profile.as_ref() {
			validate_endpoint("profile", profile)?;
		}

		validate_permalink_template(&self.permalink_template)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), PlatformDescriptorError> {
	if url.scheme() != "https" {
		Err(PlatformDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_permalink_template(template: &str) -> Result<(), PlatformDescriptorError> {
	let invalid =
		|| PlatformDescriptorError::InvalidPermalinkTemplate { template: template.to_owned() };

	if template.matches(PERMALINK_PLACEHOLDER).count() != 1 {
		return Err(invalid());
	}

	let rendered = Url::parse(&template.replace(PERMALINK_PLACEHOLDER, "0")).map_err(|_| invalid())?;

	if rendered.scheme() != "https" {
		return Err(invalid());
	}

	Ok(())
}
