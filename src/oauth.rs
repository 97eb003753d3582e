//! Token-endpoint facade over the `oauth2` crate plus transport error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::TokenState,
	error::{ConfigError, TransportError},
	http::{PlatformHttpClient, ResponseMetadata, ResponseMetadataSlot},
	platform::{ClientAuthMethod, Endpoint, PlatformDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into pipeline [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `endpoint` into a pipeline error.
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
///
/// Timeouts become [`Error::NetworkTimeout`]; every other network failure becomes
/// [`TransportError::Network`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::UnexpectedResponse {
				endpoint,
				status: meta_status(meta),
				message,
			}
			.into(),
			_ => TransportError::UnexpectedResponse {
				endpoint,
				status: meta_status(meta),
				message: "HTTP client failed without details".into(),
			}
			.into(),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		pkce_verifier: &'a str,
		issued_at: OffsetDateTime,
	) -> FacadeFuture<'a, TokenState>;

	fn refresh_token<'a>(
		&'a self,
		refresh_token: &'a str,
		issued_at: OffsetDateTime,
	) -> FacadeFuture<'a, TokenState>;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &PlatformDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		redirect_uri: Option<&Url>,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let secret = if matches!(descriptor.client_auth_method, ClientAuthMethod::NoneWithPkce) {
			None
		} else {
			client_secret.map(|value| ClientSecret::new(value.to_owned()))
		};
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = secret {
			oauth_client = oauth_client.set_client_secret(secret);
		}
		if let Some(redirect) = redirect_uri {
			let redirect_url = RedirectUrl::new(redirect.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}
		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + PlatformHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		pkce_verifier: &'a str,
		issued_at: OffsetDateTime,
	) -> FacadeFuture<'a, TokenState> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						Endpoint::TokenExchange,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;

			map_token_response(response, issued_at)
		})
	}

	fn refresh_token<'a>(
		&'a self,
		refresh_token: &'a str,
		issued_at: OffsetDateTime,
	) -> FacadeFuture<'a, TokenState> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						Endpoint::TokenRefresh,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;

			map_token_response(response, issued_at)
		})
	}
}

fn map_token_response(
	response: FacadeTokenResponse,
	issued_at: OffsetDateTime,
) -> Result<TokenState> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let mut builder = TokenState::builder()
		.access_token(response.access_token().secret().to_owned())
		.issued_at(issued_at)
		.expires_in(Duration::seconds(expires_in));

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn map_request_error<E, M>(
	endpoint: Endpoint,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();
	let status = meta_status(meta_ref);

	match err {
		RequestTokenError::Request(error) => mapper.map_transport_error(endpoint, meta_ref, error),
		RequestTokenError::ServerResponse(response) => {
			let reason = describe_server_error(&response);

			match endpoint {
				Endpoint::TokenExchange => Error::ExchangeFailed { status, reason },
				_ => Error::SessionExpired { reason },
			}
		},
		RequestTokenError::Parse(source, _body) => match endpoint {
			Endpoint::TokenExchange => Error::ExchangeFailed {
				status,
				reason: format!("token response could not be parsed: {source}"),
			},
			_ => TransportError::MalformedResponse { endpoint, status, source }.into(),
		},
		RequestTokenError::Other(message) => match endpoint {
			Endpoint::TokenExchange => Error::ExchangeFailed { status, reason: message },
			_ => TransportError::UnexpectedResponse { endpoint, status, message }.into(),
		},
	}
}

fn describe_server_error(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: Endpoint, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return Error::NetworkTimeout { endpoint };
	}

	TransportError::network(endpoint, err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
