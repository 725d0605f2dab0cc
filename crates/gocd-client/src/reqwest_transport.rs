//! Production [`Transport`] backed by a pooled `reqwest::Client`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};

use crate::config::{ClientConfig, ConfigError, ConfigResult, Credentials};
use crate::error::{ApiError, ApiResult};
use crate::transport::{
    ApiRequest, ApiResponse, CallContext, JSON_CONTENT_TYPE, Transport, media_type_for,
};

/// Resolves API paths against a base URL and executes them with `reqwest`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl ReqwestTransport {
    /// Build a transport from validated configuration.
    ///
    /// Redirects are not followed: 3xx statuses reach the dispatcher as-is.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when validation fails or the HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> ConfigResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout()?)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|source| ConfigError::HttpClient { source })?;

        Ok(Self {
            client,
            base_url: config.parsed_base_url()?,
            credentials: config.credentials()?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            credentials: None,
        }
    }

    /// Attach basic-auth credentials to every request.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Base URL API paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn new_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        api_version: &str,
    ) -> ApiResult<ApiRequest> {
        let url = self
            .base_url
            .join(path)
            .map_err(|source| ApiError::InvalidUrl {
                path: path.to_string(),
                source,
            })?;

        let has_body = body.is_some();
        let mut request = ApiRequest::new(method, url, body);
        request.set_header(ACCEPT.as_str(), &media_type_for(api_version))?;
        if has_body {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        Ok(request)
    }

    async fn execute(&self, ctx: &CallContext, request: ApiRequest) -> ApiResult<ApiResponse> {
        let (method, url, headers, body) = request.into_parts();
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        ctx.run(async move {
            let response = builder.send().await.map_err(ApiError::from_reqwest)?;
            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(ApiError::from_reqwest)?;
            Ok(ApiResponse::new(status, version, headers, body.to_vec()))
        })
        .await
    }
}
