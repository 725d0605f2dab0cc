//! Generic HTTP action dispatcher.
//!
//! Every GoCD resource call goes through [`Client::http_action`]. The
//! method wrappers only pre-fill the verb, except DELETE and HEAD, which fix
//! their response shape.

use std::borrow::Cow;
use std::collections::BTreeMap;

use reqwest::Method;
use reqwest::header::{ETAG, IF_MATCH};
use serde::Serialize;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::de::value::StrDeserializer;

use crate::client::Client;
use crate::error::{ApiError, ApiResult};
use crate::models::StringResponse;
use crate::transport::{ApiResponse, CallContext, Transport};
use crate::versioned::{Payload, if_match_value, version_from_etag};

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Decode the body as JSON.
    #[default]
    Json,
    /// Hand the UTF-8 body to the response type as a string.
    Text,
}

/// Method-agnostic request descriptor.
#[derive(Debug)]
pub struct ActionRequest<'a, B = ()> {
    /// HTTP verb; overwritten by the method wrappers.
    pub method: Method,
    /// Path relative to the transport's base URL, e.g. `api/agents`.
    pub path: Cow<'a, str>,
    /// API version token selecting the `Accept` media type.
    pub api_version: Cow<'a, str>,
    /// Request payload, serialized as JSON.
    pub body: Option<&'a B>,
    /// Response decoding; JSON when unset.
    pub response_type: Option<ResponseType>,
    /// Extra headers, set after the transport built the request.
    pub headers: BTreeMap<String, String>,
}

impl<'a> ActionRequest<'a> {
    /// Descriptor for `path` without a body.
    pub fn new(path: impl Into<Cow<'a, str>>, api_version: impl Into<Cow<'a, str>>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            api_version: api_version.into(),
            body: None,
            response_type: None,
            headers: BTreeMap::new(),
        }
    }
}

impl<'a, B> ActionRequest<'a, B> {
    /// Attach a request payload.
    #[must_use]
    pub fn with_body<C>(self, body: &'a C) -> ActionRequest<'a, C> {
        ActionRequest {
            method: self.method,
            path: self.path,
            api_version: self.api_version,
            body: Some(body),
            response_type: self.response_type,
            headers: self.headers,
        }
    }

    /// Set the HTTP verb.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Select how the response body is decoded.
    #[must_use]
    pub const fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Add an extra header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Decoded body plus the response envelope.
///
/// A versioned body receives the `Etag` token during decoding. When the body
/// is empty (e.g. `204 No Content`) there is nothing to write it to; read it
/// from [`Action::version`] instead.
#[derive(Debug, Clone)]
pub struct Action<R> {
    /// Decoded body; `None` when the server sent an empty body.
    pub body: Option<R>,
    /// Response envelope.
    pub response: ApiResponse,
}

impl<R> Action<R> {
    /// Version token carried by the response `Etag`, with quotes removed.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.response.header(ETAG.as_str()).map(version_from_etag)
    }

    /// Decoded body, failing over to `R::default()` for empty responses.
    pub fn into_body_or_default(self) -> R
    where
        R: Default,
    {
        self.body.unwrap_or_default()
    }
}

impl<T: Transport> Client<T> {
    /// Dispatch `request` and decode the response into `R`.
    ///
    /// A [`Versioned`](crate::Versioned) request body sends its token as
    /// `If-Match`; a versioned response body receives the token from `Etag`.
    ///
    /// # Errors
    ///
    /// Request-construction, transport and decode failures are returned
    /// unchanged, carrying the response envelope when one was received.
    /// Non-2xx statuses surface as [`ApiError::Status`].
    pub async fn http_action<B, R>(
        &self,
        ctx: &CallContext,
        request: ActionRequest<'_, B>,
    ) -> ApiResult<Action<R>>
    where
        B: Serialize + Payload + Sync,
        R: DeserializeOwned + Payload,
    {
        let response_type = request.response_type.unwrap_or_default();
        let response = self.dispatch(ctx, &request).await?;

        if !response.is_success() {
            return Err(self.report(ApiError::Status {
                status: response.status(),
                response: Box::new(response),
            }));
        }

        let mut body = decode::<R>(response_type, &response).map_err(|err| self.report(err))?;

        if let Some(versioned) = body.as_mut().and_then(Payload::as_versioned_mut) {
            let etag = response.header(ETAG.as_str()).unwrap_or_default();
            versioned.set_version(version_from_etag(etag));
        }

        if response_type == ResponseType::Json {
            self.observer.on_response(&response);
        }

        Ok(Action { body, response })
    }

    /// GET wrapper around [`Client::http_action`].
    ///
    /// # Errors
    ///
    /// See [`Client::http_action`].
    pub async fn get_action<B, R>(
        &self,
        ctx: &CallContext,
        request: ActionRequest<'_, B>,
    ) -> ApiResult<Action<R>>
    where
        B: Serialize + Payload + Sync,
        R: DeserializeOwned + Payload,
    {
        self.http_action(ctx, request.with_method(Method::GET)).await
    }

    /// POST wrapper around [`Client::http_action`].
    ///
    /// # Errors
    ///
    /// See [`Client::http_action`].
    pub async fn post_action<B, R>(
        &self,
        ctx: &CallContext,
        request: ActionRequest<'_, B>,
    ) -> ApiResult<Action<R>>
    where
        B: Serialize + Payload + Sync,
        R: DeserializeOwned + Payload,
    {
        self.http_action(ctx, request.with_method(Method::POST)).await
    }

    /// PUT wrapper around [`Client::http_action`].
    ///
    /// # Errors
    ///
    /// See [`Client::http_action`].
    pub async fn put_action<B, R>(
        &self,
        ctx: &CallContext,
        request: ActionRequest<'_, B>,
    ) -> ApiResult<Action<R>>
    where
        B: Serialize + Payload + Sync,
        R: DeserializeOwned + Payload,
    {
        self.http_action(ctx, request.with_method(Method::PUT)).await
    }

    /// PATCH wrapper around [`Client::http_action`].
    ///
    /// # Errors
    ///
    /// See [`Client::http_action`].
    pub async fn patch_action<B, R>(
        &self,
        ctx: &CallContext,
        request: ActionRequest<'_, B>,
    ) -> ApiResult<Action<R>>
    where
        B: Serialize + Payload + Sync,
        R: DeserializeOwned + Payload,
    {
        self.http_action(ctx, request.with_method(Method::PATCH)).await
    }

    /// DELETE `path` and return the server's `message` with the envelope.
    ///
    /// # Errors
    ///
    /// See [`Client::http_action`].
    pub async fn delete_action(
        &self,
        ctx: &CallContext,
        path: &str,
        api_version: &str,
    ) -> ApiResult<(String, ApiResponse)> {
        let request = ActionRequest::new(path, api_version).with_method(Method::DELETE);
        let action = self.http_action::<(), StringResponse>(ctx, request).await?;
        let message = action.body.map(|body| body.message).unwrap_or_default();
        Ok((message, action.response))
    }

    /// HEAD `path` and report whether the resource exists.
    ///
    /// Existence means a status in `[200, 300)`; any other status answers
    /// `false` rather than failing.
    ///
    /// # Errors
    ///
    /// Returns request-construction and transport failures.
    pub async fn head_action(
        &self,
        ctx: &CallContext,
        path: &str,
        api_version: &str,
    ) -> ApiResult<(bool, ApiResponse)> {
        let request = ActionRequest::new(path, api_version).with_method(Method::HEAD);
        let response = self.dispatch(ctx, &request).await?;
        self.observer.on_response(&response);
        Ok((response.is_success(), response))
    }

    /// Build, trace and execute a request; the status is not inspected.
    async fn dispatch<B>(
        &self,
        ctx: &CallContext,
        request: &ActionRequest<'_, B>,
    ) -> ApiResult<ApiResponse>
    where
        B: Serialize + Payload + Sync,
    {
        let body = request
            .body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|source| ApiError::Encode { source })?;

        let mut api_request = self.transport.new_request(
            request.method.clone(),
            &request.path,
            body,
            &request.api_version,
        )?;

        for (name, value) in &request.headers {
            api_request.set_header(name, value)?;
        }

        if let Some(versioned) = request.body.and_then(Payload::as_versioned) {
            api_request.set_header(IF_MATCH.as_str(), &if_match_value(versioned.version()))?;
        }

        self.observer.on_request(&api_request);

        self.transport
            .execute(ctx, api_request)
            .await
            .map_err(|err| self.report(err))
    }

    fn report(&self, err: ApiError) -> ApiError {
        self.observer.on_error(&err);
        err
    }
}

fn decode<R: DeserializeOwned>(
    response_type: ResponseType,
    response: &ApiResponse,
) -> ApiResult<Option<R>> {
    let bytes = response.body();
    if bytes.is_empty() {
        return Ok(None);
    }

    match response_type {
        ResponseType::Json => serde_json::from_slice(bytes).map(Some).map_err(|source| {
            ApiError::Decode {
                source,
                response: Box::new(response.clone()),
            }
        }),
        ResponseType::Text => {
            let text = std::str::from_utf8(bytes).map_err(|source| ApiError::InvalidUtf8 {
                source,
                response: Box::new(response.clone()),
            })?;
            let deserializer: StrDeserializer<'_, serde_json::Error> = text.into_deserializer();
            R::deserialize(deserializer)
                .map(Some)
                .map_err(|source| ApiError::Decode {
                    source,
                    response: Box::new(response.clone()),
                })
        }
    }
}
