//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url, Version};

use crate::error::{ApiError, ApiResult};
use crate::trace::TraceObserver;
use crate::transport::{ApiRequest, ApiResponse, CallContext, Transport, media_type_for};

const BASE_URL: &str = "http://gocd.test/go/";

#[derive(Default)]
struct State {
    requests: Vec<ApiRequest>,
    responses: VecDeque<ApiResult<ApiResponse>>,
}

/// Records every executed request and replays scripted outcomes in order.
///
/// Once the script runs dry, `execute` blocks until the call context fires.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn respond(&self, status: u16, headers: &[(&str, &str)], body: impl AsRef<[u8]>) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).expect("header name"),
                HeaderValue::from_str(value).expect("header value"),
            );
        }
        let response = ApiResponse::new(
            StatusCode::from_u16(status).expect("status code"),
            Version::HTTP_11,
            map,
            body.as_ref().to_vec(),
        );
        self.lock().responses.push_back(Ok(response));
    }

    pub fn fail_with(&self, err: ApiError) {
        self.lock().responses.push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn new_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        api_version: &str,
    ) -> ApiResult<ApiRequest> {
        let base = Url::parse(BASE_URL).expect("base url");
        let url = base.join(path).map_err(|source| ApiError::InvalidUrl {
            path: path.to_string(),
            source,
        })?;
        let mut request = ApiRequest::new(method, url, body);
        request.set_header(ACCEPT.as_str(), &media_type_for(api_version))?;
        Ok(request)
    }

    async fn execute(&self, ctx: &CallContext, request: ApiRequest) -> ApiResult<ApiResponse> {
        let scripted = {
            let mut state = self.lock();
            state.requests.push(request);
            state.responses.pop_front()
        };
        match scripted {
            Some(outcome) => ctx.run(async move { outcome }).await,
            None => ctx.run(std::future::pending()).await,
        }
    }
}

/// Observer event captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request(String),
    Response(u16),
    Error(String),
}

/// Observer that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl TraceObserver for RecordingObserver {
    fn on_request(&self, request: &ApiRequest) {
        self.push(Event::Request(request.request_line()));
    }

    fn on_response(&self, response: &ApiResponse) {
        self.push(Event::Response(response.status().as_u16()));
    }

    fn on_error(&self, error: &ApiError) {
        self.push(Event::Error(error.to_string()));
    }
}
