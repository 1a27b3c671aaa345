//! Resilient outbound HTTP calls.
//!
//! Every call to a third-party data API goes through [`RemoteCallClient`], which
//! makes one attempt with the base timeout and, when that attempt fails at the
//! transport level, exactly one more with an escalated timeout. HTTP error
//! statuses are handed back to the caller untouched; they are never retried.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP method of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Fully formed description of one outbound call.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RemoteRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response of a call that reached the remote end, whatever its status.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
    /// Physical attempts it took to obtain this response (1 or 2).
    pub attempts: u8,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`RemoteFailure::HttpStatus`].
    pub fn into_success(self) -> Result<Self, RemoteFailure> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RemoteFailure::HttpStatus {
                code: self.status,
                body: self.body,
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteFailure> {
        serde_json::from_str(&self.body)
            .map_err(|e| RemoteFailure::InvalidPayload(format!("Invalid JSON body: {}", e)))
    }
}

/// Classified failure of a logical remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFailure {
    /// Timeout, refused connection or no response at all
    TimeoutOrNoResponse(String),
    /// The remote answered with a non-2xx status
    HttpStatus { code: u16, body: String },
    /// The request could not be built (bad URL, bad header)
    RequestSetup(String),
    /// The remote answered 2xx but the payload could not be decoded
    InvalidPayload(String),
}

impl RemoteFailure {
    /// Only transport-level failures are worth a second attempt.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TimeoutOrNoResponse(_))
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutOrNoResponse(msg) => write!(f, "no response: {}", msg),
            Self::HttpStatus { code, body } => write!(f, "HTTP {}: {}", code, body),
            Self::RequestSetup(msg) => write!(f, "invalid request: {}", msg),
            Self::InvalidPayload(msg) => write!(f, "invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// Base and escalated timeouts of the retry-once policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_timeout: Duration,
    pub escalation: f64,
}

impl RetryPolicy {
    pub fn new(base_timeout: Duration, escalation: f64) -> Self {
        Self {
            base_timeout,
            escalation,
        }
    }

    /// Timeout used for the second and last attempt.
    pub fn retry_timeout(&self) -> Duration {
        self.base_timeout.mul_f64(self.escalation)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000), 2.0)
    }
}

/// One physical HTTP exchange. Implementations must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &RemoteRequest,
        timeout: Duration,
    ) -> Result<RemoteResponse, RemoteFailure>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn classify(err: reqwest::Error) -> RemoteFailure {
    if err.is_builder() {
        RemoteFailure::RequestSetup(err.to_string())
    } else {
        RemoteFailure::TimeoutOrNoResponse(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &RemoteRequest,
        timeout: Duration,
    ) -> Result<RemoteResponse, RemoteFailure> {
        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.timeout(timeout).send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;

        Ok(RemoteResponse {
            status,
            body,
            attempts: 1,
        })
    }
}

/// Retry-once client shared by every outbound data-API call.
#[derive(Clone)]
pub struct RemoteCallClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    attempts: Arc<AtomicUsize>,
}

impl RemoteCallClient {
    /// Create a client that talks HTTP through `http`.
    pub fn new(http: reqwest::Client, policy: RetryPolicy) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new(http)), policy)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Total physical attempts issued by this client and its clones.
    pub fn attempts_made(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Perform a logical call: at most two physical attempts.
    ///
    /// # Errors
    ///
    /// Returns the failure of the second attempt when both attempts failed at the
    /// transport level, or the first failure when it was not a transport failure.
    /// A non-2xx response is returned as `Ok`; use [`RemoteResponse::into_success`]
    /// to treat it as a failure.
    pub async fn call(&self, request: &RemoteRequest) -> Result<RemoteResponse, RemoteFailure> {
        match self.attempt(request, self.policy.base_timeout).await {
            Ok(response) => Ok(response),
            Err(failure) if failure.is_transport() => {
                let retry_timeout = self.policy.retry_timeout();
                debug!(
                    url = %request.url,
                    ?retry_timeout,
                    "Remote call failed ({}), retrying once",
                    failure
                );
                let mut response = self.attempt(request, retry_timeout).await?;
                response.attempts = 2;
                Ok(response)
            }
            Err(failure) => Err(failure),
        }
    }

    /// Call, require a 2xx status and decode the JSON body.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        request: &RemoteRequest,
    ) -> Result<T, RemoteFailure> {
        self.call(request).await?.into_success()?.json()
    }

    async fn attempt(
        &self,
        request: &RemoteRequest,
        timeout: Duration,
    ) -> Result<RemoteResponse, RemoteFailure> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match tokio::time::timeout(timeout, self.transport.send(request, timeout)).await {
            Ok(result) => result.map(|mut response| {
                response.attempts = 1;
                response
            }),
            Err(_) => Err(RemoteFailure::TimeoutOrNoResponse(format!(
                "timed out after {} ms",
                timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// What a scripted transport does on its next attempt.
    pub(crate) enum Step {
        Hang,
        Respond(u16, &'static str),
        Fail(RemoteFailure),
    }

    pub(crate) struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        pub(crate) timeouts: Mutex<Vec<Duration>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                timeouts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            _request: &RemoteRequest,
            timeout: Duration,
        ) -> Result<RemoteResponse, RemoteFailure> {
            self.timeouts.lock().unwrap().push(timeout);
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(status, body)) => Ok(RemoteResponse {
                    status,
                    body: body.to_string(),
                    attempts: 1,
                }),
                Some(Step::Fail(failure)) => Err(failure),
                Some(Step::Hang) | None => std::future::pending().await,
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(100), 1.5)
    }

    #[test]
    fn test_retry_timeout_is_escalated() {
        assert_eq!(policy().retry_timeout(), Duration::from_millis(150));
        assert_eq!(
            RetryPolicy::default().retry_timeout(),
            Duration::from_millis(10_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success_is_success() {
        let transport = ScriptedTransport::new(vec![Step::Hang, Step::Respond(200, "[]")]);
        let client = RemoteCallClient::with_transport(transport.clone(), policy());

        let response = client.call(&RemoteRequest::get("http://api.test/players")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.attempts, 2);
        assert_eq!(client.attempts_made(), 2);
        assert_eq!(
            *transport.timeouts.lock().unwrap(),
            vec![Duration::from_millis(100), Duration::from_millis(150)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_timeouts_fail_with_transport_failure() {
        let transport = ScriptedTransport::new(vec![Step::Hang, Step::Hang]);
        let client = RemoteCallClient::with_transport(transport, policy());

        let result = client.call(&RemoteRequest::get("http://api.test/players")).await;

        match result {
            Err(RemoteFailure::TimeoutOrNoResponse(msg)) => assert!(msg.contains("150")),
            other => panic!("Expected TimeoutOrNoResponse, got {:?}", other),
        }
        assert_eq!(client.attempts_made(), 2);
    }

    #[tokio::test]
    async fn test_setup_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Step::Fail(RemoteFailure::RequestSetup("bad header".into())),
            Step::Respond(200, "{}"),
        ]);
        let client = RemoteCallClient::with_transport(transport, policy());

        let result = client.call(&RemoteRequest::get("http://api.test")).await;

        assert!(matches!(result, Err(RemoteFailure::RequestSetup(_))));
        assert_eq!(client.attempts_made(), 1);
    }

    #[tokio::test]
    async fn test_http_error_status_is_returned_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/players")
            .with_status(404)
            .with_body("not here")
            .expect(1)
            .create_async()
            .await;

        let client = RemoteCallClient::new(reqwest::Client::new(), RetryPolicy::default());
        let response = client
            .call(&RemoteRequest::get(format!("{}/players", server.url())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.attempts, 1);
        assert_eq!(
            response.into_success().unwrap_err(),
            RemoteFailure::HttpStatus {
                code: 404,
                body: "not here".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_json_decodes_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/echo")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = RemoteCallClient::new(reqwest::Client::new(), RetryPolicy::default());
        let request = RemoteRequest::post(format!("{}/echo", server.url()), serde_json::json!({}))
            .header("x-api-key", "secret");
        let value: serde_json::Value = client.call_json(&request).await.unwrap();

        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_once() {
        let client = RemoteCallClient::new(
            reqwest::Client::new(),
            RetryPolicy::new(Duration::from_millis(500), 2.0),
        );

        let result = client.call(&RemoteRequest::get("http://127.0.0.1:1/")).await;

        assert!(matches!(result, Err(RemoteFailure::TimeoutOrNoResponse(_))));
        assert_eq!(client.attempts_made(), 2);
    }
}
