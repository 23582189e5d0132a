use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use url::Url;

use crate::app::{Result, SyncError};
use crate::config::HttpConfig;
use crate::fetcher::{HttpResponse, RequestOptions};

/// The remote platform's reset header is not consulted; callers get a fixed estimate.
const RATE_LIMIT_RESET_SECS: i64 = 60;
const MAX_ERROR_BODY: usize = 300;

pub struct RequestExecutor {
    client: Client,
    defaults: HttpConfig,
}

/// Why a single attempt did not produce a 2xx response.
#[derive(Debug)]
enum AttemptFailure {
    Timeout,
    Transport(reqwest::Error),
    Status(HttpResponse),
}

impl AttemptFailure {
    fn is_transient(&self) -> bool {
        match self {
            AttemptFailure::Timeout | AttemptFailure::Transport(_) => true,
            AttemptFailure::Status(response) => response.status.is_server_error(),
        }
    }

    fn classify(self) -> SyncError {
        match self {
            AttemptFailure::Timeout => SyncError::timeout(),
            AttemptFailure::Transport(err) => SyncError::Network(err.to_string()),
            AttemptFailure::Status(response) => classify_status(response),
        }
    }
}

fn classify_status(response: HttpResponse) -> SyncError {
    match response.status {
        StatusCode::TOO_MANY_REQUESTS => SyncError::RateLimit {
            reset_at: Utc::now() + chrono::Duration::seconds(RATE_LIMIT_RESET_SECS),
        },
        StatusCode::UNAUTHORIZED => SyncError::Authentication(format!(
            "HTTP 401: {}",
            truncate(&response.body)
        )),
        StatusCode::FORBIDDEN => SyncError::Forbidden(format!("HTTP 403: {}", truncate(&response.body))),
        StatusCode::NOT_FOUND => SyncError::NotFound(format!("HTTP 404: {}", truncate(&response.body))),
        status => SyncError::Unknown(format!("HTTP {}: {}", status, truncate(&response.body))),
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Delay before retry number `attempt + 1`: linear in the attempt index.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt.saturating_add(1))
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| SyncError::Validation(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(SyncError::Validation(format!(
            "unsupported URL scheme '{}' in '{}'",
            scheme, raw
        ))),
    }
}

impl RequestExecutor {
    pub fn new(defaults: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(defaults.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, defaults })
    }

    /// Options pre-filled with the configured timeout and retry policy.
    pub fn request(&self, method: Method) -> RequestOptions {
        RequestOptions {
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: self.defaults.timeout(),
            max_retries: self.defaults.max_retries,
            retry_delay: self.defaults.retry_delay(),
        }
    }

    pub fn get(&self) -> RequestOptions {
        self.request(Method::GET)
    }

    pub fn post(&self) -> RequestOptions {
        self.request(Method::POST)
    }

    pub fn patch(&self) -> RequestOptions {
        self.request(Method::PATCH)
    }

    pub async fn execute(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        let url = parse_url(url)?;
        let mut attempt: u32 = 0;

        loop {
            tracing::debug!(attempt = attempt + 1, method = %options.method, %url, "sending request");

            match self.attempt(&url, &options).await {
                Ok(response) => {
                    tracing::debug!(attempt = attempt + 1, %url, status = %response.status, "request succeeded");
                    return Ok(response);
                }
                Err(failure) if failure.is_transient() && attempt < options.max_retries => {
                    let delay = backoff_delay(options.retry_delay, attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        %url,
                        failure = ?failure,
                        delay_ms = delay.as_millis() as u64,
                        "transient request failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(failure) => {
                    let err = failure.classify();
                    tracing::warn!(attempt = attempt + 1, %url, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> std::result::Result<HttpResponse, AttemptFailure> {
        let mut request = self
            .client
            .request(options.method.clone(), url.as_str())
            .headers(options.headers.clone());

        if let Some(body) = &options.body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        };

        match tokio::time::timeout(options.timeout, exchange).await {
            Err(_) => Err(AttemptFailure::Timeout),
            Ok(Err(err)) if err.is_timeout() => Err(AttemptFailure::Timeout),
            Ok(Err(err)) => Err(AttemptFailure::Transport(err)),
            Ok(Ok(response)) if response.status.is_success() => Ok(response),
            Ok(Ok(response)) => Err(AttemptFailure::Status(response)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::app::ErrorKind;
    use crate::domain::Credential;

    fn executor() -> RequestExecutor {
        RequestExecutor::new(HttpConfig {
            timeout_ms: 2_000,
            max_retries: 2,
            retry_delay_ms: 5,
            ..HttpConfig::default()
        })
        .expect("executor")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"value\":1}"))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor();
        let response = executor
            .execute(&format!("{}/ok", server.uri()), executor.get())
            .await
            .expect("response");

        assert_eq!(response.status, StatusCode::OK);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["value"], 1);
    }

    #[tokio::test]
    async fn rejects_malformed_url_without_network() {
        let executor = executor();

        let err = executor.execute("not a url", executor.get()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = executor
            .execute("ftp://example.com/file", executor.get())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(502)
                } else {
                    ResponseTemplate::new(200).set_body_string("done")
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let executor = executor();
        let response = executor
            .execute(&server.uri(), executor.get())
            .await
            .expect("response");

        assert_eq!(response.body, "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let executor = executor();
        let err = executor.execute(&server.uri(), executor.get()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn no_retry_sends_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor();
        let result = executor
            .execute(&server.uri(), executor.post().no_retry())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn classifies_client_errors_without_retry() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/private"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor();
        let uri = server.uri();

        let err = executor
            .execute(&format!("{}/missing", uri), executor.get())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = executor
            .execute(&format!("{}/private", uri), executor.get())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let err = executor
            .execute(&format!("{}/forbidden", uri), executor.get())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn rate_limit_estimates_reset_a_minute_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor();
        let before = Utc::now();
        let err = executor.execute(&server.uri(), executor.get()).await.unwrap_err();

        match err {
            SyncError::RateLimit { reset_at } => {
                let ahead = reset_at - before;
                assert!(ahead >= chrono::Duration::seconds(59));
                assert!(ahead <= chrono::Duration::seconds(61));
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let executor = executor();
        let options = executor
            .get()
            .timeout(Duration::from_millis(50))
            .no_retry();
        let err = executor.execute(&server.uri(), options).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Network error: timeout");
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = executor();
        let err = executor
            .execute(&format!("http://{}", addr), executor.get())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn sends_json_body_and_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"body": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let executor = executor();
        let options = executor
            .post()
            .json(&json!({"body": "hello"}))
            .unwrap()
            .bearer(&Credential::new("ghp_test"))
            .unwrap();

        let response = executor.execute(&server.uri(), options).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn waits_linear_backoff_between_attempts() {
        let server = MockServer::start().await;
        let arrivals = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorder = arrivals.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                recorder.lock().unwrap().push(std::time::Instant::now());
                ResponseTemplate::new(503)
            })
            .mount(&server)
            .await;

        let executor = executor();
        let mut options = executor.get().retries(2);
        options.retry_delay = Duration::from_millis(40);

        let err = executor.execute(&server.uri(), options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let arrivals = arrivals.lock().unwrap().clone();
        assert_eq!(arrivals.len(), 3);
        assert!(arrivals[1] - arrivals[0] >= Duration::from_millis(40));
        assert!(arrivals[2] - arrivals[1] >= Duration::from_millis(80));
    }

    #[test]
    fn backoff_is_linear() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(300));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_BODY + 10);
        assert_eq!(truncate(&long).chars().count(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
