//! HTTP Client Abstraction
//!
//! Provides async HTTP operations plus the transport retry policy shared by
//! every provider call.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    /// When false the client must hand back 3xx responses untouched.
    pub follow_redirects: bool,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            follow_redirects: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets `Authorization: Bearer <token>`. An empty token leaves the
    /// request unauthenticated.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        if token.is_empty() {
            return self;
        }
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Encodes `fields` as `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, fields: &T) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(fields).map_err(|e| {
            BridgeError::OperationFailed(format!("Form serialization failed: {}", e))
        })?;
        self.body = Some(Bytes::from(encoded));
        self.headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        Ok(self)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn no_redirect(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// HTTP response
///
/// Header names are lower-cased. Repeated `set-cookie` headers are joined
/// with `\n`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers.get(&name).map(String::as_str)
    }

    /// Individual `Set-Cookie` values carried by this response.
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.header("set-cookie")
            .into_iter()
            .flat_map(|value| value.split('\n'))
            .filter(|value| !value.is_empty())
    }

    fn expects_body(&self) -> bool {
        !self.is_redirect() && self.status != 204
    }
}

/// Transport retry policy: a fixed delay between a bounded number of extra
/// attempts. Only timeouts and empty bodies are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Delay before each additional attempt
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Async HTTP client trait
///
/// Implementations only need to provide [`execute`](HttpClient::execute);
/// the retrying variant is layered on top of it. Dropping the returned
/// future cancels any pending attempts.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
///
/// async fn fetch(client: &dyn HttpClient, token: &str) -> Result<String> {
///     let request = HttpRequest::get("https://api.example.com/data").bearer_token(token);
///     client.execute_with_retry(request, RetryPolicy::default()).await?.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request once
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Timeout`] when the request timed out and
    /// [`BridgeError::OperationFailed`] for any other transport failure.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute an HTTP request, retrying timeouts and empty bodies
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            let outcome = match self.execute(request.clone()).await {
                Ok(response)
                    if response.body.is_empty()
                        && response.expects_body()
                        && request.method != HttpMethod::Head =>
                {
                    Err(BridgeError::EmptyResponse(request.url.clone()))
                }
                other => other,
            };

            match outcome {
                Err(err) if err.is_transient() && attempt < policy.max_retries => {
                    attempt += 1;
                    warn!(
                        url = %request.url,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "Transient HTTP failure, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::Sequence;

    mock! {
        Client {}

        #[async_trait]
        impl HttpClient for Client {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        }
    }

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .bearer_token("secret")
            .query("page", 2)
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer secret".to_string())
        );
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert!(request.follow_redirects);
    }

    #[test]
    fn test_empty_bearer_token_is_skipped() {
        let request = HttpRequest::get("https://example.com").bearer_token("");
        assert!(!request.headers.contains_key("Authorization"));
    }

    #[test]
    fn test_form_body() {
        let request = HttpRequest::post("https://example.com/token")
            .form(&[("grant_type", "refresh_token"), ("refresh_token", "a b")])
            .unwrap();

        assert_eq!(
            request.body.as_deref(),
            Some(&b"grant_type=refresh_token&refresh_token=a+b"[..])
        );
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_set_cookies_split() {
        let mut headers = HashMap::new();
        headers.insert(
            "set-cookie".to_string(),
            "JSESSIONID=abc; Path=/\nCOOKIE_LOGIN_USER=xyz".to_string(),
        );
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        let cookies: Vec<_> = response.set_cookies().collect();
        assert_eq!(cookies, vec!["JSESSIONID=abc; Path=/", "COOKIE_LOGIN_USER=xyz"]);
        assert!(response.header("Set-Cookie").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_empty_body_then_succeeds() {
        let mut client = MockClient::new();
        let mut seq = Sequence::new();
        client
            .expect_execute()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, "")));
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, "{}")));

        let result = client
            .execute_with_retry(HttpRequest::get("https://example.com"), RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(result.body, Bytes::from("{}"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_bounded() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(4)
            .returning(|req| Err(BridgeError::Timeout(req.url)));

        let err = client
            .execute_with_retry(HttpRequest::get("https://example.com"), RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_retry_during_backoff_stops_attempts() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|req| Err(BridgeError::Timeout(req.url)));

        // Backoff is 1s; the caller gives up after the first attempt
        let outcome = tokio::time::timeout(
            Duration::from_millis(500),
            client.execute_with_retry(HttpRequest::get("https://example.com"), RetryPolicy::default()),
        )
        .await;
        assert!(outcome.is_err());

        tokio::time::advance(Duration::from_secs(10)).await;
        client.checkpoint();
    }

    #[tokio::test]
    async fn test_non_transient_errors_are_not_retried() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("tls".into())));

        let err = client
            .execute_with_retry(HttpRequest::get("https://example.com"), RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_redirect_with_empty_body_is_returned() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(302, "")));

        let result = client
            .execute_with_retry(
                HttpRequest::get("https://example.com").no_redirect(),
                RetryPolicy::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, 302);
    }
}
