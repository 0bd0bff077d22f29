//! Authenticated, rate-limited API client
//!
//! [`ApiClient`] composes an HTTP transport, a bearer token and a shared
//! [`TokenBucket`]. It exposes a single authenticated GET, with an optional body, and a way to release
//! pooled connections; the transport itself stays private.

use super::endpoint::{validate_endpoint, EndpointPolicy};
use super::limiter::TokenBucket;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Response status
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// The raw `Retry-After` header value, if present and non-empty
    pub fn retry_after(&self) -> Option<&str> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Source of raw API responses
///
/// The export pipeline only depends on this trait, so tests can script responses
/// without a network.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Performs one authenticated GET against `url`, sending `body` when given
    async fn request(
        &self,
        url: &str,
        body: Option<Vec<u8>>,
        signal: &ShutdownSignal,
    ) -> Result<ApiResponse>;

    /// Performs one authenticated GET without a body
    async fn get(&self, url: &str, signal: &ShutdownSignal) -> Result<ApiResponse> {
        self.request(url, None, signal).await
    }

    /// Releases idle pooled connections
    fn close_idle_connections(&self) {}
}

/// Settings for [`ApiClient`]
#[derive(Debug, Clone)]
pub struct ApiClientOptions {
    /// Sustained request budget per minute (also the burst size)
    pub requests_per_minute: u32,

    /// Bound applied to every request, independent of cancellation
    pub request_timeout: Duration,

    /// URL validation rules
    pub endpoint_policy: EndpointPolicy,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            requests_per_minute: 150,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint_policy: EndpointPolicy::default(),
        }
    }
}

/// HTTP client with bearer authentication and client-side rate limiting
pub struct ApiClient {
    transport: RwLock<Client>,
    token: SecretString,
    limiter: Arc<TokenBucket>,
    options: ApiClientOptions,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("token", &"[REDACTED]")
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the rate is zero or the transport cannot be
    /// built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use resource_exporter::adapters::api::{ApiClient, ApiClientOptions};
    /// use secrecy::SecretString;
    ///
    /// # fn example() -> resource_exporter::domain::Result<()> {
    /// let token = SecretString::new("0/abcdef".to_string());
    /// let client = ApiClient::new(token, ApiClientOptions::default())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(token: SecretString, options: ApiClientOptions) -> Result<Self> {
        let limiter = Arc::new(TokenBucket::per_minute(options.requests_per_minute)?);
        let transport = build_transport(options.request_timeout)?;

        Ok(Self {
            transport: RwLock::new(transport),
            token,
            limiter,
            options,
        })
    }

    /// The shared rate limiter
    pub fn limiter(&self) -> &Arc<TokenBucket> {
        &self.limiter
    }

    fn transport(&self) -> Client {
        match self.transport.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn build_transport(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| ExporterError::Configuration(format!("Failed to build HTTP client: {e}")))
}

#[async_trait]
impl ResourceApi for ApiClient {
    async fn request(
        &self,
        url: &str,
        body: Option<Vec<u8>>,
        signal: &ShutdownSignal,
    ) -> Result<ApiResponse> {
        validate_endpoint(url, self.options.endpoint_policy)?;

        if signal.is_cancelled() {
            return Err(ExporterError::Cancelled);
        }

        let waited = self.limiter.acquire(signal).await?;
        if !waited.is_zero() {
            tracing::debug!(waited_ms = waited.as_millis() as u64, "rate limiter admitted request");
        }

        let mut request = self
            .transport()
            .get(url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            );
        if let Some(body) = body {
            request = request.body(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(ApiResponse {
                status,
                headers,
                body,
            })
        };

        tokio::select! {
            biased;
            _ = signal.cancelled() => Err(ExporterError::Cancelled),
            result = exchange => match result {
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status.as_u16(), "request completed");
                    Ok(response)
                }
                Err(_) if signal.is_cancelled() => Err(ExporterError::Cancelled),
                Err(e) => Err(ExporterError::from(e).with_context("do request")),
            },
        }
    }

    fn close_idle_connections(&self) {
        // Replacing the transport drops the old pool once in-flight requests release it.
        match build_transport(self.options.request_timeout) {
            Ok(fresh) => {
                let mut guard = match self.transport.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *guard = fresh;
                tracing::debug!("closed idle connections");
            }
            Err(e) => tracing::warn!(error = %e, "failed to rebuild HTTP client"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn loopback_options(rate: u32) -> ApiClientOptions {
        ApiClientOptions {
            requests_per_minute: rate,
            request_timeout: Duration::from_secs(5),
            endpoint_policy: EndpointPolicy {
                allow_loopback: true,
                ..Default::default()
            },
        }
    }

    fn token() -> SecretString {
        SecretString::new("test-token".to_string())
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(token(), loopback_options(60)).unwrap();
        let response = client
            .get(&format!("{}/projects", server.url()), &ShutdownSignal::never())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, br#"{"data":[]}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_forwards_optional_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects")
            .match_header("authorization", "Bearer test-token")
            .match_body(r#"{"opt_fields":"name"}"#)
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(token(), loopback_options(60)).unwrap();
        let response = client
            .request(
                &format!("{}/projects", server.url()),
                Some(br#"{"opt_fields":"name"}"#.to_vec()),
                &ShutdownSignal::never(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_returns_non_success_as_is() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects")
            .with_status(429)
            .with_header("Retry-After", "7")
            .create_async()
            .await;

        let client = ApiClient::new(token(), loopback_options(60)).unwrap();
        let response = client
            .get(&format!("{}/projects", server.url()), &ShutdownSignal::never())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.retry_after(), Some("7"));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_rejected_before_network() {
        let client = ApiClient::new(token(), ApiClientOptions::default()).unwrap();
        for url in ["", "ftp://example.test", "http://localhost/projects"] {
            let err = client.get(url, &ShutdownSignal::never()).await.unwrap_err();
            assert!(matches!(err, ExporterError::InvalidEndpoint(_)), "{url}");
        }
        assert_eq!(client.limiter().available().await.floor(), 150.0);
    }

    #[tokio::test]
    async fn test_get_cancelled_before_start() {
        let client = ApiClient::new(token(), ApiClientOptions::default()).unwrap();
        let (trigger, signal) = ShutdownSignal::new();
        trigger.trigger();

        let err = client
            .get("https://example.test/api/projects", &signal)
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::Cancelled));
    }

    #[tokio::test]
    async fn test_get_rate_limit_wait_cancelled() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = Arc::new(ApiClient::new(token(), loopback_options(1)).unwrap());
        let url = format!("{}/projects", server.url());
        let (trigger, signal) = ShutdownSignal::new();

        client.get(&url, &signal).await.unwrap();

        let pending = {
            let client = client.clone();
            let signal = signal.clone();
            let url = url.clone();
            tokio::spawn(async move { client.get(&url, &signal).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.trigger();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ExporterError::RateLimitWait));
    }

    #[tokio::test]
    async fn test_close_idle_connections_keeps_client_usable() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/users")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .expect(2)
            .create_async()
            .await;

        let client = ApiClient::new(token(), loopback_options(60)).unwrap();
        let url = format!("{}/users", server.url());
        client.get(&url, &ShutdownSignal::never()).await.unwrap();
        client.close_idle_connections();
        client.get(&url, &ShutdownSignal::never()).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ApiClient::new(token(), ApiClientOptions::default()).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("test-token"));
        assert!(debug.contains("REDACTED"));
    }
}
