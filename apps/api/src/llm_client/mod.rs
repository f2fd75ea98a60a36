/// LLM Gateway: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the text-generation service directly.
/// All LLM interactions MUST go through `TextGenerator`.
///
/// Owns the only shared mutable state of the generation pipeline: the bearer-token cache.
/// Token refresh is single-flight. Rate-limit and upstream failures are NOT retried here;
/// callers decide what to do with them.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub mod prompts;

/// Default token-issuance endpoint (API key → bearer token exchange).
pub const DEFAULT_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const API_KEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
/// Used when the issuance response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("text generation request timed out")]
    Timeout,

    #[error("rate limited by text generation service")]
    RateLimited,

    #[error("upstream error (status {status:?}): {message}")]
    Upstream { status: Option<u16>, message: String },
}

/// Successful completion text.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
}

/// The seam between content generation and the external service.
///
/// `LlmGateway` is the production implementation; tests substitute scripted ones.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Completion, GatewayError>;
}

/// A cached bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// True while the token has more than `skew` left before it expires.
    pub fn is_fresh(&self, now: DateTime<Utc>, skew: chrono::Duration) -> bool {
        now + skew < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub api_url: String,
    pub token_url: String,
    pub api_key: String,
    pub token_expiry_skew: Duration,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// HTTP client for the text-generation service with a process-wide token cache.
pub struct LlmGateway {
    client: Client,
    settings: GatewaySettings,
    token: RwLock<Option<AuthToken>>,
    /// Held only while a refresh is in flight. Stores the last refresh failure so
    /// callers that waited on it share the outcome instead of retrying.
    refresh: Mutex<Option<GatewayError>>,
    /// Bumped after every refresh attempt.
    refresh_epoch: AtomicU64,
}

impl LlmGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            settings,
            token: RwLock::new(None),
            refresh: Mutex::new(None),
            refresh_epoch: AtomicU64::new(0),
        })
    }

    fn expiry_skew(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.token_expiry_skew)
            .unwrap_or_else(|_| chrono::Duration::seconds(60))
    }

    async fn cached_token(&self) -> Option<AuthToken> {
        let skew = self.expiry_skew();
        self.token
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh(Utc::now(), skew))
            .cloned()
    }

    /// Returns a usable token, refreshing under single-flight when the cache is stale.
    async fn token(&self) -> Result<AuthToken, GatewayError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let seen_epoch = self.refresh_epoch.load(Ordering::Acquire);
        let mut last_failure = self.refresh.lock().await;

        // Whoever held the lock before us may already have refreshed.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }
        if self.refresh_epoch.load(Ordering::Acquire) != seen_epoch {
            if let Some(err) = last_failure.clone() {
                return Err(err);
            }
        }

        let outcome = self.issue_token().await;
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(token) => {
                *last_failure = None;
                *self.token.write().await = Some(token.clone());
                info!(expires_at = %token.expires_at, "Issued new text generation token");
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "Token issuance failed");
                *last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drops the cached token if it is still the one that was rejected.
    async fn invalidate(&self, rejected: &str) {
        let mut slot = self.token.write().await;
        if slot.as_ref().is_some_and(|t| t.value == rejected) {
            *slot = None;
            debug!("Invalidated rejected token");
        }
    }

    async fn issue_token(&self) -> Result<AuthToken, GatewayError> {
        if self.settings.api_key.trim().is_empty() {
            return Err(GatewayError::Auth(
                "no API key configured for the text generation service".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", API_KEY_GRANT_TYPE),
                ("apikey", self.settings.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The issuer answers 400 for an unknown or revoked key.
            if status == StatusCode::BAD_REQUEST {
                return Err(GatewayError::Auth(format!("token issuance rejected: {body}")));
            }
            return Err(classify_status(status, body));
        }

        let payload: TokenResponse = response.json().await.map_err(transport_error)?;
        let lifetime = payload.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(AuthToken {
            value: payload.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        })
    }

    async fn post_completion(
        &self,
        token: &AuthToken,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, GatewayError> {
        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&token.value)
            .json(&CompletionRequest { prompt, max_tokens })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let payload: CompletionResponse = response.json().await.map_err(transport_error)?;
        if payload.generated_text.trim().is_empty() {
            return Err(GatewayError::Upstream {
                status: Some(status.as_u16()),
                message: "empty generated_text".to_string(),
            });
        }

        debug!(
            chars = payload.generated_text.len(),
            "Text generation call succeeded"
        );
        Ok(Completion {
            text: payload.generated_text,
        })
    }

    /// One completion, re-authenticating exactly once if the token is rejected.
    async fn complete_with_reauth(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, GatewayError> {
        let token = self.token().await?;
        match self.post_completion(&token, prompt, max_tokens).await {
            Err(GatewayError::Auth(reason)) => {
                warn!(%reason, "Token rejected by text generation service, re-authenticating once");
                self.invalidate(&token.value).await;
                let token = self.token().await?;
                self.post_completion(&token, prompt, max_tokens).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGateway {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Completion, GatewayError> {
        // Dropping the inner future on elapse abandons the in-flight HTTP request.
        match tokio::time::timeout(timeout, self.complete_with_reauth(prompt, max_tokens)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Text generation call timed out");
                Err(GatewayError::Timeout)
            }
        }
    }
}

fn classify_status(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Auth(format!("status {}: {body}", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
        _ => GatewayError::Upstream {
            status: Some(status.as_u16()),
            message: body,
        },
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Upstream {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode as AxumStatus},
        response::{IntoResponse, Response},
        routing::post,
        Form, Json, Router,
    };
    use serde_json::{json, Value};

    const API_KEY: &str = "test-api-key";

    #[derive(Default)]
    struct Counters {
        token_calls: AtomicUsize,
        completion_calls: AtomicUsize,
    }

    #[derive(Clone)]
    struct FakeService {
        counters: Arc<Counters>,
        completion_status: AxumStatus,
        token_delay: Duration,
        expires_in: i64,
    }

    impl FakeService {
        fn new() -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                completion_status: AxumStatus::OK,
                token_delay: Duration::from_millis(0),
                expires_in: 3600,
            }
        }
    }

    async fn fake_token(
        State(service): State<FakeService>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Response {
        let n = service.counters.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(service.token_delay).await;
        if form.get("apikey").map(String::as_str) != Some(API_KEY)
            || form.get("grant_type").map(String::as_str) != Some(API_KEY_GRANT_TYPE)
        {
            return (AxumStatus::BAD_REQUEST, "invalid api key").into_response();
        }
        Json(json!({ "access_token": format!("token-{n}"), "expires_in": service.expires_in }))
            .into_response()
    }

    async fn fake_generate(
        State(service): State<FakeService>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        service
            .counters
            .completion_calls
            .fetch_add(1, Ordering::SeqCst);
        if service.completion_status != AxumStatus::OK {
            return (service.completion_status, "upstream says no").into_response();
        }
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({
            "generated_text": format!("{auth} | {} | {}", body["prompt"], body["max_tokens"])
        }))
        .into_response()
    }

    async fn spawn_fake(service: FakeService) -> String {
        let app = Router::new()
            .route("/token", post(fake_token))
            .route("/generate", post(fake_generate))
            .with_state(service);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway(base: &str, api_key: &str) -> LlmGateway {
        LlmGateway::new(GatewaySettings {
            api_url: format!("{base}/generate"),
            token_url: format!("{base}/token"),
            api_key: api_key.to_string(),
            token_expiry_skew: Duration::from_secs(60),
        })
        .unwrap()
    }

    const CALL_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_completion_sends_bearer_token_and_payload() {
        let service = FakeService::new();
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        let completion = gw.complete("hello", 42, CALL_TIMEOUT).await.unwrap();

        assert!(completion.text.starts_with("Bearer token-1"));
        assert!(completion.text.contains("\"hello\""));
        assert!(completion.text.ends_with("42"));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let service = FakeService::new();
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        gw.complete("a", 10, CALL_TIMEOUT).await.unwrap();
        gw.complete("b", 10, CALL_TIMEOUT).await.unwrap();

        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_token_issuance() {
        let mut service = FakeService::new();
        service.token_delay = Duration::from_millis(100);
        let base = spawn_fake(service.clone()).await;
        let gw = Arc::new(gateway(&base, API_KEY));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.complete(&format!("p{i}"), 10, CALL_TIMEOUT).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_token_inside_expiry_skew_is_refreshed() {
        let mut service = FakeService::new();
        service.expires_in = 30; // shorter than the 60s skew
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        gw.complete("a", 10, CALL_TIMEOUT).await.unwrap();
        gw.complete("b", 10, CALL_TIMEOUT).await.unwrap();

        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_reauthenticates_exactly_once() {
        let mut service = FakeService::new();
        service.completion_status = AxumStatus::UNAUTHORIZED;
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        let err = gw.complete("x", 10, CALL_TIMEOUT).await.unwrap_err();

        assert!(matches!(err, GatewayError::Auth(_)));
        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let mut service = FakeService::new();
        service.completion_status = AxumStatus::TOO_MANY_REQUESTS;
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        let err = gw.complete("x", 10, CALL_TIMEOUT).await.unwrap_err();

        assert!(matches!(err, GatewayError::RateLimited));
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let mut service = FakeService::new();
        service.completion_status = AxumStatus::BAD_GATEWAY;
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        let err = gw.complete("x", 10, CALL_TIMEOUT).await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Upstream {
                status: Some(502),
                ..
            }
        ));
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_api_key_is_auth_error() {
        let service = FakeService::new();
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, "wrong-key");

        let err = gw.complete("x", 10, CALL_TIMEOUT).await.unwrap_err();

        assert!(matches!(err, GatewayError::Auth(_)));
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let gw = gateway("http://127.0.0.1:9", "");
        let err = gw.complete("x", 10, CALL_TIMEOUT).await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let mut service = FakeService::new();
        service.token_delay = Duration::from_secs(5);
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, API_KEY);

        let started = std::time::Instant::now();
        let err = gw
            .complete("x", 10, Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_share_a_failed_refresh() {
        let mut service = FakeService::new();
        service.token_delay = Duration::from_millis(200);
        let base = spawn_fake(service.clone()).await;
        let gw = Arc::new(gateway(&base, "revoked-key"));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.complete("p", 10, CALL_TIMEOUT).await })
            })
            .collect();
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, GatewayError::Auth(_)));
        }

        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.counters.completion_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_retried_by_the_next_caller() {
        let service = FakeService::new();
        let base = spawn_fake(service.clone()).await;
        let gw = gateway(&base, "revoked-key");

        gw.complete("a", 10, CALL_TIMEOUT).await.unwrap_err();
        gw.complete("b", 10, CALL_TIMEOUT).await.unwrap_err();

        assert_eq!(service.counters.token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_a_newer_token() {
        let gw = gateway("http://127.0.0.1:9", API_KEY);
        let fresh = AuthToken {
            value: "token-2".to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(3600),
        };
        *gw.token.write().await = Some(fresh.clone());

        gw.invalidate("token-1").await;
        assert_eq!(gw.token.read().await.as_ref(), Some(&fresh));
        assert_eq!(gw.token().await.unwrap(), fresh);

        gw.invalidate("token-2").await;
        assert!(gw.token.read().await.is_none());
    }

    #[test]
    fn test_token_freshness_respects_skew() {
        let now = Utc::now();
        let token = AuthToken {
            value: "t".to_string(),
            expires_at: now + chrono::Duration::seconds(90),
        };
        assert!(token.is_fresh(now, chrono::Duration::seconds(60)));
        assert!(!token.is_fresh(now, chrono::Duration::seconds(120)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            GatewayError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            GatewayError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            GatewayError::Upstream {
                status: Some(500),
                ..
            }
        ));
    }
}
