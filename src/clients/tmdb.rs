//! TMDB transport adapter.
//!
//! Every request carries the locale parameter and the API key; rate-limit
//! and server errors get one randomized-backoff retry before surfacing.
//! The wire call itself sits behind [`HttpBackend`] so the policy can be
//! exercised without a network.

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::{RetryConfig, TmdbConfig};
use crate::domain::MovieId;
use crate::models::{Genre, Movie, MovieDetails};

pub const TMDB_API: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("TMDB returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode TMDB response: {0}")]
    Decode(String),
}

impl TmdbError {
    /// HTTP status carried by the error, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting (429) and server errors (5xx) are worth one more try.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == 429 || (*status >= 500 && *status < 600))
    }

    /// Everything except a missing credential is a transport failure.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    fn from_response(response: &ApiResponse) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            status_message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(&response.body)
            .ok()
            .and_then(|b| b.status_message)
            .unwrap_or_else(|| response.body.chars().take(200).collect());

        Self::Status {
            status: response.status,
            message,
        }
    }
}

/// Outbound request after default parameters have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one request and reports whatever status came back.
///
/// Implementations only fail with [`TmdbError::Network`]; HTTP error statuses
/// are returned as responses so the client can apply its retry policy.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TmdbError>;
}

/// Production backend on a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: Client,
    base_url: String,
}

impl ReqwestBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TmdbError> {
        Url::parse(base_url)
            .map_err(|e| TmdbError::Configuration(format!("invalid base URL {base_url}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf-8"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent("Cinelist/1.0")
            .build()
            .map_err(|e| TmdbError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, TmdbError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|e| TmdbError::Network(format!("invalid request URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TmdbError> {
        let url = self.url_for(request)?;

        let response = self
            .client
            .request(request.method.clone(), url)
            .send()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        Ok(ApiResponse { status, body })
    }
}

/// Where the API key comes from.
#[derive(Debug, Clone, Default)]
pub struct ApiKeySource {
    pub inline: Option<String>,
    pub env_var: String,
}

impl ApiKeySource {
    #[must_use]
    pub fn from_env(env_var: impl Into<String>) -> Self {
        Self {
            inline: None,
            env_var: env_var.into(),
        }
    }

    #[must_use]
    pub fn inline(key: impl Into<String>) -> Self {
        Self {
            inline: Some(key.into()),
            env_var: String::new(),
        }
    }

    /// Inline key first, then the environment. Empty values count as absent.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        self.inline
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                if self.env_var.is_empty() {
                    return None;
                }
                std::env::var(&self.env_var)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }
}

/// Bounded retry budget with a uniformly random backoff window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_min: Duration::from_millis(config.backoff_min_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay in `[backoff_min, backoff_max)`.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        if self.backoff_max <= self.backoff_min {
            return self.backoff_min;
        }
        rand::rng().random_range(self.backoff_min..self.backoff_max)
    }
}

#[derive(Deserialize)]
struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Clone)]
pub struct TmdbClient {
    backend: Arc<dyn HttpBackend>,
    api_key: ApiKeySource,
    language: String,
    retry: RetryPolicy,
}

impl TmdbClient {
    #[must_use]
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        api_key: ApiKeySource,
        language: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            api_key,
            language: language.into(),
            retry,
        }
    }

    pub fn from_config(tmdb: &TmdbConfig, retry: &RetryConfig) -> Result<Self, TmdbError> {
        let backend = ReqwestBackend::new(&tmdb.base_url, tmdb.timeout())?;
        let api_key = ApiKeySource {
            inline: tmdb.api_key.clone(),
            env_var: tmdb.api_key_env.clone(),
        };

        Ok(Self::new(
            Arc::new(backend),
            api_key,
            tmdb.language.clone(),
            RetryPolicy::from(retry),
        ))
    }

    /// Issues a request with default parameters and the retry policy applied.
    ///
    /// Fails with [`TmdbError::Configuration`] before touching the network if
    /// no API key is available.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, TmdbError> {
        let api_key = self.api_key.resolve().ok_or_else(|| {
            TmdbError::Configuration(format!(
                "API key is required (set {} or tmdb.api_key)",
                if self.api_key.env_var.is_empty() {
                    "an API key"
                } else {
                    self.api_key.env_var.as_str()
                }
            ))
        })?;

        let mut all_params = Vec::with_capacity(params.len() + 2);
        all_params.push(("language".to_string(), self.language.clone()));
        all_params.extend(params.iter().map(|(k, v)| ((*k).to_string(), v.clone())));
        all_params.push(("api_key".to_string(), api_key));

        let request = ApiRequest {
            method,
            path: path.to_string(),
            params: all_params,
        };

        let mut retries = 0;
        loop {
            let response = self.backend.send(&request).await?;

            if (200..300).contains(&response.status) {
                if retries > 0 {
                    debug!(path, retries, "Request succeeded after retry");
                }
                return serde_json::from_str(&response.body)
                    .map_err(|e| TmdbError::Decode(e.to_string()));
            }

            let error = TmdbError::from_response(&response);
            if !error.is_retryable() || retries >= self.retry.max_retries {
                return Err(error);
            }

            retries += 1;
            let delay = self.retry.backoff();
            warn!(
                path,
                status = response.status,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "TMDB request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let value = self.request(Method::GET, path, params).await?;
        serde_json::from_value(value).map_err(|e| TmdbError::Decode(e.to_string()))
    }

    pub async fn top_rated(&self, page: usize) -> Result<Vec<Movie>, TmdbError> {
        let response: PagedResponse<Movie> = self
            .get("/movie/top_rated", &[("page", page.to_string())])
            .await?;
        Ok(response.results)
    }

    pub async fn genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let response: GenreListResponse = self.get("/genre/movie/list", &[]).await?;
        Ok(response.genres)
    }

    pub async fn movie_details(&self, id: MovieId) -> Result<MovieDetails, TmdbError> {
        self.get(&format!("/movie/{id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ApiResponse, TmdbError>>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Result<ApiResponse, TmdbError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpBackend for ScriptedBackend {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TmdbError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TmdbError::Network("script exhausted".to_string())))
        }
    }

    fn reply(status: u16, body: &str) -> Result<ApiResponse, TmdbError> {
        Ok(ApiResponse {
            status,
            body: body.to_string(),
        })
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            backoff_min: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    fn client(backend: Arc<ScriptedBackend>) -> TmdbClient {
        TmdbClient::new(backend, ApiKeySource::inline("secret"), "en-US", no_wait())
    }

    #[tokio::test]
    async fn retries_once_after_server_error() {
        let backend = ScriptedBackend::with(vec![
            reply(503, "unavailable"),
            reply(200, r#"{"results": [{"id": 1, "title": "Heat"}]}"#),
        ]);
        let movies = client(backend.clone()).top_rated(1).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Heat");
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn page_without_results_decodes_as_empty() {
        let backend = ScriptedBackend::with(vec![
            reply(200, r#"{"page": 14, "total_pages": 13}"#),
            reply(200, r#"{"page": 15, "results": []}"#),
        ]);
        let client = client(backend);

        assert!(client.top_rated(14).await.unwrap().is_empty());
        assert!(client.top_rated(15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_server_error_surfaces_status() {
        let backend = ScriptedBackend::with(vec![reply(503, "down"), reply(503, "still down")]);
        let err = client(backend.clone()).top_rated(1).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.is_transport());
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let backend = ScriptedBackend::with(vec![
            reply(429, r#"{"status_message": "Too many requests"}"#),
            reply(200, r#"{"genres": [{"id": 18, "name": "Drama"}]}"#),
        ]);
        let genres = client(backend.clone()).genres().await.unwrap();

        assert_eq!(genres[0].name, "Drama");
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let backend = ScriptedBackend::with(vec![reply(
            404,
            r#"{"status_code": 34, "status_message": "The resource you requested could not be found."}"#,
        )]);
        let err = client(backend.clone())
            .movie_details(MovieId::new(9))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("could not be found"));
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn network_errors_are_not_retried() {
        let backend = ScriptedBackend::with(vec![
            Err(TmdbError::Network("connection reset".to_string())),
            reply(200, "{}"),
        ]);
        let err = client(backend.clone()).genres().await.unwrap_err();

        assert!(matches!(err, TmdbError::Network(_)));
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_network() {
        let backend = ScriptedBackend::with(vec![reply(200, "{}")]);
        let client = TmdbClient::new(
            backend.clone(),
            ApiKeySource::from_env("CINELIST_TEST_UNSET_API_KEY_VARIABLE"),
            "en-US",
            no_wait(),
        );

        let err = client.genres().await.unwrap_err();
        assert!(matches!(err, TmdbError::Configuration(_)));
        assert!(!err.is_transport());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn default_parameters_are_injected() {
        let backend = ScriptedBackend::with(vec![reply(200, r#"{"results": []}"#)]);
        client(backend.clone()).top_rated(3).await.unwrap();

        let request = &backend.requests()[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/movie/top_rated");
        assert_eq!(request.param("page"), Some("3"));
        assert_eq!(request.param("language"), Some("en-US"));
        assert_eq!(request.param("api_key"), Some("secret"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let backend = ScriptedBackend::with(vec![reply(200, "<html>")]);
        let err = client(backend).genres().await.unwrap_err();
        assert!(matches!(err, TmdbError::Decode(_)));
    }

    #[test]
    fn backoff_stays_in_window() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let delay = policy.backoff();
            assert!(delay >= Duration::from_millis(600));
            assert!(delay < Duration::from_millis(1000));
        }
    }

    #[test]
    fn retryable_statuses() {
        let status = |status| TmdbError::Status {
            status,
            message: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(599).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!TmdbError::Network("x".to_string()).is_retryable());
    }

    #[test]
    fn inline_key_wins_and_blank_is_absent() {
        assert_eq!(ApiKeySource::inline("k").resolve().as_deref(), Some("k"));
        assert_eq!(ApiKeySource::inline("  ").resolve(), None);
        assert_eq!(ApiKeySource::default().resolve(), None);
    }

    #[test]
    fn reqwest_backend_builds_query() {
        let backend =
            ReqwestBackend::new("https://api.themoviedb.org/3/", Duration::from_secs(8)).unwrap();
        let url = backend
            .url_for(&ApiRequest {
                method: Method::GET,
                path: "/movie/top_rated".to_string(),
                params: vec![
                    ("language".to_string(), "en-US".to_string()),
                    ("page".to_string(), "2".to_string()),
                ],
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/top_rated?language=en-US&page=2"
        );
    }
}
