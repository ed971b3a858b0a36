//! HTTP client for the local avatar backend
//!
//! Wraps reqwest::Client with the backend's endpoint layout. Every call is made
//! exactly once: no retries, no timeouts beyond what the transport applies.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::BackendError;
use super::{Answer, AudioClip, AvatarBackend, VideoClip};
use crate::models::AvatarIdentity;

// -- Wire types --

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    response: Option<String>,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    avatar: &'a str,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    audio_file: Option<String>,
}

#[derive(Serialize)]
struct AnimateRequest<'a> {
    avatar: &'a str,
    audio_file: &'a str,
}

#[derive(Deserialize)]
struct AnimateResponse {
    video_file: Option<String>,
}

#[derive(Deserialize)]
struct AvatarsResponse {
    #[serde(default)]
    avatars: Vec<AvatarIdentity>,
}

/// Resolved endpoint URLs, computed once from the base.
#[derive(Debug, Clone)]
struct Endpoints {
    avatars: Url,
    ask: Url,
    synthesize: Url,
    animate: Url,
}

/// Client for the avatar backend HTTP service.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    endpoints: Endpoints,
}

impl BackendClient {
    /// Build a client rooted at `base` (e.g. `http://localhost:5000/`).
    pub fn new(base: Url) -> Result<Self, url::ParseError> {
        let base = super::with_trailing_slash(base);
        let endpoints = Endpoints {
            avatars: base.join("avatars")?,
            ask: base.join("ask")?,
            synthesize: base.join("synthesize")?,
            animate: base.join("animate")?,
        };

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            endpoints,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, BackendError> {
        tracing::debug!("Backend GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| network(url, e))?;

        decode(check_response(resp, url).await?, url).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<T, BackendError> {
        tracing::debug!("Backend POST {}", url);

        let resp = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| network(url, e))?;

        decode(check_response(resp, url).await?, url).await
    }
}

#[async_trait]
impl AvatarBackend for BackendClient {
    async fn ask(&self, question: &str) -> Result<Answer, BackendError> {
        let url = &self.endpoints.ask;
        let resp: AskResponse = self.post_json(url, &AskRequest { question }).await?;
        let text = non_empty(resp.response, url, "response")?;
        Ok(Answer { text })
    }

    async fn synthesize(&self, text: &str, avatar: &str) -> Result<AudioClip, BackendError> {
        let url = &self.endpoints.synthesize;
        let resp: SynthesizeResponse = self
            .post_json(url, &SynthesizeRequest { text, avatar })
            .await?;
        let file = non_empty(resp.audio_file, url, "audio_file")?;
        Ok(AudioClip { file })
    }

    async fn animate(&self, avatar: &str, audio_file: &str) -> Result<VideoClip, BackendError> {
        let url = &self.endpoints.animate;
        let resp: AnimateResponse = self
            .post_json(url, &AnimateRequest { avatar, audio_file })
            .await?;
        let file = non_empty(resp.video_file, url, "video_file")?;
        Ok(VideoClip { file })
    }

    async fn list_avatars(&self) -> Result<Vec<AvatarIdentity>, BackendError> {
        let resp: AvatarsResponse = self.get_json(&self.endpoints.avatars).await?;
        Ok(resp.avatars)
    }

    async fn health_check(&self) -> bool {
        let url = &self.endpoints.avatars;
        tracing::debug!("Backend health GET {}", url);

        match self.http.get(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::debug!("Health check got HTTP {}", resp.status().as_u16());
                false
            }
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                false
            }
        }
    }
}

fn network(url: &Url, source: reqwest::Error) -> BackendError {
    BackendError::NetworkUnavailable {
        url: url.to_string(),
        source,
    }
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(
    resp: reqwest::Response,
    url: &Url,
) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendError::RequestFailed {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

/// Read the body and decode it. Transport errors stay network errors;
/// anything that does not parse is an empty result.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response, url: &Url) -> Result<T, BackendError> {
    let bytes = resp.bytes().await.map_err(|e| network(url, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| BackendError::empty(url.as_str(), format!("invalid JSON: {}", e)))
}

fn non_empty(value: Option<String>, url: &Url, field: &str) -> Result<String, BackendError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(BackendError::empty(url.as_str(), format!("`{}` is empty", field))),
        None => Err(BackendError::empty(url.as_str(), format!("`{}` is missing", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    /// A base URL nothing is listening on.
    async fn dead_url() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn happy_backend() -> Router {
        Router::new()
            .route(
                "/avatars",
                get(|| async {
                    Json(json!({"avatars": [{"name": "Art - Bob Ross", "filename": "Art"}]}))
                }),
            )
            .route(
                "/ask",
                post(|Json(body): Json<Value>| async move {
                    let q = body["question"].as_str().unwrap_or_default().to_string();
                    Json(json!({ "response": format!("You asked: {}", q) }))
                }),
            )
            .route(
                "/synthesize",
                post(|Json(body): Json<Value>| async move {
                    let avatar = body["avatar"].as_str().unwrap_or_default().to_string();
                    Json(json!({ "audio_file": format!("{}_speech.wav", avatar) }))
                }),
            )
            .route(
                "/animate",
                post(|Json(body): Json<Value>| async move {
                    let audio = body["audio_file"].as_str().unwrap_or_default().to_string();
                    Json(json!({ "video_file": audio.replace(".wav", ".mp4") }))
                }),
            )
    }

    #[tokio::test]
    async fn test_endpoints_resolve_against_base() {
        let client = BackendClient::new(Url::parse("http://localhost:5000").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
        assert_eq!(client.endpoints.ask.as_str(), "http://localhost:5000/ask");
        assert_eq!(client.endpoints.avatars.as_str(), "http://localhost:5000/avatars");
    }

    #[tokio::test]
    async fn test_pipeline_calls_succeed() {
        let client = BackendClient::new(serve(happy_backend()).await).unwrap();

        let answer = client.ask("why is the sky blue?").await.unwrap();
        assert_eq!(answer.text, "You asked: why is the sky blue?");

        let audio = client.synthesize(&answer.text, "Art").await.unwrap();
        assert_eq!(audio.file, "Art_speech.wav");

        let video = client.animate("Art", &audio.file).await.unwrap();
        assert_eq!(video.file, "Art_speech.mp4");
    }

    #[tokio::test]
    async fn test_list_avatars_and_health() {
        let client = BackendClient::new(serve(happy_backend()).await).unwrap();

        assert!(client.health_check().await);
        let avatars = tokio_test::assert_ok!(client.list_avatars().await);
        assert_eq!(avatars, vec![AvatarIdentity::new("Art - Bob Ross", "Art")]);
    }

    #[tokio::test]
    async fn test_missing_avatars_key_is_empty_list() {
        let router = Router::new().route("/avatars", get(|| async { Json(json!({})) }));
        let client = BackendClient::new(serve(router).await).unwrap();

        assert!(client.list_avatars().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_failed() {
        let router = Router::new()
            .route(
                "/ask",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model offline") }),
            )
            .route("/avatars", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let client = BackendClient::new(serve(router).await).unwrap();

        match client.ask("hello").await {
            Err(BackendError::RequestFailed { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model offline");
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_unusable_payloads_are_empty_results() {
        let router = Router::new()
            .route("/ask", post(|| async { Json(json!({"response": "   "})) }))
            .route("/synthesize", post(|| async { "not json" }))
            .route("/animate", post(|| async { Json(json!({"other": 1})) }));
        let client = BackendClient::new(serve(router).await).unwrap();

        let err = client.ask("hello").await.unwrap_err();
        assert_eq!(err.kind(), "empty_result");

        let err = client.synthesize("hi", "Art").await.unwrap_err();
        assert_eq!(err.kind(), "empty_result");

        let err = client.animate("Art", "a.wav").await.unwrap_err();
        assert!(err.to_string().contains("video_file"));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let client = BackendClient::new(dead_url().await).unwrap();

        assert!(!client.health_check().await);
        let err = client.ask("hello").await.unwrap_err();
        assert_eq!(err.kind(), "network_unavailable");
        let err = client.list_avatars().await.unwrap_err();
        assert_eq!(err.kind(), "network_unavailable");
    }
}
