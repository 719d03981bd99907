use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::{GenerateResponse, GenerationRequest, Model, ModelsResponse, Novel};

const MODELS_PATH: &str = "/models";
const GENERATE_PATH: &str = "/generate";
const DEFAULT_GENERATION_ERROR: &str = "generation failed";
const DEFAULT_MODELS_ERROR: &str = "model list unavailable";

/// The two calls the page makes against the generation service.
#[async_trait]
pub trait NovelApi: Send + Sync {
    async fn fetch_models(&self) -> ApiResult<Vec<Model>>;

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<Novel>;
}

/// reqwest-backed client for the generation service.
#[derive(Debug, Clone)]
pub struct HttpNovelApi {
    http_client: Client,
    base_url: String,
}

impl HttpNovelApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.server_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl NovelApi for HttpNovelApi {
    async fn fetch_models(&self) -> ApiResult<Vec<Model>> {
        let url = self.url(MODELS_PATH);
        tracing::debug!(%url, "fetching model list");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: ModelsResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::Transport(format!(
                "invalid model list response (status {}): {} | body: {}",
                status,
                e,
                truncate_error(&text)
            ))
        })?;

        parse_models_response(parsed)
    }

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<Novel> {
        let url = self.url(GENERATE_PATH);
        tracing::info!(
            mode = %request.mode,
            model = %request.model,
            genre = request.genre.as_deref().unwrap_or("default"),
            prompt_chars = request.prompt.chars().count(),
            "submitting generation request"
        );

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::Transport(format!(
                "invalid generation response (status {}): {} | body: {}",
                status,
                e,
                truncate_error(&text)
            ))
        })?;

        parse_generate_response(parsed)
    }
}

fn parse_models_response(parsed: ModelsResponse) -> ApiResult<Vec<Model>> {
    match (parsed.success, parsed.models) {
        (true, Some(models)) => Ok(models),
        (_, _) => Err(ApiError::Application(
            parsed
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODELS_ERROR.to_string()),
        )),
    }
}

fn parse_generate_response(parsed: GenerateResponse) -> ApiResult<Novel> {
    if !parsed.success {
        return Err(ApiError::Application(
            parsed
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GENERATION_ERROR.to_string()),
        ));
    }

    let chapters = parsed.chapters.ok_or_else(|| {
        ApiError::Application("response is missing the chapter list".to_string())
    })?;

    Ok(Novel {
        title: parsed.title.unwrap_or_default(),
        chapters,
    })
}

fn truncate_error(text: &str) -> String {
    const MAX_CHARS: usize = 320;
    if text.chars().count() > MAX_CHARS {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned HTTP response and hands back the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let raw = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            raw
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let body = raw.split("\r\n\r\n").nth(1).unwrap_or_default();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn fetch_models_returns_models_in_order() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"success":true,"models":[{"id":"m1","name":"Model One"},{"name":"solo"}]}"#,
        )
        .await;

        let api = HttpNovelApi::new(&base, None).unwrap();
        let models = api.fetch_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].value(), "m1");
        assert_eq!(models[1].label(), "solo");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /models "));
    }

    #[tokio::test]
    async fn fetch_models_failure_body_is_application_error() {
        let (base, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"success":false,"error":"registry down"}"#,
        )
        .await;

        let api = HttpNovelApi::new(&base, None).unwrap();
        let err = api.fetch_models().await.unwrap_err();
        assert_eq!(err, ApiError::Application("registry down".to_string()));
    }

    #[tokio::test]
    async fn non_json_body_is_transport_error() {
        let (base, _server) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;

        let api = HttpNovelApi::new(&base, None).unwrap();
        let err = api.fetch_models().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpNovelApi::new(&format!("http://{}/", addr), None).unwrap();
        let err = api.fetch_models().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn generate_posts_json_body_and_parses_novel() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"success":true,"title":"星海","chapters":[{"title":"第一章 启航","content":"飞船离港。"},{"title":"第二章 迷航","content":"信号中断。"}]}"#,
        )
        .await;

        let api = HttpNovelApi::new(&base, None).unwrap();
        let request = GenerationRequest {
            prompt: "星际殖民".to_string(),
            mode: Mode::Generate,
            model: "m1".to_string(),
            genre: Some("科幻太空".to_string()),
        };
        let novel = api.generate(&request).await.unwrap();
        assert_eq!(novel.title, "星海");
        assert_eq!(novel.chapters.len(), 2);
        assert_eq!(novel.chapters[1].title, "第二章 迷航");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /generate "));
        assert!(raw.to_lowercase().contains("content-type: application/json"));
        assert_eq!(
            request_body(&raw),
            serde_json::json!({
                "prompt": "星际殖民",
                "mode": "generate",
                "model": "m1",
                "genre": "科幻太空"
            })
        );
    }

    #[tokio::test]
    async fn generate_failure_uses_server_message_or_default() {
        let (base, _server) = serve_once(
            "400 Bad Request",
            r#"{"success":false,"error":"prompt too short"}"#,
        )
        .await;
        let api = HttpNovelApi::new(&base, None).unwrap();
        let request = GenerationRequest {
            prompt: "x".to_string(),
            mode: Mode::Generate,
            model: String::new(),
            genre: None,
        };
        let err = api.generate(&request).await.unwrap_err();
        assert_eq!(err, ApiError::Application("prompt too short".to_string()));

        let (base, _server) = serve_once("500 Internal Server Error", r#"{"success":false}"#).await;
        let api = HttpNovelApi::new(&base, None).unwrap();
        let err = api.generate(&request).await.unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_GENERATION_ERROR);
    }

    #[test]
    fn success_without_chapters_is_rejected() {
        let parsed = GenerateResponse {
            success: true,
            title: Some("t".to_string()),
            chapters: None,
            error: None,
        };
        assert!(matches!(
            parse_generate_response(parsed),
            Err(ApiError::Application(_))
        ));
    }

    #[test]
    fn success_without_models_is_rejected() {
        let parsed = ModelsResponse {
            success: true,
            models: None,
            error: None,
        };
        assert_eq!(
            parse_models_response(parsed),
            Err(ApiError::Application(DEFAULT_MODELS_ERROR.to_string()))
        );
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = HttpNovelApi::new("http://host:8000/ ", None).unwrap();
        assert_eq!(api.base_url(), "http://host:8000");
        assert_eq!(api.url(GENERATE_PATH), "http://host:8000/generate");
    }
}
