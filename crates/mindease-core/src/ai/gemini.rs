use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationClient, GenerationError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub contents: Vec<Content>,
}

impl GenerationRequest {
    /// Single block holding a single text part.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

// Every level of the response is optional: the API omits candidates when a
// prompt is blocked, and parts may carry non-text payloads.

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

impl GenerationResponse {
    /// Response with one candidate whose first part is `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    parts: Some(vec![ResponsePart {
                        text: Some(text.to_string()),
                    }]),
                }),
            }]),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_endpoint(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    pub fn with_endpoint(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GenerationResponse>, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "generateContent responded");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "generation API error");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: (!text.trim().is_empty()).then_some(text),
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => {
                warn!("unreadable generateContent body: {err}");
                Ok(None)
            }
        }
    }
}

/// The request URL carries the API key, so it is stripped before the error
/// is turned into text.
fn transport_error(err: reqwest::Error) -> GenerationError {
    let network = err.is_connect() || err.is_timeout();
    let err = err.without_url();
    if network {
        GenerationError::Transport(format!("network error: {err}"))
    } else {
        GenerationError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ErrorCategory, FlowError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a loopback port. The handle yields
    /// the raw request head it received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            let head_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                received.extend_from_slice(&buf[..n]);
                if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&received[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while received.len() < head_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            head
        });
        (base_url, handle)
    }

    async fn generate(base_url: &str) -> Result<Option<GenerationResponse>, GenerationError> {
        GeminiClient::with_endpoint("SECRETKEY", base_url, "gemini-test")
            .generate_content(&GenerationRequest::from_prompt("Hi"))
            .await
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GenerationRequest::from_prompt("Hi");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"parts": [{"text": "Hi"}]}]})
        );
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let parsed: GenerationResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_none());

        let parsed: GenerationResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let candidates = parsed.candidates.unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].content.is_none());
    }

    #[test]
    fn test_response_reads_nested_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}"#;
        let parsed: GenerationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, GenerationResponse::with_text("Hello"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::with_endpoint("k", "http://localhost:8080/", "gemini-test");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn test_blank_key_never_sends() {
        // Unroutable base URL: reaching the network would surface a transport error instead.
        let client = GeminiClient::with_endpoint("  ", "http://127.0.0.1:9", DEFAULT_MODEL);
        let result = client
            .generate_content(&GenerationRequest::from_prompt("Hi"))
            .await;
        assert_eq!(result, Err(GenerationError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_key_sent_as_query_parameter() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#,
        )
        .await;

        let result = generate(&base_url).await;
        let head = server.await.unwrap();

        assert_eq!(result, Ok(Some(GenerationResponse::with_text("Hello"))));
        let request_line = head.lines().next().unwrap();
        assert_eq!(
            request_line,
            "POST /v1beta/models/gemini-test:generateContent?key=SECRETKEY HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let (base_url, server) = serve_once("429 Too Many Requests", "quota").await;

        let result = generate(&base_url).await;
        server.await.unwrap();

        assert_eq!(
            result,
            Err(GenerationError::Status {
                status: 429,
                body: Some("quota".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_non_success_status_with_blank_body() {
        let (base_url, server) = serve_once("500 Internal Server Error", "  ").await;

        let result = generate(&base_url).await;
        server.await.unwrap();

        assert_eq!(
            result,
            Err(GenerationError::Status {
                status: 500,
                body: None,
            })
        );
    }

    #[tokio::test]
    async fn test_empty_success_body_is_none() {
        let (base_url, server) = serve_once("200 OK", "").await;

        let result = generate(&base_url).await;
        server.await.unwrap();

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_garbage_success_body_is_none() {
        let (base_url, server) = serve_once("200 OK", "<html>not json</html>").await;

        let result = generate(&base_url).await;
        server.await.unwrap();

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = generate(&base_url).await.unwrap_err();

        let GenerationError::Transport(message) = &err else {
            panic!("expected a transport error, got {err:?}");
        };
        assert!(message.starts_with("network error"), "{message}");
        assert!(!message.contains("SECRETKEY"), "{message}");
        assert_eq!(FlowError::from(err).category(), ErrorCategory::Network);
    }

    #[test]
    fn test_status_error_display() {
        let err = GenerationError::Status {
            status: 429,
            body: None,
        };
        assert_eq!(err.to_string(), "API error 429: Unknown error");
    }
}
