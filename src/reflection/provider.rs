//! Generative backend integration.
//!
//! The [`GenerativeBackend`] trait is the seam between the reflection
//! generator and the service that writes text and draws images.
//! [`GeminiBackend`] implements it against the Gemini `generateContent`
//! REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::GenerateError;

/// Timeout for establishing a connection (30 seconds).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Public Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for the title and body.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";

/// Model used for the illustration.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// MIME type assumed when inline image data carries none.
const DEFAULT_IMAGE_MIME: &str = "image/png";

// ==================== Types ====================

/// One content part returned by the image model.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePart {
    /// Narration the model returned alongside the picture.
    Text(String),
    /// Binary image data.
    InlineImage(InlineImage),
}

/// Decoded inline image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    /// Renders the image as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// Ordered parts of an image generation response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageResponse {
    pub parts: Vec<ImagePart>,
}

impl ImageResponse {
    /// The first part carrying image data, if any.
    pub fn first_inline_image(&self) -> Option<&InlineImage> {
        self.parts.iter().find_map(|part| match part {
            ImagePart::InlineImage(image) => Some(image),
            ImagePart::Text(_) => None,
        })
    }
}

/// Splits a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
///
/// Returns `None` for anything that is not a base64 data URI.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let data = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), data))
}

// ==================== Trait ====================

/// A service that can write reflection text and draw an illustration.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Sends a prompt asking for a JSON answer and returns the raw payload
    /// text, or `None` if the response carried no text.
    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, GenerateError>;

    /// Sends an image prompt and returns the response parts in order.
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<ImageResponse, GenerateError>;
}

// ==================== Gemini ====================

/// Settings for [`GeminiBackend`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// Timeout for the entire request including response.
    pub request_timeout: Duration,
}

/// Gemini `generateContent` client.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiBackend {
    /// Creates a new Gemini backend with its own HTTP client.
    pub fn new(settings: GeminiSettings) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GenerateError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key: settings.api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            text_model: settings.text_model,
            image_model: settings.image_model,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Builds the JSON request body for a structured text request.
    fn build_text_body(prompt: &str) -> Value {
        serde_json::json!({
            "contents": [
                { "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        })
    }

    /// Builds the JSON request body for an image request.
    fn build_image_body(prompt: &str, aspect_ratio: &str) -> Value {
        serde_json::json!({
            "contents": [
                { "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "imageConfig": { "aspectRatio": aspect_ratio }
            }
        })
    }

    async fn post(&self, model: &str, body: &Value) -> Result<GenerateContentResponse, GenerateError> {
        debug!(model, body = %body, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout(e.to_string())
                } else {
                    GenerateError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerateError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::ParseError(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(GenerateError::ApiError {
                status: error.code.unwrap_or(status.as_u16()),
                message: error.message.unwrap_or_default(),
            });
        }

        Ok(parsed)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, GenerateError> {
        let body = Self::build_text_body(prompt);
        let response = self.post(&self.text_model, &body).await?;
        Ok(response.text())
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<ImageResponse, GenerateError> {
        let body = Self::build_image_body(prompt, aspect_ratio);
        let response = self.post(&self.image_model, &body).await?;
        response.image_parts()
    }
}

// ==================== Wire format ====================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text of the first candidate, skipping thought parts.
    fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .first_parts()
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// Collects the parts in order.
    ///
    /// Only the first inline image must decode. Later inline parts that fail
    /// to decode are dropped, so they never change which image is used.
    fn image_parts(&self) -> Result<ImageResponse, GenerateError> {
        let mut parts = Vec::new();
        let mut have_image = false;
        for part in self.first_parts() {
            if let Some(inline) = &part.inline_data {
                let data = match STANDARD.decode(inline.data.trim()) {
                    Ok(data) => data,
                    Err(e) if !have_image => {
                        return Err(GenerateError::ParseError(format!(
                            "Invalid inline image data: {e}"
                        )))
                    }
                    Err(e) => {
                        debug!("Skipping undecodable inline part after the first image: {e}");
                        continue;
                    }
                };
                have_image = true;
                parts.push(ImagePart::InlineImage(InlineImage {
                    mime_type: inline
                        .mime_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                    data,
                }));
            } else if let Some(text) = &part.text {
                parts.push(ImagePart::Text(text.clone()));
            }
        }
        Ok(ImageResponse { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn backend_for(server: &Server) -> GeminiBackend {
        GeminiBackend::new(GeminiSettings {
            api_key: "test-key".to_string(),
            base_url: server.url(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .expect("Failed to build backend")
    }

    // ==================== Request body construction tests ====================

    #[test]
    fn test_text_request_body() {
        let body = GeminiBackend::build_text_body("write a poem");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "write a poem");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_image_request_body() {
        let body = GeminiBackend::build_image_body("draw a banana", "4:5");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "draw a banana");
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "4:5");
    }

    // ==================== Response parsing tests ====================

    #[test]
    fn test_text_skips_thoughts_and_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "{\"title\":" },
                        { "text": "\"t\"}" }
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"title\":\"t\"}"));
    }

    #[test]
    fn test_text_missing_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_image_parts_in_order() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your image" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AQID" } },
                        { "inlineData": { "data": "BAUG" } }
                    ]
                }
            }]
        }))
        .unwrap();

        let image = response.image_parts().unwrap();
        assert_eq!(image.parts.len(), 3);
        let first = image.first_inline_image().unwrap();
        assert_eq!(first.mime_type, "image/jpeg");
        assert_eq!(first.data, vec![1, 2, 3]);
        assert_eq!(first.data_uri(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_later_bad_inline_part_keeps_first_image() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "AQID" } },
                        { "inlineData": { "data": "!!broken!!" } }
                    ]
                }
            }]
        }))
        .unwrap();

        let image = response.image_parts().unwrap();
        assert_eq!(image.parts.len(), 1);
        assert_eq!(
            image.first_inline_image().unwrap().data_uri(),
            "data:image/png;base64,AQID"
        );
    }

    #[test]
    fn test_image_parts_invalid_base64() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "data": "!!not base64!!" } }] }
            }]
        }))
        .unwrap();
        assert!(matches!(
            response.image_parts(),
            Err(GenerateError::ParseError(_))
        ));
    }

    #[test]
    fn test_decode_data_uri() {
        let (mime, data) = decode_data_uri("data:image/png;base64,AQID").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, vec![1, 2, 3]);
        assert!(decode_data_uri("https://picsum.photos/seed/x/800/1000").is_none());
        assert!(decode_data_uri("data:text/plain,hello").is_none());
    }

    // ==================== HTTP tests ====================

    #[tokio::test]
    async fn test_generate_text_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-3-flash-preview:generateContent",
            )
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":\"빛\",\"contentLines\":[\"a\"]}"}],"role":"model"},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let backend = backend_for(&server);
        let text = backend.generate_text("prompt").await.unwrap();
        assert_eq!(
            text.as_deref(),
            Some("{\"title\":\"빛\",\"contentLines\":[\"a\"]}")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash-image:generateContent",
            )
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": { "imageConfig": { "aspectRatio": "4:5" } }
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}]}}]}"#,
            )
            .create_async()
            .await;

        let backend = backend_for(&server);
        let image = backend.generate_image("prompt", "4:5").await.unwrap();
        let inline = image.first_inline_image().unwrap();
        assert_eq!(inline.data_uri(), "data:image/png;base64,iVBORw==");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body("RESOURCE_EXHAUSTED")
            .create_async()
            .await;

        let backend = backend_for(&server);
        match backend.generate_text("prompt").await {
            Err(GenerateError::HttpError { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("Expected HttpError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_in_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let backend = backend_for(&server);
        match backend.generate_image("prompt", "4:5").await {
            Err(GenerateError::ApiError { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let backend = backend_for(&server);
        assert!(matches!(
            backend.generate_text("prompt").await,
            Err(GenerateError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend = GeminiBackend::new(GeminiSettings {
            api_key: "k".to_string(),
            base_url: format!("http://{addr}"),
            text_model: "m".to_string(),
            image_model: "i".to_string(),
            request_timeout: Duration::from_millis(100),
        })
        .unwrap();

        assert!(matches!(
            backend.generate_text("prompt").await,
            Err(GenerateError::Timeout(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new(GeminiSettings {
            api_key: "k".to_string(),
            base_url: "http://localhost:1234/".to_string(),
            text_model: "m".to_string(),
            image_model: "i".to_string(),
            request_timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("m"),
            "http://localhost:1234/v1beta/models/m:generateContent"
        );
    }
}
