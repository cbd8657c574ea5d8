//! services/client/src/adapters/http_backend.rs
//!
//! This module contains the adapter for the backend's JSON-over-HTTP API.
//! It implements the `GenerationBackend` port from the `core` crate.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use studio_client_core::domain::{
    AspectRatio, Credential, GeneratedImage, GenerationRequest, HealthReport,
};
use studio_client_core::ports::{BackendError, BackendResult, GenerationBackend};
use tracing::debug;

//=========================================================================================
// Wire Types (private to this adapter)
//=========================================================================================

#[derive(Serialize)]
struct CookiesBody<'a> {
    psid: Option<&'a str>,
    psidts: Option<&'a str>,
}

impl<'a> CookiesBody<'a> {
    fn from_snapshot(credential: Option<&'a Credential>) -> Self {
        Self {
            psid: credential.map(|c| c.psid.as_str()),
            psidts: credential.map(|c| c.psidts.as_str()),
        }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    aspect_ratio: &'a AspectRatio,
    quantity: u8,
    style: Option<&'a str>,
    hd_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image: Option<&'a str>,
    cookies: CookiesBody<'a>,
}

#[derive(Deserialize, Debug)]
struct GenerateReply {
    success: bool,
    #[serde(default)]
    images: Vec<GeneratedImage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct UpscaleBody<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct UpscaleReply {
    success: bool,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct EnhanceBody<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EnhanceReply {
    success: bool,
    #[serde(default)]
    enhanced_prompt: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct UpdateCookiesBody<'a> {
    psid: &'a str,
    psidts: &'a str,
}

#[derive(Deserialize)]
struct AckReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct ChatSendBody<'a> {
    message: &'a str,
    image: Option<&'a str>,
    cookies: CookiesBody<'a>,
}

#[derive(Deserialize)]
struct ChatSendReply {
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationBackend` against the studio
/// backend's HTTP surface.
#[derive(Clone)]
pub struct HttpBackendAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendAdapter {
    /// Creates a new `HttpBackendAdapter` for the given base URL.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolves a possibly relative image URL against the backend origin.
    fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> BackendResult<R> {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                status: None,
                message: format!("Network error: {}", e),
            })?;
        decode_reply(&url, response).await
    }
}

/// Turns an HTTP response into a decoded JSON body, or a `Transport` fault.
///
/// The backend offers no client-side timeout; a gateway timeout shows up
/// here as an HTML error page, which the content-type inspection converts
/// into a terminal fault instead of a parse attempt.
async fn decode_reply<R: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> BackendResult<R> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.bytes().await.map_err(|e| BackendError::Transport {
        status: Some(status),
        message: format!("Failed to read response from {}: {}", url, e),
    })?;
    decode_envelope(status, &content_type, &body)
}

/// Content-type inspection and JSON decoding, factored out so the
/// non-structured-response policy is testable without a live server.
fn decode_envelope<R: DeserializeOwned>(
    status: u16,
    content_type: &str,
    body: &[u8],
) -> BackendResult<R> {
    if !content_type.contains("application/json") {
        return Err(BackendError::Transport {
            status: Some(status),
            message: format!(
                "Server error ({}): the server timed out or crashed. Please try reducing quantity.",
                status
            ),
        });
    }
    serde_json::from_slice(body).map_err(|e| BackendError::Transport {
        status: Some(status),
        message: format!("Malformed response ({}): {}", status, e),
    })
}

/// Maps a `{success, error}` envelope onto the port's error variant.
fn server_error(error: Option<String>, fallback: &str) -> BackendError {
    BackendError::Server(error.unwrap_or_else(|| fallback.to_string()))
}

//=========================================================================================
// `GenerationBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationBackend for HttpBackendAdapter {
    async fn health(&self) -> BackendResult<HealthReport> {
        let url = self.endpoint("/api/health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                status: None,
                message: format!("Network error: {}", e),
            })?;
        decode_reply(&url, response).await
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> BackendResult<Vec<GeneratedImage>> {
        let body = GenerateBody {
            prompt: &request.prompt,
            aspect_ratio: &request.aspect_ratio,
            quantity: request.quantity,
            style: request.style.as_deref(),
            hd_mode: request.hd_mode,
            reference_image: request.reference_image.as_deref(),
            cookies: CookiesBody::from_snapshot(credential),
        };
        let reply: GenerateReply = self.post_json("/api/generate", &body).await?;
        if reply.success {
            Ok(reply.images)
        } else {
            Err(server_error(reply.error, "Generation failed"))
        }
    }

    async fn upscale(&self, image_url: &str) -> BackendResult<String> {
        let body = UpscaleBody { image: image_url };
        let reply: UpscaleReply = self.post_json("/api/upscale", &body).await?;
        match (reply.success, reply.image_url) {
            (true, Some(url)) => Ok(url),
            (true, None) => Err(BackendError::Server(
                "Upscale reply was missing the image URL".to_string(),
            )),
            (false, _) => Err(server_error(reply.error, "Upscale failed")),
        }
    }

    async fn enhance(&self, prompt: &str) -> BackendResult<String> {
        let body = EnhanceBody { prompt };
        let reply: EnhanceReply = self.post_json("/api/enhance", &body).await?;
        match (reply.success, reply.enhanced_prompt) {
            (true, Some(enhanced)) => Ok(enhanced),
            (true, None) => Err(BackendError::Server(
                "Enhance reply was missing the prompt".to_string(),
            )),
            (false, _) => Err(server_error(reply.error, "Failed to enhance prompt")),
        }
    }

    async fn send_chat(
        &self,
        message: &str,
        image: Option<&str>,
        credential: Option<&Credential>,
    ) -> BackendResult<String> {
        let body = ChatSendBody {
            message,
            image,
            cookies: CookiesBody::from_snapshot(credential),
        };
        let reply: ChatSendReply = self.post_json("/api/chat/send", &body).await?;
        match (reply.success, reply.text) {
            (true, Some(text)) => Ok(text),
            (true, None) => Err(BackendError::Server(
                "Chat reply was missing the text".to_string(),
            )),
            (false, _) => Err(server_error(reply.error, "Chat failed")),
        }
    }

    async fn update_credentials(&self, credential: &Credential) -> BackendResult<()> {
        let body = UpdateCookiesBody {
            psid: &credential.psid,
            psidts: &credential.psidts,
        };
        let reply: AckReply = self.post_json("/api/update_cookies", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(server_error(reply.error, "Failed to save settings"))
        }
    }

    async fn fetch_image(&self, url: &str) -> BackendResult<Vec<u8>> {
        let absolute = self.absolute(url);
        let response = self
            .client
            .get(&absolute)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                status: None,
                message: format!("Network error: {}", e),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Transport {
                status: Some(status.as_u16()),
                message: format!("Image fetch failed with status {}", status.as_u16()),
            });
        }
        let bytes = response.bytes().await.map_err(|e| BackendError::Transport {
            status: Some(status.as_u16()),
            message: format!("Failed to read image bytes: {}", e),
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_reply_is_decoded() {
        let body = br#"{"success": true, "images": [{"url": "a"}, {"url": "b"}]}"#;
        let reply: GenerateReply =
            decode_envelope(200, "application/json", body).expect("decodes");
        assert!(reply.success);
        assert_eq!(reply.images.len(), 2);
        assert_eq!(reply.images[0].url, "a");
    }

    #[test]
    fn html_error_page_becomes_a_transport_fault_naming_the_status() {
        let body = b"<html><body>504 Gateway Time-out</body></html>";
        let err = decode_envelope::<GenerateReply>(504, "text/html; charset=utf-8", body)
            .expect_err("must not parse HTML");
        match err {
            BackendError::Transport { status, message } => {
                assert_eq!(status, Some(504));
                assert!(message.contains("504"));
            }
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn truncated_json_is_a_transport_fault() {
        let body = br#"{"success": tru"#;
        let err = decode_envelope::<GenerateReply>(200, "application/json", body)
            .expect_err("must not decode");
        assert!(matches!(err, BackendError::Transport { status: Some(200), .. }));
    }

    #[test]
    fn relative_image_urls_are_resolved_against_the_backend() {
        let adapter =
            HttpBackendAdapter::new(reqwest::Client::new(), "http://localhost:5000/");
        assert_eq!(
            adapter.absolute("/generated/img1.png"),
            "http://localhost:5000/generated/img1.png"
        );
        assert_eq!(
            adapter.absolute("https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn unset_credential_serializes_as_null_cookie_fields() {
        let cookies = CookiesBody::from_snapshot(None);
        let json = serde_json::to_value(&cookies).expect("serializes");
        assert_eq!(json, serde_json::json!({ "psid": null, "psidts": null }));
    }
}
