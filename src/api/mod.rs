//! HTTP client for the CalmMate backend.

pub mod error;
pub mod types;

pub use error::{ApiError, Result};
pub use types::{
    ChatRequest, ChatResponse, ContactCategory, ContactsRequest, ContactsResponse,
    TranscriptionResponse, UniversityRequest, UniversityResponse,
};

use crate::config::Config;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use types::ErrorBody;

const VOICE_FIELD: &str = "audio";
const VOICE_FILENAME: &str = "recording.wav";
const VOICE_MIME: &str = "audio/wav";

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    chat_path: String,
    voice_path: String,
    http: Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_path: config.chat_path.clone(),
            voice_path: config.voice_path.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one chat turn. No retries.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .http
            .post(self.url(&self.chat_path))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Uploads a recorded WAV clip for server-side transcription.
    pub async fn upload_voice(&self, wav: Vec<u8>) -> Result<TranscriptionResponse> {
        let part = Part::bytes(wav)
            .file_name(VOICE_FILENAME)
            .mime_str(VOICE_MIME)?;
        let form = Form::new().part(VOICE_FIELD, part);
        let response = self
            .http
            .post(self.url(&self.voice_path))
            .multipart(form)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn countries(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.url("/api/countries")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn cities(&self, country: &str) -> Result<Vec<String>> {
        let path = format!("/api/cities/{}", urlencoding::encode(country));
        let response = self.http.get(self.url(&path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn contacts(&self, request: &ContactsRequest) -> Result<ContactsResponse> {
        let response = self
            .http
            .post(self.url("/api/contacts"))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn university_resources(&self, university_name: &str) -> Result<UniversityResponse> {
        let request = UniversityRequest {
            university_name: university_name.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/university_resources"))
            .json(&request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turns a non-2xx response into `ApiError::Status`, keeping the backend's
/// `error`/`details` text when the body carries one.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: Some(error),
            details: Some(details),
        }) => format!("{error} ({details})"),
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        _ => body.trim().to_string(),
    };

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&Config::for_base_url(&server.uri())).expect("client should build")
    }

    #[tokio::test]
    async fn chat_posts_message_and_decodes_full_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({ "message": "I feel anxious" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ai_response": "I hear you.",
                "seriousness_level": "Medium",
                "suggestions": "- Breathe\n- Walk"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .chat(&ChatRequest {
                message: "I feel anxious".to_string(),
            })
            .await
            .expect("chat should succeed");

        assert_eq!(reply.ai_response.as_deref(), Some("I hear you."));
        assert_eq!(reply.seriousness_level.as_deref(), Some("Medium"));
        assert_eq!(reply.suggestions.as_deref(), Some("- Breathe\n- Walk"));
    }

    #[tokio::test]
    async fn chat_tolerates_missing_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .chat(&ChatRequest {
                message: "hi".to_string(),
            })
            .await
            .expect("empty object is a valid reply");
        assert_eq!(reply, ChatResponse::default());
    }

    #[tokio::test]
    async fn chat_reports_backend_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "Failed to get AI response.",
                "details": "upstream timeout"
            })))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .chat(&ChatRequest {
                message: "hi".to_string(),
            })
            .await
            .expect_err("500 should fail");
        match error {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to get AI response. (upstream timeout)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chat_path_is_configurable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ai_response": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::for_base_url(&server.uri());
        config.chat_path = "/chat".to_string();
        let client = BackendClient::new(&config).expect("client should build");
        let reply = client
            .chat(&ChatRequest {
                message: "hi".to_string(),
            })
            .await
            .expect("chat should succeed");
        assert_eq!(reply.ai_response.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn upload_voice_sends_multipart_and_reads_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload_voice"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transcribed_text": "  I can't sleep  "
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .upload_voice(b"RIFF....WAVE".to_vec())
            .await
            .expect("upload should succeed");
        assert_eq!(reply.text(), Some("I can't sleep"));

        let requests = server.received_requests().await.expect("recording enabled");
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"audio\""));
        assert!(body.contains("filename=\"recording.wav\""));
    }

    #[tokio::test]
    async fn cities_percent_encodes_country() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cities/South%20Korea"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Busan", "Seoul"])))
            .expect(1)
            .mount(&server)
            .await;

        let cities = client_for(&server)
            .cities("South Korea")
            .await
            .expect("cities should load");
        assert_eq!(cities, vec!["Busan".to_string(), "Seoul".to_string()]);
    }

    #[tokio::test]
    async fn contacts_posts_category_in_snake_case() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .and(body_json(json!({
                "country": "India",
                "city": "Chennai",
                "category": "helplines"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contacts_markdown": "### Emergency Contacts for Chennai, India\n"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .contacts(&ContactsRequest {
                country: "India".to_string(),
                city: "Chennai".to_string(),
                category: ContactCategory::Helplines,
            })
            .await
            .expect("contacts should load");
        assert!(reply
            .contacts_markdown
            .as_deref()
            .is_some_and(|markdown| markdown.contains("Chennai")));
    }

    #[tokio::test]
    async fn university_lookup_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/university_resources"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "University not found or no resources available."
            })))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .university_resources("Nowhere U")
            .await
            .expect_err("404 should fail");
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = BackendClient::new(&Config::for_base_url("http://127.0.0.1:9"))
            .expect("client should build");
        let error = client
            .countries()
            .await
            .expect_err("nothing listens on port 9");
        assert!(matches!(error, ApiError::Http(_)));
    }
}
