use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub ai_response: Option<String>,
    #[serde(default)]
    pub seriousness_level: Option<String>,
    #[serde(default)]
    pub suggestions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub transcribed_text: Option<String>,
}

impl TranscriptionResponse {
    /// The transcript, if the backend understood anything.
    pub fn text(&self) -> Option<&str> {
        self.transcribed_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactCategory {
    Helplines,
    Doctors,
}

impl ContactCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Helplines => "Helplines",
            Self::Doctors => "Doctors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactsRequest {
    pub country: String,
    pub city: String,
    pub category: ContactCategory,
}

/// `/api/contacts` answers either with markdown or with an error payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts_markdown: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversityRequest {
    pub university_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UniversityResponse {
    #[serde(default)]
    pub resources: BTreeMap<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub details: Option<String>,
}
