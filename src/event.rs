use crate::api::{ChatResponse, ContactsRequest, ContactsResponse, UniversityResponse};
use crate::chat::RequestId;

/// Results delivered from background tasks to the UI thread. Errors travel as
/// display strings; the task has already logged the underlying error.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ChatReply {
        id: RequestId,
        result: Result<ChatResponse, String>,
    },
    /// `Ok(None)` means the backend heard nothing intelligible.
    VoiceTranscribed(Result<Option<String>, String>),
    CountriesLoaded(Result<Vec<String>, String>),
    CitiesLoaded {
        country: String,
        result: Result<Vec<String>, String>,
    },
    ContactsLoaded {
        request: ContactsRequest,
        result: Result<ContactsResponse, String>,
    },
    UniversityLoaded {
        name: String,
        result: Result<UniversityResponse, String>,
    },
}
