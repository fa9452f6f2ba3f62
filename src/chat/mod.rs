//! Conversation state: the transcript, pending requests and the suggestions
//! panel. Network I/O lives in [`crate::dispatch`]; this module only decides
//! what the user sees.

pub mod message;
pub mod panel;
pub mod severity;

pub use message::{ChatMessage, RequestId, Sender, Transcript};
pub use panel::SuggestionsPanel;
pub use severity::Severity;

use crate::api::{ChatRequest, ChatResponse};
use std::collections::BTreeMap;
use tokio::task::AbortHandle;

pub const APOLOGY: &str = "I'm sorry, I am unable to connect right now. Please try again later.";
pub const NOT_UNDERSTOOD: &str = "Sorry, I could not understand the audio.";

/// A validated submission, ready to be sent as exactly one backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: RequestId,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Answered,
    Apologized,
    /// The request was cancelled or already resolved; nothing changed.
    Stale,
}

#[derive(Default)]
pub struct ChatClient {
    transcript: Transcript,
    panel: Option<SuggestionsPanel>,
    pending: BTreeMap<RequestId, Option<AbortHandle>>,
    latest: Option<RequestId>,
    next_id: u64,
}

impl ChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn panel(&self) -> Option<&SuggestionsPanel> {
        self.panel.as_ref()
    }

    pub fn is_waiting(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Optimistically appends the user message and a placeholder reply.
    /// Blank input is ignored.
    pub fn submit(&mut self, text: &str) -> Option<Submission> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }

        self.next_id += 1;
        let id = RequestId(self.next_id);

        self.transcript.push(ChatMessage::user(message));
        self.transcript.push(ChatMessage::placeholder(id));
        self.pending.insert(id, None);
        self.latest = Some(id);
        tracing::debug!(request = id.0, "chat message submitted");

        Some(Submission {
            id,
            request: ChatRequest {
                message: message.to_string(),
            },
        })
    }

    /// Associates the spawned request task with its id so it can be cancelled.
    pub fn attach_task(&mut self, id: RequestId, handle: AbortHandle) {
        match self.pending.get_mut(&id) {
            Some(slot) => *slot = Some(handle),
            None => handle.abort(),
        }
    }

    pub fn apply_reply(
        &mut self,
        id: RequestId,
        result: Result<ChatResponse, String>,
    ) -> ReplyOutcome {
        if self.pending.remove(&id).is_none() {
            tracing::debug!(request = id.0, "dropping reply for inactive request");
            return ReplyOutcome::Stale;
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(request = id.0, "chat request failed: {err}");
                self.transcript.resolve(id, ChatMessage::ai(APOLOGY));
                return ReplyOutcome::Apologized;
            }
        };

        if self.latest == Some(id) {
            self.panel = SuggestionsPanel::from_response(&response);
        }

        match response
            .ai_response
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            Some(text) => {
                self.transcript.resolve(id, ChatMessage::ai(text));
                ReplyOutcome::Answered
            }
            None => {
                tracing::warn!(request = id.0, "chat reply carried no ai_response");
                self.transcript.resolve(id, ChatMessage::ai(APOLOGY));
                ReplyOutcome::Apologized
            }
        }
    }

    /// Aborts every outstanding request and removes its placeholder.
    pub fn cancel_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (id, handle) in pending {
            if let Some(handle) = handle {
                handle.abort();
            }
            self.transcript.remove_placeholder(id);
        }
        if count > 0 {
            tracing::info!(count, "cancelled pending chat requests");
        }
        count
    }

    pub fn clear(&mut self) {
        self.cancel_pending();
        self.transcript.clear();
        self.panel = None;
        self.latest = None;
    }

    /// Appends an assistant-side notice that is not tied to a request.
    pub fn notice(&mut self, text: impl Into<String>) {
        self.transcript.push(ChatMessage::ai(text));
    }
}
