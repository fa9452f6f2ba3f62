use std::time::{SystemTime, UNIX_EPOCH};

/// Identifies one chat request from submission to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
    /// Set while this entry stands in for an unanswered request.
    pub pending: Option<RequestId>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            timestamp: timestamp(),
            pending: None,
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
            timestamp: timestamp(),
            pending: None,
        }
    }

    pub fn placeholder(id: RequestId) -> Self {
        Self {
            sender: Sender::Ai,
            text: String::new(),
            timestamp: timestamp(),
            pending: Some(id),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.pending.is_some()
    }
}

pub fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().to_string(),
        Err(_) => "0".to_string(),
    }
}

/// Ordered, session-only list of displayed messages.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replaces the placeholder for `id` in place. Returns false if none exists.
    pub fn resolve(&mut self, id: RequestId, message: ChatMessage) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|message| message.pending == Some(id))
        {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    pub fn remove_placeholder(&mut self, id: RequestId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| message.pending != Some(id));
        self.messages.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, RequestId, Transcript};

    #[test]
    fn messages_carry_a_unix_timestamp() {
        let message = ChatMessage::user("hello");
        let seconds: u64 = message.timestamp.parse().expect("timestamp is numeric");
        assert!(seconds > 0);
    }

    #[test]
    fn resolve_and_remove_only_touch_their_own_placeholder() {
        let mut transcript = Transcript::default();
        transcript.push(ChatMessage::placeholder(RequestId(1)));
        transcript.push(ChatMessage::placeholder(RequestId(2)));

        assert!(transcript.resolve(RequestId(1), ChatMessage::ai("first")));
        assert!(!transcript.resolve(RequestId(1), ChatMessage::ai("again")));
        assert!(transcript.remove_placeholder(RequestId(2)));
        assert!(!transcript.remove_placeholder(RequestId(2)));

        let messages = transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "first");
        assert!(!transcript.is_empty());
    }
}
