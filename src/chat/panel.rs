use crate::api::ChatResponse;
use crate::chat::severity::Severity;
use crate::markdown::{self, MarkdownLine};

/// The seriousness/suggestions side panel for the latest reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionsPanel {
    pub level: String,
    pub severity: Severity,
    pub html: String,
    pub lines: Vec<MarkdownLine>,
}

impl SuggestionsPanel {
    /// Level and suggestions travel together: if either is missing or blank
    /// there is no panel.
    pub fn from_response(response: &ChatResponse) -> Option<Self> {
        let level = non_blank(response.seriousness_level.as_deref())?;
        let suggestions = non_blank(response.suggestions.as_deref())?;

        Some(Self {
            level: level.to_string(),
            severity: Severity::classify(level),
            html: markdown::to_safe_html(suggestions),
            lines: markdown::to_lines(suggestions),
        })
    }

    pub fn heading(&self) -> String {
        format!("Seriousness Level: {}", self.level)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
