use std::fmt;

/// Backend-assigned risk category, parsed once from the free-form level string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    /// Case-insensitive substring match; the first matching rule wins.
    pub fn classify(level: &str) -> Self {
        let lowered = level.to_lowercase();
        let has = |term: &str| lowered.contains(term);

        if has("high") || has("critical") || has("emergency") {
            Self::High
        } else if has("medium") {
            Self::Medium
        } else if has("low") {
            Self::Low
        } else {
            Self::Unknown
        }
    }

    /// High severity switches the view into its emergency-visibility state.
    pub fn is_emergency(self) -> bool {
        self == Self::High
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
