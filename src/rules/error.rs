//! Per-line diagnostics produced while parsing a rules file

use thiserror::Error;

/// A rules file line that could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: {content}")]
pub struct RuleError {
    /// 1-based line number
    pub line: usize,
    /// The offending line, trailing whitespace removed
    pub content: String,
    pub kind: RuleErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleErrorKind {
    #[error("unknown section")]
    UnknownSection,
    #[error("entry outside of any section")]
    NoSection,
    #[error("expected key=value")]
    MalformedOption,
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("expected field:pattern")]
    MalformedMatcher,
    #[error("unknown field '{0}', expected all, summary, body, application or urgency")]
    UnknownField(String),
    #[error("invalid regular expression ({0})")]
    InvalidRegex(String),
    #[error("unknown urgency '{0}', expected LOW, NORMAL or CRITICAL")]
    InvalidUrgency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_references_line_and_content() {
        let err = RuleError {
            line: 4,
            content: "titel:foo".to_string(),
            kind: RuleErrorKind::UnknownField("titel".to_string()),
        };
        let text = err.to_string();
        assert!(text.starts_with("line 4: unknown field 'titel'"));
        assert!(text.ends_with(": titel:foo"));
    }
}
