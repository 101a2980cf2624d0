//! Dual-channel tool results

/// Outcome of a tool execution.
///
/// Tools always return a value; a failure is an ordinary result with
/// [`is_error`](ToolResult::is_error) set. The two text channels are
/// independent: `for_llm` is fed back to the model, `for_user` is shown to
/// the operator, and either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolResult {
    /// Text returned to the model.
    pub for_llm: String,
    /// Text shown to the operator.
    pub for_user: String,
    /// Whether the execution failed.
    pub is_error: bool,
    /// Display chain of the underlying cause, when one exists.
    pub source: Option<String>,
}

impl ToolResult {
    /// Result with the same text on both channels.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            for_llm: text.clone(),
            for_user: text,
            is_error: false,
            source: None,
        }
    }

    /// Result visible to the model only.
    pub fn silent(text: impl Into<String>) -> Self {
        Self {
            for_llm: text.into(),
            for_user: String::new(),
            is_error: false,
            source: None,
        }
    }

    /// Result visible to the operator only.
    pub fn user_only(text: impl Into<String>) -> Self {
        Self {
            for_llm: String::new(),
            for_user: text.into(),
            is_error: false,
            source: None,
        }
    }

    /// Error result with identical text on both channels.
    pub fn error(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            for_llm: text.clone(),
            for_user: text,
            is_error: true,
            source: None,
        }
    }

    /// Record the underlying cause.
    pub fn with_source(mut self, err: impl std::fmt::Display) -> Self {
        self.source = Some(err.to_string());
        self
    }
}
