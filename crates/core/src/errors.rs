use thiserror::Error;

/// Rejection of a proposal tool input before it reaches the document.
///
/// A proposal that fails validation is dropped from the decoded result; it is
/// never retried and never reaches the mutation applier.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown proposal tool `{tool_name}`")]
    UnknownTool { tool_name: String },
    #[error("malformed input for `{tool_name}`: {detail}")]
    MalformedInput { tool_name: &'static str, detail: String },
    #[error("review score {score} is outside 1..=5")]
    ScoreOutOfRange { score: u8 },
    #[error("insertAfter {value} is below -1")]
    InsertPositionOutOfRange { value: i64 },
    #[error("single-slide markdown must not contain the slide delimiter")]
    DelimiterInSingleSlide,
}

/// Refusal of a structurally valid mutation against the live document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("slide index {slide_index} is out of bounds for a deck of {slide_count} slides")]
    SlideOutOfBounds { slide_index: usize, slide_count: usize },
}

/// Per-turn failure taxonomy surfaced to the transport caller.
///
/// Nothing in this layer retries; the caller decides whether to re-issue the
/// whole turn. The user message appended before the failing call is preserved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("no language model is bound: {0}")]
    Configuration(String),
    #[error("intent classification failed: {0}")]
    Classification(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    MutationRefused(#[from] MutationError),
    #[error("transport failure (status {status}): {message}")]
    Transport { status: u16, message: String },
}

impl ChatError {
    /// HTTP status the transport should answer with when a turn fails before
    /// or outside the event stream.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 500,
            Self::Classification(_) => 502,
            Self::Validation(_) | Self::MutationRefused { .. } => 422,
            Self::Transport { status, .. } => *status,
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Classification(_) => "classification",
            Self::Validation(_) => "validation",
            Self::MutationRefused { .. } => "mutation_refused",
            Self::Transport { .. } => "transport",
        }
    }
}
