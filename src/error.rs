use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("unknown symbol '{symbol}' in transcript word '{word}'")]
    UnknownSymbol { symbol: char, word: String },
    #[error("alignment failed: {frames} emission frames cannot consume {tokens} transcript tokens")]
    AlignmentFailure { frames: usize, tokens: usize },
    #[error("word '{word}' has zero total frame weight")]
    DegenerateWord { word: String },
    #[error("no aligner registered for language '{language}'")]
    UnsupportedLanguage { language: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// True for failures that only invalidate the segment being aligned.
    /// The batch runner reports them as unaligned segments, not runtime faults.
    pub fn is_segment_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownSymbol { .. } | Self::AlignmentFailure { .. } | Self::DegenerateWord { .. }
        )
    }
}
