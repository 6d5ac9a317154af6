use crate::alignment::vocabulary::Vocabulary;
use crate::error::AlignmentError;
use crate::types::{AlignmentPath, Emissions, Segment, TokenSequence};

/// Produces per-frame log-probabilities for a mono waveform.
///
/// Implementations that own device state serialize inference internally;
/// callers may share one provider across threads.
pub trait EmissionProvider: Send + Sync {
    fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError>;

    fn device_label(&self) -> String;
}

pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, raw_text: &str, language: &str) -> String;
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, transcript: &str, vocab: &Vocabulary)
        -> Result<TokenSequence, AlignmentError>;
}

pub trait SequenceAligner: Send + Sync {
    fn align_path(
        &self,
        log_probs: &[Vec<f32>],
        tokens: &[usize],
        blank_id: usize,
        input_sample_count: usize,
    ) -> Result<AlignmentPath, AlignmentError>;
}

pub trait WordGrouper: Send + Sync {
    /// Word segments in chronological order, frame-based.
    fn group_words(
        &self,
        path: &AlignmentPath,
        token_sequence: &TokenSequence,
        vocab: &Vocabulary,
    ) -> Vec<Segment>;
}
