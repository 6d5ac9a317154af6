use crate::alignment::backtrack::backtrack;
use crate::alignment::normalization::normalize_basic;
use crate::alignment::segments::{merge_repeats, merge_words};
use crate::alignment::tokenization::build_token_sequence;
use crate::alignment::trellis::Trellis;
use crate::alignment::vocabulary::Vocabulary;
use crate::error::AlignmentError;
use crate::pipeline::traits::{SequenceAligner, TextNormalizer, Tokenizer, WordGrouper};
use crate::types::{AlignmentPath, Segment, TokenSequence};

pub struct BasicTextNormalizer;

impl TextNormalizer for BasicTextNormalizer {
    fn normalize(&self, raw_text: &str, _language: &str) -> String {
        normalize_basic(raw_text)
    }
}

pub struct VocabularyTokenizer;

impl Tokenizer for VocabularyTokenizer {
    fn tokenize(
        &self,
        transcript: &str,
        vocab: &Vocabulary,
    ) -> Result<TokenSequence, AlignmentError> {
        build_token_sequence(transcript, vocab)
    }
}

pub struct TrellisSequenceAligner;

impl SequenceAligner for TrellisSequenceAligner {
    fn align_path(
        &self,
        log_probs: &[Vec<f32>],
        tokens: &[usize],
        blank_id: usize,
        input_sample_count: usize,
    ) -> Result<AlignmentPath, AlignmentError> {
        let trellis = Trellis::build(log_probs, tokens, blank_id, input_sample_count)?;
        backtrack(&trellis, log_probs, tokens, blank_id)
    }
}

pub struct SegmentWordGrouper;

impl WordGrouper for SegmentWordGrouper {
    fn group_words(
        &self,
        path: &AlignmentPath,
        token_sequence: &TokenSequence,
        vocab: &Vocabulary,
    ) -> Vec<Segment> {
        let chars = merge_repeats(&path.points, &token_sequence.tokens, vocab);
        let separator = vocab
            .symbol(vocab.separator_id())
            .unwrap_or_default()
            .to_string();
        let words = merge_words(&chars, &separator);
        tracing::debug!(
            char_segments = chars.len(),
            words = words.len(),
            expected_words = token_sequence.words.len(),
            "grouping: merged path into words"
        );
        words
    }
}
