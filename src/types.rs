use serde::Serialize;

use crate::audio::AudioSource;

#[derive(Debug, Clone)]
pub struct AlignmentInput {
    /// Raw transcript; the aligner's text normalizer cleans it first.
    pub transcript: String,
    pub audio: AudioSource,
    /// Absolute position of this audio within the source media, in seconds.
    pub time_offset_secs: f64,
}

/// Per-frame log-probabilities over the vocabulary, `[T][V]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Emissions {
    pub log_probs: Vec<Vec<f32>>,
    /// Number of raw audio samples the frames were computed from.
    pub input_sample_count: usize,
}

impl Emissions {
    pub fn num_frames(&self) -> usize {
        self.log_probs.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.log_probs.first().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence {
    pub tokens: Vec<usize>,
    /// Transcript words exactly as they were tokenized (after case folding).
    pub words: Vec<String>,
}

impl TokenSequence {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// One step of the recovered alignment path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub token_index: usize,
    pub time_index: usize,
    pub prob: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPath {
    /// Chronological order.
    pub points: Vec<Point>,
    /// Raw audio samples per emission frame.
    pub ratio: f64,
}

/// A run of frames carrying one label: a repeated character or a merged word.
/// Frame interval is `[start_frame, end_frame)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub start_frame: usize,
    pub end_frame: usize,
    pub score: f32,
}

impl Segment {
    pub fn length(&self) -> usize {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordTiming {
    pub word: String,
    pub start_frame: usize,
    pub end_frame: usize,
    /// Interval is [start_secs, end_secs), offset by the segment start.
    pub start_secs: f64,
    pub end_secs: f64,
    /// `HH:MM:SS.ff`, truncated to hundredths.
    pub start_time: String,
    pub end_time: String,
    /// Length-weighted mean of per-frame path probabilities, in [0, 1].
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentOutput {
    Words(Vec<WordTiming>),
    /// The cleaned transcript had nothing to align.
    NoSpeech,
}

impl AlignmentOutput {
    pub fn words(&self) -> &[WordTiming] {
        match self {
            Self::Words(words) => words,
            Self::NoSpeech => &[],
        }
    }

    pub fn is_no_speech(&self) -> bool {
        matches!(self, Self::NoSpeech)
    }
}
