use std::sync::Arc;

use crate::alignment::timing::{format_timestamp, frame_to_seconds};
use crate::alignment::vocabulary::Vocabulary;
use crate::error::AlignmentError;
use crate::pipeline::traits::{
    EmissionProvider, SequenceAligner, TextNormalizer, Tokenizer, WordGrouper,
};
use crate::types::{
    AlignmentInput, AlignmentOutput, Emissions, Segment, TokenSequence, WordTiming,
};

pub struct ForcedAligner {
    language: String,
    vocab: Arc<Vocabulary>,
    expected_sample_rate_hz: u32,
    emission_provider: Box<dyn EmissionProvider>,
    text_normalizer: Box<dyn TextNormalizer>,
    tokenizer: Box<dyn Tokenizer>,
    sequence_aligner: Box<dyn SequenceAligner>,
    word_grouper: Box<dyn WordGrouper>,
}

pub(crate) struct ForcedAlignerParts {
    pub language: String,
    pub vocab: Arc<Vocabulary>,
    pub expected_sample_rate_hz: u32,
    pub emission_provider: Box<dyn EmissionProvider>,
    pub text_normalizer: Box<dyn TextNormalizer>,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub word_grouper: Box<dyn WordGrouper>,
}

impl ForcedAligner {
    pub(crate) fn from_parts(parts: ForcedAlignerParts) -> Self {
        Self {
            language: parts.language,
            vocab: parts.vocab,
            expected_sample_rate_hz: parts.expected_sample_rate_hz,
            emission_provider: parts.emission_provider,
            text_normalizer: parts.text_normalizer,
            tokenizer: parts.tokenizer,
            sequence_aligner: parts.sequence_aligner,
            word_grouper: parts.word_grouper,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn device_label(&self) -> String {
        self.emission_provider.device_label()
    }

    /// Aligns one transcript against its audio.
    ///
    /// Text is cleaned and tokenized before any audio work, so transcripts with
    /// nothing to align or with unknown characters never reach the model.
    pub fn align(&self, input: &AlignmentInput) -> Result<AlignmentOutput, AlignmentError> {
        let Some(token_sequence) = self.prepare_tokens(&input.transcript)? else {
            return Ok(AlignmentOutput::NoSpeech);
        };

        let waveform = input.audio.resolve()?;
        if waveform.samples.is_empty() {
            return Err(AlignmentError::AlignmentFailure {
                frames: 0,
                tokens: token_sequence.tokens.len(),
            });
        }
        if waveform.sample_rate_hz != self.expected_sample_rate_hz {
            tracing::warn!(
                expected_rate_hz = self.expected_sample_rate_hz,
                actual_rate_hz = waveform.sample_rate_hz,
                "emission model expects a different sample rate; quality may degrade"
            );
        }

        let emissions = self.emission_provider.infer(&waveform.samples)?;
        self.align_tokens(
            &token_sequence,
            &emissions,
            waveform.sample_rate_hz,
            input.time_offset_secs,
        )
    }

    /// Aligns a transcript against emissions computed elsewhere.
    pub fn align_emissions(
        &self,
        transcript: &str,
        emissions: &Emissions,
        sample_rate_hz: u32,
        time_offset_secs: f64,
    ) -> Result<AlignmentOutput, AlignmentError> {
        let Some(token_sequence) = self.prepare_tokens(transcript)? else {
            return Ok(AlignmentOutput::NoSpeech);
        };
        self.align_tokens(&token_sequence, emissions, sample_rate_hz, time_offset_secs)
    }

    /// `None` when the cleaned transcript has nothing to align.
    fn prepare_tokens(&self, transcript: &str) -> Result<Option<TokenSequence>, AlignmentError> {
        let cleaned = self.text_normalizer.normalize(transcript, &self.language);
        if cleaned.trim().is_empty() {
            tracing::debug!(transcript, "align: no speech");
            return Ok(None);
        }
        let token_sequence = self.tokenizer.tokenize(&cleaned, &self.vocab)?;
        Ok((!token_sequence.is_empty()).then_some(token_sequence))
    }

    fn align_tokens(
        &self,
        token_sequence: &TokenSequence,
        emissions: &Emissions,
        sample_rate_hz: u32,
        time_offset_secs: f64,
    ) -> Result<AlignmentOutput, AlignmentError> {
        let path = self.sequence_aligner.align_path(
            &emissions.log_probs,
            &token_sequence.tokens,
            self.vocab.blank_id(),
            emissions.input_sample_count,
        )?;
        let segments = self
            .word_grouper
            .group_words(&path, token_sequence, &self.vocab);

        let words = segments
            .into_iter()
            .map(|seg| to_word_timing(seg, path.ratio, sample_rate_hz, time_offset_secs))
            .collect::<Vec<_>>();

        tracing::debug!(
            frames = emissions.num_frames(),
            tokens = token_sequence.tokens.len(),
            words = words.len(),
            "align: done"
        );
        Ok(AlignmentOutput::Words(words))
    }
}

fn to_word_timing(seg: Segment, ratio: f64, sample_rate_hz: u32, offset_secs: f64) -> WordTiming {
    let start_secs = frame_to_seconds(seg.start_frame, ratio, sample_rate_hz, offset_secs);
    let end_secs = frame_to_seconds(seg.end_frame, ratio, sample_rate_hz, offset_secs);
    WordTiming {
        word: seg.label,
        start_frame: seg.start_frame,
        end_frame: seg.end_frame,
        start_secs,
        end_secs,
        start_time: format_timestamp(start_secs),
        end_time: format_timestamp(end_secs),
        confidence: seg.score,
    }
}
