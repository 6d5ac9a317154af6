use std::path::Path;
use std::sync::Arc;

use crate::alignment::vocabulary::Vocabulary;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{
    BasicTextNormalizer, SegmentWordGrouper, TrellisSequenceAligner, VocabularyTokenizer,
};
use crate::pipeline::emission::build_emission_provider;
use crate::pipeline::runtime::{ForcedAligner, ForcedAlignerParts};
use crate::pipeline::traits::{
    EmissionProvider, SequenceAligner, TextNormalizer, Tokenizer, WordGrouper,
};

pub struct ForcedAlignerBuilder {
    config: AlignerConfig,
    vocabulary: Option<Arc<Vocabulary>>,
    emission_provider: Option<Box<dyn EmissionProvider>>,
    text_normalizer: Option<Box<dyn TextNormalizer>>,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    word_grouper: Option<Box<dyn WordGrouper>>,
}

impl ForcedAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            vocabulary: None,
            emission_provider: None,
            text_normalizer: None,
            tokenizer: None,
            sequence_aligner: None,
            word_grouper: None,
        }
    }

    /// Skips loading `vocab_path`.
    pub fn with_vocabulary(mut self, vocabulary: Arc<Vocabulary>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Skips loading the ONNX model from `model_path`.
    pub fn with_emission_provider(mut self, emission_provider: Box<dyn EmissionProvider>) -> Self {
        self.emission_provider = Some(emission_provider);
        self
    }

    pub fn with_text_normalizer(mut self, text_normalizer: Box<dyn TextNormalizer>) -> Self {
        self.text_normalizer = Some(text_normalizer);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_word_grouper(mut self, word_grouper: Box<dyn WordGrouper>) -> Self {
        self.word_grouper = Some(word_grouper);
        self
    }

    pub fn build(self) -> Result<ForcedAligner, AlignmentError> {
        let expected_sample_rate_hz = if self.config.expected_sample_rate_hz == 0 {
            AlignerConfig::DEFAULT_SAMPLE_RATE_HZ
        } else {
            self.config.expected_sample_rate_hz
        };

        let vocab = match self.vocabulary {
            Some(vocab) => vocab,
            None => Arc::new(Vocabulary::load(
                Path::new(&self.config.vocab_path),
                self.config.blank_id,
                self.config.word_separator,
            )?),
        };

        let emission_provider = match self.emission_provider {
            Some(provider) => provider,
            None => build_emission_provider(&self.config)?,
        };

        tracing::info!(
            language = %self.config.language,
            vocab_size = vocab.len(),
            device = %emission_provider.device_label(),
            expected_sample_rate_hz,
            "forced aligner ready"
        );

        Ok(ForcedAligner::from_parts(ForcedAlignerParts {
            language: self.config.language,
            vocab,
            expected_sample_rate_hz,
            emission_provider,
            text_normalizer: self
                .text_normalizer
                .unwrap_or_else(|| Box::new(BasicTextNormalizer)),
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(VocabularyTokenizer)),
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(TrellisSequenceAligner)),
            word_grouper: self
                .word_grouper
                .unwrap_or_else(|| Box::new(SegmentWordGrouper)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Emissions;

    struct MockProvider;

    impl EmissionProvider for MockProvider {
        fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError> {
            Ok(Emissions {
                log_probs: vec![vec![-(4f32.ln()); 4]; 10],
                input_sample_count: samples.len(),
            })
        }

        fn device_label(&self) -> String {
            "mock".to_string()
        }
    }

    fn config_with_vocab(vocab_path: &Path) -> AlignerConfig {
        AlignerConfig {
            vocab_path: vocab_path.to_string_lossy().to_string(),
            ..AlignerConfig::default()
        }
    }

    #[test]
    fn build_success_with_mock_provider_and_vocab_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vocab_path = dir.path().join("vocab.json");
        std::fs::write(&vocab_path, r#"{"<pad>": 0, "a": 1, "b": 2, "|": 3}"#)
            .expect("write vocab");

        let aligner = ForcedAlignerBuilder::new(config_with_vocab(&vocab_path))
            .with_emission_provider(Box::new(MockProvider))
            .build()
            .expect("build should succeed");
        assert_eq!(aligner.language(), "en");
        assert_eq!(aligner.device_label(), "mock");
        assert_eq!(aligner.vocabulary().index_of('b'), Some(2));
    }

    #[test]
    fn build_fails_on_missing_vocab() {
        let result = ForcedAlignerBuilder::new(config_with_vocab(Path::new(
            "/nonexistent/vocab.json",
        )))
        .with_emission_provider(Box::new(MockProvider))
        .build();
        assert!(matches!(result, Err(AlignmentError::Io { .. })));
    }

    #[test]
    fn build_fails_when_vocab_lacks_separator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vocab_path = dir.path().join("vocab.json");
        std::fs::write(&vocab_path, r#"{"<pad>": 0, "a": 1}"#).expect("write vocab");

        let result = ForcedAlignerBuilder::new(config_with_vocab(&vocab_path))
            .with_emission_provider(Box::new(MockProvider))
            .build();
        assert!(matches!(result, Err(AlignmentError::InvalidInput { .. })));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn build_without_provider_needs_onnx_feature() {
        let vocab = Vocabulary::from_labels(&["<pad>", "a", "|"], 0, '|').expect("vocab");
        let result = ForcedAlignerBuilder::new(AlignerConfig::default())
            .with_vocabulary(Arc::new(vocab))
            .build();
        assert!(matches!(result, Err(AlignmentError::Runtime { .. })));
    }
}
