use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::error::AlignmentError;
use crate::pipeline::builder::ForcedAlignerBuilder;
use crate::pipeline::runtime::ForcedAligner;
use crate::types::{AlignmentInput, AlignmentOutput};

/// Per-language aligners, built once at startup and handed to callers.
#[derive(Default)]
pub struct AlignerRegistry {
    aligners: HashMap<String, Arc<ForcedAligner>>,
}

impl AlignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every configured language with the default pipeline.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, AlignmentError> {
        let mut registry = Self::new();
        for language_config in &config.languages {
            let aligner = ForcedAlignerBuilder::new(language_config.clone()).build()?;
            registry.register(aligner);
        }
        Ok(registry)
    }

    /// Registers under the aligner's own language, replacing any previous one.
    pub fn register(&mut self, aligner: ForcedAligner) -> Option<Arc<ForcedAligner>> {
        let language = aligner.language().to_string();
        tracing::info!(language = language.as_str(), "registry: aligner registered");
        self.aligners.insert(language, Arc::new(aligner))
    }

    pub fn get(&self, language: &str) -> Result<Arc<ForcedAligner>, AlignmentError> {
        self.aligners
            .get(language)
            .cloned()
            .ok_or_else(|| AlignmentError::UnsupportedLanguage {
                language: language.to_string(),
            })
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.aligners.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    pub fn align(
        &self,
        language: &str,
        input: &AlignmentInput,
    ) -> Result<AlignmentOutput, AlignmentError> {
        self.get(language)?.align(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::vocabulary::Vocabulary;
    use crate::audio::AudioSource;
    use crate::config::AlignerConfig;
    use crate::pipeline::traits::EmissionProvider;
    use crate::types::Emissions;

    struct SilentProvider;

    impl EmissionProvider for SilentProvider {
        fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError> {
            Ok(Emissions {
                log_probs: vec![vec![0.0, f32::NEG_INFINITY, f32::NEG_INFINITY]; 4],
                input_sample_count: samples.len(),
            })
        }

        fn device_label(&self) -> String {
            "mock".to_string()
        }
    }

    fn aligner(language: &str) -> ForcedAligner {
        let vocab = Vocabulary::from_labels(&["<pad>", "a", "|"], 0, '|').expect("vocab");
        ForcedAlignerBuilder::new(AlignerConfig {
            language: language.to_string(),
            ..AlignerConfig::default()
        })
        .with_vocabulary(Arc::new(vocab))
        .with_emission_provider(Box::new(SilentProvider))
        .build()
        .expect("aligner builds")
    }

    #[test]
    fn lookup_by_language() {
        let mut registry = AlignerRegistry::new();
        assert!(registry.register(aligner("hi")).is_none());
        assert!(registry.register(aligner("en")).is_none());

        assert_eq!(registry.languages(), ["en", "hi"]);
        let hindi = registry.get("hi").expect("registered");
        assert_eq!(hindi.language(), "hi");
    }

    #[test]
    fn re_registering_replaces_previous() {
        let mut registry = AlignerRegistry::new();
        registry.register(aligner("en"));
        assert!(registry.register(aligner("en")).is_some());
        assert_eq!(registry.languages().len(), 1);
    }

    #[test]
    fn unknown_language_is_typed_error() {
        let registry = AlignerRegistry::new();
        let input = AlignmentInput {
            transcript: "a".to_string(),
            audio: AudioSource::RawSamples {
                samples: vec![0.0; 4],
                sample_rate_hz: 16_000,
            },
            time_offset_secs: 0.0,
        };
        let err = registry.align("xx", &input).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::UnsupportedLanguage { ref language } if language == "xx"
        ));
    }

    #[test]
    fn align_routes_to_language() {
        let mut registry = AlignerRegistry::new();
        registry.register(aligner("en"));
        let input = AlignmentInput {
            transcript: "...".to_string(),
            audio: AudioSource::RawSamples {
                samples: vec![0.0; 4],
                sample_rate_hz: 16_000,
            },
            time_offset_secs: 0.0,
        };
        let output = registry.align("en", &input).unwrap();
        assert!(output.is_no_speech());
    }
}
