#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use subtitle_aligner::{
    AlignerConfig, AlignmentError, AlignmentInput, AudioSource, EmissionProvider, Emissions,
    ForcedAligner, ForcedAlignerBuilder, Vocabulary,
};

pub const LABELS: [&str; 9] = ["<s>", "<pad>", "</s>", "<unk>", "A", "C", "S", "T", "|"];
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Sample value that makes [`ScriptedProvider`] sleep before answering.
pub const SLOW_MARKER: f32 = -7.0;
/// Sample value that makes [`ScriptedProvider`] panic.
pub const PANIC_MARKER: f32 = -9.0;

pub fn vocabulary() -> Arc<Vocabulary> {
    Arc::new(Vocabulary::from_labels(&LABELS, 0, '|').expect("test vocabulary"))
}

pub fn label_id(label: &str) -> usize {
    LABELS
        .iter()
        .position(|l| *l == label)
        .unwrap_or_else(|| panic!("label {label} not in test vocabulary"))
}

/// One frame per entry; the named label gets `peak` probability, the rest
/// share what remains.
pub fn peaked_emissions(frame_labels: &[usize], peak: f32) -> Vec<Vec<f32>> {
    let rest = ((1.0 - peak) / (LABELS.len() - 1) as f32).ln();
    frame_labels
        .iter()
        .map(|&label| {
            let mut row = vec![rest; LABELS.len()];
            row[label] = peak.ln();
            row
        })
        .collect()
}

/// "CAT SAT" spoken one character per frame.
pub fn cat_sat_frames() -> Vec<usize> {
    ["C", "A", "T", "|", "S", "A", "T"]
        .iter()
        .map(|l| label_id(l))
        .collect()
}

/// Fixed emissions regardless of the audio.
pub struct FixedProvider {
    pub log_probs: Vec<Vec<f32>>,
}

impl EmissionProvider for FixedProvider {
    fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError> {
        Ok(Emissions {
            log_probs: self.log_probs.clone(),
            input_sample_count: samples.len(),
        })
    }

    fn device_label(&self) -> String {
        "fixed".to_string()
    }
}

/// One "CAT SAT" frame per sample, truncated to the sample count. Marker
/// values in the first sample trigger slow or panicking inference.
pub struct ScriptedProvider {
    pub slow_for: Duration,
}

impl EmissionProvider for ScriptedProvider {
    fn infer(&self, samples: &[f32]) -> Result<Emissions, AlignmentError> {
        match samples.first().copied() {
            Some(v) if v == SLOW_MARKER => thread::sleep(self.slow_for),
            Some(v) if v == PANIC_MARKER => panic!("emission backend crashed"),
            _ => {}
        }
        let frames = cat_sat_frames()
            .into_iter()
            .cycle()
            .take(samples.len())
            .collect::<Vec<_>>();
        Ok(Emissions {
            log_probs: peaked_emissions(&frames, 0.98),
            input_sample_count: samples.len(),
        })
    }

    fn device_label(&self) -> String {
        "scripted".to_string()
    }
}

pub fn aligner_with(provider: Box<dyn EmissionProvider>) -> ForcedAligner {
    ForcedAlignerBuilder::new(AlignerConfig::default())
        .with_vocabulary(vocabulary())
        .with_emission_provider(provider)
        .build()
        .expect("aligner builds")
}

pub fn input(transcript: &str, samples: Vec<f32>, offset: f64) -> AlignmentInput {
    AlignmentInput {
        transcript: transcript.to_string(),
        audio: AudioSource::RawSamples {
            samples,
            sample_rate_hz: SAMPLE_RATE_HZ,
        },
        time_offset_secs: offset,
    }
}
