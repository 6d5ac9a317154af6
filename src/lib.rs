pub mod alignment;
pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::vocabulary::Vocabulary;
pub use audio::{AudioSource, Waveform};
pub use config::{AlignerConfig, RegistryConfig};
pub use error::AlignmentError;
pub use pipeline::batch::{BatchAligner, BatchOptions, SegmentAlignment, SegmentFailure};
pub use pipeline::builder::ForcedAlignerBuilder;
pub use pipeline::registry::AlignerRegistry;
pub use pipeline::runtime::ForcedAligner;
pub use pipeline::traits::{
    EmissionProvider, SequenceAligner, TextNormalizer, Tokenizer, WordGrouper,
};
pub use types::{
    AlignmentInput, AlignmentOutput, AlignmentPath, Emissions, Point, Segment, TokenSequence,
    WordTiming,
};
