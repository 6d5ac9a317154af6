use crate::alignment::vocabulary::Vocabulary;
use crate::error::AlignmentError;
use crate::types::{Point, Segment};

/// Collapses consecutive path points on the same token into one segment
/// spanning `[first.time_index, last.time_index + 1)`, scored by the mean
/// per-frame probability.
pub fn merge_repeats(points: &[Point], tokens: &[usize], vocab: &Vocabulary) -> Vec<Segment> {
    let mut segments = Vec::new();
    for run in points.chunk_by(|a, b| a.token_index == b.token_index) {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        let label = tokens
            .get(first.token_index)
            .and_then(|&id| vocab.symbol(id))
            .unwrap_or_default()
            .to_string();
        let score = run.iter().map(|p| p.prob).sum::<f32>() / run.len() as f32;
        segments.push(Segment {
            label,
            start_frame: first.time_index,
            end_frame: last.time_index + 1,
            score,
        });
    }
    segments
}

/// Groups character segments into words, splitting on separator segments.
///
/// Word confidence is the length-weighted mean of character scores. Words
/// whose characters carry no frames at all are dropped with a warning.
pub fn merge_words(segments: &[Segment], separator: &str) -> Vec<Segment> {
    let mut words = Vec::new();
    for run in segments
        .split(|seg| seg.label == separator)
        .filter(|run| !run.is_empty())
    {
        match word_from_run(run) {
            Ok(word) => words.push(word),
            Err(err) => tracing::warn!(error = %err, "segments: dropping word"),
        }
    }
    words
}

fn word_from_run(run: &[Segment]) -> Result<Segment, AlignmentError> {
    let label: String = run.iter().map(|seg| seg.label.as_str()).collect();
    let total_weight: usize = run.iter().map(Segment::length).sum();
    if total_weight == 0 {
        return Err(AlignmentError::DegenerateWord { word: label });
    }
    let weighted: f32 = run
        .iter()
        .map(|seg| seg.score * seg.length() as f32)
        .sum();

    let (start_frame, end_frame) = match (run.first(), run.last()) {
        (Some(first), Some(last)) => (first.start_frame, last.end_frame),
        _ => return Err(AlignmentError::DegenerateWord { word: label }),
    };
    Ok(Segment {
        label,
        start_frame,
        end_frame,
        score: weighted / total_weight as f32,
    })
}
