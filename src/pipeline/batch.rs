use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::AlignmentError;
use crate::pipeline::runtime::ForcedAligner;
use crate::types::{AlignmentInput, AlignmentOutput, WordTiming};

/// Label attached to segments that could not be aligned.
pub const UNKNOWN_LABEL: &str = "[Unknown]";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SegmentFailure {
    UnknownSymbol(char),
    AlignmentImpossible,
    TimedOut,
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentAlignment {
    Aligned { words: Vec<WordTiming> },
    NoSpeech,
    Unknown { label: &'static str, failure: SegmentFailure },
}

impl SegmentAlignment {
    pub fn unknown(failure: SegmentFailure) -> Self {
        Self::Unknown {
            label: UNKNOWN_LABEL,
            failure,
        }
    }

    pub fn from_result(result: Result<AlignmentOutput, AlignmentError>) -> Self {
        match result {
            Ok(AlignmentOutput::Words(words)) => Self::Aligned { words },
            Ok(AlignmentOutput::NoSpeech) => Self::NoSpeech,
            Err(AlignmentError::UnknownSymbol { symbol, .. }) => {
                Self::unknown(SegmentFailure::UnknownSymbol(symbol))
            }
            Err(err) if err.is_segment_local() => {
                Self::unknown(SegmentFailure::AlignmentImpossible)
            }
            Err(err) => Self::unknown(SegmentFailure::Runtime(err.to_string())),
        }
    }

    pub fn words(&self) -> &[WordTiming] {
        match self {
            Self::Aligned { words } => words,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    /// Measured from when a worker picks the segment up.
    pub segment_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            segment_timeout: None,
        }
    }
}

type SegmentQueue = Arc<Mutex<VecDeque<(usize, AlignmentInput)>>>;

enum WorkerEvent {
    Started(usize, Instant),
    Finished(usize, Result<AlignmentOutput, AlignmentError>),
}

/// Aligns independent segments on a pool of worker threads.
///
/// A failing, panicking or timed-out segment only affects its own result.
/// The emission provider is shared; it serializes device access itself.
pub struct BatchAligner {
    aligner: Arc<ForcedAligner>,
    options: BatchOptions,
}

impl BatchAligner {
    pub fn new(aligner: Arc<ForcedAligner>, options: BatchOptions) -> Self {
        Self { aligner, options }
    }

    pub fn align_all(&self, inputs: Vec<AlignmentInput>) -> Vec<SegmentAlignment> {
        self.align_all_with_progress(inputs, |_, _| {})
    }

    /// `on_resolved` runs on the calling thread once per segment, in
    /// completion order.
    pub fn align_all_with_progress(
        &self,
        inputs: Vec<AlignmentInput>,
        mut on_resolved: impl FnMut(usize, &SegmentAlignment),
    ) -> Vec<SegmentAlignment> {
        let total = inputs.len();
        if total == 0 {
            return Vec::new();
        }

        let queue: SegmentQueue = Arc::new(Mutex::new(inputs.into_iter().enumerate().collect()));
        let (tx, rx) = mpsc::channel();
        let mut spawned = 0;
        for _ in 0..self.options.workers.clamp(1, total) {
            if self.spawn_worker(&queue, &tx) {
                spawned += 1;
            }
        }
        if spawned == 0 {
            tracing::warn!("batch: no worker thread could be spawned, aligning inline");
            run_worker(&self.aligner, &queue, &tx);
        }

        let mut results: Vec<Option<SegmentAlignment>> = (0..total).map(|_| None).collect();
        let mut in_flight: HashMap<usize, Instant> = HashMap::new();
        let mut resolved = 0;

        while resolved < total {
            let next_deadline = self
                .options
                .segment_timeout
                .and_then(|timeout| in_flight.values().map(|started| *started + timeout).min());
            let event = match next_deadline {
                Some(deadline) => {
                    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(event) => Some(event),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                },
            };

            match event {
                Some(WorkerEvent::Started(index, started)) => {
                    in_flight.insert(index, started);
                }
                Some(WorkerEvent::Finished(index, result)) => {
                    in_flight.remove(&index);
                    if results[index].is_none() {
                        match &result {
                            Err(err) if err.is_segment_local() => {
                                tracing::warn!(
                                    segment = index,
                                    error = %err,
                                    "batch: segment unaligned"
                                );
                            }
                            Err(err) => {
                                tracing::error!(
                                    segment = index,
                                    error = %err,
                                    "batch: segment failed"
                                );
                            }
                            Ok(_) => {}
                        }
                        let outcome = SegmentAlignment::from_result(result);
                        on_resolved(index, &outcome);
                        results[index] = Some(outcome);
                        resolved += 1;
                    }
                }
                None => {
                    let now = Instant::now();
                    let Some(timeout) = self.options.segment_timeout else {
                        continue;
                    };
                    let expired: Vec<usize> = in_flight
                        .iter()
                        .filter(|(_, started)| **started + timeout <= now)
                        .map(|(index, _)| *index)
                        .collect();
                    for index in expired {
                        in_flight.remove(&index);
                        tracing::warn!(
                            segment = index,
                            timeout_ms = timeout.as_millis() as u64,
                            "batch: segment timed out, replacing its worker"
                        );
                        let outcome = SegmentAlignment::unknown(SegmentFailure::TimedOut);
                        on_resolved(index, &outcome);
                        results[index] = Some(outcome);
                        resolved += 1;
                        // The stuck worker is abandoned; keep the pool at size.
                        self.spawn_worker(&queue, &tx);
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    SegmentAlignment::unknown(SegmentFailure::Runtime(
                        "alignment worker exited without a result".to_string(),
                    ))
                })
            })
            .collect()
    }

    fn spawn_worker(&self, queue: &SegmentQueue, tx: &Sender<WorkerEvent>) -> bool {
        let aligner = Arc::clone(&self.aligner);
        let queue = Arc::clone(queue);
        let tx = tx.clone();
        match thread::Builder::new()
            .name("alignment-worker".to_string())
            .spawn(move || run_worker(&aligner, &queue, &tx))
        {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "batch: failed to spawn alignment worker");
                false
            }
        }
    }
}

fn run_worker(aligner: &ForcedAligner, queue: &SegmentQueue, tx: &Sender<WorkerEvent>) {
    loop {
        let next = match queue.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(_) => None,
        };
        let Some((index, input)) = next else {
            break;
        };
        if tx.send(WorkerEvent::Started(index, Instant::now())).is_err() {
            break;
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| aligner.align(&input)))
            .unwrap_or_else(|_| {
                Err(AlignmentError::runtime(
                    "align segment",
                    "alignment worker panicked",
                ))
            });
        if tx.send(WorkerEvent::Finished(index, result)).is_err() {
            break;
        }
    }
}
