//! Chunked parallel execution of the alignment engine.
//!
//! The target collection is split into contiguous chunks; worker threads
//! pull chunks from a job channel and classify every target in a chunk
//! against the same read-only [`ReferenceSet`] and [`CandidateIndex`].
//! Chunking decides only which thread handles a target, never which
//! references that target sees, so a target's classification is independent
//! of chunk boundaries and worker count.
//!
//! Failure isolation: a panic inside a chunk fails that chunk alone, and a
//! stalled run fails only the chunks that never reported. Failed chunks are
//! returned to the caller as a retryable list with their target-id ranges;
//! nothing is written to disk and nothing is silently dropped.

use crossbeam_channel::{unbounded, RecvTimeoutError};
use log::{debug, warn};
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use crate::config::{CoordinatorConfig, EngineConfig};
use crate::engine::{AlignmentEngine, MatchResult};
use crate::feature::Feature;
use crate::geometry;
use crate::index::CandidateIndex;
use crate::reference::ReferenceSet;

/// What happened to one target inside a successful chunk.
#[derive(Clone, Debug)]
pub enum TargetOutcome {
    /// Classified by the engine.
    Classified(MatchResult),
    /// Geometry was empty or degenerate; excluded from classification and
    /// reported separately.
    InvalidGeometry,
}

/// A chunk that produced no results.
#[derive(Clone, Debug)]
pub struct ChunkFailure {
    /// Chunk index within this run.
    pub chunk_id: usize,
    /// Target ids the chunk covered; these are unresolved and retryable.
    pub target_ids: Range<usize>,
    /// Human-readable failure reason (panic payload or timeout).
    pub reason: String,
}

/// Aggregated output of one coordinated run.
#[derive(Debug, Default)]
pub struct CoordinatorOutput {
    /// Per-target outcomes from successful chunks, keyed by target id.
    /// Unordered; callers sort as needed.
    pub outcomes: Vec<(usize, TargetOutcome)>,
    /// Chunks that failed, with their unresolved target ranges.
    pub failed_chunks: Vec<ChunkFailure>,
    /// Total number of chunks the run was split into.
    pub chunk_count: usize,
}

/// Message from a worker: one chunk's outcome.
struct ChunkReport {
    chunk_id: usize,
    payload: Result<Vec<(usize, TargetOutcome)>, String>,
}

/// Runs the engine over chunked targets with failure isolation.
pub struct ParallelCoordinator {
    config: CoordinatorConfig,
}

impl ParallelCoordinator {
    /// Create a coordinator.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Classify every target, concurrently, against the shared reference
    /// set and index.
    ///
    /// The only blocking wait is on the results channel, bounded by
    /// `chunk_timeout` per awaited result. When a wait expires, every chunk
    /// not yet reported is marked failed and no new chunks are started;
    /// chunks already in flight run to completion but their late results
    /// are discarded.
    pub fn run(
        &self,
        targets: &[Feature],
        references: &ReferenceSet,
        index: &CandidateIndex,
        engine_config: EngineConfig,
    ) -> CoordinatorOutput {
        let engine = AlignmentEngine::new(references, index, engine_config);
        self.run_with(targets.len(), |range| process_chunk(&engine, targets, range))
    }

    /// Chunk `0..len`, run `process` per chunk on worker threads, aggregate
    /// with failure isolation. `run` supplies the engine closure; tests
    /// supply misbehaving ones.
    fn run_with<F>(&self, len: usize, process: F) -> CoordinatorOutput
    where
        F: Fn(Range<usize>) -> Vec<(usize, TargetOutcome)> + Sync,
    {
        if len == 0 {
            return CoordinatorOutput::default();
        }

        let workers = self.worker_count();
        let ranges = self.chunk_ranges(len, workers);
        let chunk_count = ranges.len();
        debug!("aligning {len} targets in {chunk_count} chunk(s) on {workers} worker(s)");

        let (job_tx, job_rx) = unbounded::<(usize, Range<usize>)>();
        let (report_tx, report_rx) = unbounded::<ChunkReport>();
        for (chunk_id, range) in ranges.iter().cloned().enumerate() {
            job_tx.send((chunk_id, range)).expect("job channel open");
        }
        drop(job_tx);

        let mut outcomes = Vec::with_capacity(len);
        let mut reported = vec![false; chunk_count];
        let mut failed_chunks = Vec::new();

        thread::scope(|scope| {
            let process = &process;
            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let report_tx = report_tx.clone();
                thread::Builder::new()
                    .name(format!("align-{worker_id}"))
                    .spawn_scoped(scope, move || {
                        while let Ok((chunk_id, range)) = job_rx.recv() {
                            let payload =
                                catch_unwind(AssertUnwindSafe(|| process(range.clone())))
                                    .map_err(|panic| panic_message(panic.as_ref()));
                            if report_tx.send(ChunkReport { chunk_id, payload }).is_err() {
                                // Coordinator stopped listening (timed out).
                                break;
                            }
                        }
                    })
                    .expect("spawn alignment worker");
            }
            drop(report_tx);

            let mut received = 0;
            while received < chunk_count {
                match report_rx.recv_timeout(self.config.chunk_timeout) {
                    Ok(report) => {
                        received += 1;
                        reported[report.chunk_id] = true;
                        match report.payload {
                            Ok(mut chunk_outcomes) => outcomes.append(&mut chunk_outcomes),
                            Err(reason) => {
                                warn!(
                                    "chunk {} (targets {:?}) failed: {}",
                                    report.chunk_id, ranges[report.chunk_id], reason
                                );
                                failed_chunks.push(ChunkFailure {
                                    chunk_id: report.chunk_id,
                                    target_ids: ranges[report.chunk_id].clone(),
                                    reason,
                                });
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        warn!(
                            "no chunk result within {:?}; abandoning {} outstanding chunk(s)",
                            self.config.chunk_timeout,
                            chunk_count - received
                        );
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            // Stop workers from picking up chunks we are about to fail.
            while job_rx.try_recv().is_ok() {}
            drop(job_rx);
            drop(report_rx);
        });

        for (chunk_id, done) in reported.iter().enumerate() {
            if !done {
                failed_chunks.push(ChunkFailure {
                    chunk_id,
                    target_ids: ranges[chunk_id].clone(),
                    reason: "timed out".into(),
                });
            }
        }
        failed_chunks.sort_by_key(|f| f.chunk_id);

        CoordinatorOutput {
            outcomes,
            failed_chunks,
            chunk_count,
        }
    }

    fn worker_count(&self) -> usize {
        self.config.workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Contiguous chunk ranges covering `0..len`.
    fn chunk_ranges(&self, len: usize, workers: usize) -> Vec<Range<usize>> {
        let requested = self
            .config
            .chunk_count
            .unwrap_or(workers * self.config.fanout_multiplier)
            .max(1);
        let chunk_size = len.div_ceil(requested).max(1);
        (0..len)
            .step_by(chunk_size)
            .map(|start| start..(start + chunk_size).min(len))
            .collect()
    }
}

/// Classify every target in a chunk.
fn process_chunk(
    engine: &AlignmentEngine<'_>,
    targets: &[Feature],
    range: Range<usize>,
) -> Vec<(usize, TargetOutcome)> {
    range
        .map(|target_id| {
            let feature = &targets[target_id];
            let outcome = if geometry::is_valid(&feature.geometry) {
                TargetOutcome::Classified(engine.classify(&feature.geometry))
            } else {
                TargetOutcome::InvalidGeometry
            };
            (target_id, outcome)
        })
        .collect()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
