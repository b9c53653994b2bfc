//! Configuration for the alignment pipeline.
//!
//! All parameters have defaults tuned for cadastral data in a metric CRS
//! (meters). Every value is explicit; nothing is read from the environment
//! or from hardcoded paths.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// How the reference set is simplified before indexing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimplifyStrategy {
    /// Use references as-is.
    None,
    /// Greedy deterministic clustering: merge references whose centroids are
    /// within `max_merge_distance` of a seed's centroid and that share a
    /// boundary with the seed. Reclassifies adjacency without altering
    /// boundary geometry.
    Cluster {
        /// Maximum centroid distance for merging (meters).
        /// Default: 50.0
        max_merge_distance: f64,
    },
    /// Buffer every reference outward, union, decompose. Closes micro-gaps
    /// that clustering cannot, at the cost of altering boundary geometry.
    /// Lossy; must be chosen explicitly.
    DissolveBuffer {
        /// Outward buffer distance (meters).
        /// Default when selected: 0.1
        buffer_distance: f64,
    },
}

/// Reference preprocessing configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// References smaller than this area (m²) are unioned together before
    /// the strategy pass; only touching ones actually fuse.
    /// `None` disables the merge-small pass.
    /// Default: 1000.0
    pub min_area_threshold: Option<f64>,

    /// The strategy pass.
    /// Default: `Cluster { max_merge_distance: 50.0 }`
    pub strategy: SimplifyStrategy,

    /// Douglas-Peucker tolerance applied to the simplified references.
    /// `None` leaves vertices untouched.
    /// Default: None
    pub simplify_tolerance: Option<f64>,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            min_area_threshold: Some(1000.0),
            strategy: SimplifyStrategy::Cluster {
                max_merge_distance: 50.0,
            },
            simplify_tolerance: None,
        }
    }
}

/// Per-target classification thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum overlap ratio (intersection area / target area) for a target
    /// to be `Aligned`. Set to 1.0 for containment-only semantics.
    /// Default: 0.5
    pub min_overlap_ratio: f64,

    /// Maximum centroid-to-centroid distance (meters) for a non-overlapping
    /// target to be `Adjusted` onto the nearest reference.
    /// Default: 25.0
    pub max_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_overlap_ratio: 0.5,
            max_distance: 25.0,
        }
    }
}

/// Parallel execution configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Worker thread count. `None` uses the available parallelism.
    /// Default: None
    pub workers: Option<usize>,

    /// Chunks per worker when `chunk_count` is not set. More chunks give
    /// finer failure isolation and better load balance.
    /// Default: 2
    pub fanout_multiplier: usize,

    /// Explicit chunk count, overriding `workers × fanout_multiplier`.
    /// Default: None
    pub chunk_count: Option<usize>,

    /// How long the coordinator waits for any chunk result before declaring
    /// the outstanding chunks failed.
    /// Default: 300s
    pub chunk_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: None,
            fanout_multiplier: 2,
            chunk_count: None,
            chunk_timeout: Duration::from_secs(300),
        }
    }
}

/// Top-level configuration for one alignment run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Reference preprocessing.
    pub simplify: SimplifyConfig,
    /// Classification thresholds.
    pub engine: EngineConfig,
    /// Parallel execution.
    pub coordinator: CoordinatorConfig,
}

impl AlignConfig {
    /// Set the minimum overlap ratio.
    pub fn with_min_overlap_ratio(mut self, ratio: f64) -> Self {
        self.engine.min_overlap_ratio = ratio;
        self
    }

    /// Set the maximum adjustment distance.
    pub fn with_max_distance(mut self, distance: f64) -> Self {
        self.engine.max_distance = distance;
        self
    }

    /// Set the simplification strategy.
    pub fn with_strategy(mut self, strategy: SimplifyStrategy) -> Self {
        self.simplify.strategy = strategy;
        self
    }

    /// Set or disable the merge-small threshold.
    pub fn with_min_area_threshold(mut self, threshold: Option<f64>) -> Self {
        self.simplify.min_area_threshold = threshold;
        self
    }

    /// Set the worker thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.coordinator.workers = Some(workers);
        self
    }

    /// Set an explicit chunk count.
    pub fn with_chunk_count(mut self, chunks: usize) -> Self {
        self.coordinator.chunk_count = Some(chunks);
        self
    }

    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if !(0.0..=1.0).contains(&e.min_overlap_ratio) {
            return Err(Error::InvalidConfig(format!(
                "min_overlap_ratio must be in [0, 1], got {}",
                e.min_overlap_ratio
            )));
        }
        if !e.max_distance.is_finite() || e.max_distance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_distance must be non-negative, got {}",
                e.max_distance
            )));
        }
        if let Some(min_area) = self.simplify.min_area_threshold {
            if !min_area.is_finite() || min_area < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "min_area_threshold must be non-negative, got {min_area}"
                )));
            }
        }
        match self.simplify.strategy {
            SimplifyStrategy::Cluster { max_merge_distance } => {
                if !max_merge_distance.is_finite() || max_merge_distance < 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "max_merge_distance must be non-negative, got {max_merge_distance}"
                    )));
                }
            }
            SimplifyStrategy::DissolveBuffer { buffer_distance } => {
                if !buffer_distance.is_finite() || buffer_distance <= 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "buffer_distance must be positive, got {buffer_distance}"
                    )));
                }
            }
            SimplifyStrategy::None => {}
        }
        let c = &self.coordinator;
        if c.fanout_multiplier == 0 {
            return Err(Error::InvalidConfig(
                "fanout_multiplier must be at least 1".into(),
            ));
        }
        if c.workers == Some(0) {
            return Err(Error::InvalidConfig("workers must be at least 1".into()));
        }
        if c.chunk_count == Some(0) {
            return Err(Error::InvalidConfig(
                "chunk_count must be at least 1".into(),
            ));
        }
        if c.chunk_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "chunk_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
