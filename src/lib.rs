//! # parcel-align: polygon reconciliation against cadastral references
//!
//! Reconciles two collections of planar polygons: a *target* set (building
//! roof footprints) and a *reference* set (cadastral parcels). Each target
//! is classified as spatially consistent with a reference (`Aligned`),
//! rigidly nudged onto a nearby reference (`Adjusted`), or left alone
//! (`NotAligned`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parcel_align::{align, AlignConfig, Feature, FeatureCollection};
//! use geo::{polygon, MultiPolygon};
//!
//! let roof = Feature::new(MultiPolygon(vec![polygon![
//!     (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0),
//!     (x: 0.0, y: 10.0), (x: 0.0, y: 0.0),
//! ]]));
//! let parcel = Feature::new(MultiPolygon(vec![polygon![
//!     (x: -5.0, y: -5.0), (x: 15.0, y: -5.0), (x: 15.0, y: 15.0),
//!     (x: -5.0, y: 15.0), (x: -5.0, y: -5.0),
//! ]]));
//!
//! let targets = FeatureCollection::new(vec![roof]);
//! let references = FeatureCollection::new(vec![parcel]);
//!
//! let report = align(&targets, &references, &AlignConfig::default())?;
//! println!(
//!     "{} aligned, {} adjusted, {} not aligned",
//!     report.summary.aligned, report.summary.adjusted, report.summary.not_aligned
//! );
//! # Ok::<(), parcel_align::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`feature`]: feature and attribute types shared by targets and references
//! - [`geometry`]: polygon operations (thin wrappers over `geo`)
//! - [`simplify`]: reference preprocessing (merge-small, clustering, dissolve)
//! - [`reference`]: the frozen, deduplicated reference set with stable ids
//! - [`index`]: R-tree bounding-box index for candidate retrieval
//! - [`engine`]: the per-target classification rule
//! - [`coordinator`]: chunked parallel execution with failure isolation
//! - [`pipeline`]: the one-call entry point tying everything together
//!
//! ## Data Flow
//!
//! ```text
//! raw references ──> simplify ──> ReferenceSet ──> CandidateIndex
//!                                      │                │
//!                                      └───── shared ───┘
//!                                               │
//! targets ──> chunks ──> workers ──> AlignmentEngine ──> AlignReport
//! ```
//!
//! ## Guarantees
//!
//! - Every target appears in exactly one of: the classified output, the
//!   invalid-geometry report, or a failed chunk's unresolved range.
//! - `Adjusted` geometries are pure translations: same shape, same area,
//!   same orientation.
//! - Results are deterministic: identical inputs and configuration produce
//!   identical output regardless of worker or chunk count.
//!
//! Coordinates are assumed to be in one common metric CRS; reprojection is
//! an upstream concern.

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod index;
pub mod pipeline;
pub mod reference;
pub mod simplify;

pub use config::{AlignConfig, CoordinatorConfig, EngineConfig, SimplifyConfig, SimplifyStrategy};
pub use coordinator::{ChunkFailure, CoordinatorOutput, ParallelCoordinator, TargetOutcome};
pub use engine::{AlignmentEngine, AlignmentStatus, MatchResult};
pub use error::{Error, Result};
pub use feature::{AttrValue, Attributes, Feature, FeatureCollection};
pub use index::CandidateIndex;
pub use pipeline::{align, AlignReport, RunSummary};
pub use reference::ReferenceSet;
