//! Error types for parcel-align.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors raised before any alignment work begins.
///
/// Per-target problems (invalid geometry) and per-chunk problems (worker
/// panic, timeout) are not errors: they are reported as data in the
/// [`AlignReport`](crate::pipeline::AlignReport) so that no target is ever
/// silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target and reference collections carry different CRS tags.
    #[error("CRS mismatch: targets are '{target}', references are '{reference}'")]
    CrsMismatch {
        /// CRS tag of the target collection
        target: String,
        /// CRS tag of the reference collection
        reference: String,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
