//! Error types for the viewer engine.
//!
//! Each failure class has its own enum so callers can tell a data-source
//! problem (keep the last frame) from an export problem (report to the user)
//! without string matching. Input-range problems have no error type at all:
//! the controllers clamp instead of failing.

use std::path::PathBuf;

/// Failures reading from the backing recording.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// No dataset is loaded (or it was unloaded mid-interaction).
    #[error("no recording is loaded")]
    NotLoaded,
    /// The requested sample range does not fit the recording.
    #[error("sample range {start}..{end} is outside 0..{total}")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        total: usize,
    },
    /// Backend-specific failure.
    #[error("data source failure: {0}")]
    Backend(String),
}

/// Failures reported by the registry when handing over an annotation.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no recording is loaded to receive the annotation")]
    NotLoaded,
    #[error("annotation rejected: {0}")]
    Rejected(String),
}

/// Failures computing a filtered preview.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// High-pass cutoff is not below the low-pass cutoff.
    #[error("high-pass cutoff {low} Hz must be below low-pass cutoff {high} Hz")]
    InvalidBand { low: f64, high: f64 },
    #[error("cutoff {cutoff} Hz is at or above the Nyquist frequency {nyquist} Hz")]
    AboveNyquist { cutoff: f64, nyquist: f64 },
    #[error("filter input or cutoff is not finite")]
    NonFinite,
    #[error("filter computation failed: {0}")]
    Compute(String),
    /// The worker went away without delivering a result.
    #[error("filter worker terminated without a result")]
    WorkerLost,
}

/// Failures writing a view export. Kept apart from rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing has been rendered yet.
    #[error("no detail frame has been rendered yet")]
    NoFrame,
    #[error("unsupported export format '{0}'")]
    UnsupportedFormat(String),
    #[error("failed to parse generated SVG: {0}")]
    Svg(#[from] usvg::Error),
    #[error("rasterisation failed: {0}")]
    Raster(String),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
