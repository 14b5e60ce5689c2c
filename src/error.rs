//! Error types for the sweep pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::aoa_store::StaleReason;
use crate::config::SurfaceId;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    /// The force-integration collaborator does not know the surface
    #[error("surface {0} not found; check the surface identifier in the configuration")]
    SurfaceNotFound(SurfaceId),

    /// Stale AoA read under the strict policy
    #[error("AoA store {} unavailable: {reason}", path.display())]
    AoaUnavailable { path: PathBuf, reason: StaleReason },

    #[error("failed to write AoA store {}: {source}", path.display())]
    AoaWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write results ledger {}: {source}", path.display())]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read results ledger {}: {source}", path.display())]
    LedgerRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ledger line {line}: {reason}")]
    LedgerParse { line: usize, reason: String },

    #[error("failed to read configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid sweep plan: {0}")]
    InvalidPlan(String),

    /// Failure reported by the solver host (iteration, callback)
    #[error("solver error: {0}")]
    Solver(String),
}
