//! The AoA store: a single angle of attack (degrees) persisted in a text file
//! and exchanged between the sweep driver and the reduction pipeline.
//!
//! Reads never fail outright. A missing or unreadable file degrades to the
//! last value this store saw (0.0 before the first good read) and is reported
//! as [`AoaReading::StaleFallback`], so callers choose whether to log or abort.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, SweepError};

/// What to do when the store cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Keep going with the last known value (logged and counted)
    #[default]
    Tolerate,
    /// Treat a stale read as an error
    Strict,
}

/// Why a read fell back to the last known value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StaleReason {
    #[error("file not found")]
    Missing,
    #[error("file is empty")]
    Empty,
    #[error("malformed token '{0}'")]
    Malformed(String),
    #[error("non-finite value {0}")]
    NonFinite(f64),
    #[error("I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AoaReading {
    Fresh(f64),
    StaleFallback { value: f64, reason: StaleReason },
}

impl AoaReading {
    /// The angle to use, fresh or not
    pub fn value(&self) -> f64 {
        match self {
            AoaReading::Fresh(v) => *v,
            AoaReading::StaleFallback { value, .. } => *value,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, AoaReading::StaleFallback { .. })
    }
}

/// Parse the first whitespace-delimited token of `text` as an angle
pub fn parse_aoa(text: &str) -> std::result::Result<f64, StaleReason> {
    let token = text.split_whitespace().next().ok_or(StaleReason::Empty)?;
    let value: f64 = token
        .parse()
        .map_err(|_| StaleReason::Malformed(token.to_string()))?;
    if !value.is_finite() {
        return Err(StaleReason::NonFinite(value));
    }
    Ok(value)
}

#[derive(Debug, Clone)]
pub struct AoaStore {
    path: PathBuf,
    policy: StalePolicy,
    last_known: f64,
    stale_reads: u64,
}

impl AoaStore {
    pub fn new<P: Into<PathBuf>>(path: P, policy: StalePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            last_known: 0.0,
            stale_reads: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Last successfully read (or written) angle
    pub fn last_known(&self) -> f64 {
        self.last_known
    }

    /// Number of reads that fell back to the last known value
    pub fn stale_reads(&self) -> u64 {
        self.stale_reads
    }

    /// Re-read the store. Never fails; see [`AoaReading`].
    pub fn read(&mut self) -> AoaReading {
        let outcome = match fs::read_to_string(&self.path) {
            Ok(text) => parse_aoa(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StaleReason::Missing),
            Err(e) => Err(StaleReason::Io(e.to_string())),
        };

        match outcome {
            Ok(value) => {
                self.last_known = value;
                AoaReading::Fresh(value)
            }
            Err(reason) => {
                self.stale_reads += 1;
                log::warn!(
                    "AoA store {}: {}; keeping last known AoA {} deg (stale reads: {})",
                    self.path.display(),
                    reason,
                    self.last_known,
                    self.stale_reads
                );
                AoaReading::StaleFallback {
                    value: self.last_known,
                    reason,
                }
            }
        }
    }

    /// Read honoring the configured [`StalePolicy`]
    pub fn read_checked(&mut self) -> Result<f64> {
        match self.read() {
            AoaReading::Fresh(value) => Ok(value),
            AoaReading::StaleFallback { value, reason } => match self.policy {
                StalePolicy::Tolerate => Ok(value),
                StalePolicy::Strict => Err(SweepError::AoaUnavailable {
                    path: self.path.clone(),
                    reason,
                }),
            },
        }
    }

    /// Persist `aoa_deg`. The value goes to a sibling temp file first and is
    /// renamed into place, so a concurrent reader sees either the old or the
    /// new angle, never a truncated file.
    pub fn write(&mut self, aoa_deg: f64) -> Result<()> {
        if !aoa_deg.is_finite() {
            return Err(SweepError::InvalidPlan(format!("angle of attack must be finite, got {}", aoa_deg)));
        }
        let wrap = |source| SweepError::AoaWrite {
            path: self.path.clone(),
            source,
        };

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let write_tmp = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            writeln!(file, "{}", aoa_deg)?;
            file.sync_all()
        };
        write_tmp().map_err(wrap)?;
        fs::rename(&tmp_path, &self.path).map_err(wrap)?;

        self.last_known = aoa_deg;
        log::debug!("AoA store {} set to {} deg", self.path.display(), aoa_deg);
        Ok(())
    }
}
