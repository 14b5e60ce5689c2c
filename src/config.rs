//! Runtime configuration for a sweep session.
//!
//! Geometry and fluid properties are loaded from a TOML (or JSON) file and
//! validated once at startup. Every field has a default, so a partial file
//! only overrides what it names:
//!
//! ```toml
//! header_policy = "if_empty"
//! stale_aoa = "tolerate"
//!
//! [aerodynamics]
//! freestream_speed = 16.0
//! density = 1.225
//! reference_area = 0.4
//! reference_length = 0.435
//! surface = 5            # or a surface name, e.g. "wing"
//!
//! [files]
//! aoa_path = "aoa.txt"
//! results_path = "aoa_results.txt"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::aoa_store::StalePolicy;
use crate::constants::*;
use crate::error::{Result, SweepError};
use crate::ledger::HeaderPolicy;

/// Identifies the wing surface inside the host mesh
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurfaceId {
    /// Numeric face-zone id
    Zone(i32),
    /// Named surface
    Name(String),
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceId::Zone(id) => write!(f, "zone {}", id),
            SurfaceId::Name(name) => write!(f, "'{}'", name),
        }
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        SurfaceId::Zone(DEFAULT_SURFACE_ZONE_ID)
    }
}

// Freestream and reference quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerodynamicConstants {
    pub freestream_speed: f64,  // m/s
    pub density: f64,           // kg/m³
    pub reference_area: f64,    // m²
    pub reference_length: f64,  // m
    pub surface: SurfaceId,
}

impl Default for AerodynamicConstants {
    fn default() -> Self {
        Self {
            freestream_speed: DEFAULT_FREESTREAM_SPEED,
            density: DEFAULT_AIR_DENSITY,
            reference_area: DEFAULT_REFERENCE_AREA,
            reference_length: DEFAULT_REFERENCE_LENGTH,
            surface: SurfaceId::default(),
        }
    }
}

impl AerodynamicConstants {
    /// Moment reference point: quarter chord on the centerline plane
    pub fn reference_point(&self) -> Vector3<f64> {
        Vector3::new(QUARTER_CHORD_FRACTION * self.reference_length, 0.0, 0.0)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("freestream_speed", self.freestream_speed),
            ("density", self.density),
            ("reference_area", self.reference_area),
            ("reference_length", self.reference_length),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SweepError::InvalidConfig(format!("{} must be finite, got {}", name, value)));
            }
            if value < 0.0 {
                return Err(SweepError::InvalidConfig(format!("{} cannot be negative, got {}", name, value)));
            }
        }
        if self.reference_length == 0.0 {
            return Err(SweepError::InvalidConfig("reference_length must be positive".to_string()));
        }
        if let SurfaceId::Name(name) = &self.surface {
            if name.trim().is_empty() {
                return Err(SweepError::InvalidConfig("surface name cannot be empty".to_string()));
            }
        }

        // Accepted: the reduction clamps coefficients to zero in this case.
        if self.freestream_speed == 0.0 || self.density == 0.0 || self.reference_area == 0.0 {
            log::warn!(
                "dynamic pressure times reference area is zero (speed={}, density={}, area={}); all coefficients will be reported as 0",
                self.freestream_speed, self.density, self.reference_area
            );
        }
        Ok(())
    }
}

/// Locations of the two shared files, relative to the working directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLocations {
    pub aoa_path: PathBuf,
    pub results_path: PathBuf,
}

impl Default for FileLocations {
    fn default() -> Self {
        Self {
            aoa_path: PathBuf::from(DEFAULT_AOA_FILE),
            results_path: PathBuf::from(DEFAULT_RESULTS_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    // Plain values first: TOML cannot emit a value after a table.
    pub header_policy: HeaderPolicy,
    pub stale_aoa: StalePolicy,
    pub aerodynamics: AerodynamicConstants,
    pub files: FileLocations,
}

impl SweepConfig {
    /// Load and validate a configuration file. `.json` files are parsed as
    /// JSON, everything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let config: SweepConfig = if is_json {
            serde_json::from_str(&text).map_err(|e| SweepError::ConfigParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&text).map_err(|e| SweepError::ConfigParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to validated defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SweepError::InvalidConfig(e.to_string()))
    }

    pub fn with_files<P: Into<PathBuf>, Q: Into<PathBuf>>(mut self, aoa_path: P, results_path: Q) -> Self {
        self.files = FileLocations {
            aoa_path: aoa_path.into(),
            results_path: results_path.into(),
        };
        self
    }

    pub fn with_aerodynamics(mut self, aerodynamics: AerodynamicConstants) -> Self {
        self.aerodynamics = aerodynamics;
        self
    }

    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_aoa = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.aerodynamics.validate()?;
        if self.files.aoa_path.as_os_str().is_empty() {
            return Err(SweepError::InvalidConfig("aoa_path cannot be empty".to_string()));
        }
        if self.files.results_path.as_os_str().is_empty() {
            return Err(SweepError::InvalidConfig("results_path cannot be empty".to_string()));
        }
        Ok(())
    }
}
