/// Physical and configuration defaults used across the sweep pipeline

/// Conversion factor: degrees to radians
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Default freestream speed (m/s)
pub const DEFAULT_FREESTREAM_SPEED: f64 = 16.0;

/// Standard air density at sea level (kg/m³)
pub const DEFAULT_AIR_DENSITY: f64 = 1.225;

/// Default wing reference area (m²)
pub const DEFAULT_REFERENCE_AREA: f64 = 0.4;

/// Default reference length / mean chord (m)
///
/// Only the moment coefficients are normalized by it; lift and drag
/// coefficients use the reference area alone.
pub const DEFAULT_REFERENCE_LENGTH: f64 = 0.435;

/// Default face-zone id of the wing surface in the host mesh
pub const DEFAULT_SURFACE_ZONE_ID: i32 = 5;

/// Default AoA store file, relative to the working directory
pub const DEFAULT_AOA_FILE: &str = "aoa.txt";

/// Default results ledger file, relative to the working directory
pub const DEFAULT_RESULTS_FILE: &str = "aoa_results.txt";

/// Chordwise position of the moment reference point as a fraction of the
/// reference length (quarter chord)
pub const QUARTER_CHORD_FRACTION: f64 = 0.25;

/// Step tolerance used when expanding an AoA range into discrete angles
pub const SWEEP_STEP_TOLERANCE: f64 = 1e-9;
