//! # AoA Sweep
//!
//! Angle-of-attack sweep automation for CFD hosts: uniform inlet velocity
//! profiles driven by a persisted AoA, reduction of surface loads to lift,
//! drag and moment coefficients, and an append-only results ledger.

// Re-export the main types and functions
pub use aoa_store::{AoaReading, AoaStore, StalePolicy, StaleReason};
pub use config::{AerodynamicConstants, FileLocations, SurfaceId, SweepConfig};
pub use driver::{run_sweep, SolverHost, SweepPlan, SweepReport, SyntheticSolver, ThinAirfoilPolar};
pub use error::{Result, SweepError};
pub use ledger::{read_ledger, HeaderPolicy, LedgerSummary, ResultsLedger, LEDGER_HEADER};
pub use profile::{velocity_components, InletBoundary, VelocityComponent, VelocityComponents};
pub use reduction::{
    dynamic_pressure, reduce, wind_axis_forces, ForceAndMoment, ForceIntegrator, ResultRow,
    StaticIntegrator, WindAxisForces,
};
pub use session::SweepSession;

// Module declarations
pub mod aoa_store;
pub mod config;
pub mod constants;
pub mod driver;
mod error;
pub mod ffi;
pub mod ledger;
pub mod logging;
pub mod profile;
pub mod reduction;
mod session;
