//! Sweep driver: walks a list of angles through the solver host.
//!
//! For every angle the driver writes the AoA store, re-applies both inlet
//! profiles, lets the host iterate and then triggers the on-demand reduction.
//! Nothing is retried; the first failure ends the sweep and is returned.

use nalgebra::Vector3;

use crate::config::{AerodynamicConstants, SurfaceId};
use crate::constants::{QUARTER_CHORD_FRACTION, SWEEP_STEP_TOLERANCE};
use crate::error::{Result, SweepError};
use crate::profile::{InletBoundary, VelocityComponent};
use crate::reduction::{dynamic_pressure, ForceAndMoment, ForceIntegrator, ResultRow};
use crate::session::SweepSession;

/// Upper bound on the number of angles in one plan
const MAX_SWEEP_ANGLES: usize = 100_000;

/// The solver host as seen by the driver
pub trait SolverHost: InletBoundary + ForceIntegrator {
    /// Run `iterations` solver iterations with the current boundary values
    fn iterate(&mut self, iterations: usize) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub angles: Vec<f64>,  // degrees, in run order
    pub iterations_per_angle: usize,
}

impl SweepPlan {
    pub fn new(angles: Vec<f64>, iterations_per_angle: usize) -> Result<Self> {
        let plan = Self { angles, iterations_per_angle };
        plan.validate()?;
        Ok(plan)
    }

    /// Angles from `start` to `end` inclusive in steps of `step`
    pub fn from_range(start: f64, end: f64, step: f64, iterations_per_angle: usize) -> Result<Self> {
        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(SweepError::InvalidPlan("range bounds and step must be finite".to_string()));
        }
        if step == 0.0 {
            return Err(SweepError::InvalidPlan("step cannot be zero".to_string()));
        }
        if (end - start) * step < 0.0 {
            return Err(SweepError::InvalidPlan(format!(
                "step {} does not move from {} towards {}",
                step, start, end
            )));
        }

        let span = ((end - start) / step + SWEEP_STEP_TOLERANCE).floor();
        if span >= MAX_SWEEP_ANGLES as f64 {
            return Err(SweepError::InvalidPlan(format!(
                "range expands to more than {} angles",
                MAX_SWEEP_ANGLES
            )));
        }

        // Rounded so accumulated step error never reaches the ledger
        let angles = (0..=span as usize)
            .map(|i| ((start + i as f64 * step) * 1e9).round() / 1e9)
            .collect();
        Self::new(angles, iterations_per_angle)
    }

    pub fn validate(&self) -> Result<()> {
        if self.angles.is_empty() {
            return Err(SweepError::InvalidPlan("no angles to run".to_string()));
        }
        if self.angles.len() > MAX_SWEEP_ANGLES {
            return Err(SweepError::InvalidPlan(format!("more than {} angles", MAX_SWEEP_ANGLES)));
        }
        if let Some(bad) = self.angles.iter().find(|a| !a.is_finite()) {
            return Err(SweepError::InvalidPlan(format!("angle {} is not finite", bad)));
        }
        if self.iterations_per_angle == 0 {
            return Err(SweepError::InvalidPlan("iterations per angle must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub rows: Vec<ResultRow>,
    pub degenerate_rows: usize,
    /// Stale AoA reads observed during the sweep
    pub stale_reads: u64,
}

/// Run every angle of `plan` through `host`, recording into `session`
pub fn run_sweep<H: SolverHost + ?Sized>(
    plan: &SweepPlan,
    session: &mut SweepSession,
    host: &mut H,
) -> Result<SweepReport> {
    plan.validate()?;
    let stale_before = session.store().stale_reads();
    let total = plan.angles.len();
    let mut report = SweepReport::default();

    for (i, &aoa_deg) in plan.angles.iter().enumerate() {
        log::info!("[{}/{}] AoA {} deg", i + 1, total, aoa_deg);

        session.store_mut().write(aoa_deg)?;
        session.apply_inlet_profile(&mut *host, VelocityComponent::U)?;
        session.apply_inlet_profile(&mut *host, VelocityComponent::V)?;
        host.iterate(plan.iterations_per_angle)?;

        let row = session.reduce_and_record(&*host)?;
        if row.degenerate {
            report.degenerate_rows += 1;
        }
        report.rows.push(row);
    }

    report.stale_reads = session.store().stale_reads() - stale_before;
    Ok(report)
}

/// Linear-lift, parabolic-drag section polar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinAirfoilPolar {
    /// dCl/dα per radian
    pub lift_slope: f64,
    pub cd0: f64,
    /// k in Cd = Cd0 + k·Cl²
    pub induced_factor: f64,
    /// Pitching moment coefficient about the quarter chord
    pub cm_quarter_chord: f64,
}

impl Default for ThinAirfoilPolar {
    fn default() -> Self {
        Self {
            lift_slope: 2.0 * std::f64::consts::PI,
            cd0: 0.01,
            induced_factor: 0.05,
            cm_quarter_chord: -0.05,
        }
    }
}

impl ThinAirfoilPolar {
    pub fn cl(&self, alpha_rad: f64) -> f64 {
        self.lift_slope * alpha_rad
    }

    pub fn cd(&self, alpha_rad: f64) -> f64 {
        let cl = self.cl(alpha_rad);
        self.cd0 + self.induced_factor * cl * cl
    }
}

/// In-memory solver host that turns the inlet velocity it was given into
/// wing loads through a [`ThinAirfoilPolar`]. It stands in for the CFD
/// application in demos and tests.
#[derive(Debug, Clone)]
pub struct SyntheticSolver {
    surface: SurfaceId,
    aero: AerodynamicConstants,
    polar: ThinAirfoilPolar,
    inlet_u: Vec<f64>,
    inlet_v: Vec<f64>,
    iterations: usize,
}

impl SyntheticSolver {
    pub fn new(aero: &AerodynamicConstants, polar: ThinAirfoilPolar, inlet_faces: usize) -> Self {
        Self {
            surface: aero.surface.clone(),
            aero: aero.clone(),
            polar,
            inlet_u: vec![0.0; inlet_faces],
            inlet_v: vec![0.0; inlet_faces],
            iterations: 0,
        }
    }

    /// Total iterations run so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn inlet_u(&self) -> &[f64] {
        &self.inlet_u
    }

    pub fn inlet_v(&self) -> &[f64] {
        &self.inlet_v
    }

    fn mean_inlet_velocity(&self) -> Result<(f64, f64)> {
        let n = self.inlet_u.len();
        if n == 0 {
            return Err(SweepError::Solver("inlet boundary has no faces".to_string()));
        }
        let u = self.inlet_u.iter().sum::<f64>() / n as f64;
        let v = self.inlet_v.iter().sum::<f64>() / n as f64;
        Ok((u, v))
    }
}

impl InletBoundary for SyntheticSolver {
    fn face_count(&self) -> usize {
        self.inlet_u.len()
    }

    fn set_face_value(&mut self, component: VelocityComponent, face: usize, value: f64) {
        match component {
            VelocityComponent::U => self.inlet_u[face] = value,
            VelocityComponent::V => self.inlet_v[face] = value,
        }
    }
}

impl ForceIntegrator for SyntheticSolver {
    fn compute_force_and_moment(
        &self,
        surface: &SurfaceId,
        reference_point: &Vector3<f64>,
    ) -> Result<ForceAndMoment> {
        if *surface != self.surface {
            return Err(SweepError::SurfaceNotFound(surface.clone()));
        }

        let (u, v) = self.mean_inlet_velocity()?;
        let alpha = v.atan2(u);
        let speed = u.hypot(v);
        let qa = dynamic_pressure(self.aero.density, speed) * self.aero.reference_area;

        let lift = qa * self.polar.cl(alpha);
        let drag = qa * self.polar.cd(alpha);
        // Wind axes back to global axes
        let force = Vector3::new(
            drag * alpha.cos() - lift * alpha.sin(),
            drag * alpha.sin() + lift * alpha.cos(),
            0.0,
        );

        let chord = self.aero.reference_length;
        let quarter_chord = Vector3::new(QUARTER_CHORD_FRACTION * chord, 0.0, 0.0);
        let moment_qc = Vector3::new(0.0, 0.0, qa * chord * self.polar.cm_quarter_chord);
        // Transfer from the quarter chord to the requested point
        let moment = moment_qc + (quarter_chord - reference_point).cross(&force);

        Ok(ForceAndMoment::new(force, moment))
    }
}

impl SolverHost for SyntheticSolver {
    fn iterate(&mut self, iterations: usize) -> Result<()> {
        self.iterations += iterations;
        log::debug!("synthetic solver: {} iterations (total {})", iterations, self.iterations);
        Ok(())
    }
}
