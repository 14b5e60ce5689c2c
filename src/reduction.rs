//! Force/moment reduction to wind-axis loads and aerodynamic coefficients.
//!
//! The force vector from the host solver is expressed in the global axes with
//! the freestream in the X-Y plane and Z spanwise. Rotating it by the angle
//! of attack gives drag (along the freestream) and lift (normal to it):
//!
//! Fd =  Fx·cos(α) + Fy·sin(α)
//! Fl = -Fx·sin(α) + Fy·cos(α)
//!
//! Coefficients are normalized by q·Aref (forces) and q·Aref·Lref (moments)
//! with q = ½·ρ·U∞².

use nalgebra::{Rotation2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{AerodynamicConstants, SurfaceId};
use crate::constants::DEG_TO_RAD;
use crate::error::{Result, SweepError};

/// Net force (N) and moment (N·m) on one surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceAndMoment {
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl ForceAndMoment {
    pub fn new(force: Vector3<f64>, moment: Vector3<f64>) -> Self {
        Self { force, moment }
    }
}

/// The host capability that integrates pressure and shear over a surface.
///
/// Implementations must return [`SweepError::SurfaceNotFound`] for a surface
/// they do not know rather than zero loads.
pub trait ForceIntegrator {
    fn compute_force_and_moment(
        &self,
        surface: &SurfaceId,
        reference_point: &Vector3<f64>,
    ) -> Result<ForceAndMoment>;
}

/// Integrator returning fixed loads for a single known surface
#[derive(Debug, Clone)]
pub struct StaticIntegrator {
    pub surface: SurfaceId,
    pub loads: ForceAndMoment,
}

impl ForceIntegrator for StaticIntegrator {
    fn compute_force_and_moment(
        &self,
        surface: &SurfaceId,
        _reference_point: &Vector3<f64>,
    ) -> Result<ForceAndMoment> {
        if *surface != self.surface {
            return Err(SweepError::SurfaceNotFound(surface.clone()));
        }
        Ok(self.loads)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindAxisForces {
    pub drag: f64,
    pub lift: f64,
}

/// Rotate the in-plane force components into wind axes
pub fn wind_axis_forces(force: &Vector3<f64>, aoa_deg: f64) -> WindAxisForces {
    let rotation = Rotation2::new(aoa_deg * DEG_TO_RAD);
    let wind = rotation.inverse_transform_vector(&Vector2::new(force.x, force.y));
    WindAxisForces {
        drag: wind.x,
        lift: wind.y,
    }
}

/// q = ½·ρ·U∞²
pub fn dynamic_pressure(density: f64, speed: f64) -> f64 {
    0.5 * density * speed * speed
}

/// One sweep sample. The first fourteen fields are the ledger columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub aoa_deg: f64,
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub fd: f64,
    pub fl: f64,
    pub cd: f64,
    pub cl: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
    pub cmx: f64,
    pub cmy: f64,
    pub cmz: f64,
    /// q·Aref was zero and the coefficients were clamped to 0
    #[serde(default)]
    pub degenerate: bool,
}

impl ResultRow {
    pub const FIELD_COUNT: usize = 14;

    /// Ledger column values in column order
    pub fn fields(&self) -> [f64; Self::FIELD_COUNT] {
        [
            self.aoa_deg,
            self.fx, self.fy, self.fz,
            self.fd, self.fl, self.cd, self.cl,
            self.mx, self.my, self.mz,
            self.cmx, self.cmy, self.cmz,
        ]
    }

    /// Build a row from ledger column values. The degenerate flag is not
    /// stored in the ledger and is recovered from all-zero coefficients
    /// paired with a non-zero load.
    pub fn from_fields(f: [f64; Self::FIELD_COUNT]) -> Self {
        let mut row = Self {
            aoa_deg: f[0],
            fx: f[1], fy: f[2], fz: f[3],
            fd: f[4], fl: f[5], cd: f[6], cl: f[7],
            mx: f[8], my: f[9], mz: f[10],
            cmx: f[11], cmy: f[12], cmz: f[13],
            degenerate: false,
        };
        let coeffs_zero = [row.cd, row.cl, row.cmx, row.cmy, row.cmz].iter().all(|&c| c == 0.0);
        let loaded = [row.fd, row.fl, row.mx, row.my, row.mz].iter().any(|&v| v != 0.0);
        row.degenerate = coeffs_zero && loaded;
        row
    }

    pub fn force(&self) -> Vector3<f64> {
        Vector3::new(self.fx, self.fy, self.fz)
    }

    pub fn moment(&self) -> Vector3<f64> {
        Vector3::new(self.mx, self.my, self.mz)
    }

    /// Lift-to-drag ratio, `None` when drag is zero
    pub fn lift_to_drag(&self) -> Option<f64> {
        if self.cd == 0.0 {
            None
        } else {
            Some(self.cl / self.cd)
        }
    }
}

/// Reduce raw loads at `aoa_deg` to wind-axis forces and coefficients.
///
/// When q·Aref is exactly zero every coefficient is set to 0 and the row is
/// flagged `degenerate` instead of dividing by zero.
pub fn reduce(
    aoa_deg: f64,
    force: &Vector3<f64>,
    moment: &Vector3<f64>,
    constants: &AerodynamicConstants,
) -> ResultRow {
    let wind = wind_axis_forces(force, aoa_deg);
    let q = dynamic_pressure(constants.density, constants.freestream_speed);
    let force_norm = q * constants.reference_area;

    let (cd, cl, cm, degenerate) = if force_norm != 0.0 {
        let moment_norm = force_norm * constants.reference_length;
        (
            wind.drag / force_norm,
            wind.lift / force_norm,
            moment.map(|m| m / moment_norm),
            false,
        )
    } else {
        (0.0, 0.0, Vector3::zeros(), true)
    };

    ResultRow {
        aoa_deg,
        fx: force.x,
        fy: force.y,
        fz: force.z,
        fd: wind.drag,
        fl: wind.lift,
        cd,
        cl,
        mx: moment.x,
        my: moment.y,
        mz: moment.z,
        cmx: cm.x,
        cmy: cm.y,
        cmz: cm.z,
        degenerate,
    }
}
