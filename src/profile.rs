//! Inlet velocity profile generation.
//!
//! The freestream keeps a constant speed and only its direction follows the
//! angle of attack, so the inlet receives the spatially uniform components
//!
//! U = U∞ · cos(α), V = U∞ · sin(α)
//!
//! on every face of the boundary.

use crate::constants::DEG_TO_RAD;

/// Velocity component addressed by a boundary profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityComponent {
    /// Streamwise (X)
    U,
    /// Normal (Y)
    V,
}

impl VelocityComponent {
    /// Map the C ABI component code (0 = U, 1 = V)
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VelocityComponent::U),
            1 => Some(VelocityComponent::V),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityComponents {
    pub u: f64,  // m/s
    pub v: f64,  // m/s
}

impl VelocityComponents {
    pub fn get(&self, component: VelocityComponent) -> f64 {
        match component {
            VelocityComponent::U => self.u,
            VelocityComponent::V => self.v,
        }
    }
}

/// Freestream components for `aoa_deg` at constant `speed`
pub fn velocity_components(aoa_deg: f64, speed: f64) -> VelocityComponents {
    let a_rad = aoa_deg * DEG_TO_RAD;
    VelocityComponents {
        u: speed * a_rad.cos(),
        v: speed * a_rad.sin(),
    }
}

/// A boundary of the host mesh that accepts per-face profile values
pub trait InletBoundary {
    fn face_count(&self) -> usize;

    fn set_face_value(&mut self, component: VelocityComponent, face: usize, value: f64);
}

/// Set the same `value` on every face of `boundary`
pub fn apply_uniform_profile<B: InletBoundary + ?Sized>(
    boundary: &mut B,
    component: VelocityComponent,
    value: f64,
) -> f64 {
    for face in 0..boundary.face_count() {
        boundary.set_face_value(component, face, value);
    }
    value
}

/// One component's profile stored in a caller-owned slice, one entry per face.
/// Values for the other component are ignored.
pub struct SliceBoundary<'a> {
    component: VelocityComponent,
    values: &'a mut [f64],
}

impl<'a> SliceBoundary<'a> {
    pub fn new(component: VelocityComponent, values: &'a mut [f64]) -> Self {
        Self { component, values }
    }
}

impl InletBoundary for SliceBoundary<'_> {
    fn face_count(&self) -> usize {
        self.values.len()
    }

    fn set_face_value(&mut self, component: VelocityComponent, face: usize, value: f64) {
        if component == self.component {
            self.values[face] = value;
        }
    }
}
