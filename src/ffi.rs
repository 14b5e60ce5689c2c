//! C ABI for CFD hosts that load the library as a user-defined-function shim.
//!
//! The host opens one session per sweep, calls [`aoa_inlet_profile`] from its
//! boundary-profile hooks and [`aoa_compute_forces_and_write`] from its
//! on-demand hook, passing a callback that performs the surface force
//! integration. Only the host's coordinating process should call into a
//! session; the library does no locking of its own.

use crate::config::{SurfaceId, SweepConfig};
use crate::error::{Result, SweepError};
use crate::logging::init_logging;
use crate::profile::{SliceBoundary, VelocityComponent};
use crate::reduction::{ForceAndMoment, ForceIntegrator, ResultRow};
use crate::session::SweepSession;
use nalgebra::Vector3;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

// Status codes returned by the session functions
pub const AOA_OK: c_int = 0;
/// Row written, but q·Aref was zero and every coefficient is 0
pub const AOA_DEGENERATE: c_int = 1;
pub const AOA_ERR_NULL_POINTER: c_int = -1;
pub const AOA_ERR_SURFACE_NOT_FOUND: c_int = -2;
pub const AOA_ERR_AOA_UNAVAILABLE: c_int = -3;
pub const AOA_ERR_LEDGER: c_int = -4;
pub const AOA_ERR_SOLVER: c_int = -5;
pub const AOA_ERR_CONFIG: c_int = -6;
pub const AOA_ERR_ARGUMENT: c_int = -7;
pub const AOA_ERR_PANIC: c_int = -8;

/// Host force-integration callback.
///
/// `zone_id` is the numeric surface id, or -1 when the surface is named, in
/// which case `surface_name` is a NUL-terminated name (null otherwise).
/// `reference_point` points at 3 doubles; the callback writes 3 doubles to
/// each of `force_out` and `moment_out` and returns 0, or any non-zero value
/// when the surface does not exist.
pub type FFIForceCallback = unsafe extern "C" fn(
    user_data: *mut c_void,
    zone_id: c_int,
    surface_name: *const c_char,
    reference_point: *const c_double,
    force_out: *mut c_double,
    moment_out: *mut c_double,
) -> c_int;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FFIResultRow {
    pub aoa_deg: c_double,
    pub fx: c_double,
    pub fy: c_double,
    pub fz: c_double,
    pub fd: c_double,
    pub fl: c_double,
    pub cd: c_double,
    pub cl: c_double,
    pub mx: c_double,
    pub my: c_double,
    pub mz: c_double,
    pub cmx: c_double,
    pub cmy: c_double,
    pub cmz: c_double,
    pub degenerate: c_int,  // 0=false, 1=true
}

impl From<&ResultRow> for FFIResultRow {
    fn from(row: &ResultRow) -> Self {
        Self {
            aoa_deg: row.aoa_deg,
            fx: row.fx,
            fy: row.fy,
            fz: row.fz,
            fd: row.fd,
            fl: row.fl,
            cd: row.cd,
            cl: row.cl,
            mx: row.mx,
            my: row.my,
            mz: row.mz,
            cmx: row.cmx,
            cmy: row.cmy,
            cmz: row.cmz,
            degenerate: row.degenerate as c_int,
        }
    }
}

/// Opaque session handle
pub struct FFISession {
    session: SweepSession,
}

struct CallbackIntegrator {
    callback: FFIForceCallback,
    user_data: *mut c_void,
}

impl ForceIntegrator for CallbackIntegrator {
    fn compute_force_and_moment(
        &self,
        surface: &SurfaceId,
        reference_point: &Vector3<f64>,
    ) -> Result<ForceAndMoment> {
        let (zone_id, name) = match surface {
            SurfaceId::Zone(id) => (*id as c_int, None),
            SurfaceId::Name(name) => {
                let c_name = CString::new(name.as_str())
                    .map_err(|_| SweepError::Solver(format!("surface name {:?} contains NUL", name)))?;
                (-1, Some(c_name))
            }
        };
        let name_ptr = name.as_ref().map_or(ptr::null(), |n| n.as_ptr());

        let reference = [reference_point.x, reference_point.y, reference_point.z];
        let mut force = [0.0; 3];
        let mut moment = [0.0; 3];
        let status = unsafe {
            (self.callback)(
                self.user_data,
                zone_id,
                name_ptr,
                reference.as_ptr(),
                force.as_mut_ptr(),
                moment.as_mut_ptr(),
            )
        };
        if status != 0 {
            return Err(SweepError::SurfaceNotFound(surface.clone()));
        }

        Ok(ForceAndMoment::new(Vector3::from(force), Vector3::from(moment)))
    }
}

fn status_of(err: &SweepError) -> c_int {
    match err {
        SweepError::SurfaceNotFound(_) => AOA_ERR_SURFACE_NOT_FOUND,
        SweepError::AoaUnavailable { .. } | SweepError::AoaWrite { .. } => AOA_ERR_AOA_UNAVAILABLE,
        SweepError::LedgerWrite { .. } | SweepError::LedgerRead { .. } | SweepError::LedgerParse { .. } => {
            AOA_ERR_LEDGER
        }
        SweepError::ConfigRead { .. } | SweepError::ConfigParse { .. } | SweepError::InvalidConfig(_) => {
            AOA_ERR_CONFIG
        }
        SweepError::InvalidPlan(_) => AOA_ERR_ARGUMENT,
        SweepError::Solver(_) => AOA_ERR_SOLVER,
    }
}

/// Install the library logger (stderr). `level` is a NUL-terminated level
/// name, or null for `RUST_LOG` and then `info`. Only the first call in a
/// process takes effect; [`aoa_session_open`] installs the default when the
/// host has not.
#[no_mangle]
pub extern "C" fn aoa_init_logging(level: *const c_char) -> c_int {
    let level = if level.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(level) }.to_str() {
            Ok(l) => Some(l),
            Err(_) => return AOA_ERR_ARGUMENT,
        }
    };
    match catch_unwind(|| init_logging(level)) {
        Ok(_) => AOA_OK,
        Err(_) => AOA_ERR_PANIC,
    }
}

/// Open a session. `config_path` may be null for the built-in defaults.
/// Returns null when the configuration cannot be loaded; the reason is logged.
#[no_mangle]
pub extern "C" fn aoa_session_open(config_path: *const c_char) -> *mut FFISession {
    let opened = catch_unwind(|| {
        let _ = init_logging(None);
        let config = if config_path.is_null() {
            SweepConfig::load_or_default(None)
        } else {
            let path = unsafe { CStr::from_ptr(config_path) };
            match path.to_str() {
                Ok(p) => SweepConfig::from_file(p),
                Err(_) => Err(SweepError::InvalidConfig("config path is not valid UTF-8".to_string())),
            }
        };
        config.and_then(SweepSession::new)
    });

    match opened {
        Ok(Ok(session)) => Box::into_raw(Box::new(FFISession { session })),
        Ok(Err(e)) => {
            log::error!("aoa_session_open: {}", e);
            ptr::null_mut()
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Release a session opened with [`aoa_session_open`]
#[no_mangle]
pub extern "C" fn aoa_session_close(session: *mut FFISession) {
    if !session.is_null() {
        unsafe {
            drop(Box::from_raw(session));
        }
    }
}

/// Fill `values[0..count]` with the uniform inlet value of `component`
/// (0 = U, 1 = V) for the AoA currently in the store.
#[no_mangle]
pub extern "C" fn aoa_inlet_profile(
    session: *mut FFISession,
    component: c_int,
    values: *mut c_double,
    count: c_int,
) -> c_int {
    if session.is_null() || (values.is_null() && count > 0) {
        return AOA_ERR_NULL_POINTER;
    }
    let Some(component) = VelocityComponent::from_code(component) else {
        return AOA_ERR_ARGUMENT;
    };
    if count < 0 {
        return AOA_ERR_ARGUMENT;
    }

    let session = unsafe { &mut (*session).session };
    let values: &mut [f64] = if count == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(values, count as usize) }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut boundary = SliceBoundary::new(component, values);
        session.apply_inlet_profile(&mut boundary, component)
    }));
    match outcome {
        Ok(Ok(_)) => AOA_OK,
        Ok(Err(e)) => {
            log::error!("aoa_inlet_profile: {}", e);
            status_of(&e)
        }
        Err(_) => AOA_ERR_PANIC,
    }
}

/// Reduce the host's loads for the configured surface and append a ledger
/// row. `row_out` may be null. On any error no row is written.
#[no_mangle]
pub extern "C" fn aoa_compute_forces_and_write(
    session: *mut FFISession,
    callback: Option<FFIForceCallback>,
    user_data: *mut c_void,
    row_out: *mut FFIResultRow,
) -> c_int {
    if session.is_null() {
        return AOA_ERR_NULL_POINTER;
    }
    let Some(callback) = callback else {
        return AOA_ERR_NULL_POINTER;
    };

    let session = unsafe { &mut (*session).session };
    let integrator = CallbackIntegrator { callback, user_data };

    let outcome = catch_unwind(AssertUnwindSafe(|| session.reduce_and_record(&integrator)));
    match outcome {
        Ok(Ok(row)) => {
            if !row_out.is_null() {
                unsafe { *row_out = FFIResultRow::from(&row) };
            }
            if row.degenerate {
                AOA_DEGENERATE
            } else {
                AOA_OK
            }
        }
        Ok(Err(e)) => {
            log::error!("aoa_compute_forces_and_write: {}", e);
            status_of(&e)
        }
        Err(_) => AOA_ERR_PANIC,
    }
}

/// Write `aoa_deg` to the session's AoA store (driver side)
#[no_mangle]
pub extern "C" fn aoa_set_angle(session: *mut FFISession, aoa_deg: c_double) -> c_int {
    if session.is_null() {
        return AOA_ERR_NULL_POINTER;
    }
    let session = unsafe { &mut (*session).session };
    match catch_unwind(AssertUnwindSafe(|| session.store_mut().write(aoa_deg))) {
        Ok(Ok(())) => AOA_OK,
        Ok(Err(e)) => {
            log::error!("aoa_set_angle: {}", e);
            status_of(&e)
        }
        Err(_) => AOA_ERR_PANIC,
    }
}

/// Number of AoA reads that fell back to the last known value
#[no_mangle]
pub extern "C" fn aoa_stale_reads(session: *const FFISession) -> u64 {
    if session.is_null() {
        return 0;
    }
    let session = unsafe { &(*session).session };
    catch_unwind(AssertUnwindSafe(|| session.store().stale_reads())).unwrap_or(0)
}

/// Library version as a static NUL-terminated string
#[no_mangle]
pub extern "C" fn aoa_get_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
