//! A sweep session: the state shared by the profile hooks and the on-demand
//! reduction for the lifetime of one driver session.

use crate::aoa_store::AoaStore;
use crate::config::SweepConfig;
use crate::error::Result;
use crate::ledger::ResultsLedger;
use crate::profile::{apply_uniform_profile, velocity_components, InletBoundary, VelocityComponent};
use crate::reduction::{reduce, ForceIntegrator, ResultRow};

#[derive(Debug)]
pub struct SweepSession {
    config: SweepConfig,
    store: AoaStore,
    ledger: ResultsLedger,
}

impl SweepSession {
    /// Start a session. The configuration is validated here, once.
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;
        let store = AoaStore::new(config.files.aoa_path.clone(), config.stale_aoa);
        let ledger = ResultsLedger::new(config.files.results_path.clone(), config.header_policy);
        Ok(Self { config, store, ledger })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn store(&self) -> &AoaStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AoaStore {
        &mut self.store
    }

    pub fn ledger(&self) -> &ResultsLedger {
        &self.ledger
    }

    /// Re-read the AoA store and set the uniform inlet value for `component`.
    /// Returns the value applied.
    pub fn apply_inlet_profile<B: InletBoundary + ?Sized>(
        &mut self,
        boundary: &mut B,
        component: VelocityComponent,
    ) -> Result<f64> {
        let aoa_deg = self.store.read_checked()?;
        let velocity = velocity_components(aoa_deg, self.config.aerodynamics.freestream_speed);
        let value = apply_uniform_profile(boundary, component, velocity.get(component));
        log::debug!(
            "inlet {:?} = {} m/s on {} faces (AoA {} deg)",
            component,
            value,
            boundary.face_count(),
            aoa_deg
        );
        Ok(value)
    }

    /// The on-demand reduction: read the current AoA, ask `integrator` for the
    /// loads on the configured surface, reduce them and append the row.
    ///
    /// Nothing is written when the surface lookup fails.
    pub fn reduce_and_record<I: ForceIntegrator + ?Sized>(&mut self, integrator: &I) -> Result<ResultRow> {
        let aoa_deg = self.store.read_checked()?;
        let aero = &self.config.aerodynamics;
        let reference_point = aero.reference_point();

        let loads = integrator
            .compute_force_and_moment(&aero.surface, &reference_point)
            .map_err(|e| {
                log::error!("AoA {} deg: force integration failed: {}", aoa_deg, e);
                e
            })?;

        let row = reduce(aoa_deg, &loads.force, &loads.moment, aero);
        if row.degenerate {
            log::warn!(
                "AoA {} deg: q*Aref is zero, coefficients reported as 0",
                aoa_deg
            );
        }

        self.ledger.append(&row)?;

        log::info!(
            "AoA {} deg: Fx={} Fy={} Fz={} Fd={} Fl={} Cd={} Cl={} | Mx={} My={} Mz={} Cmx={} Cmy={} Cmz={}",
            row.aoa_deg, row.fx, row.fy, row.fz, row.fd, row.fl, row.cd, row.cl,
            row.mx, row.my, row.mz, row.cmx, row.cmy, row.cmz
        );
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aoa_store::StalePolicy;
    use crate::config::SurfaceId;
    use crate::error::SweepError;
    use crate::ledger::{read_ledger, LEDGER_HEADER};
    use crate::profile::SliceBoundary;
    use crate::reduction::{ForceAndMoment, StaticIntegrator};
    use nalgebra::Vector3;
    use std::fs;
    use std::path::Path;

    fn session_in(dir: &Path) -> SweepSession {
        let config = SweepConfig::default().with_files(dir.join("aoa.txt"), dir.join("aoa_results.txt"));
        SweepSession::new(config).unwrap()
    }

    fn wing_loads() -> StaticIntegrator {
        StaticIntegrator {
            surface: SurfaceId::Zone(5),
            loads: ForceAndMoment::new(Vector3::new(2.0, 30.0, 0.0), Vector3::new(0.0, 0.0, -1.5)),
        }
    }

    #[test]
    fn test_profile_reads_store_fresh_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let mut faces = vec![0.0; 4];

        session.store_mut().write(0.0).unwrap();
        let u0 = session
            .apply_inlet_profile(&mut SliceBoundary::new(VelocityComponent::U, &mut faces), VelocityComponent::U)
            .unwrap();
        assert_eq!(u0, 16.0);

        // Updated behind the session's back, as the external driver does
        fs::write(dir.path().join("aoa.txt"), "90\n").unwrap();
        let v = session
            .apply_inlet_profile(&mut SliceBoundary::new(VelocityComponent::V, &mut faces), VelocityComponent::V)
            .unwrap();
        assert!((v - 16.0).abs() < 1e-12);
        assert!(faces.iter().all(|&x| x == v));
    }

    #[test]
    fn test_reduce_and_record_appends_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.store_mut().write(0.0).unwrap();

        let row = session.reduce_and_record(&wing_loads()).unwrap();
        assert_eq!(row.aoa_deg, 0.0);
        assert_eq!(row.fd, 2.0);
        assert_eq!(row.fl, 30.0);

        let rows = read_ledger(dir.path().join("aoa_results.txt")).unwrap();
        assert_eq!(rows, vec![row]);
        assert_eq!(session.ledger().rows_written(), 1);
    }

    #[test]
    fn test_surface_not_found_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig::default()
            .with_files(dir.path().join("aoa.txt"), dir.path().join("aoa_results.txt"));
        let mut aero = config.aerodynamics.clone();
        aero.surface = SurfaceId::Zone(99);
        let mut session = SweepSession::new(config.with_aerodynamics(aero)).unwrap();
        session.store_mut().write(4.0).unwrap();

        let err = session.reduce_and_record(&wing_loads()).unwrap_err();
        assert!(matches!(err, SweepError::SurfaceNotFound(SurfaceId::Zone(99))));
        assert!(!dir.path().join("aoa_results.txt").exists());
    }

    #[test]
    fn test_missing_store_uses_zero_under_tolerate() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let row = session.reduce_and_record(&wing_loads()).unwrap();
        assert_eq!(row.aoa_deg, 0.0);
        assert_eq!(session.store().stale_reads(), 1);

        let text = fs::read_to_string(dir.path().join("aoa_results.txt")).unwrap();
        assert!(text.starts_with(LEDGER_HEADER));
    }

    #[test]
    fn test_missing_store_fails_under_strict() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig::default()
            .with_files(dir.path().join("aoa.txt"), dir.path().join("aoa_results.txt"))
            .with_stale_policy(StalePolicy::Strict);
        let mut session = SweepSession::new(config).unwrap();

        let err = session.reduce_and_record(&wing_loads()).unwrap_err();
        assert!(matches!(err, SweepError::AoaUnavailable { .. }));
        assert!(!dir.path().join("aoa_results.txt").exists());
    }

    #[test]
    fn test_invalid_config_rejected_at_start() {
        let mut config = SweepConfig::default();
        config.aerodynamics.reference_length = -1.0;
        assert!(matches!(SweepSession::new(config), Err(SweepError::InvalidConfig(_))));
    }
}
