//! The results ledger: an append-only, tab-separated text file with one row
//! per sweep sample.
//!
//! Rows are never rewritten. Every append opens the file in append mode, so
//! results from earlier runs survive a restart.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};
use crate::reduction::ResultRow;

/// Column header written ahead of the first row
pub const LEDGER_HEADER: &str = "AoA_deg\tFx[N]\tFy[N]\tFz[N]\tFd[N]\tFl[N]\tCd\tCl\t\
                                 Mx[Nm]\tMy[Nm]\tMz[Nm]\tCmx\tCmy\tCmz";

/// When the header line is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Only when the destination is empty or absent, so a ledger holds one
    /// header no matter how many processes appended to it
    #[default]
    IfEmpty,
    /// Once per ledger session, regardless of existing content. A ledger
    /// appended to by N sessions carries N headers.
    OncePerSession,
}

/// Shortest text that parses back to `v`, switching to exponent form for
/// magnitudes outside 1e-5..1e16 like C's `%g`
fn format_value(v: f64) -> String {
    let magnitude = v.abs();
    if v != 0.0 && (magnitude < 1e-5 || magnitude >= 1e16) {
        format!("{:e}", v)
    } else {
        v.to_string()
    }
}

/// Tab-separated rendering of a row, without the line break
pub fn format_row(row: &ResultRow) -> String {
    row.fields()
        .iter()
        .map(|&v| format_value(v))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Parse one data line. `line_no` is 1-based and only used in errors.
pub fn parse_row(line: &str, line_no: usize) -> Result<ResultRow> {
    let tokens: Vec<&str> = line.split('\t').map(str::trim).collect();
    if tokens.len() != ResultRow::FIELD_COUNT {
        return Err(SweepError::LedgerParse {
            line: line_no,
            reason: format!("expected {} fields, found {}", ResultRow::FIELD_COUNT, tokens.len()),
        });
    }

    let mut fields = [0.0; ResultRow::FIELD_COUNT];
    for (slot, token) in fields.iter_mut().zip(&tokens) {
        *slot = token.parse().map_err(|_| SweepError::LedgerParse {
            line: line_no,
            reason: format!("'{}' is not a number", token),
        })?;
    }
    Ok(ResultRow::from_fields(fields))
}

fn is_header(line: &str) -> bool {
    line.trim_start().starts_with("AoA_deg")
}

#[derive(Debug)]
pub struct ResultsLedger {
    path: PathBuf,
    policy: HeaderPolicy,
    header_emitted: bool,
    rows_written: usize,
}

impl ResultsLedger {
    pub fn new<P: Into<PathBuf>>(path: P, policy: HeaderPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            header_emitted: false,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> HeaderPolicy {
        self.policy
    }

    /// Whether this ledger session has written a header line
    pub fn header_emitted(&self) -> bool {
        self.header_emitted
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append one row (preceded by the header when the policy calls for it).
    /// The whole text goes out in a single write followed by a flush.
    pub fn append(&mut self, row: &ResultRow) -> Result<()> {
        let wrap = |source| SweepError::LedgerWrite {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;

        let write_header = match self.policy {
            HeaderPolicy::IfEmpty => file.metadata().map_err(wrap)?.len() == 0,
            HeaderPolicy::OncePerSession => !self.header_emitted,
        };

        let mut text = String::with_capacity(256);
        if write_header {
            text.push_str(LEDGER_HEADER);
            text.push('\n');
        }
        text.push_str(&format_row(row));
        text.push('\n');

        file.write_all(text.as_bytes()).map_err(wrap)?;
        file.flush().map_err(wrap)?;

        if write_header {
            self.header_emitted = true;
        }
        self.rows_written += 1;
        Ok(())
    }
}

/// Read every data row of a ledger, in file order. Header lines anywhere in
/// the file and blank lines are skipped.
pub fn read_ledger<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRow>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SweepError::LedgerRead {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !is_header(line))
        .map(|(i, line)| parse_row(line, i + 1))
        .collect()
}

/// Polar summary over a set of ledger rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub rows: usize,
    pub aoa_min: f64,
    pub aoa_max: f64,
    pub cl_max: f64,
    pub cl_max_aoa: f64,
    pub cd_min: f64,
    pub cd_min_aoa: f64,
    pub best_lift_to_drag: Option<f64>,
    pub best_lift_to_drag_aoa: Option<f64>,
    pub degenerate_rows: usize,
}

impl LedgerSummary {
    /// `None` for an empty ledger
    pub fn from_rows(rows: &[ResultRow]) -> Option<Self> {
        let first = rows.first()?;
        // Coefficient extrema come from rows with a usable q·Aref when any exist
        let seed = rows.iter().find(|r| !r.degenerate).unwrap_or(first);
        let mut summary = LedgerSummary {
            rows: rows.len(),
            aoa_min: first.aoa_deg,
            aoa_max: first.aoa_deg,
            cl_max: seed.cl,
            cl_max_aoa: seed.aoa_deg,
            cd_min: seed.cd,
            cd_min_aoa: seed.aoa_deg,
            best_lift_to_drag: None,
            best_lift_to_drag_aoa: None,
            degenerate_rows: 0,
        };

        for row in rows {
            summary.aoa_min = summary.aoa_min.min(row.aoa_deg);
            summary.aoa_max = summary.aoa_max.max(row.aoa_deg);
            if row.degenerate {
                summary.degenerate_rows += 1;
                continue;
            }
            if row.cl > summary.cl_max {
                summary.cl_max = row.cl;
                summary.cl_max_aoa = row.aoa_deg;
            }
            if row.cd < summary.cd_min {
                summary.cd_min = row.cd;
                summary.cd_min_aoa = row.aoa_deg;
            }
            if let Some(ld) = row.lift_to_drag() {
                if summary.best_lift_to_drag.map_or(true, |best| ld > best) {
                    summary.best_lift_to_drag = Some(ld);
                    summary.best_lift_to_drag_aoa = Some(row.aoa_deg);
                }
            }
        }
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AerodynamicConstants;
    use crate::reduction::reduce;
    use nalgebra::Vector3;

    fn sample(aoa: f64) -> ResultRow {
        reduce(
            aoa,
            &Vector3::new(1.0 + 0.01 * aoa * aoa, 10.0 + aoa, 0.125),
            &Vector3::new(0.0, 0.0, -0.5 - 0.1 * aoa),
            &AerodynamicConstants::default(),
        )
    }

    fn lines_of(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(String::from).collect()
    }

    #[test]
    fn test_header_has_fourteen_columns() {
        assert_eq!(LEDGER_HEADER.split('\t').count(), ResultRow::FIELD_COUNT);
        assert!(LEDGER_HEADER.starts_with("AoA_deg\tFx[N]"));
        assert!(LEDGER_HEADER.ends_with("Cmx\tCmy\tCmz"));
    }

    #[test]
    fn test_format_row_shortest_values() {
        let row = ResultRow::from_fields([
            -5.0, 1.5, 0.0, 2.0, 0.1, 16.0, 0.03189, 1.25, 0.0, 0.0, -0.75, 0.0, 0.0, 1e-7,
        ]);
        assert_eq!(
            format_row(&row),
            "-5\t1.5\t0\t2\t0.1\t16\t0.03189\t1.25\t0\t0\t-0.75\t0\t0\t1e-7"
        );
    }

    #[test]
    fn test_parse_row_round_trip() {
        let row = sample(7.3);
        let parsed = parse_row(&format_row(&row), 1).unwrap();
        assert_eq!(parsed, row);
    }

    #[test]
    fn test_format_row_noise_in_exponent_form() {
        let mut fields = sample(3.0).fields();
        fields[3] = 1.2e-17;
        fields[13] = 1e-300;
        let line = format_row(&ResultRow::from_fields(fields));

        let tokens: Vec<&str> = line.split('\t').collect();
        assert_eq!(tokens[3], "1.2e-17");
        assert_eq!(tokens[13], "1e-300");
        assert_eq!(format_value(2.5e17), "2.5e17");
        assert_eq!(format_value(-0.00001), "-0.00001");
        assert_eq!(parse_row(&line, 1).unwrap().fields(), fields);
    }

    #[test]
    fn test_parse_row_errors() {
        assert!(matches!(parse_row("1\t2\t3", 4), Err(SweepError::LedgerParse { line: 4, .. })));
        let bad = ["x"; 14].join("\t");
        assert!(parse_row(&bad, 2).is_err());
    }

    #[test]
    fn test_fresh_ledger_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoa_results.txt");
        let mut ledger = ResultsLedger::new(&path, HeaderPolicy::IfEmpty);

        let angles = [-4.0, 0.0, 4.0, 8.0];
        for aoa in angles {
            ledger.append(&sample(aoa)).unwrap();
        }

        let lines = lines_of(&path);
        assert_eq!(lines.len(), 1 + angles.len());
        assert_eq!(lines[0], LEDGER_HEADER);
        for (line, aoa) in lines[1..].iter().zip(angles) {
            assert_eq!(*line, format_row(&sample(aoa)));
        }
        assert_eq!(ledger.rows_written(), 4);
        assert!(ledger.header_emitted());
    }

    #[test]
    fn test_if_empty_never_duplicates_header_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoa_results.txt");

        // One session per angle, as when the host loads the library per run
        for aoa in [0.0, 2.0, 4.0] {
            let mut ledger = ResultsLedger::new(&path, HeaderPolicy::IfEmpty);
            ledger.append(&sample(aoa)).unwrap();
        }

        let lines = lines_of(&path);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.iter().filter(|l| l.as_str() == LEDGER_HEADER).count(), 1);
        assert_eq!(read_ledger(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_if_empty_appends_to_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoa_results.txt");
        fs::write(&path, format!("{}\n{}\n", LEDGER_HEADER, format_row(&sample(1.0)))).unwrap();

        let mut ledger = ResultsLedger::new(&path, HeaderPolicy::IfEmpty);
        ledger.append(&sample(2.0)).unwrap();

        let rows = read_ledger(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].aoa_deg, 1.0);
        assert_eq!(rows[1].aoa_deg, 2.0);
        assert!(!ledger.header_emitted());
    }

    #[test]
    fn test_once_per_session_duplicates_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoa_results.txt");

        let mut first = ResultsLedger::new(&path, HeaderPolicy::OncePerSession);
        first.append(&sample(0.0)).unwrap();
        first.append(&sample(1.0)).unwrap();

        let mut second = ResultsLedger::new(&path, HeaderPolicy::OncePerSession);
        second.append(&sample(2.0)).unwrap();

        let lines = lines_of(&path);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], LEDGER_HEADER);
        assert_eq!(lines[3], LEDGER_HEADER);
        assert_eq!(lines.iter().filter(|l| l.as_str() == LEDGER_HEADER).count(), 2);

        // Duplicated headers do not disturb reading back
        let aoas: Vec<f64> = read_ledger(&path).unwrap().iter().map(|r| r.aoa_deg).collect();
        assert_eq!(aoas, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_unwritable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ResultsLedger::new(dir.path().join("missing/dir/out.txt"), HeaderPolicy::IfEmpty);
        let err = ledger.append(&sample(0.0)).unwrap_err();
        assert!(matches!(err, SweepError::LedgerWrite { .. }));
        assert_eq!(ledger.rows_written(), 0);
    }

    #[test]
    fn test_read_ledger_skips_blank_lines_and_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aoa_results.txt");
        fs::write(&path, format!("{}\n\n{}\nnot a row\n", LEDGER_HEADER, format_row(&sample(3.0)))).unwrap();

        match read_ledger(&path) {
            Err(SweepError::LedgerParse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_summary() {
        let rows: Vec<ResultRow> = [-2.0, 0.0, 2.0, 4.0, 6.0].iter().map(|&a| sample(a)).collect();
        let summary = LedgerSummary::from_rows(&rows).unwrap();
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.aoa_min, -2.0);
        assert_eq!(summary.aoa_max, 6.0);
        assert_eq!(summary.cl_max_aoa, 6.0);
        assert!(summary.best_lift_to_drag.is_some());
        assert_eq!(summary.degenerate_rows, 0);

        assert!(LedgerSummary::from_rows(&[]).is_none());
    }

    #[test]
    fn test_summary_ignores_degenerate_coefficients() {
        let degenerate = ResultRow::from_fields([
            4.0, 1.0, 10.0, 0.0, 1.5, 9.9, 0.0, 0.0, 0.0, 0.0, -0.5, 0.0, 0.0, 0.0,
        ]);
        assert!(degenerate.degenerate);
        let mut normal = sample(2.0);
        normal.cd = 0.02;

        for rows in [vec![normal, degenerate], vec![degenerate, normal]] {
            let summary = LedgerSummary::from_rows(&rows).unwrap();
            assert_eq!(summary.rows, 2);
            assert_eq!(summary.degenerate_rows, 1);
            assert_eq!(summary.aoa_max, 4.0);
            assert_eq!(summary.cd_min, 0.02);
            assert_eq!(summary.cd_min_aoa, 2.0);
            assert_eq!(summary.cl_max_aoa, 2.0);
            assert_eq!(summary.best_lift_to_drag_aoa, Some(2.0));
        }
    }
}
