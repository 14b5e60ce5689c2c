use aoa_sweep::logging::init_logging;
use aoa_sweep::{
    read_ledger, run_sweep, velocity_components, ForceAndMoment, LedgerSummary, ResultRow,
    StaticIntegrator, SweepConfig, SweepPlan, SweepSession, SyntheticSolver, ThinAirfoilPolar,
    LEDGER_HEADER,
};
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aoa-sweep")]
#[command(version)]
#[command(about = "Angle-of-attack sweep: inlet profiles, force reduction and results ledger", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); defaults to RUST_LOG, then info
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inlet velocity components for an angle of attack
    Velocity {
        /// Angle of attack (degrees)
        #[arg(short = 'a', long, allow_hyphen_values = true)]
        aoa: f64,

        /// Freestream speed (m/s); defaults to the configured value
        #[arg(short = 's', long)]
        speed: Option<f64>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Write an angle of attack to the AoA store
    SetAoa {
        /// Angle of attack (degrees)
        #[arg(allow_hyphen_values = true)]
        aoa: f64,
    },

    /// Read the angle of attack from the AoA store
    ReadAoa,

    /// Reduce a force/moment vector at the stored AoA and append it to the ledger
    Reduce {
        /// Force components Fx Fy Fz (N)
        #[arg(long, num_args = 3, required = true, value_names = ["FX", "FY", "FZ"], allow_hyphen_values = true)]
        force: Vec<f64>,

        /// Moment components Mx My Mz (N·m)
        #[arg(long, num_args = 3, value_names = ["MX", "MY", "MZ"], allow_hyphen_values = true,
              default_values_t = [0.0, 0.0, 0.0])]
        moment: Vec<f64>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Run a sweep against the built-in thin-airfoil solver
    Sweep {
        /// First angle (degrees)
        #[arg(long, allow_hyphen_values = true)]
        start: f64,

        /// Last angle (degrees, inclusive)
        #[arg(long, allow_hyphen_values = true)]
        end: f64,

        /// Angle increment (degrees)
        #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
        step: f64,

        /// Solver iterations per angle
        #[arg(long, default_value = "100")]
        iterations: usize,

        /// Number of inlet faces in the synthetic mesh
        #[arg(long, default_value = "32")]
        faces: usize,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Summarize the results ledger
    Summary {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Print a configuration file with every default filled in
    InitConfig,

    /// Display tool information
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Tsv,
}

#[derive(Debug, Serialize)]
struct VelocityOutput {
    aoa_deg: f64,
    speed: f64,
    u: f64,
    v: f64,
}

fn main() {
    let cli = Cli::parse();
    let _ = init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Velocity { aoa, speed, output } => {
            let speed = speed.unwrap_or(config.aerodynamics.freestream_speed);
            let vel = velocity_components(aoa, speed);
            let result = VelocityOutput { aoa_deg: aoa, speed, u: vel.u, v: vel.v };
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Tsv => {
                    println!("AoA_deg\tU[m/s]\tV[m/s]");
                    println!("{}\t{}\t{}", result.aoa_deg, result.u, result.v);
                }
                OutputFormat::Table => {
                    println!("╔════════════════════════════════════════╗");
                    println!("║         INLET VELOCITY PROFILE         ║");
                    println!("╠════════════════════════════════════════╣");
                    println!("║ AoA:               {:>10.4} deg      ║", result.aoa_deg);
                    println!("║ Freestream:        {:>10.4} m/s      ║", result.speed);
                    println!("║ U (X):             {:>10.4} m/s      ║", result.u);
                    println!("║ V (Y):             {:>10.4} m/s      ║", result.v);
                    println!("╚════════════════════════════════════════╝");
                }
            }
        }

        Commands::SetAoa { aoa } => {
            let mut session = SweepSession::new(config)?;
            session.store_mut().write(aoa)?;
            println!("AoA set to {} deg in {}", aoa, session.store().path().display());
        }

        Commands::ReadAoa => {
            let mut session = SweepSession::new(config)?;
            let reading = session.store_mut().read();
            if let aoa_sweep::AoaReading::StaleFallback { reason, .. } = &reading {
                eprintln!("Warning: {} ({}), using last known value", reason, session.store().path().display());
            }
            if session.store().policy() == aoa_sweep::StalePolicy::Strict && reading.is_stale() {
                return Err("AoA store unavailable under strict policy".into());
            }
            println!("{}", reading.value());
        }

        Commands::Reduce { force, moment, output } => {
            let mut session = SweepSession::new(config)?;
            let integrator = StaticIntegrator {
                surface: session.config().aerodynamics.surface.clone(),
                loads: ForceAndMoment::new(
                    Vector3::new(force[0], force[1], force[2]),
                    Vector3::new(moment[0], moment[1], moment[2]),
                ),
            };
            let row = session.reduce_and_record(&integrator)?;
            display_rows(&[row], output)?;
            if row.degenerate {
                eprintln!("Warning: dynamic pressure times reference area is zero; coefficients set to 0");
            }
        }

        Commands::Sweep { start, end, step, iterations, faces, output } => {
            let plan = SweepPlan::from_range(start, end, step, iterations)?;
            let mut session = SweepSession::new(config)?;
            let mut solver = SyntheticSolver::new(
                &session.config().aerodynamics,
                ThinAirfoilPolar::default(),
                faces,
            );
            let report = run_sweep(&plan, &mut session, &mut solver)?;
            display_rows(&report.rows, output)?;
            if report.stale_reads > 0 {
                eprintln!("Warning: {} stale AoA reads during the sweep", report.stale_reads);
            }
        }

        Commands::Summary { output } => {
            let rows = read_ledger(&config.files.results_path)?;
            let summary = LedgerSummary::from_rows(&rows)
                .ok_or_else(|| format!("no rows in {}", config.files.results_path.display()))?;
            display_summary(&summary, output)?;
        }

        Commands::InitConfig => {
            print!("{}", config.to_toml()?);
        }

        Commands::Info => {
            let aero = &config.aerodynamics;
            println!("╔════════════════════════════════════════╗");
            println!("║          AOA SWEEP v{:<8}           ║", env!("CARGO_PKG_VERSION"));
            println!("╠════════════════════════════════════════╣");
            println!("║ Freestream speed:  {:>10.4} m/s      ║", aero.freestream_speed);
            println!("║ Density:           {:>10.4} kg/m³    ║", aero.density);
            println!("║ Reference area:    {:>10.4} m²       ║", aero.reference_area);
            println!("║ Reference length:  {:>10.4} m        ║", aero.reference_length);
            println!("║ Surface:           {:<19} ║", aero.surface.to_string());
            println!("╠════════════════════════════════════════╣");
            println!("║ AoA store:  {}", config.files.aoa_path.display());
            println!("║ Ledger:     {}", config.files.results_path.display());
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn display_rows(rows: &[ResultRow], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }

        OutputFormat::Tsv => {
            println!("{}", LEDGER_HEADER);
            for row in rows {
                println!("{}", aoa_sweep::ledger::format_row(row));
            }
        }

        OutputFormat::Table => {
            println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
            println!("│ AoA(deg) │  Fd (N)  │  Fl (N)  │    Cd    │    Cl    │   Cmz    │");
            println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
            for r in rows {
                println!("│ {:>8.2} │ {:>8.3} │ {:>8.3} │ {:>8.5} │ {:>8.5} │ {:>8.5} │",
                    r.aoa_deg, r.fd, r.fl, r.cd, r.cl, r.cmz);
            }
            println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
        }
    }

    Ok(())
}

fn display_summary(summary: &LedgerSummary, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }

        OutputFormat::Tsv => {
            println!("metric\tvalue");
            println!("rows\t{}", summary.rows);
            println!("aoa_min\t{}", summary.aoa_min);
            println!("aoa_max\t{}", summary.aoa_max);
            println!("cl_max\t{}", summary.cl_max);
            println!("cl_max_aoa\t{}", summary.cl_max_aoa);
            println!("cd_min\t{}", summary.cd_min);
            println!("cd_min_aoa\t{}", summary.cd_min_aoa);
            if let (Some(ld), Some(aoa)) = (summary.best_lift_to_drag, summary.best_lift_to_drag_aoa) {
                println!("best_lift_to_drag\t{}", ld);
                println!("best_lift_to_drag_aoa\t{}", aoa);
            }
            println!("degenerate_rows\t{}", summary.degenerate_rows);
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║            LEDGER SUMMARY              ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Rows:              {:>10}            ║", summary.rows);
            println!("║ AoA range:   {:>8.2} .. {:>8.2} deg    ║", summary.aoa_min, summary.aoa_max);
            println!("║ Max Cl:            {:>10.5} @ {:>6.2}   ║", summary.cl_max, summary.cl_max_aoa);
            println!("║ Min Cd:            {:>10.5} @ {:>6.2}   ║", summary.cd_min, summary.cd_min_aoa);
            if let (Some(ld), Some(aoa)) = (summary.best_lift_to_drag, summary.best_lift_to_drag_aoa) {
                println!("║ Best L/D:          {:>10.3} @ {:>6.2}   ║", ld, aoa);
            }
            if summary.degenerate_rows > 0 {
                println!("║ Degenerate rows:   {:>10}            ║", summary.degenerate_rows);
            }
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}
