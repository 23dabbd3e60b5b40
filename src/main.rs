// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Calibration CLI
//!
//! Runs calibration experiments against the built-in DRAG simulator and
//! manages the calibration store file.
//!
//! # Usage
//!
//! ```bash
//! # Write a starter calibration file
//! qubit-os-cal init
//!
//! # Rough DRAG calibration of qubit 0
//! qubit-os-cal run --qubit 0
//!
//! # Dry run, keep the store untouched and export the data
//! qubit-os-cal run --qubit 0 --no-update --output drag.json
//!
//! # Show stored parameters
//! qubit-os-cal show
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qubit_os_calibration::{
    backend::{BackendRegistry, DragSimulator, HealthStatus},
    calibration::{Calibrations, DragTemplate, ParamExpr, ParameterValue, ScheduleTemplate},
    config::Config,
    experiment::{CalibrationExperiment, FitQuality, RoughDragCal},
    Error, Result, VERSION,
};

/// QubitOS calibration experiments
#[derive(Parser)]
#[command(name = "qubit-os-cal")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Pulse calibration experiments for QubitOS")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rough DRAG calibration
    Run {
        /// Physical qubit
        #[arg(short, long, default_value_t = 0)]
        qubit: u32,

        /// Shots per circuit
        #[arg(long, env = "QUBITOS_CALIBRATION_SHOTS")]
        shots: Option<u32>,

        /// Schedule whose β is calibrated
        #[arg(long)]
        schedule: Option<String>,

        /// Calibration group
        #[arg(long)]
        group: Option<String>,

        /// Backend name (defaults to the registry default)
        #[arg(long)]
        backend: Option<String>,

        /// Do not write the fitted value to the store
        #[arg(long)]
        no_update: bool,

        /// Write experiment data as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show stored calibration parameters
    Show {
        /// Only show values of this group
        #[arg(long)]
        group: Option<String>,
    },

    /// Write a starter calibration file
    Init {
        /// Initial β for every qubit
        #[arg(long, default_value_t = 0.0)]
        beta: f64,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List available backends
    Backends,

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging.level, &config.logging.format);

    match cli.command {
        Commands::Run {
            qubit,
            shots,
            schedule,
            group,
            backend,
            no_update,
            output,
        } => {
            if let Some(shots) = shots {
                config.experiment.shots = shots;
            }
            if let Some(schedule) = schedule {
                config.experiment.schedule_name = schedule;
            }
            if let Some(group) = group {
                config.experiment.group = group;
            }
            if no_update {
                config.experiment.auto_update = false;
            }
            config.validate()?;

            let cals = load_store(&config)?;
            let registry = initialize_backends(&config)?;
            let backend = registry.get_or_default(backend.as_deref())?;

            let exp = &config.experiment;
            let mut builder = RoughDragCal::builder(qubit, cals.clone())
                .backend(backend)
                .schedule_name(exp.schedule_name.clone())
                .cal_parameter_name(exp.cal_parameter_name.clone())
                .group(exp.group.clone())
                .reps(exp.reps.clone())
                .result_index(exp.result_index)
                .auto_update(exp.auto_update);
            if let Some(scan) = &exp.betas {
                builder = builder.betas(scan.values());
            }
            let cal = builder.build()?;

            info!(
                version = VERSION,
                qubit,
                schedule = %exp.schedule_name,
                group = %exp.group,
                shots = exp.shots,
                "Starting rough DRAG calibration"
            );
            let data = cal.run(exp.shots).await?;

            for result in &data.analysis_results {
                let stderr = result
                    .stderr
                    .map(|e| format!(" ± {:.4}", e))
                    .unwrap_or_default();
                println!(
                    "{} = {:.4}{} ({})",
                    result.name, result.value, stderr, result.quality
                );
                if result.quality == FitQuality::Bad {
                    warn!(name = %result.name, "Fit quality is bad, check the scan range");
                }
            }

            if let Some(path) = output {
                std::fs::write(&path, data.to_json()?)?;
                println!("Experiment data written to {}", path.display());
            }

            if exp.auto_update && config.calibration.auto_save {
                cals.save(Path::new(&config.calibration.file))?;
                println!("Calibrations saved to {}", config.calibration.file);
            }
        }

        Commands::Show { group } => {
            let cals = load_store(&config)?;
            let rows = cals.parameters_table(group.as_deref());
            if rows.is_empty() {
                println!("(no parameters)");
            }
            for (key, value) in rows {
                let qubits = key
                    .qubits
                    .map(|q| format!("{:?}", q))
                    .unwrap_or_else(|| "*".to_string());
                println!(
                    "{:<8} {:<8} {:<8} {:>10.4} {:<10} {} {}",
                    key.parameter,
                    qubits,
                    key.schedule.as_deref().unwrap_or("*"),
                    value.value,
                    value.group,
                    value.date_time.to_rfc3339(),
                    value.exp_id.as_deref().unwrap_or("-"),
                );
            }
        }

        Commands::Init { beta, force } => {
            let path = Path::new(&config.calibration.file);
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                )));
            }
            let cals = starter_calibrations(&config, beta)?;
            cals.save(path)?;
            println!("Calibrations written to {}", path.display());
        }

        Commands::Backends => {
            let registry = initialize_backends(&config)?;

            println!("Available backends:");
            for (name, backend_type) in registry.list_with_types() {
                let default_marker = if Some(&name) == registry.default_backend_name().as_ref() {
                    " (default)"
                } else {
                    ""
                };
                let health = match registry.get(&name) {
                    Ok(b) => match b.health_check().await {
                        Ok(HealthStatus::Healthy) => "healthy".to_string(),
                        Ok(status) => format!("{:?}", status).to_lowercase(),
                        Err(e) => format!("error: {}", e),
                    },
                    Err(e) => format!("error: {}", e),
                };
                println!("  {} [{}]{} {}", name, backend_type, default_marker, health);
            }
        }

        Commands::Config => {
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

/// Register the built-in simulator.
fn initialize_backends(config: &Config) -> Result<BackendRegistry> {
    let registry = BackendRegistry::new();
    registry.register(Arc::new(DragSimulator::new(
        &config.simulator,
        config.validation.limits.clone(),
    )));
    info!(backends = registry.len(), "Backends initialized");
    Ok(registry)
}

fn load_store(config: &Config) -> Result<Arc<Calibrations>> {
    let path = Path::new(&config.calibration.file);
    if !path.exists() {
        error!(path = %path.display(), "Calibration file not found");
        return Err(Error::Config(format!(
            "calibration file {} not found, run `qubit-os-cal init` first",
            path.display()
        )));
    }
    Ok(Arc::new(Calibrations::load(path)?))
}

/// Default DRAG schedule and one β value per simulator qubit.
fn starter_calibrations(config: &Config, beta: f64) -> Result<Calibrations> {
    let exp = &config.experiment;
    let cals = Calibrations::new();
    cals.add_schedule(ScheduleTemplate::new(
        exp.schedule_name.clone(),
        DragTemplate {
            duration: 64,
            sigma: ParamExpr::Value(16.0),
            amp: ParamExpr::Value(0.18),
            beta: ParamExpr::Parameter(exp.cal_parameter_name.clone()),
        },
    ))?;
    for qubit in 0..config.simulator.num_qubits {
        cals.add_parameter_value(
            ParameterValue::new(beta, exp.group.clone()),
            &exp.cal_parameter_name,
            qubit,
            &exp.schedule_name,
        )?;
    }
    Ok(cals)
}
