//! VitalFlow command center
//!
//! Command-line driver for the decision engine. Results go to stdout as
//! JSON; diagnostics go to stderr through `tracing`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vitalflow::config::{self, LoggingConfig};
use vitalflow::engine::intake::eta_minutes;
use vitalflow::{BedId, Config, EmergencyProtocol, Hospital, RandomSampleSource};

#[derive(Parser)]
#[command(name = "vitalflow", about = "VitalFlow hospital command center")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file to load instead of config/ and VITALFLOW_* variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for simulated vitals
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted ward scenario on the demo layout
    Demo {
        /// Also write a state snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Admit a ward patient and record samples
    Monitor {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 5)]
        ticks: usize,
        /// Simulate deterioration
        #[arg(long)]
        critical: bool,
    },
    /// Ambulance intake on the demo layout
    Ambulance {
        #[arg(long)]
        condition: String,
        #[arg(long)]
        distance: f64,
        #[arg(long, default_value = "Ambulance Patient")]
        name: String,
    },
    /// Estimated arrival time for a distance in km
    Eta {
        #[arg(long)]
        distance: f64,
    },
    /// List the emergency protocol table
    Protocols,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn sample_source(config: &Config, seed: Option<u64>) -> RandomSampleSource {
    match seed {
        Some(seed) => RandomSampleSource::seeded(seed, &config.vitals),
        None => RandomSampleSource::new(&config.vitals),
    }
}

fn run_demo(config: Config, seed: Option<u64>, snapshot: Option<PathBuf>) -> Result<()> {
    let source = sample_source(&config, seed);
    let mut hospital = Hospital::demo(config, source)?;

    hospital.admit_to_bed("Suresh Kumar", &BedId::from("ICU-1"), true, 35)?;
    hospital.admit_to_bed("Anita Desai", &BedId::from("ICU-2"), true, 88)?;
    hospital.admit_to_bed("Mohan Lal", &BedId::from("ICU-3"), false, 92)?;

    let ramesh = hospital.admit("Ramesh Iyer", "Ward A", true)?;
    let mut monitoring = Vec::new();
    for _ in 0..10 {
        let tick = hospital.monitor(&ramesh, true)?;
        let escalated = tick.escalation.is_some();
        monitoring.push(tick);
        if escalated {
            break;
        }
    }

    let vijay = hospital.admit("Vijay Singh", "Ambulance", true)?;
    let ambulance = hospital.handle_ambulance_call(&vijay, "heart_attack", 12.0)?;
    let fall = hospital.handle_fall_event("General Ward - Bed 7", 3)?;

    hospital.check_consistency()?;
    info!(decisions = hospital.decision_log().len(), "demo scenario finished");

    if let Some(path) = snapshot {
        hospital
            .snapshot()
            .save(&path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
    }

    let decisions: Vec<_> = hospital.decision_log().iter().collect();
    print_json(&json!({
        "monitoring": monitoring,
        "ambulance": ambulance,
        "fall": fall,
        "occupancy": hospital.occupancy(),
        "log_intact": hospital.decision_log().verify_integrity(),
        "decisions": decisions,
    }))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => config::load_config().context("loading configuration")?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Demo { snapshot } => run_demo(config, cli.seed, snapshot)?,
        Commands::Monitor {
            name,
            ticks,
            critical,
        } => {
            let source = sample_source(&config, cli.seed);
            let mut hospital = Hospital::demo(config, source)?;
            let id = hospital.admit(name, "Ward A", true)?;
            let mut results = Vec::with_capacity(ticks);
            for _ in 0..ticks {
                results.push(hospital.monitor(&id, critical)?);
            }
            print_json(&json!({
                "patient": hospital.patient(&id),
                "ticks": results,
                "decisions": hospital.decision_log().iter().collect::<Vec<_>>(),
            }))?;
        }
        Commands::Ambulance {
            condition,
            distance,
            name,
        } => {
            let source = sample_source(&config, cli.seed);
            let mut hospital = Hospital::demo(config, source)?;
            let id = hospital.admit(name, "Ambulance", true)?;
            let intake = hospital.handle_ambulance_call(&id, &condition, distance)?;
            print_json(&json!({
                "intake": intake,
                "decisions": hospital.decision_log().iter().collect::<Vec<_>>(),
            }))?;
        }
        Commands::Eta { distance } => {
            let eta = eta_minutes(distance, config.intake.average_speed_kmh);
            print_json(&json!({ "distance_km": distance, "eta_minutes": eta }))?;
        }
        Commands::Protocols => {
            let table: Vec<_> = EmergencyProtocol::ALL
                .iter()
                .map(|p| json!({ "condition": p.key(), "protocol": p.spec() }))
                .collect();
            print_json(&table)?;
        }
    }

    Ok(())
}
