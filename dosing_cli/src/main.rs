use clap::{Parser, Subcommand};
use dosing_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "neurodose")]
#[command(about = "Weight-based thrombolytic dosing calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a weight to kilograms (rounded to 0.1 kg)
    Normalize {
        /// Weight as entered
        #[arg(allow_negative_numbers = true)]
        magnitude: f64,

        /// Unit of the weight (kg, lbs); defaults to the configured unit
        #[arg(long)]
        unit: Option<WeightUnit>,
    },

    /// Compute the dose for a protocol
    Dose {
        /// Protocol id (see `neurodose protocols`)
        protocol: String,

        /// Patient weight
        #[arg(long, allow_negative_numbers = true)]
        weight: f64,

        /// Unit of the weight (kg, lbs); defaults to the configured unit
        #[arg(long)]
        unit: Option<WeightUnit>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available dosing protocols
    Protocols,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        dosing_core::logging::init_with_level("debug");
    } else {
        dosing_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_or_default(path)?,
        None => Config::load()?,
    };
    let default_unit = config.units.default_unit;
    tracing::debug!("Default weight unit: {}", default_unit);

    match cli.command {
        Commands::Normalize { magnitude, unit } => {
            cmd_normalize(magnitude, unit.unwrap_or(default_unit))
        }
        Commands::Dose {
            protocol,
            weight,
            unit,
            json,
        } => {
            let catalog = config.validated_catalog()?;
            cmd_dose(&catalog, &protocol, weight, unit.unwrap_or(default_unit), json)
        }
        Commands::Protocols => {
            let catalog = config.validated_catalog()?;
            cmd_protocols(&catalog);
            Ok(())
        }
    }
}

fn cmd_normalize(magnitude: f64, unit: WeightUnit) -> Result<()> {
    let kg = normalize_weight(magnitude, unit)?;
    println!("{} kg", kg);
    Ok(())
}

fn cmd_dose(
    catalog: &ProtocolCatalog,
    protocol_id: &str,
    weight: f64,
    unit: WeightUnit,
    json: bool,
) -> Result<()> {
    let measurement = WeightMeasurement::new(weight, unit)?;
    let report = compute_dose(catalog, protocol_id, &measurement)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report, &measurement);
    }

    Ok(())
}

fn display_report(report: &DoseReport, measurement: &WeightMeasurement) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", report.drug.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", report.protocol_name);
    match measurement.unit() {
        WeightUnit::Kilograms => println!("  Weight: {} kg", report.weight_kg),
        WeightUnit::Pounds => println!("  Weight: {} → {} kg", measurement, report.weight_kg),
    }
    if report.weight_kg == 0.0 {
        println!("  ⚠ No weight entered");
    }
    println!();

    match report.dose {
        DoseResult::Bolus { dose_mg } => {
            println!("  → Dose: {} mg (single IV bolus)", dose_mg);
        }
        DoseResult::Split(split) => {
            println!("  → Total: {} mg", split.total_mg);
            println!("  → Bolus: {} mg IV push", split.bolus_mg);
            println!(
                "  → Infusion: {} mg over {} min",
                split.infusion_mg, split.infusion_minutes
            );
        }
    }

    println!();
}

fn cmd_protocols(catalog: &ProtocolCatalog) {
    for protocol in catalog.iter() {
        println!("{}  {}", protocol.id(), protocol.name());
        match protocol {
            ProtocolDefinition::Tiered {
                tiers, ceiling_mg, ..
            } => {
                let mut lower: Option<f64> = None;
                for tier in tiers {
                    match lower {
                        None => println!("    < {} kg: {} mg", tier.below_kg, tier.dose_mg),
                        Some(lo) => {
                            println!("    {}-{} kg: {} mg", lo, tier.below_kg, tier.dose_mg)
                        }
                    }
                    lower = Some(tier.below_kg);
                }
                match lower {
                    Some(lo) => println!("    ≥ {} kg: {} mg", lo, ceiling_mg),
                    None => println!("    any weight: {} mg", ceiling_mg),
                }
            }
            ProtocolDefinition::Proportional {
                mg_per_kg,
                max_total_mg,
                bolus_percent,
                infusion_minutes,
                ..
            } => {
                println!(
                    "    {} mg/kg (max {} mg), {}% bolus, remainder over {} min",
                    mg_per_kg, max_total_mg, bolus_percent, infusion_minutes
                );
            }
        }
    }
}
