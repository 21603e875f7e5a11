//! Well Cycle Analysis - command line front end
//!
//! Turns water-level logger exports into per-cycle drawdown and recovery
//! metrics:
//! 1. Parses the logger CSV (timestamp + level above pump)
//! 2. Locates the recovery peaks that bound each pumping cycle
//! 3. Measures every peak-to-peak cycle and drops the shallow ones
//! 4. Prints the cycle table and summary, or writes them as CSV / JSON
//!
//! Usage:
//!   cargo run --release -- analyze data/sample_well.csv --csv-out out/
//!   cargo run --release -- batch --workers 4 --out-dir out/
//!   cargo run --release -- serve --port 8080
//!
//! Environment:
//!   RUST_LOG - overrides --log-level (e.g. RUST_LOG=wellmon_service=debug)

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};

use wellmon_service::batch::BatchRunner;
use wellmon_service::config::{DEFAULT_CONFIG_PATH, WellRegistry, load_config};
use wellmon_service::endpoint;
use wellmon_service::error::WellError;
use wellmon_service::export::{
    export_file_name, format_cycle_table, format_summary_table, write_cycles_csv, write_summary_csv,
};
use wellmon_service::logging::{LogFormat, init_logging};
use wellmon_service::pipeline::{WellAnalysis, analyze_levels_file};

#[derive(Debug, Parser)]
#[command(name = "wellmon", version, about = "Pumped-well drawdown and recovery cycle analysis")]
struct Cli {
    /// Well registry and analysis thresholds
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "WELLMON_CONFIG")]
    config: PathBuf,

    /// Log level for wellmon_service targets (RUST_LOG wins when set)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse a single logger export
    Analyze {
        /// Logger CSV export
        csv: PathBuf,
        /// Identifier used in the report and output file name
        #[arg(long)]
        well_id: Option<String>,
        /// Directory for the cycle and summary CSVs
        #[arg(long)]
        csv_out: Option<PathBuf>,
        /// Print the full analysis as JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Override the configured drawdown floor (m)
        #[arg(long)]
        min_drawdown: Option<f64>,
        /// Override the configured peak prominence (m)
        #[arg(long)]
        min_prominence: Option<f64>,
    },
    /// Analyse every well in the registry
    Batch {
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Directory for per-well CSVs
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Serve the HTTP analysis endpoint
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let result = match cli.command {
        Command::Analyze {
            csv,
            well_id,
            csv_out,
            json,
            min_drawdown,
            min_prominence,
        } => {
            let mut registry = load_registry(&cli.config, false);
            if let Some(floor) = min_drawdown {
                registry.analysis.min_drawdown_m = floor;
            }
            if let Some(prominence) = min_prominence {
                registry.analysis.min_prominence_m = prominence;
            }
            run_analyze(&registry, &csv, well_id.as_deref(), csv_out.as_deref(), json)
        }
        Command::Batch { workers, out_dir } => {
            let registry = load_registry(&cli.config, true);
            run_batch(&registry, workers, out_dir.as_deref())
        }
        Command::Serve { port } => {
            let registry = load_registry(&cli.config, true);
            println!("🚀 Starting HTTP endpoint server...");
            println!("   Serving {} registered wells", registry.wells.len());
            println!("   Endpoint running on http://0.0.0.0:{}\n", port);
            endpoint::start_endpoint_server(port, registry).map_err(|e| {
                eprintln!("❌ Endpoint server error: {}", e);
            })
        }
    };

    if result.is_err() {
        std::process::exit(1);
    }
}

/// Loads the registry. A missing file is only fatal when the command needs
/// registered wells; `analyze` falls back to default thresholds.
fn load_registry(path: &Path, required: bool) -> WellRegistry {
    if !required && !path.exists() {
        println!("ℹ️  No config at {}, using default thresholds\n", path.display());
        return WellRegistry::default();
    }
    match load_config(path) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    }
}

fn run_analyze(
    registry: &WellRegistry,
    csv: &Path,
    well_id: Option<&str>,
    csv_out: Option<&Path>,
    json: bool,
) -> Result<(), ()> {
    let analysis = analyze_levels_file(csv, well_id, &registry.analysis, &registry.ingest)
        .map_err(|e| eprintln!("\n❌ Analysis of {} failed: {}\n", csv.display(), e))?;

    if json {
        match serde_json::to_string_pretty(&analysis) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Could not serialize analysis: {}", e);
                return Err(());
            }
        }
    } else {
        println!("💧 Well Cycle Analysis");
        println!("======================\n");
        print_analysis(&analysis, registry.analysis.min_drawdown_m);
    }

    if let Some(dir) = csv_out {
        write_outputs(&analysis, dir).map_err(|e| eprintln!("❌ Export failed: {}", e))?;
    }
    Ok(())
}

fn run_batch(registry: &WellRegistry, workers: usize, out_dir: Option<&Path>) -> Result<(), ()> {
    println!("💧 Batch Well Cycle Analysis");
    println!("============================\n");
    println!("📋 Analysing {} wells on {} workers...\n", registry.wells.len(), workers.max(1));

    let outcomes = BatchRunner::new(workers).run(registry);
    let mut failed = 0;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(analysis) => {
                println!(
                    "   ✓ {} - {} cycles, cumulative drawdown {:.1} m",
                    outcome.well_id,
                    analysis.report.len(),
                    analysis.report.total_drawdown_m()
                );
                if let Some(dir) = out_dir {
                    if let Err(e) = write_outputs(analysis, dir) {
                        eprintln!("   ✗ {} - Export failed: {}", outcome.well_id, e);
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("   ✗ {} - {}", outcome.well_id, e);
                failed += 1;
            }
        }
    }

    println!("\n📊 {} of {} wells analysed", outcomes.len() - failed, outcomes.len());
    if failed > 0 { Err(()) } else { Ok(()) }
}

fn print_analysis(analysis: &WellAnalysis, min_drawdown_m: f64) {
    if let Some(id) = &analysis.well_id {
        println!("🏷️  Well: {}", id);
    }
    if let (Some(first), Some(last)) = (analysis.first_timestamp, analysis.last_timestamp) {
        println!("📅 {} samples, {} → {}", analysis.samples, first, last);
    }
    if analysis.skipped_rows > 0 || analysis.duplicate_timestamps > 0 {
        println!(
            "⚠️  Skipped {} unreadable rows, {} duplicate timestamps",
            analysis.skipped_rows, analysis.duplicate_timestamps
        );
    }
    println!("⛰️  {} recovery peaks located\n", analysis.peaks.len());

    if !analysis.has_cycles() {
        println!("No valid pumping cycles detected (drawdown < {} m)", min_drawdown_m);
        return;
    }

    println!("🔄 Cycles");
    print!("{}", format_cycle_table(&analysis.report));
    println!("\n📈 Summary ({} cycles)", analysis.summary.total_cycles);
    print!("{}", format_summary_table(&analysis.summary));
}

/// Writes `<name>.csv` and `<name>_summary.csv` into `dir`.
fn write_outputs(analysis: &WellAnalysis, dir: &Path) -> Result<(), WellError> {
    fs::create_dir_all(dir)?;

    let file_name = export_file_name(analysis.well_id.as_deref(), Utc::now().date_naive());
    let cycles_path = dir.join(&file_name);
    write_cycles_csv(&analysis.report, File::create(&cycles_path)?)?;

    let summary_path = dir.join(file_name.replace(".csv", "_summary.csv"));
    write_summary_csv(&analysis.summary, File::create(&summary_path)?)?;

    println!("💾 Wrote {} and {}", cycles_path.display(), summary_path.display());
    Ok(())
}
