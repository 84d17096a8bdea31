use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use leverage_bracket::config::{generate_sample_config, Config};
use leverage_bracket::{ingest, leverage, report, select, OutputFormat, RegionHalves, TeamTable};

#[derive(Parser)]
#[command(name = "leverage-bracket")]
#[command(about = "Pick a tournament bracket where the model disagrees with the crowd")]
struct Cli {
    /// YAML config file (defaults to bracket.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a crowd pick sheet with a model forecast and pick a bracket
    Pick {
        /// ESPN "who picked whom" export
        #[arg(long)]
        crowd: PathBuf,
        /// FiveThirtyEight forecast export
        #[arg(long)]
        model: PathBuf,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Pick a bracket from an already merged team table
    Table {
        path: PathBuf,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Write a sample configuration file
    InitConfig {
        #[arg(short, long, default_value = "bracket.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so the bracket on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pick { crowd, model, format } => {
            let (config, halves) = load_config(cli.config.as_deref())?;
            let table = ingest::load_sources(&crowd, &model, &config, &halves).with_context(|| {
                format!("Failed to read {} and {}", crowd.display(), model.display())
            })?;
            run(&table, &halves, format.unwrap_or(config.output.format))
        }
        Commands::Table { path, format } => {
            let (config, halves) = load_config(cli.config.as_deref())?;
            let table = ingest::load_table(&path, &halves)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            run(&table, &halves, format.unwrap_or(config.output.format))
        }
        Commands::InitConfig { output } => init_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> Result<(Config, RegionHalves)> {
    let config = Config::load_or_default(path).context("Failed to load configuration")?;
    let halves = config.region_halves()?;
    Ok((config, halves))
}

fn init_config(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    std::fs::write(output, generate_sample_config())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote sample configuration to {}", output.display());
    Ok(())
}

fn run(table: &TeamTable, halves: &RegionHalves, format: OutputFormat) -> Result<()> {
    if table.len() != 64 {
        warn!("Expected 64 teams, found {}", table.len());
    }
    let records = leverage::calculate(table.teams());
    let picks = select(&records, halves);
    if !picks.is_complete() {
        info!("Bracket finished with {} selection issue(s)", picks.issues.len());
    }
    println!("{}", report::render(&picks, format)?);
    Ok(())
}
