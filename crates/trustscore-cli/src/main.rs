//! trustscore - composite trust scores for published ML artifacts
//!
//! Reads one artifact per input line and prints one NDJSON record per
//! artifact on stdout. Logs go to stderr.
//!
//! ## Commands
//!
//! - `score`: score every line of a URL file (or stdin with `-`)
//! - `profiles`: show the device profiles used by the size probe

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hub_client::HubClient;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

use trustscore_core::{
    classify_url, init_tracing, ArtifactReference, Orchestrator, ProbeMetrics, ScoringConfig,
    UrlCategory,
};

#[derive(Parser)]
#[command(name = "trustscore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Composite trust scoring for ML models, datasets and code", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also run the reproducibility, reviewedness and license-compatibility probes
    #[arg(long, global = true)]
    extended: bool,

    /// Allowed license (repeatable); replaces the configured allow-list
    #[arg(long = "allow-license", global = true)]
    allow_license: Vec<String>,

    /// Per-probe deadline in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every artifact listed in a URL file
    ///
    /// Each line is either `code,dataset,model` (blank fields allowed) or any
    /// comma-separated list of URLs, classified by host.
    Score {
        /// URL file, or `-` for stdin
        input: String,
    },

    /// Show the device profiles used by the size probe
    Profiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Score { ref input } => cmd_score(&config, input).await,
        Commands::Profiles => cmd_profiles(&config),
    }
}

/// File (or defaults), then `TRUSTSCORE_*` env, then flags.
fn load_config(cli: &Cli) -> Result<ScoringConfig> {
    let mut config = ScoringConfig::load(cli.config.as_deref()).context(match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to read configuration from environment".to_string(),
    })?;

    if cli.extended {
        config.extended = true;
    }
    if !cli.allow_license.is_empty() {
        config.license.allowed = cli.allow_license.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.orchestrator.probe_timeout_ms = ms;
    }

    config.validate().context("Invalid configuration")?;
    if config.extended && config.sandbox_timeout_capped() {
        warn!(
            sandbox_timeout_ms = config.sandbox.timeout_ms,
            probe_timeout_ms = config.orchestrator.probe_timeout_ms,
            "snippet runs are limited by the probe timeout"
        );
    }
    Ok(config)
}

/// Score each artifact line and print its record
async fn cmd_score(config: &ScoringConfig, input: &str) -> Result<()> {
    let source = HubClient::from_env().context("Failed to build hub client")?;
    let metrics = Arc::new(ProbeMetrics::new());
    let orchestrator = Orchestrator::standard(config, Arc::new(source), Arc::clone(&metrics));

    let lines = read_lines(input)?;
    info!(input = %input, lines = lines.len(), extended = config.extended, "scoring started");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (number, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(artifact) = parse_line(line) else {
            warn!(line = number + 1, "no usable URL on line, skipped");
            continue;
        };

        let record = orchestrator.score(&artifact).await;
        let json = record
            .to_ndjson_line()
            .context(format!("Failed to serialize record for {}", record.name))?;
        writeln!(out, "{json}").context("Failed to write record")?;
        out.flush().context("Failed to write record")?;
    }

    metrics.flush();
    Ok(())
}

/// Print the configured device profiles
fn cmd_profiles(config: &ScoringConfig) -> Result<()> {
    println!("Runtime overhead: {:.2}x", config.size.overhead);
    println!();
    println!(
        "{:<16} {:>10} {:>12} {:>14}",
        "PROFILE", "MEMORY", "ACCELERATOR", "COMFORT PARAMS"
    );
    for profile in &config.size.profiles {
        println!(
            "{:<16} {:>8.1}GB {:>12} {:>14.2e}",
            profile.name,
            profile.memory_bytes as f64 / 1e9,
            if profile.supports_accelerator { "yes" } else { "no" },
            profile.comfort_param_count,
        );
    }
    Ok(())
}

fn read_lines(input: &str) -> Result<Vec<String>> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
        return Ok(raw.lines().map(str::to_string).collect());
    }

    let path = Path::new(input);
    let file = std::fs::File::open(path)
        .context(format!("Failed to open URL file {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context(format!("Failed to read URL file {}", path.display()))
}

/// Build an artifact from one input line. `None` when no URL is usable.
fn parse_line(line: &str) -> Option<ArtifactReference> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    let artifact = if fields.len() == 3 && is_positional(&fields) {
        ArtifactReference::new()
            .with_code(fields[0])
            .with_dataset(fields[1])
            .with_model(fields[2])
    } else {
        let mut artifact = ArtifactReference::new();
        for field in fields.iter().filter(|f| !f.is_empty()) {
            match classify_url(field) {
                UrlCategory::Model if artifact.model_url.is_none() => {
                    artifact = artifact.with_model(*field)
                }
                UrlCategory::Dataset if artifact.dataset_url.is_none() => {
                    artifact = artifact.with_dataset(*field)
                }
                UrlCategory::Code if artifact.code_url.is_none() => {
                    artifact = artifact.with_code(*field)
                }
                category => warn!(url = %field, category = category.label(), "URL ignored"),
            }
        }
        artifact
    };

    (!artifact.is_empty()).then_some(artifact)
}

/// Whether `code,dataset,model` fields sit in their expected slots.
/// Blank fields and unrecognized hosts fit any slot.
fn is_positional(fields: &[&str]) -> bool {
    let fits = |field: &str, expected: UrlCategory| match classify_url(field) {
        _ if field.is_empty() => true,
        UrlCategory::Other => true,
        category => category == expected,
    };
    fits(fields[0], UrlCategory::Code)
        && fits(fields[1], UrlCategory::Dataset)
        && fits(fields[2], UrlCategory::Model)
}
