// crates/synmem-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use synmem_trace::{
    config::{SpatialPattern, TemporalPattern, TraceConfig},
    format::TraceEnvelope,
    generator::{generate, resolve_seed},
    io::write_trace_auto,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Every flag is optional: unset flags fall back to `--config`, then to the
/// built-in defaults shown in each help line.
#[derive(Parser, Debug)]
#[command(
    name = "synmem",
    about = "Synthetic memory-access trace generator",
    long_about = "Synthetic memory-access trace generator.\n\nProduces `<delay> <R|W> <0xADDR> [<0xPC>]` lines with a configurable read share, address pattern, and bursty busy/idle timing.",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Memory accesses per kilo-instruction [default: 1.0]
    #[arg(long)]
    mpki: Option<f64>,

    /// Periodic window width, in instructions [default: 10000]
    #[arg(short = 'p', long)]
    period_width: Option<u64>,

    /// Busy-phase share of each window, in [0, 1] [default: 0.2]
    #[arg(short = 'b', long)]
    busy_phase_proportion: Option<f64>,

    /// Share of each window's accesses issued in the busy phase, in [0, 1] [default: 0.8]
    #[arg(long, visible_alias = "ip")]
    intensive_proportion: Option<f64>,

    /// Share of accesses that are reads, in [0, 1] [default: 0.5]
    #[arg(long, visible_alias = "rp")]
    read_proportion: Option<f64>,

    /// Trace length, in accesses [default: 1000000]
    #[arg(short = 'n', long)]
    trace_length: Option<u64>,

    /// Output file; `.json` writes a JSON envelope, anything else text lines [default: out.tr]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Spatial pattern: random|sequential (strided|linear|neighbor|2d-spatial|scatter|gather|combine-scatter-gather are not implemented) [default: random]
    #[arg(long, visible_alias = "st")]
    spatial_pattern: Option<String>,

    /// Temporal pattern: uniform|poisson [default: uniform]
    #[arg(long, visible_alias = "tt")]
    temporal_pattern: Option<String>,

    /// Memory capacity, in GB [default: 4]
    #[arg(short = 'm', long)]
    capacity: Option<u64>,

    /// Cache line size, in bytes (recorded, not used by generation) [default: 64]
    #[arg(short = 'c', long)]
    cacheline_size: Option<u64>,

    /// System word width, in bits [default: 64]
    #[arg(short = 's', long)]
    system_type: Option<u32>,

    /// Maximum PC step between consecutive reads [default: 50]
    #[arg(long, visible_alias = "is")]
    pc_max_interval: Option<u64>,

    /// RNG seed; a random one is drawn (and logged) when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file with any of the parameters above (flags take precedence)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Errors go to stdout alongside the progress log.
            println!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use std::io::IsTerminal as _;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(std::io::stdout().is_terminal())
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Layer defaults, the optional TOML file, and explicit flags.
fn build_config(cli: Cli) -> Result<TraceConfig> {
    let mut cfg = match &cli.config {
        Some(path) => TraceConfig::from_toml_file(path)?,
        None => TraceConfig::default(),
    };

    macro_rules! overlay {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = cli.$field { cfg.$field = v; })*
        };
    }
    overlay!(
        mpki,
        period_width,
        busy_phase_proportion,
        intensive_proportion,
        read_proportion,
        trace_length,
        output,
        capacity,
        cacheline_size,
        system_type,
        pc_max_interval,
    );

    if let Some(name) = cli.spatial_pattern.as_deref() {
        cfg.spatial_pattern = name.parse::<SpatialPattern>()?;
    }
    if let Some(name) = cli.temporal_pattern.as_deref() {
        cfg.temporal_pattern = name.parse::<TemporalPattern>()?;
    }
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }
    Ok(cfg)
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = build_config(cli)?;
    let plan = cfg.validate()?;

    let seed = resolve_seed(cfg.seed);
    cfg.seed = Some(seed);
    info!(
        seed,
        accesses = plan.trace_length,
        spatial = %cfg.spatial_pattern,
        temporal = %cfg.temporal_pattern,
        "generating synthetic trace"
    );

    let trace = generate(&plan, seed)?;

    let out = cfg.output.clone();
    ensure_parent_dir(&out)?;
    let envelope = TraceEnvelope::new(seed, cfg, trace);
    write_trace_auto(&out, &envelope)
        .with_context(|| format!("writing trace to {}", out.display()))?;
    info!(out = %out.display(), lines = envelope.records.len(), "output finished");
    Ok(())
}
