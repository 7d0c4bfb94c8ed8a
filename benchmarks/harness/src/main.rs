//! synmem-bench-harness
//!
//! Time every generation stage separately (classify -> spatial -> temporal -> pc -> write)
//! and append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run --release -p synmem-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run --release -p synmem-bench-harness -- --profile benchmarks/profiles/large.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;

use synmem_trace::classify::classify_accesses;
use synmem_trace::config::TraceConfig;
use synmem_trace::generator::resolve_seed;
use synmem_trace::io::write_trace_text;
use synmem_trace::pc::assign_pcs;
use synmem_trace::spatial::assign_addresses;
use synmem_trace::temporal::assign_delays;

#[derive(Debug, Deserialize)]
struct Profile {
    /// Repetitions of the whole pipeline
    repeats: u32,
    /// Generation parameters (same keys as `synmem --config`)
    #[serde(default)]
    trace: TraceConfig,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));

    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    let cfg = &profile.trace;
    let plan = cfg.validate().context("profile trace parameters")?;
    println!(
        "Profile: n={}, mpki={}, spatial={}, temporal={}, repeats={}",
        cfg.trace_length, cfg.mpki, cfg.spatial_pattern, cfg.temporal_pattern, profile.repeats
    );

    fs::create_dir_all("benchmarks/reports").ok();

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")?
        .as_secs();
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)?;
    writeln!(csv, "timestamp,n,spatial,temporal,repeat,stage,ms,extra")?;

    let tag = format!(
        "{},{},{}",
        cfg.trace_length, cfg.spatial_pattern, cfg.temporal_pattern
    );
    let base_seed = resolve_seed(cfg.seed);

    for rep in 0..profile.repeats {
        let seed = base_seed.wrapping_add(u64::from(rep));
        let mut rng = StdRng::seed_from_u64(seed);
        let out_path = PathBuf::from(format!("benchmarks/tmp-trace-{ts}-{rep}.tr"));

        // 1) read/write split
        let t0 = Instant::now();
        let mut trace = classify_accesses(plan.trace_length, plan.read_proportion, &mut rng);
        let t_classify = t0.elapsed();
        writeln!(
            csv,
            "{ts},{tag},{rep},classify,{},reads={}",
            dur_ms(t_classify),
            trace.read_count()
        )?;

        // 2) addresses
        let t0 = Instant::now();
        assign_addresses(&mut trace, plan.address_space, plan.address_pattern, &mut rng);
        writeln!(csv, "{ts},{tag},{rep},spatial,{},", dur_ms(t0.elapsed()))?;

        // 3) delays
        let t0 = Instant::now();
        assign_delays(&mut trace, &plan.phases, plan.delay_family, &mut rng)?;
        let t_temporal = t0.elapsed();
        let total_delay: u64 = trace.iter().map(|r| r.delay).sum();
        writeln!(
            csv,
            "{ts},{tag},{rep},temporal,{},instructions={total_delay}",
            dur_ms(t_temporal)
        )?;

        // 4) pcs
        let t0 = Instant::now();
        assign_pcs(&mut trace, plan.pc_max_interval, &mut rng)?;
        writeln!(csv, "{ts},{tag},{rep},pc,{},seed={seed}", dur_ms(t0.elapsed()))?;

        // 5) text output
        let t0 = Instant::now();
        write_trace_text(&out_path, &trace)?;
        let t_write = t0.elapsed();
        let bytes = fs::metadata(&out_path).map(|m| m.len()).unwrap_or(0);
        writeln!(
            csv,
            "{ts},{tag},{rep},write,{},bytes={bytes}",
            dur_ms(t_write)
        )?;

        // cleanup temp files to avoid disk bloat
        let _ = fs::remove_file(&out_path);
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
