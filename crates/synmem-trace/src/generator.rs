//! Pipeline driver: classify → spatial → temporal → pc.
//!
//! Every stage borrows the same `Trace` mutably in turn and emits one INFO
//! event when it is done. All randomness comes from the caller's RNG, so a
//! plan plus a seed fully determines the output.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use crate::classify::classify_accesses;
use crate::config::{ConfigError, GenerationPlan};
use crate::format::Trace;
use crate::pc::assign_pcs;
use crate::spatial::assign_addresses;
use crate::temporal::assign_delays;

/// Use `seed` if given, otherwise draw one from the thread RNG.
#[must_use]
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Generate a trace from `plan` with a `StdRng` seeded from `seed`.
pub fn generate(plan: &GenerationPlan, seed: u64) -> Result<Trace, ConfigError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with_rng(plan, &mut rng)
}

/// Generate a trace from `plan`, drawing from `rng`.
pub fn generate_with_rng<R: Rng + ?Sized>(
    plan: &GenerationPlan,
    rng: &mut R,
) -> Result<Trace, ConfigError> {
    let mut trace = classify_accesses(plan.trace_length, plan.read_proportion, rng);
    info!(
        accesses = trace.len(),
        reads = trace.read_count(),
        "access classification finished"
    );

    assign_addresses(&mut trace, plan.address_space, plan.address_pattern, rng);
    info!(
        pattern = ?plan.address_pattern,
        words = plan.address_space.words(),
        "spatial pattern generation finished"
    );

    assign_delays(&mut trace, &plan.phases, plan.delay_family, rng)?;
    info!(
        family = %plan.delay_family,
        per_window = plan.phases.accesses_per_window(),
        "temporal pattern generation finished"
    );

    assign_pcs(&mut trace, plan.pc_max_interval, rng)?;
    info!("pc assignment finished");

    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpatialPattern, TemporalPattern, TraceConfig};
    use crate::format::AccessKind;

    fn plan(cfg: TraceConfig) -> GenerationPlan {
        cfg.validate().unwrap()
    }

    #[test]
    fn same_seed_same_trace() {
        let p = plan(TraceConfig {
            trace_length: 2_000,
            temporal_pattern: TemporalPattern::Poisson,
            ..TraceConfig::default()
        });
        let a = generate(&p, 1234).unwrap();
        let b = generate(&p, 1234).unwrap();
        let c = generate(&p, 4321).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn all_writes_sequential_small_memory() {
        let p = plan(TraceConfig {
            trace_length: 10,
            read_proportion: 0.0,
            spatial_pattern: SpatialPattern::Sequential,
            capacity: 1,
            system_type: 64,
            ..TraceConfig::default()
        });
        let t = generate(&p, 7).unwrap();
        assert_eq!(t.len(), 10);
        assert!(t.iter().all(|r| r.kind() == AccessKind::Write && r.pc().is_none()));
        for w in t.records().windows(2) {
            // 2^27 words; a restart inside ten steps is possible but rare.
            if w[1].address != w[0].address + 8 {
                assert_eq!(w[0].address, p.address_space.byte_limit() - 8);
            }
        }
    }

    #[test]
    fn all_reads_carry_non_decreasing_pcs() {
        let p = plan(TraceConfig {
            trace_length: 100,
            read_proportion: 1.0,
            pc_max_interval: 50,
            ..TraceConfig::default()
        });
        let t = generate(&p, 99).unwrap();
        assert_eq!(t.read_count(), 100);
        let pcs: Vec<u64> = t.iter().map(|r| r.pc().unwrap()).collect();
        assert!(pcs.windows(2).all(|w| w[0] <= w[1]));
    }
}
