//! Property and statistical checks over the generation stages.
//!
//! - Classification: exact read counts, no positional bias.
//! - Spatial: addresses stay inside the configured space; sequential walks
//!   step by one word between restarts.
//! - Temporal: windows partition the trace; the busy phase is packed tighter
//!   than the idle phase for both delay families.
//! - PC: only reads carry one, and PCs never decrease in trace order.

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use synmem_trace::{
    classify::classify_accesses,
    config::{TemporalPattern, TraceConfig},
    format::{AccessKind, AccessRecord, Trace},
    generator::generate,
    pc::assign_pcs,
    spatial::{assign_addresses, AddressPattern, AddressSpace, WORD_BYTES},
    temporal::{assign_delays, PhaseModel},
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn read_count_is_floor_of_share(n in 1usize..2_000, rp in 0.0f64..=1.0, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let t = classify_accesses(n, rp, &mut rng);
        prop_assert_eq!(t.len(), n);
        let expected = if rp >= 1.0 { n } else { (n as f64 * rp).floor() as usize };
        prop_assert_eq!(t.read_count(), expected);
    }

    #[test]
    fn random_addresses_inside_space(capacity in 1u64..=64, wide in any::<bool>(), seed: u64) {
        let system_type = if wide { 64 } else { 32 };
        let space = AddressSpace::new(capacity, system_type).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = Trace::from_records(vec![AccessRecord::write(); 256]);
        assign_addresses(&mut t, space, AddressPattern::Random, &mut rng);
        let limit = capacity * (1 << 30) / u64::from(system_type / 8) * 8;
        for r in &t {
            prop_assert!(r.address < limit);
            prop_assert_eq!(r.address % WORD_BYTES, 0);
        }
    }

    #[test]
    fn sequential_walk_steps_one_word(words in 1u64..64, n in 1usize..512, seed: u64) {
        let space = AddressSpace::with_words(words);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = Trace::from_records(vec![AccessRecord::write(); n]);
        assign_addresses(&mut t, space, AddressPattern::Sequential, &mut rng);
        for pair in t.records().windows(2) {
            prop_assert!(pair[1].address < space.byte_limit());
            if pair[1].address != pair[0].address + WORD_BYTES {
                prop_assert_eq!(pair[0].address, space.byte_limit() - WORD_BYTES);
            }
        }
    }

    #[test]
    fn windows_partition_trace(
        mpki in 0.5f64..20.0,
        period_width in 1_000u64..20_000,
        busy in 0.0f64..=1.0,
        intensive in 0.0f64..=1.0,
        n in 1usize..5_000,
    ) {
        let Ok(model) = PhaseModel::new(mpki, period_width, busy, intensive) else {
            return Ok(());
        };
        let mut next = 0usize;
        for (start, plan) in model.windows(n) {
            prop_assert_eq!(start, next);
            prop_assert_eq!(plan.intensive + plan.non_intensive, plan.accesses);
            prop_assert!(plan.accesses <= model.accesses_per_window());
            next += plan.accesses;
        }
        prop_assert_eq!(next, n);
    }

    #[test]
    fn pcs_only_on_reads_and_monotone(rp in 0.0f64..=1.0, max_step in 1u64..200, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = classify_accesses(300, rp, &mut rng);
        assign_pcs(&mut t, max_step, &mut rng).unwrap();
        let mut last = 0u64;
        for r in &t {
            prop_assert_eq!(r.pc().is_some(), r.kind() == AccessKind::Read);
            if let Some(pc) = r.pc() {
                prop_assert!(pc >= last);
                last = pc;
            }
        }
    }
}

#[test]
fn read_positions_show_no_positional_bias() {
    const N: usize = 20;
    const TRIALS: usize = 4_000;
    let mut hits = [0usize; N];
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..TRIALS {
        let t = classify_accesses(N, 0.25, &mut rng);
        for (i, r) in t.iter().enumerate() {
            if r.kind() == AccessKind::Read {
                hits[i] += 1;
            }
        }
    }
    // Each slot is a read with probability 5/20; expect ~1000 hits per slot.
    for (i, h) in hits.iter().enumerate() {
        assert!((850..=1150).contains(h), "slot {i}: {h} hits");
    }
}

fn phase_means(family: TemporalPattern) -> (f64, f64) {
    let model = PhaseModel::new(1.0, 10_000, 0.2, 0.8).unwrap();
    let mut rng = StdRng::seed_from_u64(21);
    let mut t = Trace::from_records(vec![AccessRecord::read(); 100_000]);
    assign_delays(&mut t, &model, family, &mut rng).unwrap();

    let (mut busy, mut idle) = ((0u64, 0u64), (0u64, 0u64));
    for (start, plan) in model.windows(t.len()) {
        for (k, r) in t.records()[start..start + plan.accesses].iter().enumerate() {
            let acc = if k < plan.intensive { &mut busy } else { &mut idle };
            acc.0 += r.delay;
            acc.1 += 1;
        }
    }
    (
        busy.0 as f64 / busy.1 as f64,
        idle.0 as f64 / idle.1 as f64,
    )
}

#[test]
fn busy_phase_is_tighter_uniform() {
    let (busy, idle) = phase_means(TemporalPattern::Uniform);
    // U[0, 250] and U[0, 4000], truncated: means ~124.5 and ~1999.5.
    assert!((busy - 124.5).abs() < 5.0, "busy mean {busy}");
    assert!((idle - 1999.5).abs() < 60.0, "idle mean {idle}");
    assert!(busy < idle);
}

#[test]
fn busy_phase_is_tighter_poisson() {
    let (busy, idle) = phase_means(TemporalPattern::Poisson);
    // Poisson(250) and Poisson(4000).
    assert!((busy - 250.0).abs() < 2.0, "busy mean {busy}");
    assert!((idle - 4000.0).abs() < 15.0, "idle mean {idle}");
    assert!(busy < idle);
}

#[test]
fn full_pipeline_is_reproducible_per_seed() {
    let plan = TraceConfig {
        trace_length: 5_000,
        read_proportion: 0.3,
        ..TraceConfig::default()
    }
    .validate()
    .unwrap();
    let a = generate(&plan, 8).unwrap();
    let b = generate(&plan, 8).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.read_count(), 1_500);
    assert!(a.iter().all(|r| r.address < plan.address_space.byte_limit()));
}
