//! Synthetic instruction pointers for reads.
//!
//! A cursor starts at a random point in `[0, PC_START_MAX]` and walks forward
//! by a fresh `U[1, pc_max_interval]` step for each read, in trace order. The
//! read's PC is `round((cursor + step) * INSTRUCTION_BYTES)`. The cursor keeps
//! its fractional part between reads, so PCs never decrease.

use rand::distr::{Distribution, Uniform};
use rand::Rng;

use crate::config::ConfigError;
use crate::format::Trace;

/// Upper bound (inclusive) of the starting cursor.
pub const PC_START_MAX: u64 = 1000;

/// Cursor-to-PC scale.
pub const INSTRUCTION_BYTES: f64 = 8.0;

/// Give every read in `trace` a PC; writes are left without one.
pub fn assign_pcs<R: Rng + ?Sized>(
    trace: &mut Trace,
    pc_max_interval: u64,
    rng: &mut R,
) -> Result<(), ConfigError> {
    let steps = Uniform::new_inclusive(1.0, pc_max_interval as f64).map_err(|e| {
        ConfigError::InvalidParameter {
            name: "pc_max_interval",
            reason: e.to_string(),
        }
    })?;

    let mut cursor = rng.random_range(0..=PC_START_MAX) as f64;
    for rec in trace.records_mut().iter_mut().filter(|r| r.is_read()) {
        let step: f64 = steps.sample(rng);
        let pc = ((cursor + step) * INSTRUCTION_BYTES).round() as u64;
        let attached = rec.attach_pc(pc);
        debug_assert!(attached);
        cursor += step;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AccessRecord;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn only_reads_get_pcs_and_they_never_decrease() {
        let mut rng = StdRng::seed_from_u64(5);
        let recs = (0..500)
            .map(|i| {
                if i % 3 == 0 {
                    AccessRecord::write()
                } else {
                    AccessRecord::read()
                }
            })
            .collect();
        let mut t = Trace::from_records(recs);
        assign_pcs(&mut t, 50, &mut rng).unwrap();

        let mut last = 0u64;
        for r in &t {
            match r.pc() {
                Some(pc) => {
                    assert!(r.is_read());
                    assert!(pc >= last);
                    last = pc;
                }
                None => assert!(!r.is_read()),
            }
        }
    }

    #[test]
    fn steps_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut t = Trace::from_records(vec![AccessRecord::read(); 1_000]);
        assign_pcs(&mut t, 4, &mut rng).unwrap();

        let pcs: Vec<u64> = t.iter().filter_map(AccessRecord::pc).collect();
        assert!(pcs[0] >= 8 && pcs[0] <= (PC_START_MAX + 4) * 8);
        for w in pcs.windows(2) {
            let gap = w[1] - w[0];
            // Step in [1, 4] instructions, give or take one byte of rounding.
            assert!((7..=33).contains(&gap), "gap {gap}");
        }
    }
}
