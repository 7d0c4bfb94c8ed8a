//! Windowed busy/idle delay assignment.
//!
//! The trace is cut into consecutive windows of `mpki * period_width / 1000`
//! accesses (the last one may be shorter). Inside a window the first
//! `intensive` slots belong to the busy phase: they share `busy_phase_proportion`
//! of the window's instructions, so their mean gap is tighter than the idle
//! phase's that follows.
//!
//! The mean gaps come from the real-valued access split, not the rounded slot
//! counts. With `a = mpki * period_width / 1000` (or the remaining access
//! count for the shrunk last window) and intensive share `i`:
//!
//! ```text
//! busy_interval = period_width * busy_phase_proportion       / (a * i)
//! idle_interval = period_width * (1 - busy_phase_proportion) / (a - a * i)
//! uniform  -> delay ~ U[0, interval]
//! poisson  -> delay ~ Poisson(lambda = interval)
//! ```
//!
//! Slot counts are `floor(a)` per full window and `round(slots * i)` busy
//! slots. Samples are truncated toward zero.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Poisson;
use tracing::debug;

use crate::config::{ConfigError, TemporalPattern};
use crate::format::Trace;

/// Shape of every window, derived from the user parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseModel {
    period_width: u64,
    per_window: f64,
    accesses_per_window: usize,
    busy_phase_proportion: f64,
    intensive_proportion: f64,
}

/// Slot counts and mean gaps for one concrete window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowPlan {
    /// Accesses covered by this window.
    pub accesses: usize,
    /// Leading busy-phase slots.
    pub intensive: usize,
    /// Trailing idle-phase slots.
    pub non_intensive: usize,
    /// Mean gap in the busy phase (0 when it has no slots).
    pub intensive_interval: f64,
    /// Mean gap in the idle phase (0 when it has no slots).
    pub non_intensive_interval: f64,
}

impl PhaseModel {
    /// Build the model; proportions are expected to be already range-checked.
    pub fn new(
        mpki: f64,
        period_width: u64,
        busy_phase_proportion: f64,
        intensive_proportion: f64,
    ) -> Result<Self, ConfigError> {
        let per_window = (mpki * period_width as f64 / 1000.0).floor();
        if !(per_window >= 1.0) {
            return Err(ConfigError::EmptyWindow { mpki, period_width });
        }
        Ok(Self {
            period_width,
            per_window: mpki * period_width as f64 / 1000.0,
            accesses_per_window: per_window as usize,
            busy_phase_proportion,
            intensive_proportion,
        })
    }

    /// Accesses in a full window.
    #[inline]
    #[must_use]
    pub const fn accesses_per_window(&self) -> usize {
        self.accesses_per_window
    }

    /// Plan for the window that starts with `remaining` accesses left.
    ///
    /// A full window covers `accesses_per_window` slots and takes its mean
    /// gaps from the real per-window access count; once fewer than that real
    /// count remain, the window shrinks to the remainder and recomputes.
    #[must_use]
    pub fn window(&self, remaining: usize) -> WindowPlan {
        let (accesses, real) = if remaining as f64 >= self.per_window {
            (self.accesses_per_window, self.per_window)
        } else {
            (remaining, remaining as f64)
        };
        let intensive =
            ((accesses as f64 * self.intensive_proportion).round() as usize).min(accesses);
        let non_intensive = accesses - intensive;

        let width = self.period_width as f64;
        let real_intensive = real * self.intensive_proportion;
        WindowPlan {
            accesses,
            intensive,
            non_intensive,
            intensive_interval: mean_interval(
                width * self.busy_phase_proportion,
                real_intensive,
                intensive,
            ),
            non_intensive_interval: mean_interval(
                width * (1.0 - self.busy_phase_proportion),
                real - real_intensive,
                non_intensive,
            ),
        }
    }

    /// `(first_slot, plan)` for every window needed to cover `trace_length`
    /// accesses; the last window shrinks to the remainder.
    pub fn windows(&self, trace_length: usize) -> impl Iterator<Item = (usize, WindowPlan)> + '_ {
        (0..trace_length)
            .step_by(self.accesses_per_window)
            .map(move |start| (start, self.window(trace_length - start)))
    }

    /// Build every delay distribution a `trace_length`-access run will need.
    ///
    /// All windows but the last share one shape, so checking the first and
    /// the last covers the run; `assign_delays` cannot fail after this passes.
    pub fn check_delays(
        &self,
        family: TemporalPattern,
        trace_length: usize,
    ) -> Result<(), ConfigError> {
        let mut plans = self.windows(trace_length);
        for plan in plans.next().into_iter().chain(plans.last()) {
            DelaySampler::new(family, plan.1.intensive_interval)?;
            DelaySampler::new(family, plan.1.non_intensive_interval)?;
        }
        Ok(())
    }
}

fn mean_interval(instructions: f64, real_accesses: f64, slots: usize) -> f64 {
    if slots == 0 || real_accesses <= 0.0 {
        0.0
    } else {
        instructions / real_accesses
    }
}

/// One phase's delay source.
#[derive(Debug)]
enum DelaySampler {
    Zero,
    Uniform(Uniform<f64>),
    Poisson(Poisson<f64>),
}

impl DelaySampler {
    fn new(family: TemporalPattern, mean: f64) -> Result<Self, ConfigError> {
        if mean == 0.0 {
            return Ok(Self::Zero);
        }
        let fail = |reason: String| ConfigError::DelayDistribution {
            family,
            mean,
            reason,
        };
        match family {
            TemporalPattern::Uniform => Uniform::new_inclusive(0.0, mean)
                .map(Self::Uniform)
                .map_err(|e| fail(e.to_string())),
            TemporalPattern::Poisson => Poisson::new(mean)
                .map(Self::Poisson)
                .map_err(|e| fail(e.to_string())),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self {
            Self::Zero => 0,
            Self::Uniform(d) => d.sample(rng) as u64,
            Self::Poisson(d) => d.sample(rng) as u64,
        }
    }
}

/// Assign `delay` to every record in `trace`, window by window.
///
/// Plans produced by `TraceConfig::validate` have already passed
/// `PhaseModel::check_delays`, so the error branch only fires for hand-built
/// models.
pub fn assign_delays<R: Rng + ?Sized>(
    trace: &mut Trace,
    phases: &PhaseModel,
    family: TemporalPattern,
    rng: &mut R,
) -> Result<(), ConfigError> {
    let n = trace.len();
    let records = trace.records_mut();
    let mut windows = 0usize;

    for (start, plan) in phases.windows(n) {
        let busy = DelaySampler::new(family, plan.intensive_interval)?;
        let idle = DelaySampler::new(family, plan.non_intensive_interval)?;

        let slots = &mut records[start..start + plan.accesses];
        let (busy_slots, idle_slots) = slots.split_at_mut(plan.intensive);
        for rec in busy_slots {
            rec.delay = busy.sample(rng);
        }
        for rec in idle_slots {
            rec.delay = idle.sample(rng);
        }
        windows += 1;
    }

    debug!(windows, per_window = phases.accesses_per_window(), "delays assigned");
    Ok(())
}
