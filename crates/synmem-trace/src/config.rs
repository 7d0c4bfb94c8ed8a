//! Generation parameters, pattern names, and up-front validation.
//!
//! `TraceConfig` is the loose, user-facing shape (CLI flags, TOML files).
//! `TraceConfig::validate` turns it into a `GenerationPlan` whose pieces are
//! already typed and range-checked, so the stages themselves never need to
//! reject a pattern halfway through a run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial::{AddressPattern, AddressSpace};
use crate::temporal::PhaseModel;

/// Everything that can be wrong with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Spatial pattern name not recognised at all.
    #[error("unknown spatial pattern `{0}` (expected one of: {names})", names = SpatialPattern::NAMES.join("|"))]
    UnknownSpatialPattern(String),
    /// Spatial pattern is documented but has no generator.
    #[error("unsupported spatial pattern `{0}` (implemented: random|sequential)")]
    UnsupportedSpatialPattern(SpatialPattern),
    /// Temporal pattern name not recognised.
    #[error("unsupported temporal pattern `{0}` (expected uniform|poisson)")]
    UnknownTemporalPattern(String),
    /// A proportion is NaN or outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    ProportionOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Any other out-of-range scalar.
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// `mpki * period_width / 1000` rounds down to zero accesses per window.
    #[error("mpki {mpki} over a {period_width}-instruction window yields no accesses per window")]
    EmptyWindow {
        /// Accesses per kilo-instruction.
        mpki: f64,
        /// Window width in instructions.
        period_width: u64,
    },
    /// Capacity and word width describe more bytes than a `u64` address holds.
    #[error("address space of {capacity_gb} GB with {system_type}-bit words overflows 64-bit addresses")]
    AddressSpaceOverflow {
        /// Capacity in GB.
        capacity_gb: u64,
        /// Word width in bits.
        system_type: u32,
    },
    /// A delay distribution could not be built for a window's mean interval.
    #[error("cannot build {family} delay distribution with mean interval {mean}: {reason}")]
    DelayDistribution {
        /// Distribution family.
        family: TemporalPattern,
        /// Mean interval it was asked for.
        mean: f64,
        /// Underlying error text.
        reason: String,
    },
}

/// Every spatial pattern name the tool knows about.
///
/// Only `Random` and `Sequential` have generators; the rest are accepted as
/// names and rejected by `TraceConfig::validate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpatialPattern {
    /// Independent uniform addresses.
    Random,
    /// Consecutive words with random restarts.
    Sequential,
    /// Fixed-stride walk.
    Strided,
    /// Linear walk.
    Linear,
    /// Neighbourhood accesses.
    Neighbor,
    /// Two-dimensional tile walk.
    Spatial2d,
    /// Scatter.
    Scatter,
    /// Gather.
    Gather,
    /// Interleaved scatter/gather.
    CombineScatterGather,
}

impl SpatialPattern {
    /// Accepted names, in declaration order.
    pub const NAMES: [&'static str; 9] = [
        "random",
        "sequential",
        "strided",
        "linear",
        "neighbor",
        "2d-spatial",
        "scatter",
        "gather",
        "combine-scatter-gather",
    ];

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sequential => "sequential",
            Self::Strided => "strided",
            Self::Linear => "linear",
            Self::Neighbor => "neighbor",
            Self::Spatial2d => "2d-spatial",
            Self::Scatter => "scatter",
            Self::Gather => "gather",
            Self::CombineScatterGather => "combine-scatter-gather",
        }
    }

    /// The generator for this pattern, if one exists.
    #[must_use]
    pub const fn implemented(self) -> Option<AddressPattern> {
        match self {
            Self::Random => Some(AddressPattern::Random),
            Self::Sequential => Some(AddressPattern::Sequential),
            _ => None,
        }
    }
}

impl fmt::Display for SpatialPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpatialPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "random" => Self::Random,
            "sequential" => Self::Sequential,
            "strided" => Self::Strided,
            "linear" => Self::Linear,
            "neighbor" => Self::Neighbor,
            // Older tooling spelled it "spartial".
            "2d-spatial" | "2d-spartial" => Self::Spatial2d,
            "scatter" => Self::Scatter,
            "gather" => Self::Gather,
            "combine-scatter-gather" => Self::CombineScatterGather,
            _ => return Err(ConfigError::UnknownSpatialPattern(s.to_owned())),
        })
    }
}

impl TryFrom<String> for SpatialPattern {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SpatialPattern> for String {
    fn from(p: SpatialPattern) -> Self {
        p.name().to_owned()
    }
}

/// Distribution family for inter-arrival delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemporalPattern {
    /// Continuous uniform on `[0, mean_interval]`.
    Uniform,
    /// Poisson with rate parameter equal to the mean interval.
    Poisson,
}

impl TemporalPattern {
    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Poisson => "poisson",
        }
    }
}

impl fmt::Display for TemporalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemporalPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "poisson" => Ok(Self::Poisson),
            _ => Err(ConfigError::UnknownTemporalPattern(s.to_owned())),
        }
    }
}

impl TryFrom<String> for TemporalPattern {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TemporalPattern> for String {
    fn from(p: TemporalPattern) -> Self {
        p.name().to_owned()
    }
}

/// User-facing generation parameters.
///
/// Missing fields in a TOML file fall back to `Default`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Memory accesses per kilo-instruction.
    pub mpki: f64,
    /// Periodic window width, in instructions.
    pub period_width: u64,
    /// Share of each window taken by the busy phase.
    pub busy_phase_proportion: f64,
    /// Share of each window's accesses issued during the busy phase.
    pub intensive_proportion: f64,
    /// Share of accesses that are reads.
    pub read_proportion: f64,
    /// Number of accesses to generate.
    pub trace_length: u64,
    /// Destination file.
    pub output: PathBuf,
    /// Address pattern name.
    pub spatial_pattern: SpatialPattern,
    /// Delay distribution family.
    pub temporal_pattern: TemporalPattern,
    /// Memory capacity in GB.
    pub capacity: u64,
    /// Cache line size in bytes. Recorded only; generation ignores it.
    pub cacheline_size: u64,
    /// Word width in bits (32 or 64 in practice).
    pub system_type: u32,
    /// Upper bound of the PC step between consecutive reads.
    pub pc_max_interval: u64,
    /// RNG seed; a fresh one is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            mpki: 1.0,
            period_width: 10_000,
            busy_phase_proportion: 0.2,
            intensive_proportion: 0.8,
            read_proportion: 0.5,
            trace_length: 1_000_000,
            output: PathBuf::from("out.tr"),
            spatial_pattern: SpatialPattern::Random,
            temporal_pattern: TemporalPattern::Uniform,
            capacity: 4,
            cacheline_size: 64,
            system_type: 64,
            pc_max_interval: 50,
            seed: None,
        }
    }
}

/// Validated, typed parameters consumed by the pipeline stages.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationPlan {
    /// Number of accesses.
    pub trace_length: usize,
    /// Share of reads, within `[0, 1]`.
    pub read_proportion: f64,
    /// Addressable words.
    pub address_space: AddressSpace,
    /// Implemented address generator.
    pub address_pattern: AddressPattern,
    /// Busy/idle window model.
    pub phases: PhaseModel,
    /// Delay distribution family.
    pub delay_family: TemporalPattern,
    /// Upper bound of the PC step, at least 1.
    pub pc_max_interval: u64,
}

fn check_proportion(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::ProportionOutOfRange { name, value })
    }
}

impl TraceConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        toml::from_str(src).context("parse trace config TOML")
    }

    /// Read and parse a TOML config file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Check every parameter and build the plan the stages run from.
    ///
    /// Pattern checks come first, so an unsupported pattern is reported even
    /// when other parameters are also off.
    pub fn validate(&self) -> Result<GenerationPlan, ConfigError> {
        let address_pattern = self
            .spatial_pattern
            .implemented()
            .ok_or(ConfigError::UnsupportedSpatialPattern(self.spatial_pattern))?;

        let read_proportion = check_proportion("read_proportion", self.read_proportion)?;
        let busy = check_proportion("busy_phase_proportion", self.busy_phase_proportion)?;
        let intensive = check_proportion("intensive_proportion", self.intensive_proportion)?;

        if self.trace_length == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "trace_length",
                reason: "must be at least 1".into(),
            });
        }
        let trace_length =
            usize::try_from(self.trace_length).map_err(|_| ConfigError::InvalidParameter {
                name: "trace_length",
                reason: format!("{} does not fit in memory on this platform", self.trace_length),
            })?;

        if !self.mpki.is_finite() || self.mpki < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "mpki",
                reason: format!("must be a finite non-negative number, got {}", self.mpki),
            });
        }
        if self.pc_max_interval < 1 {
            return Err(ConfigError::InvalidParameter {
                name: "pc_max_interval",
                reason: "must be at least 1".into(),
            });
        }

        let address_space = AddressSpace::new(self.capacity, self.system_type)?;
        let phases = PhaseModel::new(self.mpki, self.period_width, busy, intensive)?;
        phases.check_delays(self.temporal_pattern, trace_length)?;

        Ok(GenerationPlan {
            trace_length,
            read_proportion,
            address_space,
            address_pattern,
            phases,
            delay_family: self.temporal_pattern,
            pc_max_interval: self.pc_max_interval,
        })
    }
}
