//! Access records, the `Trace` container, and the flat text line format.
//!
//! One record renders as one line:
//!
//! ```text
//! <delay> <R|W> <0xADDR> [<0xPC>]
//! ```
//!
//! Only reads carry a PC. `AccessRecord` keeps `kind` and `pc` private so that
//! invariant cannot be broken after construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TraceConfig;

/// Envelope version written by the JSON format.
pub const TRACE_FORMAT_VERSION: u16 = 1;

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    /// Load; carries a PC once the PC stage has run.
    #[serde(rename = "R")]
    Read,
    /// Store; never carries a PC.
    #[serde(rename = "W")]
    Write,
}

impl AccessKind {
    /// Single-letter tag used in the text format.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct AccessRecord {
    /// Instruction-count gap since the previous access.
    pub delay: u64,
    kind: AccessKind,
    /// Byte address.
    pub address: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pc: Option<u64>,
}

impl AccessRecord {
    /// A read with zero delay, address 0, and no PC yet.
    #[inline]
    #[must_use]
    pub const fn read() -> Self {
        Self {
            delay: 0,
            kind: AccessKind::Read,
            address: 0,
            pc: None,
        }
    }

    /// A write with zero delay and address 0.
    #[inline]
    #[must_use]
    pub const fn write() -> Self {
        Self {
            delay: 0,
            kind: AccessKind::Write,
            address: 0,
            pc: None,
        }
    }

    /// Fresh record of the given kind.
    #[inline]
    #[must_use]
    pub const fn new(kind: AccessKind) -> Self {
        match kind {
            AccessKind::Read => Self::read(),
            AccessKind::Write => Self::write(),
        }
    }

    /// Access direction.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> AccessKind {
        self.kind
    }

    /// Whether this is a read.
    #[inline]
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self.kind, AccessKind::Read)
    }

    /// Synthetic PC; always `None` for writes.
    #[inline]
    #[must_use]
    pub const fn pc(&self) -> Option<u64> {
        self.pc
    }

    /// Attach a PC. Returns `false` (and leaves the record untouched) for writes.
    #[must_use]
    pub fn attach_pc(&mut self, pc: u64) -> bool {
        if self.is_read() {
            self.pc = Some(pc);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:#x}", self.delay, self.kind, self.address)?;
        if let Some(pc) = self.pc {
            write!(f, " {pc:#x}")?;
        }
        Ok(())
    }
}

/// Failure to parse one text line back into an `AccessRecord`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRecordError {
    /// Fewer than three or more than four fields.
    #[error("expected 3 or 4 fields, found {0}")]
    FieldCount(usize),
    /// Delay is not a decimal integer.
    #[error("bad delay `{0}`")]
    Delay(String),
    /// Kind is neither `R` nor `W`.
    #[error("bad access kind `{0}` (expected R or W)")]
    Kind(String),
    /// Address or PC is not `0x`-prefixed hex.
    #[error("bad hex value `{0}`")]
    Hex(String),
    /// A write line carried a fourth field.
    #[error("write access carries a pc")]
    PcOnWrite,
}

fn parse_hex(s: &str) -> Result<u64, ParseRecordError> {
    s.strip_prefix("0x")
        .and_then(|digits| u64::from_str_radix(digits, 16).ok())
        .ok_or_else(|| ParseRecordError::Hex(s.to_owned()))
}

impl FromStr for AccessRecord {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(3..=4).contains(&fields.len()) {
            return Err(ParseRecordError::FieldCount(fields.len()));
        }

        let delay = fields[0]
            .parse::<u64>()
            .map_err(|_| ParseRecordError::Delay(fields[0].to_owned()))?;
        let kind = match fields[1] {
            "R" => AccessKind::Read,
            "W" => AccessKind::Write,
            other => return Err(ParseRecordError::Kind(other.to_owned())),
        };
        let address = parse_hex(fields[2])?;

        let mut rec = Self::new(kind);
        rec.delay = delay;
        rec.address = address;
        if let Some(pc) = fields.get(3) {
            if !rec.attach_pc(parse_hex(pc)?) {
                return Err(ParseRecordError::PcOnWrite);
            }
        }
        Ok(rec)
    }
}

/// Unchecked wire shape; converted through `TryFrom` so deserialized records
/// obey the same invariant as constructed ones.
#[derive(Deserialize)]
struct RawRecord {
    delay: u64,
    kind: AccessKind,
    address: u64,
    #[serde(default)]
    pc: Option<u64>,
}

impl TryFrom<RawRecord> for AccessRecord {
    type Error = ParseRecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let mut rec = Self::new(raw.kind);
        rec.delay = raw.delay;
        rec.address = raw.address;
        if let Some(pc) = raw.pc {
            if !rec.attach_pc(pc) {
                return Err(ParseRecordError::PcOnWrite);
            }
        }
        Ok(rec)
    }
}

/// Ordered sequence of accesses in issue order.
///
/// The length is fixed when the trace is built; stages mutate records in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    records: Vec<AccessRecord>,
}

impl Trace {
    /// Wrap an already-built record list.
    #[must_use]
    pub const fn from_records(records: Vec<AccessRecord>) -> Self {
        Self { records }
    }

    /// Number of accesses.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the trace has no accesses.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in issue order.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[AccessRecord] {
        &self.records
    }

    /// Mutable view; the length cannot change through it.
    #[inline]
    pub fn records_mut(&mut self) -> &mut [AccessRecord] {
        &mut self.records
    }

    /// Iterate records in issue order.
    pub fn iter(&self) -> std::slice::Iter<'_, AccessRecord> {
        self.records.iter()
    }

    /// Number of reads.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_read()).count()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a AccessRecord;
    type IntoIter = std::slice::Iter<'a, AccessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// JSON envelope: the trace plus what is needed to regenerate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEnvelope {
    /// Format/version tag for forward-compat.
    pub version: u16,
    /// Seed the generator ran with.
    pub seed: u64,
    /// Parameters the trace was generated from.
    pub config: TraceConfig,
    /// The accesses.
    pub records: Trace,
}

impl TraceEnvelope {
    /// Wrap a trace with its provenance at the current format version.
    #[must_use]
    pub const fn new(seed: u64, config: TraceConfig, records: Trace) -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            seed,
            config,
            records,
        }
    }
}
