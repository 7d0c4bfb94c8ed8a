//! Read/write split.
//!
//! For a proportion strictly between 0 and 1, exactly
//! `floor(trace_length * read_proportion)` slots become reads, chosen
//! uniformly without replacement; every other slot is a write.

use rand::seq::index;
use rand::Rng;

use crate::format::{AccessKind, AccessRecord, Trace};

/// Number of reads a trace of `trace_length` accesses gets.
#[must_use]
pub fn read_count(trace_length: usize, read_proportion: f64) -> usize {
    if read_proportion <= 0.0 {
        0
    } else if read_proportion >= 1.0 {
        trace_length
    } else {
        ((trace_length as f64 * read_proportion).floor() as usize).min(trace_length)
    }
}

/// Build a fresh trace of `trace_length` records with kinds assigned.
pub fn classify_accesses<R: Rng + ?Sized>(
    trace_length: usize,
    read_proportion: f64,
    rng: &mut R,
) -> Trace {
    let reads = read_count(trace_length, read_proportion);
    if reads == 0 || reads == trace_length {
        let kind = if reads == 0 {
            AccessKind::Write
        } else {
            AccessKind::Read
        };
        return Trace::from_records(vec![AccessRecord::new(kind); trace_length]);
    }

    let mut records = vec![AccessRecord::write(); trace_length];
    for slot in index::sample(rng, trace_length, reads) {
        records[slot] = AccessRecord::read();
    }
    Trace::from_records(records)
}
