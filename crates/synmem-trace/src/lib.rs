//! Synthetic memory-access trace generation.
//!
//! A trace is built in one forward pass over a single in-memory `Trace`:
//!
//! - `classify`: decides which slots are reads and which are writes.
//! - `spatial`: assigns a byte address to every slot (random or sequential).
//! - `temporal`: assigns inter-arrival delays window by window, splitting each
//!   window into a busy phase and an idle phase.
//! - `pc`: gives every read a synthetic, non-decreasing instruction pointer.
//!
//! `config` turns user parameters into a validated `GenerationPlan` before any
//! of that work starts, `generator` drives the stages, and `io` moves finished
//! traces to and from disk.
//!
//! Callers are expected to import through module paths such as
//! `synmem_trace::generator::generate`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions
)]

/// Read/write split over a fresh trace.
pub mod classify;
/// User-facing parameters, pattern names, and validation.
pub mod config;
/// Access records, the trace container, and the text line format.
pub mod format;
/// Pipeline driver running every stage in order.
pub mod generator;
/// Text/JSON read and write helpers.
pub mod io;
/// Synthetic instruction pointers for reads.
pub mod pc;
/// Address assignment.
pub mod spatial;
/// Windowed busy/idle delay assignment.
pub mod temporal;
