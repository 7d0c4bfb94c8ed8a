//! Read/write helpers for finished traces.
//!
//! Two formats:
//! - **text**: one `AccessRecord` line per access (`<delay> <R|W> <0xADDR> [<0xPC>]`),
//!   the format simulators consume;
//! - **JSON**: a `TraceEnvelope` that also records the seed and parameters.
//!
//! `*_auto` picks JSON for a `.json` extension and text for anything else.
//! Writers truncate existing files.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::format::{AccessRecord, Trace, TraceEnvelope};

/* ---------------- Text ---------------- */

/// Write one line per record to `w`.
pub fn write_lines<W: Write>(mut w: W, trace: &Trace) -> Result<()> {
    for rec in trace {
        writeln!(w, "{rec}").context("write trace line")?;
    }
    Ok(())
}

/// Parse text lines from `r`; blank lines are skipped.
pub fn read_lines<R: BufRead>(r: R) -> Result<Trace> {
    let mut records = Vec::new();
    for (idx, line) in r.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let rec: AccessRecord = line
            .parse()
            .map_err(|e| anyhow!("line {}: {e}", idx + 1))?;
        records.push(rec);
    }
    Ok(Trace::from_records(records))
}

/// Write a trace in the text format.
pub fn write_trace_text<P: AsRef<Path>>(path: P, trace: &Trace) -> Result<()> {
    let path_ref = path.as_ref();
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    write_lines(&mut w, trace).with_context(|| format!("write {}", display(path_ref)))?;
    w.flush().with_context(|| "flush text writer")?;
    Ok(())
}

/// Read a trace in the text format.
pub fn read_trace_text<P: AsRef<Path>>(path: P) -> Result<Trace> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    read_lines(BufReader::new(f)).with_context(|| format!("parse {}", display(path_ref)))
}

/* ---------------- JSON ---------------- */

/// Write a `TraceEnvelope` as JSON.
pub fn write_trace_json<P: AsRef<Path>>(path: P, env: &TraceEnvelope) -> Result<()> {
    let path_ref = path.as_ref();
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, env).with_context(|| "serialize JSON trace envelope")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read a `TraceEnvelope` from JSON.
pub fn read_trace_json<P: AsRef<Path>>(path: P) -> Result<TraceEnvelope> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let env: TraceEnvelope = serde_json::from_reader(BufReader::new(f))
        .with_context(|| "deserialize JSON trace envelope")?;
    Ok(env)
}

/* --------------- Auto-detect by extension --------------- */

/// Write `env` to `path`: JSON envelope for `.json`, bare text lines otherwise.
pub fn write_trace_auto<P: AsRef<Path>>(path: P, env: &TraceEnvelope) -> Result<()> {
    if is_json(path.as_ref()) {
        write_trace_json(path, env)
    } else {
        write_trace_text(path, &env.records)
    }
}

/// Read the records back from either format.
pub fn read_trace_auto<P: AsRef<Path>>(path: P) -> Result<Trace> {
    if is_json(path.as_ref()) {
        read_trace_json(path).map(|env| env.records)
    } else {
        read_trace_text(path)
    }
}

/* ---------------- Small helpers ---------------- */

#[inline]
fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[inline]
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TraceConfig;
    use crate::format::AccessKind;

    fn tmp_path(name: &str, ext: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("synmem_trace_io_{name}_{nanos}.{ext}"));
        p
    }

    fn sample_trace() -> Trace {
        let mut r = AccessRecord::read();
        r.delay = 250;
        r.address = 0x7ff8;
        assert!(r.attach_pc(0x1f48));
        let mut w = AccessRecord::write();
        w.delay = 3;
        w.address = 0x10;
        Trace::from_records(vec![r, w])
    }

    #[test]
    fn text_lines_exact_bytes() {
        let mut buf = Vec::new();
        write_lines(&mut buf, &sample_trace()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "250 R 0x7ff8 0x1f48\n3 W 0x10\n"
        );
    }

    #[test]
    fn text_file_overwrites_and_reads_back() {
        let path = tmp_path("text", "tr");
        std::fs::write(&path, "stale contents that are longer than the trace\n".repeat(10))
            .unwrap();
        let t = sample_trace();
        write_trace_text(&path, &t).unwrap();
        assert_eq!(read_trace_text(&path).unwrap(), t);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn json_envelope_by_extension() {
        let path = tmp_path("env", "json");
        let env = TraceEnvelope::new(42, TraceConfig::default(), sample_trace());
        write_trace_auto(&path, &env).unwrap();

        let back = read_trace_json(&path).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.config, TraceConfig::default());
        assert_eq!(back.records.records()[0].kind(), AccessKind::Read);
        assert_eq!(read_trace_auto(&path).unwrap(), env.records);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn bad_line_reports_line_number() {
        let err = read_lines("1 W 0x8\n2 Q 0x10\n".as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");
    }

    #[test]
    fn missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("synmem_trace_no_such_dir_4f1c")
            .join("out.tr");
        assert!(write_trace_text(&path, &sample_trace()).is_err());
    }
}
