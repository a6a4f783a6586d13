//! JSON line-delimited logging for interactive runs
//!
//! Each round appends one entry to `logs/rounds.jsonl`; the logger also
//! keeps an in-memory buffer so tests can assert on entries without
//! touching the filesystem on every record.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

fn ensure_log_dir() -> io::Result<()> {
    fs::create_dir_all("logs")
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Single journal entry for one interactive round
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundLogEntry {
    pub sequence: usize,
    pub t: usize,
    pub selected: usize,
    pub predicted: usize,
    pub actual: usize,
    pub explained: bool,
    pub n_corrections: usize,
    pub balance: f64,
    pub test_f1: f64,
    pub eval_f1: Option<f64>,
    pub timestamp_ms: u128,
}

/// Round logger with a configurable file-sampling interval
#[derive(Debug, Clone)]
pub struct RunLogger {
    log_every: usize,
    sequence: usize,
    entries: Vec<RoundLogEntry>,
}

impl RunLogger {
    pub fn new(log_every: usize) -> Self {
        Self {
            log_every: log_every.max(1),
            sequence: 0,
            entries: Vec::new(),
        }
    }

    /// Recorded entries, in order
    pub fn entries(&self) -> &[RoundLogEntry] {
        &self.entries
    }

    /// Record one round; every `log_every`-th entry is also appended to
    /// `logs/rounds.jsonl`
    pub fn record(&mut self, mut entry: RoundLogEntry) -> io::Result<()> {
        self.sequence += 1;
        entry.sequence = self.sequence;
        entry.timestamp_ms = timestamp_now();
        self.entries.push(entry.clone());

        if self.sequence % self.log_every == 0 {
            ensure_log_dir()?;
            append_json_line("logs/rounds.jsonl", &entry)?;
        }

        Ok(())
    }
}

/// Diagnostic event entry (e.g. a skipped best-effort path)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticLogEntry<'a> {
    context: &'a str,
    details: &'a str,
    timestamp_ms: u128,
}

/// Append a diagnostic event to `logs/diagnostics.jsonl`
pub fn log_diagnostic(context: &str, details: &str) -> io::Result<()> {
    ensure_log_dir()?;
    let entry = DiagnosticLogEntry {
        context,
        details,
        timestamp_ms: timestamp_now(),
    };
    append_json_line("logs/diagnostics.jsonl", &entry)
}
