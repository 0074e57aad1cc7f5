//! JSONL audit trail logging.
//!
//! Each run appends events to an audit.jsonl file, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use fundpie::{Allocation, CoverageReport};
use fundpie_broker::PieCreated;
use serde::Serialize;
use serde_json::json;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<Box<dyn Write>>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self::from_writer(file))
    }

    /// Audit into any sink, e.g. `std::io::sink()` for dry tests.
    pub fn from_writer(writer: impl Write + 'static) -> Self {
        Self {
            writer: BufWriter::new(Box::new(writer)),
        }
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, json!({}))
    }
}

pub fn log_run_started(audit: &mut AuditLog, holdings_file: &str, pie_name: &str) -> Result<()> {
    audit.log(
        "run_started",
        json!({
            "holdings_file": holdings_file,
            "pie": pie_name,
        }),
    )
}

pub fn log_holdings_loaded(audit: &mut AuditLog, count: usize, universe_size: usize) -> Result<()> {
    audit.log(
        "holdings_loaded",
        json!({
            "holdings": count,
            "universe": universe_size,
        }),
    )
}

pub fn log_coverage(audit: &mut AuditLog, report: &CoverageReport) -> Result<()> {
    let data = serde_json::to_value(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    audit.log("coverage_computed", data)
}

pub fn log_allocation(audit: &mut AuditLog, allocation: &Allocation) -> Result<()> {
    audit.log(
        "allocation_computed",
        json!({
            "instruments": allocation.len(),
            "shares": allocation,
        }),
    )
}

pub fn log_user_confirmed(audit: &mut AuditLog, confirmed: bool) -> Result<()> {
    audit.log("user_confirmed", json!({ "confirmed": confirmed }))
}

pub fn log_pie_created(audit: &mut AuditLog, created: &PieCreated) -> Result<()> {
    audit.log(
        "pie_created",
        json!({
            "id": created.id,
            "name": created.name,
        }),
    )
}

pub fn log_pie_failed(audit: &mut AuditLog, error: &str, status: Option<u16>) -> Result<()> {
    audit.log(
        "pie_failed",
        json!({
            "error": error,
            "status": status,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log_run_started(&mut log, "data/holdings.csv", "SCHD").unwrap();
            log.log_simple("no_holdings").unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "run_started");
        assert_eq!(lines[0]["pie"], "SCHD");
        assert!(lines[0]["ts"].is_string());
        assert_eq!(lines[1]["event"], "no_holdings");
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        for confirmed in [true, false] {
            let mut log = AuditLog::open(&path).unwrap();
            log_user_confirmed(&mut log, confirmed).unwrap();
        }
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["confirmed"], false);
    }

    #[test]
    fn allocation_event_keeps_shares() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let allocation = Allocation::from_entries(vec![
            ("KO_US_EQ".into(), dec!(0.6)),
            ("PEP_US_EQ".into(), dec!(0.4)),
        ]);
        {
            let mut log = AuditLog::open(&path).unwrap();
            log_allocation(&mut log, &allocation).unwrap();
            log_pie_failed(&mut log, "HTTP 400", Some(400)).unwrap();
        }
        let lines = read_lines(&path);
        assert_eq!(lines[0]["instruments"], 2);
        assert_eq!(lines[0]["shares"]["KO_US_EQ"].as_f64(), Some(0.6));
        assert_eq!(lines[1]["status"], 400);
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }
}
