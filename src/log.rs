//! Append-only CSV log of evaluation results.
//!
//! Writers take an exclusive advisory lock on the file before touching it.
//! Under the lock the header is written only if the file is still empty, so it
//! appears exactly once no matter how many runs share the log. Each row is
//! serialized in memory and written with a single append.

use crate::document::truncate_chars;
use crate::error::{CheckerError, Result};
use crate::evaluator::{EvaluationResult, NeedsMet, PageQuality};
use chrono::{DateTime, Local};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Characters of the raw input kept in the `source` column.
pub const SOURCE_CHARS: usize = 100;

pub const LOG_COLUMNS: [&str; 11] = [
    "timestamp",
    "source",
    "pq",
    "nm",
    "effort",
    "originality",
    "duplication_rate",
    "skill",
    "accuracy",
    "eeat_summary",
    "improvement_advice",
];

/// One log row. Field order matches [`LOG_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub source: String,
    pub pq: PageQuality,
    pub nm: NeedsMet,
    pub effort: u8,
    pub originality: u8,
    pub duplication_rate: u8,
    pub skill: u8,
    pub accuracy: u8,
    pub eeat_summary: String,
    pub improvement_advice: String,
}

impl LogRecord {
    pub fn new(source: &str, result: &EvaluationResult, at: DateTime<Local>) -> Self {
        Self {
            timestamp: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            source: truncate_chars(source, SOURCE_CHARS).to_string(),
            pq: result.pq,
            nm: result.nm,
            effort: result.effort,
            originality: result.originality,
            duplication_rate: result.duplication_rate,
            skill: result.skill,
            accuracy: result.accuracy,
            eeat_summary: result.eeat_summary.clone(),
            improvement_advice: result.improvement_advice.clone(),
        }
    }

    /// Stamp a result with the current local time.
    pub fn now(source: &str, result: &EvaluationResult) -> Self {
        Self::new(source, result, Local::now())
    }
}

/// CSV-backed result log.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header row if the log is missing or empty.
    /// Returns whether this call wrote it.
    pub fn ensure_header(&self) -> Result<bool> {
        self.write_locked(None)
    }

    /// Append one record, writing the header first if the log is new.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(record)?;
        let row = writer
            .into_inner()
            .map_err(|e| CheckerError::Log(e.to_string()))?;

        self.write_locked(Some(&row))?;

        info!(path = %self.path.display(), pq = %record.pq, "result logged");
        Ok(())
    }

    fn open_locked(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| CheckerError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CheckerError::io(&self.path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| CheckerError::io(&self.path, e))?;
        Ok(file)
    }

    /// Header (if the file is empty) and `row` go out in one write while the
    /// lock is held. The lock is released when the handle drops.
    fn write_locked(&self, row: Option<&[u8]>) -> Result<bool> {
        let mut file = self.open_locked()?;
        let is_empty = file
            .metadata()
            .map_err(|e| CheckerError::io(&self.path, e))?
            .len()
            == 0;

        let mut bytes = Vec::new();
        if is_empty {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(LOG_COLUMNS)?;
            bytes = writer
                .into_inner()
                .map_err(|e| CheckerError::Log(e.to_string()))?;
        }
        if let Some(row) = row {
            bytes.extend_from_slice(row);
        }

        if !bytes.is_empty() {
            file.write_all(&bytes)
                .map_err(|e| CheckerError::io(&self.path, e))?;
        }
        Ok(is_empty)
    }

    /// Read every logged record. A missing log reads as empty.
    pub fn read_all(&self) -> Result<Vec<LogRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        reader
            .deserialize()
            .map(|row| row.map_err(CheckerError::from))
            .collect()
    }
}
