//! Scratch spill file.
//!
//! An append-only CSV of merged rows, written in flush-sized chunks between
//! batches and read back once at the end. The header is written exactly once,
//! when the file is first created. Numeric cells are read back as text and
//! coerced during consolidation.

use feedmerge_core::domain::{EntityId, EntityResult, COLUMNS};
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("scratch file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("scratch file CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One scratch row as stored, before numeric coercion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScratchRow {
    pub name: String,
    pub id: String,
    pub position: String,
    pub team: String,
    pub score_projection: String,
    pub low_score: String,
    pub high_score: String,
    pub bust: String,
    pub breakout: String,
}

impl ScratchRow {
    /// Coerce into a typed row. Unparsable numeric cells become absent; a row
    /// whose id does not parse cannot be keyed and yields `None`.
    pub fn coerce(self) -> Option<EntityResult> {
        let id = self.id.parse::<EntityId>().ok()?;
        Some(EntityResult {
            name: self.name,
            id,
            position: self.position,
            team: self.team,
            score_projection: coerce_numeric(&self.score_projection),
            low_score: coerce_numeric(&self.low_score),
            high_score: coerce_numeric(&self.high_score),
            bust: coerce_numeric(&self.bust),
            breakout: coerce_numeric(&self.breakout),
        })
    }
}

/// Lenient numeric parse: blanks, text and NaN are absent.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Handle to the scratch CSV on disk.
#[derive(Debug, Clone)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append rows, creating the file with a header if it does not exist yet.
    ///
    /// Returns the number of rows written.
    pub fn append(&self, rows: &[EntityResult]) -> Result<usize, ScratchError> {
        let write_header = !self.exists();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            wtr.write_record(COLUMNS)?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_data()?;

        debug!(path = %self.path.display(), rows = rows.len(), "appended scratch chunk");
        Ok(rows.len())
    }

    /// Read every row back in file order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<ScratchRow>, ScratchError> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for (line, record) in rdr.deserialize::<ScratchRow>().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => warn!(row = line + 1, error = %e, "skipping unreadable scratch row"),
            }
        }
        Ok(rows)
    }

    /// Remove a leftover file from an earlier run. Returns whether one existed.
    pub fn reset(&self) -> Result<bool, ScratchError> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }

    /// Delete the scratch file once its contents are durable elsewhere.
    pub fn remove(&self) -> Result<(), ScratchError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
