//! Final artifact writers — CSV and Parquet.
//!
//! Both writers emit the fixed column order and write atomically: the
//! artifact is written to a `.tmp` sibling, synced, then renamed into place.
//! A writer returning `Ok` means the artifact is durable.

use feedmerge_core::domain::{EntityResult, COLUMNS};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("artifact I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("artifact Parquet: {0}")]
    Parquet(String),
}

/// Consumer of the consolidated result set.
pub trait OutputWriter {
    /// Write all rows as one artifact and return its path.
    fn write(&self, rows: &[EntityResult]) -> Result<PathBuf, ExportError>;
}

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// A writer of this format targeting `path`.
    pub fn writer(&self, path: PathBuf) -> Box<dyn OutputWriter> {
        match self {
            OutputFormat::Csv => Box::new(CsvOutput::new(path)),
            OutputFormat::Parquet => Box::new(ParquetOutput::new(path)),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn prepare_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Rename `tmp` over `path`, removing `tmp` if the rename fails.
fn commit(tmp: &Path, path: &Path) -> Result<(), ExportError> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        ExportError::Io(e)
    })
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Writes the result set as a headered CSV.
pub struct CsvOutput {
    path: PathBuf,
}

impl CsvOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputWriter for CsvOutput {
    fn write(&self, rows: &[EntityResult]) -> Result<PathBuf, ExportError> {
        prepare_parent(&self.path)?;
        let tmp = tmp_path(&self.path);

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        wtr.write_record(COLUMNS)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        commit(&tmp, &self.path)?;
        Ok(self.path.clone())
    }
}

// ─── Parquet ────────────────────────────────────────────────────────

/// Writes the result set as a single Parquet file.
pub struct ParquetOutput {
    path: PathBuf,
}

impl ParquetOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Build a DataFrame in the fixed column order. Absent values are nulls.
pub fn rows_to_dataframe(rows: &[EntityResult]) -> Result<DataFrame, ExportError> {
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let ids: Vec<u64> = rows.iter().map(|r| r.id.0).collect();
    let positions: Vec<&str> = rows.iter().map(|r| r.position.as_str()).collect();
    let teams: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
    let scores: Vec<Option<f64>> = rows.iter().map(|r| r.score_projection).collect();
    let lows: Vec<Option<f64>> = rows.iter().map(|r| r.low_score).collect();
    let highs: Vec<Option<f64>> = rows.iter().map(|r| r.high_score).collect();
    let busts: Vec<Option<f64>> = rows.iter().map(|r| r.bust).collect();
    let breakouts: Vec<Option<f64>> = rows.iter().map(|r| r.breakout).collect();

    DataFrame::new(vec![
        Column::new(COLUMNS[0].into(), names),
        Column::new(COLUMNS[1].into(), ids),
        Column::new(COLUMNS[2].into(), positions),
        Column::new(COLUMNS[3].into(), teams),
        Column::new(COLUMNS[4].into(), scores),
        Column::new(COLUMNS[5].into(), lows),
        Column::new(COLUMNS[6].into(), highs),
        Column::new(COLUMNS[7].into(), busts),
        Column::new(COLUMNS[8].into(), breakouts),
    ])
    .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
}

impl OutputWriter for ParquetOutput {
    fn write(&self, rows: &[EntityResult]) -> Result<PathBuf, ExportError> {
        prepare_parent(&self.path)?;
        let tmp = tmp_path(&self.path);

        let mut df = rows_to_dataframe(rows)?;
        let file = fs::File::create(&tmp)?;
        ParquetWriter::new(&file)
            .finish(&mut df)
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                ExportError::Parquet(format!("write parquet: {e}"))
            })?;
        file.sync_all()?;

        commit(&tmp, &self.path)?;
        Ok(self.path.clone())
    }
}
