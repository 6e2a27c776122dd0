//! Persisted forecast table.
//!
//! A comma-delimited text file, no header, one row per forecast hour:
//! `YYYY/MM/DD HH:MM,<temp C>,<wind m/s>,<infiltration m3/s>`. The
//! forecast-refresh job is the sole writer and replaces the whole file on
//! every run; the current-estimate job only reads it on the fallback path.
//! Rebuild goes through a temp file in the same directory followed by a
//! rename, so a concurrent reader sees either the fully-old or the fully-new
//! table, never a partial one.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

use crate::domain::{InfiltrationEstimate, WeatherSample, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum TableError {
    /// The query time precedes every row in the table, or the table is empty.
    #[error("no forecast row at or before {0}")]
    NoApplicableRow(NaiveDateTime),

    #[error("forecast table {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("forecast table I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the forecast table file.
pub struct ForecastTable {
    path: PathBuf,
}

impl ForecastTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the whole persisted table with `rows`.
    pub async fn rebuild(&self, rows: &[InfiltrationEstimate]) -> Result<(), TableError> {
        let mut body = String::new();
        for row in rows {
            body.push_str(&render_row(row));
            body.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body.as_bytes())
            .await
            .map_err(|source| TableError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| TableError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(rows = rows.len(), path = %self.path.display(), "forecast table rebuilt");
        Ok(())
    }

    /// Load and parse every row, in file order.
    pub async fn load(&self) -> Result<Vec<InfiltrationEstimate>, TableError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TableError::Io {
                path: self.path.clone(),
                source,
            })?;

        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let row = parse_row(line).map_err(|reason| TableError::Corrupt {
                path: self.path.clone(),
                line: i + 1,
                reason,
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// The row with the greatest timestamp that is at or before `ts`.
    pub async fn lookup_at_or_before(
        &self,
        ts: NaiveDateTime,
    ) -> Result<InfiltrationEstimate, TableError> {
        let rows = self.load().await?;
        lookup_at_or_before(&rows, ts)
    }
}

/// Pure lookup over already-loaded rows: select the row immediately
/// preceding the first row whose timestamp strictly exceeds `ts`. With
/// duplicate timestamps (a violated invariant, defended against anyway) this
/// picks the last duplicate in table order.
pub fn lookup_at_or_before(
    rows: &[InfiltrationEstimate],
    ts: NaiveDateTime,
) -> Result<InfiltrationEstimate, TableError> {
    let first_later = rows
        .iter()
        .position(|row| row.sample.timestamp > ts)
        .unwrap_or(rows.len());
    if first_later == 0 {
        return Err(TableError::NoApplicableRow(ts));
    }
    Ok(rows[first_later - 1])
}

fn render_row(row: &InfiltrationEstimate) -> String {
    format!(
        "{},{},{},{}",
        row.sample.timestamp.format(TIMESTAMP_FORMAT),
        row.sample.temperature_c,
        row.sample.wind_speed_ms,
        row.infiltration_m3_s,
    )
}

fn parse_row(line: &str) -> Result<InfiltrationEstimate, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 4 {
        return Err(format!("expected 4 fields, found {}", fields.len()));
    }
    let timestamp = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT)
        .map_err(|e| format!("bad timestamp {:?}: {e}", fields[0]))?;
    let temperature_c = parse_f64(fields[1], "temperature")?;
    let wind_speed_ms = parse_f64(fields[2], "wind speed")?;
    let infiltration_m3_s = parse_f64(fields[3], "infiltration")?;
    Ok(InfiltrationEstimate {
        sample: WeatherSample {
            timestamp,
            temperature_c,
            wind_speed_ms,
        },
        infiltration_m3_s,
    })
}

fn parse_f64(field: &str, name: &str) -> Result<f64, String> {
    field
        .trim()
        .parse()
        .map_err(|e| format!("bad {name} {field:?}: {e}"))
}
