//! Persistence for position snapshots and the trade journal
//!
//! Two collaborators:
//! - `PositionStore`: a JSON file holding the latest `PositionSnapshot`,
//!   loaded before first use and rewritten after every mutating operation.
//!   Writes go through a temp file + rename so a crash mid-write never
//!   leaves a truncated snapshot.
//! - `TradeJournal`: append-only daily CSV of trade events for later
//!   analysis. Headers are written only when the file is new or empty.

use anyhow::{Context, Result};
use chrono::Utc;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock as AsyncRwLock;
use tracing::info;

use crate::types::PositionSnapshot;

/// On-disk wrapper around the snapshot, with the save timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPosition {
    /// Timestamp of last save (milliseconds)
    pub saved_at: i64,
    /// The ledger state itself
    pub position: PositionSnapshot,
}

/// JSON snapshot store for a single position.
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot, if any exists yet.
    pub fn load(&self) -> Result<Option<PositionSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read position file {}", self.path.display()))?;
        let stored: StoredPosition = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse position file {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            saved_at = stored.saved_at,
            "Loaded persisted position"
        );
        Ok(Some(stored.position))
    }

    /// Persist the snapshot atomically (temp file + rename).
    pub fn save(&self, snapshot: &PositionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create position dir {}", parent.display())
                })?;
            }
        }

        let stored = StoredPosition {
            saved_at: Utc::now().timestamp_millis(),
            position: snapshot.clone(),
        };
        let json =
            serde_json::to_string_pretty(&stored).context("Failed to serialize position")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

/// One journal row per ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEventRecord {
    /// Timestamp in milliseconds
    pub timestamp: i64,
    /// Unique event ID
    pub event_id: String,
    /// Action that produced this event (ENTRY, HEDGE, STOP_LOSS, RESET)
    pub action: String,
    /// Market side traded (YES/NO, empty for RESET)
    pub side: String,
    /// Shares traded
    pub shares: f64,
    /// Price per share
    pub price: f64,
    /// Signed cash flow: negative for buys, positive for sale proceeds
    pub cash_flow: f64,
    /// Realized PnL attached to this event, when one was locked/booked
    pub realized_pnl: Option<f64>,
}

/// Append-only CSV journal of trade events, one file per day.
pub struct TradeJournal {
    writer: AsyncRwLock<csv::Writer<std::fs::File>>,
}

impl TradeJournal {
    /// Open (or continue) today's journal file under `data_dir/journal/`.
    pub fn new(data_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(data_dir).join("journal");
        fs::create_dir_all(&dir).context("Failed to create journal directory")?;

        let today = Utc::now().format("%Y-%m-%d");
        let writer = Self::create_writer(&dir, &format!("trades_{}.csv", today))?;

        Ok(Self {
            writer: AsyncRwLock::new(writer),
        })
    }

    fn create_writer(dir: &Path, filename: &str) -> Result<csv::Writer<std::fs::File>> {
        let path = dir.join(filename);
        let file_has_data =
            path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open journal file")?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(writer)
    }

    /// Append one event row and flush.
    pub async fn append(&self, record: TradeEventRecord) -> Result<()> {
        let mut writer = self.writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write trade event")?;
        writer.flush().context("Failed to flush trade journal")?;
        Ok(())
    }
}
