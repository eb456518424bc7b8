// Usage ledger - period-keyed delivery counters
//
// Every implementation serializes its own read-modify-write so concurrent
// requests never lose an increment.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format period key: {0}")]
    Period(#[from] time::error::Format),
}

#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Add one to `period` and return the new count
    async fn increment(&self, period: &str) -> Result<u64, LedgerError>;

    async fn read(&self, period: &str) -> Result<u64, LedgerError>;
}

/// "YYYY-MM" key for a moment in time
pub fn period_key(at: OffsetDateTime) -> Result<String, LedgerError> {
    Ok(at.format(format_description!("[year]-[month]"))?)
}

/// Key for the current UTC month
pub fn current_period() -> Result<String, LedgerError> {
    period_key(OffsetDateTime::now_utc())
}

/// In-process ledger, used in tests and when persistence is not wanted
#[derive(Debug, Default)]
pub struct MemoryLedger {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLedger for MemoryLedger {
    async fn increment(&self, period: &str) -> Result<u64, LedgerError> {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(period.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn read(&self, period: &str) -> Result<u64, LedgerError> {
        Ok(self.counts.lock().await.get(period).copied().unwrap_or(0))
    }
}

/// Ledger persisted as one JSON object `{ "YYYY-MM": count, ... }`.
///
/// Writes go to a sibling temp file that is renamed over the ledger while
/// the lock is held, so the file is always either the old or the new map.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    counts: Mutex<BTreeMap<String, u64>>,
}

impl JsonFileLedger {
    /// Open (or start) the ledger at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let counts = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LedgerError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        debug!(path = %path.display(), periods = counts.len(), "ledger opened");
        Ok(Self {
            path,
            counts: Mutex::new(counts),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, counts: &BTreeMap<String, u64>) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(counts).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl UsageLedger for JsonFileLedger {
    async fn increment(&self, period: &str) -> Result<u64, LedgerError> {
        let mut counts = self.counts.lock().await;
        let previous = counts.get(period).copied().unwrap_or(0);
        counts.insert(period.to_string(), previous + 1);

        if let Err(e) = self.persist(&counts).await {
            // keep memory and disk in agreement
            counts.insert(period.to_string(), previous);
            return Err(e);
        }
        Ok(previous + 1)
    }

    async fn read(&self, period: &str) -> Result<u64, LedgerError> {
        Ok(self.counts.lock().await.get(period).copied().unwrap_or(0))
    }
}
