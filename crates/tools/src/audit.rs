//! Append-only JSONL audit log for critical incidents.
//!
//! Each record is written as one line with a single `write_all`, under an
//! in-process mutex and an `fs2` exclusive file lock, then `sync_data`'d
//! before `append` returns. Concurrent writers in this process or in
//! another process sharing the file never interleave partial lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::sync::Mutex;
use tt_domain::error::{Error, Result};
use tt_domain::incident::IncidentRecord;
use tt_domain::trace::TraceEvent;

pub struct IncidentLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl IncidentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one record. Returns only after the bytes are on disk.
    pub async fn append(&self, record: &IncidentRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || append_line(&path, line.as_bytes()))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        TraceEvent::IncidentRecorded {
            customer_id: record.customer_id.clone(),
            risk_level: record.risk_level.clone(),
            kb_found: record.kb_found,
        }
        .emit();

        Ok(())
    }

    /// Read every record back. A missing file is an empty log.
    pub async fn read_all(&self) -> Result<Vec<IncidentRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(Error::Io(e)),
            };
            raw.lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| serde_json::from_str(l).map_err(Error::Json))
                .collect()
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }
}

fn append_line(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let written = file
        .write_all(bytes)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_data());

    let unlocked = FileExt::unlock(&file);
    written?;
    unlocked?;
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
