//! Append-only JSON-lines journal of invocation records.
//!
//! Records are handed to a background task over a bounded channel so the
//! request path never waits on file I/O. When the channel is full the record
//! is rejected and the caller drops it.

use super::types::InvocationRecord;
use super::{InvocationRecorder, RecorderError};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const DEFAULT_JOURNAL_BUFFER: usize = 1024;

pub struct JournalRecorder {
    sender: mpsc::Sender<InvocationRecord>,
    path: PathBuf,
}

impl JournalRecorder {
    /// Open (or create) the journal file and start the writer task.
    ///
    /// The task ends once every `JournalRecorder` handle is dropped and the
    /// queue has been flushed.
    pub async fn spawn(
        path: impl AsRef<Path>,
        buffer: usize,
    ) -> std::io::Result<(Self, JoinHandle<()>)> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (sender, mut receiver) = mpsc::channel::<InvocationRecord>(buffer.max(1));
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                let mut line = match serde_json::to_vec(&record) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to serialize invocation {}: {}", record.id, e);
                        continue;
                    }
                };
                line.push(b'\n');
                if let Err(e) = file.write_all(&line).await {
                    warn!("Failed to append to journal {:?}: {}", task_path, e);
                }
            }
            if let Err(e) = file.flush().await {
                warn!("Failed to flush journal {:?}: {}", task_path, e);
            }
            info!("Invocation journal {:?} closed", task_path);
        });

        info!("Writing invocation journal to {:?}", path);
        Ok((Self { sender, path }, handle))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InvocationRecorder for JournalRecorder {
    fn record(&self, record: InvocationRecord) -> Result<(), RecorderError> {
        self.sender.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => RecorderError::Full,
            TrySendError::Closed(_) => RecorderError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_journal_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("invocations.jsonl");

        let (journal, handle) = JournalRecorder::spawn(&path, 8).await.unwrap();
        journal.record(InvocationRecord::new("GET", "/a")).unwrap();
        journal.record(InvocationRecord::new("POST", "/b")).unwrap();
        drop(journal);
        handle.await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<InvocationRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "/a");
        assert_eq!(records[1].method, "POST");
    }
}
