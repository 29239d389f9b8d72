// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Working folder change notification.
//!
//! A background thread polls the folder listing and sends a [`WatchEvent`]
//! over an mpsc channel whenever it changes. The thread never touches
//! workspace state; the receiving side decides when to rescan.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

/// The contents of `folder` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub folder: PathBuf,
}

type Snapshot = BTreeMap<OsString, (u64, Option<SystemTime>)>;

fn snapshot(folder: &Path) -> std::io::Result<Snapshot> {
    let mut entries = BTreeMap::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let (len, modified) = match entry.metadata() {
            Ok(meta) => (meta.len(), meta.modified().ok()),
            // Removed between listing and stat; the next poll settles it.
            Err(_) => (0, None),
        };
        entries.insert(entry.file_name(), (len, modified));
    }
    Ok(entries)
}

/// Polls a folder until dropped.
pub struct FolderWatcher {
    folder: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FolderWatcher {
    /// Start watching `folder`, polling every `interval`.
    ///
    /// Fails if `folder` is not a readable directory.
    pub fn spawn(folder: &Path, interval: Duration, sender: Sender<WatchEvent>) -> Result<Self> {
        if !folder.is_dir() {
            return Err(Error::NotADirectory(folder.to_path_buf()));
        }
        let mut last = snapshot(folder)?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_folder = folder.to_path_buf();

        let handle = thread::Builder::new()
            .name("folder-watcher".to_string())
            .spawn(move || {
                log::debug!("Watching {}", thread_folder.display());
                loop {
                    thread::park_timeout(interval);
                    if thread_stop.load(Ordering::Acquire) {
                        break;
                    }
                    let current = snapshot(&thread_folder).unwrap_or_else(|e| {
                        log::warn!("Cannot list {}: {}", thread_folder.display(), e);
                        Snapshot::new()
                    });
                    if current == last {
                        continue;
                    }
                    last = current;
                    let event = WatchEvent {
                        folder: thread_folder.clone(),
                    };
                    if sender.send(event).is_err() {
                        // Receiver gone, nobody left to notify.
                        break;
                    }
                }
                log::debug!("Stopped watching {}", thread_folder.display());
            })?;

        Ok(Self {
            folder: folder.to_path_buf(),
            stop,
            handle: Some(handle),
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("Watcher thread for {} panicked", self.folder.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_spawn_rejects_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, _receiver) = channel();
        let result = FolderWatcher::spawn(&dir.path().join("nope"), Duration::from_millis(10), sender);
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_reports_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, receiver) = channel();
        let watcher = FolderWatcher::spawn(dir.path(), Duration::from_millis(10), sender).unwrap();
        assert_eq!(watcher.folder(), dir.path());

        fs::write(dir.path().join("new.png"), b"x").unwrap();
        let event = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.folder, dir.path());
    }

    #[test]
    fn test_quiet_folder_sends_nothing_and_drop_stops() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, receiver) = channel();
        let watcher = FolderWatcher::spawn(dir.path(), Duration::from_millis(10), sender).unwrap();

        assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());
        drop(watcher);
        // Sender dropped with the thread.
        assert!(receiver.recv().is_err());
    }
}
