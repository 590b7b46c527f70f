//! Event file discovery and decoding.
//!
//! An input path is either a single JSON file or a directory searched
//! recursively for `*.json` files. Each file holds one event object or an
//! array of events.

use crate::models::EventBatch;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Event files found under an input path.
#[derive(Debug, Clone)]
pub struct EventScanner {
    root: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFile {
    Many(Vec<EventBatch>),
    One(EventBatch),
}

impl EventScanner {
    /// Create a new scanner for a file or directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List event files in processing order.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to scan {}", self.root.display()))?;
            let path = entry.path();
            if entry.file_type().is_file() && is_event_file(path) {
                files.push(path.to_path_buf());
            }
        }

        debug!("Found {} event files under {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Load every event from every file, in order.
    pub fn load_all(&self) -> Result<Vec<EventBatch>> {
        let mut events = Vec::new();
        for path in self.scan()? {
            events.extend(load_events(&path)?);
        }
        Ok(events)
    }
}

/// Decode the events in one file.
pub fn load_events(path: &Path) -> Result<Vec<EventBatch>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;
    let parsed: EventFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event file: {}", path.display()))?;

    let events = match parsed {
        EventFile::Many(events) => events,
        EventFile::One(event) => vec![event],
    };
    debug!("{}: {} events", path.display(), events.len());
    Ok(events)
}

fn is_event_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    !hidden && path.extension().and_then(|e| e.to_str()) == Some("json")
}
