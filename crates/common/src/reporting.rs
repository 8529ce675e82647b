//! Report attachments
//!
//! Diagnostics are handed to a [`ReportSink`] as named attachments. Sinks are
//! fire-and-forget: a sink that cannot store an attachment logs a warning and
//! carries on, so reporting never fails the test that produced it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Kind of payload attached to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Text,
    Json,
    Image,
}

impl AttachmentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "txt",
            AttachmentKind::Json => "json",
            AttachmentKind::Image => "png",
        }
    }
}

/// Destination for diagnostic attachments
pub trait ReportSink: Send + Sync {
    fn attach(&self, name: &str, payload: &[u8], kind: AttachmentKind);

    fn attach_text(&self, name: &str, text: &str) {
        self.attach(name, text.as_bytes(), AttachmentKind::Text);
    }

    fn attach_json(&self, name: &str, value: &serde_json::Value) {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.attach(name, &bytes, AttachmentKind::Json),
            Err(e) => warn!("Failed to serialise attachment '{}': {}", name, e),
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ReportSink for NullReporter {
    fn attach(&self, _name: &str, _payload: &[u8], _kind: AttachmentKind) {}
}

/// A stored attachment
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub payload: Vec<u8>,
}

impl Attachment {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.payload).ok()
    }
}

/// Keeps attachments in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    attachments: Mutex<Vec<Attachment>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    pub fn find(&self, name: &str) -> Option<Attachment> {
        self.attachments.lock().iter().find(|a| a.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.attachments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.lock().is_empty()
    }
}

impl ReportSink for MemoryReporter {
    fn attach(&self, name: &str, payload: &[u8], kind: AttachmentKind) {
        self.attachments.lock().push(Attachment {
            name: name.to_string(),
            kind,
            payload: payload.to_vec(),
        });
    }
}

/// Writes each attachment to its own file in a directory
#[derive(Debug)]
pub struct DirectoryReporter {
    dir: PathBuf,
    prefix: String,
    seq: AtomicUsize,
}

impl DirectoryReporter {
    /// `prefix` is usually the correlation id of the test
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            seq: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str, kind: AttachmentKind) -> PathBuf {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}_{:03}_{}.{}",
            self.prefix,
            seq,
            slug(name),
            kind.extension()
        ))
    }
}

impl ReportSink for DirectoryReporter {
    fn attach(&self, name: &str, payload: &[u8], kind: AttachmentKind) {
        let path = self.path_for(name, kind);
        let written = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(&path, payload));
        match written {
            Ok(()) => debug!("Attachment '{}' written to {}", name, path.display()),
            Err(e) => warn!("Failed to write attachment '{}' to {}: {}", name, path.display(), e),
        }
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("attachment");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_reporter_keeps_attachments() {
        let reporter = MemoryReporter::new();
        reporter.attach_text("Assertion Failure Details", "Expected: 1\nActual: 2");
        reporter.attach_json("Distance", &json!({"kilometers": 490.0}));

        assert_eq!(reporter.len(), 2);
        let text = reporter.find("Assertion Failure Details").unwrap();
        assert_eq!(text.kind, AttachmentKind::Text);
        assert!(text.text().contains("Actual: 2"));

        let distance = reporter.find("Distance").unwrap();
        assert_eq!(distance.kind, AttachmentKind::Json);
        assert_eq!(distance.json().unwrap()["kilometers"], json!(490.0));
    }

    #[test]
    fn test_directory_reporter_writes_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("attachments");
        let reporter = DirectoryReporter::new(&dir, "abcd1234");

        reporter.attach_json("Airports API Response", &json!({"data": []}));
        reporter.attach_text("Airports API Response", "again");

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "abcd1234_000_airports-api-response.json".to_string(),
                "abcd1234_001_airports-api-response.txt".to_string(),
            ]
        );
    }

    #[test]
    fn test_directory_reporter_swallows_write_errors() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let reporter = DirectoryReporter::new(blocker.join("nested"), "x");
        reporter.attach_text("anything", "payload");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Missing Airports: Debug Info!"), "missing-airports-debug-info");
        assert_eq!(slug("***"), "attachment");
    }
}
