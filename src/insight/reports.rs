// src/insight/reports.rs
//! Write-once report artifacts, one text file per generated identifier.
//!
//! Identifiers are random uuids, so concurrent writers never contend for a
//! path. Writes go through a tmp file + rename; a reader either sees the
//! whole report or none of it. Artifacts are never updated or expired.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir); // best-effort
        Self { dir }
    }

    /// Persist `text` under a freshly generated identifier and return it.
    pub fn create(&self, text: &str) -> io::Result<String> {
        let report_id = Uuid::new_v4().to_string();
        let path = self.path_for(&report_id);
        let tmp = path.with_extension("txt.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(text.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(report_id)
    }

    /// Load a report by identifier. `None` covers both "never existed" and
    /// a malformed identifier — a stale handle is a normal outcome.
    pub fn load(&self, report_id: &str) -> Option<String> {
        if !is_valid_id(report_id) {
            return None;
        }
        fs::read_to_string(self.path_for(report_id)).ok()
    }

    fn path_for(&self, report_id: &str) -> PathBuf {
        self.dir.join(format!("{report_id}.txt"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Identifiers are uuid strings; anything else (notably path separators or
/// `..`) must never reach the filesystem.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let id = store.create("보고서 본문").unwrap();
        assert_eq!(store.load(&id).as_deref(), Some("보고서 본문"));
    }

    #[test]
    fn unknown_id_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        assert_eq!(store.load("00000000-0000-0000-0000-000000000000"), None);
    }

    #[test]
    fn path_like_ids_never_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path().join("reports"));
        // Plant a file outside the reports dir; a crafted id must not reach it.
        fs::write(tmp.path().join("secret.txt"), "nope").unwrap();
        assert_eq!(store.load("../secret"), None);
        assert_eq!(store.load("/etc/hostname"), None);
        assert_eq!(store.load(""), None);
    }

    #[test]
    fn ids_are_unique_per_create() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.load(&a).as_deref(), Some("a"));
        assert_eq!(store.load(&b).as_deref(), Some("b"));
    }
}
