//! Filesystem name index for the relink fallback path.
//!
//! One recursive walk over the pack's root folders, rebuilt fresh per run.
//! Keys are normalized filenames; when two files normalize to the same key
//! the later one wins (walk order is platform dependent) and the collision
//! is recorded so the run can surface it as a warning.

use crate::similarity::normalize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Normalized filename -> absolute path lookup.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: BTreeMap<String, PathBuf>,
    collisions: Vec<KeyCollision>,
}

/// Two files whose names normalized to the same key.
#[derive(Debug, Clone)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: PathBuf,
    pub kept: PathBuf,
}

impl NameIndex {
    pub fn get(&self, normalized_name: &str) -> Option<&Path> {
        self.entries.get(normalized_name).map(PathBuf::as_path)
    }

    /// Keys in sorted order, so fuzzy-fallback candidate order is stable.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    fn insert(&mut self, key: String, path: PathBuf) {
        if key.is_empty() {
            return;
        }
        if let Some(replaced) = self.entries.insert(key.clone(), path.clone()) {
            if replaced != path {
                self.collisions.push(KeyCollision {
                    key,
                    replaced,
                    kept: path,
                });
            }
        }
    }
}

/// Walk every existing root folder and index each regular file by its
/// normalized name. Missing roots and unreadable entries are skipped with a
/// debug trace; both are routine for environment-specific root lists.
pub fn build_index<P: AsRef<Path>>(root_folders: &[P]) -> NameIndex {
    let mut index = NameIndex::default();
    for root in root_folders {
        let root = root.as_ref();
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "skipping missing root folder");
            continue;
        }
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        for entry in WalkDir::new(&root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(root = %root.display(), %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let key = normalize(&entry.file_name().to_string_lossy());
            index.insert(key, entry.into_path());
        }
    }
    index
}
