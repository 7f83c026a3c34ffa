// ErrWarden - app/ignore_list.rs
//
// File-backed ignore list. Operators acknowledge a recurring error by adding
// its fingerprint (as printed in the record store) to the file; the change
// takes effect on the next cycle because the file is re-read every time.

use crate::core::model::SuppressionSet;
use crate::core::suppression::{self, IgnoreList};
use crate::util::error::IgnoreListError;
use std::io;
use std::path::{Path, PathBuf};

/// Ignore list stored as a text file of hex fingerprints.
///
/// A missing file means nothing is acknowledged yet.
#[derive(Debug, Clone)]
pub struct FileIgnoreList {
    path: PathBuf,
}

impl FileIgnoreList {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IgnoreList for FileIgnoreList {
    fn load(&self) -> Result<SuppressionSet, IgnoreListError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::trace!(path = %self.path.display(), "No ignore list; suppressing nothing");
                return Ok(SuppressionSet::new());
            }
            Err(e) => {
                return Err(IgnoreListError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let set = suppression::parse_ignore_list(&content, &self.path)?;
        tracing::trace!(
            path = %self.path.display(),
            fingerprints = set.len(),
            "Ignore list loaded"
        );
        Ok(set)
    }
}
