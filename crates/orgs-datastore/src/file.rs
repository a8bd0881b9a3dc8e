//! File backed datastore
//!
//! Each subject lives in its own `<segments>.json` file below a root
//! directory; intermediate segments are directories. Writes go to a
//! temporary sibling first and are renamed into place, so readers never see
//! a half written subject. Temporary names carry the process id and a per
//! process counter; concurrent writers never share one.

use crate::error::{DatastoreError, DatastoreResult};
use crate::path::DatastorePath;
use crate::store::Datastore;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Extension of subject files
const SUBJECT_EXTENSION: &str = "json";

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_sibling(file: &Path) -> PathBuf {
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{seq}.tmp", std::process::id()));
    file.with_file_name(name)
}

/// Datastore rooted at a directory
#[derive(Debug, Clone)]
pub struct FileDatastore {
    root: PathBuf,
}

impl FileDatastore {
    /// Create store rooted at `root` (created lazily on first write)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_path(&self, path: &DatastorePath) -> PathBuf {
        let mut dir = self.root.clone();
        dir.extend(path.segments());
        dir
    }

    fn subject_file(&self, path: &DatastorePath) -> DatastoreResult<PathBuf> {
        let base = path
            .base()
            .ok_or_else(|| DatastoreError::NotFound(path.clone()))?;
        let mut file = path
            .parent()
            .map_or_else(|| self.root.clone(), |parent| self.dir_path(&parent));
        file.push(format!("{base}.{SUBJECT_EXTENSION}"));
        Ok(file)
    }
}

impl Datastore for FileDatastore {
    fn get_subject(&self, path: &DatastorePath) -> DatastoreResult<Vec<u8>> {
        let file = self.subject_file(path)?;
        fs::read(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DatastoreError::NotFound(path.clone()),
            _ => DatastoreError::io_error(file, e),
        })
    }

    fn set_subject(&self, path: &DatastorePath, data: &[u8]) -> DatastoreResult<()> {
        let file = self.subject_file(path)?;
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(|e| DatastoreError::io_error(dir, e))?;
        }

        let tmp = temp_sibling(&file);
        fs::write(&tmp, data).map_err(|e| DatastoreError::io_error(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &file) {
            let _ = fs::remove_file(&tmp);
            return Err(DatastoreError::io_error(&file, e));
        }

        tracing::trace!(subject = %path, file = %file.display(), "stored subject");
        Ok(())
    }

    fn list_children(&self, path: &DatastorePath) -> DatastoreResult<Vec<DatastorePath>> {
        let dir = self.dir_path(path);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DatastoreError::io_error(dir, e)),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| DatastoreError::io_error(&dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::debug!(dir = %dir.display(), "skipping non-utf8 entry");
                continue;
            };

            let is_dir = entry
                .file_type()
                .map_err(|e| DatastoreError::io_error(entry.path(), e))?
                .is_dir();

            if is_dir {
                names.insert(name.to_string());
            } else if let Some(stem) = name.strip_suffix(&format!(".{SUBJECT_EXTENSION}")) {
                names.insert(stem.to_string());
            }
        }

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            match path.child(name) {
                Ok(child) => children.push(child),
                Err(e) => tracing::debug!(dir = %dir.display(), error = %e, "skipping entry"),
            }
        }
        Ok(children)
    }
}
