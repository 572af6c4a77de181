//! Content store - enumerates and reads post files from the posts directory

use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::BlogError;

/// Read-only view over a flat directory of content files
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
    extension: String,
}

impl ContentStore {
    /// Create a store over `dir`, treating files ending in `.{extension}` as content
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List content ids (file stems) in directory-listing order.
    ///
    /// The order is whatever the platform returns and is not sorted.
    pub fn list_ids(&self) -> Result<Vec<String>, BlogError> {
        if !self.dir.is_dir() {
            return Err(BlogError::Io {
                path: self.dir.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "content directory does not exist",
                ),
            });
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| BlogError::Io {
                path: self.dir.clone(),
                source: e.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            match self.id_for(path) {
                Some(id) => ids.push(id),
                None => tracing::debug!("Skipping non-content file {:?}", path),
            }
        }

        Ok(ids)
    }

    /// Read the full raw text of a content item
    pub fn read_raw(&self, id: &str) -> Result<String, BlogError> {
        if !is_plain_id(id) {
            return Err(BlogError::NotFound(id.to_string()));
        }

        let path = self.path_for(id);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlogError::NotFound(id.to_string()))
            }
            Err(source) => Err(BlogError::Io { path, source }),
        }
    }

    /// Path of the file backing `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, self.extension))
    }

    fn id_for(&self, path: &Path) -> Option<String> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if ext != self.extension {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }
}

/// An id names a single file in the store directory
fn is_plain_id(id: &str) -> bool {
    if id.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
