//! Watermark persistence.
//!
//! The watermark is the highest status id already notified. It is stored as
//! a decimal integer in a single text file:
//! ```text
//! last_seen_id.txt
//! └── "1800000000000000001"
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;

/// File-backed store for the last notified id.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Create a store backed by the file at `path`.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored watermark.
    ///
    /// A missing, empty, unreadable or non-numeric file all read as `None`.
    pub fn read(&self) -> Option<u64> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Failed to read watermark {}: {}", self.path.display(), e);
                return None;
            }
        };

        match content.trim().parse() {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(
                    "Ignoring unparsable watermark {:?} in {}: {}",
                    content,
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Replace the stored watermark with `id`.
    ///
    /// The value is written to a temporary sibling file, synced, and renamed
    /// over the target, so readers see either the old or the new value.
    pub fn write(&self, id: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(id.to_string().as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Watermark set to {} in {}", id, self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "watermark".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
