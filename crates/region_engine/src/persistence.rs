//! Region file on disk.
//!
//! Saves never truncate the live file: the document goes to a temporary file
//! next to it, which is synced and then renamed over the target.

use crate::codec;
use crate::error::PersistenceError;
use crate::region::Region;
use crate::store::RegionStore;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Handle to the region document at a fixed path.
#[derive(Debug)]
pub struct RegionFile {
    path: PathBuf,
    /// Serializes concurrent saves.
    save_lock: Mutex<()>,
}

impl RegionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the file. A missing file is an empty region list.
    pub fn load(&self) -> Result<Vec<Region>, PersistenceError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "📄 No region file at {}, starting with no regions",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let regions = codec::decode_regions(&bytes)?;
        info!(
            "📂 Loaded {} regions from {}",
            regions.len(),
            self.path.display()
        );
        Ok(regions)
    }

    /// Writes a consistent snapshot of `store` and atomically replaces the
    /// file. On error the previous file is left as it was.
    pub fn save(&self, store: &RegionStore) -> Result<(), PersistenceError> {
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (bytes, count) = codec::serialize_counted(store)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        info!("💾 Saved {} regions to {}", count, self.path.display());
        Ok(())
    }
}
