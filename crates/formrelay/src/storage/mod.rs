//! Storage layer for formrelay.
//!
//! This module owns the JSON record file. Every mutation is a full
//! read-modify-write cycle: load the whole document, merge one record, write
//! the whole document back.

pub mod document;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{Record, RecordStore};

/// Storage engine for submitted records.
///
/// Writes go to a temporary file in the same directory which then replaces
/// the record file, so readers only ever see a fully written document and a
/// failed write leaves the previous document in place.
///
/// There is no locking: callers must funnel all writes through a single
/// sequential writer.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the record file.
    path: PathBuf,
}

impl Storage {
    /// Open the record file at the given path, creating it if needed.
    ///
    /// Creates the parent directories and an empty document if the file does
    /// not exist. An existing file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the empty document cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let storage = Self::at(path);

        if let Some(parent) = storage.parent_dir() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        if storage.path.exists() {
            debug!("Using existing record file at {}", storage.path.display());
        } else {
            storage.save(&RecordStore::new())?;
            info!("Created empty record file at {}", storage.path.display());
        }

        Ok(storage)
    }

    /// Refer to a record file without touching the file system.
    #[must_use]
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full record store.
    ///
    /// A missing file reads as an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the file cannot be read and
    /// [`Error::StorageCorrupt`] if it does not hold a valid document.
    pub fn load(&self) -> Result<RecordStore> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No record file at {}, treating as empty", self.path.display());
                return Ok(RecordStore::new());
            }
            Err(source) => {
                return Err(Error::StorageRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        document::decode(&bytes).map_err(|source| Error::StorageCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Add one record under `timestamp` and persist the whole store.
    ///
    /// A taken timestamp is disambiguated (see
    /// [`RecordStore::insert_unique`]). Returns the key used together with the
    /// updated store.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails; in that case the record
    /// file is unchanged.
    pub fn append(&self, record: Record, timestamp: &str) -> Result<(String, RecordStore)> {
        let mut store = self.load()?;
        let key = store.insert_unique(timestamp, record);
        self.save(&store)?;
        debug!("Stored record {} ({} total)", key, store.len());
        Ok((key, store))
    }

    /// Load the full record store on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::load`], or [`Error::Internal`] if the blocking task
    /// fails.
    pub async fn load_async(&self) -> Result<RecordStore> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.load())
            .await
            .map_err(|e| Error::internal(format!("join load task: {e}")))?
    }

    /// Append one record on the blocking thread pool.
    ///
    /// Awaiting this before the next call keeps appends in call order.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::append`], or [`Error::Internal`] if the blocking
    /// task fails.
    pub async fn append_async(
        &self,
        record: Record,
        timestamp: String,
    ) -> Result<(String, RecordStore)> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.append(record, &timestamp))
            .await
            .map_err(|e| Error::internal(format!("join append task: {e}")))?
    }

    /// Replace the record file with the given store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the document cannot be written.
    pub fn save(&self, store: &RecordStore) -> Result<()> {
        let bytes = document::encode(store)?;
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));

        let write_err = |source| Error::StorageWrite {
            path: self.path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(&bytes).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the record file cannot be loaded.
    pub fn stats(&self) -> Result<StorageStats> {
        let store = self.load()?;
        let file_size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StorageStats {
            total_records: store.len(),
            oldest_record: store.first_key().map(str::to_string),
            newest_record: store.last_key().map(str::to_string),
            file_size_bytes,
        })
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Statistics about the record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored records.
    pub total_records: usize,
    /// Key of the oldest record.
    pub oldest_record: Option<String>,
    /// Key of the newest record.
    pub newest_record: Option<String>,
    /// Size of the record file in bytes.
    pub file_size_bytes: u64,
}
