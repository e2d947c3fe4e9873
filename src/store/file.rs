//! File-backed store environment
//!
//! One file per store id under a root directory. The file layout is a
//! CRC32 header line followed by the JSON entry map:
//!
//! ```text
//! <8-hex-digit crc32 of body>\n
//! {"key": value, ...}
//! ```
//!
//! The checksum is verified on every open; a mismatch is corruption and the
//! open fails. Every mutation rewrites the file and fsyncs before
//! returning, so an acknowledged write is durable.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::env::{KvStore, StoreEnv};
use super::errors::{StoreError, StoreResult};

/// A root directory holding one file per store id
#[derive(Debug, Clone)]
pub struct FileEnv {
    root: PathBuf,
}

impl FileEnv {
    /// Creates the environment rooted at `root`, creating the directory
    /// if needed.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::open_failed(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    fn store_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.kv"))
    }
}

impl StoreEnv for FileEnv {
    type Store = FileStore;

    fn open(&self, id: &str) -> StoreResult<FileStore> {
        FileStore::open(id, self.store_path(id))
    }

    fn destroy(&self, id: &str) -> StoreResult<()> {
        match fs::remove_file(self.store_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::write_failed(id, e)),
        }
    }
}

/// One open file-backed store.
///
/// Entries are held in memory for the lifetime of the handle; the file on
/// disk is the canonical state and is rewritten on every mutation.
pub struct FileStore {
    id: String,
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl FileStore {
    fn open(id: &str, path: PathBuf) -> StoreResult<Self> {
        let mut store = Self {
            id: id.to_string(),
            path,
            entries: BTreeMap::new(),
        };

        if store.path.exists() {
            store.entries = store.load()?;
        } else {
            // Create the backing file eagerly so the store survives an
            // empty lifetime across process restarts.
            store.flush()?;
        }

        Ok(store)
    }

    /// Reads the backing file, verifies its checksum, and parses the body.
    fn load(&self) -> StoreResult<BTreeMap<String, Value>> {
        let raw = fs::read(&self.path).map_err(|e| StoreError::open_failed(&self.id, e))?;

        let newline = raw
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| StoreError::corrupted(&self.id, "missing checksum header"))?;
        let (header, body) = (&raw[..newline], &raw[newline + 1..]);

        let expected = std::str::from_utf8(header)
            .ok()
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .ok_or_else(|| StoreError::corrupted(&self.id, "unreadable checksum header"))?;
        let actual = crc32fast::hash(body);
        if actual != expected {
            return Err(StoreError::corrupted(
                &self.id,
                format!("checksum mismatch: expected {expected:08x}, computed {actual:08x}"),
            ));
        }

        serde_json::from_slice(body)
            .map_err(|e| StoreError::corrupted(&self.id, format!("unparseable body: {e}")))
    }

    /// Rewrites the backing file from the in-memory entries and fsyncs.
    fn flush(&mut self) -> StoreResult<()> {
        let body = serde_json::to_vec(&self.entries)
            .map_err(|e| StoreError::corrupted(&self.id, format!("unserializable entries: {e}")))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| StoreError::write_failed(&self.id, e))?;

        file.write_all(format!("{:08x}\n", crc32fast::hash(&body)).as_bytes())
            .and_then(|_| file.write_all(&body))
            .map_err(|e| StoreError::write_failed(&self.id, e))?;

        // fsync - mandatory for durability
        file.sync_all()
            .map_err(|e| StoreError::write_failed(&self.id, e))
    }

    /// Returns the path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn scan_all(&self) -> StoreResult<Vec<(String, Value)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// File helper for corruption tests
#[cfg(test)]
fn overwrite_file(path: &Path, contents: &[u8]) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(contents).unwrap();
}
