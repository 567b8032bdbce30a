//! Directory-backed substrate.
//!
//! Each key is stored as `<hex(key)>.json` inside the store directory. Writes
//! go to a temporary sibling file first and are renamed into place, so a
//! reader never observes a half-written value. Leftover temporary files from
//! an interrupted write are ignored by [`scan`](KvStore::scan).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

const VALUE_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// A [`KvStore`] persisting one file per key.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "opened file store");
        Ok(Self { dir })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{VALUE_EXT}", hex::encode(key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{TEMP_EXT}", hex::encode(key)))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let temp = self.temp_path(key);
        {
            let mut file = File::create(&temp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&temp, self.value_path(key))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = match hex::decode(stem).map(String::from_utf8) {
                Ok(Ok(key)) => key,
                _ => {
                    warn!(path = %path.display(), "skipping file with undecodable name");
                    continue;
                }
            };
            out.push((key, fs::read(&path)?));
        }
        Ok(out)
    }

    fn clear(&self) -> StoreResult<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if ext == Some(VALUE_EXT) || ext == Some(TEMP_EXT) {
                fs::remove_file(&path).map_err(StoreError::Io)?;
            }
        }
        Ok(())
    }
}
