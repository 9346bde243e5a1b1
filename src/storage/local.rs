//! # Local Filesystem Backend
//!
//! One file per key under a root directory. File names are the URL-safe
//! base64 encoding of the key, so any key string round-trips.
//!
//! Encoding grows a key by a third. With the extension a file name must
//! fit in 255 bytes, so keys are limited to 187 bytes; longer keys fail
//! with [`StorageError::InvalidKey`] before touching the filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::backend::KeyValueBackend;
use super::errors::{StorageError, StorageResult};

const VALUE_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";
/// Longest file name most filesystems accept
const MAX_FILE_NAME: usize = 255;

/// Local filesystem key-value backend
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open a backend rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".into()));
        }
        let name = format!("{}.{}", URL_SAFE_NO_PAD.encode(key.as_bytes()), VALUE_EXT);
        if name.len() > MAX_FILE_NAME {
            return Err(StorageError::InvalidKey(format!(
                "key of {} bytes encodes to a {} byte file name (limit {})",
                key.len(),
                name.len(),
                MAX_FILE_NAME
            )));
        }
        Ok(self.root.join(name))
    }

    fn decode_file_name(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXT) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
        String::from_utf8(bytes).ok()
    }
}

impl KeyValueBackend for LocalBackend {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are returned lossily so the adapter can
            // classify them as a corrupt payload.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                let bytes = fs::read(&path)?;
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;
        let temp = path.with_extension(TEMP_EXT);

        fs::write(&temp, value.as_bytes())?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(key) = Self::decode_file_name(&entry.path()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
