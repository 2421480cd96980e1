// storefront/src/cart/storage.rs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key the cart document is stored under. Shared with the web UI.
pub const CART_STORAGE_KEY: &str = "cart-storage";

#[derive(Debug, Error)]
pub enum CartStorageError {
  #[error("cart storage I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("cart document could not be encoded: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("cart storage unavailable: {0}")]
  Unavailable(String),
}

/// Durable string storage for the cart document.
pub trait CartStorage: Send + Sync {
  /// `Ok(None)` when nothing has been stored under `key` yet.
  fn load(&self, key: &str) -> Result<Option<String>, CartStorageError>;
  fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError>;
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
  dir: PathBuf,
}

impl FileCartStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl CartStorage for FileCartStorage {
  fn load(&self, key: &str) -> Result<Option<String>, CartStorageError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError> {
    fs::create_dir_all(&self.dir)?;
    // Write then rename so a crash never leaves a truncated document behind.
    let path = self.path_for(key);
    let tmp = self.dir.join(format!(".{}.json.tmp", key));
    fs::write(&tmp, value)?;
    fs::rename(&tmp, &path)?;
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct MemoryCartStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryCartStorage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<String> {
    self.entries.lock().get(key).cloned()
  }
}

impl CartStorage for MemoryCartStorage {
  fn load(&self, key: &str) -> Result<Option<String>, CartStorageError> {
    Ok(self.get(key))
  }

  fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError> {
    self.entries.lock().insert(key.to_string(), value.to_string());
    Ok(())
  }
}
