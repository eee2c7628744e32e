//! Persistent key/value storage.
//!
//! Values are small strings kept one file per key under a directory. The
//! default directory is the platform config dir:
//!   - Linux: `~/.config/iterbene/`
//!   - macOS: `~/Library/Application Support/iterbene/`
//!   - Windows: `%APPDATA%\iterbene\`

use std::path::{Path, PathBuf};

const APP_DIR: &str = "iterbene";

#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Storage rooted at `dir`, created on first write.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage in the platform config directory, if there is one.
    pub fn platform() -> Option<Self> {
        let config_dir = dirs::config_dir()?;
        Some(Self::at(config_dir.join(APP_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns `true` if the write succeeded.
    pub fn save_raw(&self, key: &str, value: &str) -> bool {
        if !self.dir.exists() && std::fs::create_dir_all(&self.dir).is_err() {
            crate::log_error!("Cannot create storage dir {}", self.dir.display());
            return false;
        }
        std::fs::write(self.file_path(key), value).is_ok()
    }

    pub fn load_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_path(key)).ok()
    }

    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.file_path(key));
    }

    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).is_file()
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be a valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(format!("{}.dat", safe_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_removes() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::at(tmp.path().join("nested"));

        assert!(!storage.exists("at"));
        assert!(storage.save_raw("at", "value"));
        assert_eq!(storage.load_raw("at").as_deref(), Some("value"));

        storage.remove("at");
        assert_eq!(storage.load_raw("at"), None);
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::at(tmp.path());
        assert!(storage.save_raw("../evil", "x"));
        assert!(tmp.path().join(".._evil.dat").is_file());
    }
}
