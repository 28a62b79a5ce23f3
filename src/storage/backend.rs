//! Byte stores
//!
//! The registry keeps metadata only; file contents go through a `ByteStore`.
//! `FsByteStore` keeps one file per record under a root directory and
//! `MemoryByteStore` keeps everything in a map.

use log::{error, info};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Content storage used by the registry. Names are already validated.
pub trait ByteStore: Send + Sync {
    fn create_empty(&self, name: &str) -> io::Result<()>;
    fn read_all(&self, name: &str) -> io::Result<Vec<u8>>;
    fn overwrite(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    fn append(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    fn stat_size(&self, name: &str) -> io::Result<u64>;
}

/// Stores each file under `root`.
pub struct FsByteStore {
    root: PathBuf,
}

impl FsByteStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("Storage root directory: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn temp_path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{name}.tmp"))
    }
}

impl ByteStore for FsByteStore {
    fn create_empty(&self, name: &str) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_of(name))
            .map(|_| ())
    }

    fn read_all(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(name))
    }

    /// Writes to a temporary file first, then renames it over the target.
    fn overwrite(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let temp_path = self.temp_path_of(name);
        let result = (|| {
            let mut temp_file = fs::File::create(&temp_path)?;
            temp_file.write_all(bytes)?;
            temp_file.flush()?;
            drop(temp_file);
            fs::rename(&temp_path, self.path_of(name))
        })();

        if let Err(e) = &result {
            error!("Failed to overwrite {name}: {e}");
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn append(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.path_of(name))?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn stat_size(&self, name: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.path_of(name))?.len())
    }
}

/// Keeps file contents in memory.
#[derive(Default)]
pub struct MemoryByteStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryByteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_files<T>(&self, f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> T) -> T {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut files)
    }
}

fn missing(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{name} is not stored"))
}

impl ByteStore for MemoryByteStore {
    fn create_empty(&self, name: &str) -> io::Result<()> {
        self.with_files(|files| {
            files.insert(name.to_string(), Vec::new());
        });
        Ok(())
    }

    fn read_all(&self, name: &str) -> io::Result<Vec<u8>> {
        self.with_files(|files| files.get(name).cloned().ok_or_else(|| missing(name)))
    }

    fn overwrite(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.with_files(|files| match files.get_mut(name) {
            Some(content) => {
                *content = bytes.to_vec();
                Ok(())
            }
            None => Err(missing(name)),
        })
    }

    fn append(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.with_files(|files| match files.get_mut(name) {
            Some(content) => {
                content.extend_from_slice(bytes);
                Ok(())
            }
            None => Err(missing(name)),
        })
    }

    fn stat_size(&self, name: &str) -> io::Result<u64> {
        self.with_files(|files| {
            files
                .get(name)
                .map(|content| content.len() as u64)
                .ok_or_else(|| missing(name))
        })
    }
}
