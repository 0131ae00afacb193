use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::utils::clock::Clock;

use super::{codec, entities::Ledger, error::LedgerError};

/// Interface for abstracting storage of the ledger.
pub trait LedgerStore {
    /// Reads the ledger. A store that has never been written to yields a fresh ledger.
    fn load(&self) -> Result<Ledger, LedgerError>;

    /// Replaces the stored ledger.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;

    /// Runs a full load-mutate-save cycle. The ledger is only written back if `op` succeeds.
    fn update<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Ledger) -> Result<T, LedgerError>;
}

/// The main realization of [LedgerStore]. The ledger lives in a single text file, guarded by an
/// advisory lock on a `.lock` file next to it. The lock file is separate because saving replaces
/// the ledger file.
pub struct LedgerFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    date_provider: Box<dyn Clock>,
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Holds the advisory lock until dropped, so it is released on every exit path.
struct LedgerLock {
    file: File,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release ledger lock {e}");
        }
    }
}

impl LedgerFileStore {
    pub fn new(path: PathBuf, date_provider: Box<dyn Clock>) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Ok(Self {
            path,
            lock_path: lock_path.into(),
            date_provider,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, mode: LockMode) -> Result<LedgerLock, LedgerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file)?,
            LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
        }
        debug!("Acquired {mode:?} lock on {:?}", self.lock_path);
        Ok(LedgerLock { file })
    }

    fn load_unlocked(&self) -> Result<Ledger, LedgerError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                debug!("Decoding ledger {:?}", self.path);
                let text = String::from_utf8(bytes).map_err(|e| {
                    let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
                    let line = valid.iter().filter(|v| **v == b'\n').count() + 1;
                    LedgerError::corrupt(line, "ledger is not valid UTF-8")
                })?;
                codec::decode(&text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No ledger at {:?}, starting a new one", self.path);
                Ok(Ledger::new(self.date_provider.now()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_unlocked(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        // Written next to the destination so the rename never crosses filesystems.
        let dir = match self.path.parent() {
            Some(v) if !v.as_os_str().is_empty() => v,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(codec::encode(ledger).as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!("Saved ledger {:?}", self.path);
        Ok(())
    }
}

impl LedgerStore for LedgerFileStore {
    fn load(&self) -> Result<Ledger, LedgerError> {
        let _lock = self.lock(LockMode::Shared)?;
        self.load_unlocked()
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        self.save_unlocked(ledger)
    }

    fn update<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    {
        let _lock = self.lock(LockMode::Exclusive)?;
        let mut ledger = self.load_unlocked()?;
        let result = op(&mut ledger)?;
        self.save_unlocked(&ledger)?;
        Ok(result)
    }
}
