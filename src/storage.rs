//! Storage layer for taskwatch
//!
//! All state lives in a single data directory as JSON documents:
//!
//! ```text
//! <data_dir>/
//!   taskwatch.toml        # Optional configuration
//!   users.json            # User directory
//!   tasks.json            # Task records
//!   notifications.json    # Notification records
//! ```
//!
//! Reads deserialize the whole document; mutations go through
//! [`Storage::update_file`], which holds an exclusive file lock across the
//! read-modify-write cycle and replaces the document atomically. That locked
//! cycle is what lets the notification store offer insert-if-absent keyed by
//! (recipient, task, kind) without a database behind it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "taskwatch.toml";

const USERS_FILE: &str = "users.json";
const TASKS_FILE: &str = "tasks.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";

/// Storage manager for the taskwatch data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Path to the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path to the user directory document
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    /// Path to the task store document
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// Path to the notification store document
    pub fn notifications_file(&self) -> PathBuf {
        self.data_dir.join(NOTIFICATIONS_FILE)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the data directory and empty store documents
    pub fn init_all(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        for path in [self.users_file(), self.tasks_file(), self.notifications_file()] {
            if !path.exists() {
                self.write_json(&path, &Vec::<serde_json::Value>::new())?;
            }
        }

        Ok(())
    }

    /// Check if the data directory has been initialized
    pub fn is_initialized(&self) -> bool {
        self.tasks_file().exists()
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read a JSON document, defaulting when the file does not exist yet
    pub fn read_json<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Locked read-modify-write of a JSON document
    ///
    /// Acquires the document's lock, reads the current value, applies the
    /// mutator, and writes the result back atomically. The lock is held for
    /// the whole cycle, so check-then-act sequences inside the mutator are
    /// safe against concurrent processes.
    pub fn update_file<T, R, F>(&self, path: &Path, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = lock::lock_path_for(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut value: T = self.read_json(path)?;
        let result = f(&mut value)?;
        self.write_json(path, &value)?;

        Ok(result)
    }

    /// Locked read of a JSON document
    ///
    /// Takes the same lock as [`Storage::update_file`] so readers never see a
    /// document mid-mutation.
    pub fn read_file<T>(&self, path: &Path) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let lock_path = lock::lock_path_for(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;
        self.read_json(path)
    }
}
