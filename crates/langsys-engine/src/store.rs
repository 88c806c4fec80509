//! Durable reactive cell over sled
//!
//! A [`DurableCell`] wraps a single named value: it is loaded from disk once
//! at construction, persisted on every mutation, and observable through a
//! watch channel that delivers the current value immediately on subscribe.

use langsys_common::Result;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Durable storage backing one or more named cells
#[derive(Debug, Clone)]
pub struct DurableStore {
    db: sled::Db,
}

impl DurableStore {
    /// Open (or create) the store at the given path
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory store that is discarded on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Create a durable cell for the named value
    pub fn cell<T>(&self, name: &str) -> DurableCell<T>
    where
        T: Clone + Default + Serialize + DeserializeOwned,
    {
        DurableCell::new(self.db.clone(), name)
    }
}

/// A single named value with persistence on every mutation.
///
/// `set` persists first and updates the in-memory value after; a persistence
/// failure is logged and the in-memory update still happens (last-write-wins,
/// single writer per process).
#[derive(Debug)]
pub struct DurableCell<T> {
    db: sled::Db,
    name: String,
    // Serializes writers so persist + notify is one atomic step
    write_lock: Arc<Mutex<()>>,
    tx: watch::Sender<T>,
}

impl<T> Clone for DurableCell<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            name: self.name.clone(),
            write_lock: Arc::clone(&self.write_lock),
            tx: self.tx.clone(),
        }
    }
}

impl<T> DurableCell<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    fn new(db: sled::Db, name: &str) -> Self {
        let initial = match db.get(name.as_bytes()) {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    debug!("Loaded persisted value for '{}'", name);
                    value
                }
                Err(e) => {
                    warn!(
                        "Persisted value for '{}' is unreadable, starting from default: {}",
                        name, e
                    );
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Failed to read persisted value for '{}': {}", name, e);
                T::default()
            }
        };

        let (tx, _rx) = watch::channel(initial);
        Self {
            db,
            name: name.to_string(),
            write_lock: Arc::new(Mutex::new(())),
            tx,
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Persist then replace the value, notifying subscribers.
    /// Never fails: persistence problems are logged and the in-memory value
    /// still updates.
    pub fn set(&self, value: T) {
        let _guard = self.write_lock.lock();
        self.persist(&value);
        self.tx.send_replace(value);
    }

    /// Atomic read-modify-write: no other writer can interleave between the
    /// read and the persisted update
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let _guard = self.write_lock.lock();
        let mut value = self.tx.borrow().clone();
        f(&mut value);
        self.persist(&value);
        self.tx.send_replace(value);
    }

    /// Delete the persisted value and reset to the default
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        if let Err(e) = self.db.remove(self.name.as_bytes()) {
            warn!("Failed to clear persisted value for '{}': {}", self.name, e);
        }
        self.tx.send_replace(T::default());
    }

    /// Subscribe to the cell. The receiver sees the current value
    /// immediately and every subsequent value on change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    fn persist(&self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(e) = self.db.insert(self.name.as_bytes(), bytes) {
                    warn!("Failed to persist '{}': {}", self.name, e);
                }
            }
            Err(e) => warn!("Failed to serialize '{}' for persistence: {}", self.name, e),
        }
    }
}
