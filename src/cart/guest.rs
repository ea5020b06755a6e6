//! Guest cart persistence
//!
//! Anonymous shoppers keep their cart in browser-local storage: one
//! JSON-serialized line array under a fixed key, read at startup and
//! rewritten on every local mutation. Nothing here runs while a customer is
//! signed in.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use mockall::automock;
use thiserror::Error;

use crate::cart::models::CartLine;

/// Fixed storage key for the guest line array.
pub const GUEST_CART_FILE: &str = "mortar_guest_cart.json";

/// Errors raised by a guest cart store.
#[derive(Debug, Error)]
pub enum GuestStoreError {
    /// Reading or writing the backing storage failed.
    #[error("guest cart storage io error")]
    Io(#[from] io::Error),

    /// The stored cart is not a valid line array.
    #[error("guest cart is not valid JSON")]
    Serialization(#[from] serde_json::Error),
}

/// Local persistent store for the guest line array. Writes are effectively
/// synchronous; last writer wins across tabs sharing the same profile.
#[automock]
pub trait GuestCartStore: Send + Sync {
    /// Read the stored lines. An absent cart is an empty one.
    fn load(&self) -> Result<Vec<CartLine>, GuestStoreError>;

    /// Replace the stored lines.
    fn save(&self, lines: &[CartLine]) -> Result<(), GuestStoreError>;

    /// Drop the stored cart entirely.
    fn clear(&self) -> Result<(), GuestStoreError>;
}

/// Guest store backed by a JSON file under a caller-chosen directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store writing to [`GUEST_CART_FILE`] inside `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(GUEST_CART_FILE),
        }
    }

    /// Full path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuestCartStore for JsonFileStore {
    fn load(&self) -> Result<Vec<CartLine>, GuestStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), GuestStoreError> {
        let bytes = serde_json::to_vec(lines)?;

        Ok(fs::write(&self.path, bytes)?)
    }

    fn clear(&self) -> Result<(), GuestStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
