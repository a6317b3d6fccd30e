//! Multi-party transactions in flight, persisted as JSON files.
//!
//! A pending transaction lives in a file keyed by the first 8 hex digits of
//! its txid (`pending_auth_<prefix>.json`), carrying partial signatures.
//!
//! Workflow for an authorization lock where the licensee pays the fuel:
//! 1. author: [`crate::Wallet::lock_authorization`] with no fuel, then
//!    [`PendingStore::save`]; the file travels to the licensee
//! 2. licensee: [`PendingStore::load`], [`crate::Wallet::attach_fuel_input`]
//!    (reseals the txid, dropping any earlier signatures), sign, save
//! 3. author: load, sign; once fully signed the transaction is submitted and
//!    the file removed

use crate::{WalletError, WalletResult};
use cpc_core::Transaction;
use shared::{ChainError, Hash256};
use std::fs;
use std::path::PathBuf;

/// File-backed store for multi-party transactions awaiting signatures
pub struct PendingStore {
    dir: PathBuf,
}

impl PendingStore {
    /// Store rooted at the given directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name for a transaction: the first 8 hex digits of its txid
    #[must_use]
    pub fn file_name(txid: &Hash256) -> String {
        format!("pending_auth_{}.json", &txid.to_string()[..8])
    }

    fn path_of(&self, txid_prefix: &str) -> PathBuf {
        self.dir.join(format!("pending_auth_{txid_prefix}.json"))
    }

    /// Persists a pending transaction, partial signatures included
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fail
    pub fn save(&self, tx: &Transaction) -> WalletResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(ChainError::from)?;

        let path = self.dir.join(Self::file_name(&tx.txid));
        let encoded = serde_json::to_string_pretty(tx)
            .map_err(|e| ChainError::SerializationError(e.to_string()))?;
        fs::write(&path, encoded).map_err(ChainError::from)?;
        Ok(path)
    }

    /// Loads a pending transaction by txid prefix
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::PendingNotFound`] if no such file exists
    pub fn load(&self, txid_prefix: &str) -> WalletResult<Transaction> {
        let path = self.path_of(txid_prefix);
        let encoded = fs::read_to_string(&path)
            .map_err(|_| WalletError::PendingNotFound(txid_prefix.to_string()))?;
        let tx = serde_json::from_str(&encoded)
            .map_err(|e| ChainError::SerializationError(e.to_string()))?;
        Ok(tx)
    }

    /// Removes a pending transaction file, usually after submission
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::PendingNotFound`] if no such file exists
    pub fn remove(&self, txid_prefix: &str) -> WalletResult<()> {
        let path = self.path_of(txid_prefix);
        fs::remove_file(&path).map_err(|_| WalletError::PendingNotFound(txid_prefix.to_string()))
    }
}
