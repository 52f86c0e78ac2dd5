use std::collections::HashMap;

use bytes::Bytes;
use vesper_common::{Address, H256, U256, constants::EMPTY_KECCACK_HASH, types::Account};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend error: {0}")]
    Custom(String),
}

/// Read-only source of prior state, queried on cache miss when the
/// world-state runs in fork mode. Reads may block on I/O; failures propagate
/// and are never converted to defaults.
pub trait StateBackend: Send + Sync {
    fn fetch_balance(&self, address: Address) -> Result<U256, BackendError>;
    fn fetch_nonce(&self, address: Address) -> Result<u64, BackendError>;
    fn fetch_code(&self, address: Address) -> Result<Bytes, BackendError>;
    fn fetch_storage(&self, address: Address, key: H256) -> Result<U256, BackendError>;
}

/// Map-backed state source for tests and single-process embeddings.
///
/// Accounts are indexed by address, bytecode by code hash, storage by
/// `(address, slot)`; missing entries read as their defaults.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    pub accounts: HashMap<Address, Account>,
    pub code: HashMap<H256, Bytes>,
    pub storage: HashMap<(Address, H256), U256>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account along with its bytecode, keyed by content hash.
    pub fn insert_account(&mut self, address: Address, account: Account, code: Bytes) {
        if !code.is_empty() {
            self.code.insert(account.code_hash, code);
        }
        self.accounts.insert(address, account);
    }
}

impl StateBackend for InMemoryBackend {
    fn fetch_balance(&self, address: Address) -> Result<U256, BackendError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default())
    }

    fn fetch_nonce(&self, address: Address) -> Result<u64, BackendError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or_default())
    }

    fn fetch_code(&self, address: Address) -> Result<Bytes, BackendError> {
        let Some(account) = self.accounts.get(&address) else {
            return Ok(Bytes::new());
        };
        if account.code_hash == EMPTY_KECCACK_HASH {
            return Ok(Bytes::new());
        }
        match self.code.get(&account.code_hash) {
            Some(code) => Ok(code.clone()),
            None => Err(BackendError::Custom(format!(
                "bytecode missing for hash {:?}",
                account.code_hash
            ))),
        }
    }

    fn fetch_storage(&self, address: Address, key: H256) -> Result<U256, BackendError> {
        Ok(self
            .storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default())
    }
}
