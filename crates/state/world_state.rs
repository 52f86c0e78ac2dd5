//! In-memory owner of accounts, code, persistent and transient storage
//! during block execution.
//!
//! All mutation goes through per-concern journals so that nested execution
//! frames can snapshot and roll back in O(changes). The caches are the
//! authority for committed values; an embedder running on top of a backing
//! store is expected to flush committed state out of the caches itself.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use keccak_hash::keccak;
use tracing::instrument;
use vesper_common::{
    Address, H256, U256,
    constants::EMPTY_KECCACK_HASH,
    types::{Account, is_account_alive},
};

use crate::{
    backend::StateBackend,
    errors::StateError,
    journal::{ChangeTag, Journal, JournalEntry, JournalPosition},
};

/// Journal specialised to account changes.
pub type AccountJournal = Journal<Address, Account>;
/// Journal specialised to storage-slot changes, persistent or transient.
pub type StorageJournal = Journal<(Address, H256), U256>;

impl Journal<Address, Account> {
    pub fn record_cache(&mut self, address: Address, account: Account) -> JournalPosition {
        self.record(address, Some(account), ChangeTag::JustCache)
    }

    pub fn record_create(&mut self, address: Address, account: Account) -> JournalPosition {
        self.record(address, Some(account), ChangeTag::Create)
    }

    pub fn record_update(&mut self, address: Address, account: Account) -> JournalPosition {
        self.record(address, Some(account), ChangeTag::Update)
    }

    pub fn record_delete(&mut self, address: Address) -> JournalPosition {
        self.record(address, None, ChangeTag::Delete)
    }
}

impl Journal<(Address, H256), U256> {
    pub fn record_cache(
        &mut self,
        address: Address,
        key: H256,
        value: U256,
    ) -> JournalPosition {
        self.record((address, key), Some(value), ChangeTag::JustCache)
    }

    pub fn record_write(
        &mut self,
        address: Address,
        key: H256,
        value: U256,
    ) -> JournalPosition {
        self.record((address, key), Some(value), ChangeTag::Update)
    }
}

/// Addresses created during the current top-level transaction.
///
/// Not snapshotted per call frame; the world-state clears it when the
/// outermost transaction scope ends.
#[derive(Debug, Clone, Default)]
pub struct CreatedAccounts {
    addresses: HashSet<Address>,
}

impl CreatedAccounts {
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Returns whether the address was newly inserted.
    pub fn add(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }

    pub fn clear_and_release_capacity(&mut self) {
        self.addresses = HashSet::new();
    }
}

/// Composite position across the three journals. O(1) to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub accounts: JournalPosition,
    pub persistent_storage: JournalPosition,
    pub transient_storage: JournalPosition,
}

/// Level at which a snapshot is being committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Call,
    Transaction,
    Block,
}

pub struct WorldState {
    accounts: HashMap<Address, Account>,
    code: HashMap<H256, Bytes>,
    storage: HashMap<(Address, H256), U256>,
    transient_storage: HashMap<(Address, H256), U256>,
    account_journal: AccountJournal,
    storage_journal: StorageJournal,
    transient_journal: StorageJournal,
    created_accounts: CreatedAccounts,
    backend: Option<Arc<dyn StateBackend>>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            code: HashMap::new(),
            storage: HashMap::new(),
            transient_storage: HashMap::new(),
            account_journal: Journal::new(),
            storage_journal: Journal::new(),
            transient_journal: Journal::new(),
            created_accounts: CreatedAccounts::default(),
            backend: None,
        }
    }

    /// World-state in fork mode: cache misses are resolved against `backend`.
    pub fn with_backend(backend: Arc<dyn StateBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new()
        }
    }

    pub fn get_balance(&mut self, address: Address) -> Result<U256, StateError> {
        Ok(self
            .load_account(address)?
            .map(|account| account.balance)
            .unwrap_or_default())
    }

    pub fn get_nonce(&mut self, address: Address) -> Result<u64, StateError> {
        Ok(self
            .load_account(address)?
            .map(|account| account.nonce)
            .unwrap_or_default())
    }

    pub fn get_code(&mut self, address: Address) -> Result<Bytes, StateError> {
        let Some(account) = self.load_account(address)? else {
            return Ok(Bytes::new());
        };
        if account.code_hash == EMPTY_KECCACK_HASH {
            return Ok(Bytes::new());
        }
        if let Some(code) = self.code.get(&account.code_hash) {
            return Ok(code.clone());
        }
        if let Some(backend) = self.backend.clone() {
            let code = backend.fetch_code(address)?;
            if !code.is_empty() {
                self.code.insert(account.code_hash, code.clone());
                return Ok(code);
            }
        }
        Err(StateError::MissingCode(account.code_hash))
    }

    pub fn get_storage(&mut self, address: Address, key: H256) -> Result<U256, StateError> {
        if let Some(value) = self.storage.get(&(address, key)) {
            return Ok(*value);
        }
        let Some(backend) = self.backend.clone() else {
            return Ok(U256::zero());
        };
        let value = self.fetch_storage_slot(&*backend, address, key)?;
        self.storage.insert((address, key), value);
        self.storage_journal.record_cache(address, key, value);
        Ok(value)
    }

    /// Transient storage never consults the fork backend; a missing slot
    /// reads as zero.
    pub fn get_transient_storage(&self, address: Address, key: H256) -> U256 {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError> {
        let prior = self.load_account(address)?;
        let existed = is_account_alive(prior.as_ref());
        let mut account = prior.unwrap_or_default();
        account.balance = balance;
        self.write_account(address, account, existed);
        Ok(())
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StateError> {
        let prior = self.load_account(address)?;
        let existed = is_account_alive(prior.as_ref());
        let mut account = prior.unwrap_or_default();
        account.nonce = nonce;
        self.write_account(address, account, existed);
        Ok(())
    }

    /// Associates `code` with its content hash in the code store and points
    /// the account at it. Storing the same bytecode twice is a no-op.
    pub fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError> {
        let prior = self.load_account(address)?;
        let existed = is_account_alive(prior.as_ref());
        let mut account = prior.unwrap_or_default();
        account.code_hash = if code.is_empty() {
            EMPTY_KECCACK_HASH
        } else {
            let code_hash = keccak(&code);
            self.code.entry(code_hash).or_insert(code);
            code_hash
        };
        self.write_account(address, account, existed);
        Ok(())
    }

    pub fn set_storage(&mut self, address: Address, key: H256, value: U256) {
        self.storage.insert((address, key), value);
        self.storage_journal.record_write(address, key, value);
    }

    pub fn set_transient_storage(&mut self, address: Address, key: H256, value: U256) {
        self.transient_storage.insert((address, key), value);
        self.transient_journal.record_write(address, key, value);
    }

    /// Marks the account deleted. Subsequent reads see the empty account; the
    /// cache keeps an explicit empty entry so a fork backend cannot
    /// resurrect the deleted state.
    pub fn delete_account(&mut self, address: Address) {
        self.account_journal.record_delete(address);
        self.accounts.insert(address, Account::default());
    }

    pub fn created_accounts(&self) -> &CreatedAccounts {
        &self.created_accounts
    }

    pub fn was_created_in_tx(&self, address: &Address) -> bool {
        self.created_accounts.contains(address)
    }

    pub fn take_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            accounts: self.account_journal.take_snapshot(),
            persistent_storage: self.storage_journal.take_snapshot(),
            transient_storage: self.transient_journal.take_snapshot(),
        }
    }

    /// Rolls every journal back to `snapshot` and rewrites each touched cache
    /// entry to the nearest earlier journal value for the same key, removing
    /// it when no earlier record exists (the next read refetches).
    pub fn restore(&mut self, snapshot: StateSnapshot) -> Result<(), StateError> {
        let discarded = self.account_journal.restore(snapshot.accounts)?;
        for entry in &discarded {
            match self.account_journal.latest_for(&entry.key) {
                Some(prior) => {
                    let account = match (&prior.tag, &prior.value) {
                        (ChangeTag::Delete, _) | (_, None) => Account::default(),
                        (_, Some(account)) => account.clone(),
                    };
                    self.accounts.insert(entry.key, account);
                }
                None => {
                    self.accounts.remove(&entry.key);
                }
            }
        }

        let discarded = self.storage_journal.restore(snapshot.persistent_storage)?;
        rebuild_storage_cache(&self.storage_journal, &mut self.storage, &discarded);

        let discarded = self.transient_journal.restore(snapshot.transient_storage)?;
        rebuild_storage_cache(
            &self.transient_journal,
            &mut self.transient_storage,
            &discarded,
        );
        Ok(())
    }

    /// Sweeps every journal entry past `snapshot`. At transaction scope this
    /// also ends the transaction: created-accounts are forgotten and
    /// transient storage is emptied.
    pub fn commit(&mut self, snapshot: StateSnapshot, scope: Scope) {
        self.account_journal.commit(snapshot.accounts, |_| {});
        self.storage_journal.commit(snapshot.persistent_storage, |_| {});
        self.transient_journal
            .commit(snapshot.transient_storage, |_| {});
        if scope == Scope::Transaction {
            self.end_transaction();
        }
    }

    /// Top-level transaction abort: rolls back to `snapshot`, then clears
    /// transient storage and the created-accounts set unconditionally.
    pub fn abort_transaction(&mut self, snapshot: StateSnapshot) -> Result<(), StateError> {
        self.restore(snapshot)?;
        self.end_transaction();
        Ok(())
    }

    fn end_transaction(&mut self) {
        self.created_accounts.clear();
        self.transient_journal.clear();
        self.transient_storage.clear();
    }

    fn write_account(&mut self, address: Address, account: Account, existed: bool) {
        if existed {
            self.account_journal.record_update(address, account.clone());
        } else {
            self.account_journal.record_create(address, account.clone());
            self.created_accounts.add(address);
        }
        self.accounts.insert(address, account);
    }

    /// Account view for `address`: the cache, or a full load through the fork
    /// backend on miss. A backend load populates the account cache and the
    /// code store and appends a single `JustCache` record.
    fn load_account(&mut self, address: Address) -> Result<Option<Account>, StateError> {
        if let Some(account) = self.accounts.get(&address) {
            return Ok(Some(account.clone()));
        }
        let Some(backend) = self.backend.clone() else {
            return Ok(None);
        };
        let account = self.fetch_account(&*backend, address)?;
        self.accounts.insert(address, account.clone());
        self.account_journal.record_cache(address, account.clone());
        Ok(Some(account))
    }

    #[instrument(level = "trace", name = "Account read", skip_all)]
    fn fetch_account(
        &mut self,
        backend: &dyn StateBackend,
        address: Address,
    ) -> Result<Account, StateError> {
        let balance = backend.fetch_balance(address)?;
        let nonce = backend.fetch_nonce(address)?;
        let code = backend.fetch_code(address)?;
        let code_hash = if code.is_empty() {
            EMPTY_KECCACK_HASH
        } else {
            let code_hash = keccak(&code);
            self.code.entry(code_hash).or_insert(code);
            code_hash
        };
        Ok(Account::new(nonce, balance, code_hash))
    }

    #[instrument(level = "trace", name = "Storage read", skip_all)]
    fn fetch_storage_slot(
        &self,
        backend: &dyn StateBackend,
        address: Address,
        key: H256,
    ) -> Result<U256, StateError> {
        Ok(backend.fetch_storage(address, key)?)
    }
}

fn rebuild_storage_cache(
    journal: &StorageJournal,
    cache: &mut HashMap<(Address, H256), U256>,
    discarded: &[JournalEntry<(Address, H256), U256>],
) {
    for entry in discarded {
        match journal.latest_for(&entry.key).and_then(|prior| prior.value) {
            Some(value) => {
                cache.insert(entry.key, value);
            }
            None => {
                cache.remove(&entry.key);
            }
        }
    }
}
