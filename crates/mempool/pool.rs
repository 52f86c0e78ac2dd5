//! In-memory pending transaction pool.
//!
//! One `RwLock` guards the whole index set, so the entire admission sequence
//! (validate, replacement check, capacity, insert) is a single critical
//! section and concurrent adds for the same `(sender, nonce)` linearise:
//! exactly one of them ends up live. Read-only observers take the read lock
//! and see a point-in-time snapshot.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::debug;
use vesper_common::{
    Address, H256, U256,
    types::{Fork, Transaction, TxType},
};

use crate::{
    config::{BlobsSupport, HeadInfo, MempoolConfig},
    error::MempoolError,
    fees::replacement_allowed,
    primitives::TransactionPrimitives,
    validation::{PooledTransaction, validate_transaction},
};

/// Successful outcome of [`Mempool::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { hash: H256, is_blob: bool },
    AlreadyKnown { hash: H256 },
}

/// Selection criteria for draining pending transactions into a block.
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingTxFilter {
    pub min_tip: Option<u64>,
    pub base_fee: Option<u64>,
    pub blob_fee: Option<U256>,
    pub only_plain_txs: bool,
    pub only_blob_txs: bool,
}

impl PendingTxFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        let is_blob_tx = transaction.tx_type() == TxType::EIP4844;
        if self.only_plain_txs && is_blob_tx || self.only_blob_txs && !is_blob_tx {
            return false;
        }

        // A transaction whose fee cap cannot cover the base fee is not
        // includable regardless of the tip floor.
        let min_tip = self.min_tip.unwrap_or(0);
        if !transaction
            .effective_gas_tip(self.base_fee)
            .is_some_and(|tip| tip >= min_tip)
        {
            return false;
        }

        if let (true, Some(blob_fee)) = (is_blob_tx, self.blob_fee)
            && !transaction
                .max_fee_per_blob_gas()
                .is_some_and(|fee| fee >= blob_fee)
        {
            return false;
        }
        true
    }
}

#[derive(Clone)]
pub struct Mempool {
    config: MempoolConfig,
    primitives: Arc<dyn TransactionPrimitives>,
    inner: Arc<RwLock<MempoolInner>>,
}

#[derive(Debug, Default)]
struct MempoolInner {
    head: HeadInfo,
    fork: Fork,
    transactions: HashMap<H256, PooledTransaction>,
    blob_transactions: HashSet<H256>,
    sender_index: HashMap<Address, HashSet<H256>>,
    blob_sender_index: HashMap<Address, HashSet<H256>>,
    sender_by_hash: HashMap<H256, Address>,
}

impl Mempool {
    /// Fails with `InvalidConfig` before accepting any transaction.
    pub fn new(
        config: MempoolConfig,
        primitives: Arc<dyn TransactionPrimitives>,
    ) -> Result<Self, MempoolError> {
        config.validate()?;
        Ok(Self {
            config,
            primitives,
            inner: Arc::new(RwLock::new(MempoolInner::default())),
        })
    }

    /// Tracks the chain head the admission checks run against.
    pub fn update_head(&self, head: HeadInfo, fork: Fork) -> Result<(), MempoolError> {
        let mut inner = self.write()?;
        inner.head = head;
        inner.fork = fork;
        Ok(())
    }

    /// Admits a pre-decoded transaction into the pending set.
    pub fn add(&self, transaction: &Transaction) -> Result<AddOutcome, MempoolError> {
        let mut inner = self.write()?;
        let validated = validate_transaction(
            transaction,
            inner.fork,
            &self.config,
            &inner.head,
            &*self.primitives,
        )?;
        inner.insert(validated, &self.config)
    }

    /// Admits a transaction from its opaque wire encoding.
    pub fn add_encoded(&self, raw: &[u8]) -> Result<AddOutcome, MempoolError> {
        let transaction = self
            .primitives
            .decode(raw)
            .map_err(|err| MempoolError::EncodingFailed(err.to_string()))?;
        self.add(&transaction)
    }

    /// Removes a transaction from every index; false if it was not pooled.
    pub fn remove(&self, hash: &H256) -> Result<bool, MempoolError> {
        Ok(self.write()?.remove(hash))
    }

    pub fn contains(&self, hash: &H256) -> Result<bool, MempoolError> {
        Ok(self.read()?.transactions.contains_key(hash))
    }

    pub fn get_pending_count(&self) -> Result<u32, MempoolError> {
        Ok(self.read()?.transactions.len() as u32)
    }

    pub fn get_pending_blob_count(&self) -> Result<u32, MempoolError> {
        Ok(self.read()?.blob_transactions.len() as u32)
    }

    pub fn get_pending_transactions(&self) -> Result<Vec<Transaction>, MempoolError> {
        Ok(self
            .read()?
            .transactions
            .values()
            .map(|pooled| pooled.transaction.clone())
            .collect())
    }

    /// Pending transactions of one sender, sorted by nonce.
    pub fn get_pending_transactions_by_sender(
        &self,
        sender: &Address,
    ) -> Result<Vec<Transaction>, MempoolError> {
        let inner = self.read()?;
        let mut transactions: Vec<Transaction> = inner
            .sender_index
            .get(sender)
            .into_iter()
            .flatten()
            .filter_map(|hash| inner.transactions.get(hash))
            .map(|pooled| pooled.transaction.clone())
            .collect();
        transactions.sort_by_key(Transaction::nonce);
        Ok(transactions)
    }

    /// One past the highest pooled nonce for `sender`, if any.
    pub fn pending_nonce(&self, sender: &Address) -> Result<Option<u64>, MempoolError> {
        let inner = self.read()?;
        Ok(inner
            .sender_index
            .get(sender)
            .into_iter()
            .flatten()
            .filter_map(|hash| inner.transactions.get(hash))
            .map(|pooled| pooled.nonce() + 1)
            .max())
    }

    /// Pending transactions matching `filter`, grouped by sender and sorted
    /// by nonce, ready for a block producer to drain.
    pub fn filter_pool_transactions(
        &self,
        filter: &PendingTxFilter,
    ) -> Result<HashMap<Address, Vec<Transaction>>, MempoolError> {
        let inner = self.read()?;
        let mut txs_by_sender: HashMap<Address, Vec<Transaction>> = HashMap::new();
        for pooled in inner.transactions.values() {
            if filter.matches(&pooled.transaction) {
                txs_by_sender
                    .entry(pooled.sender)
                    .or_default()
                    .push(pooled.transaction.clone());
            }
        }
        for transactions in txs_by_sender.values_mut() {
            transactions.sort_by_key(Transaction::nonce);
        }
        Ok(txs_by_sender)
    }

    /// Hashes from `possible_hashes` that are not already pooled.
    pub fn filter_unknown_transactions(
        &self,
        possible_hashes: &[H256],
    ) -> Result<Vec<H256>, MempoolError> {
        let inner = self.read()?;
        Ok(possible_hashes
            .iter()
            .filter(|hash| !inner.transactions.contains_key(hash))
            .copied()
            .collect())
    }

    pub fn supports_blobs(&self) -> bool {
        self.config.blobs_support != BlobsSupport::Disabled
    }

    pub fn accept_tx_when_not_synced(&self) -> bool {
        self.config.accept_tx_when_not_synced
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MempoolInner>, MempoolError> {
        self.inner
            .read()
            .map_err(|err| MempoolError::LockPoisoned(err.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MempoolInner>, MempoolError> {
        self.inner
            .write()
            .map_err(|err| MempoolError::LockPoisoned(err.to_string()))
    }
}

impl MempoolInner {
    fn insert(
        &mut self,
        incoming: PooledTransaction,
        config: &MempoolConfig,
    ) -> Result<AddOutcome, MempoolError> {
        if self.transactions.contains_key(&incoming.hash) {
            return Ok(AddOutcome::AlreadyKnown {
                hash: incoming.hash,
            });
        }

        // A live transaction from the same sender with the same nonce either
        // blocks the newcomer or gets displaced by it.
        let competing = self
            .sender_index
            .get(&incoming.sender)
            .into_iter()
            .flatten()
            .filter_map(|hash| self.transactions.get(hash))
            .find(|existing| existing.nonce() == incoming.nonce());
        let replaced = match competing {
            Some(existing) => {
                if !replacement_allowed(&incoming.transaction, &existing.transaction) {
                    return Err(MempoolError::ReplacementNotAllowed {
                        incoming: incoming.hash,
                        existing: existing.hash,
                    });
                }
                Some(existing.hash)
            }
            None => None,
        };
        let replaced_count = usize::from(replaced.is_some());

        // Capacity and per-sender limits measured against the state the pool
        // would be in after the displacement, so a valid replacement lands
        // even in a saturated pool.
        if config.size > 0 && self.transactions.len() - replaced_count >= config.size as usize {
            return Err(MempoolError::PoolFull);
        }
        if incoming.is_blob {
            if config.max_pending_blob_txs_per_sender > 0 {
                let held = self
                    .blob_sender_index
                    .get(&incoming.sender)
                    .map_or(0, HashSet::len)
                    - replaced_count;
                if held >= config.max_pending_blob_txs_per_sender as usize {
                    return Err(MempoolError::BlobSenderLimitExceeded);
                }
            }
        } else if config.max_pending_txs_per_sender > 0 {
            let held = self
                .sender_index
                .get(&incoming.sender)
                .map_or(0, HashSet::len)
                - replaced_count;
            if held >= config.max_pending_txs_per_sender as usize {
                return Err(MempoolError::SenderLimitExceeded);
            }
        }

        if let Some(existing_hash) = replaced {
            self.remove(&existing_hash);
            debug!(%existing_hash, incoming = %incoming.hash, "Replaced pooled transaction");
        }

        let hash = incoming.hash;
        let is_blob = incoming.is_blob;
        let sender = incoming.sender;
        self.sender_index.entry(sender).or_default().insert(hash);
        if is_blob {
            self.blob_transactions.insert(hash);
            self.blob_sender_index.entry(sender).or_default().insert(hash);
        }
        self.sender_by_hash.insert(hash, sender);
        self.transactions.insert(hash, incoming);

        debug!(%hash, is_blob, "Transaction added to mempool");
        Ok(AddOutcome::Added { hash, is_blob })
    }

    fn remove(&mut self, hash: &H256) -> bool {
        if self.transactions.remove(hash).is_none() {
            return false;
        }
        if let Some(sender) = self.sender_by_hash.remove(hash) {
            if let Some(hashes) = self.sender_index.get_mut(&sender) {
                hashes.remove(hash);
                if hashes.is_empty() {
                    self.sender_index.remove(&sender);
                }
            }
            if let Some(hashes) = self.blob_sender_index.get_mut(&sender) {
                hashes.remove(hash);
                if hashes.is_empty() {
                    self.blob_sender_index.remove(&sender);
                }
            }
        }
        self.blob_transactions.remove(hash);
        true
    }
}
