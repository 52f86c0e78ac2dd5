use serde::{Deserialize, Serialize};
use vesper_common::U256;

use crate::{
    constants::{
        DEFAULT_MAX_BLOB_TX_SIZE, DEFAULT_MAX_PENDING_BLOB_TXS_PER_SENDER, DEFAULT_MAX_TX_SIZE,
        DEFAULT_POOL_SIZE,
    },
    error::MempoolError,
};

/// How blob transactions and their sidecars are handled by the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobsSupport {
    /// Blob transactions are rejected outright.
    Disabled,
    InMemory,
    Storage,
    #[default]
    StorageWithReorgs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Global capacity; 0 means unlimited.
    pub size: u32,
    pub blobs_support: BlobsSupport,
    /// Per-sender cap for non-blob transactions; 0 means unlimited.
    pub max_pending_txs_per_sender: u32,
    /// Per-sender cap for blob transactions; 0 means unlimited.
    pub max_pending_blob_txs_per_sender: u32,
    /// Upper bound on a transaction's gas limit, on top of the head's block
    /// gas limit.
    pub gas_limit: Option<u64>,
    pub max_tx_size: Option<u32>,
    pub max_blob_tx_size: Option<u32>,
    /// Floor on a blob transaction's `max_priority_fee_per_gas`.
    pub min_blob_tx_priority_fee: u64,
    /// Reject blob transactions whose blob fee cap is below the head's
    /// current blob base fee.
    pub current_blob_base_fee_required: bool,
    pub accept_tx_when_not_synced: bool,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            blobs_support: BlobsSupport::default(),
            max_pending_txs_per_sender: 0,
            max_pending_blob_txs_per_sender: DEFAULT_MAX_PENDING_BLOB_TXS_PER_SENDER,
            gas_limit: None,
            max_tx_size: Some(DEFAULT_MAX_TX_SIZE),
            max_blob_tx_size: Some(DEFAULT_MAX_BLOB_TX_SIZE),
            min_blob_tx_priority_fee: 0,
            current_blob_base_fee_required: true,
            accept_tx_when_not_synced: false,
        }
    }
}

impl MempoolConfig {
    /// Bounds are expressed as `None` for "unlimited"; a present-but-zero
    /// bound would admit nothing and is a configuration mistake.
    pub fn validate(&self) -> Result<(), MempoolError> {
        if self.gas_limit == Some(0) {
            return Err(MempoolError::InvalidConfig(
                "gas_limit must be positive when set".to_string(),
            ));
        }
        if self.max_tx_size == Some(0) {
            return Err(MempoolError::InvalidConfig(
                "max_tx_size must be positive when set".to_string(),
            ));
        }
        if self.max_blob_tx_size == Some(0) {
            return Err(MempoolError::InvalidConfig(
                "max_blob_tx_size must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chain-head inputs the admission pipeline depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadInfo {
    pub block_gas_limit: Option<u64>,
    pub current_fee_per_blob_gas: U256,
}
