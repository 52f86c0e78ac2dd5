//! Admission pipeline deciding whether a signed transaction may enter the
//! pending pool.
//!
//! The pipeline is a pure function of the transaction, the active fork, the
//! pool configuration, and the chain head; the first failing check
//! short-circuits. Pool-state concerns (known hashes, replacement, capacity)
//! are the pool's own business and happen after validation.

use vesper_common::{
    Address, H256,
    constants::MAX_INITCODE_SIZE,
    types::{Fork, Transaction, TxType},
};

use crate::{
    config::{BlobsSupport, HeadInfo, MempoolConfig},
    constants::{
        TX_ACCESS_LIST_ADDRESS_GAS, TX_ACCESS_LIST_STORAGE_KEY_GAS, TX_CREATE_GAS_COST,
        TX_DATA_NON_ZERO_GAS, TX_DATA_NON_ZERO_GAS_EIP2028, TX_DATA_ZERO_GAS_COST, TX_GAS_COST,
        TX_INIT_CODE_WORD_GAS_COST,
    },
    error::MempoolError,
    primitives::TransactionPrimitives,
};

/// A transaction that passed admission, ready to be indexed by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledTransaction {
    pub transaction: Transaction,
    pub hash: H256,
    pub sender: Address,
    pub is_blob: bool,
    /// Length of the canonical encoding in bytes.
    pub size: usize,
}

impl PooledTransaction {
    pub fn nonce(&self) -> u64 {
        self.transaction.nonce()
    }
}

pub fn validate_transaction(
    transaction: &Transaction,
    fork: Fork,
    config: &MempoolConfig,
    head: &HeadInfo,
    primitives: &dyn TransactionPrimitives,
) -> Result<PooledTransaction, MempoolError> {
    validate_schema(transaction)?;
    validate_against_fork(transaction, fork)?;

    let is_blob = transaction.tx_type() == TxType::EIP4844;
    if is_blob {
        if config.blobs_support == BlobsSupport::Disabled {
            return Err(MempoolError::BlobSupportDisabled);
        }
        if transaction.max_priority_fee().unwrap_or(0) < config.min_blob_tx_priority_fee {
            return Err(MempoolError::PriorityFeeTooLow);
        }
        if config.current_blob_base_fee_required
            && transaction.max_fee_per_blob_gas().unwrap_or_default()
                < head.current_fee_per_blob_gas
        {
            return Err(MempoolError::BlobFeeCapTooLow);
        }
    }

    // A priority fee bidding past its own fee cap can never be paid out.
    if let (Some(max_priority), Some(max_fee)) =
        (transaction.max_priority_fee(), transaction.max_fee_per_gas())
        && max_priority > max_fee
    {
        return Err(MempoolError::PriorityFeeGreaterThanMaxFee);
    }

    // Tighter of the head's block gas limit and the configured bound.
    let effective_gas_limit = match (head.block_gas_limit, config.gas_limit) {
        (Some(block_limit), Some(config_limit)) => Some(block_limit.min(config_limit)),
        (block_limit, config_limit) => block_limit.or(config_limit),
    };
    if let Some(limit) = effective_gas_limit
        && transaction.gas_limit() > limit
    {
        return Err(MempoolError::GasLimitExceeded);
    }

    // The limit must at least pay for the transaction's own overhead.
    if transaction.gas_limit() < transaction_intrinsic_gas(transaction, fork)? {
        return Err(MempoolError::InsufficientGas);
    }

    let size = primitives.encoded_size(transaction);
    if is_blob {
        if let Some(max_size) = config.max_blob_tx_size
            && size > max_size as usize
        {
            return Err(MempoolError::MaxBlobTxSizeExceeded);
        }
    } else if let Some(max_size) = config.max_tx_size
        && size > max_size as usize
    {
        return Err(MempoolError::MaxTxSizeExceeded);
    }

    let sender = primitives
        .recover_sender(transaction)
        .map_err(|err| MempoolError::SenderRecoveryFailed(err.to_string()))?;
    let hash = primitives.hash(transaction);

    Ok(PooledTransaction {
        transaction: transaction.clone(),
        hash,
        sender,
        is_blob,
        size,
    })
}

/// Structural well-formedness of the decoded transaction.
fn validate_schema(transaction: &Transaction) -> Result<(), MempoolError> {
    if transaction.tx_type() == TxType::EIP4844 && transaction.blob_versioned_hashes().is_empty() {
        return Err(MempoolError::InvalidTransaction(
            "blob transaction without versioned hashes".to_string(),
        ));
    }
    if let Some(authorizations) = transaction.authorization_list()
        && authorizations.is_empty()
    {
        return Err(MempoolError::InvalidTransaction(
            "set-code transaction with an empty authorization list".to_string(),
        ));
    }
    Ok(())
}

/// Fork-availability gating, independent of pool admission: the type must
/// exist at the active fork, the nonce must leave room to grow, and
/// contract-creation init code is capped from Shanghai on.
pub fn validate_against_fork(transaction: &Transaction, fork: Fork) -> Result<(), MempoolError> {
    if fork < transaction.tx_type().introduced_in() {
        return Err(MempoolError::UnsupportedTransactionType);
    }
    if transaction.nonce() == u64::MAX {
        return Err(MempoolError::NonceOverflow);
    }
    if fork >= Fork::Shanghai
        && transaction.is_contract_creation()
        && transaction.data().len() > MAX_INITCODE_SIZE
    {
        return Err(MempoolError::InitCodeTooLarge);
    }
    Ok(())
}

/// Gas charged before the first opcode runs, as a function of the
/// transaction shape and the active fork.
pub fn transaction_intrinsic_gas(
    transaction: &Transaction,
    fork: Fork,
) -> Result<u64, MempoolError> {
    let is_contract_creation = transaction.is_contract_creation();

    let mut gas = if is_contract_creation {
        TX_CREATE_GAS_COST
    } else {
        TX_GAS_COST
    };

    let data_len = transaction.data().len() as u64;

    if data_len > 0 {
        let non_zero_gas_cost = if fork >= Fork::Istanbul {
            TX_DATA_NON_ZERO_GAS_EIP2028
        } else {
            TX_DATA_NON_ZERO_GAS
        };

        let non_zero_count = transaction.data().iter().filter(|&&byte| byte != 0u8).count() as u64;

        gas = gas
            .checked_add(non_zero_count * non_zero_gas_cost)
            .ok_or_else(intrinsic_gas_overflow)?;

        let zero_count = data_len - non_zero_count;

        gas = gas
            .checked_add(zero_count * TX_DATA_ZERO_GAS_COST)
            .ok_or_else(intrinsic_gas_overflow)?;

        if is_contract_creation && fork >= Fork::Shanghai {
            // EIP-3860 charges per 32-byte word of init code, rounding up.
            let len_in_words = data_len.saturating_add(31) / 32;

            gas = gas
                .checked_add(len_in_words * TX_INIT_CODE_WORD_GAS_COST)
                .ok_or_else(intrinsic_gas_overflow)?;
        }
    }

    let storage_keys_count: u64 = transaction
        .access_list()
        .iter()
        .map(|(_, keys)| keys.len() as u64)
        .sum();

    gas = gas
        .checked_add(transaction.access_list().len() as u64 * TX_ACCESS_LIST_ADDRESS_GAS)
        .ok_or_else(intrinsic_gas_overflow)?;

    gas = gas
        .checked_add(storage_keys_count * TX_ACCESS_LIST_STORAGE_KEY_GAS)
        .ok_or_else(intrinsic_gas_overflow)?;

    Ok(gas)
}

fn intrinsic_gas_overflow() -> MempoolError {
    MempoolError::InvalidTransaction("intrinsic gas overflow".to_string())
}
