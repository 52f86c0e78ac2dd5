//! Deterministic fixtures shared by the mempool tests.
//!
//! Real wire encoding and signature recovery live outside this crate; the
//! tests stand them in with a byte-packing codec and a signer whose identity
//! is the low word of the signature's `r` value, so every fixture "signed"
//! with the same `r` shares a sender.

use bytes::Bytes;
use keccak_hash::keccak;
use vesper_common::{
    Address, H256, U256,
    types::{
        EIP1559Transaction, EIP4844Transaction, LegacyTransaction, Transaction, TxKind, TxType,
    },
};

use crate::primitives::{PrimitivesError, TransactionPrimitives};

/// The fixed key every fixture is signed with unless stated otherwise.
pub const DEFAULT_SIGNER: u64 = 0xbeef;

pub fn sender_of(signer: u64) -> Address {
    Address::from_low_u64_be(signer)
}

pub fn default_sender() -> Address {
    sender_of(DEFAULT_SIGNER)
}

pub fn signed_legacy(nonce: u64, gas_price: u64) -> Transaction {
    Transaction::LegacyTransaction(LegacyTransaction {
        nonce,
        gas_price,
        gas_limit: 100_000,
        to: TxKind::Call(Address::zero()),
        r: U256::from(DEFAULT_SIGNER),
        s: U256::one(),
        ..Default::default()
    })
}

pub fn signed_1559(nonce: u64, max_priority: u64, max_fee: u64, gas_limit: u64) -> Transaction {
    signed_1559_by(DEFAULT_SIGNER, nonce, max_priority, max_fee, gas_limit)
}

pub fn signed_1559_by(
    signer: u64,
    nonce: u64,
    max_priority: u64,
    max_fee: u64,
    gas_limit: u64,
) -> Transaction {
    Transaction::EIP1559Transaction(EIP1559Transaction {
        chain_id: 1,
        nonce,
        max_priority_fee_per_gas: max_priority,
        max_fee_per_gas: max_fee,
        gas_limit,
        to: TxKind::Call(Address::zero()),
        signature_r: U256::from(signer),
        signature_s: U256::one(),
        ..Default::default()
    })
}

pub fn signed_create_1559(
    nonce: u64,
    max_priority: u64,
    max_fee: u64,
    gas_limit: u64,
    init_code: Vec<u8>,
) -> Transaction {
    Transaction::EIP1559Transaction(EIP1559Transaction {
        chain_id: 1,
        nonce,
        max_priority_fee_per_gas: max_priority,
        max_fee_per_gas: max_fee,
        gas_limit,
        to: TxKind::Create,
        data: Bytes::from(init_code),
        signature_r: U256::from(DEFAULT_SIGNER),
        signature_s: U256::one(),
        ..Default::default()
    })
}

pub fn signed_blob(
    nonce: u64,
    max_priority: u64,
    max_fee: u64,
    blob_fee: u64,
    blob_count: usize,
) -> Transaction {
    Transaction::EIP4844Transaction(EIP4844Transaction {
        chain_id: 1,
        nonce,
        max_priority_fee_per_gas: max_priority,
        max_fee_per_gas: max_fee,
        gas_limit: 100_000,
        to: Address::repeat_byte(0x42),
        max_fee_per_blob_gas: U256::from(blob_fee),
        blob_versioned_hashes: vec![H256::repeat_byte(0x01); blob_count],
        signature_r: U256::from(DEFAULT_SIGNER),
        signature_s: U256::one(),
        ..Default::default()
    })
}

/// Stand-in for the external primitives module.
pub struct TestPrimitives;

/// Field-by-field packing used as the "canonical encoding" in tests.
fn packed(transaction: &Transaction) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(match transaction.tx_type() {
        TxType::Legacy => 0x00,
        TxType::EIP2930 => 0x01,
        TxType::EIP1559 => 0x02,
        TxType::EIP4844 => 0x03,
        TxType::EIP7702 => 0x04,
    });
    out.extend_from_slice(&transaction.nonce().to_be_bytes());
    out.extend_from_slice(&transaction.gas_limit().to_be_bytes());
    let (max_fee, max_priority) = transaction.normalized_fees();
    out.extend_from_slice(&max_fee.to_be_bytes());
    out.extend_from_slice(&max_priority.to_be_bytes());
    match transaction.to() {
        TxKind::Call(address) => {
            out.push(0x01);
            out.extend_from_slice(address.as_bytes());
        }
        TxKind::Create => out.push(0x00),
    }
    out.extend_from_slice(&transaction.value().to_big_endian());
    out.extend_from_slice(transaction.data());
    if let Some(blob_fee) = transaction.max_fee_per_blob_gas() {
        out.extend_from_slice(&blob_fee.to_big_endian());
    }
    for hash in transaction.blob_versioned_hashes() {
        out.extend_from_slice(hash.as_bytes());
    }
    out
}

fn signature_r(transaction: &Transaction) -> U256 {
    match transaction {
        Transaction::LegacyTransaction(tx) => tx.r,
        Transaction::EIP2930Transaction(tx) => tx.signature_r,
        Transaction::EIP1559Transaction(tx) => tx.signature_r,
        Transaction::EIP4844Transaction(tx) => tx.signature_r,
        Transaction::EIP7702Transaction(tx) => tx.signature_r,
    }
}

impl TransactionPrimitives for TestPrimitives {
    fn decode(&self, raw: &[u8]) -> Result<Transaction, PrimitivesError> {
        // type byte + nonce + gas price + gas limit, legacy only.
        if raw.len() != 25 || raw[0] != 0x00 {
            return Err(PrimitivesError::Encoding(
                "unknown transaction encoding".to_string(),
            ));
        }
        let word = |index: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&raw[index..index + 8]);
            u64::from_be_bytes(bytes)
        };
        Ok(Transaction::LegacyTransaction(LegacyTransaction {
            nonce: word(1),
            gas_price: word(9),
            gas_limit: word(17),
            to: TxKind::Call(Address::zero()),
            r: U256::from(DEFAULT_SIGNER),
            s: U256::one(),
            ..Default::default()
        }))
    }

    fn encoded_size(&self, transaction: &Transaction) -> usize {
        packed(transaction).len()
    }

    fn hash(&self, transaction: &Transaction) -> H256 {
        keccak(packed(transaction))
    }

    fn recover_sender(&self, transaction: &Transaction) -> Result<Address, PrimitivesError> {
        let r = signature_r(transaction);
        if r.is_zero() {
            return Err(PrimitivesError::Signature(
                "signature recovery failed".to_string(),
            ));
        }
        Ok(Address::from_low_u64_be(r.low_u64()))
    }
}

/// Encoding accepted by [`TestPrimitives::decode`].
pub fn encode_legacy(nonce: u64, gas_price: u64, gas_limit: u64) -> Vec<u8> {
    let mut out = vec![0x00];
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(&gas_price.to_be_bytes());
    out.extend_from_slice(&gas_limit.to_be_bytes());
    out
}
