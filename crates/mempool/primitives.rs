use vesper_common::{Address, H256, types::Transaction};

#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Signature error: {0}")]
    Signature(String),
}

/// Pure transaction primitives supplied by an embedder: wire decoding,
/// canonical hashing, and signature recovery all live outside this crate.
///
/// The pool relies only on their contracts: `hash` and `recover_sender` are
/// deterministic functions of the transaction content, and `encoded_size`
/// matches the length of the canonical encoding.
pub trait TransactionPrimitives: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<Transaction, PrimitivesError>;
    fn encoded_size(&self, transaction: &Transaction) -> usize;
    fn hash(&self, transaction: &Transaction) -> H256;
    fn recover_sender(&self, transaction: &Transaction) -> Result<Address, PrimitivesError>;
}
