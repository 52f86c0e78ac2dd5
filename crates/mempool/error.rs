use vesper_common::H256;

#[derive(Debug, thiserror::Error)]
pub enum MempoolError {
    #[error("Invalid mempool configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Failed to decode transaction: {0}")]
    EncodingFailed(String),
    #[error("Transaction sender recovery failed: {0}")]
    SenderRecoveryFailed(String),
    #[error("Transaction gas limit exceeded")]
    GasLimitExceeded,
    #[error("Transaction max size exceeded")]
    MaxTxSizeExceeded,
    #[error("Blob transaction max size exceeded")]
    MaxBlobTxSizeExceeded,
    #[error("Blob transactions are not supported by this pool")]
    BlobSupportDisabled,
    #[error("Blob transaction priority fee below the pool minimum")]
    PriorityFeeTooLow,
    #[error("Blob transaction fee cap below the current blob base fee")]
    BlobFeeCapTooLow,
    #[error("Transaction type not available at the active fork")]
    UnsupportedTransactionType,
    #[error("Transaction nonce overflows")]
    NonceOverflow,
    #[error("Transaction max init code size exceeded")]
    InitCodeTooLarge,
    #[error("Transaction gas limit below its intrinsic gas cost")]
    InsufficientGas,
    #[error("Transaction pool is full")]
    PoolFull,
    #[error("Sender reached the pending transaction limit")]
    SenderLimitExceeded,
    #[error("Sender reached the pending blob transaction limit")]
    BlobSenderLimitExceeded,
    #[error("Attempted to replace pooled transaction {existing:#x} with underpriced {incoming:#x}")]
    ReplacementNotAllowed { incoming: H256, existing: H256 },
    #[error("Transaction gas price below base fee")]
    GasPriceBelowBaseFee,
    #[error("Transaction max fee per gas below base fee")]
    InsufficientMaxFeePerGas,
    #[error("Transaction priority fee above gas fee cap")]
    PriorityFeeGreaterThanMaxFee,
    #[error("Mempool lock poisoned: {0}")]
    LockPoisoned(String),
}
