// === Intrinsic gas ===

pub const TX_GAS_COST: u64 = 21000;
pub const TX_CREATE_GAS_COST: u64 = 53000;
pub const TX_DATA_ZERO_GAS_COST: u64 = 4;
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;
pub const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2400;
pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1900;
pub const TX_INIT_CODE_WORD_GAS_COST: u64 = 2;

// === Replacement pricing ===

/// Minimum fee bump, in percent, for replacing a pending transaction.
pub const MIN_PRICE_BUMP_PERCENTAGE: u64 = 10;
/// Minimum fee bump, in percent, for every dimension of a blob replacement.
pub const BLOB_PRICE_BUMP_PERCENTAGE: u64 = 100;

// === Pool defaults ===

pub const DEFAULT_POOL_SIZE: u32 = 2048;
pub const DEFAULT_MAX_PENDING_BLOB_TXS_PER_SENDER: u32 = 16;
pub const DEFAULT_MAX_TX_SIZE: u32 = 128 * 1024;
pub const DEFAULT_MAX_BLOB_TX_SIZE: u32 = 1024 * 1024;
