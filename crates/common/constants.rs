use crate::H256;
use hex_literal::hex;

/// Keccak-256 of the empty byte string. An account whose `code_hash` equals
/// this value carries no code.
pub const EMPTY_KECCACK_HASH: H256 = H256(hex!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
));

/// Root of the empty storage trie. Distinguishes "never written" from
/// "explicitly zeroed" storage.
pub const EMPTY_TRIE_HASH: H256 = H256(hex!(
    "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
));

// === EIP-4844 constants ===

/// Gas consumption of a single data blob (== blob byte size).
pub const GAS_PER_BLOB: u64 = 1 << 17;

// Minimum base fee per blob
pub const MIN_BASE_FEE_PER_BLOB_GAS: u64 = 1;

// === EIP-3860 ===

/// Maximum init code size for contract-creation transactions from Shanghai on.
pub const MAX_INITCODE_SIZE: usize = 49152;
