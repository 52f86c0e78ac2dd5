use crate::{
    H256, U256,
    constants::{EMPTY_KECCACK_HASH, EMPTY_TRIE_HASH},
};

/// In-memory view of an on-chain account during execution.
///
/// `storage_root` is an opaque commitment over the account's storage map; it
/// stays at [`EMPTY_TRIE_HASH`] until storage has ever been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: H256,
    pub storage_root: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            code_hash: EMPTY_KECCACK_HASH,
            storage_root: EMPTY_TRIE_HASH,
        }
    }
}

impl Account {
    pub fn new(nonce: u64, balance: U256, code_hash: H256) -> Self {
        Self {
            nonce,
            balance,
            code_hash,
            storage_root: EMPTY_TRIE_HASH,
        }
    }

    /// EIP-161 emptiness: no nonce, no balance, no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_KECCACK_HASH
    }

    /// Empty and never had storage written either.
    pub fn is_totally_empty(&self) -> bool {
        self.is_empty() && self.storage_root == EMPTY_TRIE_HASH
    }

    pub fn has_code_or_nonce(&self) -> bool {
        self.nonce != 0 || self.code_hash != EMPTY_KECCACK_HASH
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_KECCACK_HASH
    }
}

/// An account counts as alive when it exists and is not totally empty.
pub fn is_account_alive(account: Option<&Account>) -> bool {
    account.is_some_and(|acc| !acc.is_totally_empty())
}
