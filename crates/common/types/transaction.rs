use bytes::Bytes;

use crate::{
    Address, H256, U256,
    types::{
        Fork,
        tx_fields::{AccessList, AuthorizationList},
    },
};

/// Destination of a transaction: a message call or a contract creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    Legacy,
    EIP2930,
    EIP1559,
    EIP4844,
    EIP7702,
}

impl TxType {
    /// First fork at which this transaction type is valid on chain.
    pub fn introduced_in(&self) -> Fork {
        match self {
            TxType::Legacy => Fork::Frontier,
            TxType::EIP2930 => Fork::Berlin,
            TxType::EIP1559 => Fork::London,
            TxType::EIP4844 => Fork::Cancun,
            TxType::EIP7702 => Fork::Prague,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EIP2930Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EIP1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
}

/// Blob transactions always target an existing address and carry at least one
/// versioned hash; both are checked at admission, not construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EIP4844Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub max_fee_per_blob_gas: U256,
    pub blob_versioned_hashes: Vec<H256>,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EIP7702Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub authorization_list: AuthorizationList,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    LegacyTransaction(LegacyTransaction),
    EIP2930Transaction(EIP2930Transaction),
    EIP1559Transaction(EIP1559Transaction),
    EIP4844Transaction(EIP4844Transaction),
    EIP7702Transaction(EIP7702Transaction),
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        match self {
            Transaction::LegacyTransaction(_) => TxType::Legacy,
            Transaction::EIP2930Transaction(_) => TxType::EIP2930,
            Transaction::EIP1559Transaction(_) => TxType::EIP1559,
            Transaction::EIP4844Transaction(_) => TxType::EIP4844,
            Transaction::EIP7702Transaction(_) => TxType::EIP7702,
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.nonce,
            Transaction::EIP2930Transaction(tx) => tx.nonce,
            Transaction::EIP1559Transaction(tx) => tx.nonce,
            Transaction::EIP4844Transaction(tx) => tx.nonce,
            Transaction::EIP7702Transaction(tx) => tx.nonce,
        }
    }

    pub fn gas_limit(&self) -> u64 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.gas_limit,
            Transaction::EIP2930Transaction(tx) => tx.gas_limit,
            Transaction::EIP1559Transaction(tx) => tx.gas_limit,
            Transaction::EIP4844Transaction(tx) => tx.gas_limit,
            Transaction::EIP7702Transaction(tx) => tx.gas_limit,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Transaction::LegacyTransaction(_) => None,
            Transaction::EIP2930Transaction(tx) => Some(tx.chain_id),
            Transaction::EIP1559Transaction(tx) => Some(tx.chain_id),
            Transaction::EIP4844Transaction(tx) => Some(tx.chain_id),
            Transaction::EIP7702Transaction(tx) => Some(tx.chain_id),
        }
    }

    pub fn to(&self) -> TxKind {
        match self {
            Transaction::LegacyTransaction(tx) => tx.to.clone(),
            Transaction::EIP2930Transaction(tx) => tx.to.clone(),
            Transaction::EIP1559Transaction(tx) => tx.to.clone(),
            Transaction::EIP4844Transaction(tx) => TxKind::Call(tx.to),
            Transaction::EIP7702Transaction(tx) => TxKind::Call(tx.to),
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.value,
            Transaction::EIP2930Transaction(tx) => tx.value,
            Transaction::EIP1559Transaction(tx) => tx.value,
            Transaction::EIP4844Transaction(tx) => tx.value,
            Transaction::EIP7702Transaction(tx) => tx.value,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            Transaction::LegacyTransaction(tx) => &tx.data,
            Transaction::EIP2930Transaction(tx) => &tx.data,
            Transaction::EIP1559Transaction(tx) => &tx.data,
            Transaction::EIP4844Transaction(tx) => &tx.data,
            Transaction::EIP7702Transaction(tx) => &tx.data,
        }
    }

    pub fn access_list(&self) -> &[crate::types::tx_fields::AccessListItem] {
        match self {
            Transaction::LegacyTransaction(_) => &[],
            Transaction::EIP2930Transaction(tx) => &tx.access_list,
            Transaction::EIP1559Transaction(tx) => &tx.access_list,
            Transaction::EIP4844Transaction(tx) => &tx.access_list,
            Transaction::EIP7702Transaction(tx) => &tx.access_list,
        }
    }

    /// Fixed gas price for the pre-1559 families.
    pub fn gas_price(&self) -> Option<u64> {
        match self {
            Transaction::LegacyTransaction(tx) => Some(tx.gas_price),
            Transaction::EIP2930Transaction(tx) => Some(tx.gas_price),
            _ => None,
        }
    }

    pub fn max_fee_per_gas(&self) -> Option<u64> {
        match self {
            Transaction::EIP1559Transaction(tx) => Some(tx.max_fee_per_gas),
            Transaction::EIP4844Transaction(tx) => Some(tx.max_fee_per_gas),
            Transaction::EIP7702Transaction(tx) => Some(tx.max_fee_per_gas),
            _ => None,
        }
    }

    pub fn max_priority_fee(&self) -> Option<u64> {
        match self {
            Transaction::EIP1559Transaction(tx) => Some(tx.max_priority_fee_per_gas),
            Transaction::EIP4844Transaction(tx) => Some(tx.max_priority_fee_per_gas),
            Transaction::EIP7702Transaction(tx) => Some(tx.max_priority_fee_per_gas),
            _ => None,
        }
    }

    pub fn max_fee_per_blob_gas(&self) -> Option<U256> {
        match self {
            Transaction::EIP4844Transaction(tx) => Some(tx.max_fee_per_blob_gas),
            _ => None,
        }
    }

    pub fn blob_versioned_hashes(&self) -> &[H256] {
        match self {
            Transaction::EIP4844Transaction(tx) => &tx.blob_versioned_hashes,
            _ => &[],
        }
    }

    pub fn authorization_list(&self) -> Option<&AuthorizationList> {
        match self {
            Transaction::EIP7702Transaction(tx) => Some(&tx.authorization_list),
            _ => None,
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        matches!(self.to(), TxKind::Create)
    }

    /// Gas actually paid to the proposer on top of the base fee.
    ///
    /// Returns `None` when the fee cap cannot cover the base fee, in which
    /// case the transaction is not includable at this base fee.
    pub fn effective_gas_tip(&self, base_fee: Option<u64>) -> Option<u64> {
        let (max_fee, max_priority) = self.normalized_fees();
        match base_fee {
            None => Some(max_priority),
            Some(base) => max_fee
                .checked_sub(base)
                .map(|fee_gap| max_priority.min(fee_gap)),
        }
    }

    /// `(max_fee, max_priority)` under EIP-1559 semantics; legacy families
    /// bid their whole gas price in both dimensions.
    pub fn normalized_fees(&self) -> (u64, u64) {
        match (self.gas_price(), self.max_fee_per_gas(), self.max_priority_fee()) {
            (Some(gas_price), _, _) => (gas_price, gas_price),
            (None, Some(max_fee), Some(max_priority)) => {
                if max_fee == 0 && max_priority == 0 {
                    (0, 0)
                } else {
                    (max_fee, max_priority)
                }
            }
            _ => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_1559(max_priority: u64, max_fee: u64) -> Transaction {
        Transaction::EIP1559Transaction(EIP1559Transaction {
            nonce: 0,
            max_priority_fee_per_gas: max_priority,
            max_fee_per_gas: max_fee,
            gas_limit: 100_000,
            to: TxKind::Call(Address::zero()),
            ..Default::default()
        })
    }

    #[test]
    fn tx_types_map_to_introducing_forks() {
        assert_eq!(TxType::Legacy.introduced_in(), Fork::Frontier);
        assert_eq!(TxType::EIP2930.introduced_in(), Fork::Berlin);
        assert_eq!(TxType::EIP1559.introduced_in(), Fork::London);
        assert_eq!(TxType::EIP4844.introduced_in(), Fork::Cancun);
        assert_eq!(TxType::EIP7702.introduced_in(), Fork::Prague);
    }

    #[test]
    fn legacy_bids_gas_price_in_both_dimensions() {
        let tx = Transaction::LegacyTransaction(LegacyTransaction {
            gas_price: 7,
            gas_limit: 21_000,
            to: TxKind::Call(Address::zero()),
            ..Default::default()
        });
        assert_eq!(tx.normalized_fees(), (7, 7));
        assert_eq!(tx.effective_gas_tip(None), Some(7));
        assert_eq!(tx.effective_gas_tip(Some(3)), Some(4));
        assert_eq!(tx.effective_gas_tip(Some(8)), None);
    }

    #[test]
    fn dynamic_tip_is_capped_by_fee_gap() {
        let tx = transfer_1559(2, 10);
        assert_eq!(tx.effective_gas_tip(Some(9)), Some(1));
        assert_eq!(tx.effective_gas_tip(Some(5)), Some(2));
        assert_eq!(tx.effective_gas_tip(Some(11)), None);
        assert_eq!(tx.effective_gas_tip(None), Some(2));
    }

    #[test]
    fn blob_tx_always_calls() {
        let tx = Transaction::EIP4844Transaction(EIP4844Transaction {
            to: Address::repeat_byte(0x11),
            blob_versioned_hashes: vec![H256::zero()],
            ..Default::default()
        });
        assert!(!tx.is_contract_creation());
        assert_eq!(tx.blob_versioned_hashes().len(), 1);
        assert_eq!(tx.tx_type(), TxType::EIP4844);
    }
}
