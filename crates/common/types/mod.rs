mod account;
mod fork;
mod transaction;
pub mod tx_fields;

pub use account::{Account, is_account_alive};
pub use fork::Fork;
pub use transaction::{
    EIP1559Transaction, EIP2930Transaction, EIP4844Transaction, EIP7702Transaction,
    LegacyTransaction, Transaction, TxKind, TxType,
};
