pub mod constants;
pub mod types;

pub use ethereum_types::{H160, H256, U256};

/// 20-byte account identifier.
pub type Address = H160;
