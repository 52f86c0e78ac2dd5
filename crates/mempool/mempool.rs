pub mod config;
pub mod constants;
pub mod error;
pub mod fees;
pub mod pool;
pub mod primitives;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{BlobsSupport, HeadInfo, MempoolConfig};
pub use error::MempoolError;
pub use pool::{AddOutcome, Mempool, PendingTxFilter};
pub use primitives::{PrimitivesError, TransactionPrimitives};
pub use validation::{PooledTransaction, validate_transaction};
