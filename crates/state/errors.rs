use vesper_common::H256;

use crate::{backend::BackendError, journal::JournalError};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
    #[error("State backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Bytecode not found for code hash {0:#x}")]
    MissingCode(H256),
}
