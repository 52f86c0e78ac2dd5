pub mod backend;
pub mod errors;
pub mod host;
pub mod journal;
pub mod world_state;

pub use backend::{BackendError, InMemoryBackend, StateBackend};
pub use errors::StateError;
pub use host::{Host, StateHost};
pub use journal::{ChangeTag, EMPTY_POSITION, Journal, JournalEntry, JournalError, JournalPosition};
pub use world_state::{
    AccountJournal, CreatedAccounts, Scope, StateSnapshot, StorageJournal, WorldState,
};
