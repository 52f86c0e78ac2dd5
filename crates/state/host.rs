//! Non-fallible read/write surface consumed by the EVM interpreter.
//!
//! The interpreter's host contract has no error channel: absent state reads
//! as type defaults, and an actual lower-layer failure (backend I/O error,
//! corruption) is consensus-critical. Converting such a failure into a
//! default value would silently diverge state, so the adapter halts instead.

use bytes::Bytes;
use tracing::error;
use vesper_common::{Address, H256, U256};

use crate::{errors::StateError, world_state::WorldState};

/// Capability set the interpreter executes against.
pub trait Host {
    fn get_balance(&mut self, address: Address) -> U256;
    fn get_nonce(&mut self, address: Address) -> u64;
    fn get_code(&mut self, address: Address) -> Bytes;
    fn get_storage(&mut self, address: Address, key: H256) -> U256;

    fn set_balance(&mut self, address: Address, balance: U256);
    fn set_nonce(&mut self, address: Address, nonce: u64);
    fn set_code(&mut self, address: Address, code: Bytes);
    fn set_storage(&mut self, address: Address, key: H256, value: U256);
}

/// Bridges [`Host`] onto the fallible world-state API with a fail-fast
/// policy on any lower-layer failure.
pub struct StateHost<'a> {
    state: &'a mut WorldState,
}

impl<'a> StateHost<'a> {
    pub fn new(state: &'a mut WorldState) -> Self {
        Self { state }
    }
}

fn fatal(operation: &str, address: Address, err: StateError) -> ! {
    error!(%address, operation, %err, "World state access failed during execution");
    panic!("consensus-critical world state failure: {operation} for {address:#x}: {err}");
}

impl Host for StateHost<'_> {
    fn get_balance(&mut self, address: Address) -> U256 {
        self.state
            .get_balance(address)
            .unwrap_or_else(|err| fatal("balance read", address, err))
    }

    fn get_nonce(&mut self, address: Address) -> u64 {
        self.state
            .get_nonce(address)
            .unwrap_or_else(|err| fatal("nonce read", address, err))
    }

    fn get_code(&mut self, address: Address) -> Bytes {
        self.state
            .get_code(address)
            .unwrap_or_else(|err| fatal("code read", address, err))
    }

    fn get_storage(&mut self, address: Address, key: H256) -> U256 {
        self.state
            .get_storage(address, key)
            .unwrap_or_else(|err| fatal("storage read", address, err))
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        self.state
            .set_balance(address, balance)
            .unwrap_or_else(|err| fatal("balance write", address, err))
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.state
            .set_nonce(address, nonce)
            .unwrap_or_else(|err| fatal("nonce write", address, err))
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        self.state
            .set_code(address, code)
            .unwrap_or_else(|err| fatal("code write", address, err))
    }

    fn set_storage(&mut self, address: Address, key: H256, value: U256) {
        self.state.set_storage(address, key, value)
    }
}
