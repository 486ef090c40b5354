pub mod in_memory;

pub use in_memory::InMemoryState;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// A log record emitted by the LOG opcodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
    pub block_number: u64,
}

/// Full-state query and mutation surface the VM requires from a backend.
///
/// Snapshot ids are opaque integers, strictly monotone within one
/// transaction. The dispatcher nests them LIFO, but a backend only needs
/// revert-to-id.
pub trait StateDB {
    fn create_account(&mut self, address: Address);

    fn sub_balance(&mut self, address: Address, amount: U256);
    fn add_balance(&mut self, address: Address, amount: U256);
    fn get_balance(&self, address: Address) -> U256;

    fn get_nonce(&self, address: Address) -> u64;
    fn set_nonce(&mut self, address: Address, nonce: u64);

    fn get_code_hash(&self, address: Address) -> H256;
    fn get_code(&self, address: Address) -> Bytes;
    fn set_code(&mut self, address: Address, code: Bytes);
    fn get_code_size(&self, address: Address) -> usize;

    fn add_refund(&mut self, gas: u64);
    fn sub_refund(&mut self, gas: u64);
    fn get_refund(&self) -> u64;

    /// Storage value as of the start of the transaction.
    fn get_committed_state(&self, address: Address, key: H256) -> H256;
    fn get_state(&self, address: Address, key: H256) -> H256;
    fn set_state(&mut self, address: Address, key: H256, value: H256);

    /// Marks the account for destruction; returns whether it existed.
    fn suicide(&mut self, address: Address) -> bool;
    fn has_suicided(&self, address: Address) -> bool;

    /// Whether the account exists; notably true for suicided accounts
    /// until the end of the transaction.
    fn exist(&self, address: Address) -> bool;
    /// Empty per EIP-161: zero balance, zero nonce and no code.
    fn empty(&self, address: Address) -> bool;

    fn snapshot(&mut self) -> usize;
    fn revert_to_snapshot(&mut self, id: usize);

    fn add_log(&mut self, log: Log);
    fn add_preimage(&mut self, hash: H256, preimage: &[u8]);

    /// Visits the account's storage until the callback returns false.
    fn for_each_storage(&self, address: Address, f: &mut dyn FnMut(H256, H256) -> bool);
}
