//! Snapshotable in-memory state backend, used by the runtime helpers and
//! the test suite.

use super::{Log, StateDB};
use crate::utils::{EMPTY_CODE_HASH, keccak256};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Bytes,
    storage: FxHashMap<H256, H256>,
    suicided: bool,
}

/// Everything a snapshot has to capture.
#[derive(Debug, Clone, Default)]
struct World {
    accounts: FxHashMap<Address, Account>,
    refund: u64,
    logs: Vec<Log>,
    preimages: FxHashMap<H256, Bytes>,
}

/// In-memory [`StateDB`]. Snapshots clone the whole world; ids index the
/// clone stack and revert-to-id truncates it, which keeps ids strictly
/// monotone within a transaction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryState {
    world: World,
    committed: FxHashMap<(Address, H256), H256>,
    snapshots: Vec<World>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[Log] {
        &self.world.logs
    }

    pub fn preimage(&self, hash: H256) -> Option<&Bytes> {
        self.world.preimages.get(&hash)
    }

    /// Test setup helper; balances normally move through transfers.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    /// Finalises the current storage as the committed pre-transaction
    /// view and drops pending snapshots.
    pub fn commit(&mut self) {
        let mut committed = std::mem::take(&mut self.committed);
        for (address, account) in &self.world.accounts {
            for (key, value) in &account.storage {
                committed.insert((*address, *key), *value);
            }
        }
        self.committed = committed;
        self.snapshots.clear();
    }

    fn account(&self, address: Address) -> Option<&Account> {
        self.world.accounts.get(&address)
    }

    fn account_mut(&mut self, address: Address) -> &mut Account {
        self.world.accounts.entry(address).or_default()
    }
}

impl StateDB for InMemoryState {
    fn create_account(&mut self, address: Address) {
        // Recreation resets the account but carries its balance over.
        let balance = self
            .account(address)
            .map(|account| account.balance)
            .unwrap_or_default();
        self.world.accounts.insert(
            address,
            Account {
                balance,
                ..Default::default()
            },
        );
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let account = self.account_mut(address);
        account.balance = account.balance.saturating_sub(amount);
    }

    fn add_balance(&mut self, address: Address, amount: U256) {
        let account = self.account_mut(address);
        account.balance = account.balance.saturating_add(amount);
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.account(address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.account(address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.account_mut(address).nonce = nonce;
    }

    fn get_code_hash(&self, address: Address) -> H256 {
        match self.account(address) {
            None => H256::zero(),
            Some(account) if account.code.is_empty() => EMPTY_CODE_HASH,
            Some(account) => keccak256(&account.code),
        }
    }

    fn get_code(&self, address: Address) -> Bytes {
        self.account(address)
            .map(|account| account.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        self.account_mut(address).code = code;
    }

    fn get_code_size(&self, address: Address) -> usize {
        self.account(address)
            .map(|account| account.code.len())
            .unwrap_or_default()
    }

    fn add_refund(&mut self, gas: u64) {
        self.world.refund = self.world.refund.saturating_add(gas);
    }

    fn sub_refund(&mut self, gas: u64) {
        self.world.refund = self.world.refund.saturating_sub(gas);
    }

    fn get_refund(&self) -> u64 {
        self.world.refund
    }

    fn get_committed_state(&self, address: Address, key: H256) -> H256 {
        self.committed
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    fn get_state(&self, address: Address, key: H256) -> H256 {
        self.account(address)
            .and_then(|account| account.storage.get(&key))
            .copied()
            .unwrap_or_default()
    }

    fn set_state(&mut self, address: Address, key: H256, value: H256) {
        let account = self.account_mut(address);
        if value == H256::zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
    }

    fn suicide(&mut self, address: Address) -> bool {
        match self.world.accounts.get_mut(&address) {
            Some(account) => {
                account.suicided = true;
                account.balance = U256::zero();
                true
            }
            None => false,
        }
    }

    fn has_suicided(&self, address: Address) -> bool {
        self.account(address)
            .map(|account| account.suicided)
            .unwrap_or_default()
    }

    fn exist(&self, address: Address) -> bool {
        self.account(address).is_some()
    }

    fn empty(&self, address: Address) -> bool {
        self.account(address).is_none_or(|account| {
            account.balance.is_zero() && account.nonce == 0 && account.code.is_empty()
        })
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.world.clone());
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) {
        if let Some(world) = self.snapshots.get(id).cloned() {
            self.world = world;
            self.snapshots.truncate(id);
        }
    }

    fn add_log(&mut self, log: Log) {
        self.world.logs.push(log);
    }

    fn add_preimage(&mut self, hash: H256, preimage: &[u8]) {
        self.world
            .preimages
            .entry(hash)
            .or_insert_with(|| Bytes::copy_from_slice(preimage));
    }

    fn for_each_storage(&self, address: Address, f: &mut dyn FnMut(H256, H256) -> bool) {
        if let Some(account) = self.account(address) {
            for (key, value) in &account.storage {
                if !f(*key, *value) {
                    break;
                }
            }
        }
    }
}
