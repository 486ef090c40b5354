use crate::db::StateDB;
use ethereum_types::{Address, H256, U256};

/// Guard deciding whether an account can move `amount` out.
pub type CanTransferFn = fn(&dyn StateDB, Address, U256) -> bool;
/// Moves value between two accounts.
pub type TransferFn = fn(&mut dyn StateDB, Address, Address, U256);
/// Hash of ancestor block `n`, or zero when unknown. Hosts may memoise by
/// walking parent headers.
pub type GetHashFn = Box<dyn Fn(u64) -> H256>;

/// Blockchain and message information exposed to the opcodes. Once
/// provided it should not be modified.
pub struct Context {
    pub can_transfer: CanTransferFn,
    pub transfer: TransferFn,
    pub get_hash: GetHashFn,

    // Message information.
    pub origin: Address,
    pub gas_price: U256,

    // Block information.
    pub coinbase: Address,
    pub gas_limit: u64,
    pub block_number: u64,
    pub time: u64,
    pub difficulty: U256,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            can_transfer,
            transfer,
            get_hash: Box::new(|_| H256::zero()),
            origin: Address::zero(),
            gas_price: U256::zero(),
            coinbase: Address::zero(),
            gas_limit: 0,
            block_number: 0,
            time: 0,
            difficulty: U256::zero(),
        }
    }
}

/// Whether the account covers `amount`. Gas needed to carry out the
/// transfer is not part of the check.
pub fn can_transfer(db: &dyn StateDB, address: Address, amount: U256) -> bool {
    db.get_balance(address) >= amount
}

/// Subtracts from the sender and credits the recipient.
pub fn transfer(db: &mut dyn StateDB, sender: Address, recipient: Address, amount: U256) {
    db.sub_balance(sender, amount);
    db.add_balance(recipient, amount);
}
