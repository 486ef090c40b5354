//! Minimal harness for running bytecode against a fresh in-memory state,
//! the way a host embeds the VM. Meant for tests and tooling, not for
//! consensus work.

use crate::config::{ChainConfig, Config as VmConfig};
use crate::contract::ContractRef;
use crate::db::{InMemoryState, StateDB};
use crate::environment::{self, Context};
use crate::errors::VMError;
use crate::utils::{bytes_to_address, keccak256};
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// Configuration for one-off runtime executions. `Default` enables every
/// fork through constantinople at block zero and an effectively unlimited
/// gas budget.
pub struct Config {
    pub chain_config: ChainConfig,
    pub difficulty: U256,
    pub origin: Address,
    pub coinbase: Address,
    pub block_number: u64,
    pub time: u64,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub value: U256,
    pub evm_config: VmConfig,
    pub get_hash: Option<Box<dyn Fn(u64) -> H256>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_config: ChainConfig::all_forks(),
            difficulty: U256::zero(),
            origin: Address::zero(),
            coinbase: Address::zero(),
            block_number: 0,
            time: 0,
            gas_limit: u64::MAX,
            gas_price: U256::zero(),
            value: U256::zero(),
            evm_config: VmConfig::default(),
            get_hash: None,
        }
    }
}

fn new_context(cfg: &mut Config) -> Context {
    let get_hash = cfg
        .get_hash
        .take()
        // Hash of the block number's decimal string: stable, unique per
        // height, good enough off chain.
        .unwrap_or_else(|| Box::new(|n| keccak256(n.to_string().as_bytes())));
    Context {
        can_transfer: environment::can_transfer,
        transfer: environment::transfer,
        get_hash,
        origin: cfg.origin,
        gas_price: cfg.gas_price,
        coinbase: cfg.coinbase,
        gas_limit: cfg.gas_limit,
        block_number: cfg.block_number,
        time: cfg.time,
        difficulty: cfg.difficulty,
    }
}

/// The fixed address [`execute`] deploys to.
pub fn execute_address() -> Address {
    bytes_to_address(b"contract")
}

/// Deploys `code` at a fixed address in a fresh state and executes it
/// with `input` as calldata. Returns the output, the final state and the
/// execution error, if any.
pub fn execute(code: &[u8], input: &[u8], mut cfg: Config) -> (Bytes, InMemoryState, Option<VMError>) {
    let mut state = InMemoryState::new();
    let address = execute_address();
    state.create_account(address);
    state.set_code(address, Bytes::copy_from_slice(code));

    let origin = cfg.origin;
    let gas_limit = cfg.gas_limit;
    let value = cfg.value;
    let chain_config = cfg.chain_config;
    let context = new_context(&mut cfg);

    let (ret, _, err) = {
        let mut evm = Evm::new(context, &mut state, chain_config, cfg.evm_config);
        evm.call(ContractRef::Account(origin), address, input, gas_limit, value)
    };
    (ret, state, err)
}

/// Runs `code` as deployment code against `state`. Returns the deployed
/// bytecode, the new contract address, the leftover gas and the error, if
/// any.
pub fn create(
    code: &[u8],
    state: &mut InMemoryState,
    mut cfg: Config,
) -> (Bytes, Address, u64, Option<VMError>) {
    let origin = cfg.origin;
    let gas_limit = cfg.gas_limit;
    let value = cfg.value;
    let chain_config = cfg.chain_config;
    let context = new_context(&mut cfg);

    let mut evm = Evm::new(context, state, chain_config, cfg.evm_config);
    evm.create(
        ContractRef::Account(origin),
        Bytes::copy_from_slice(code),
        gas_limit,
        value,
    )
}

/// Executes the code already deployed at `address` in `state`. Returns
/// the output, the leftover gas and the error, if any.
pub fn call(
    address: Address,
    input: &[u8],
    state: &mut InMemoryState,
    mut cfg: Config,
) -> (Bytes, u64, Option<VMError>) {
    let origin = cfg.origin;
    let gas_limit = cfg.gas_limit;
    let value = cfg.value;
    let chain_config = cfg.chain_config;
    let context = new_context(&mut cfg);

    let mut evm = Evm::new(context, state, chain_config, cfg.evm_config);
    evm.call(ContractRef::Account(origin), address, input, gas_limit, value)
}
