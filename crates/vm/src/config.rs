use crate::tracing::Tracer;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Maximum call/create nesting depth.
pub const CALL_CREATE_DEPTH: usize = 1024;
/// Maximum deployable bytecode size, enforced from EIP-158 on.
pub const MAX_CODE_SIZE: usize = 24576;

/// Fork activation schedule of a chain, queried by block number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub homestead_block: Option<u64>,
    pub eip150_block: Option<u64>,
    pub eip155_block: Option<u64>,
    pub eip158_block: Option<u64>,
    pub byzantium_block: Option<u64>,
    pub constantinople_block: Option<u64>,
    pub ewasm_block: Option<u64>,
}

impl ChainConfig {
    fn active(block: Option<u64>, number: u64) -> bool {
        block.is_some_and(|activation| activation <= number)
    }

    pub fn is_homestead(&self, number: u64) -> bool {
        Self::active(self.homestead_block, number)
    }

    pub fn is_eip150(&self, number: u64) -> bool {
        Self::active(self.eip150_block, number)
    }

    pub fn is_eip155(&self, number: u64) -> bool {
        Self::active(self.eip155_block, number)
    }

    pub fn is_eip158(&self, number: u64) -> bool {
        Self::active(self.eip158_block, number)
    }

    pub fn is_byzantium(&self, number: u64) -> bool {
        Self::active(self.byzantium_block, number)
    }

    pub fn is_constantinople(&self, number: u64) -> bool {
        Self::active(self.constantinople_block, number)
    }

    pub fn is_ewasm(&self, number: u64) -> bool {
        Self::active(self.ewasm_block, number)
    }

    /// Fork switches folded into flags, computed once per execution so the
    /// hot path never branches on block numbers.
    pub fn rules(&self, number: u64) -> Rules {
        Rules {
            chain_id: self.chain_id,
            is_homestead: self.is_homestead(number),
            is_eip150: self.is_eip150(number),
            is_eip155: self.is_eip155(number),
            is_eip158: self.is_eip158(number),
            is_byzantium: self.is_byzantium(number),
            is_constantinople: self.is_constantinople(number),
        }
    }

    /// Gas schedule in force at `number`.
    pub fn gas_table(&self, number: u64) -> GasTable {
        if self.is_eip158(number) {
            GAS_TABLE_EIP158
        } else if self.is_eip150(number) {
            GAS_TABLE_EIP150
        } else {
            GAS_TABLE_HOMESTEAD
        }
    }

    /// Every fork through constantinople active from the genesis block.
    pub fn all_forks() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(0),
            constantinople_block: Some(0),
            ewasm_block: None,
        }
    }
}

/// One chain configuration evaluated at a block number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rules {
    pub chain_id: u64,
    pub is_homestead: bool,
    pub is_eip150: bool,
    pub is_eip155: bool,
    pub is_eip158: bool,
    pub is_byzantium: bool,
    pub is_constantinople: bool,
}

/// Fork-variable gas costs, consumed by the dynamic gas functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasTable {
    pub ext_code_size: u64,
    pub ext_code_copy: u64,
    pub balance: u64,
    pub sload: u64,
    pub calls: u64,
    pub suicide: u64,
    pub exp_byte: u64,
    /// Non-zero from EIP-150 on; doubles as the switch for the 63/64
    /// call-gas rule.
    pub create_by_suicide: u64,
    /// Linear coefficient of the memory expansion schedule.
    pub memory_gas: u64,
}

/// Schedule for frontier and homestead.
pub const GAS_TABLE_HOMESTEAD: GasTable = GasTable {
    ext_code_size: 20,
    ext_code_copy: 20,
    balance: 20,
    sload: 50,
    calls: 40,
    suicide: 0,
    exp_byte: 10,
    create_by_suicide: 0,
    memory_gas: 3,
};

/// Schedule after the EIP-150 repricing.
pub const GAS_TABLE_EIP150: GasTable = GasTable {
    ext_code_size: 700,
    ext_code_copy: 700,
    balance: 400,
    sload: 200,
    calls: 700,
    suicide: 5000,
    exp_byte: 10,
    create_by_suicide: 25000,
    memory_gas: 3,
};

/// EIP-150 schedule with the EIP-160 exp-byte repricing.
pub const GAS_TABLE_EIP158: GasTable = GasTable {
    ext_code_size: 700,
    ext_code_copy: 700,
    balance: 400,
    sload: 200,
    calls: 700,
    suicide: 5000,
    exp_byte: 50,
    create_by_suicide: 25000,
    memory_gas: 3,
};

/// Interpreter configuration options.
#[derive(Default)]
pub struct Config {
    /// Enables the tracer callbacks.
    pub debug: bool,
    /// Opcode-level tracing sink, shared so the host can read it back
    /// after execution.
    pub tracer: Option<Rc<RefCell<dyn Tracer>>>,
    /// Disables nested call, callcode, delegatecall and create.
    pub no_recursion: bool,
    /// Records SHA3 preimages into the state backend.
    pub enable_preimage_recording: bool,
}
