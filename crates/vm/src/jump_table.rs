//! Per-fork instruction tables. Every slot carries the handler plus the
//! validation and gas metadata the interpreter consults before running it;
//! fork polymorphism is a table swap, selected once per execution.

use crate::config::GasTable;
use crate::contract::Contract;
use crate::errors::VMError;
use crate::gas_cost::{
    self, CREATE_GAS, EXT_CODE_HASH_GAS, GAS_EXT_STEP, GAS_FAST_STEP, GAS_FASTEST_STEP,
    GAS_MID_STEP, GAS_QUICK_STEP, GAS_SLOW_STEP, JUMPDEST_GAS, SHA3_GAS,
};
use crate::instructions::*;
use crate::memory::Memory;
use crate::opcodes::OpCode;
use crate::stack::{STACK_LIMIT, Stack};
use crate::utils::{calc_mem_size64, calc_mem_size64_with_uint};
use crate::vm::Evm;
use bytes::Bytes;
use lazy_static::lazy_static;

/// Runs the operation against the current frame.
pub type ExecutionFn =
    fn(&mut u64, &mut Evm<'_>, &mut Contract, &mut Memory, &mut Stack) -> Result<Bytes, VMError>;
/// Computes the fork- and state-dependent part of the cost; receives the
/// prospective memory size in bytes.
pub type DynamicGasFn =
    fn(&GasTable, &mut Evm<'_>, &Contract, &Stack, &mut Memory, u64) -> Result<u64, VMError>;
/// Memory the operation touches, read from the stack, with an overflow
/// flag for sizes beyond 64 bits.
pub type MemorySizeFn = fn(&Stack) -> Result<(u64, bool), VMError>;

/// One slot of an instruction table.
#[derive(Clone, Copy)]
pub struct Operation {
    pub execute: ExecutionFn,
    pub constant_gas: u64,
    pub dynamic_gas: Option<DynamicGasFn>,
    pub min_stack: usize,
    pub max_stack: usize,
    pub memory_size: Option<MemorySizeFn>,

    /// The operation ends the frame successfully.
    pub halts: bool,
    /// The operation maintains the program counter itself.
    pub jumps: bool,
    /// The operation mutates state; rejected inside static calls.
    pub writes: bool,
    /// The operation ends the frame with the revert signal.
    pub reverts: bool,
    /// The operation's result feeds the return-data buffer.
    pub returns: bool,
    pub valid: bool,
}

pub type JumpTable = [Operation; 256];

const fn min_stack(pops: usize, _pushes: usize) -> usize {
    pops
}

const fn max_stack(pops: usize, pushes: usize) -> usize {
    STACK_LIMIT + pops - pushes
}

fn op_undefined(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    _stack: &mut Stack,
) -> Result<Bytes, VMError> {
    // Unreachable: the interpreter rejects invalid slots before dispatch.
    Err(VMError::InvalidOpcode(u8::from(OpCode::INVALID)))
}

const UNDEFINED: Operation = Operation {
    execute: op_undefined,
    constant_gas: 0,
    dynamic_gas: None,
    min_stack: 0,
    max_stack: 0,
    memory_size: None,
    halts: false,
    jumps: false,
    writes: false,
    reverts: false,
    returns: false,
    valid: false,
};

/// A plain operation: constant gas, no memory, no flags.
fn simple(execute: ExecutionFn, constant_gas: u64, pops: usize, pushes: usize) -> Operation {
    Operation {
        execute,
        constant_gas,
        min_stack: min_stack(pops, pushes),
        max_stack: max_stack(pops, pushes),
        ..UNDEFINED
    }
    .validated()
}

impl Operation {
    fn validated(mut self) -> Operation {
        self.valid = true;
        self
    }
}

// Memory footprints, read from the stack before dynamic gas runs.

fn memory_sha3(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(1)?))
}

fn memory_calldata_copy(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(2)?))
}

fn memory_return_data_copy(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(2)?))
}

fn memory_code_copy(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(2)?))
}

fn memory_ext_code_copy(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(1)?, stack.back(3)?))
}

fn memory_mload(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64_with_uint(stack.back(0)?, 32))
}

fn memory_mstore8(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64_with_uint(stack.back(0)?, 1))
}

fn memory_mstore(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64_with_uint(stack.back(0)?, 32))
}

fn memory_create(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(1)?, stack.back(2)?))
}

fn memory_create2(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(1)?, stack.back(2)?))
}

/// CALL family: the larger of the argument and return windows.
fn memory_call(stack: &Stack) -> Result<(u64, bool), VMError> {
    let (ret, overflow) = calc_mem_size64(stack.back(5)?, stack.back(6)?);
    if overflow {
        return Ok((0, true));
    }
    let (args, overflow) = calc_mem_size64(stack.back(3)?, stack.back(4)?);
    if overflow {
        return Ok((0, true));
    }
    Ok((ret.max(args), false))
}

fn memory_delegate_call(stack: &Stack) -> Result<(u64, bool), VMError> {
    let (ret, overflow) = calc_mem_size64(stack.back(4)?, stack.back(5)?);
    if overflow {
        return Ok((0, true));
    }
    let (args, overflow) = calc_mem_size64(stack.back(2)?, stack.back(3)?);
    if overflow {
        return Ok((0, true));
    }
    Ok((ret.max(args), false))
}

fn memory_static_call(stack: &Stack) -> Result<(u64, bool), VMError> {
    memory_delegate_call(stack)
}

fn memory_log(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(1)?))
}

fn memory_return(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(1)?))
}

fn memory_revert(stack: &Stack) -> Result<(u64, bool), VMError> {
    Ok(calc_mem_size64(stack.back(0)?, stack.back(1)?))
}

/// The instruction set of the frontier rules.
fn new_frontier_instruction_set() -> JumpTable {
    let mut table: JumpTable = [UNDEFINED; 256];

    table[usize::from(OpCode::STOP)] = Operation {
        halts: true,
        ..simple(op_stop, 0, 0, 0)
    };
    table[usize::from(OpCode::ADD)] = simple(op_add, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::MUL)] = simple(op_mul, GAS_FAST_STEP, 2, 1);
    table[usize::from(OpCode::SUB)] = simple(op_sub, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::DIV)] = simple(op_div, GAS_FAST_STEP, 2, 1);
    table[usize::from(OpCode::SDIV)] = simple(op_sdiv, GAS_FAST_STEP, 2, 1);
    table[usize::from(OpCode::MOD)] = simple(op_mod, GAS_FAST_STEP, 2, 1);
    table[usize::from(OpCode::SMOD)] = simple(op_smod, GAS_FAST_STEP, 2, 1);
    table[usize::from(OpCode::ADDMOD)] = simple(op_addmod, GAS_MID_STEP, 3, 1);
    table[usize::from(OpCode::MULMOD)] = simple(op_mulmod, GAS_MID_STEP, 3, 1);
    table[usize::from(OpCode::EXP)] = Operation {
        dynamic_gas: Some(gas_cost::gas_exp),
        ..simple(op_exp, 0, 2, 1)
    };
    table[usize::from(OpCode::SIGNEXTEND)] = simple(op_signextend, GAS_FAST_STEP, 2, 1);

    table[usize::from(OpCode::LT)] = simple(op_lt, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::GT)] = simple(op_gt, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::SLT)] = simple(op_slt, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::SGT)] = simple(op_sgt, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::EQ)] = simple(op_eq, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::ISZERO)] = simple(op_iszero, GAS_FASTEST_STEP, 1, 1);
    table[usize::from(OpCode::AND)] = simple(op_and, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::OR)] = simple(op_or, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::XOR)] = simple(op_xor, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::NOT)] = simple(op_not, GAS_FASTEST_STEP, 1, 1);
    table[usize::from(OpCode::BYTE)] = simple(op_byte, GAS_FASTEST_STEP, 2, 1);

    table[usize::from(OpCode::SHA3)] = Operation {
        dynamic_gas: Some(gas_cost::gas_sha3),
        memory_size: Some(memory_sha3),
        ..simple(op_sha3, SHA3_GAS, 2, 1)
    };

    table[usize::from(OpCode::ADDRESS)] = simple(op_address, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::BALANCE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_balance),
        ..simple(op_balance, 0, 1, 1)
    };
    table[usize::from(OpCode::ORIGIN)] = simple(op_origin, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::CALLER)] = simple(op_caller, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::CALLVALUE)] = simple(op_callvalue, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::CALLDATALOAD)] = simple(op_calldataload, GAS_FASTEST_STEP, 1, 1);
    table[usize::from(OpCode::CALLDATASIZE)] = simple(op_calldatasize, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::CALLDATACOPY)] = Operation {
        dynamic_gas: Some(gas_cost::gas_copy),
        memory_size: Some(memory_calldata_copy),
        ..simple(op_calldatacopy, GAS_FASTEST_STEP, 3, 0)
    };
    table[usize::from(OpCode::CODESIZE)] = simple(op_codesize, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::CODECOPY)] = Operation {
        dynamic_gas: Some(gas_cost::gas_copy),
        memory_size: Some(memory_code_copy),
        ..simple(op_codecopy, GAS_FASTEST_STEP, 3, 0)
    };
    table[usize::from(OpCode::GASPRICE)] = simple(op_gasprice, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::EXTCODESIZE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_ext_code_size),
        ..simple(op_extcodesize, 0, 1, 1)
    };
    table[usize::from(OpCode::EXTCODECOPY)] = Operation {
        dynamic_gas: Some(gas_cost::gas_ext_code_copy),
        memory_size: Some(memory_ext_code_copy),
        ..simple(op_extcodecopy, 0, 4, 0)
    };

    table[usize::from(OpCode::BLOCKHASH)] = simple(op_blockhash, GAS_EXT_STEP, 1, 1);
    table[usize::from(OpCode::COINBASE)] = simple(op_coinbase, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::TIMESTAMP)] = simple(op_timestamp, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::NUMBER)] = simple(op_number, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::DIFFICULTY)] = simple(op_difficulty, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::GASLIMIT)] = simple(op_gaslimit, GAS_QUICK_STEP, 0, 1);

    table[usize::from(OpCode::POP)] = simple(op_pop, GAS_QUICK_STEP, 1, 0);
    table[usize::from(OpCode::MLOAD)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_mload),
        ..simple(op_mload, GAS_FASTEST_STEP, 1, 1)
    };
    table[usize::from(OpCode::MSTORE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_mstore),
        ..simple(op_mstore, GAS_FASTEST_STEP, 2, 0)
    };
    table[usize::from(OpCode::MSTORE8)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_mstore8),
        ..simple(op_mstore8, GAS_FASTEST_STEP, 2, 0)
    };
    table[usize::from(OpCode::SLOAD)] = Operation {
        dynamic_gas: Some(gas_cost::gas_sload),
        ..simple(op_sload, 0, 1, 1)
    };
    table[usize::from(OpCode::SSTORE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_sstore),
        writes: true,
        ..simple(op_sstore, 0, 2, 0)
    };
    table[usize::from(OpCode::JUMP)] = Operation {
        jumps: true,
        ..simple(op_jump, GAS_MID_STEP, 1, 0)
    };
    table[usize::from(OpCode::JUMPI)] = Operation {
        jumps: true,
        ..simple(op_jumpi, GAS_SLOW_STEP, 2, 0)
    };
    table[usize::from(OpCode::PC)] = simple(op_pc, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::MSIZE)] = simple(op_msize, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::GAS)] = simple(op_gas, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::JUMPDEST)] = simple(op_jumpdest, JUMPDEST_GAS, 0, 0);

    table[usize::from(OpCode::PUSH1)] = simple(op_push::<1>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH2)] = simple(op_push::<2>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH3)] = simple(op_push::<3>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH4)] = simple(op_push::<4>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH5)] = simple(op_push::<5>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH6)] = simple(op_push::<6>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH7)] = simple(op_push::<7>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH8)] = simple(op_push::<8>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH9)] = simple(op_push::<9>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH10)] = simple(op_push::<10>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH11)] = simple(op_push::<11>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH12)] = simple(op_push::<12>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH13)] = simple(op_push::<13>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH14)] = simple(op_push::<14>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH15)] = simple(op_push::<15>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH16)] = simple(op_push::<16>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH17)] = simple(op_push::<17>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH18)] = simple(op_push::<18>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH19)] = simple(op_push::<19>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH20)] = simple(op_push::<20>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH21)] = simple(op_push::<21>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH22)] = simple(op_push::<22>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH23)] = simple(op_push::<23>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH24)] = simple(op_push::<24>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH25)] = simple(op_push::<25>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH26)] = simple(op_push::<26>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH27)] = simple(op_push::<27>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH28)] = simple(op_push::<28>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH29)] = simple(op_push::<29>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH30)] = simple(op_push::<30>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH31)] = simple(op_push::<31>, GAS_FASTEST_STEP, 0, 1);
    table[usize::from(OpCode::PUSH32)] = simple(op_push::<32>, GAS_FASTEST_STEP, 0, 1);

    table[usize::from(OpCode::DUP1)] = simple(op_dup::<1>, GAS_FASTEST_STEP, 1, 2);
    table[usize::from(OpCode::DUP2)] = simple(op_dup::<2>, GAS_FASTEST_STEP, 2, 3);
    table[usize::from(OpCode::DUP3)] = simple(op_dup::<3>, GAS_FASTEST_STEP, 3, 4);
    table[usize::from(OpCode::DUP4)] = simple(op_dup::<4>, GAS_FASTEST_STEP, 4, 5);
    table[usize::from(OpCode::DUP5)] = simple(op_dup::<5>, GAS_FASTEST_STEP, 5, 6);
    table[usize::from(OpCode::DUP6)] = simple(op_dup::<6>, GAS_FASTEST_STEP, 6, 7);
    table[usize::from(OpCode::DUP7)] = simple(op_dup::<7>, GAS_FASTEST_STEP, 7, 8);
    table[usize::from(OpCode::DUP8)] = simple(op_dup::<8>, GAS_FASTEST_STEP, 8, 9);
    table[usize::from(OpCode::DUP9)] = simple(op_dup::<9>, GAS_FASTEST_STEP, 9, 10);
    table[usize::from(OpCode::DUP10)] = simple(op_dup::<10>, GAS_FASTEST_STEP, 10, 11);
    table[usize::from(OpCode::DUP11)] = simple(op_dup::<11>, GAS_FASTEST_STEP, 11, 12);
    table[usize::from(OpCode::DUP12)] = simple(op_dup::<12>, GAS_FASTEST_STEP, 12, 13);
    table[usize::from(OpCode::DUP13)] = simple(op_dup::<13>, GAS_FASTEST_STEP, 13, 14);
    table[usize::from(OpCode::DUP14)] = simple(op_dup::<14>, GAS_FASTEST_STEP, 14, 15);
    table[usize::from(OpCode::DUP15)] = simple(op_dup::<15>, GAS_FASTEST_STEP, 15, 16);
    table[usize::from(OpCode::DUP16)] = simple(op_dup::<16>, GAS_FASTEST_STEP, 16, 17);

    table[usize::from(OpCode::SWAP1)] = simple(op_swap::<1>, GAS_FASTEST_STEP, 2, 2);
    table[usize::from(OpCode::SWAP2)] = simple(op_swap::<2>, GAS_FASTEST_STEP, 3, 3);
    table[usize::from(OpCode::SWAP3)] = simple(op_swap::<3>, GAS_FASTEST_STEP, 4, 4);
    table[usize::from(OpCode::SWAP4)] = simple(op_swap::<4>, GAS_FASTEST_STEP, 5, 5);
    table[usize::from(OpCode::SWAP5)] = simple(op_swap::<5>, GAS_FASTEST_STEP, 6, 6);
    table[usize::from(OpCode::SWAP6)] = simple(op_swap::<6>, GAS_FASTEST_STEP, 7, 7);
    table[usize::from(OpCode::SWAP7)] = simple(op_swap::<7>, GAS_FASTEST_STEP, 8, 8);
    table[usize::from(OpCode::SWAP8)] = simple(op_swap::<8>, GAS_FASTEST_STEP, 9, 9);
    table[usize::from(OpCode::SWAP9)] = simple(op_swap::<9>, GAS_FASTEST_STEP, 10, 10);
    table[usize::from(OpCode::SWAP10)] = simple(op_swap::<10>, GAS_FASTEST_STEP, 11, 11);
    table[usize::from(OpCode::SWAP11)] = simple(op_swap::<11>, GAS_FASTEST_STEP, 12, 12);
    table[usize::from(OpCode::SWAP12)] = simple(op_swap::<12>, GAS_FASTEST_STEP, 13, 13);
    table[usize::from(OpCode::SWAP13)] = simple(op_swap::<13>, GAS_FASTEST_STEP, 14, 14);
    table[usize::from(OpCode::SWAP14)] = simple(op_swap::<14>, GAS_FASTEST_STEP, 15, 15);
    table[usize::from(OpCode::SWAP15)] = simple(op_swap::<15>, GAS_FASTEST_STEP, 16, 16);
    table[usize::from(OpCode::SWAP16)] = simple(op_swap::<16>, GAS_FASTEST_STEP, 17, 17);

    table[usize::from(OpCode::LOG0)] = Operation {
        dynamic_gas: Some(gas_cost::gas_log::<0>),
        memory_size: Some(memory_log),
        writes: true,
        ..simple(op_log::<0>, 0, 2, 0)
    };
    table[usize::from(OpCode::LOG1)] = Operation {
        dynamic_gas: Some(gas_cost::gas_log::<1>),
        memory_size: Some(memory_log),
        writes: true,
        ..simple(op_log::<1>, 0, 3, 0)
    };
    table[usize::from(OpCode::LOG2)] = Operation {
        dynamic_gas: Some(gas_cost::gas_log::<2>),
        memory_size: Some(memory_log),
        writes: true,
        ..simple(op_log::<2>, 0, 4, 0)
    };
    table[usize::from(OpCode::LOG3)] = Operation {
        dynamic_gas: Some(gas_cost::gas_log::<3>),
        memory_size: Some(memory_log),
        writes: true,
        ..simple(op_log::<3>, 0, 5, 0)
    };
    table[usize::from(OpCode::LOG4)] = Operation {
        dynamic_gas: Some(gas_cost::gas_log::<4>),
        memory_size: Some(memory_log),
        writes: true,
        ..simple(op_log::<4>, 0, 6, 0)
    };

    table[usize::from(OpCode::CREATE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_create),
        writes: true,
        returns: true,
        ..simple(op_create, CREATE_GAS, 3, 1)
    };
    table[usize::from(OpCode::CALL)] = Operation {
        dynamic_gas: Some(gas_cost::gas_call),
        memory_size: Some(memory_call),
        returns: true,
        ..simple(op_call, 0, 7, 1)
    };
    table[usize::from(OpCode::CALLCODE)] = Operation {
        dynamic_gas: Some(gas_cost::gas_call_code),
        memory_size: Some(memory_call),
        returns: true,
        ..simple(op_callcode, 0, 7, 1)
    };
    table[usize::from(OpCode::RETURN)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_return),
        halts: true,
        ..simple(op_return, 0, 2, 0)
    };
    table[usize::from(OpCode::SELFDESTRUCT)] = Operation {
        dynamic_gas: Some(gas_cost::gas_suicide),
        halts: true,
        writes: true,
        ..simple(op_selfdestruct, 0, 1, 0)
    };

    table
}

/// Frontier plus DELEGATECALL.
fn new_homestead_instruction_set() -> JumpTable {
    let mut table = new_frontier_instruction_set();
    table[usize::from(OpCode::DELEGATECALL)] = Operation {
        dynamic_gas: Some(gas_cost::gas_delegate_call),
        memory_size: Some(memory_delegate_call),
        returns: true,
        ..simple(op_delegatecall, 0, 6, 1)
    };
    table
}

/// Homestead plus STATICCALL, the return-data opcodes and REVERT.
fn new_byzantium_instruction_set() -> JumpTable {
    let mut table = new_homestead_instruction_set();
    table[usize::from(OpCode::STATICCALL)] = Operation {
        dynamic_gas: Some(gas_cost::gas_static_call),
        memory_size: Some(memory_static_call),
        returns: true,
        ..simple(op_staticcall, 0, 6, 1)
    };
    table[usize::from(OpCode::RETURNDATASIZE)] =
        simple(op_returndatasize, GAS_QUICK_STEP, 0, 1);
    table[usize::from(OpCode::RETURNDATACOPY)] = Operation {
        dynamic_gas: Some(gas_cost::gas_copy),
        memory_size: Some(memory_return_data_copy),
        ..simple(op_returndatacopy, GAS_FASTEST_STEP, 3, 0)
    };
    table[usize::from(OpCode::REVERT)] = Operation {
        dynamic_gas: Some(gas_cost::gas_memory),
        memory_size: Some(memory_revert),
        reverts: true,
        returns: true,
        ..simple(op_revert, 0, 2, 0)
    };
    table
}

/// Byzantium plus the shift opcodes, EXTCODEHASH and CREATE2.
fn new_constantinople_instruction_set() -> JumpTable {
    let mut table = new_byzantium_instruction_set();
    table[usize::from(OpCode::SHL)] = simple(op_shl, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::SHR)] = simple(op_shr, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::SAR)] = simple(op_sar, GAS_FASTEST_STEP, 2, 1);
    table[usize::from(OpCode::EXTCODEHASH)] =
        simple(op_extcodehash, EXT_CODE_HASH_GAS, 1, 1);
    table[usize::from(OpCode::CREATE2)] = Operation {
        dynamic_gas: Some(gas_cost::gas_create2),
        memory_size: Some(memory_create2),
        writes: true,
        returns: true,
        ..simple(op_create2, CREATE_GAS, 4, 1)
    };
    table
}

lazy_static! {
    pub static ref FRONTIER_INSTRUCTION_SET: JumpTable = new_frontier_instruction_set();
    pub static ref HOMESTEAD_INSTRUCTION_SET: JumpTable = new_homestead_instruction_set();
    pub static ref BYZANTIUM_INSTRUCTION_SET: JumpTable = new_byzantium_instruction_set();
    pub static ref CONSTANTINOPLE_INSTRUCTION_SET: JumpTable = new_constantinople_instruction_set();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_tables_gate_their_opcodes() {
        assert!(!FRONTIER_INSTRUCTION_SET[usize::from(OpCode::DELEGATECALL)].valid);
        assert!(HOMESTEAD_INSTRUCTION_SET[usize::from(OpCode::DELEGATECALL)].valid);
        assert!(!HOMESTEAD_INSTRUCTION_SET[usize::from(OpCode::REVERT)].valid);
        assert!(BYZANTIUM_INSTRUCTION_SET[usize::from(OpCode::REVERT)].valid);
        assert!(!BYZANTIUM_INSTRUCTION_SET[usize::from(OpCode::CREATE2)].valid);
        assert!(CONSTANTINOPLE_INSTRUCTION_SET[usize::from(OpCode::CREATE2)].valid);
        assert!(!CONSTANTINOPLE_INSTRUCTION_SET[usize::from(OpCode::INVALID)].valid);
    }

    #[test]
    fn stack_bounds_are_wired() {
        let call = CONSTANTINOPLE_INSTRUCTION_SET[usize::from(OpCode::CALL)];
        assert_eq!(call.min_stack, 7);
        assert_eq!(call.max_stack, STACK_LIMIT + 6);
        let push = CONSTANTINOPLE_INSTRUCTION_SET[usize::from(OpCode::PUSH1)];
        assert_eq!(push.min_stack, 0);
        assert_eq!(push.max_stack, STACK_LIMIT - 1);
    }

    #[test]
    fn control_flow_flags_are_wired() {
        let table = &CONSTANTINOPLE_INSTRUCTION_SET;
        assert!(table[usize::from(OpCode::STOP)].halts);
        assert!(table[usize::from(OpCode::RETURN)].halts);
        assert!(table[usize::from(OpCode::REVERT)].reverts);
        assert!(table[usize::from(OpCode::JUMP)].jumps);
        assert!(table[usize::from(OpCode::JUMPI)].jumps);
        assert!(table[usize::from(OpCode::SSTORE)].writes);
        assert!(table[usize::from(OpCode::LOG0)].writes);
        assert!(table[usize::from(OpCode::CREATE)].writes);
        assert!(table[usize::from(OpCode::SELFDESTRUCT)].writes);
        assert!(table[usize::from(OpCode::CALL)].returns);
    }
}
