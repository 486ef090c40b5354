//! The gas schedule: constant cost tiers, the memory expansion rule, the
//! 63/64 call-gas rule and the dynamic cost functions wired into the
//! instruction tables.

use crate::config::GasTable;
use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{u256_to_h256, u256_to_u64, word_to_address};
use crate::vm::Evm;
use ethereum_types::{H256, U256};

// Constant cost tiers.
pub const GAS_QUICK_STEP: u64 = 2;
pub const GAS_FASTEST_STEP: u64 = 3;
pub const GAS_FAST_STEP: u64 = 5;
pub const GAS_MID_STEP: u64 = 8;
pub const GAS_SLOW_STEP: u64 = 10;
pub const GAS_EXT_STEP: u64 = 20;

pub const SHA3_GAS: u64 = 30;
pub const SHA3_WORD_GAS: u64 = 6;
pub const COPY_GAS: u64 = 3;
pub const JUMPDEST_GAS: u64 = 1;
pub const LOG_GAS: u64 = 375;
pub const LOG_TOPIC_GAS: u64 = 375;
pub const LOG_DATA_GAS: u64 = 8;
pub const CREATE_GAS: u64 = 32000;
/// Per-byte cost of storing the deployed bytecode.
pub const CREATE_DATA_GAS: u64 = 200;
pub const CALL_VALUE_TRANSFER_GAS: u64 = 9000;
pub const CALL_NEW_ACCOUNT_GAS: u64 = 25000;
/// Free gas handed to the callee of a value-bearing call.
pub const CALL_STIPEND: u64 = 2300;
pub const EXT_CODE_HASH_GAS: u64 = 400;
pub const SUICIDE_REFUND_GAS: u64 = 24000;

// Legacy SSTORE schedule.
pub const SSTORE_SET_GAS: u64 = 20000;
pub const SSTORE_RESET_GAS: u64 = 5000;
pub const SSTORE_CLEAR_GAS: u64 = 5000;
pub const SSTORE_REFUND_GAS: u64 = 15000;

// EIP-1283 net gas metering, constantinople on.
pub const NET_SSTORE_NOOP_GAS: u64 = 200;
pub const NET_SSTORE_INIT_GAS: u64 = 20000;
pub const NET_SSTORE_CLEAN_GAS: u64 = 5000;
pub const NET_SSTORE_DIRTY_GAS: u64 = 200;
pub const NET_SSTORE_CLEAR_REFUND: u64 = 15000;
pub const NET_SSTORE_RESET_REFUND: u64 = 4800;
pub const NET_SSTORE_RESET_CLEAR_REFUND: u64 = 19800;

/// Largest memory size whose word count still squares within u64.
const MAX_MEMORY_SIZE: u64 = 0x1FFFFFFFE0;

/// 32-byte words needed for `size` bytes, saturating on overflow.
pub fn to_word_size(size: u64) -> u64 {
    if size > u64::MAX - 31 {
        return u64::MAX / 32 + 1;
    }
    (size + 31) / 32
}

/// Quadratic memory expansion cost, charging only the delta beyond what
/// the frame already paid. The memory caches the total charged so far.
pub fn memory_gas_cost(
    gas_table: &GasTable,
    memory: &mut Memory,
    new_mem_size: u64,
) -> Result<u64, VMError> {
    if new_mem_size == 0 {
        return Ok(0);
    }
    if new_mem_size > MAX_MEMORY_SIZE {
        return Err(VMError::GasUintOverflow);
    }
    let words = to_word_size(new_mem_size);
    let new_size = words * 32;
    if new_size > memory.len() as u64 {
        let total = words * gas_table.memory_gas + words * words / 512;
        let fee = total - memory.last_gas_cost;
        memory.last_gas_cost = total;
        return Ok(fee);
    }
    Ok(0)
}

/// Gas to forward to a sub-call.
///
/// Under EIP-150, signalled by a non-zero create-by-suicide entry, the cap
/// is what remains after the base cost minus one 64th of it; a request
/// beyond the cap silently gets the cap. Without the rule the request must
/// fit in 64 bits and is used unchanged.
pub fn call_gas(
    gas_table: &GasTable,
    available_gas: u64,
    base: u64,
    call_cost: U256,
) -> Result<u64, VMError> {
    if gas_table.create_by_suicide > 0 {
        let available = available_gas.checked_sub(base).ok_or(VMError::OutOfGas)?;
        let gas = available - available / 64;
        if call_cost.bits() > 64 || gas < call_cost.low_u64() {
            return Ok(gas);
        }
    }
    if call_cost.bits() > 64 {
        return Err(VMError::GasUintOverflow);
    }
    Ok(call_cost.low_u64())
}

// Dynamic gas functions referenced by the instruction tables. Each gets
// the prospective memory size the interpreter already computed.

pub(crate) fn gas_memory(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    _stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    memory_gas_cost(gas_table, memory, mem_size)
}

fn copy_cost(base: u64, length: U256) -> Result<u64, VMError> {
    let (length, overflow) = u256_to_u64(length);
    if overflow {
        return Err(VMError::GasUintOverflow);
    }
    to_word_size(length)
        .checked_mul(COPY_GAS)
        .and_then(|words| words.checked_add(base))
        .ok_or(VMError::GasUintOverflow)
}

/// CALLDATACOPY, CODECOPY and RETURNDATACOPY: expansion plus a per-word
/// copy fee; the length sits at stack position 2.
pub(crate) fn gas_copy(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let gas = memory_gas_cost(gas_table, memory, mem_size)?;
    copy_cost(gas, stack.back(2)?)
}

/// EXTCODECOPY carries its base cost in the gas table; the length sits at
/// stack position 3.
pub(crate) fn gas_ext_code_copy(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let gas = memory_gas_cost(gas_table, memory, mem_size)?
        .checked_add(gas_table.ext_code_copy)
        .ok_or(VMError::GasUintOverflow)?;
    copy_cost(gas, stack.back(3)?)
}

pub(crate) fn gas_balance(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    _stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    Ok(gas_table.balance)
}

pub(crate) fn gas_ext_code_size(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    _stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    Ok(gas_table.ext_code_size)
}

pub(crate) fn gas_sload(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    _stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    Ok(gas_table.sload)
}

pub(crate) fn gas_exp(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    let exponent = stack.back(1)?;
    let exp_bytes = (exponent.bits() as u64 + 7) / 8;
    exp_bytes
        .checked_mul(gas_table.exp_byte)
        .and_then(|gas| gas.checked_add(GAS_SLOW_STEP))
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_sha3(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let gas = memory_gas_cost(gas_table, memory, mem_size)?;
    let (length, overflow) = u256_to_u64(stack.back(1)?);
    if overflow {
        return Err(VMError::GasUintOverflow);
    }
    to_word_size(length)
        .checked_mul(SHA3_WORD_GAS)
        .and_then(|words| words.checked_add(gas))
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_log<const N: u64>(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let (size, overflow) = u256_to_u64(stack.back(1)?);
    if overflow {
        return Err(VMError::GasUintOverflow);
    }
    memory_gas_cost(gas_table, memory, mem_size)?
        .checked_add(LOG_GAS)
        .and_then(|gas| gas.checked_add(N * LOG_TOPIC_GAS))
        .and_then(|gas| size.checked_mul(LOG_DATA_GAS)?.checked_add(gas))
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_sstore(
    _gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    let key = u256_to_h256(stack.back(0)?);
    let new = u256_to_h256(stack.back(1)?);
    let current = evm.state.get_state(contract.address(), key);

    if evm.rules.is_constantinople {
        // EIP-1283 net gas metering, driven by the committed value.
        if current == new {
            return Ok(NET_SSTORE_NOOP_GAS);
        }
        let original = evm.state.get_committed_state(contract.address(), key);
        if original == current {
            if original == H256::zero() {
                return Ok(NET_SSTORE_INIT_GAS);
            }
            if new == H256::zero() {
                evm.state.add_refund(NET_SSTORE_CLEAR_REFUND);
            }
            return Ok(NET_SSTORE_CLEAN_GAS);
        }
        if original != H256::zero() {
            if current == H256::zero() {
                evm.state.sub_refund(NET_SSTORE_CLEAR_REFUND);
            } else if new == H256::zero() {
                evm.state.add_refund(NET_SSTORE_CLEAR_REFUND);
            }
        }
        if original == new {
            if original == H256::zero() {
                evm.state.add_refund(NET_SSTORE_RESET_CLEAR_REFUND);
            } else {
                evm.state.add_refund(NET_SSTORE_RESET_REFUND);
            }
        }
        return Ok(NET_SSTORE_DIRTY_GAS);
    }

    // Legacy schedule: creating a slot, clearing a slot, updating a slot.
    if current == H256::zero() && new != H256::zero() {
        Ok(SSTORE_SET_GAS)
    } else if current != H256::zero() && new == H256::zero() {
        evm.state.add_refund(SSTORE_REFUND_GAS);
        Ok(SSTORE_CLEAR_GAS)
    } else {
        Ok(SSTORE_RESET_GAS)
    }
}

pub(crate) fn gas_call(
    gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let mut gas = gas_table.calls;
    let transfers_value = !stack.back(2)?.is_zero();
    let address = word_to_address(stack.back(1)?);
    if evm.rules.is_eip158 {
        if transfers_value && evm.state.empty(address) {
            gas = gas
                .checked_add(CALL_NEW_ACCOUNT_GAS)
                .ok_or(VMError::GasUintOverflow)?;
        }
    } else if !evm.state.exist(address) {
        gas = gas
            .checked_add(CALL_NEW_ACCOUNT_GAS)
            .ok_or(VMError::GasUintOverflow)?;
    }
    if transfers_value {
        gas = gas
            .checked_add(CALL_VALUE_TRANSFER_GAS)
            .ok_or(VMError::GasUintOverflow)?;
    }
    let memory_gas = memory_gas_cost(gas_table, memory, mem_size)?;
    gas = gas.checked_add(memory_gas).ok_or(VMError::GasUintOverflow)?;

    evm.call_gas_temp = call_gas(gas_table, contract.gas, gas, stack.back(0)?)?;
    gas.checked_add(evm.call_gas_temp)
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_call_code(
    gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let mut gas = gas_table.calls;
    if !stack.back(2)?.is_zero() {
        gas = gas
            .checked_add(CALL_VALUE_TRANSFER_GAS)
            .ok_or(VMError::GasUintOverflow)?;
    }
    let memory_gas = memory_gas_cost(gas_table, memory, mem_size)?;
    gas = gas.checked_add(memory_gas).ok_or(VMError::GasUintOverflow)?;

    evm.call_gas_temp = call_gas(gas_table, contract.gas, gas, stack.back(0)?)?;
    gas.checked_add(evm.call_gas_temp)
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_delegate_call(
    gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let gas = memory_gas_cost(gas_table, memory, mem_size)?
        .checked_add(gas_table.calls)
        .ok_or(VMError::GasUintOverflow)?;
    evm.call_gas_temp = call_gas(gas_table, contract.gas, gas, stack.back(0)?)?;
    gas.checked_add(evm.call_gas_temp)
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_static_call(
    gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    gas_delegate_call(gas_table, evm, contract, stack, memory, mem_size)
}

/// CREATE2 pays the hashing of its init code on top of the expansion; the
/// code length sits at stack position 2.
pub(crate) fn gas_create2(
    gas_table: &GasTable,
    _evm: &mut Evm<'_>,
    _contract: &Contract,
    stack: &Stack,
    memory: &mut Memory,
    mem_size: u64,
) -> Result<u64, VMError> {
    let gas = memory_gas_cost(gas_table, memory, mem_size)?;
    let (length, overflow) = u256_to_u64(stack.back(2)?);
    if overflow {
        return Err(VMError::GasUintOverflow);
    }
    to_word_size(length)
        .checked_mul(SHA3_WORD_GAS)
        .and_then(|words| words.checked_add(gas))
        .ok_or(VMError::GasUintOverflow)
}

pub(crate) fn gas_suicide(
    gas_table: &GasTable,
    evm: &mut Evm<'_>,
    contract: &Contract,
    stack: &Stack,
    _memory: &mut Memory,
    _mem_size: u64,
) -> Result<u64, VMError> {
    let mut gas = gas_table.suicide;
    if evm.rules.is_eip150 {
        let beneficiary = word_to_address(stack.back(0)?);
        // EIP-158 only charges for genuinely new accounts receiving funds.
        if evm.rules.is_eip158 {
            if evm.state.empty(beneficiary)
                && !evm.state.get_balance(contract.address()).is_zero()
            {
                gas = gas
                    .checked_add(gas_table.create_by_suicide)
                    .ok_or(VMError::GasUintOverflow)?;
            }
        } else if !evm.state.exist(beneficiary) {
            gas = gas
                .checked_add(gas_table.create_by_suicide)
                .ok_or(VMError::GasUintOverflow)?;
        }
    }
    if !evm.state.has_suicided(contract.address()) {
        evm.state.add_refund(SUICIDE_REFUND_GAS);
    }
    Ok(gas)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::{GAS_TABLE_EIP150, GAS_TABLE_HOMESTEAD};

    #[test]
    fn word_size_rounds_up_and_saturates() {
        assert_eq!(to_word_size(0), 0);
        assert_eq!(to_word_size(1), 1);
        assert_eq!(to_word_size(32), 1);
        assert_eq!(to_word_size(33), 2);
        assert_eq!(to_word_size(u64::MAX), u64::MAX / 32 + 1);
    }

    #[test]
    fn memory_cost_is_monotone_and_quadratic() {
        let mut memory = Memory::new();
        // One word costs 3 linear plus a negligible quadratic part.
        let first = memory_gas_cost(&GAS_TABLE_HOMESTEAD, &mut memory, 32).unwrap();
        assert_eq!(first, 3);
        memory.resize(32).unwrap();

        // Extending to 32 words charges only the delta.
        let second = memory_gas_cost(&GAS_TABLE_HOMESTEAD, &mut memory, 1024).unwrap();
        assert_eq!(second, (32 * 3 + 32 * 32 / 512) - 3);
        memory.resize(1024).unwrap();

        // Shrinking requests cost nothing.
        assert_eq!(
            memory_gas_cost(&GAS_TABLE_HOMESTEAD, &mut memory, 64).unwrap(),
            0
        );
    }

    #[test]
    fn memory_cost_rejects_absurd_sizes() {
        let mut memory = Memory::new();
        assert_eq!(
            memory_gas_cost(&GAS_TABLE_HOMESTEAD, &mut memory, MAX_MEMORY_SIZE + 1),
            Err(VMError::GasUintOverflow)
        );
    }

    #[test]
    fn call_gas_caps_at_63_64ths() {
        // 200 available, 100 base: 100 remain, cap is 100 - 100/64 = 99.
        let capped = call_gas(&GAS_TABLE_EIP150, 200, 100, U256::MAX).unwrap();
        assert_eq!(capped, 99);
        // A modest request passes through.
        assert_eq!(call_gas(&GAS_TABLE_EIP150, 200, 100, U256::from(50)).unwrap(), 50);
    }

    #[test]
    fn call_gas_without_the_rule_requires_u64() {
        assert_eq!(
            call_gas(&GAS_TABLE_HOMESTEAD, 200, 100, U256::MAX),
            Err(VMError::GasUintOverflow)
        );
        assert_eq!(
            call_gas(&GAS_TABLE_HOMESTEAD, 200, 100, U256::from(1000)).unwrap(),
            1000
        );
    }
}
