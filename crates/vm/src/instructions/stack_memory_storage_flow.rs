use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{h256_to_u256, u256_to_h256};
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;

pub(crate) fn op_pop(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.pop()?;
    Ok(Bytes::new())
}

pub(crate) fn op_mload(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let value = U256::from_big_endian(memory.slice(offset.low_u64(), 32));
    stack.push(value);
    Ok(Bytes::new())
}

pub(crate) fn op_mstore(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let value = stack.pop()?;
    memory.set32(offset.low_u64(), value)?;
    Ok(Bytes::new())
}

pub(crate) fn op_mstore8(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let value = stack.pop()?;
    memory.set(offset.low_u64(), 1, &[value.byte(0)])?;
    Ok(Bytes::new())
}

pub(crate) fn op_sload(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let key = u256_to_h256(stack.pop()?);
    let value = evm.state.get_state(contract.address(), key);
    stack.push(h256_to_u256(value));
    Ok(Bytes::new())
}

pub(crate) fn op_sstore(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let key = u256_to_h256(stack.pop()?);
    let value = u256_to_h256(stack.pop()?);
    evm.state.set_state(contract.address(), key, value);
    Ok(Bytes::new())
}

pub(crate) fn op_jump(
    pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dest = stack.pop()?;
    if !contract.valid_jumpdest(dest) {
        return Err(VMError::InvalidJump);
    }
    *pc = dest.low_u64();
    Ok(Bytes::new())
}

pub(crate) fn op_jumpi(
    pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dest = stack.pop()?;
    let condition = stack.pop()?;
    if !condition.is_zero() {
        if !contract.valid_jumpdest(dest) {
            return Err(VMError::InvalidJump);
        }
        *pc = dest.low_u64();
    } else {
        *pc += 1;
    }
    Ok(Bytes::new())
}

pub(crate) fn op_pc(
    pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(*pc));
    Ok(Bytes::new())
}

pub(crate) fn op_msize(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(memory.len()));
    Ok(Bytes::new())
}

pub(crate) fn op_gas(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(contract.gas));
    Ok(Bytes::new())
}

pub(crate) fn op_jumpdest(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    _stack: &mut Stack,
) -> Result<Bytes, VMError> {
    Ok(Bytes::new())
}
