use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{address_to_word, get_data, h256_to_u256, u256_to_u64, word_to_address};
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;

pub(crate) fn op_address(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(address_to_word(contract.address()));
    Ok(Bytes::new())
}

pub(crate) fn op_balance(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let address = word_to_address(stack.pop()?);
    stack.push(evm.state.get_balance(address));
    Ok(Bytes::new())
}

pub(crate) fn op_origin(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(address_to_word(evm.context.origin));
    Ok(Bytes::new())
}

pub(crate) fn op_caller(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(address_to_word(contract.caller()));
    Ok(Bytes::new())
}

pub(crate) fn op_callvalue(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(contract.value());
    Ok(Bytes::new())
}

pub(crate) fn op_calldataload(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let (offset64, overflow) = u256_to_u64(offset);
    if overflow {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    let word = get_data(&contract.input, offset64, 32);
    stack.push(U256::from_big_endian(&word));
    Ok(Bytes::new())
}

pub(crate) fn op_calldatasize(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(contract.input.len()));
    Ok(Bytes::new())
}

pub(crate) fn op_calldatacopy(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let mem_offset = stack.pop()?;
    let data_offset = stack.pop()?;
    let length = stack.pop()?;
    let (data_offset64, overflow) = u256_to_u64(data_offset);
    // Past-the-end reads copy zeroes.
    let data_offset64 = if overflow { u64::MAX } else { data_offset64 };
    let data = get_data(&contract.input, data_offset64, length.low_u64());
    memory.set(mem_offset.low_u64(), length.low_u64(), &data)?;
    Ok(Bytes::new())
}

pub(crate) fn op_codesize(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(contract.code.len()));
    Ok(Bytes::new())
}

pub(crate) fn op_codecopy(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let mem_offset = stack.pop()?;
    let code_offset = stack.pop()?;
    let length = stack.pop()?;
    let (code_offset64, overflow) = u256_to_u64(code_offset);
    let code_offset64 = if overflow { u64::MAX } else { code_offset64 };
    let code = get_data(&contract.code, code_offset64, length.low_u64());
    memory.set(mem_offset.low_u64(), length.low_u64(), &code)?;
    Ok(Bytes::new())
}

pub(crate) fn op_gasprice(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(evm.context.gas_price);
    Ok(Bytes::new())
}

pub(crate) fn op_extcodesize(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let address = word_to_address(stack.pop()?);
    stack.push(U256::from(evm.state.get_code_size(address)));
    Ok(Bytes::new())
}

pub(crate) fn op_extcodecopy(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let address = word_to_address(stack.pop()?);
    let mem_offset = stack.pop()?;
    let code_offset = stack.pop()?;
    let length = stack.pop()?;
    let (code_offset64, overflow) = u256_to_u64(code_offset);
    let code_offset64 = if overflow { u64::MAX } else { code_offset64 };
    let code = get_data(&evm.state.get_code(address), code_offset64, length.low_u64());
    memory.set(mem_offset.low_u64(), length.low_u64(), &code)?;
    Ok(Bytes::new())
}

pub(crate) fn op_returndatasize(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(evm.return_data.len()));
    Ok(Bytes::new())
}

pub(crate) fn op_returndatacopy(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let mem_offset = stack.pop()?;
    let data_offset = stack.pop()?;
    let length = stack.pop()?;
    // Unlike the other copies, reading past the buffer is an error.
    let end = data_offset
        .checked_add(length)
        .ok_or(VMError::ReturnDataOutOfBounds)?;
    if end.bits() > 64 || (evm.return_data.len() as u64) < end.low_u64() {
        return Err(VMError::ReturnDataOutOfBounds);
    }
    #[allow(clippy::as_conversions)] // bounded by the buffer length
    let data = evm.return_data[data_offset.low_u64() as usize..end.low_u64() as usize].to_vec();
    memory.set(mem_offset.low_u64(), length.low_u64(), &data)?;
    Ok(Bytes::new())
}

pub(crate) fn op_extcodehash(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let address = word_to_address(stack.pop()?);
    if evm.state.empty(address) {
        stack.push(U256::zero());
    } else {
        stack.push(h256_to_u256(evm.state.get_code_hash(address)));
    }
    Ok(Bytes::new())
}
