use crate::contract::{Contract, ContractRef};
use crate::errors::VMError;
use crate::gas_cost::CALL_STIPEND;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{address_to_word, word_to_address};
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;

pub(crate) fn op_stop(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    _stack: &mut Stack,
) -> Result<Bytes, VMError> {
    Ok(Bytes::new())
}

pub(crate) fn op_create(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let value = stack.pop()?;
    let offset = stack.pop()?;
    let size = stack.pop()?;
    let input = memory.get(offset.low_u64(), size.low_u64());

    // Hand the child everything we have; under EIP-150 one 64th stays
    // behind.
    let mut gas = contract.gas;
    if evm.rules.is_eip150 {
        gas -= gas / 64;
    }
    contract.use_gas(gas);

    let (ret, address, return_gas, suberr) =
        evm.create(ContractRef::Contract(contract), input, gas, value);

    // Homestead makes a code-store shortfall fatal; frontier treats it as
    // a successful deployment without code.
    if evm.rules.is_homestead && suberr == Some(VMError::CodeStoreOutOfGas) {
        stack.push(U256::zero());
    } else if suberr.is_some() && suberr != Some(VMError::CodeStoreOutOfGas) {
        stack.push(U256::zero());
    } else {
        stack.push(address_to_word(address));
    }
    contract.gas += return_gas;

    if suberr == Some(VMError::ExecutionReverted) {
        return Ok(ret);
    }
    Ok(Bytes::new())
}

pub(crate) fn op_create2(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let endowment = stack.pop()?;
    let offset = stack.pop()?;
    let size = stack.pop()?;
    let salt = stack.pop()?;
    let input = memory.get(offset.low_u64(), size.low_u64());

    let mut gas = contract.gas;
    if evm.rules.is_eip150 {
        gas -= gas / 64;
    }
    contract.use_gas(gas);

    let (ret, address, return_gas, suberr) =
        evm.create2(ContractRef::Contract(contract), input, gas, endowment, salt);

    if suberr.is_some() {
        stack.push(U256::zero());
    } else {
        stack.push(address_to_word(address));
    }
    contract.gas += return_gas;

    if suberr == Some(VMError::ExecutionReverted) {
        return Ok(ret);
    }
    Ok(Bytes::new())
}

pub(crate) fn op_call(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    // Forwarded gas was fixed by the dynamic cost function; the requested
    // amount on the stack is spent.
    let mut gas = evm.call_gas_temp;
    stack.pop()?;
    let address = word_to_address(stack.pop()?);
    let value = stack.pop()?;
    let in_offset = stack.pop()?;
    let in_size = stack.pop()?;
    let ret_offset = stack.pop()?;
    let ret_size = stack.pop()?;

    if !value.is_zero() {
        gas += CALL_STIPEND;
    }
    let args = memory.get(in_offset.low_u64(), in_size.low_u64());

    let (ret, return_gas, err) = evm.call(ContractRef::Contract(contract), address, &args, gas, value);

    stack.push(if err.is_none() { U256::one() } else { U256::zero() });
    if err.is_none() || err == Some(VMError::ExecutionReverted) {
        memory.set(ret_offset.low_u64(), ret_size.low_u64(), &ret)?;
    }
    contract.gas += return_gas;
    Ok(ret)
}

pub(crate) fn op_callcode(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let mut gas = evm.call_gas_temp;
    stack.pop()?;
    let address = word_to_address(stack.pop()?);
    let value = stack.pop()?;
    let in_offset = stack.pop()?;
    let in_size = stack.pop()?;
    let ret_offset = stack.pop()?;
    let ret_size = stack.pop()?;

    if !value.is_zero() {
        gas += CALL_STIPEND;
    }
    let args = memory.get(in_offset.low_u64(), in_size.low_u64());

    let (ret, return_gas, err) =
        evm.call_code(ContractRef::Contract(contract), address, &args, gas, value);

    stack.push(if err.is_none() { U256::one() } else { U256::zero() });
    if err.is_none() || err == Some(VMError::ExecutionReverted) {
        memory.set(ret_offset.low_u64(), ret_size.low_u64(), &ret)?;
    }
    contract.gas += return_gas;
    Ok(ret)
}

pub(crate) fn op_delegatecall(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let gas = evm.call_gas_temp;
    stack.pop()?;
    let address = word_to_address(stack.pop()?);
    let in_offset = stack.pop()?;
    let in_size = stack.pop()?;
    let ret_offset = stack.pop()?;
    let ret_size = stack.pop()?;

    let args = memory.get(in_offset.low_u64(), in_size.low_u64());

    let (ret, return_gas, err) =
        evm.delegate_call(ContractRef::Contract(contract), address, &args, gas);

    stack.push(if err.is_none() { U256::one() } else { U256::zero() });
    if err.is_none() || err == Some(VMError::ExecutionReverted) {
        memory.set(ret_offset.low_u64(), ret_size.low_u64(), &ret)?;
    }
    contract.gas += return_gas;
    Ok(ret)
}

pub(crate) fn op_staticcall(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let gas = evm.call_gas_temp;
    stack.pop()?;
    let address = word_to_address(stack.pop()?);
    let in_offset = stack.pop()?;
    let in_size = stack.pop()?;
    let ret_offset = stack.pop()?;
    let ret_size = stack.pop()?;

    let args = memory.get(in_offset.low_u64(), in_size.low_u64());

    let (ret, return_gas, err) =
        evm.static_call(ContractRef::Contract(contract), address, &args, gas);

    stack.push(if err.is_none() { U256::one() } else { U256::zero() });
    if err.is_none() || err == Some(VMError::ExecutionReverted) {
        memory.set(ret_offset.low_u64(), ret_size.low_u64(), &ret)?;
    }
    contract.gas += return_gas;
    Ok(ret)
}

pub(crate) fn op_return(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let size = stack.pop()?;
    Ok(memory.get(offset.low_u64(), size.low_u64()))
}

pub(crate) fn op_revert(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let size = stack.pop()?;
    Ok(memory.get(offset.low_u64(), size.low_u64()))
}

pub(crate) fn op_selfdestruct(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let beneficiary = word_to_address(stack.pop()?);
    let balance = evm.state.get_balance(contract.address());
    evm.state.add_balance(beneficiary, balance);
    evm.state.suicide(contract.address());
    Ok(Bytes::new())
}
