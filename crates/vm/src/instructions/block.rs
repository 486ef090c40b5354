use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{address_to_word, h256_to_u256, u256_to_u64};
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;

pub(crate) fn op_blockhash(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let number = stack.pop()?;
    let (requested, overflow) = u256_to_u64(number);
    let current = evm.context.block_number;
    // Only the 256 most recent ancestors are addressable.
    if !overflow && requested < current && current - requested <= 256 {
        stack.push(h256_to_u256((evm.context.get_hash)(requested)));
    } else {
        stack.push(U256::zero());
    }
    Ok(Bytes::new())
}

pub(crate) fn op_coinbase(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(address_to_word(evm.context.coinbase));
    Ok(Bytes::new())
}

pub(crate) fn op_timestamp(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(evm.context.time));
    Ok(Bytes::new())
}

pub(crate) fn op_number(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(evm.context.block_number));
    Ok(Bytes::new())
}

pub(crate) fn op_difficulty(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(evm.context.difficulty);
    Ok(Bytes::new())
}

pub(crate) fn op_gaslimit(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.push(U256::from(evm.context.gas_limit));
    Ok(Bytes::new())
}
