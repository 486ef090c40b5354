use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;

/// Generic PUSH, monomorphised per immediate width.
///
/// A truncated immediate at the end of code reads as if right padded with
/// zeroes.
pub(crate) fn op_push<const N: usize>(
    pc: &mut u64,
    _evm: &mut Evm<'_>,
    contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let code_len = contract.code.len() as u64;
    let start = (*pc + 1).min(code_len);
    let end = start.saturating_add(N as u64).min(code_len);
    #[allow(clippy::as_conversions)] // bounded by code length
    let immediate = &contract.code[start as usize..end as usize];

    let mut word = [0u8; 32];
    word[32 - N..32 - N + immediate.len()].copy_from_slice(immediate);
    stack.push(U256::from_big_endian(&word));

    *pc += N as u64;
    Ok(Bytes::new())
}

/// Generic DUP, one based: DUP1 copies the top word.
pub(crate) fn op_dup<const N: usize>(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.dup(N)?;
    Ok(Bytes::new())
}

/// Generic SWAP, one based: SWAP1 exchanges the two topmost words.
pub(crate) fn op_swap<const N: usize>(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    stack.swap(N + 1)?;
    Ok(Bytes::new())
}
