use crate::contract::Contract;
use crate::errors::VMError;
use crate::instructions::arithmetic::{is_negative, negate};
use crate::memory::Memory;
use crate::stack::Stack;
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::U256;
use std::cmp::Ordering;

fn bool_to_word(condition: bool) -> U256 {
    if condition { U256::one() } else { U256::zero() }
}

/// Two's complement ordering.
fn signed_cmp(lhs: U256, rhs: U256) -> Ordering {
    match (is_negative(lhs), is_negative(rhs)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => lhs.cmp(&rhs),
    }
}

pub(crate) fn op_lt(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(bool_to_word(lhs < rhs));
    Ok(Bytes::new())
}

pub(crate) fn op_gt(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(bool_to_word(lhs > rhs));
    Ok(Bytes::new())
}

pub(crate) fn op_slt(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(bool_to_word(signed_cmp(lhs, rhs) == Ordering::Less));
    Ok(Bytes::new())
}

pub(crate) fn op_sgt(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(bool_to_word(signed_cmp(lhs, rhs) == Ordering::Greater));
    Ok(Bytes::new())
}

pub(crate) fn op_eq(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(bool_to_word(lhs == rhs));
    Ok(Bytes::new())
}

pub(crate) fn op_iszero(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let value = stack.pop()?;
    stack.push(bool_to_word(value.is_zero()));
    Ok(Bytes::new())
}

pub(crate) fn op_and(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(lhs & rhs);
    Ok(Bytes::new())
}

pub(crate) fn op_or(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(lhs | rhs);
    Ok(Bytes::new())
}

pub(crate) fn op_xor(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let lhs = stack.pop()?;
    let rhs = stack.pop()?;
    stack.push(lhs ^ rhs);
    Ok(Bytes::new())
}

pub(crate) fn op_not(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let value = stack.pop()?;
    stack.push(!value);
    Ok(Bytes::new())
}

pub(crate) fn op_byte(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let index = stack.pop()?;
    let value = stack.pop()?;
    if index >= U256::from(32) {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    // U256::byte counts from the little end; the opcode from the big end.
    #[allow(clippy::as_conversions)] // bounded above
    let byte = value.byte(31 - index.low_u64() as usize);
    stack.push(U256::from(byte));
    Ok(Bytes::new())
}

pub(crate) fn op_shl(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let shift = stack.pop()?;
    let value = stack.pop()?;
    if shift >= U256::from(256) {
        stack.push(U256::zero());
    } else {
        #[allow(clippy::as_conversions)] // bounded above
        stack.push(value << shift.low_u64() as usize);
    }
    Ok(Bytes::new())
}

pub(crate) fn op_shr(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let shift = stack.pop()?;
    let value = stack.pop()?;
    if shift >= U256::from(256) {
        stack.push(U256::zero());
    } else {
        #[allow(clippy::as_conversions)] // bounded above
        stack.push(value >> shift.low_u64() as usize);
    }
    Ok(Bytes::new())
}

pub(crate) fn op_sar(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let shift = stack.pop()?;
    let value = stack.pop()?;
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        stack.push(if negative { !U256::zero() } else { U256::zero() });
        return Ok(Bytes::new());
    }
    #[allow(clippy::as_conversions)] // bounded above
    let shift = shift.low_u64() as usize;
    let mut shifted = value >> shift;
    if negative {
        // Sign extend the vacated high bits.
        shifted = shifted | !(U256::MAX >> shift);
    }
    stack.push(shifted);
    Ok(Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_comparison_crosses_zero() {
        let minus_one = negate(U256::one());
        assert_eq!(signed_cmp(minus_one, U256::one()), Ordering::Less);
        assert_eq!(signed_cmp(U256::one(), minus_one), Ordering::Greater);
        assert_eq!(signed_cmp(minus_one, minus_one), Ordering::Equal);
        let minus_two = negate(U256::from(2));
        assert_eq!(signed_cmp(minus_two, minus_one), Ordering::Less);
    }
}
