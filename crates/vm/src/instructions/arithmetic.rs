use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::vm::Evm;
use bytes::Bytes;
use ethereum_types::{U256, U512};

pub(crate) fn op_add(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let augend = stack.pop()?;
    let addend = stack.pop()?;
    stack.push(augend.overflowing_add(addend).0);
    Ok(Bytes::new())
}

pub(crate) fn op_sub(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let minuend = stack.pop()?;
    let subtrahend = stack.pop()?;
    stack.push(minuend.overflowing_sub(subtrahend).0);
    Ok(Bytes::new())
}

pub(crate) fn op_mul(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let multiplicand = stack.pop()?;
    let multiplier = stack.pop()?;
    stack.push(multiplicand.overflowing_mul(multiplier).0);
    Ok(Bytes::new())
}

pub(crate) fn op_div(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dividend = stack.pop()?;
    let divisor = stack.pop()?;
    stack.push(dividend.checked_div(divisor).unwrap_or_default());
    Ok(Bytes::new())
}

pub(crate) fn op_sdiv(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dividend = stack.pop()?;
    let divisor = stack.pop()?;
    if divisor.is_zero() || dividend.is_zero() {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    let quotient = match abs(dividend).checked_div(abs(divisor)) {
        Some(quotient) => {
            if is_negative(dividend) ^ is_negative(divisor) {
                negate(quotient)
            } else {
                quotient
            }
        }
        None => U256::zero(),
    };
    stack.push(quotient);
    Ok(Bytes::new())
}

pub(crate) fn op_mod(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dividend = stack.pop()?;
    let divisor = stack.pop()?;
    stack.push(dividend.checked_rem(divisor).unwrap_or_default());
    Ok(Bytes::new())
}

pub(crate) fn op_smod(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let dividend = stack.pop()?;
    let divisor = stack.pop()?;
    if divisor.is_zero() || dividend.is_zero() {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    let remainder = match abs(dividend).checked_rem(abs(divisor)) {
        Some(remainder) if is_negative(dividend) => negate(remainder),
        Some(remainder) => remainder,
        None => U256::zero(),
    };
    stack.push(remainder);
    Ok(Bytes::new())
}

pub(crate) fn op_addmod(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let augend = stack.pop()?;
    let addend = stack.pop()?;
    let modulus = stack.pop()?;
    if modulus.is_zero() {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    // Both terms fit a U256, so the sum fits a U512 and the remainder of a
    // U256 modulus converts back without loss.
    let sum = U512::from(augend) + U512::from(addend);
    let sum_mod = sum % U512::from(modulus);
    stack.push(U256::try_from(sum_mod).unwrap_or_default());
    Ok(Bytes::new())
}

pub(crate) fn op_mulmod(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let multiplicand = stack.pop()?;
    let multiplier = stack.pop()?;
    let modulus = stack.pop()?;
    if modulus.is_zero() {
        stack.push(U256::zero());
        return Ok(Bytes::new());
    }
    let product = multiplicand.full_mul(multiplier);
    let product_mod = product % U512::from(modulus);
    stack.push(U256::try_from(product_mod).unwrap_or_default());
    Ok(Bytes::new())
}

pub(crate) fn op_exp(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let base = stack.pop()?;
    let exponent = stack.pop()?;
    stack.push(base.overflowing_pow(exponent).0);
    Ok(Bytes::new())
}

pub(crate) fn op_signextend(
    _pc: &mut u64,
    _evm: &mut Evm<'_>,
    _contract: &mut Contract,
    _memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let byte_size_minus_one = stack.pop()?;
    let value = stack.pop()?;
    if byte_size_minus_one > U256::from(31) {
        stack.push(value);
        return Ok(Bytes::new());
    }
    // At most 31 * 8 + 7 = 255, so the shifts stay in range.
    let sign_bit_index = (byte_size_minus_one.low_u64() * 8 + 7) as usize;
    let sign_bit = value.bit(sign_bit_index);
    let mask = (U256::one() << sign_bit_index) - U256::one();
    let extended = if sign_bit { value | !mask } else { value & mask };
    stack.push(extended);
    Ok(Bytes::new())
}

/// Most significant bit set means negative in two's complement.
pub(crate) fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Two's complement negation.
pub(crate) fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

pub(crate) fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}
