//! Precompiled contracts: native implementations bound to reserved
//! addresses, with per-fork activation tables. The dispatcher routes to
//! them before any interpreter sees the frame.

use crate::config::Rules;
use crate::contract::Contract;
use crate::errors::{PrecompileError, VMError};
use crate::utils::{get_data, keccak256};
use bytes::Bytes;
use ethereum_types::{Address, U256};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use sha2::Digest as _;

const ECRECOVER_GAS: u64 = 3000;
const SHA256_BASE_GAS: u64 = 60;
const SHA256_PER_WORD_GAS: u64 = 12;
const RIPEMD160_BASE_GAS: u64 = 600;
const RIPEMD160_PER_WORD_GAS: u64 = 120;
const IDENTITY_BASE_GAS: u64 = 15;
const IDENTITY_PER_WORD_GAS: u64 = 3;
/// EIP-198 gas divisor.
const MODEXP_QUAD_DIVISOR: u64 = 20;
const BN256_ADD_GAS: u64 = 500;
const BN256_SCALAR_MUL_GAS: u64 = 40000;
const BN256_PAIRING_BASE_GAS: u64 = 100_000;
const BN256_PAIRING_PER_POINT_GAS: u64 = 80_000;

/// A natively implemented contract behind a reserved address.
pub trait PrecompiledContract: Send + Sync {
    /// Gas to charge for `input` before running.
    fn required_gas(&self, input: &[u8]) -> u64;
    fn run(&self, input: &[u8]) -> Result<Bytes, VMError>;
}

pub type PrecompileMap = FxHashMap<Address, Box<dyn PrecompiledContract>>;

lazy_static! {
    /// Contracts active from the frontier and homestead rules.
    pub static ref PRECOMPILED_CONTRACTS_HOMESTEAD: PrecompileMap = {
        let mut map: PrecompileMap = FxHashMap::default();
        map.insert(Address::from_low_u64_be(1), Box::new(Ecrecover) as Box<dyn PrecompiledContract>);
        map.insert(Address::from_low_u64_be(2), Box::new(Sha256Hash));
        map.insert(Address::from_low_u64_be(3), Box::new(Ripemd160Hash));
        map.insert(Address::from_low_u64_be(4), Box::new(DataCopy));
        map
    };

    /// Byzantium adds modexp and the bn256 curve operations.
    pub static ref PRECOMPILED_CONTRACTS_BYZANTIUM: PrecompileMap = {
        let mut map: PrecompileMap = FxHashMap::default();
        map.insert(Address::from_low_u64_be(1), Box::new(Ecrecover) as Box<dyn PrecompiledContract>);
        map.insert(Address::from_low_u64_be(2), Box::new(Sha256Hash));
        map.insert(Address::from_low_u64_be(3), Box::new(Ripemd160Hash));
        map.insert(Address::from_low_u64_be(4), Box::new(DataCopy));
        map.insert(Address::from_low_u64_be(5), Box::new(BigModExp));
        map.insert(Address::from_low_u64_be(6), Box::new(Bn256Add));
        map.insert(Address::from_low_u64_be(7), Box::new(Bn256ScalarMul));
        map.insert(Address::from_low_u64_be(8), Box::new(Bn256Pairing));
        map
    };
}

/// The table in force under the given rules.
pub fn active_precompiles(rules: &Rules) -> &'static PrecompileMap {
    if rules.is_byzantium {
        &PRECOMPILED_CONTRACTS_BYZANTIUM
    } else {
        &PRECOMPILED_CONTRACTS_HOMESTEAD
    }
}

/// Charges the contract's gas requirement against the frame, then runs it.
pub fn run_precompiled_contract(
    precompile: &dyn PrecompiledContract,
    input: &[u8],
    contract: &mut Contract,
) -> (Bytes, Option<VMError>) {
    let gas = precompile.required_gas(input);
    if !contract.use_gas(gas) {
        return (Bytes::new(), Some(VMError::OutOfGas));
    }
    match precompile.run(input) {
        Ok(output) => (output, None),
        Err(err) => (Bytes::new(), Some(err)),
    }
}

fn per_word_gas(input_len: usize, base: u64, per_word: u64) -> u64 {
    (input_len as u64)
        .div_ceil(32)
        .saturating_mul(per_word)
        .saturating_add(base)
}

/// Address 0x01: ECDSA public key recovery.
pub struct Ecrecover;

impl PrecompiledContract for Ecrecover {
    fn required_gas(&self, _input: &[u8]) -> u64 {
        ECRECOVER_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        // hash(32) ++ v(32) ++ r(32) ++ s(32); any failure recovers to the
        // empty output rather than an error.
        let input = get_data(input, 0, 128);
        if !input[32..63].iter().all(|byte| *byte == 0) {
            return Ok(Bytes::new());
        }
        let v = input[63];
        if v != 27 && v != 28 {
            return Ok(Bytes::new());
        }
        let mut msg = [0u8; 32];
        msg.copy_from_slice(&input[0..32]);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&input[64..128]);

        let Ok(recovery_id) = secp256k1::ecdsa::RecoveryId::try_from(i32::from(v - 27)) else {
            return Ok(Bytes::new());
        };
        let Ok(signature) = secp256k1::ecdsa::RecoverableSignature::from_compact(&sig, recovery_id)
        else {
            return Ok(Bytes::new());
        };
        let message = secp256k1::Message::from_digest(msg);
        let Ok(public_key) = secp256k1::SECP256K1.recover_ecdsa(&message, &signature) else {
            return Ok(Bytes::new());
        };

        let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&hash.as_bytes()[12..]);
        Ok(Bytes::copy_from_slice(&out))
    }
}

/// Address 0x02: SHA-256.
pub struct Sha256Hash;

impl PrecompiledContract for Sha256Hash {
    fn required_gas(&self, input: &[u8]) -> u64 {
        per_word_gas(input.len(), SHA256_BASE_GAS, SHA256_PER_WORD_GAS)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        let digest = sha2::Sha256::digest(input);
        Ok(Bytes::copy_from_slice(&digest))
    }
}

/// Address 0x03: RIPEMD-160, left padded to a word.
pub struct Ripemd160Hash;

impl PrecompiledContract for Ripemd160Hash {
    fn required_gas(&self, input: &[u8]) -> u64 {
        per_word_gas(input.len(), RIPEMD160_BASE_GAS, RIPEMD160_PER_WORD_GAS)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        use ripemd::Digest as _;
        let mut hasher = ripemd::Ripemd160::new();
        hasher.update(input);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&digest);
        Ok(Bytes::copy_from_slice(&out))
    }
}

/// Address 0x04: the identity function.
pub struct DataCopy;

impl PrecompiledContract for DataCopy {
    fn required_gas(&self, input: &[u8]) -> u64 {
        per_word_gas(input.len(), IDENTITY_BASE_GAS, IDENTITY_PER_WORD_GAS)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        Ok(Bytes::copy_from_slice(input))
    }
}

/// Address 0x05: arbitrary-precision modular exponentiation (EIP-198).
pub struct BigModExp;

fn mult_complexity(x: U256) -> U256 {
    let (square, overflow) = x.overflowing_mul(x);
    if x <= U256::from(64u64) {
        square
    } else if x <= U256::from(1024u64) {
        square / U256::from(4u64) + U256::from(96u64) * x - U256::from(3072u64)
    } else if overflow {
        U256::MAX
    } else {
        (square / U256::from(16u64))
            .saturating_add(U256::from(480u64).saturating_mul(x))
            .saturating_sub(U256::from(199_680u64))
    }
}

impl PrecompiledContract for BigModExp {
    fn required_gas(&self, input: &[u8]) -> u64 {
        let base_len = U256::from_big_endian(&get_data(input, 0, 32));
        let exp_len = U256::from_big_endian(&get_data(input, 32, 32));
        let mod_len = U256::from_big_endian(&get_data(input, 64, 32));
        let body = if input.len() > 96 { &input[96..] } else { &[][..] };

        // The leading word of the exponent decides the adjusted length.
        let exp_head = if base_len.bits() > 64 {
            U256::zero()
        } else {
            let head_len = if exp_len > U256::from(32u64) {
                32
            } else {
                exp_len.low_u64()
            };
            U256::from_big_endian(&get_data(body, base_len.low_u64(), head_len))
        };
        let msb = if exp_head.is_zero() {
            0u64
        } else {
            exp_head.bits() as u64 - 1
        };
        let mut adj_exp_len = U256::zero();
        if exp_len > U256::from(32u64) {
            adj_exp_len = (exp_len - U256::from(32u64)).saturating_mul(U256::from(8u64));
        }
        adj_exp_len = adj_exp_len.saturating_add(U256::from(msb));

        let gas = mult_complexity(base_len.max(mod_len))
            .saturating_mul(adj_exp_len.max(U256::one()))
            / U256::from(MODEXP_QUAD_DIVISOR);
        if gas.bits() > 64 { u64::MAX } else { gas.low_u64() }
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        use malachite::Natural;
        use malachite::base::num::arithmetic::traits::ModPow as _;
        use malachite::base::num::basic::traits::Zero as _;
        use malachite::base::num::conversion::traits::*;

        let base_len = U256::from_big_endian(&get_data(input, 0, 32)).low_u64();
        let exp_len = U256::from_big_endian(&get_data(input, 32, 32)).low_u64();
        let mod_len = U256::from_big_endian(&get_data(input, 64, 32)).low_u64();
        if base_len == 0 && mod_len == 0 {
            return Ok(Bytes::new());
        }
        // Anything that gets this far already paid gas proportional to the
        // lengths, so the conversions cannot realistically fail.
        let mod_len_usize = usize::try_from(mod_len).map_err(|_| PrecompileError::InvalidInput)?;

        let body = if input.len() > 96 { &input[96..] } else { &[][..] };
        let base = get_data(body, 0, base_len);
        let exp = get_data(body, base_len, exp_len);
        let modulus = get_data(body, base_len.saturating_add(exp_len), mod_len);

        let base_nat = Natural::from_power_of_2_digits_desc(8u64, base.iter().cloned())
            .ok_or(PrecompileError::InvalidInput)?;
        let exp_nat = Natural::from_power_of_2_digits_desc(8u64, exp.iter().cloned())
            .ok_or(PrecompileError::InvalidInput)?;
        let mod_nat = Natural::from_power_of_2_digits_desc(8u64, modulus.iter().cloned())
            .ok_or(PrecompileError::InvalidInput)?;

        let result = if mod_nat == Natural::ZERO {
            Natural::ZERO
        } else if exp_nat == Natural::ZERO {
            Natural::from(1u8) % &mod_nat
        } else {
            (base_nat % &mod_nat).mod_pow(&exp_nat, &mod_nat)
        };

        let digits: Vec<u8> = result.to_power_of_2_digits_desc(8);
        // Left pad to the modulus length.
        let mut out = vec![0u8; mod_len_usize];
        if digits.len() <= out.len() {
            let offset = out.len() - digits.len();
            out[offset..].copy_from_slice(&digits);
        }
        Ok(Bytes::from(out))
    }
}

fn read_g1_point(bytes: &[u8]) -> Result<ark_bn254::G1Affine, VMError> {
    use ark_ff::{PrimeField as _, Zero as _};

    let x = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[..32]);
    let y = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[32..64]);
    if x.is_zero() && y.is_zero() {
        return Ok(ark_bn254::G1Affine::identity());
    }
    let point = ark_bn254::G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PrecompileError::InvalidPoint.into());
    }
    Ok(point)
}

fn read_g2_point(bytes: &[u8]) -> Result<ark_bn254::G2Affine, VMError> {
    use ark_ff::{PrimeField as _, Zero as _};

    // The wire order is (x_im, x_re, y_im, y_re), big endian.
    let x_im = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[..32]);
    let x_re = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[32..64]);
    let y_im = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[64..96]);
    let y_re = ark_bn254::Fq::from_be_bytes_mod_order(&bytes[96..128]);
    if x_im.is_zero() && x_re.is_zero() && y_im.is_zero() && y_re.is_zero() {
        return Ok(ark_bn254::G2Affine::identity());
    }
    let point = ark_bn254::G2Affine::new_unchecked(
        ark_bn254::Fq2::new(x_re, x_im),
        ark_bn254::Fq2::new(y_re, y_im),
    );
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PrecompileError::InvalidPoint.into());
    }
    Ok(point)
}

fn write_g1_point(point: ark_bn254::G1Affine) -> Bytes {
    use ark_ff::{BigInteger as _, PrimeField as _};

    let mut out = [0u8; 64];
    if !point.infinity {
        out[..32].copy_from_slice(&point.x.into_bigint().to_bytes_be());
        out[32..].copy_from_slice(&point.y.into_bigint().to_bytes_be());
    }
    Bytes::copy_from_slice(&out)
}

/// Address 0x06: bn256 curve point addition (EIP-196).
pub struct Bn256Add;

impl PrecompiledContract for Bn256Add {
    fn required_gas(&self, _input: &[u8]) -> u64 {
        BN256_ADD_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        use ark_ec::CurveGroup as _;

        let input = get_data(input, 0, 128);
        let p1 = read_g1_point(&input[..64])?;
        let p2 = read_g1_point(&input[64..128])?;
        let sum = (p1 + p2).into_affine();
        Ok(write_g1_point(sum))
    }
}

/// Address 0x07: bn256 scalar multiplication (EIP-196).
pub struct Bn256ScalarMul;

impl PrecompiledContract for Bn256ScalarMul {
    fn required_gas(&self, _input: &[u8]) -> u64 {
        BN256_SCALAR_MUL_GAS
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        use ark_ec::CurveGroup as _;
        use ark_ff::PrimeField as _;
        use std::ops::Mul as _;

        let input = get_data(input, 0, 96);
        let point = read_g1_point(&input[..64])?;
        let scalar = ark_bn254::Fr::from_be_bytes_mod_order(&input[64..96]);
        let product = point.mul(scalar).into_affine();
        Ok(write_g1_point(product))
    }
}

/// Address 0x08: bn256 pairing check (EIP-197). The output is one word
/// holding 1 when the product of pairings is the identity.
pub struct Bn256Pairing;

impl PrecompiledContract for Bn256Pairing {
    fn required_gas(&self, input: &[u8]) -> u64 {
        (input.len() as u64 / 192)
            .saturating_mul(BN256_PAIRING_PER_POINT_GAS)
            .saturating_add(BN256_PAIRING_BASE_GAS)
    }

    fn run(&self, input: &[u8]) -> Result<Bytes, VMError> {
        use ark_ec::pairing::Pairing as _;
        use ark_ff::One as _;

        if input.len() % 192 != 0 {
            return Err(PrecompileError::InvalidInput.into());
        }
        let pairs = input.len() / 192;
        let mut g1_points = Vec::with_capacity(pairs);
        let mut g2_points = Vec::with_capacity(pairs);
        for chunk in input.chunks_exact(192) {
            g1_points.push(read_g1_point(&chunk[..64])?);
            g2_points.push(read_g2_point(&chunk[64..192])?);
        }
        let ok = ark_bn254::Bn254::multi_pairing(g1_points, g2_points)
            .0
            .is_one();
        let word = if ok { U256::one() } else { U256::zero() };
        Ok(Bytes::copy_from_slice(&word.to_big_endian()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use hex_literal::hex;

    #[test]
    fn identity_echoes_its_input() {
        let input = [1u8, 2, 3, 4];
        assert_eq!(DataCopy.run(&input).unwrap().as_ref(), &input);
        assert_eq!(DataCopy.required_gas(&input), 18);
        assert_eq!(DataCopy.required_gas(&[0u8; 33]), 15 + 2 * 3);
    }

    #[test]
    fn sha256_of_empty_input() {
        let digest = Sha256Hash.run(&[]).unwrap();
        assert_eq!(
            digest.as_ref(),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn ripemd160_is_left_padded() {
        let digest = Ripemd160Hash.run(&[]).unwrap();
        assert_eq!(digest.len(), 32);
        assert_eq!(&digest[..12], &[0u8; 12]);
        assert_eq!(
            &digest[12..],
            hex!("9c1185a5c5e9fc54612808977ee8f548b2258d31")
        );
    }

    #[test]
    fn ecrecover_rejects_garbage_quietly() {
        // Bad v value.
        let mut input = [0u8; 128];
        input[63] = 29;
        assert!(Ecrecover.run(&input).unwrap().is_empty());
        // All zeroes.
        assert!(Ecrecover.run(&[0u8; 128]).unwrap().is_empty());
        assert_eq!(Ecrecover.required_gas(&[]), 3000);
    }

    #[test]
    fn modexp_small_numbers() {
        // 3 ^ 2 mod 5 = 4, all lengths 1.
        let mut input = Vec::new();
        input.extend_from_slice(&U256::from(1).to_big_endian());
        input.extend_from_slice(&U256::from(1).to_big_endian());
        input.extend_from_slice(&U256::from(1).to_big_endian());
        input.extend_from_slice(&[3, 2, 5]);
        let out = BigModExp.run(&input).unwrap();
        assert_eq!(out.as_ref(), &[4]);
    }

    #[test]
    fn modexp_pads_to_modulus_length() {
        // 0 ^ 0 mod 4 = 1 in a 2-byte modulus field.
        let mut input = Vec::new();
        input.extend_from_slice(&U256::from(0).to_big_endian());
        input.extend_from_slice(&U256::from(0).to_big_endian());
        input.extend_from_slice(&U256::from(2).to_big_endian());
        input.extend_from_slice(&[0, 4]);
        let out = BigModExp.run(&input).unwrap();
        assert_eq!(out.as_ref(), &[0, 1]);
    }

    #[test]
    fn bn256_add_of_infinities_is_infinity() {
        let out = Bn256Add.run(&[0u8; 128]).unwrap();
        assert_eq!(out.as_ref(), &[0u8; 64]);
    }

    #[test]
    fn bn256_add_rejects_off_curve_points() {
        let mut input = [0u8; 128];
        input[31] = 1;
        input[63] = 9;
        assert!(Bn256Add.run(&input).is_err());
    }

    #[test]
    fn bn256_mul_by_zero_is_infinity() {
        // The generator (1, 2) times zero.
        let mut input = [0u8; 96];
        input[31] = 1;
        input[63] = 2;
        let out = Bn256ScalarMul.run(&input).unwrap();
        assert_eq!(out.as_ref(), &[0u8; 64]);
    }

    #[test]
    fn bn256_empty_pairing_is_true() {
        let out = Bn256Pairing.run(&[]).unwrap();
        assert_eq!(out.as_ref(), &U256::one().to_big_endian());
        assert!(Bn256Pairing.run(&[0u8; 191]).is_err());
    }

    #[test]
    fn byzantium_table_extends_homestead() {
        assert_eq!(PRECOMPILED_CONTRACTS_HOMESTEAD.len(), 4);
        assert_eq!(PRECOMPILED_CONTRACTS_BYZANTIUM.len(), 8);
        assert!(
            PRECOMPILED_CONTRACTS_BYZANTIUM.contains_key(&Address::from_low_u64_be(8))
        );
        assert!(
            !PRECOMPILED_CONTRACTS_HOMESTEAD.contains_key(&Address::from_low_u64_be(5))
        );
    }
}
