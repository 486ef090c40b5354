#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use corevm::config::{ChainConfig, Config};
use corevm::contract::ContractRef;
use corevm::db::{InMemoryState, StateDB};
use corevm::errors::VMError;
use corevm::runtime;
use corevm::tracing::StructLogger;
use corevm::utils::bytes_to_address;
use corevm::vm::Evm;
use ethereum_types::{H256, U256};
use std::cell::RefCell;
use std::rc::Rc;

fn code(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap()
}

/// Runs `program` with a step logger attached and returns the logger plus
/// the execution error.
fn trace(program: &[u8]) -> (Rc<RefCell<StructLogger>>, Option<VMError>) {
    let logger = Rc::new(RefCell::new(StructLogger::new()));
    let cfg = runtime::Config {
        evm_config: Config {
            debug: true,
            tracer: Some(logger.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    let (_, _, err) = runtime::execute(program, &[], cfg);
    (logger, err)
}

fn top_of_stack(logger: &Rc<RefCell<StructLogger>>) -> U256 {
    let logger = logger.borrow();
    *logger.last_stack().unwrap().last().unwrap()
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

#[test]
fn add_with_empty_stack_underflows() {
    let (_, _, err) = runtime::execute(&code("01"), &[], runtime::Config::default());
    assert_eq!(
        err,
        Some(VMError::StackUnderflow {
            len: 0,
            required: 2
        })
    );
}

#[test]
fn pushing_past_the_limit_overflows() {
    let program: Vec<u8> = std::iter::repeat([0x60u8, 0x01])
        .take(1025)
        .flatten()
        .collect();
    let (_, _, err) = runtime::execute(&program, &[], runtime::Config::default());
    assert_eq!(
        err,
        Some(VMError::StackOverflow {
            len: 1024,
            limit: 1023
        })
    );
}

#[test]
fn undefined_bytes_are_invalid_opcodes() {
    for byte in [0x0Cu8, 0x21, 0xEF, 0xFE] {
        let (_, _, err) = runtime::execute(&[byte], &[], runtime::Config::default());
        assert_eq!(err, Some(VMError::InvalidOpcode(byte)));
    }
}

#[test]
fn returndatacopy_past_the_buffer_fails() {
    // length 1, data offset 0, memory offset 0, with no sub-call made.
    let (_, _, err) = runtime::execute(&code("6001600060003E"), &[], runtime::Config::default());
    assert_eq!(err, Some(VMError::ReturnDataOutOfBounds));
}

#[test]
fn mload_at_the_end_of_the_address_space_overflows_gas() {
    let mut program = vec![0x7F];
    program.extend_from_slice(&[0xFF; 32]);
    program.push(0x51);
    let (_, _, err) = runtime::execute(&program, &[], runtime::Config::default());
    assert_eq!(err, Some(VMError::GasUintOverflow));
}

#[test]
fn division_by_zero_yields_zero() {
    // 4 / 0 and 4 % 0.
    let (logger, err) = trace(&code("6000600404"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::zero());

    let (logger, err) = trace(&code("6000600406"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::zero());
}

#[test]
fn sdiv_rounds_towards_zero() {
    // -4 / 2 = -2: NOT 3 is the two's complement -4.
    let (logger, err) = trace(&code("600260031905"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), negate(U256::from(2)));
}

#[test]
fn smod_takes_the_dividend_sign() {
    // -8 mod 3 = -2.
    let (logger, err) = trace(&code("600360071907"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), negate(U256::from(2)));
}

#[test]
fn byte_indexes_from_the_big_end() {
    // BYTE(31, 0xFF) is the low byte.
    let (logger, err) = trace(&code("60FF601F1A"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::from(0xFF));

    // Out-of-range index reads zero.
    let (logger, err) = trace(&code("60FF60201A"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::zero());
}

#[test]
fn shifts_saturate_past_255() {
    // 1 << 1 = 2.
    let (logger, err) = trace(&code("600160011B"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::from(2));

    // 1 << 256 = 0.
    let (logger, err) = trace(&code("60016101001B"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::zero());
}

#[test]
fn sar_sign_extends() {
    // (-1) >> 8 arithmetically is still -1.
    let (logger, err) = trace(&code("60001960081D"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::MAX);
}

#[test]
fn signextend_propagates_the_sign_bit() {
    // Extending 0xFF from one byte gives -1.
    let (logger, err) = trace(&code("60FF60000B"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::MAX);

    // Extending 0x7F stays positive.
    let (logger, err) = trace(&code("607F60000B"));
    assert_eq!(err, None);
    assert_eq!(top_of_stack(&logger), U256::from(0x7F));
}

#[test]
fn calldataload_zero_pads_to_the_right() {
    // Return CALLDATALOAD(0) with one byte of calldata.
    let program = code("60003560005260206000F3");
    let (ret, _, err) = runtime::execute(&program, &[0xAA], runtime::Config::default());
    assert_eq!(err, None);
    let mut expected = [0u8; 32];
    expected[0] = 0xAA;
    assert_eq!(ret.as_ref(), &expected);
}

#[test]
fn exp_charges_per_exponent_byte() {
    // PUSH2 0x0101 PUSH1 2 EXP STOP under EIP-158 pricing.
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    state.create_account(address);
    state.set_code(address, Bytes::from(code("61010160020A00")));

    let mut evm = Evm::new(
        corevm::Context::default(),
        &mut state,
        ChainConfig::all_forks(),
        Config::default(),
    );
    let (_, gas_left, err) = evm.call(
        ContractRef::Account(bytes_to_address(b"sender")),
        address,
        &[],
        10_000,
        U256::zero(),
    );
    assert_eq!(err, None);
    // 3 + 3 for the pushes, 10 + 2 * 50 for the exponentiation.
    assert_eq!(10_000 - gas_left, 3 + 3 + 110);
}

#[test]
fn callcode_runs_foreign_code_in_own_storage() {
    let mut state = InMemoryState::new();
    let library = bytes_to_address(b"library");
    // PUSH1 42 PUSH1 0 SSTORE STOP
    state.create_account(library);
    state.set_code(library, Bytes::from(code("602A60005500")));

    // ret_size, ret_offset, in_size, in_offset, value, library, gas,
    // CALLCODE, STOP.
    let mut program = code("600060006000600060007F");
    program.extend_from_slice(&[0u8; 12]);
    program.extend_from_slice(library.as_bytes());
    program.extend_from_slice(&code("61FFFFF200"));
    let caller = bytes_to_address(b"caller");
    state.create_account(caller);
    state.set_code(caller, Bytes::from(program));

    let mut evm = Evm::new(
        corevm::Context::default(),
        &mut state,
        ChainConfig::all_forks(),
        Config::default(),
    );
    let (_, _, err) = evm.call(
        ContractRef::Account(bytes_to_address(b"sender")),
        caller,
        &[],
        200_000,
        U256::zero(),
    );
    assert_eq!(err, None);
    assert_eq!(
        state.get_state(caller, H256::zero()),
        H256::from_low_u64_be(42)
    );
    assert_eq!(state.get_state(library, H256::zero()), H256::zero());
}

#[test]
fn the_canonical_deployment_example() {
    // The classic constructor that deploys a 10-byte runtime.
    let init = code("6060604052600a8060106000396000f360606040526008565b00");
    let mut state = InMemoryState::new();
    let origin = bytes_to_address(b"sender");
    state.create_account(origin);
    let cfg = runtime::Config {
        origin,
        gas_limit: 1_000_000,
        ..Default::default()
    };
    let (deployed, address, _, err) = runtime::create(&init, &mut state, cfg);
    assert_eq!(err, None);
    assert_eq!(deployed.as_ref(), code("60606040526008565b00").as_slice());
    assert_eq!(state.get_code(address).as_ref(), deployed.as_ref());
}
