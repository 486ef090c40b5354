#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use corevm::config::{ChainConfig, Config};
use corevm::contract::ContractRef;
use corevm::db::{InMemoryState, StateDB};
use corevm::errors::VMError;
use corevm::runtime;
use corevm::tracing::{StructLogger, Tracer};
use corevm::utils::{bytes_to_address, create_address, keccak256};
use corevm::vm::Evm;
use ethereum_types::{Address, H256, U256};
use std::cell::RefCell;
use std::rc::Rc;

fn code(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap()
}

fn origin() -> Address {
    bytes_to_address(b"sender")
}

fn run_call(
    state: &mut InMemoryState,
    to: Address,
    input: &[u8],
    gas: u64,
    value: U256,
) -> (Bytes, u64, Option<VMError>) {
    let mut evm = Evm::new(
        corevm::Context::default(),
        state,
        ChainConfig::all_forks(),
        Config::default(),
    );
    evm.call(ContractRef::Account(origin()), to, input, gas, value)
}

fn deploy(state: &mut InMemoryState, address: Address, bytecode: &[u8]) {
    state.create_account(address);
    state.set_code(address, Bytes::copy_from_slice(bytecode));
}

#[test]
fn simple_return() {
    // PUSH1 0x10 PUSH1 0x00 MSTORE PUSH1 0x01 PUSH1 0x1F RETURN
    let cfg = runtime::Config {
        gas_limit: 100_000,
        ..Default::default()
    };
    let (ret, _, err) = runtime::execute(&code("60106000526001601FF3"), &[], cfg);
    assert_eq!(err, None);
    assert_eq!(ret.as_ref(), &[0x10]);
}

#[test]
fn simple_return_consumes_gas() {
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    deploy(&mut state, address, &code("60106000526001601FF3"));
    let (ret, gas_left, err) = run_call(&mut state, address, &[], 100_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(ret.as_ref(), &[0x10]);
    assert!(gas_left < 100_000);
    // Four pushes, MSTORE plus one memory word; RETURN reuses the sized
    // memory for free.
    assert_eq!(100_000 - gas_left, 3 + 3 + 3 + 3 + 3 + 3);
}

#[test]
fn add_leaves_the_sum_on_the_stack() {
    // PUSH1 3 PUSH1 2 ADD, then the implicit STOP.
    let logger = Rc::new(RefCell::new(StructLogger::new()));
    let cfg = runtime::Config {
        evm_config: Config {
            debug: true,
            tracer: Some(logger.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    let (ret, _, err) = runtime::execute(&code("6003600201"), &[], cfg);
    assert_eq!(err, None);
    assert!(ret.is_empty());

    let logger = logger.borrow();
    let last = logger.logs.last().unwrap();
    assert_eq!(last.op, "STOP");
    assert_eq!(last.stack, vec![U256::from(5)]);
    assert_eq!(last.memory_size, 0);
}

#[test]
fn gas_charged_matches_the_schedule() {
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    // PUSH1 3 PUSH1 2 ADD STOP
    deploy(&mut state, address, &code("6003600201"));
    let (_, gas_left, err) = run_call(&mut state, address, &[], 10_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(10_000 - gas_left, 3 + 3 + 3);
}

#[test]
fn invalid_jump_into_push_immediate() {
    // PUSH1 3 JUMP JUMPDEST STOP: target 3 is inside the immediate.
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    deploy(&mut state, address, &code("6003565B00"));
    let (ret, gas_left, err) = run_call(&mut state, address, &[], 50_000, U256::zero());
    assert_eq!(err, Some(VMError::InvalidJump));
    assert!(ret.is_empty());
    assert_eq!(gas_left, 0);
}

#[test]
fn infinite_loop_runs_out_of_gas() {
    // JUMPDEST PUSH1 0 JUMP
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    deploy(&mut state, address, &code("5B600056"));
    state.commit();
    let before = state.clone();
    let (_, gas_left, err) = run_call(&mut state, address, &[], 1000, U256::zero());
    assert_eq!(err, Some(VMError::OutOfGas));
    assert_eq!(gas_left, 0);
    // Nothing but the snapshot bookkeeping happened to the state.
    assert_eq!(state.get_code(address), before.get_code(address));
    assert_eq!(state.get_balance(address), before.get_balance(address));
}

#[test]
fn revert_returns_data_and_keeps_gas() {
    // PUSH1 1 PUSH1 0 MSTORE PUSH1 1 PUSH1 0x1F REVERT
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    deploy(&mut state, address, &code("60016000526001601FFD"));
    let (ret, gas_left, err) = run_call(&mut state, address, &[], 50_000, U256::zero());
    assert_eq!(err, Some(VMError::ExecutionReverted));
    assert_eq!(ret.as_ref(), &[0x01]);
    assert!(gas_left > 0);
}

#[test]
fn revert_needs_byzantium() {
    let cfg = runtime::Config {
        chain_config: ChainConfig {
            chain_id: 1,
            homestead_block: Some(0),
            eip150_block: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };
    let (_, _, err) = runtime::execute(&code("60016000526001601FFD"), &[], cfg);
    assert_eq!(err, Some(VMError::InvalidOpcode(0xFD)));
}

#[test]
fn static_call_rejects_storage_writes() {
    // PUSH1 1 PUSH1 0 SSTORE
    let mut state = InMemoryState::new();
    let callee = bytes_to_address(b"callee");
    deploy(&mut state, callee, &code("6001600055"));

    let mut evm = Evm::new(
        corevm::Context::default(),
        &mut state,
        ChainConfig::all_forks(),
        Config::default(),
    );
    let (_, gas_left, err) =
        evm.static_call(ContractRef::Account(origin()), callee, &[], 50_000);
    assert_eq!(err, Some(VMError::WriteProtection));
    assert_eq!(gas_left, 0);
    assert_eq!(state.get_state(callee, H256::zero()), H256::zero());
}

#[test]
fn staticcall_opcode_reports_failure_on_stack() {
    let mut state = InMemoryState::new();
    let callee = bytes_to_address(b"callee");
    deploy(&mut state, callee, &code("6001600055"));

    // ret_size, ret_offset, in_size, in_offset, callee, gas, STATICCALL,
    // then return the status word.
    let mut caller_code = code("60006000600060007F");
    caller_code.extend_from_slice(&[0u8; 12]);
    caller_code.extend_from_slice(callee.as_bytes());
    caller_code.extend_from_slice(&code("61FFFFFA60005260206000F3"));

    let caller = bytes_to_address(b"caller");
    deploy(&mut state, caller, &caller_code);
    let (ret, _, err) = run_call(&mut state, caller, &[], 200_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(U256::from_big_endian(&ret), U256::zero());
    assert_eq!(state.get_state(callee, H256::zero()), H256::zero());
}

#[test]
fn call_opcode_reports_success_and_return_data() {
    let mut state = InMemoryState::new();
    let callee = bytes_to_address(b"callee");
    // PUSH1 42 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    deploy(&mut state, callee, &code("602A60005260206000F3"));

    // CALL, POP the status, then RETURNDATACOPY the word and return it.
    let mut caller_code = code("600060006000600060007F");
    caller_code.extend_from_slice(&[0u8; 12]);
    caller_code.extend_from_slice(callee.as_bytes());
    // The copy window: length 0x20, data offset 0, memory offset 0.
    caller_code.extend_from_slice(&code("61FFFFF1506020600060003E"));
    caller_code.extend_from_slice(&code("60206000F3"));

    let caller = bytes_to_address(b"caller");
    deploy(&mut state, caller, &caller_code);
    let (ret, _, err) = run_call(&mut state, caller, &[], 200_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(U256::from_big_endian(&ret), U256::from(42));
}

#[test]
fn call_transfers_value() {
    let mut state = InMemoryState::new();
    let receiver = bytes_to_address(b"receiver");
    state.create_account(origin());
    state.set_balance(origin(), U256::from(1000));
    state.create_account(receiver);

    let (_, _, err) = run_call(&mut state, receiver, &[], 100_000, U256::from(77));
    assert_eq!(err, None);
    assert_eq!(state.get_balance(receiver), U256::from(77));
    assert_eq!(state.get_balance(origin()), U256::from(923));
}

#[test]
fn call_with_insufficient_balance_fails_without_charging() {
    let mut state = InMemoryState::new();
    let receiver = bytes_to_address(b"receiver");
    state.create_account(receiver);
    let (_, gas_left, err) = run_call(&mut state, receiver, &[], 100_000, U256::from(1));
    assert_eq!(err, Some(VMError::InsufficientBalance));
    assert_eq!(gas_left, 100_000);
}

#[test]
fn call_to_missing_account_without_value_touches_nothing() {
    let mut state = InMemoryState::new();
    let ghost = bytes_to_address(b"nobody");
    let (_, gas_left, err) = run_call(&mut state, ghost, &[], 100_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(gas_left, 100_000);
    assert!(!state.exist(ghost));
}

#[test]
fn delegatecall_writes_into_the_caller() {
    let mut state = InMemoryState::new();
    let library = bytes_to_address(b"library");
    // PUSH1 42 PUSH1 0 SSTORE STOP
    deploy(&mut state, library, &code("602A60005500"));

    // ret_size, ret_offset, in_size, in_offset, library, gas, DELEGATECALL.
    let mut caller_code = code("60006000600060007F");
    caller_code.extend_from_slice(&[0u8; 12]);
    caller_code.extend_from_slice(library.as_bytes());
    caller_code.extend_from_slice(&code("61FFFFF400"));

    let proxy = bytes_to_address(b"proxy");
    deploy(&mut state, proxy, &caller_code);
    let (_, _, err) = run_call(&mut state, proxy, &[], 200_000, U256::zero());
    assert_eq!(err, None);
    // The write landed in the proxy's storage, not the library's.
    assert_eq!(
        state.get_state(proxy, H256::zero()),
        H256::from_low_u64_be(42)
    );
    assert_eq!(state.get_state(library, H256::zero()), H256::zero());
}

#[test]
fn create_deploys_and_the_code_runs() {
    // Init code copying a 10-byte runtime that returns the word 42.
    let init = code("600A600C600039600A6000F3602A60005260206000F3");
    let mut state = InMemoryState::new();
    state.create_account(origin());
    let cfg = runtime::Config {
        origin: origin(),
        gas_limit: 1_000_000,
        ..Default::default()
    };
    let (deployed, address, gas_left, err) = runtime::create(&init, &mut state, cfg);
    assert_eq!(err, None);
    assert_eq!(deployed.as_ref(), code("602A60005260206000F3").as_slice());
    assert_eq!(state.get_code(address).as_ref(), deployed.as_ref());
    assert!(gas_left < 1_000_000);
    // EIP-158 seeds the new account's nonce.
    assert_eq!(state.get_nonce(address), 1);

    let cfg = runtime::Config {
        origin: origin(),
        ..Default::default()
    };
    let (ret, _, err) = runtime::call(address, &[], &mut state, cfg);
    assert_eq!(err, None);
    assert_eq!(U256::from_big_endian(&ret), U256::from(42));
}

#[test]
fn create_collision_consumes_the_forwarded_gas() {
    let mut state = InMemoryState::new();
    state.create_account(origin());
    // The address create would pick is already occupied by a contract.
    let target = create_address(origin(), 0);
    state.create_account(target);
    state.set_code(target, Bytes::from_static(&[0x00]));

    let cfg = runtime::Config {
        origin: origin(),
        gas_limit: 100_000,
        ..Default::default()
    };
    let (_, _, gas_left, err) = runtime::create(&code("00"), &mut state, cfg);
    assert_eq!(err, Some(VMError::ContractAddressCollision));
    assert_eq!(gas_left, 0);
    // The occupied account is untouched.
    assert_eq!(state.get_code(target).as_ref(), &[0x00]);
}

#[test]
fn create_returning_oversized_code_fails() {
    // PUSH3 24577 PUSH1 0 RETURN: one byte over the deployable limit,
    // served from freshly expanded zero memory.
    let init = code("620060016000F3");
    let mut state = InMemoryState::new();
    state.create_account(origin());
    let cfg = runtime::Config {
        origin: origin(),
        gas_limit: 10_000_000,
        ..Default::default()
    };
    let (_, _, gas_left, err) = runtime::create(&init, &mut state, cfg);
    assert_eq!(err, Some(VMError::MaxCodeSizeExceeded));
    assert_eq!(gas_left, 0);
}

#[test]
fn no_recursion_skips_nested_calls() {
    let mut state = InMemoryState::new();
    let callee = bytes_to_address(b"callee");
    // The callee would write storage if it ran.
    deploy(&mut state, callee, &code("6001600055"));

    let mut caller_code = code("600060006000600060007F");
    caller_code.extend_from_slice(&[0u8; 12]);
    caller_code.extend_from_slice(callee.as_bytes());
    caller_code.extend_from_slice(&code("61FFFFF100"));
    let caller = bytes_to_address(b"caller");
    deploy(&mut state, caller, &caller_code);

    let mut evm = Evm::new(
        corevm::Context::default(),
        &mut state,
        ChainConfig::all_forks(),
        Config {
            no_recursion: true,
            ..Default::default()
        },
    );
    let (_, _, err) = evm.call(ContractRef::Account(origin()), caller, &[], 200_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(state.get_state(callee, H256::zero()), H256::zero());
}

#[test]
fn cancellation_stops_before_the_next_opcode() {
    let mut state = InMemoryState::new();
    let address = bytes_to_address(b"contract");
    deploy(&mut state, address, &code("5B600056"));

    let mut evm = Evm::new(
        corevm::Context::default(),
        &mut state,
        ChainConfig::all_forks(),
        Config::default(),
    );
    evm.cancel();
    assert!(evm.cancelled());
    let (ret, gas_left, err) = evm.call(ContractRef::Account(origin()), address, &[], 50_000, U256::zero());
    assert_eq!(err, None);
    assert!(ret.is_empty());
    assert_eq!(gas_left, 50_000);
}

#[test]
fn sstore_refunds_follow_the_fork() {
    // Write the slot, then clear it.
    let program = code("60016000556000600055");

    // Net metering from constantinople: a dirty clear back to the
    // original zero refunds 19800.
    let (_, state, err) = runtime::execute(&program, &[], runtime::Config::default());
    assert_eq!(err, None);
    assert_eq!(state.get_refund(), 19_800);

    // Byzantium rules: plain clear refund of 15000.
    let cfg = runtime::Config {
        chain_config: ChainConfig {
            constantinople_block: None,
            ..ChainConfig::all_forks()
        },
        ..Default::default()
    };
    let (_, state, err) = runtime::execute(&program, &[], cfg);
    assert_eq!(err, None);
    assert_eq!(state.get_refund(), 15_000);
}

#[test]
fn selfdestruct_moves_the_balance() {
    let mut state = InMemoryState::new();
    let doomed = bytes_to_address(b"doomed");
    let heir = bytes_to_address(b"heir");
    // PUSH20 heir SELFDESTRUCT
    let mut program = vec![0x73];
    program.extend_from_slice(heir.as_bytes());
    program.push(0xFF);
    deploy(&mut state, doomed, &program);
    state.set_balance(doomed, U256::from(500));
    state.create_account(heir);
    state.set_balance(heir, U256::from(1));

    let (_, _, err) = run_call(&mut state, doomed, &[], 100_000, U256::zero());
    assert_eq!(err, None);
    assert_eq!(state.get_balance(heir), U256::from(501));
    assert!(state.has_suicided(doomed));
    assert_eq!(state.get_balance(doomed), U256::zero());
    assert_eq!(state.get_refund(), 24_000);
}

#[test]
fn logs_reach_the_state() {
    // PUSH1 42 PUSH1 0 MSTORE, topic, offset 0 size 32, LOG1.
    let program = code("602A600052600760206000A1");
    let (_, state, err) = runtime::execute(&program, &[], runtime::Config::default());
    assert_eq!(err, None);
    let logs = state.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].topics, vec![H256::from_low_u64_be(7)]);
    assert_eq!(U256::from_big_endian(&logs[0].data), U256::from(42));
}

#[test]
fn blockhash_uses_the_context_seam() {
    // PUSH1 9 BLOCKHASH PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let program = code("60094060005260206000F3");
    let cfg = runtime::Config {
        block_number: 10,
        ..Default::default()
    };
    let (ret, _, err) = runtime::execute(&program, &[], cfg);
    assert_eq!(err, None);
    assert_eq!(H256::from_slice(&ret), keccak256(b"9"));

    // Too far back reads as zero.
    let program = code("60094060005260206000F3");
    let cfg = runtime::Config {
        block_number: 400,
        ..Default::default()
    };
    let (ret, _, err) = runtime::execute(&program, &[], cfg);
    assert_eq!(err, None);
    assert_eq!(H256::from_slice(&ret), H256::zero());
}

#[test]
fn difficulty_comes_from_the_context() {
    // DIFFICULTY PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let program = code("4460005260206000F3");
    let cfg = runtime::Config {
        difficulty: U256::from(0x0020_0000),
        ..Default::default()
    };
    let (ret, _, err) = runtime::execute(&program, &[], cfg);
    assert_eq!(err, None);
    assert_eq!(U256::from_big_endian(&ret), U256::from(0x0020_0000));
}

#[test]
fn identity_precompile_through_a_call() {
    let mut state = InMemoryState::new();
    let input = [7u8, 8, 9];
    let (ret, _, err) = run_call(
        &mut state,
        Address::from_low_u64_be(4),
        &input,
        100_000,
        U256::zero(),
    );
    assert_eq!(err, None);
    assert_eq!(ret.as_ref(), &input);
}

#[test]
fn sha3_preimage_recording() {
    // Hash 32 zero bytes and return the digest:
    // PUSH1 32 PUSH1 0 SHA3 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let program = code("602060002060005260206000F3");
    let cfg = runtime::Config {
        evm_config: Config {
            enable_preimage_recording: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let (ret, state, err) = runtime::execute(&program, &[], cfg);
    assert_eq!(err, None);
    let expected = keccak256(&[0u8; 32]);
    assert_eq!(H256::from_slice(&ret), expected);
    assert_eq!(state.preimage(expected).unwrap().as_ref(), &[0u8; 32]);
}

#[test]
fn tracer_sees_the_fault() {
    let logger = Rc::new(RefCell::new(StructLogger::new()));
    let cfg = runtime::Config {
        evm_config: Config {
            debug: true,
            tracer: Some(logger.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    // PUSH1 3 JUMP: invalid destination.
    let (_, _, err) = runtime::execute(&code("600356"), &[], cfg);
    assert_eq!(err, Some(VMError::InvalidJump));
    let logger = logger.borrow();
    let last = logger.logs.last().unwrap();
    assert_eq!(last.op, "JUMP");
    assert!(last.err.is_some());
}

/// Exercising the tracer trait object through the plain trait keeps the
/// seam honest.
#[test]
fn struct_logger_capture_end_records_outcome() {
    let mut logger = StructLogger::new();
    logger.capture_end(&[1, 2], 55, Some(&VMError::OutOfGas));
    assert!(logger.failed);
    assert_eq!(logger.gas_used, 55);
    assert_eq!(logger.output, vec![1, 2]);
}
