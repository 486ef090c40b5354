//! The EVM object: entry points for external and nested calls and
//! creates, precompile routing, and the snapshot and gas policy around
//! the interpreter.
//!
//! Any error coming out of a call is a revert-state-and-consume-all-gas
//! operation, except for the explicit revert which keeps remaining gas.
//! An EVM instance must only be used once and is not thread safe; the
//! cancellation flag is the one cross-thread channel.

use crate::config::{CALL_CREATE_DEPTH, ChainConfig, Config, GasTable, MAX_CODE_SIZE, Rules};
use crate::contract::{CodeAndHash, Contract, ContractRef};
use crate::db::StateDB;
use crate::environment::Context;
use crate::errors::{InternalError, VMError};
use crate::gas_cost::CREATE_DATA_GAS;
use crate::interpreter::{EvmInterpreter, Interpreter};
use crate::jump_table::{
    BYZANTIUM_INSTRUCTION_SET, CONSTANTINOPLE_INSTRUCTION_SET, FRONTIER_INSTRUCTION_SET,
    HOMESTEAD_INSTRUCTION_SET, JumpTable,
};
use crate::precompiles;
use crate::stack::StackPool;
use crate::utils::{EMPTY_CODE_HASH, create2_address, create_address};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Evm<'a> {
    /// Blockchain and message information, immutable for the execution.
    pub context: Context,
    /// Backing state.
    pub state: &'a mut dyn StateDB,
    /// Current call depth.
    pub(crate) depth: usize,

    chain_config: ChainConfig,
    /// Chain rules at the current block, computed once.
    pub(crate) rules: Rules,
    /// Gas schedule at the current block, computed once.
    pub(crate) gas_table: GasTable,
    pub vm_config: Config,

    /// Registered interpreters; the first whose `can_run` accepts wins.
    interpreters: Vec<Box<dyn Interpreter>>,
    /// Instruction table matching the chain rules.
    pub(crate) jump_table: &'static JumpTable,

    /// Cross-thread abort flag, polled between opcodes.
    abort: Arc<AtomicBool>,
    /// Gas forwarded to the next nested call, fixed by the 63/64 rule in
    /// the call's dynamic gas function and consumed by its handler.
    pub(crate) call_gas_temp: u64,
    /// Whether state mutations are currently forbidden.
    pub(crate) read_only: bool,
    /// Return data of the most recent sub-call.
    pub(crate) return_data: Bytes,
    /// Reusable stack buffers, held for the duration of one execution.
    pub(crate) stack_pool: Option<StackPool>,
}

impl<'a> Evm<'a> {
    /// A fresh EVM for a single execution over the given state.
    pub fn new(
        context: Context,
        state: &'a mut dyn StateDB,
        chain_config: ChainConfig,
        vm_config: Config,
    ) -> Self {
        let number = context.block_number;
        let rules = chain_config.rules(number);
        let gas_table = chain_config.gas_table(number);
        let jump_table: &'static JumpTable = if rules.is_constantinople {
            &CONSTANTINOPLE_INSTRUCTION_SET
        } else if rules.is_byzantium {
            &BYZANTIUM_INSTRUCTION_SET
        } else if rules.is_homestead {
            &HOMESTEAD_INSTRUCTION_SET
        } else {
            &FRONTIER_INSTRUCTION_SET
        };
        // An ewasm activation expects an external engine; none is bundled,
        // so such a configuration reports NoCompatibleInterpreter at run
        // time.
        let interpreters: Vec<Box<dyn Interpreter>> = if chain_config.is_ewasm(number) {
            Vec::new()
        } else {
            vec![Box::new(EvmInterpreter)]
        };
        Self {
            context,
            state,
            depth: 0,
            chain_config,
            rules,
            gas_table,
            vm_config,
            interpreters,
            jump_table,
            abort: Arc::new(AtomicBool::new(false)),
            call_gas_temp: 0,
            read_only: false,
            return_data: Bytes::new(),
            stack_pool: None,
        }
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Aborts any running operation before its next opcode. Safe to call
    /// repeatedly, and from other threads through [`Evm::cancel_signal`].
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn cancelled(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Shared flag for cross-thread cancellation.
    pub fn cancel_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Routes the frame to a precompile or to the first interpreter that
    /// accepts its code.
    fn run_contract(
        &mut self,
        contract: &mut Contract,
        input: &[u8],
        read_only: bool,
    ) -> (Bytes, Option<VMError>) {
        if let Some(code_addr) = contract.code_addr {
            let active = precompiles::active_precompiles(&self.rules);
            if let Some(precompile) = active.get(&code_addr) {
                return precompiles::run_precompiled_contract(precompile.as_ref(), input, contract);
            }
        }
        let mut interpreters = mem::take(&mut self.interpreters);
        let mut result = (Bytes::new(), Some(VMError::NoCompatibleInterpreter));
        for interpreter in interpreters.iter_mut() {
            if interpreter.can_run(&contract.code) {
                result = interpreter.run(self, contract, input, read_only);
                break;
            }
        }
        self.interpreters = interpreters;
        result
    }

    /// Executes the contract at `addr` with the given input, transferring
    /// `value` first and creating the account when needed. Returns the
    /// output, the remaining gas and the execution error, if any.
    pub fn call(
        &mut self,
        caller: ContractRef<'_>,
        addr: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> (Bytes, u64, Option<VMError>) {
        if self.vm_config.no_recursion && self.depth > 0 {
            return (Bytes::new(), gas, None);
        }
        if self.depth > CALL_CREATE_DEPTH {
            return (Bytes::new(), gas, Some(VMError::Depth));
        }
        if !(self.context.can_transfer)(&*self.state, caller.address(), value) {
            return (Bytes::new(), gas, Some(VMError::InsufficientBalance));
        }

        let snapshot = self.state.snapshot();
        if !self.state.exist(addr) {
            if !precompiles::active_precompiles(&self.rules).contains_key(&addr)
                && self.rules.is_eip158
                && value.is_zero()
            {
                // Calling a non-existent account touches nothing; only a
                // top-level tracer gets to see the round trip.
                if self.vm_config.debug && self.depth == 0 {
                    self.trace_start(caller.address(), addr, false, input, gas, value);
                    self.trace_end(&[], 0, None);
                }
                return (Bytes::new(), gas, None);
            }
            self.state.create_account(addr);
        }
        (self.context.transfer)(&mut *self.state, caller.address(), addr, value);

        let mut contract = Contract::new(caller, addr, value, gas);
        let code_hash = self.state.get_code_hash(addr);
        let code = self.state.get_code(addr);
        // Even a codeless target runs: it may be a precompile.
        contract.set_call_code(addr, code_hash, code);

        let debug_root = self.vm_config.debug && self.depth == 0;
        if debug_root {
            self.trace_start(caller.address(), addr, false, input, gas, value);
        }

        let (ret, err) = self.run_contract(&mut contract, input, false);

        if err.is_some() {
            self.state.revert_to_snapshot(snapshot);
            if err != Some(VMError::ExecutionReverted) {
                let remaining = contract.gas;
                contract.use_gas(remaining);
            }
        }
        if debug_root {
            self.trace_end(&ret, gas - contract.gas, err.as_ref());
        }
        (ret, contract.gas, err)
    }

    /// Like [`Evm::call`], but runs the target's code in the caller's
    /// context: the caller's account backs storage and receives the value.
    pub fn call_code(
        &mut self,
        caller: ContractRef<'_>,
        addr: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> (Bytes, u64, Option<VMError>) {
        if self.vm_config.no_recursion && self.depth > 0 {
            return (Bytes::new(), gas, None);
        }
        if self.depth > CALL_CREATE_DEPTH {
            return (Bytes::new(), gas, Some(VMError::Depth));
        }
        if !(self.context.can_transfer)(&*self.state, caller.address(), value) {
            return (Bytes::new(), gas, Some(VMError::InsufficientBalance));
        }

        let snapshot = self.state.snapshot();
        let mut contract = Contract::new(caller, caller.address(), value, gas);
        let code_hash = self.state.get_code_hash(addr);
        let code = self.state.get_code(addr);
        contract.set_call_code(addr, code_hash, code);

        let (ret, err) = self.run_contract(&mut contract, input, false);
        if err.is_some() {
            self.state.revert_to_snapshot(snapshot);
            if err != Some(VMError::ExecutionReverted) {
                let remaining = contract.gas;
                contract.use_gas(remaining);
            }
        }
        (ret, contract.gas, err)
    }

    /// Like [`Evm::call_code`], but the frame additionally inherits the
    /// parent's caller and value, so the delegation chain keeps its origin
    /// semantics. The caller must be a frame.
    pub fn delegate_call(
        &mut self,
        caller: ContractRef<'_>,
        addr: Address,
        input: &[u8],
        gas: u64,
    ) -> (Bytes, u64, Option<VMError>) {
        if self.vm_config.no_recursion && self.depth > 0 {
            return (Bytes::new(), gas, None);
        }
        if self.depth > CALL_CREATE_DEPTH {
            return (Bytes::new(), gas, Some(VMError::Depth));
        }
        let ContractRef::Contract(parent) = caller else {
            return (
                Bytes::new(),
                gas,
                Some(InternalError::DelegateWithoutParent.into()),
            );
        };

        let snapshot = self.state.snapshot();
        let mut contract =
            Contract::new(caller, caller.address(), U256::zero(), gas).as_delegate(parent);
        let code_hash = self.state.get_code_hash(addr);
        let code = self.state.get_code(addr);
        contract.set_call_code(addr, code_hash, code);

        let (ret, err) = self.run_contract(&mut contract, input, false);
        if err.is_some() {
            self.state.revert_to_snapshot(snapshot);
            if err != Some(VMError::ExecutionReverted) {
                let remaining = contract.gas;
                contract.use_gas(remaining);
            }
        }
        (ret, contract.gas, err)
    }

    /// Executes the contract at `addr` while disallowing any state
    /// modification for the duration of the call.
    pub fn static_call(
        &mut self,
        caller: ContractRef<'_>,
        addr: Address,
        input: &[u8],
        gas: u64,
    ) -> (Bytes, u64, Option<VMError>) {
        if self.vm_config.no_recursion && self.depth > 0 {
            return (Bytes::new(), gas, None);
        }
        if self.depth > CALL_CREATE_DEPTH {
            return (Bytes::new(), gas, Some(VMError::Depth));
        }

        let snapshot = self.state.snapshot();
        let mut contract = Contract::new(caller, addr, U256::zero(), gas);
        let code_hash = self.state.get_code_hash(addr);
        let code = self.state.get_code(addr);
        contract.set_call_code(addr, code_hash, code);

        // A zero add still marks the account as touched, which matters for
        // empty-account cleanup on configurations where empties survive to
        // byzantium.
        self.state.add_balance(addr, U256::zero());

        let (ret, err) = self.run_contract(&mut contract, input, true);
        if err.is_some() {
            self.state.revert_to_snapshot(snapshot);
            if err != Some(VMError::ExecutionReverted) {
                let remaining = contract.gas;
                contract.use_gas(remaining);
            }
        }
        (ret, contract.gas, err)
    }

    fn create_at(
        &mut self,
        caller: ContractRef<'_>,
        code_and_hash: CodeAndHash,
        gas: u64,
        value: U256,
        address: Address,
    ) -> (Bytes, Address, u64, Option<VMError>) {
        if self.depth > CALL_CREATE_DEPTH {
            return (Bytes::new(), Address::zero(), gas, Some(VMError::Depth));
        }
        if !(self.context.can_transfer)(&*self.state, caller.address(), value) {
            return (
                Bytes::new(),
                Address::zero(),
                gas,
                Some(VMError::InsufficientBalance),
            );
        }
        let caller_address = caller.address();
        let nonce = self.state.get_nonce(caller_address);
        self.state.set_nonce(caller_address, nonce.wrapping_add(1));

        // The target must not already be a live contract.
        let contract_hash = self.state.get_code_hash(address);
        if self.state.get_nonce(address) != 0
            || (contract_hash != H256::zero() && contract_hash != EMPTY_CODE_HASH)
        {
            return (
                Bytes::new(),
                Address::zero(),
                0,
                Some(VMError::ContractAddressCollision),
            );
        }

        let snapshot = self.state.snapshot();
        self.state.create_account(address);
        if self.rules.is_eip158 {
            self.state.set_nonce(address, 1);
        }
        (self.context.transfer)(&mut *self.state, caller_address, address, value);

        let mut contract = Contract::new(caller, address, value, gas);
        contract.set_code_optional_hash(address, &code_and_hash);

        if self.vm_config.no_recursion && self.depth > 0 {
            return (Bytes::new(), address, gas, None);
        }

        let debug_root = self.vm_config.debug && self.depth == 0;
        if debug_root {
            self.trace_start(caller_address, address, true, &code_and_hash.code, gas, value);
        }

        let (ret, mut err) = self.run_contract(&mut contract, &[], false);

        let max_code_size_exceeded = self.rules.is_eip158 && ret.len() > MAX_CODE_SIZE;
        // A successful init run pays for storing its returned bytecode; a
        // shortfall here surfaces as CodeStoreOutOfGas and is resolved by
        // the fork policy below.
        if err.is_none() && !max_code_size_exceeded {
            let create_data_gas = (ret.len() as u64).saturating_mul(CREATE_DATA_GAS);
            if contract.use_gas(create_data_gas) {
                self.state.set_code(address, ret.clone());
            } else {
                err = Some(VMError::CodeStoreOutOfGas);
            }
        }

        // Oversized code and, from homestead on, a code-store shortfall
        // revert and consume the remaining gas like any other error.
        let fatal = max_code_size_exceeded
            || err
                .as_ref()
                .is_some_and(|e| self.rules.is_homestead || *e != VMError::CodeStoreOutOfGas);
        if fatal {
            self.state.revert_to_snapshot(snapshot);
            if err != Some(VMError::ExecutionReverted) {
                let remaining = contract.gas;
                contract.use_gas(remaining);
            }
        }
        if max_code_size_exceeded && err.is_none() {
            err = Some(VMError::MaxCodeSizeExceeded);
        }
        if debug_root {
            self.trace_end(&ret, gas - contract.gas, err.as_ref());
        }
        (ret, address, contract.gas, err)
    }

    /// Deploys `code` at the sender-and-nonce derived address.
    pub fn create(
        &mut self,
        caller: ContractRef<'_>,
        code: Bytes,
        gas: u64,
        value: U256,
    ) -> (Bytes, Address, u64, Option<VMError>) {
        let address = create_address(caller.address(), self.state.get_nonce(caller.address()));
        self.create_at(caller, CodeAndHash::new(code), gas, value, address)
    }

    /// Deploys `code` at the salted address derived from the caller, the
    /// salt and the init code hash.
    pub fn create2(
        &mut self,
        caller: ContractRef<'_>,
        code: Bytes,
        gas: u64,
        endowment: U256,
        salt: U256,
    ) -> (Bytes, Address, u64, Option<VMError>) {
        let mut code_and_hash = CodeAndHash::new(code);
        let address = create2_address(caller.address(), salt, code_and_hash.hash());
        self.create_at(caller, code_and_hash, gas, endowment, address)
    }

    fn trace_start(
        &self,
        from: Address,
        to: Address,
        create: bool,
        input: &[u8],
        gas: u64,
        value: U256,
    ) {
        if let Some(tracer) = &self.vm_config.tracer {
            tracer
                .borrow_mut()
                .capture_start(from, to, create, input, gas, value);
        }
    }

    fn trace_end(&self, output: &[u8], gas_used: u64, err: Option<&VMError>) {
        if let Some(tracer) = &self.vm_config.tracer {
            tracer.borrow_mut().capture_end(output, gas_used, err);
        }
    }
}
