//! Opcode-level execution tracing.

use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::opcodes::OpCode;
use crate::stack::Stack;
use ethereum_types::{Address, U256};
use serde::Serialize;

/// Callbacks invoked around execution when tracing is enabled.
///
/// `capture_state` fires before each opcode runs; `capture_fault` fires
/// when a step that was already captured fails afterwards.
pub trait Tracer {
    fn capture_start(
        &mut self,
        from: Address,
        to: Address,
        create: bool,
        input: &[u8],
        gas: u64,
        value: U256,
    );

    #[allow(clippy::too_many_arguments)]
    fn capture_state(
        &mut self,
        pc: u64,
        op: OpCode,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        contract: &Contract,
        depth: usize,
        err: Option<&VMError>,
    );

    #[allow(clippy::too_many_arguments)]
    fn capture_fault(
        &mut self,
        pc: u64,
        op: OpCode,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        contract: &Contract,
        depth: usize,
        err: &VMError,
    );

    fn capture_end(&mut self, output: &[u8], gas_used: u64, err: Option<&VMError>);
}

/// One interpreter step as recorded by [`StructLogger`].
#[derive(Debug, Clone, Serialize)]
pub struct StructLog {
    pub pc: u64,
    pub op: String,
    pub gas: u64,
    pub gas_cost: u64,
    pub memory_size: usize,
    pub stack: Vec<U256>,
    pub depth: usize,
    pub err: Option<String>,
}

/// Collects a [`StructLog`] row per executed opcode plus the final
/// outcome of the run.
#[derive(Debug, Default)]
pub struct StructLogger {
    pub logs: Vec<StructLog>,
    pub output: Vec<u8>,
    pub gas_used: u64,
    pub failed: bool,
}

impl StructLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack of the last captured step, top last.
    pub fn last_stack(&self) -> Option<&[U256]> {
        self.logs.last().map(|log| log.stack.as_slice())
    }
}

impl Tracer for StructLogger {
    fn capture_start(
        &mut self,
        _from: Address,
        _to: Address,
        _create: bool,
        _input: &[u8],
        _gas: u64,
        _value: U256,
    ) {
    }

    fn capture_state(
        &mut self,
        pc: u64,
        op: OpCode,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        _contract: &Contract,
        depth: usize,
        err: Option<&VMError>,
    ) {
        self.logs.push(StructLog {
            pc,
            op: format!("{op:?}"),
            gas,
            gas_cost: cost,
            memory_size: memory.len(),
            stack: stack.data().to_vec(),
            depth,
            err: err.map(|err| err.to_string()),
        });
    }

    fn capture_fault(
        &mut self,
        _pc: u64,
        _op: OpCode,
        _gas: u64,
        _cost: u64,
        _memory: &Memory,
        _stack: &Stack,
        _contract: &Contract,
        _depth: usize,
        err: &VMError,
    ) {
        if let Some(last) = self.logs.last_mut() {
            last.err = Some(err.to_string());
        }
    }

    fn capture_end(&mut self, output: &[u8], gas_used: u64, err: Option<&VMError>) {
        self.output = output.to_vec();
        self.gas_used = gas_used;
        self.failed = err.is_some();
    }
}
