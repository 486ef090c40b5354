//! The bytecode interpreter: pre-flight validation, gas charging, memory
//! sizing and opcode dispatch for one frame.

use crate::contract::Contract;
use crate::errors::VMError;
use crate::gas_cost;
use crate::memory::Memory;
use crate::opcodes::OpCode;
use crate::stack::{Stack, StackPool};
use crate::vm::Evm;
use bytes::Bytes;

/// A bytecode interpreter the dispatcher can route frames to. The seam
/// exists for alternative engines; dispatch order is "first that accepts".
pub trait Interpreter {
    /// Whether this interpreter can run the given code.
    fn can_run(&self, code: &[u8]) -> bool;

    /// Runs the frame to completion. Any returned error other than
    /// [`VMError::ExecutionReverted`] means revert-and-consume-all-gas to
    /// the dispatcher.
    fn run(
        &mut self,
        evm: &mut Evm<'_>,
        contract: &mut Contract,
        input: &[u8],
        read_only: bool,
    ) -> (Bytes, Option<VMError>);
}

/// The bundled interpreter. It accepts any code.
#[derive(Debug, Default)]
pub struct EvmInterpreter;

impl Interpreter for EvmInterpreter {
    fn can_run(&self, _code: &[u8]) -> bool {
        true
    }

    fn run(
        &mut self,
        evm: &mut Evm<'_>,
        contract: &mut Contract,
        input: &[u8],
        read_only: bool,
    ) -> (Bytes, Option<VMError>) {
        evm.execute(contract, input, read_only)
    }
}

impl<'a> Evm<'a> {
    /// Runs the contract's code against the given input.
    pub(crate) fn execute(
        &mut self,
        contract: &mut Contract,
        input: &[u8],
        read_only: bool,
    ) -> (Bytes, Option<VMError>) {
        // Scoped acquisition of the reusable stack buffers: the outermost
        // frame takes a pool from the shared reservoir and returns it when
        // the execution exits.
        let acquired_pool = self.stack_pool.is_none();
        if acquired_pool {
            self.stack_pool = Some(StackPool::acquire());
        }

        self.depth += 1;
        // Enter read-only at most once so nested frames cannot clear it.
        let set_read_only = read_only && !self.read_only;
        if set_read_only {
            self.read_only = true;
        }
        // The previous call's buffer is stale from here on.
        self.return_data = Bytes::new();

        let result = if contract.code.is_empty() {
            (Bytes::new(), None)
        } else {
            let mut stack = match self.stack_pool.as_mut() {
                Some(pool) => pool.get_stack(),
                None => Stack::new(),
            };
            let mut memory = Memory::new();
            let result = self.run_loop(contract, input, &mut memory, &mut stack);
            if let Some(pool) = self.stack_pool.as_mut() {
                pool.put_stack(stack);
            }
            result
        };

        if set_read_only {
            self.read_only = false;
        }
        self.depth -= 1;
        if acquired_pool && let Some(pool) = self.stack_pool.take() {
            StackPool::release(pool);
        }
        result
    }

    #[allow(clippy::too_many_lines)]
    fn run_loop(
        &mut self,
        contract: &mut Contract,
        input: &[u8],
        memory: &mut Memory,
        stack: &mut Stack,
    ) -> (Bytes, Option<VMError>) {
        contract.input = Bytes::copy_from_slice(input);

        let debug = self.vm_config.debug;
        let mut pc: u64 = 0;

        // The loop runs until an explicit STOP, RETURN or SELFDESTRUCT, an
        // error, or until the host sets the abort flag.
        while !self.cancelled() {
            let gas_copy = contract.gas;
            let mut logged = false;
            let mut cost: u64 = 0;

            let op = contract.get_op(pc);
            let operation = self.jump_table[usize::from(op)];
            if !operation.valid {
                return self.fail(
                    VMError::InvalidOpcode(op),
                    logged, pc, op, gas_copy, cost, memory, stack, contract,
                );
            }
            let stack_len = stack.len();
            if stack_len < operation.min_stack {
                return self.fail(
                    VMError::StackUnderflow { len: stack_len, required: operation.min_stack },
                    logged, pc, op, gas_copy, cost, memory, stack, contract,
                );
            }
            if stack_len > operation.max_stack {
                return self.fail(
                    VMError::StackOverflow { len: stack_len, limit: operation.max_stack },
                    logged, pc, op, gas_copy, cost, memory, stack, contract,
                );
            }

            if self.read_only && self.rules.is_byzantium {
                // No state mutation inside a static context. A CALL moving
                // value mutates state too; the value sits at stack
                // position 2.
                let value_bearing_call = op == u8::from(OpCode::CALL)
                    && !stack.back(2).map(|value| value.is_zero()).unwrap_or(true);
                if operation.writes || value_bearing_call {
                    return self.fail(
                        VMError::WriteProtection,
                        logged, pc, op, gas_copy, cost, memory, stack, contract,
                    );
                }
            }

            cost = operation.constant_gas;
            if !contract.use_gas(operation.constant_gas) {
                return self.fail(
                    VMError::OutOfGas,
                    logged, pc, op, gas_copy, cost, memory, stack, contract,
                );
            }

            // The memory check runs before the dynamic gas part so size
            // overflows surface before any cost arithmetic uses them.
            let mut memory_size: u64 = 0;
            if let Some(memory_size_fn) = operation.memory_size {
                let (size, overflow) = match memory_size_fn(stack) {
                    Ok(pair) => pair,
                    Err(err) => {
                        return self.fail(
                            err, logged, pc, op, gas_copy, cost, memory, stack, contract,
                        );
                    }
                };
                if overflow {
                    return self.fail(
                        VMError::GasUintOverflow,
                        logged, pc, op, gas_copy, cost, memory, stack, contract,
                    );
                }
                // Memory is expanded in words; gas is charged in bytes.
                match gas_cost::to_word_size(size).checked_mul(32) {
                    Some(size_in_bytes) => memory_size = size_in_bytes,
                    None => {
                        return self.fail(
                            VMError::GasUintOverflow,
                            logged, pc, op, gas_copy, cost, memory, stack, contract,
                        );
                    }
                }
            }

            if let Some(dynamic_gas_fn) = operation.dynamic_gas {
                let gas_table = self.gas_table;
                let dynamic = dynamic_gas_fn(&gas_table, self, contract, stack, memory, memory_size);
                let charged = match dynamic {
                    Ok(gas) => contract.use_gas(gas).then_some(gas),
                    Err(_) => None,
                };
                match charged {
                    Some(gas) => cost = cost.saturating_add(gas),
                    None => {
                        return self.fail(
                            VMError::OutOfGas,
                            logged, pc, op, gas_copy, cost, memory, stack, contract,
                        );
                    }
                }
            }

            if memory_size > 0
                && let Err(err) = memory.resize(memory_size)
            {
                return self.fail(
                    err, logged, pc, op, gas_copy, cost, memory, stack, contract,
                );
            }

            if debug {
                self.trace_state(pc, op, gas_copy, cost, memory, stack, contract, None);
                logged = true;
            }

            match (operation.execute)(&mut pc, self, contract, memory, stack) {
                Ok(res) => {
                    // Keep the freshest sub-call buffer, even an empty one,
                    // so a later RETURNDATACOPY never sees stale data.
                    if operation.returns {
                        self.return_data = res.clone();
                    }
                    if operation.reverts {
                        return (res, Some(VMError::ExecutionReverted));
                    }
                    if operation.halts {
                        return (res, None);
                    }
                    if !operation.jumps {
                        pc += 1;
                    }
                }
                Err(err) => {
                    return self.fail(
                        err, logged, pc, op, gas_copy, cost, memory, stack, contract,
                    );
                }
            }
        }
        // Cancelled: stop cleanly before the next opcode; applied state
        // mutations stay for the caller's snapshot policy to discard.
        (Bytes::new(), None)
    }

    #[allow(clippy::too_many_arguments)]
    fn fail(
        &mut self,
        err: VMError,
        logged: bool,
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        contract: &Contract,
    ) -> (Bytes, Option<VMError>) {
        if self.vm_config.debug {
            if logged {
                self.trace_fault(pc, op, gas, cost, memory, stack, contract, &err);
            } else {
                self.trace_state(pc, op, gas, cost, memory, stack, contract, Some(&err));
            }
        }
        (Bytes::new(), Some(err))
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_state(
        &self,
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        contract: &Contract,
        err: Option<&VMError>,
    ) {
        if let Some(tracer) = &self.vm_config.tracer {
            tracer.borrow_mut().capture_state(
                pc,
                OpCode::from(op),
                gas,
                cost,
                memory,
                stack,
                contract,
                self.depth,
                err,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_fault(
        &self,
        pc: u64,
        op: u8,
        gas: u64,
        cost: u64,
        memory: &Memory,
        stack: &Stack,
        contract: &Contract,
        err: &VMError,
    ) {
        if let Some(tracer) = &self.vm_config.tracer {
            tracer.borrow_mut().capture_fault(
                pc,
                OpCode::from(op),
                gas,
                cost,
                memory,
                stack,
                contract,
                self.depth,
                err,
            );
        }
    }
}
