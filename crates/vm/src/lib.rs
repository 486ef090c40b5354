//! # corevm
//!
//! A table-driven interpreter and call/create dispatcher for
//! Ethereum-style bytecode: a 256-bit word stack, byte-addressed
//! expandable memory, a snapshotable account store behind a trait, and
//! gas accounting for every instruction and memory expansion.
//!
//! ## Architecture
//!
//! - [`vm::Evm`]: entry points for external and nested calls and creates,
//!   precompile routing, snapshot and gas policy
//! - [`interpreter`]: the fetch/validate/charge/execute loop
//! - [`jump_table`]: per-fork instruction tables; fork polymorphism is a
//!   table swap
//! - [`contract::Contract`]: one execution frame, with the shared
//!   jumpdest-analysis cache
//! - [`db::StateDB`]: the state backend trait, plus an in-memory
//!   implementation for tests and tooling
//! - [`runtime`]: a small harness that deploys and runs bytecode against
//!   a fresh state
//!
//! Execution is single threaded and cooperative; the one cross-thread
//! channel is the cancellation flag polled between opcodes.

pub mod analysis;
pub mod config;
pub mod contract;
pub mod db;
pub mod environment;
pub mod errors;
pub mod gas_cost;
pub mod instructions;
pub mod interpreter;
pub mod jump_table;
pub mod memory;
pub mod opcodes;
pub mod precompiles;
pub mod runtime;
pub mod stack;
pub mod tracing;
pub mod utils;
pub mod vm;

pub use config::{ChainConfig, Config, GasTable, Rules};
pub use contract::{Contract, ContractRef};
pub use db::{InMemoryState, Log, StateDB};
pub use environment::Context;
pub use errors::VMError;
pub use interpreter::{EvmInterpreter, Interpreter};
pub use memory::Memory;
pub use opcodes::OpCode;
pub use stack::Stack;
pub use tracing::{StructLog, StructLogger, Tracer};
pub use vm::Evm;
