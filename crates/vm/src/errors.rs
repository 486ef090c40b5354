use thiserror::Error;

/// Errors surfaced by the interpreter and the call/create dispatcher.
///
/// Every kind except [`VMError::ExecutionReverted`] is a
/// revert-state-and-consume-all-gas condition for the frame it occurs in.
/// The explicit revert restores the snapshot but preserves remaining gas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow ({len} <=> {required})")]
    StackUnderflow { len: usize, required: usize },
    #[error("stack limit reached {len} ({limit})")]
    StackOverflow { len: usize, limit: usize },
    #[error("invalid opcode 0x{0:x}")]
    InvalidOpcode(u8),
    #[error("invalid jump destination")]
    InvalidJump,
    #[error("gas uint64 overflow")]
    GasUintOverflow,
    #[error("write protection")]
    WriteProtection,
    #[error("max call depth exceeded")]
    Depth,
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    #[error("contract address collision")]
    ContractAddressCollision,
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,
    #[error("evm: max code size exceeded")]
    MaxCodeSizeExceeded,
    #[error("evm: execution reverted")]
    ExecutionReverted,
    #[error("evm: return data out of bounds")]
    ReturnDataOutOfBounds,
    #[error("no compatible interpreter")]
    NoCompatibleInterpreter,
    #[error("precompile: {0}")]
    Precompile(#[from] PrecompileError),
    #[error("internal: {0}")]
    Internal(#[from] InternalError),
}

impl VMError {
    /// True for the one error kind that keeps remaining gas.
    pub fn is_revert(&self) -> bool {
        matches!(self, VMError::ExecutionReverted)
    }
}

/// Failures inside a precompiled contract's input handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PrecompileError {
    #[error("invalid curve point")]
    InvalidPoint,
    #[error("invalid input")]
    InvalidInput,
}

/// Invariant violations. Reaching one of these is a bug in the VM, not in
/// the executed bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("memory written before being sized")]
    UnsizedMemory,
    #[error("delegate call without a parent frame")]
    DelegateWithoutParent,
}
