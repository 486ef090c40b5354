use crate::errors::VMError;
use ethereum_types::U256;
use lazy_static::lazy_static;
use std::sync::Mutex;

/// Maximum stack depth, enforced by the interpreter's per-operation
/// max-stack pre-checks.
pub const STACK_LIMIT: usize = 1024;

/// How many spare stacks one pool keeps around.
const POOL_LIMIT: usize = 256;
/// How many pools the process-wide reservoir keeps around.
const POOL_OF_POOLS_CAP: usize = 25;

/// The word stack of one frame. Bounds are pre-validated by the
/// interpreter against the operation's min/max stack requirements, so the
/// underflow paths in here are unreachable in a well-formed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(STACK_LIMIT),
        }
    }

    pub fn data(&self) -> &[U256] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, value: U256) {
        self.data.push(value);
    }

    pub fn push_n(&mut self, values: &[U256]) {
        self.data.extend_from_slice(values);
    }

    pub fn pop(&mut self) -> Result<U256, VMError> {
        self.data.pop().ok_or(VMError::StackUnderflow {
            len: 0,
            required: 1,
        })
    }

    pub fn peek(&self) -> Result<U256, VMError> {
        self.back(0)
    }

    /// The n-th word counted from the top, zero based.
    pub fn back(&self, n: usize) -> Result<U256, VMError> {
        let len = self.data.len();
        len.checked_sub(n + 1)
            .and_then(|index| self.data.get(index))
            .copied()
            .ok_or(VMError::StackUnderflow {
                len,
                required: n + 1,
            })
    }

    /// Swaps the top word with the n-th from the top, one based.
    pub fn swap(&mut self, n: usize) -> Result<(), VMError> {
        let len = self.data.len();
        let top = len.checked_sub(1).ok_or(VMError::StackUnderflow { len, required: 1 })?;
        let other = len.checked_sub(n).ok_or(VMError::StackUnderflow { len, required: n })?;
        self.data.swap(other, top);
        Ok(())
    }

    /// Pushes a copy of the n-th word from the top, one based.
    pub fn dup(&mut self, n: usize) -> Result<(), VMError> {
        let value = self.back(n - 1)?;
        self.push(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Reusable stack buffers for one execution.
///
/// A pool is taken from the process-wide reservoir when an execution
/// enters and handed back when it exits, so nested frames share buffers
/// instead of reallocating per call.
#[derive(Debug, Default)]
pub struct StackPool {
    pool: Vec<Stack>,
}

impl StackPool {
    /// A cleared stack, reused when one is available.
    pub fn get_stack(&mut self) -> Stack {
        self.pool.pop().unwrap_or_else(Stack::new)
    }

    pub fn put_stack(&mut self, mut stack: Stack) {
        if self.pool.len() < POOL_LIMIT {
            stack.clear();
            self.pool.push(stack);
        }
    }

    /// Takes a pool from the shared reservoir, or starts a fresh one.
    pub fn acquire() -> StackPool {
        match POOL_OF_POOLS.lock() {
            Ok(mut pools) => pools.pop().unwrap_or_default(),
            Err(_) => StackPool::default(),
        }
    }

    /// Returns a pool to the shared reservoir.
    pub fn release(pool: StackPool) {
        if let Ok(mut pools) = POOL_OF_POOLS.lock()
            && pools.len() < POOL_OF_POOLS_CAP
        {
            pools.push(pool);
        }
    }
}

lazy_static! {
    static ref POOL_OF_POOLS: Mutex<Vec<StackPool>> =
        Mutex::new(Vec::with_capacity(POOL_OF_POOLS_CAP));
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn push_pop_round_trip() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), Ok(U256::from(2)));
        assert_eq!(stack.pop(), Ok(U256::from(1)));
        assert!(stack.pop().is_err());
    }

    #[test]
    fn back_counts_from_the_top() {
        let mut stack = Stack::new();
        stack.push_n(&[U256::from(10), U256::from(20), U256::from(30)]);
        assert_eq!(stack.back(0), Ok(U256::from(30)));
        assert_eq!(stack.back(2), Ok(U256::from(10)));
        assert!(stack.back(3).is_err());
    }

    #[test]
    fn swap_exchanges_with_the_top() {
        let mut stack = Stack::new();
        stack.push_n(&[U256::from(1), U256::from(2), U256::from(3)]);
        // SWAP2 semantics: top with the third word.
        stack.swap(3).unwrap();
        assert_eq!(stack.data(), &[U256::from(3), U256::from(2), U256::from(1)]);
    }

    #[test]
    fn dup_copies_the_word() {
        let mut stack = Stack::new();
        stack.push(U256::from(7));
        stack.dup(1).unwrap();
        assert_eq!(stack.data(), &[U256::from(7), U256::from(7)]);
    }

    #[test]
    fn pool_reuses_buffers() {
        let mut pool = StackPool::default();
        let mut stack = pool.get_stack();
        stack.push(U256::from(1));
        pool.put_stack(stack);
        let stack = pool.get_stack();
        assert!(stack.is_empty());
    }
}
