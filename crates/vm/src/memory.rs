use crate::errors::{InternalError, VMError};
use bytes::Bytes;
use ethereum_types::U256;

/// Byte-addressed, zero-initialised, grow-only memory of one frame.
///
/// The interpreter resizes before an operation runs, always to a word
/// multiple and only after the expansion cost was charged; the store and
/// load primitives assume the range is already covered.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    store: Vec<u8>,
    /// Total expansion cost charged so far, cached so each further
    /// expansion pays only the quadratic delta.
    pub(crate) last_gas_cost: u64,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.store
    }

    /// Grows the store to `size` bytes; never shrinks.
    pub fn resize(&mut self, size: u64) -> Result<(), VMError> {
        let size = usize::try_from(size).map_err(|_| InternalError::Overflow)?;
        if self.store.len() < size {
            self.store.resize(size, 0);
        }
        Ok(())
    }

    /// Copies `value` into `[offset, offset + size)`. The offset may exceed
    /// zero while the size is zero; that is a no-op.
    pub fn set(&mut self, offset: u64, size: u64, value: &[u8]) -> Result<(), VMError> {
        if size == 0 {
            return Ok(());
        }
        let offset = usize::try_from(offset).map_err(|_| InternalError::Overflow)?;
        let size = usize::try_from(size).map_err(|_| InternalError::Overflow)?;
        let end = offset.checked_add(size).ok_or(InternalError::Overflow)?;
        let target = self
            .store
            .get_mut(offset..end)
            .ok_or(InternalError::UnsizedMemory)?;
        let n = size.min(value.len());
        target[..n].copy_from_slice(&value[..n]);
        Ok(())
    }

    /// Writes a full word big-endian at `offset`, zero-filling all 32
    /// bytes first.
    pub fn set32(&mut self, offset: u64, value: U256) -> Result<(), VMError> {
        let offset = usize::try_from(offset).map_err(|_| InternalError::Overflow)?;
        let end = offset.checked_add(32).ok_or(InternalError::Overflow)?;
        let target = self
            .store
            .get_mut(offset..end)
            .ok_or(InternalError::UnsizedMemory)?;
        target.copy_from_slice(&value.to_big_endian());
        Ok(())
    }

    /// A copy of `[offset, offset + size)`.
    pub fn get(&self, offset: u64, size: u64) -> Bytes {
        Bytes::copy_from_slice(self.slice(offset, size))
    }

    /// Borrowed view of `[offset, offset + size)`; empty when the range
    /// was never sized.
    pub fn slice(&self, offset: u64, size: u64) -> &[u8] {
        if size == 0 {
            return &[];
        }
        let (Ok(offset), Ok(size)) = (usize::try_from(offset), usize::try_from(size)) else {
            return &[];
        };
        offset
            .checked_add(size)
            .and_then(|end| self.store.get(offset..end))
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn set_requires_a_prior_resize() {
        let mut memory = Memory::new();
        assert!(memory.set(0, 4, &[1, 2, 3, 4]).is_err());
        memory.resize(32).unwrap();
        memory.set(0, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(&memory.data()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn set32_zero_fills_the_word() {
        let mut memory = Memory::new();
        memory.resize(64).unwrap();
        memory.set(32, 32, &[0xFF; 32]).unwrap();
        memory.set32(32, U256::from(0x10)).unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 0x10;
        assert_eq!(memory.slice(32, 32), &expected);
    }

    #[test]
    fn memory_only_grows() {
        let mut memory = Memory::new();
        memory.resize(64).unwrap();
        memory.resize(32).unwrap();
        assert_eq!(memory.len(), 64);
    }

    #[test]
    fn unsized_reads_come_back_empty() {
        let memory = Memory::new();
        assert!(memory.slice(0, 32).is_empty());
        assert!(memory.get(100, 32).is_empty());
    }
}
