use crate::contract::Contract;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::{h256_to_u256, keccak256};
use crate::vm::Evm;
use bytes::Bytes;

pub(crate) fn op_sha3(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    _contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let size = stack.pop()?;
    let data = memory.slice(offset.low_u64(), size.low_u64());
    let hash = keccak256(data);
    if evm.vm_config.enable_preimage_recording {
        evm.state.add_preimage(hash, data);
    }
    stack.push(h256_to_u256(hash));
    Ok(Bytes::new())
}
