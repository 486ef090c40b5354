use crate::contract::Contract;
use crate::db::Log;
use crate::errors::VMError;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::utils::u256_to_h256;
use crate::vm::Evm;
use bytes::Bytes;

/// Generic LOG, monomorphised per topic count.
pub(crate) fn op_log<const N: usize>(
    _pc: &mut u64,
    evm: &mut Evm<'_>,
    contract: &mut Contract,
    memory: &mut Memory,
    stack: &mut Stack,
) -> Result<Bytes, VMError> {
    let offset = stack.pop()?;
    let size = stack.pop()?;
    let mut topics = Vec::with_capacity(N);
    for _ in 0..N {
        topics.push(u256_to_h256(stack.pop()?));
    }
    let data = memory.get(offset.low_u64(), size.low_u64());
    evm.state.add_log(Log {
        address: contract.address(),
        topics,
        data,
        block_number: evm.context.block_number,
    });
    Ok(Bytes::new())
}
