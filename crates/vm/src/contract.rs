use crate::analysis::{CodeBitmap, code_bitmap};
use crate::opcodes::OpCode;
use crate::utils::keccak256;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Jumpdest analyses keyed by code hash, shared down a call stack so each
/// contract's bitmap is computed at most once per execution.
pub type JumpdestCache = Rc<RefCell<FxHashMap<H256, CodeBitmap>>>;

/// The caller of a frame: either a plain account, or the frame that is
/// issuing the nested call. Delegate semantics require the frame variant.
#[derive(Clone, Copy)]
pub enum ContractRef<'a> {
    Account(Address),
    Contract(&'a Contract),
}

impl ContractRef<'_> {
    pub fn address(&self) -> Address {
        match self {
            ContractRef::Account(address) => *address,
            ContractRef::Contract(contract) => contract.address(),
        }
    }
}

/// One in-progress contract execution: code, input, remaining gas, value
/// and the identities the opcodes observe. Created by the dispatcher and
/// dropped when the call returns.
pub struct Contract {
    /// Caller reported by the CALLER opcode; delegate calls rewrite it to
    /// the parent's caller so origin semantics propagate along the chain.
    pub caller_address: Address,
    self_address: Address,

    jumpdests: JumpdestCache,
    /// Frame-local analysis, only used while no code hash is known.
    analysis: Option<CodeBitmap>,

    pub code: Bytes,
    pub code_hash: H256,
    /// Address the code was loaded from; drives precompile routing.
    pub code_addr: Option<Address>,
    pub input: Bytes,

    pub gas: u64,
    value: U256,
}

impl Contract {
    pub fn new(caller: ContractRef<'_>, object: Address, value: U256, gas: u64) -> Self {
        // Reuse the parent's jumpdest analyses when the caller is a frame.
        let jumpdests = match caller {
            ContractRef::Contract(parent) => Rc::clone(&parent.jumpdests),
            ContractRef::Account(_) => JumpdestCache::default(),
        };
        Self {
            caller_address: caller.address(),
            self_address: object,
            jumpdests,
            analysis: None,
            code: Bytes::new(),
            code_hash: H256::zero(),
            code_addr: None,
            input: Bytes::new(),
            gas,
            value,
        }
    }

    /// Turns the frame into a delegate call frame, taking caller and value
    /// from the parent.
    pub fn as_delegate(mut self, parent: &Contract) -> Self {
        self.caller_address = parent.caller_address;
        self.value = parent.value;
        self
    }

    /// Whether `dest` is a valid JUMP target: inside the code, a JUMPDEST
    /// byte, and not part of a PUSH immediate.
    pub fn valid_jumpdest(&mut self, dest: U256) -> bool {
        // A destination of 63 bits or more can never point into code.
        if dest.bits() >= 63 || dest.low_u64() >= self.code.len() as u64 {
            return false;
        }
        let udest = dest.low_u64();
        #[allow(clippy::as_conversions)] // bounded by code length
        if self.code[udest as usize] != u8::from(OpCode::JUMPDEST) {
            return false;
        }
        if self.code_hash != H256::zero() {
            // Shared analysis keyed by hash, populated on first miss.
            let mut cache = self.jumpdests.borrow_mut();
            let analysis = cache
                .entry(self.code_hash)
                .or_insert_with(|| code_bitmap(&self.code));
            return analysis.is_code(udest);
        }
        // No code hash means init code that is not in the trie yet; keep
        // the analysis local instead of polluting the shared cache.
        let analysis = self.analysis.get_or_insert_with(|| code_bitmap(&self.code));
        analysis.is_code(udest)
    }

    /// Byte at position `n`; past the end of code it reads as STOP.
    pub fn get_op(&self, n: u64) -> u8 {
        usize::try_from(n)
            .ok()
            .and_then(|n| self.code.get(n))
            .copied()
            .unwrap_or_default()
    }

    pub fn caller(&self) -> Address {
        self.caller_address
    }

    pub fn address(&self) -> Address {
        self.self_address
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    /// Deducts `gas` when the frame can afford it, reporting success.
    pub fn use_gas(&mut self, gas: u64) -> bool {
        if self.gas < gas {
            return false;
        }
        self.gas -= gas;
        true
    }

    pub fn set_call_code(&mut self, addr: Address, hash: H256, code: Bytes) {
        self.code = code;
        self.code_hash = hash;
        self.code_addr = Some(addr);
    }

    /// Installs code whose hash may still be zero (init code); without a
    /// hash the jumpdest analysis stays frame-local.
    pub fn set_code_optional_hash(&mut self, addr: Address, code_and_hash: &CodeAndHash) {
        self.code = code_and_hash.code.clone();
        self.code_hash = code_and_hash.hash;
        self.code_addr = Some(addr);
    }
}

/// Deployment code plus its lazily computed hash.
pub struct CodeAndHash {
    pub code: Bytes,
    hash: H256,
}

impl CodeAndHash {
    pub fn new(code: Bytes) -> Self {
        Self {
            code,
            hash: H256::zero(),
        }
    }

    /// Keccak of the code, computed on first use.
    pub fn hash(&mut self) -> H256 {
        if self.hash == H256::zero() {
            self.hash = keccak256(&self.code);
        }
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_code(code: &'static [u8]) -> Contract {
        let mut contract = Contract::new(
            ContractRef::Account(Address::zero()),
            Address::zero(),
            U256::zero(),
            100_000,
        );
        contract.set_call_code(
            Address::zero(),
            keccak256(code),
            Bytes::from_static(code),
        );
        contract
    }

    #[test]
    fn use_gas_reports_shortfall() {
        let mut contract = frame_with_code(&[0x00]);
        assert!(contract.use_gas(100_000));
        assert_eq!(contract.gas, 0);
        assert!(!contract.use_gas(1));
    }

    #[test]
    fn jumpdest_inside_push_immediate_is_invalid() {
        // PUSH1 0x5B STOP: byte 1 is 0x5B but is push data.
        let mut contract = frame_with_code(&[0x60, 0x5B, 0x00]);
        assert!(!contract.valid_jumpdest(U256::from(1)));
    }

    #[test]
    fn plain_jumpdest_is_valid() {
        let mut contract = frame_with_code(&[0x5B, 0x00]);
        assert!(contract.valid_jumpdest(U256::from(0)));
        assert!(!contract.valid_jumpdest(U256::from(1)));
        assert!(!contract.valid_jumpdest(U256::from(64)));
        assert!(!contract.valid_jumpdest(U256::MAX));
    }

    #[test]
    fn children_share_the_jumpdest_cache() {
        let mut parent = frame_with_code(&[0x5B, 0x00]);
        assert!(parent.valid_jumpdest(U256::zero()));

        let mut child = Contract::new(
            ContractRef::Contract(&parent),
            Address::zero(),
            U256::zero(),
            0,
        );
        child.set_call_code(Address::zero(), parent.code_hash, parent.code.clone());
        assert!(child.valid_jumpdest(U256::zero()));
        // One shared analysis for the one code hash.
        assert_eq!(parent.jumpdests.borrow().len(), 1);
    }

    #[test]
    fn delegate_takes_caller_and_value_from_parent() {
        let parent_caller = Address::from_low_u64_be(7);
        let mut parent = Contract::new(
            ContractRef::Account(parent_caller),
            Address::from_low_u64_be(8),
            U256::from(55),
            0,
        );
        parent.code = Bytes::from_static(&[0x00]);

        let child = Contract::new(
            ContractRef::Contract(&parent),
            parent.address(),
            U256::zero(),
            0,
        )
        .as_delegate(&parent);
        assert_eq!(child.caller(), parent_caller);
        assert_eq!(child.value(), U256::from(55));
    }
}
