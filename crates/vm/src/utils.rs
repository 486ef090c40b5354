use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use hex_literal::hex;
use sha3::{Digest, Keccak256};

/// Keccak-256 of the empty byte string; the code hash of every
/// codeless account.
pub const EMPTY_CODE_HASH: H256 = H256(hex!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
));

pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(data))
}

/// A `size`-byte slice of `data` starting at `start`, zero padded on the
/// right. Overflow safe.
pub fn get_data(data: &[u8], start: u64, size: u64) -> Bytes {
    let Ok(size_usize) = usize::try_from(size) else {
        return Bytes::new();
    };
    let length = u64::try_from(data.len()).unwrap_or(u64::MAX);
    let start = start.min(length);
    let end = start.saturating_add(size).min(length);
    let mut padded = vec![0u8; size_usize];
    #[allow(clippy::as_conversions)] // both bounded by data.len()
    let copy = &data[start as usize..end as usize];
    padded[..copy.len()].copy_from_slice(copy);
    Bytes::from(padded)
}

/// u64 view of a word, flagging values that do not fit.
pub fn u256_to_u64(value: U256) -> (u64, bool) {
    (value.low_u64(), value.bits() > 64)
}

/// Required memory size for an (offset, length) pair, flagging u64
/// overflow.
pub fn calc_mem_size64(offset: U256, length: U256) -> (u64, bool) {
    if length.bits() > 64 {
        return (0, true);
    }
    calc_mem_size64_with_uint(offset, length.low_u64())
}

/// Same as [`calc_mem_size64`] with a native length.
pub fn calc_mem_size64_with_uint(offset: U256, length: u64) -> (u64, bool) {
    // A zero length never touches memory, whatever the offset says.
    if length == 0 {
        return (0, false);
    }
    if offset.bits() > 64 {
        return (0, true);
    }
    let (value, overflow) = offset.low_u64().overflowing_add(length);
    (value, overflow)
}

pub fn word_to_address(word: U256) -> Address {
    Address::from_slice(&word.to_big_endian()[12..])
}

pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

pub fn u256_to_h256(word: U256) -> H256 {
    H256(word.to_big_endian())
}

pub fn h256_to_u256(hash: H256) -> U256 {
    U256::from_big_endian(hash.as_bytes())
}

/// Right-aligns arbitrary bytes into an address, the way hosts mint
/// readable test addresses.
pub fn bytes_to_address(bytes: &[u8]) -> Address {
    let mut out = [0u8; 20];
    let tail = &bytes[bytes.len().saturating_sub(20)..];
    out[20 - tail.len()..].copy_from_slice(tail);
    Address::from(out)
}

/// Contract address for the sender-and-nonce scheme.
pub fn create_address(caller: Address, nonce: u64) -> Address {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(&caller);
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    Address::from_slice(&hash.as_bytes()[12..])
}

/// Contract address for the salted scheme:
/// keccak(0xff ++ caller ++ salt ++ keccak(init_code))[12..].
pub fn create2_address(caller: Address, salt: U256, code_hash: H256) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update([0xFF]);
    hasher.update(caller.as_bytes());
    hasher.update(salt.to_big_endian());
    hasher.update(code_hash.as_bytes());
    Address::from_slice(&hasher.finalize()[12..])
}
