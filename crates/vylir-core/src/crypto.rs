use num_bigint::BigUint;
use tiny_keccak::{Hasher, Keccak};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut output = [0u8; 32];
    keccak.update(data);
    keccak.finalize(&mut output);
    output
}

/// First four bytes of the keccak256 digest of an ABI signature.
pub fn method_id(signature: &str) -> u32 {
    let digest = keccak256(signature.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Full keccak256 digest of an event signature, used as topic zero.
pub fn event_id(signature: &str) -> BigUint {
    BigUint::from_bytes_be(&keccak256(signature.as_bytes()))
}
