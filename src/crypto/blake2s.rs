//! BLAKE2s cryptographic primitives for the WireGuard handshake
//!
//! Implements the BLAKE2s hash, keyed MAC, HMAC, and HKDF functions the
//! Noise IKpsk2 replay depends on.

use blake2::{
    digest::{consts::U16, FixedOutput, Mac as MacTrait, Update},
    Blake2s256, Blake2sMac, Digest,
};
use hmac::SimpleHmac;

/// Type alias for HMAC-BLAKE2s (RFC 2104 HMAC with BLAKE2s-256)
/// Uses SimpleHmac which works with any hash that implements the required traits
type HmacBlake2s = SimpleHmac<Blake2s256>;

/// Length of BLAKE2s-256 hash output
pub const HASH_LEN: usize = 32;

/// Length of BLAKE2s MAC output (16 bytes for WireGuard)
pub const MAC_LEN: usize = 16;

/// BLAKE2s-256 hash of a single input
pub fn hash(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Blake2s256::new();
    Digest::update(&mut hasher, data);
    hasher.finalize().into()
}

/// BLAKE2s-256 hash of two concatenated inputs: HASH(a || b)
pub fn hash_two(a: &[u8], b: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Blake2s256::new();
    Digest::update(&mut hasher, a);
    Digest::update(&mut hasher, b);
    hasher.finalize().into()
}

/// BLAKE2s keyed MAC (16 bytes output) with 32-byte key
/// Used for MAC1 in WireGuard handshake messages
pub fn mac(key: &[u8; HASH_LEN], data: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = Blake2sMac::<U16>::new_from_slice(key).expect("valid key length");
    MacTrait::update(&mut mac, data);
    mac.finalize_fixed().into()
}

/// Verify a BLAKE2s keyed MAC in constant time
///
/// Recomputes MAC(key, data) and compares it against `tag` without leaking
/// the mismatch position through timing. A `tag` of the wrong length fails.
pub fn mac_verify(key: &[u8; HASH_LEN], data: &[u8], tag: &[u8]) -> bool {
    let mut mac = Blake2sMac::<U16>::new_from_slice(key).expect("valid key length");
    MacTrait::update(&mut mac, data);
    mac.verify_slice(tag).is_ok()
}

/// HMAC-BLAKE2s implementation using standard RFC 2104 HMAC construction
///
/// This matches what boringtun and other WireGuard implementations use.
/// Despite the WireGuard whitepaper notation, implementations use the
/// standard HMAC construction: H((K ⊕ opad) || H((K ⊕ ipad) || M))
pub fn hmac(key: &[u8], data: &[u8]) -> [u8; HASH_LEN] {
    let mut mac = HmacBlake2s::new_from_slice(key).expect("HMAC accepts any key length");
    Update::update(&mut mac, data);
    mac.finalize_fixed().into()
}

/// KDF1: Single-output key derivation
/// Returns one 32-byte key
pub fn kdf1(key: &[u8; HASH_LEN], input: &[u8]) -> [u8; HASH_LEN] {
    let temp = hmac(key, input);
    hmac(&temp, &[0x01])
}

/// KDF2: Two-output key derivation
/// Returns two 32-byte keys
pub fn kdf2(key: &[u8; HASH_LEN], input: &[u8]) -> ([u8; HASH_LEN], [u8; HASH_LEN]) {
    let temp = hmac(key, input);

    // T1 = HMAC(temp, 0x01)
    let t1 = hmac(&temp, &[0x01]);

    // T2 = HMAC(temp, T1 || 0x02)
    let mut t2_input = [0u8; HASH_LEN + 1];
    t2_input[..HASH_LEN].copy_from_slice(&t1);
    t2_input[HASH_LEN] = 0x02;
    let t2 = hmac(&temp, &t2_input);

    (t1, t2)
}

/// KDF3: Three-output key derivation
/// Returns three 32-byte keys
pub fn kdf3(key: &[u8; HASH_LEN], input: &[u8]) -> ([u8; HASH_LEN], [u8; HASH_LEN], [u8; HASH_LEN]) {
    let temp = hmac(key, input);

    // T1 = HMAC(temp, 0x01)
    let t1 = hmac(&temp, &[0x01]);

    // T2 = HMAC(temp, T1 || 0x02)
    let mut t2_input = [0u8; HASH_LEN + 1];
    t2_input[..HASH_LEN].copy_from_slice(&t1);
    t2_input[HASH_LEN] = 0x02;
    let t2 = hmac(&temp, &t2_input);

    // T3 = HMAC(temp, T2 || 0x03)
    let mut t3_input = [0u8; HASH_LEN + 1];
    t3_input[..HASH_LEN].copy_from_slice(&t2);
    t3_input[HASH_LEN] = 0x03;
    let t3 = hmac(&temp, &t3_input);

    (t1, t2, t3)
}
