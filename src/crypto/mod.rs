//! Cryptographic primitives for WireGuard handshake replay
//!
//! This module provides the cryptographic operations the decryption engine
//! needs:
//! - BLAKE2s hashing, MAC, HMAC, and key derivation (blake2s)
//! - ChaCha20-Poly1305 AEAD (aead)
//! - X25519 Diffie-Hellman key exchange (x25519)
//! - Noise IKpsk2 transcript state (noise)
//!
//! Decryption entry points are gated behind [`init`], a one-time
//! process-wide self-check of the primitives.

use std::sync::OnceLock;

use crate::error::CryptoError;

pub mod aead;
pub mod blake2s;
pub mod noise;
pub mod x25519;

static INIT: OnceLock<bool> = OnceLock::new();

/// Initialize the crypto backend for this process
///
/// Runs known-answer checks over the X25519, BLAKE2s, and
/// ChaCha20-Poly1305 primitives and caches the verdict. Idempotent and
/// safe to call from any thread; every call after the first returns the
/// cached outcome. Returns `true` when the backend is usable.
pub fn init() -> bool {
    *INIT.get_or_init(self_check)
}

/// Whether [`init`] has completed successfully in this process
pub fn is_initialized() -> bool {
    INIT.get().copied().unwrap_or(false)
}

/// Guard for entry points that require a successful [`init`]
pub(crate) fn ensure_initialized() -> Result<(), CryptoError> {
    if is_initialized() {
        Ok(())
    } else {
        Err(CryptoError::NotInitialized)
    }
}

fn self_check() -> bool {
    x25519_check() && blake2s_check() && aead_check()
}

/// RFC 7748 section 6.1 base point multiplication
fn x25519_check() -> bool {
    let private = [
        0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2, 0x66,
        0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5, 0x1d, 0xb9,
        0x2c, 0x2a,
    ];
    let expected = [
        0x85, 0x20, 0xf0, 0x09, 0x89, 0x30, 0xa7, 0x54, 0x74, 0x8b, 0x7d, 0xdc, 0xb4, 0x3e, 0xf7,
        0x5a, 0x0d, 0xbf, 0x3a, 0x0d, 0x26, 0x38, 0x1a, 0xf4, 0xeb, 0xa4, 0xa9, 0x8e, 0xaa, 0x9b,
        0x4e, 0x6a,
    ];
    x25519::public_key(&private) == expected
}

/// The protocol's initial chaining key, HASH(CONSTRUCTION), is a fixed
/// public constant; recomputing it exercises the whole BLAKE2s path.
fn blake2s_check() -> bool {
    let expected = [
        0x60, 0xe2, 0x6d, 0xae, 0xf3, 0x27, 0xef, 0xc0, 0x2e, 0xc3, 0x35, 0xe2, 0xa0, 0x25, 0xd2,
        0xd0, 0x16, 0xeb, 0x42, 0x06, 0xf8, 0x72, 0x77, 0xf5, 0x2d, 0x38, 0xd1, 0x98, 0x8b, 0x78,
        0xcd, 0x36,
    ];
    noise::HandshakeState::initial_chain_key() == expected
}

/// Seal and open an empty payload, and make sure tampering is caught
fn aead_check() -> bool {
    let key = [0x0fu8; 32];
    let aad = b"aead self check";

    let sealed = match aead::encrypt(&key, 0, &[], aad) {
        Ok(sealed) => sealed,
        Err(_) => return false,
    };
    if aead::decrypt(&key, 0, &sealed, aad).is_err() {
        return false;
    }

    let mut tampered = sealed;
    tampered[0] ^= 0x01;
    aead::decrypt(&key, 0, &tampered, aad).is_err()
}
