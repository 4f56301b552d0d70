//! AEAD primitives for WireGuard packet decryption
//!
//! Implements ChaCha20-Poly1305 with the WireGuard nonce layout, in both a
//! heap-allocating form for variable-length transport payloads and a
//! fixed-size form for the handshake fields.

use chacha20poly1305::{
    aead::{Aead, AeadInPlace, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce, Tag,
};

use crate::error::CryptoError;

/// Authentication tag length
pub const TAG_LEN: usize = 16;

/// ChaCha20-Poly1305 key length
pub const KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 nonce length
pub const NONCE_LEN: usize = 12;

/// Build the WireGuard nonce: 4 zero bytes + 8 bytes counter (little-endian)
fn nonce_for(counter: u64) -> [u8; NONCE_LEN] {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes[4..12].copy_from_slice(&counter.to_le_bytes());
    nonce_bytes
}

/// Encrypt plaintext using ChaCha20-Poly1305
///
/// WireGuard uses a 64-bit counter as the nonce, zero-padded to 96 bits.
/// The counter is placed in the last 8 bytes of the nonce (little-endian).
pub fn encrypt(
    key: &[u8; KEY_LEN],
    counter: u64,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let nonce_bytes = nonce_for(counter);
    let nonce = Nonce::from_slice(&nonce_bytes);

    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption)
}

/// Decrypt ciphertext using ChaCha20-Poly1305
///
/// Fails with `CryptoError::Decryption` if authentication fails.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    counter: u64,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Decryption);
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let nonce_bytes = nonce_for(counter);
    let nonce = Nonce::from_slice(&nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption)
}

/// Decrypt a handshake field of compile-time size
///
/// Handshake ciphertexts have fixed lengths, so the plaintext comes back as
/// an owned stack array with no allocation. `ciphertext` must be exactly
/// `N + TAG_LEN` bytes; anything else fails like a bad tag.
pub fn decrypt_fixed<const N: usize>(
    key: &[u8; KEY_LEN],
    counter: u64,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<[u8; N], CryptoError> {
    if ciphertext.len() != N + TAG_LEN {
        return Err(CryptoError::Decryption);
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let nonce_bytes = nonce_for(counter);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let (body, tag) = ciphertext.split_at(N);
    let mut plaintext = [0u8; N];
    plaintext.copy_from_slice(body);

    cipher
        .decrypt_in_place_detached(nonce, aad, &mut plaintext, Tag::from_slice(tag))
        .map_err(|_| CryptoError::Decryption)?;

    Ok(plaintext)
}
