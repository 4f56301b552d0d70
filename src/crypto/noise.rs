//! Noise IKpsk2 transcript state for WireGuard handshake replay
//!
//! Implements the symmetric-state half of the Noise pattern WireGuard uses
//! (Noise_IKpsk2_25519_ChaChaPoly_BLAKE2s), as needed to recompute a
//! recorded handshake from captured bytes.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{aead, blake2s};
use crate::error::CryptoError;

/// Noise protocol construction string
pub const CONSTRUCTION: &[u8] = b"Noise_IKpsk2_25519_ChaChaPoly_BLAKE2s";

/// WireGuard identifier string
pub const IDENTIFIER: &[u8] = b"WireGuard v1 zx2c4 Jason@zx2c4.com";

/// Label for MAC1 key derivation
pub const LABEL_MAC1: &[u8] = b"mac1----";

/// Hash length (also chaining key length)
pub const HASH_LEN: usize = 32;

/// Noise transcript state: chaining key plus hash accumulator
///
/// One value per observed handshake. Both sides of a handshake walk through
/// identical states, which is what makes passive replay possible: feeding
/// the same packet bytes through the same mixing steps reproduces the keys.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HandshakeState {
    /// Chaining key for key derivation
    pub(crate) chaining_key: [u8; HASH_LEN],
    /// Hash accumulator
    pub(crate) hash: [u8; HASH_LEN],
}

impl HandshakeState {
    /// Initialize the chaining key from the construction string
    pub fn initial_chain_key() -> [u8; HASH_LEN] {
        blake2s::hash(CONSTRUCTION)
    }

    /// Initialize the hash chain with the responder's static public key
    ///
    /// h = HASH(HASH(CONSTRUCTION) || IDENTIFIER)
    /// h = HASH(h || responder_static_public)
    pub fn initial_hash(responder_static: &[u8; 32]) -> [u8; HASH_LEN] {
        let ck = Self::initial_chain_key();
        let h1 = blake2s::hash_two(&ck, IDENTIFIER);
        blake2s::hash_two(&h1, responder_static)
    }

    /// Create the pre-message state for a handshake
    ///
    /// In the IK pattern both parties anchor the transcript on the
    /// responder's static public key, so a single constructor serves
    /// whichever side's secrets the observer holds.
    pub fn new(responder_static: &[u8; 32]) -> Self {
        Self {
            chaining_key: Self::initial_chain_key(),
            hash: Self::initial_hash(responder_static),
        }
    }

    /// MixHash: h = HASH(h || data)
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.hash = blake2s::hash_two(&self.hash, data);
    }

    /// Chain-only mix: ck = KDF1(ck, input_key_material)
    ///
    /// Used where the protocol absorbs key material without drawing an
    /// encryption key (the ephemeral and the ee/se results in message 2).
    pub fn mix_chain(&mut self, input: &[u8]) {
        self.chaining_key = blake2s::kdf1(&self.chaining_key, input);
    }

    /// MixKey: (ck, k) = KDF2(ck, input_key_material)
    ///
    /// Updates chaining_key and returns the derived key
    pub fn mix_key(&mut self, input: &[u8]) -> [u8; 32] {
        let (new_ck, key) = blake2s::kdf2(&self.chaining_key, input);
        self.chaining_key = new_ck;
        key
    }

    /// MixKeyAndHash: (ck, temp_h, k) = KDF3(ck, input_key_material)
    ///
    /// Used for PSK mixing. Updates chaining_key, mixes temp_h into hash,
    /// and returns the derived key.
    pub fn mix_key_and_hash(&mut self, psk: &[u8; 32]) -> [u8; 32] {
        let (new_ck, temp_h, key) = blake2s::kdf3(&self.chaining_key, psk);
        self.chaining_key = new_ck;
        self.mix_hash(&temp_h);
        key
    }

    /// EncryptAndHash: encrypts plaintext with key, mixes ciphertext into hash
    ///
    /// c = AEAD-Encrypt(k, nonce=0, plaintext, h)
    /// h = HASH(h || c)
    pub fn encrypt_and_hash(
        &mut self,
        key: &[u8; 32],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = aead::encrypt(key, 0, plaintext, &self.hash)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// DecryptAndHash: decrypts a fixed-size field, mixes ciphertext into hash
    ///
    /// p = AEAD-Decrypt(k, nonce=0, ciphertext, h)
    /// h = HASH(h || ciphertext)
    ///
    /// The AAD is the hash value from before the ciphertext is absorbed; the
    /// transcript then takes the bytes exactly as they appeared on the wire.
    /// On failure the state is left untouched.
    pub fn decrypt_and_hash<const N: usize>(
        &mut self,
        key: &[u8; 32],
        ciphertext: &[u8],
    ) -> Result<[u8; N], CryptoError> {
        let plaintext = aead::decrypt_fixed::<N>(key, 0, ciphertext, &self.hash)?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }
}

/// Compute the MAC1 key from a peer's public key
///
/// mac1_key = HASH(LABEL_MAC1 || peer_public_key)
pub fn mac1_key(peer_public: &[u8; 32]) -> [u8; 32] {
    blake2s::hash_two(LABEL_MAC1, peer_public)
}
