//! Transport key delivery
//!
//! The yield of a decrypted handshake: two direction-bound AEAD contexts,
//! one per flow of the tunnel. Counters and replay policy for transport
//! data stay with the caller; passive observers read counters straight out
//! of captured transport headers.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{aead, blake2s};
use crate::error::CryptoError;

/// Transport data direction
///
/// Fixed by protocol role: an observer holding the responder's secrets
/// still labels keys by which party sent the data, not by which side it
/// was watching from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    InitiatorToResponder,
    ResponderToInitiator,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitiatorToResponder => write!(f, "initiator->responder"),
            Self::ResponderToInitiator => write!(f, "responder->initiator"),
        }
    }
}

/// One direction's transport AEAD context
///
/// Owns its ChaCha20-Poly1305 key and exposes only seal and open. The
/// 64-bit counter for each packet is supplied by the caller (transport
/// headers carry it at bytes 8..16, little-endian).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionCipher {
    key: [u8; 32],
    #[zeroize(skip)]
    direction: Direction,
}

impl SessionCipher {
    fn new(key: [u8; 32], direction: Direction) -> Self {
        Self { key, direction }
    }

    /// Which flow this cipher belongs to
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Decrypt one transport payload (no AAD in WireGuard transport data)
    pub fn open(&self, counter: u64, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::decrypt(&self.key, counter, ciphertext, &[])
    }

    /// Encrypt one transport payload
    pub fn seal(&self, counter: u64, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::encrypt(&self.key, counter, plaintext, &[])
    }

    pub(crate) fn key_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Both directions' transport ciphers for one completed handshake
pub struct SessionKeyPair {
    pub initiator_to_responder: SessionCipher,
    pub responder_to_initiator: SessionCipher,
}

impl SessionKeyPair {
    /// Derive both transport keys from the final chaining key
    ///
    /// (T_i2r, T_r2i) = KDF2(ck, empty). The direction assignment is part
    /// of the protocol and independent of the observer's role.
    pub(crate) fn derive(chaining_key: &[u8; 32]) -> Self {
        let (t_i2r, t_r2i) = blake2s::kdf2(chaining_key, &[]);
        Self {
            initiator_to_responder: SessionCipher::new(t_i2r, Direction::InitiatorToResponder),
            responder_to_initiator: SessionCipher::new(t_r2i, Direction::ResponderToInitiator),
        }
    }

    /// Raw transport keys as (initiator→responder, responder→initiator)
    ///
    /// For handing to downstream tooling (keylog files, other decryptors).
    /// In-process decryption should go through the ciphers instead.
    pub fn export_keys(&self) -> ([u8; 32], [u8; 32]) {
        (
            *self.initiator_to_responder.key_bytes(),
            *self.responder_to_initiator.key_bytes(),
        )
    }
}
