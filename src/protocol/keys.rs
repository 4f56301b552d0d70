//! Key material processing for handshake decryption
//!
//! Builds the per-role bundle of secrets an observer needs: the decoded
//! 32-byte keys, the derived local static public key, and the two
//! precomputed MAC1 keys used for cheap packet filtering.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, noise, x25519};
use crate::error::CryptoError;

/// Length shared by every secret the engine accepts
pub const KEY_LEN: usize = 32;

/// One observing party's key material
///
/// "Local" is the party whose secrets the observer holds; "remote" is that
/// party's peer. An all-zero secret means unknown: the bundle still serves
/// whatever the remaining material supports (MAC1 probing needs only public
/// keys), and a missing piece surfaces later as an authentication failure
/// rather than a construction error.
///
/// Private scalars and the PSK never leave the bundle; Diffie-Hellman
/// results are handed out instead.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyBundle {
    static_private: [u8; KEY_LEN],
    static_public: [u8; KEY_LEN],
    remote_static_public: [u8; KEY_LEN],
    ephemeral_private: [u8; KEY_LEN],
    psk: [u8; KEY_LEN],
    sender_mac1_key: [u8; KEY_LEN],
    receiver_mac1_key: [u8; KEY_LEN],
}

impl KeyBundle {
    /// Build a bundle from base64-encoded secrets
    ///
    /// Every value must decode to exactly 32 bytes. Unknown secrets are
    /// passed as the base64 encoding of 32 zero bytes.
    pub fn from_base64(
        static_private: &str,
        remote_static_public: &str,
        ephemeral_private: &str,
        preshared: &str,
    ) -> Result<Self, CryptoError> {
        crypto::ensure_initialized()?;

        let static_private = decode_key(static_private, "static private key")?;
        let remote_static_public = decode_key(remote_static_public, "remote static public key")?;
        let ephemeral_private = decode_key(ephemeral_private, "ephemeral private key")?;
        let psk = decode_key(preshared, "preshared key")?;

        Ok(Self::assemble(
            static_private,
            remote_static_public,
            ephemeral_private,
            psk,
        ))
    }

    /// Build a bundle from raw 32-byte secrets
    pub fn from_raw(
        static_private: [u8; KEY_LEN],
        remote_static_public: [u8; KEY_LEN],
        ephemeral_private: [u8; KEY_LEN],
        psk: [u8; KEY_LEN],
    ) -> Result<Self, CryptoError> {
        crypto::ensure_initialized()?;
        Ok(Self::assemble(
            static_private,
            remote_static_public,
            ephemeral_private,
            psk,
        ))
    }

    fn assemble(
        static_private: [u8; KEY_LEN],
        remote_static_public: [u8; KEY_LEN],
        ephemeral_private: [u8; KEY_LEN],
        psk: [u8; KEY_LEN],
    ) -> Self {
        // An absent private key has no meaningful public counterpart
        let static_public = if is_zero(&static_private) {
            [0u8; KEY_LEN]
        } else {
            x25519::public_key(&static_private)
        };

        let sender_mac1_key = noise::mac1_key(&static_public);
        let receiver_mac1_key = noise::mac1_key(&remote_static_public);

        Self {
            static_private,
            static_public,
            remote_static_public,
            ephemeral_private,
            psk,
            sender_mac1_key,
            receiver_mac1_key,
        }
    }

    /// The local party's derived static public key (zero when the private
    /// key is unknown)
    pub fn static_public(&self) -> &[u8; KEY_LEN] {
        &self.static_public
    }

    /// The remote party's static public key
    pub fn remote_static_public(&self) -> &[u8; KEY_LEN] {
        &self.remote_static_public
    }

    /// MAC1 key for packets the local party receives
    /// (peers key their MACs on the recipient's static public)
    pub fn sender_mac1_key(&self) -> &[u8; KEY_LEN] {
        &self.sender_mac1_key
    }

    /// MAC1 key for packets the local party sends
    pub fn receiver_mac1_key(&self) -> &[u8; KEY_LEN] {
        &self.receiver_mac1_key
    }

    /// Whether the local static private key is present
    pub fn has_static_private(&self) -> bool {
        !is_zero(&self.static_private)
    }

    /// Whether the local ephemeral private key is present
    ///
    /// Required only when replaying a handshake the local party initiated.
    pub fn has_ephemeral_private(&self) -> bool {
        !is_zero(&self.ephemeral_private)
    }

    /// DH between the local static private key and `public`
    pub(crate) fn dh_static(&self, public: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
        x25519::dh(&self.static_private, public)
    }

    /// DH between the local ephemeral private key and `public`
    pub(crate) fn dh_ephemeral(&self, public: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
        x25519::dh(&self.ephemeral_private, public)
    }

    pub(crate) fn psk(&self) -> &[u8; KEY_LEN] {
        &self.psk
    }
}

fn is_zero(key: &[u8; KEY_LEN]) -> bool {
    key.iter().all(|&b| b == 0)
}

/// Parse a base64-encoded 32-byte key
pub(crate) fn decode_key(value: &str, field_name: &str) -> Result<[u8; KEY_LEN], CryptoError> {
    let bytes = BASE64.decode(value).map_err(|_| CryptoError::InvalidKey {
        field: field_name.to_string(),
    })?;

    if bytes.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            got: bytes.len(),
        });
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}
