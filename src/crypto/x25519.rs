//! X25519 Diffie-Hellman operations
//!
//! Provides the Curve25519 scalar multiplications the handshake replay
//! performs. Keypair generation exists for fabricating traffic in tests and
//! tooling; the decryption paths themselves never draw randomness.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

/// Key length for X25519 (both private and public keys are 32 bytes)
pub const KEY_LEN: usize = 32;

/// Generate a new X25519 keypair
///
/// Returns (private_key, public_key)
pub fn generate_keypair() -> ([u8; KEY_LEN], [u8; KEY_LEN]) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (secret.to_bytes(), public.to_bytes())
}

/// Derive public key from private key
pub fn public_key(private_key: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
    let secret = StaticSecret::from(*private_key);
    PublicKey::from(&secret).to_bytes()
}

/// Perform X25519 Diffie-Hellman key exchange
///
/// Computes the shared secret from one party's private key and the other
/// party's public key.
pub fn dh(private_key: &[u8; KEY_LEN], public_key: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
    let secret = StaticSecret::from(*private_key);
    let public = PublicKey::from(*public_key);
    secret.diffie_hellman(&public).to_bytes()
}
