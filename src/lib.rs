//! Wireglass - Passive WireGuard Handshake Decryption
//!
//! An offline decryption engine for recorded WireGuard traffic. Given the
//! two handshake packets of a session and at least one party's secrets, it
//! replays the Noise IKpsk2 exchange and recovers the transport keys,
//! without ever participating in the protocol.
//!
//! # Features
//!
//! - Full Noise IKpsk2 handshake replay, from initiator or responder secrets
//! - MAC1 screening of candidate packets against candidate key sets
//! - Recovery of the initiator's static public key and TAI64N timestamp
//! - Direction-bound transport ciphers derived from the replayed exchange
//! - Secrets accepted as base64 strings or raw bytes; absent ones as zeros
//!
//! # Usage
//!
//! ```no_run
//! use wireglass::{check_mac1, process_initiation, process_response, KeyBundle, Role};
//!
//! fn main() -> anyhow::Result<()> {
//!     wireglass::init();
//!
//!     // Replaying as the responder: our static private key, the
//!     // initiator's public key, no ephemeral, no PSK
//!     let keys = KeyBundle::from_base64(
//!         "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=",
//!         "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=",
//!         "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
//!         "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
//!     )?;
//!
//!     let initiation: Vec<u8> = std::fs::read("initiation.bin")?;
//!     let response: Vec<u8> = std::fs::read("response.bin")?;
//!
//!     check_mac1(&initiation, keys.sender_mac1_key())?;
//!     let replay = process_initiation(&initiation, &keys, Role::Responder)?;
//!
//!     let ephemeral: [u8; 32] = initiation[8..40].try_into()?;
//!     let pair = process_response(&response, &keys, Role::Responder, &ephemeral, &replay.state)?;
//!     let (_i2r_key, _r2i_key) = pair.export_keys();
//!     Ok(())
//! }
//! ```

pub mod crypto;
pub mod error;
pub mod protocol;

pub use crypto::{init, is_initialized};
pub use error::{CryptoError, ProtocolError, Result, WireglassError};
pub use protocol::{
    check_mac1, get_message_type, process_initiation, process_response, Direction,
    InitiationResult, KeyBundle, MessageType, Role, SessionCipher, SessionKeyPair,
};
