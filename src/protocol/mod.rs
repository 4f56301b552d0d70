//! WireGuard protocol layer
//!
//! This module contains the core replay components:
//! - Message wire formats
//! - Key bundle processing
//! - Handshake replay (Noise IKpsk2)
//! - Transport key delivery

pub mod handshake;
pub mod keys;
pub mod messages;
pub mod session;

pub use handshake::{
    check_mac1, process_initiation, process_response, InitiationResult, Role,
};
pub use keys::KeyBundle;
pub use messages::{get_message_type, HandshakeInitiation, HandshakeResponse, MessageType};
pub use session::{Direction, SessionCipher, SessionKeyPair};
