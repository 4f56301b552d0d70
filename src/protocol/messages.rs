//! WireGuard message wire formats
//!
//! Defines the two handshake packets the engine processes:
//! - Type 1: Handshake Initiation (148 bytes)
//! - Type 2: Handshake Response (92 bytes)
//!
//! Cookie Reply (3) and Transport Data (4) tags are recognized so captured
//! datagrams can be classified, but they carry no structures here.

use crate::error::ProtocolError;

/// WireGuard message types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    HandshakeInitiation = 1,
    HandshakeResponse = 2,
    CookieReply = 3,
    TransportData = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::HandshakeInitiation),
            2 => Ok(Self::HandshakeResponse),
            3 => Ok(Self::CookieReply),
            4 => Ok(Self::TransportData),
            _ => Err(ProtocolError::InvalidMessageType { msg_type: value }),
        }
    }
}

/// Handshake Initiation message (148 bytes)
///
/// ```text
/// type(1) | reserved(3) | sender_index(4) | ephemeral_public(32) |
/// encrypted_static(48) | encrypted_timestamp(28) | mac1(16) | mac2(16)
/// ```
#[derive(Debug, Clone)]
pub struct HandshakeInitiation {
    pub sender_index: u32,
    pub ephemeral_public: [u8; 32],
    pub encrypted_static: [u8; 48], // 32 bytes static + 16 bytes tag
    pub encrypted_timestamp: [u8; 28], // 12 bytes TAI64N + 16 bytes tag
    pub mac1: [u8; 16],
    pub mac2: [u8; 16],
}

impl HandshakeInitiation {
    /// Size of the handshake initiation message
    pub const SIZE: usize = 148;

    /// Create a new handshake initiation (MACs are zeroed, must be computed separately)
    pub fn new(
        sender_index: u32,
        ephemeral_public: [u8; 32],
        encrypted_static: [u8; 48],
        encrypted_timestamp: [u8; 28],
    ) -> Self {
        Self {
            sender_index,
            ephemeral_public,
            encrypted_static,
            encrypted_timestamp,
            mac1: [0u8; 16],
            mac2: [0u8; 16],
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];

        buf[0] = MessageType::HandshakeInitiation as u8;
        // buf[1..4] reserved (zeros)
        buf[4..8].copy_from_slice(&self.sender_index.to_le_bytes());
        buf[8..40].copy_from_slice(&self.ephemeral_public);
        buf[40..88].copy_from_slice(&self.encrypted_static);
        buf[88..116].copy_from_slice(&self.encrypted_timestamp);
        buf[116..132].copy_from_slice(&self.mac1);
        buf[132..148].copy_from_slice(&self.mac2);

        buf
    }

    /// Get bytes up to (but not including) mac1 for MAC1 computation
    pub fn bytes_for_mac1(&self) -> [u8; 116] {
        let full = self.to_bytes();
        let mut result = [0u8; 116];
        result.copy_from_slice(&full[..116]);
        result
    }

    /// Parse from bytes
    ///
    /// The length must be exactly 148: captured handshake datagrams carry
    /// nothing after mac2, so trailing bytes mean this is not an initiation.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != Self::SIZE {
            return Err(ProtocolError::InvalidMessageLength {
                expected: Self::SIZE,
                got: data.len(),
            });
        }

        if data[0] != MessageType::HandshakeInitiation as u8 {
            return Err(ProtocolError::InvalidMessageType { msg_type: data[0] });
        }

        let sender_index = u32::from_le_bytes(data[4..8].try_into().unwrap());

        let mut ephemeral_public = [0u8; 32];
        ephemeral_public.copy_from_slice(&data[8..40]);

        let mut encrypted_static = [0u8; 48];
        encrypted_static.copy_from_slice(&data[40..88]);

        let mut encrypted_timestamp = [0u8; 28];
        encrypted_timestamp.copy_from_slice(&data[88..116]);

        let mut mac1 = [0u8; 16];
        mac1.copy_from_slice(&data[116..132]);

        let mut mac2 = [0u8; 16];
        mac2.copy_from_slice(&data[132..148]);

        Ok(Self {
            sender_index,
            ephemeral_public,
            encrypted_static,
            encrypted_timestamp,
            mac1,
            mac2,
        })
    }
}

/// Handshake Response message (92 bytes)
///
/// ```text
/// type(1) | reserved(3) | sender_index(4) | receiver_index(4) |
/// ephemeral_public(32) | encrypted_nothing(16) | mac1(16) | mac2(16)
/// ```
#[derive(Debug, Clone)]
pub struct HandshakeResponse {
    pub sender_index: u32,
    pub receiver_index: u32,
    pub ephemeral_public: [u8; 32],
    pub encrypted_nothing: [u8; 16], // Just the auth tag
    pub mac1: [u8; 16],
    pub mac2: [u8; 16],
}

impl HandshakeResponse {
    /// Size of the handshake response message
    pub const SIZE: usize = 92;

    /// Create a new handshake response (MACs are zeroed, must be computed separately)
    pub fn new(
        sender_index: u32,
        receiver_index: u32,
        ephemeral_public: [u8; 32],
        encrypted_nothing: [u8; 16],
    ) -> Self {
        Self {
            sender_index,
            receiver_index,
            ephemeral_public,
            encrypted_nothing,
            mac1: [0u8; 16],
            mac2: [0u8; 16],
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];

        buf[0] = MessageType::HandshakeResponse as u8;
        // buf[1..4] reserved (zeros)
        buf[4..8].copy_from_slice(&self.sender_index.to_le_bytes());
        buf[8..12].copy_from_slice(&self.receiver_index.to_le_bytes());
        buf[12..44].copy_from_slice(&self.ephemeral_public);
        buf[44..60].copy_from_slice(&self.encrypted_nothing);
        buf[60..76].copy_from_slice(&self.mac1);
        buf[76..92].copy_from_slice(&self.mac2);

        buf
    }

    /// Get bytes up to (but not including) mac1 for MAC1 computation
    pub fn bytes_for_mac1(&self) -> [u8; 60] {
        let full = self.to_bytes();
        let mut result = [0u8; 60];
        result.copy_from_slice(&full[..60]);
        result
    }

    /// Parse from bytes
    ///
    /// The length must be exactly 92, as for initiations.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != Self::SIZE {
            return Err(ProtocolError::InvalidMessageLength {
                expected: Self::SIZE,
                got: data.len(),
            });
        }

        if data[0] != MessageType::HandshakeResponse as u8 {
            return Err(ProtocolError::InvalidMessageType { msg_type: data[0] });
        }

        let sender_index = u32::from_le_bytes(data[4..8].try_into().unwrap());
        let receiver_index = u32::from_le_bytes(data[8..12].try_into().unwrap());

        let mut ephemeral_public = [0u8; 32];
        ephemeral_public.copy_from_slice(&data[12..44]);

        let mut encrypted_nothing = [0u8; 16];
        encrypted_nothing.copy_from_slice(&data[44..60]);

        let mut mac1 = [0u8; 16];
        mac1.copy_from_slice(&data[60..76]);

        let mut mac2 = [0u8; 16];
        mac2.copy_from_slice(&data[76..92]);

        Ok(Self {
            sender_index,
            receiver_index,
            ephemeral_public,
            encrypted_nothing,
            mac1,
            mac2,
        })
    }
}

/// Get the message type from a packet
pub fn get_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::InvalidMessageLength {
            expected: 1,
            got: 0,
        });
    }
    MessageType::try_from(data[0])
}
