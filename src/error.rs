//! Error types for the Wireglass decryption engine

use thiserror::Error;

/// Main error type for Wireglass
#[derive(Error, Debug)]
pub enum WireglassError {
    /// Cryptographic errors
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Protocol errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Cryptographic operation errors
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed: invalid ciphertext or authentication tag")]
    Decryption,

    #[error("Invalid base64 key: {field}")]
    InvalidKey { field: String },

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Crypto backend not initialized")]
    NotInitialized,
}

/// Protocol-level errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message type: {msg_type}")]
    InvalidMessageType { msg_type: u8 },

    #[error("Invalid message length: expected {expected}, got {got}")]
    InvalidMessageLength { expected: usize, got: usize },

    #[error("MAC verification failed")]
    MacVerificationFailed,
}

impl WireglassError {
    /// Get a user-friendly error message with suggested action
    pub fn user_message(&self) -> String {
        match self {
            Self::Crypto(CryptoError::InvalidKey { field }) => {
                format!(
                    "Invalid {}. Expected a 32-byte base64-encoded key.",
                    field
                )
            }

            Self::Crypto(CryptoError::InvalidKeyLength { expected, got }) => {
                format!(
                    "Key has wrong length: expected {} bytes, got {}.",
                    expected, got
                )
            }

            Self::Crypto(CryptoError::Decryption) => {
                "Decryption failed. The supplied keys do not match this handshake.".to_string()
            }

            Self::Crypto(CryptoError::NotInitialized) => {
                "Crypto backend not initialized. Call wireglass::init() first.".to_string()
            }

            Self::Protocol(ProtocolError::MacVerificationFailed) => {
                "MAC verification failed. The configured static public key may be incorrect."
                    .to_string()
            }

            _ => format!("{}", self),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Authentication failures are the normal outcome of probing a packet
    /// with the wrong candidate keys; callers drop the attempt and move on.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Crypto(CryptoError::Decryption) => true,
            Self::Protocol(ProtocolError::MacVerificationFailed) => true,

            // Malformed input and missing initialization are caller bugs
            _ => false,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Protocol(_) => 4,
            Self::Crypto(_) => 5,
        }
    }
}

/// Result type alias for Wireglass operations
pub type Result<T> = std::result::Result<T, WireglassError>;
