//! Passive handshake replay
//!
//! Recomputes a recorded Noise IKpsk2 handshake from either party's
//! secrets. Nothing here transmits or responds: captured packet bytes are
//! fed through the same mixing steps the peers performed, which reproduces
//! the transport keys they agreed on.

use crate::crypto::{self, blake2s, noise};
use crate::error::{ProtocolError, Result};
use crate::protocol::keys::KeyBundle;
use crate::protocol::messages::{
    get_message_type, HandshakeInitiation, HandshakeResponse, MessageType,
};
use crate::protocol::session::SessionKeyPair;

/// TAI64N timestamp length (8 bytes seconds + 4 bytes nanoseconds)
pub const TIMESTAMP_LEN: usize = 12;

/// Which party's secrets a key bundle holds
///
/// The replay needs to know whose private keys it is working with: the
/// same packet is processed with different DH pairings depending on the
/// side. The recovered keys are identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The bundle belongs to the peer that sent the initiation
    Initiator,
    /// The bundle belongs to the peer that received it
    Responder,
}

/// Everything a replayed initiation yields
#[derive(Clone)]
pub struct InitiationResult {
    /// The initiator's static public key, decrypted from the packet
    pub sender_static_public: [u8; 32],
    /// Decrypted TAI64N timestamp (big-endian seconds, then nanoseconds)
    pub timestamp: [u8; TIMESTAMP_LEN],
    /// Session index the initiator chose for itself
    pub sender_index: u32,
    /// Transcript state to carry into response processing
    pub state: noise::HandshakeState,
}

/// Verify the mac1 field of a captured handshake packet
///
/// Works for both handshake message types: mac1 always covers every byte
/// before itself and sits 32 bytes from the end of the packet. The
/// comparison is constant time and the recomputed tag never leaves this
/// function.
///
/// Cheap enough to probe one packet against many candidate key sets; no
/// state is read or written.
pub fn check_mac1(packet: &[u8], mac1_key: &[u8; 32]) -> Result<()> {
    crypto::ensure_initialized()?;

    let expected_len = match get_message_type(packet)? {
        MessageType::HandshakeInitiation => HandshakeInitiation::SIZE,
        MessageType::HandshakeResponse => HandshakeResponse::SIZE,
        other => {
            return Err(ProtocolError::InvalidMessageType {
                msg_type: other as u8,
            }
            .into())
        }
    };
    if packet.len() != expected_len {
        return Err(ProtocolError::InvalidMessageLength {
            expected: expected_len,
            got: packet.len(),
        }
        .into());
    }

    // mac1 is followed only by the 16-byte mac2 field
    let mac1_offset = expected_len - 32;
    let mac1 = &packet[mac1_offset..mac1_offset + 16];
    if !blake2s::mac_verify(mac1_key, &packet[..mac1_offset], mac1) {
        return Err(ProtocolError::MacVerificationFailed.into());
    }

    Ok(())
}

/// Replay a captured handshake initiation
///
/// Walks the first half of the Noise transcript with the DH pairings the
/// given role can compute, decrypting the initiator's static public key
/// and timestamp along the way. Both roles arrive at the same transcript
/// state, which the caller keeps for [`process_response`].
///
/// Fails with a recoverable decryption error when the bundle's secrets do
/// not match the capture, including when a required private key was left
/// as zeros.
pub fn process_initiation(
    packet: &[u8],
    keys: &KeyBundle,
    role: Role,
) -> Result<InitiationResult> {
    crypto::ensure_initialized()?;

    let msg = HandshakeInitiation::from_bytes(packet)?;

    // The IK transcript is anchored on the responder's static public key
    let responder_static = match role {
        Role::Initiator => keys.remote_static_public(),
        Role::Responder => keys.static_public(),
    };
    let mut state = noise::HandshakeState::new(responder_static);

    // e
    state.mix_hash(&msg.ephemeral_public);
    state.mix_chain(&msg.ephemeral_public);

    // es: the initiator computed DH(E_i, S_r); rebuild it from whichever
    // private key this side holds
    let shared_es = match role {
        Role::Initiator => keys.dh_ephemeral(keys.remote_static_public()),
        Role::Responder => keys.dh_static(&msg.ephemeral_public),
    };
    let key = state.mix_key(&shared_es);

    // s: recover the initiator's static public key
    let sender_static_public = state.decrypt_and_hash::<32>(&key, &msg.encrypted_static)?;

    // ss: DH(S_i, S_r); the responder only learned S_i one step ago
    let shared_ss = match role {
        Role::Initiator => keys.dh_static(keys.remote_static_public()),
        Role::Responder => keys.dh_static(&sender_static_public),
    };
    let key = state.mix_key(&shared_ss);

    let timestamp = state.decrypt_and_hash::<TIMESTAMP_LEN>(&key, &msg.encrypted_timestamp)?;

    tracing::debug!(
        "Replayed initiation: sender_index={:#010x}",
        msg.sender_index
    );

    Ok(InitiationResult {
        sender_static_public,
        timestamp,
        sender_index: msg.sender_index,
        state,
    })
}

/// Replay a captured handshake response and derive the transport keys
///
/// `initiator_ephemeral` is the ephemeral public key from the matching
/// initiation (bytes 8..40 of that packet); only the responder role needs
/// it, but passing it unconditionally keeps call sites uniform.
///
/// The caller's transcript state is not consumed: processing works on a
/// copy, so a failed attempt (wrong PSK, mismatched capture) leaves the
/// state reusable against another candidate response.
pub fn process_response(
    packet: &[u8],
    keys: &KeyBundle,
    role: Role,
    initiator_ephemeral: &[u8; 32],
    state: &noise::HandshakeState,
) -> Result<SessionKeyPair> {
    crypto::ensure_initialized()?;

    let msg = HandshakeResponse::from_bytes(packet)?;

    let mut state = state.clone();

    // e
    state.mix_hash(&msg.ephemeral_public);
    state.mix_chain(&msg.ephemeral_public);

    // ee: DH(E_i, E_r)
    let shared_ee = match role {
        Role::Initiator => keys.dh_ephemeral(&msg.ephemeral_public),
        Role::Responder => keys.dh_ephemeral(initiator_ephemeral),
    };
    state.mix_chain(&shared_ee);

    // se: DH(S_i, E_r)
    let shared_se = match role {
        Role::Initiator => keys.dh_static(&msg.ephemeral_public),
        Role::Responder => keys.dh_ephemeral(keys.remote_static_public()),
    };
    state.mix_chain(&shared_se);

    // psk
    let key = state.mix_key_and_hash(keys.psk());

    // The empty payload carries only an authentication tag; opening it
    // proves the whole replay, PSK included, matches the capture
    state.decrypt_and_hash::<0>(&key, &msg.encrypted_nothing)?;

    tracing::debug!(
        "Replayed response: sender_index={:#010x} receiver_index={:#010x}",
        msg.sender_index,
        msg.receiver_index
    );

    Ok(SessionKeyPair::derive(&state.chaining_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::x25519;
    use crate::error::{CryptoError, WireglassError};
    use crate::protocol::session::Direction;
    use tai64::Tai64N;

    // A complete handshake recorded between two local peers, with both
    // parties' secrets. mac2 is all zeros in both packets (no cookie was
    // in effect).
    const INITIATION: [u8; 148] = [
        0x01, 0x00, 0x00, 0x00, 0x15, 0xcf, 0x47, 0xc7, 0x74, 0x4f, 0xc5, 0x7d,
        0x33, 0x64, 0x2a, 0x1c, 0xa5, 0x16, 0xfd, 0x83, 0x62, 0xa6, 0xfb, 0x90,
        0x8e, 0x4f, 0xdc, 0x04, 0x65, 0x49, 0xd8, 0x0f, 0xaa, 0xa3, 0x70, 0x4b,
        0x68, 0xc7, 0xcb, 0x73, 0xac, 0x70, 0x7e, 0x42, 0xe7, 0x63, 0x6c, 0xfb,
        0x87, 0xfd, 0x4d, 0x75, 0x5d, 0x68, 0x69, 0x4d, 0xf1, 0x75, 0x6f, 0xe4,
        0x08, 0x9a, 0x57, 0x40, 0xdf, 0x78, 0x72, 0x31, 0x04, 0x26, 0xd4, 0x34,
        0xed, 0x38, 0x4a, 0x75, 0x39, 0x35, 0x19, 0x8b, 0x27, 0x7a, 0x6d, 0x86,
        0x5a, 0x4a, 0x59, 0x7d, 0x1a, 0x15, 0x9f, 0x8b, 0xea, 0x3e, 0x20, 0xb4,
        0x46, 0x53, 0x99, 0xfb, 0xe6, 0xf2, 0x60, 0x2f, 0xa6, 0xb6, 0x57, 0xa8,
        0x89, 0x6a, 0xd6, 0x44, 0x36, 0x09, 0xcf, 0xd6, 0xd0, 0x27, 0xf0, 0x41,
        0xb4, 0xca, 0xe1, 0x01, 0x6f, 0x43, 0x51, 0x57, 0x03, 0x7f, 0x0e, 0xa9,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];

    const RESPONSE: [u8; 92] = [
        0x02, 0x00, 0x00, 0x00, 0x32, 0xfa, 0x1a, 0xac, 0x15, 0xcf, 0x47, 0xc7,
        0x19, 0x3c, 0xbb, 0x31, 0x1b, 0x41, 0x32, 0x23, 0x5f, 0xe1, 0x78, 0xaf,
        0x86, 0x2f, 0xc6, 0x7d, 0x31, 0x12, 0x2a, 0xbc, 0x0f, 0x08, 0x0e, 0xfa,
        0xfc, 0x5e, 0xa2, 0x7a, 0x9a, 0x94, 0xa1, 0x07, 0x50, 0xf4, 0x09, 0x20,
        0xef, 0x17, 0x86, 0xe0, 0x49, 0x47, 0x2e, 0x8b, 0x03, 0x59, 0x5e, 0x65,
        0x73, 0x0b, 0x94, 0xf1, 0x3b, 0x49, 0xd2, 0x94, 0xbf, 0x85, 0xf5, 0xca,
        0xd7, 0xf6, 0xef, 0x28, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    const INITIATOR_STATIC_PRIVATE: &str = "gBen0g0RVUOR4ehlFkWdDf18Ic//lxBIxa1PqvjTmEw=";
    const INITIATOR_EPHEMERAL_PRIVATE: &str = "wGygl2kFYdbJWIMtEmaSQAMONuX1+b2EZ9umhB6mCEo=";
    const INITIATOR_STATIC_PUBLIC: &str = "eKSmoueAzZ+0cLTiix9F+Hcu5X0VvTXlsNPGGwFwiS4=";
    const RESPONDER_STATIC_PRIVATE: &str = "QChaGDXeH3eQsbFAhueUNWFdq9KfpF3yl+eITjZbXEk=";
    const RESPONDER_EPHEMERAL_PRIVATE: &str = "ELwhlhseNwg64Fos0qJhXbSVeBc2lYVkqdmkLx3rekg=";
    const RESPONDER_STATIC_PUBLIC: &str = "JRI8Xc0zKP9kXk8qP84NdUQA04h6DLfFbwJn4g+/PFs=";
    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    const EXPECTED_TIMESTAMP: [u8; 12] = [
        0x40, 0x00, 0x00, 0x00, 0x5a, 0x99, 0x4d, 0x2c, 0x3b, 0x38, 0x94, 0x69,
    ];

    fn initiator_bundle() -> KeyBundle {
        KeyBundle::from_base64(
            INITIATOR_STATIC_PRIVATE,
            RESPONDER_STATIC_PUBLIC,
            INITIATOR_EPHEMERAL_PRIVATE,
            ZERO_KEY,
        )
        .unwrap()
    }

    fn responder_bundle() -> KeyBundle {
        KeyBundle::from_base64(
            RESPONDER_STATIC_PRIVATE,
            INITIATOR_STATIC_PUBLIC,
            RESPONDER_EPHEMERAL_PRIVATE,
            ZERO_KEY,
        )
        .unwrap()
    }

    fn initiator_ephemeral() -> [u8; 32] {
        INITIATION[8..40].try_into().unwrap()
    }

    fn decode(value: &str) -> [u8; 32] {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        BASE64.decode(value).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_check_mac1_under_both_parties_keys() {
        assert!(crypto::init());
        let initiator = initiator_bundle();
        let responder = responder_bundle();

        // The initiation is keyed on the responder's static public
        check_mac1(&INITIATION, initiator.receiver_mac1_key()).unwrap();
        check_mac1(&INITIATION, responder.sender_mac1_key()).unwrap();

        // The response on the initiator's
        check_mac1(&RESPONSE, responder.receiver_mac1_key()).unwrap();
        check_mac1(&RESPONSE, initiator.sender_mac1_key()).unwrap();
    }

    #[test]
    fn test_check_mac1_rejects_wrong_key() {
        assert!(crypto::init());
        let initiator = initiator_bundle();

        // Swapped direction: the initiation is not keyed on our own static
        let err = check_mac1(&INITIATION, initiator.sender_mac1_key()).unwrap_err();
        assert!(matches!(
            err,
            WireglassError::Protocol(ProtocolError::MacVerificationFailed)
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_check_mac1_rejects_corruption() {
        assert!(crypto::init());
        let initiator = initiator_bundle();

        // Flip a bit in the covered region
        let mut tampered = INITIATION;
        tampered[50] ^= 0x01;
        let err = check_mac1(&tampered, initiator.receiver_mac1_key()).unwrap_err();
        assert!(matches!(
            err,
            WireglassError::Protocol(ProtocolError::MacVerificationFailed)
        ));

        // Flip a bit in the tag itself
        let mut tampered = INITIATION;
        tampered[120] ^= 0x01;
        assert!(check_mac1(&tampered, initiator.receiver_mac1_key()).is_err());

        // mac2 is not covered and not checked
        let mut cookie_mac = RESPONSE;
        cookie_mac[80] = 0xff;
        check_mac1(&cookie_mac, initiator.sender_mac1_key()).unwrap();
    }

    #[test]
    fn test_check_mac1_rejects_malformed_packets() {
        assert!(crypto::init());
        let initiator = initiator_bundle();
        let key = initiator.receiver_mac1_key();

        let err = check_mac1(&INITIATION[..147], key).unwrap_err();
        assert!(matches!(
            err,
            WireglassError::Protocol(ProtocolError::InvalidMessageLength {
                expected: 148,
                got: 147,
            })
        ));

        let mut wrong_type = INITIATION;
        wrong_type[0] = 0x05;
        assert!(matches!(
            check_mac1(&wrong_type, key).unwrap_err(),
            WireglassError::Protocol(ProtocolError::InvalidMessageType { msg_type: 5 })
        ));

        // Cookie replies carry no mac1
        let mut cookie = INITIATION;
        cookie[0] = 0x03;
        assert!(matches!(
            check_mac1(&cookie, key).unwrap_err(),
            WireglassError::Protocol(ProtocolError::InvalidMessageType { msg_type: 3 })
        ));

        assert!(check_mac1(&[], key).is_err());
    }

    #[test]
    fn test_initiation_replay_as_initiator() {
        assert!(crypto::init());
        let initiator = initiator_bundle();

        let result = process_initiation(&INITIATION, &initiator, Role::Initiator).unwrap();

        // The recovered static is our own public key
        assert_eq!(&result.sender_static_public, initiator.static_public());
        assert_eq!(result.timestamp, EXPECTED_TIMESTAMP);
        assert_eq!(result.sender_index, 0xc747cf15);
    }

    #[test]
    fn test_initiation_replay_as_responder() {
        assert!(crypto::init());
        let responder = responder_bundle();

        let result = process_initiation(&INITIATION, &responder, Role::Responder).unwrap();

        // The recovered static matches the configured remote peer
        assert_eq!(
            &result.sender_static_public,
            responder.remote_static_public()
        );
        assert_eq!(result.timestamp, EXPECTED_TIMESTAMP);
        assert_eq!(result.sender_index, 0xc747cf15);
    }

    #[test]
    fn test_both_roles_reach_the_same_transcript_state() {
        assert!(crypto::init());

        let from_initiator =
            process_initiation(&INITIATION, &initiator_bundle(), Role::Initiator).unwrap();
        let from_responder =
            process_initiation(&INITIATION, &responder_bundle(), Role::Responder).unwrap();

        assert_eq!(from_initiator.state.hash, from_responder.state.hash);
        assert_eq!(
            from_initiator.state.chaining_key,
            from_responder.state.chaining_key
        );
    }

    #[test]
    fn test_response_replay_yields_matching_transport_keys() {
        assert!(crypto::init());
        let initiator = initiator_bundle();
        let responder = responder_bundle();
        let epub_i = initiator_ephemeral();

        let init_i = process_initiation(&INITIATION, &initiator, Role::Initiator).unwrap();
        let init_r = process_initiation(&INITIATION, &responder, Role::Responder).unwrap();

        let pair_i = process_response(&RESPONSE, &initiator, Role::Initiator, &epub_i, &init_i.state)
            .unwrap();
        let pair_r = process_response(&RESPONSE, &responder, Role::Responder, &epub_i, &init_r.state)
            .unwrap();

        let (i2r_a, r2i_a) = pair_i.export_keys();
        let (i2r_b, r2i_b) = pair_r.export_keys();
        assert_eq!(i2r_a, i2r_b);
        assert_eq!(r2i_a, r2i_b);

        // The two directions never share a key
        assert_ne!(i2r_a, r2i_a);

        assert_eq!(
            pair_i.initiator_to_responder.direction(),
            Direction::InitiatorToResponder
        );
        assert_eq!(
            pair_i.responder_to_initiator.direction(),
            Direction::ResponderToInitiator
        );
    }

    #[test]
    fn test_recovered_ciphers_carry_transport_data() {
        assert!(crypto::init());
        let epub_i = initiator_ephemeral();

        let init_i =
            process_initiation(&INITIATION, &initiator_bundle(), Role::Initiator).unwrap();
        let init_r =
            process_initiation(&INITIATION, &responder_bundle(), Role::Responder).unwrap();
        let pair_i = process_response(
            &RESPONSE,
            &initiator_bundle(),
            Role::Initiator,
            &epub_i,
            &init_i.state,
        )
        .unwrap();
        let pair_r = process_response(
            &RESPONSE,
            &responder_bundle(),
            Role::Responder,
            &epub_i,
            &init_r.state,
        )
        .unwrap();

        // Data sealed with one replay's cipher opens with the other's
        let sealed = pair_i.initiator_to_responder.seal(0, b"ping").unwrap();
        let opened = pair_r.initiator_to_responder.open(0, &sealed).unwrap();
        assert_eq!(opened, b"ping");

        let sealed = pair_r.responder_to_initiator.seal(7, b"pong").unwrap();
        let opened = pair_i.responder_to_initiator.open(7, &sealed).unwrap();
        assert_eq!(opened, b"pong");
    }

    #[test]
    fn test_replay_is_deterministic() {
        assert!(crypto::init());
        let responder = responder_bundle();
        let epub_i = initiator_ephemeral();

        let first = process_initiation(&INITIATION, &responder, Role::Responder).unwrap();
        let second = process_initiation(&INITIATION, &responder, Role::Responder).unwrap();
        assert_eq!(first.sender_static_public, second.sender_static_public);
        assert_eq!(first.timestamp, second.timestamp);
        assert_eq!(first.state.hash, second.state.hash);

        let pair_a = process_response(&RESPONSE, &responder, Role::Responder, &epub_i, &first.state)
            .unwrap();
        let pair_b =
            process_response(&RESPONSE, &responder, Role::Responder, &epub_i, &second.state)
                .unwrap();
        assert_eq!(pair_a.export_keys(), pair_b.export_keys());
    }

    #[test]
    fn test_corrupted_ciphertext_fails_recoverably() {
        assert!(crypto::init());
        let responder = responder_bundle();

        // Inside encrypted_static
        let mut tampered = INITIATION;
        tampered[45] ^= 0x01;
        let err = process_initiation(&tampered, &responder, Role::Responder).err().unwrap();
        assert!(matches!(err, WireglassError::Crypto(CryptoError::Decryption)));
        assert!(err.is_recoverable());

        // Inside encrypted_timestamp
        let mut tampered = INITIATION;
        tampered[100] ^= 0x01;
        assert!(process_initiation(&tampered, &responder, Role::Responder).is_err());
    }

    #[test]
    fn test_processors_reject_malformed_packets() {
        assert!(crypto::init());
        let responder = responder_bundle();
        let epub_i = initiator_ephemeral();

        assert!(matches!(
            process_initiation(&INITIATION[..100], &responder, Role::Responder).err().unwrap(),
            WireglassError::Protocol(ProtocolError::InvalidMessageLength {
                expected: 148,
                got: 100,
            })
        ));

        // A response where an initiation is expected, and vice versa
        assert!(process_initiation(&RESPONSE, &responder, Role::Responder).is_err());
        let state = noise::HandshakeState::new(responder.static_public());
        assert!(
            process_response(&INITIATION, &responder, Role::Responder, &epub_i, &state).is_err()
        );
    }

    #[test]
    fn test_wrong_static_key_fails_auth() {
        assert!(crypto::init());

        // Right shape, wrong secrets: decryption must fail, not panic
        let (random_private, _) = x25519::generate_keypair();
        let imposter = KeyBundle::from_raw(
            random_private,
            *initiator_bundle().static_public(),
            [0u8; 32],
            [0u8; 32],
        )
        .unwrap();

        let err = process_initiation(&INITIATION, &imposter, Role::Responder).err().unwrap();
        assert!(matches!(err, WireglassError::Crypto(CryptoError::Decryption)));
    }

    #[test]
    fn test_absent_ephemeral_fails_initiator_replay() {
        assert!(crypto::init());

        // An initiator bundle without the ephemeral cannot compute es
        let bundle = KeyBundle::from_base64(
            INITIATOR_STATIC_PRIVATE,
            RESPONDER_STATIC_PUBLIC,
            ZERO_KEY,
            ZERO_KEY,
        )
        .unwrap();
        assert!(!bundle.has_ephemeral_private());

        let err = process_initiation(&INITIATION, &bundle, Role::Initiator).err().unwrap();
        assert!(err.is_recoverable());

        // The responder role never needs it
        let responder = responder_bundle();
        process_initiation(&INITIATION, &responder, Role::Responder).unwrap();
    }

    #[test]
    fn test_wrong_psk_fails_response_only() {
        assert!(crypto::init());

        let bundle = KeyBundle::from_raw(
            decode(RESPONDER_STATIC_PRIVATE),
            decode(INITIATOR_STATIC_PUBLIC),
            decode(RESPONDER_EPHEMERAL_PRIVATE),
            [0x55u8; 32],
        )
        .unwrap();
        let epub_i = initiator_ephemeral();

        // The PSK only enters the transcript in the response
        let init = process_initiation(&INITIATION, &bundle, Role::Responder).unwrap();
        let err = process_response(&RESPONSE, &bundle, Role::Responder, &epub_i, &init.state)
            .err()
            .unwrap();
        assert!(matches!(err, WireglassError::Crypto(CryptoError::Decryption)));

        // The failed attempt did not damage the caller's state
        let good = responder_bundle();
        process_response(&RESPONSE, &good, Role::Responder, &epub_i, &init.state).unwrap();
    }

    #[test]
    fn test_fabricated_handshake_with_psk() {
        assert!(crypto::init());

        let (s_priv_i, s_pub_i) = x25519::generate_keypair();
        let (s_priv_r, s_pub_r) = x25519::generate_keypair();
        let (e_priv_i, e_pub_i) = x25519::generate_keypair();
        let (e_priv_r, e_pub_r) = x25519::generate_keypair();
        let psk = [0x2du8; 32];

        // Build message 1 the way an initiator would
        let mut transcript = noise::HandshakeState::new(&s_pub_r);
        transcript.mix_hash(&e_pub_i);
        transcript.mix_chain(&e_pub_i);
        let k = transcript.mix_key(&x25519::dh(&e_priv_i, &s_pub_r));
        let encrypted_static: [u8; 48] = transcript
            .encrypt_and_hash(&k, &s_pub_i)
            .unwrap()
            .try_into()
            .unwrap();
        let k = transcript.mix_key(&x25519::dh(&s_priv_i, &s_pub_r));
        let timestamp = Tai64N::now().to_bytes();
        let encrypted_timestamp: [u8; 28] = transcript
            .encrypt_and_hash(&k, &timestamp)
            .unwrap()
            .try_into()
            .unwrap();

        let mut msg1 =
            HandshakeInitiation::new(0x01020304, e_pub_i, encrypted_static, encrypted_timestamp);
        msg1.mac1 = blake2s::mac(&noise::mac1_key(&s_pub_r), &msg1.bytes_for_mac1());
        let initiation = msg1.to_bytes();

        // And message 2 the way the responder would
        transcript.mix_hash(&e_pub_r);
        transcript.mix_chain(&e_pub_r);
        transcript.mix_chain(&x25519::dh(&e_priv_r, &e_pub_i));
        transcript.mix_chain(&x25519::dh(&e_priv_r, &s_pub_i));
        let k = transcript.mix_key_and_hash(&psk);
        let encrypted_nothing: [u8; 16] = transcript
            .encrypt_and_hash(&k, &[])
            .unwrap()
            .try_into()
            .unwrap();

        let mut msg2 = HandshakeResponse::new(0x0a0b0c0d, 0x01020304, e_pub_r, encrypted_nothing);
        msg2.mac1 = blake2s::mac(&noise::mac1_key(&s_pub_i), &msg2.bytes_for_mac1());
        let response = msg2.to_bytes();

        // Replay it from both sides
        let initiator = KeyBundle::from_raw(s_priv_i, s_pub_r, e_priv_i, psk).unwrap();
        let responder = KeyBundle::from_raw(s_priv_r, s_pub_i, e_priv_r, psk).unwrap();

        check_mac1(&initiation, initiator.receiver_mac1_key()).unwrap();
        check_mac1(&initiation, responder.sender_mac1_key()).unwrap();
        check_mac1(&response, initiator.sender_mac1_key()).unwrap();
        check_mac1(&response, responder.receiver_mac1_key()).unwrap();

        let init_i = process_initiation(&initiation, &initiator, Role::Initiator).unwrap();
        let init_r = process_initiation(&initiation, &responder, Role::Responder).unwrap();
        assert_eq!(init_i.sender_static_public, s_pub_i);
        assert_eq!(init_r.sender_static_public, s_pub_i);
        assert_eq!(init_i.timestamp, timestamp);
        assert_eq!(init_i.sender_index, 0x01020304);

        let pair_i =
            process_response(&response, &initiator, Role::Initiator, &e_pub_i, &init_i.state)
                .unwrap();
        let pair_r =
            process_response(&response, &responder, Role::Responder, &e_pub_i, &init_r.state)
                .unwrap();
        assert_eq!(pair_i.export_keys(), pair_r.export_keys());

        let sealed = pair_i.initiator_to_responder.seal(0, b"fabricated").unwrap();
        assert_eq!(
            pair_r.initiator_to_responder.open(0, &sealed).unwrap(),
            b"fabricated"
        );
    }
}
