//! Wireglass CLI - Offline WireGuard Handshake Decryption
//!
//! Feeds recorded handshake packets through the replay engine and prints
//! what they yield: the initiator's identity and timestamp from the
//! initiation, and the two transport keys once the response is processed.

use std::process::ExitCode;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::{Parser, ValueEnum};
use tai64::Tai64N;
use tracing_subscriber::{fmt, EnvFilter};

use wireglass::crypto::noise::HandshakeState;
use wireglass::protocol::HandshakeResponse;
use wireglass::{
    check_mac1, get_message_type, process_initiation, process_response, Direction, KeyBundle,
    MessageType, Role, WireglassError,
};

/// Base64 encoding of 32 zero bytes, the "not supplied" marker
const ABSENT_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Which party's secrets are being supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    /// The keys belong to the peer that sent the initiation
    Initiator,
    /// The keys belong to the peer that received it
    Responder,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Initiator => Role::Initiator,
            RoleArg::Responder => Role::Responder,
        }
    }
}

/// Wireglass - decrypt recorded WireGuard handshakes
#[derive(Parser, Debug)]
#[command(name = "wireglass")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Whose secrets the key options carry
    #[arg(short, long, value_enum)]
    role: RoleArg,

    /// Local static private key (base64)
    #[arg(long, default_value = ABSENT_KEY)]
    static_private: String,

    /// Remote peer's static public key (base64)
    #[arg(long, default_value = ABSENT_KEY)]
    peer_public: String,

    /// Local ephemeral private key from the captured session (base64)
    #[arg(long, default_value = ABSENT_KEY)]
    ephemeral_private: String,

    /// Pre-shared key, if the peers use one (base64)
    #[arg(long, default_value = ABSENT_KEY)]
    preshared: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Captured packets as hex strings, in capture order
    #[arg(required = true)]
    packets: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<WireglassError>() {
            Some(we) => {
                eprintln!("Error: {}", we.user_message());
                ExitCode::from(we.exit_code())
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(1)
            }
        },
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    anyhow::ensure!(wireglass::init(), "crypto self-check failed");

    let keys = KeyBundle::from_base64(
        &args.static_private,
        &args.peer_public,
        &args.ephemeral_private,
        &args.preshared,
    )
    .map_err(WireglassError::from)?;
    let role = Role::from(args.role);

    if !keys.has_static_private() {
        tracing::warn!("No static private key supplied; decryption will fail");
    }
    if role == Role::Initiator && !keys.has_ephemeral_private() {
        tracing::warn!("Initiator role without an ephemeral private key; decryption will fail");
    }

    // The transcript state and initiator ephemeral from the most recent
    // initiation, awaiting its response
    let mut pending: Option<(HandshakeState, [u8; 32])> = None;

    for (i, packet_hex) in args.packets.iter().enumerate() {
        let n = i + 1;
        let packet = hex::decode(packet_hex)
            .with_context(|| format!("packet {} is not valid hex", n))?;

        match get_message_type(&packet).map_err(WireglassError::from)? {
            MessageType::HandshakeInitiation => {
                let mac1_key = match role {
                    Role::Initiator => keys.receiver_mac1_key(),
                    Role::Responder => keys.sender_mac1_key(),
                };
                check_mac1(&packet, mac1_key)
                    .with_context(|| format!("packet {} failed mac1 screening", n))?;

                let replay = process_initiation(&packet, &keys, role)
                    .with_context(|| format!("packet {} could not be replayed", n))?;

                println!("Handshake initiation (packet {})", n);
                println!("  sender index:  {:#010x}", replay.sender_index);
                println!(
                    "  sender static: {}",
                    BASE64.encode(replay.sender_static_public)
                );
                println!("  timestamp:     {}", format_timestamp(&replay.timestamp));

                let mut ephemeral = [0u8; 32];
                ephemeral.copy_from_slice(&packet[8..40]);
                pending = Some((replay.state, ephemeral));
            }

            MessageType::HandshakeResponse => {
                let mac1_key = match role {
                    Role::Initiator => keys.sender_mac1_key(),
                    Role::Responder => keys.receiver_mac1_key(),
                };
                check_mac1(&packet, mac1_key)
                    .with_context(|| format!("packet {} failed mac1 screening", n))?;

                let Some((state, ephemeral)) = pending.as_ref() else {
                    anyhow::bail!("packet {} is a response with no preceding initiation", n);
                };

                let msg = HandshakeResponse::from_bytes(&packet).map_err(WireglassError::from)?;
                let pair = process_response(&packet, &keys, role, ephemeral, state)
                    .with_context(|| format!("packet {} could not be replayed", n))?;
                let (i2r, r2i) = pair.export_keys();

                println!("Handshake response (packet {})", n);
                println!("  sender index:   {:#010x}", msg.sender_index);
                println!("  receiver index: {:#010x}", msg.receiver_index);
                println!(
                    "  {}: {}",
                    Direction::InitiatorToResponder,
                    BASE64.encode(i2r)
                );
                println!(
                    "  {}: {}",
                    Direction::ResponderToInitiator,
                    BASE64.encode(r2i)
                );
            }

            MessageType::CookieReply => {
                tracing::info!("Packet {}: cookie reply, nothing to replay", n);
            }

            MessageType::TransportData => {
                tracing::info!(
                    "Packet {}: transport data ({} bytes), not a handshake message",
                    n,
                    packet.len()
                );
            }
        }
    }

    Ok(())
}

/// Render a TAI64N timestamp as a unix time, falling back to hex when the
/// value is out of range
fn format_timestamp(timestamp: &[u8; 12]) -> String {
    if let Ok(ts) = Tai64N::from_slice(timestamp) {
        let system_time = ts.to_system_time();
        if let Ok(unix) = system_time.duration_since(std::time::UNIX_EPOCH) {
            return format!("{}.{:09} (unix)", unix.as_secs(), unix.subsec_nanos());
        }
    }
    format!("{} (raw)", hex::encode(timestamp))
}
