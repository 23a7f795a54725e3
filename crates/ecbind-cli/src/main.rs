//! ecbind command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Derive a public key
//! ecbind pubkey --seckey 428ad22c...7847
//!
//! # Sign a 32-byte hash with the RFC6979 generator
//! ecbind sign --seckey 428ad22c...7847 --msg32 07d046d5...ba3e --nonce rfc6979
//!
//! # Verify
//! ecbind verify --msg32 07d046d5...ba3e --sig 3045...da5f --pubkey 038fcf3e...e19f
//! ```

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use ecbind::{Context, ContextOptions, NonceSpec, Verification};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// secp256k1 operations through the ecbind marshalling layer
#[derive(Parser, Debug)]
#[command(name = "ecbind")]
#[command(about = "secp256k1 signing, verification and key recovery")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random key pair
    Keygen {
        /// Output an uncompressed (65-byte) public key
        #[arg(long)]
        uncompressed: bool,
    },

    /// Derive the public key of a secret key
    Pubkey {
        /// Secret key (hex, 32 bytes)
        #[arg(long)]
        seckey: String,

        /// Output an uncompressed (65-byte) public key
        #[arg(long)]
        uncompressed: bool,
    },

    /// Sign a 32-byte message hash
    Sign {
        /// Secret key (hex, 32 bytes)
        #[arg(long)]
        seckey: String,

        /// Message hash (hex, 32 bytes)
        #[arg(long, conflicts_with = "message")]
        msg32: Option<String>,

        /// Text message, hashed with double SHA-256
        #[arg(long)]
        message: Option<String>,

        /// Nonce generator (default, rfc6979, null)
        #[arg(long, default_value = "default")]
        nonce: String,

        /// Produce a compact signature with recovery id instead of DER
        #[arg(long)]
        compact: bool,
    },

    /// Verify a DER signature
    Verify {
        /// Message hash (hex, 32 bytes)
        #[arg(long)]
        msg32: String,

        /// DER signature (hex)
        #[arg(long)]
        sig: String,

        /// Public key (hex)
        #[arg(long)]
        pubkey: String,
    },

    /// Recover a public key from a compact signature
    Recover {
        /// Message hash (hex, 32 bytes)
        #[arg(long)]
        msg32: String,

        /// Compact signature (hex, 64 bytes)
        #[arg(long)]
        sig64: String,

        /// Recovery id (0..=3)
        #[arg(long)]
        recid: u8,

        /// Output an uncompressed (65-byte) public key
        #[arg(long)]
        uncompressed: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();
    run(args.command, &mut out)
}

fn run(command: Command, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Keygen { uncompressed } => {
            let ctx = Context::new(ContextOptions { verify: false, sign: true })?;
            let (seckey, pubkey) = ctx.generate_key_pair(!uncompressed)?;
            writeln!(out, "seckey {}", hex::encode(seckey))?;
            writeln!(out, "pubkey {}", hex::encode(pubkey))?;
        },
        Command::Pubkey { seckey, uncompressed } => {
            let ctx = Context::new(ContextOptions { verify: false, sign: true })?;
            let pubkey = ctx
                .ec_pubkey_create(hex::decode(seckey)?, !uncompressed)?
                .ok_or("invalid secret key")?;
            writeln!(out, "{}", hex::encode(pubkey))?;
        },
        Command::Sign { seckey, msg32, message, nonce, compact } => {
            let ctx = Context::new(ContextOptions { verify: false, sign: true })?;
            let msg32 = match (msg32, message) {
                (Some(msg32), _) => hex::decode(msg32)?,
                (None, Some(message)) => ecbind::message_hash(message).to_vec(),
                (None, None) => return Err("one of --msg32 or --message is required".into()),
            };
            let nonce: NonceSpec<'_> = nonce.parse()?;
            tracing::debug!(?nonce, compact, "signing");

            if compact {
                let signature = ctx
                    .ecdsa_sign_compact(&msg32, hex::decode(seckey)?, Some(nonce))?
                    .ok_or("nonce generation failed")?;
                writeln!(out, "{} {}", hex::encode(signature.signature), signature.recovery_id)?;
            } else {
                let sig = ctx
                    .ecdsa_sign(&msg32, hex::decode(seckey)?, Some(nonce))?
                    .ok_or("nonce generation failed")?;
                writeln!(out, "{}", hex::encode(sig))?;
            }
        },
        Command::Verify { msg32, sig, pubkey } => {
            let ctx = Context::new(ContextOptions { verify: true, sign: false })?;
            let verification =
                ctx.ecdsa_verify(hex::decode(msg32)?, hex::decode(sig)?, hex::decode(pubkey)?)?;
            let label = match verification {
                Verification::Valid => "valid",
                Verification::Invalid => "invalid",
                Verification::InvalidPublicKey => "invalid public key",
                Verification::InvalidSignature => "invalid signature",
            };
            writeln!(out, "{label}")?;
        },
        Command::Recover { msg32, sig64, recid, uncompressed } => {
            let ctx = Context::new(ContextOptions { verify: true, sign: false })?;
            let (msg32, sig64) = (hex::decode(msg32)?, hex::decode(sig64)?);
            let pubkey = ctx
                .ecdsa_recover_compact(msg32, sig64, !uncompressed, recid)?
                .ok_or("recovery failed")?;
            writeln!(out, "{}", hex::encode(pubkey))?;
        },
    }
    Ok(())
}
