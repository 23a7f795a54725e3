//! Fuzz target for context operations
//!
//! Drive every context operation with arbitrary, mostly malformed inputs.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary keys, signatures and hashes of any length
//! - Mixed capabilities: contexts with and without sign/verify
//! - Custom nonce callbacks that fail, return short nonces, or succeed once
//!
//! # Invariants
//!
//! - Every call returns a value or an error, never a panic
//! - Missing capabilities are reported before argument validation
//! - The software library never produces a protocol violation; only a
//!   callback returning a nonce of the wrong length does

#![no_main]

use arbitrary::Arbitrary;
use ecbind::{Context, ContextOptions, Error, NonceSpec, ProtocolViolation};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    verify: bool,
    sign: bool,
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Verify { msg32: Vec<u8>, sig: Vec<u8>, pubkey: Vec<u8> },
    Sign { msg32: Vec<u8>, seckey: Vec<u8>, nonce: NonceChoice },
    SignCompact { msg32: Vec<u8>, seckey: Vec<u8>, nonce: NonceChoice },
    Recover { msg32: Vec<u8>, sig64: Vec<u8>, compressed: bool, recid: u8 },
    SeckeyVerify { seckey: Vec<u8> },
    PubkeyVerify { pubkey: Vec<u8> },
    PubkeyCreate { seckey: Vec<u8>, compressed: bool },
    Decompress { pubkey: Vec<u8> },
    Export { seckey: Vec<u8>, compressed: bool },
    Import { privkey: Vec<u8> },
    TweakSecret { seckey: Vec<u8>, tweak: Vec<u8>, mul: bool },
    TweakPublic { pubkey: Vec<u8>, tweak: Vec<u8>, mul: bool },
}

#[derive(Debug, Clone, Arbitrary)]
enum NonceChoice {
    Absent,
    Default,
    Rfc6979,
    Null,
    Fixed(Vec<u8>),
    Fails,
}

impl NonceChoice {
    fn spec(&self) -> Option<NonceSpec<'static>> {
        match self {
            Self::Absent => None,
            Self::Default => Some(NonceSpec::Default),
            Self::Rfc6979 => Some(NonceSpec::Rfc6979),
            Self::Null => Some(NonceSpec::Null),
            // One candidate only; the signer keeps asking until the callback declines.
            Self::Fixed(bytes) => {
                let bytes = bytes.clone();
                Some(NonceSpec::attempt_only(move |attempt| {
                    Ok((attempt == 0).then(|| bytes.clone()))
                }))
            },
            Self::Fails => Some(NonceSpec::custom(|_, _, _| Err("refused".into()))),
        }
    }
}

fuzz_target!(|scenario: Scenario| {
    let options = ContextOptions { verify: scenario.verify, sign: scenario.sign };
    let Ok(ctx) = Context::new(options) else {
        return;
    };

    for op in scenario.ops {
        let result = run(&ctx, op);
        if let Err(err) = result {
            let short_nonce = matches!(err, Error::Protocol(ProtocolViolation::NonceLength { .. }));
            assert!(!err.is_protocol_violation() || short_nonce, "library misbehaved: {err}");
        }
    }
});

fn run(ctx: &Context, op: Op) -> Result<(), Error> {
    match op {
        Op::Verify { msg32, sig, pubkey } => {
            ctx.ecdsa_verify(msg32, sig, pubkey)?;
        },
        Op::Sign { msg32, seckey, nonce } => {
            ctx.ecdsa_sign(msg32, seckey, nonce.spec())?;
        },
        Op::SignCompact { msg32, seckey, nonce } => {
            ctx.ecdsa_sign_compact(msg32, seckey, nonce.spec())?;
        },
        Op::Recover { msg32, sig64, compressed, recid } => {
            ctx.ecdsa_recover_compact(msg32, sig64, compressed, recid)?;
        },
        Op::SeckeyVerify { seckey } => {
            ctx.ec_seckey_verify(seckey)?;
        },
        Op::PubkeyVerify { pubkey } => {
            ctx.ec_pubkey_verify(pubkey)?;
        },
        Op::PubkeyCreate { seckey, compressed } => {
            ctx.ec_pubkey_create(seckey, compressed)?;
        },
        Op::Decompress { pubkey } => {
            ctx.ec_pubkey_decompress(pubkey)?;
        },
        Op::Export { seckey, compressed } => {
            ctx.ec_privkey_export(seckey, compressed)?;
        },
        Op::Import { privkey } => {
            ctx.ec_privkey_import(privkey)?;
        },
        Op::TweakSecret { seckey, tweak, mul: false } => {
            ctx.ec_privkey_tweak_add(seckey, tweak)?;
        },
        Op::TweakSecret { seckey, tweak, mul: true } => {
            ctx.ec_privkey_tweak_mul(seckey, tweak)?;
        },
        Op::TweakPublic { pubkey, tweak, mul: false } => {
            ctx.ec_pubkey_tweak_add(pubkey, tweak)?;
        },
        Op::TweakPublic { pubkey, tweak, mul: true } => {
            ctx.ec_pubkey_tweak_mul(pubkey, tweak)?;
        },
    }
    Ok(())
}
