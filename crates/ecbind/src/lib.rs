//! Context and argument marshalling for the secp256k1 C ABI.
//!
//! `ecbind` sits between Rust callers and a native secp256k1 library reached
//! through the [`ForeignLibrary`] function table. It owns the native context
//! handle, validates and lays out every argument the way the C calling
//! convention expects, decodes integer result codes into typed outcomes, and
//! bridges Rust nonce callbacks into native function pointers.
//!
//! # Example
//!
//! ```
//! use ecbind::{Context, ContextOptions, NonceSpec, Verification};
//!
//! let ctx = Context::new(ContextOptions::all())?;
//! let seckey = [0x42; 32];
//! let msg32 = ecbind::message_hash(b"hello");
//!
//! let pubkey = ctx.ec_pubkey_create(seckey, true)?.ok_or("invalid key")?;
//! let sig = ctx.ecdsa_sign(msg32, seckey, Some(NonceSpec::Rfc6979))?.ok_or("no nonce")?;
//! assert_eq!(ctx.ecdsa_verify(msg32, &sig, &pubkey)?, Verification::Valid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Errors
//!
//! Argument validation, missing capabilities and native contract violations
//! are [`Error`]s. A signature that does not verify, a key that is out of
//! range or a nonce callback that declines are ordinary results (`Ok(None)`,
//! `Ok(false)`, [`Verification::Invalid`]).
//!
//! # Threads
//!
//! [`Context`] is `Send + Sync`; share it through `Arc`. Custom nonce
//! callbacks run on the calling thread during the native call.

pub mod argument;
mod context;
pub mod error;
pub mod message;
pub mod nonce;
pub mod options;

pub use context::{Context, RecoverableSignature, Verification, default_library};
pub use ecbind_sys::ForeignLibrary;
pub use error::{ArgumentError, BoxError, Error, ProtocolViolation};
pub use message::{message_hash, recover_message, sign_message};
pub use nonce::{
    NonceCallback, NonceSpec, WhenAbsent, nonce_function_default, nonce_function_rfc6979,
};
pub use options::{Capability, ContextOptions};
