//! Native function surface for the secp256k1 C ABI.
//!
//! Declares the opaque context type, the nonce callback signature, the
//! capability bits and the [`ForeignLibrary`] table holding one function
//! pointer per native entry point. Nothing here validates arguments; callers
//! go through the marshalling layer in the `ecbind` crate.
//!
//! Two providers fill the table:
//!
//! - `ecbind-soft`: a pure-Rust implementation of the same ABI
//! - [`system()`] (feature `system`): the functions exported by a system
//!   `libsecp256k1`
//!
//! # ABI
//!
//! Lengths are C `int`. Variable-length outputs take an `int*` cell that holds
//! the buffer capacity on entry and the written length on exit. Every function
//! returning `int` reports success as `1` and failure as `0`, except
//! `secp256k1_ecdsa_verify`, which also returns `-1` (bad public key) and `-2`
//! (bad signature encoding).

#![allow(non_camel_case_types)]
#![deny(missing_docs)]

#[cfg(feature = "system")]
mod system;

use std::marker::{PhantomData, PhantomPinned};

pub use libc::{c_int, c_uchar, c_uint, c_void};
#[cfg(feature = "system")]
pub use system::system;

/// Context flag enabling verification (`SECP256K1_START_VERIFY`).
pub const SECP256K1_START_VERIFY: c_int = 1 << 0;

/// Context flag enabling signing (`SECP256K1_START_SIGN`).
pub const SECP256K1_START_SIGN: c_int = 1 << 1;

/// Length of a message hash.
pub const HASH_LENGTH: usize = 32;

/// Length of a secret key.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Length of a tweak scalar.
pub const TWEAK_LENGTH: usize = 32;

/// Length of a nonce produced by a nonce function.
pub const NONCE_LENGTH: usize = 32;

/// Length of a compact (r, s) signature.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Upper bound of a DER-encoded ECDSA signature.
pub const MAX_SIGNATURE_LENGTH: usize = 72;

/// Length of a compressed public key.
pub const COMPRESSED_PUBKEY_LENGTH: usize = 33;

/// Length of an uncompressed public key.
pub const UNCOMPRESSED_PUBKEY_LENGTH: usize = 65;

/// Upper bound of a serialized public key.
pub const MAX_PUBKEY_LENGTH: usize = UNCOMPRESSED_PUBKEY_LENGTH;

/// Public key lengths accepted by in-place public key operations.
pub const VALID_PUBKEY_LENGTHS: [usize; 2] = [COMPRESSED_PUBKEY_LENGTH, UNCOMPRESSED_PUBKEY_LENGTH];

/// Upper bound of a DER-encoded private key.
///
/// Matches the largest `ec_privkey_export` output of libsecp256k1 (explicit
/// curve parameters with an uncompressed public key).
pub const MAX_PRIVKEY_DER_LENGTH: usize = 279;

/// Opaque native context (`secp256k1_context_t`).
///
/// Only ever handled through raw pointers. Not `Send`, not `Sync`, not
/// `Unpin`: the owner decides what sharing is sound.
#[repr(C)]
pub struct secp256k1_context_t {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Nonce generation callback (`secp256k1_nonce_function_t`).
///
/// Arguments: `nonce32` (out, 32 bytes), `msg32`, `key32`, `attempt`,
/// `data`. Returns 1 when a nonce was written, 0 when generation failed.
/// `None` is the C null pointer.
pub type secp256k1_nonce_function_t = Option<
    unsafe extern "C" fn(
        nonce32: *mut c_uchar,
        msg32: *const c_uchar,
        key32: *const c_uchar,
        attempt: c_uint,
        data: *const c_void,
    ) -> c_int,
>;

/// Table of native entry points.
///
/// Field names mirror the C symbols. The two nonce-function pointers are read
/// once when the table is built and handed out unchanged for every call.
#[derive(Clone, Copy)]
pub struct ForeignLibrary {
    /// `secp256k1_context_t* secp256k1_context_create(int flags)`
    pub secp256k1_context_create: unsafe extern "C" fn(flags: c_int) -> *mut secp256k1_context_t,

    /// `secp256k1_context_t* secp256k1_context_clone(const secp256k1_context_t* ctx)`
    pub secp256k1_context_clone:
        unsafe extern "C" fn(ctx: *const secp256k1_context_t) -> *mut secp256k1_context_t,

    /// `void secp256k1_context_destroy(secp256k1_context_t* ctx)`
    pub secp256k1_context_destroy: unsafe extern "C" fn(ctx: *mut secp256k1_context_t),

    /// `int secp256k1_ecdsa_verify(ctx, msg32, sig, siglen, pubkey, pubkeylen)`
    pub secp256k1_ecdsa_verify: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig: *const c_uchar,
        siglen: c_int,
        pubkey: *const c_uchar,
        pubkeylen: c_int,
    ) -> c_int,

    /// `int secp256k1_ecdsa_sign(ctx, msg32, sig, siglen*, seckey, noncefp, ndata)`
    pub secp256k1_ecdsa_sign: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig: *mut c_uchar,
        siglen: *mut c_int,
        seckey: *const c_uchar,
        noncefp: secp256k1_nonce_function_t,
        ndata: *const c_void,
    ) -> c_int,

    /// `int secp256k1_ecdsa_sign_compact(ctx, msg32, sig64, seckey, noncefp, ndata, recid*)`
    pub secp256k1_ecdsa_sign_compact: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig64: *mut c_uchar,
        seckey: *const c_uchar,
        noncefp: secp256k1_nonce_function_t,
        ndata: *const c_void,
        recid: *mut c_int,
    ) -> c_int,

    /// `int secp256k1_ecdsa_recover_compact(ctx, msg32, sig64, pubkey, pubkeylen*,
    /// compressed, recid)`
    pub secp256k1_ecdsa_recover_compact: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig64: *const c_uchar,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
        compressed: c_int,
        recid: c_int,
    ) -> c_int,

    /// `int secp256k1_ec_seckey_verify(ctx, seckey)`
    pub secp256k1_ec_seckey_verify:
        unsafe extern "C" fn(ctx: *const secp256k1_context_t, seckey: *const c_uchar) -> c_int,

    /// `int secp256k1_ec_pubkey_verify(ctx, pubkey, pubkeylen)`
    pub secp256k1_ec_pubkey_verify: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        pubkey: *const c_uchar,
        pubkeylen: c_int,
    ) -> c_int,

    /// `int secp256k1_ec_pubkey_create(ctx, pubkey, pubkeylen*, seckey, compressed)`
    pub secp256k1_ec_pubkey_create: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
        seckey: *const c_uchar,
        compressed: c_int,
    ) -> c_int,

    /// `int secp256k1_ec_pubkey_decompress(ctx, pubkey, pubkeylen*)`
    pub secp256k1_ec_pubkey_decompress: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
    ) -> c_int,

    /// `int secp256k1_ec_privkey_export(ctx, seckey, privkey, privkeylen*, compressed)`
    pub secp256k1_ec_privkey_export: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        seckey: *const c_uchar,
        privkey: *mut c_uchar,
        privkeylen: *mut c_int,
        compressed: c_int,
    ) -> c_int,

    /// `int secp256k1_ec_privkey_import(ctx, seckey, privkey, privkeylen)`
    pub secp256k1_ec_privkey_import: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        privkey: *const c_uchar,
        privkeylen: c_int,
    ) -> c_int,

    /// `int secp256k1_ec_privkey_tweak_add(ctx, seckey, tweak)`
    pub secp256k1_ec_privkey_tweak_add: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        tweak: *const c_uchar,
    ) -> c_int,

    /// `int secp256k1_ec_pubkey_tweak_add(ctx, pubkey, pubkeylen, tweak)`
    pub secp256k1_ec_pubkey_tweak_add: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: c_int,
        tweak: *const c_uchar,
    ) -> c_int,

    /// `int secp256k1_ec_privkey_tweak_mul(ctx, seckey, tweak)`
    pub secp256k1_ec_privkey_tweak_mul: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        tweak: *const c_uchar,
    ) -> c_int,

    /// `int secp256k1_ec_pubkey_tweak_mul(ctx, pubkey, pubkeylen, tweak)`
    pub secp256k1_ec_pubkey_tweak_mul: unsafe extern "C" fn(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: c_int,
        tweak: *const c_uchar,
    ) -> c_int,

    /// Value of the exported `secp256k1_nonce_function_default` pointer.
    pub nonce_function_default: secp256k1_nonce_function_t,

    /// Value of the exported `secp256k1_nonce_function_rfc6979` pointer.
    pub nonce_function_rfc6979: secp256k1_nonce_function_t,
}

impl std::fmt::Debug for ForeignLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignLibrary")
            .field("secp256k1_context_create", &(self.secp256k1_context_create as *const ()))
            .field("nonce_function_default", &self.nonce_function_default.map(|f| f as *const ()))
            .field("nonce_function_rfc6979", &self.nonce_function_rfc6979.map(|f| f as *const ()))
            .finish_non_exhaustive()
    }
}
