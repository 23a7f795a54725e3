//! Bindings to a system `libsecp256k1`.
//!
//! Requires the context-based ABI (`secp256k1_context_create` with `int`
//! length parameters). Build with `--features system` and make the library
//! visible to the linker.

#![allow(unsafe_code)]

use std::sync::OnceLock;

use crate::{
    ForeignLibrary, c_int, c_uchar, c_void, secp256k1_context_t, secp256k1_nonce_function_t,
};

#[link(name = "secp256k1")]
unsafe extern "C" {
    static secp256k1_nonce_function_default: secp256k1_nonce_function_t;
    static secp256k1_nonce_function_rfc6979: secp256k1_nonce_function_t;

    fn secp256k1_context_create(flags: c_int) -> *mut secp256k1_context_t;
    fn secp256k1_context_clone(ctx: *const secp256k1_context_t) -> *mut secp256k1_context_t;
    fn secp256k1_context_destroy(ctx: *mut secp256k1_context_t);

    fn secp256k1_ecdsa_verify(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig: *const c_uchar,
        siglen: c_int,
        pubkey: *const c_uchar,
        pubkeylen: c_int,
    ) -> c_int;

    fn secp256k1_ecdsa_sign(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig: *mut c_uchar,
        siglen: *mut c_int,
        seckey: *const c_uchar,
        noncefp: secp256k1_nonce_function_t,
        ndata: *const c_void,
    ) -> c_int;

    fn secp256k1_ecdsa_sign_compact(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig64: *mut c_uchar,
        seckey: *const c_uchar,
        noncefp: secp256k1_nonce_function_t,
        ndata: *const c_void,
        recid: *mut c_int,
    ) -> c_int;

    fn secp256k1_ecdsa_recover_compact(
        ctx: *const secp256k1_context_t,
        msg32: *const c_uchar,
        sig64: *const c_uchar,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
        compressed: c_int,
        recid: c_int,
    ) -> c_int;

    fn secp256k1_ec_seckey_verify(ctx: *const secp256k1_context_t, seckey: *const c_uchar)
    -> c_int;

    fn secp256k1_ec_pubkey_verify(
        ctx: *const secp256k1_context_t,
        pubkey: *const c_uchar,
        pubkeylen: c_int,
    ) -> c_int;

    fn secp256k1_ec_pubkey_create(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
        seckey: *const c_uchar,
        compressed: c_int,
    ) -> c_int;

    fn secp256k1_ec_pubkey_decompress(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: *mut c_int,
    ) -> c_int;

    fn secp256k1_ec_privkey_export(
        ctx: *const secp256k1_context_t,
        seckey: *const c_uchar,
        privkey: *mut c_uchar,
        privkeylen: *mut c_int,
        compressed: c_int,
    ) -> c_int;

    fn secp256k1_ec_privkey_import(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        privkey: *const c_uchar,
        privkeylen: c_int,
    ) -> c_int;

    fn secp256k1_ec_privkey_tweak_add(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        tweak: *const c_uchar,
    ) -> c_int;

    fn secp256k1_ec_pubkey_tweak_add(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: c_int,
        tweak: *const c_uchar,
    ) -> c_int;

    fn secp256k1_ec_privkey_tweak_mul(
        ctx: *const secp256k1_context_t,
        seckey: *mut c_uchar,
        tweak: *const c_uchar,
    ) -> c_int;

    fn secp256k1_ec_pubkey_tweak_mul(
        ctx: *const secp256k1_context_t,
        pubkey: *mut c_uchar,
        pubkeylen: c_int,
        tweak: *const c_uchar,
    ) -> c_int;
}

/// Function table for the linked system library.
///
/// The exported nonce-function pointers are read on first use and cached for
/// the life of the process.
pub fn system() -> &'static ForeignLibrary {
    static LIBRARY: OnceLock<ForeignLibrary> = OnceLock::new();

    LIBRARY.get_or_init(|| {
        // SAFETY: both statics are immutable `const` data exported by the
        // library and initialised before any code runs.
        let (nonce_function_default, nonce_function_rfc6979) =
            unsafe { (secp256k1_nonce_function_default, secp256k1_nonce_function_rfc6979) };

        ForeignLibrary {
            secp256k1_context_create,
            secp256k1_context_clone,
            secp256k1_context_destroy,
            secp256k1_ecdsa_verify,
            secp256k1_ecdsa_sign,
            secp256k1_ecdsa_sign_compact,
            secp256k1_ecdsa_recover_compact,
            secp256k1_ec_seckey_verify,
            secp256k1_ec_pubkey_verify,
            secp256k1_ec_pubkey_create,
            secp256k1_ec_pubkey_decompress,
            secp256k1_ec_privkey_export,
            secp256k1_ec_privkey_import,
            secp256k1_ec_privkey_tweak_add,
            secp256k1_ec_pubkey_tweak_add,
            secp256k1_ec_privkey_tweak_mul,
            secp256k1_ec_pubkey_tweak_mul,
            nonce_function_default,
            nonce_function_rfc6979,
        }
    })
}
