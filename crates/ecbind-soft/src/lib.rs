//! Pure-Rust provider of the secp256k1 C ABI.
//!
//! Implements every entry point of [`ForeignLibrary`] as an `extern "C"`
//! function over `k256` arithmetic, including an RFC6979 nonce function that
//! honours an optional 32-byte extra-entropy `data` pointer. Results,
//! capability checks and buffer conventions follow the native library, so the
//! `ecbind` marshalling layer cannot tell the two apart.
//!
//! ```ignore
//! let lib: &'static ForeignLibrary = ecbind_soft::library();
//! ```
//!
//! Test doubles start from [`LIBRARY`] and replace single entries:
//!
//! ```ignore
//! let double = ForeignLibrary { secp256k1_ecdsa_verify: always_two, ..ecbind_soft::LIBRARY };
//! ```

#![allow(unsafe_code)]

mod abi;
mod context;
mod curve;
mod der;
mod rfc6979;

use ecbind_sys::ForeignLibrary;

/// Function table of the software provider.
pub const LIBRARY: ForeignLibrary = ForeignLibrary {
    secp256k1_context_create: abi::secp256k1_context_create,
    secp256k1_context_clone: abi::secp256k1_context_clone,
    secp256k1_context_destroy: abi::secp256k1_context_destroy,
    secp256k1_ecdsa_verify: abi::secp256k1_ecdsa_verify,
    secp256k1_ecdsa_sign: abi::secp256k1_ecdsa_sign,
    secp256k1_ecdsa_sign_compact: abi::secp256k1_ecdsa_sign_compact,
    secp256k1_ecdsa_recover_compact: abi::secp256k1_ecdsa_recover_compact,
    secp256k1_ec_seckey_verify: abi::secp256k1_ec_seckey_verify,
    secp256k1_ec_pubkey_verify: abi::secp256k1_ec_pubkey_verify,
    secp256k1_ec_pubkey_create: abi::secp256k1_ec_pubkey_create,
    secp256k1_ec_pubkey_decompress: abi::secp256k1_ec_pubkey_decompress,
    secp256k1_ec_privkey_export: abi::secp256k1_ec_privkey_export,
    secp256k1_ec_privkey_import: abi::secp256k1_ec_privkey_import,
    secp256k1_ec_privkey_tweak_add: abi::secp256k1_ec_privkey_tweak_add,
    secp256k1_ec_pubkey_tweak_add: abi::secp256k1_ec_pubkey_tweak_add,
    secp256k1_ec_privkey_tweak_mul: abi::secp256k1_ec_privkey_tweak_mul,
    secp256k1_ec_pubkey_tweak_mul: abi::secp256k1_ec_pubkey_tweak_mul,
    nonce_function_default: abi::NONCE_FUNCTION_DEFAULT,
    nonce_function_rfc6979: Some(abi::secp256k1_nonce_function_rfc6979),
};

static SOFTWARE: ForeignLibrary = LIBRARY;

/// Shared function table of the software provider.
pub fn library() -> &'static ForeignLibrary {
    &SOFTWARE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_rfc6979_share_one_function() {
        let lib = library();
        assert_eq!(
            lib.nonce_function_default.map(|f| f as *const ()),
            lib.nonce_function_rfc6979.map(|f| f as *const ())
        );
        assert!(lib.nonce_function_default.is_some());
    }

    #[test]
    fn library_is_a_single_static() {
        assert!(std::ptr::eq(library(), library()));
    }
}
