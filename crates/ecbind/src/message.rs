//! Bitcoin-style compact message signatures.
//!
//! The message is hashed with double SHA-256 and signed compactly. The
//! 65-byte result starts with a header byte `27 + recid`, plus 4 when the
//! signer's public key is compressed, so a verifier can recover the key in
//! the right encoding from the signature alone.

use sha2::{Digest, Sha256};

use crate::{
    context::Context,
    error::Error,
    nonce::{NonceSpec, WhenAbsent},
};

/// Length of a header-prefixed compact signature.
pub const MESSAGE_SIGNATURE_LENGTH: usize = 65;

const HEADER_BASE: u8 = 27;
const HEADER_COMPRESSED: u8 = 4;

/// `SHA256(SHA256(data))`.
pub fn message_hash(data: impl AsRef<[u8]>) -> [u8; 32] {
    let first = Sha256::digest(data.as_ref());
    let second = Sha256::digest(first);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&second);
    hash
}

/// Sign `data` with a header-prefixed compact signature.
///
/// An absent nonce spec uses the library's default generator. Returns
/// `Ok(None)` when nonce generation fails.
pub fn sign_message(
    ctx: &Context,
    data: impl AsRef<[u8]>,
    seckey: impl AsRef<[u8]>,
    compressed: bool,
    nonce: Option<NonceSpec<'_>>,
) -> Result<Option<[u8; MESSAGE_SIGNATURE_LENGTH]>, Error> {
    let hash = message_hash(data);
    let Some(signature) = ctx.sign_compact(&hash, seckey.as_ref(), nonce, WhenAbsent::UseDefault)?
    else {
        return Ok(None);
    };

    let mut out = [0u8; MESSAGE_SIGNATURE_LENGTH];
    out[0] = HEADER_BASE + signature.recovery_id + if compressed { HEADER_COMPRESSED } else { 0 };
    out[1..].copy_from_slice(&signature.signature);
    Ok(Some(out))
}

/// Recover the public key that signed `data`.
///
/// Returns `Ok(None)` for a signature that is not 65 bytes, a header outside
/// 27..=34, or a signature the library cannot recover from.
pub fn recover_message(
    ctx: &Context,
    data: impl AsRef<[u8]>,
    signature: impl AsRef<[u8]>,
) -> Result<Option<Vec<u8>>, Error> {
    let signature = signature.as_ref();
    let [header, sig64 @ ..] = signature else {
        return Ok(None);
    };
    if signature.len() != MESSAGE_SIGNATURE_LENGTH
        || !(HEADER_BASE..HEADER_BASE + 2 * HEADER_COMPRESSED).contains(header)
    {
        return Ok(None);
    }

    let offset = header - HEADER_BASE;
    let compressed = offset >= HEADER_COMPRESSED;
    let recid = offset % HEADER_COMPRESSED;

    ctx.ecdsa_recover_compact(message_hash(data), sig64, compressed, recid)
}
