//! SEC1 `ECPrivateKey` encoding for `ec_privkey_export` / `ec_privkey_import`.
//!
//! Export writes libsecp256k1's explicit-parameter template:
//!
//! ```text
//! SEQUENCE {
//!   INTEGER 1,
//!   OCTET STRING (32 bytes secret key),
//!   [0] SEQUENCE {
//!     INTEGER 1,
//!     SEQUENCE { OID prime-field, INTEGER p },
//!     SEQUENCE { OCTET STRING a = 0, OCTET STRING b = 7 },
//!     OCTET STRING (generator, compressed like the public key),
//!     INTEGER n,
//!     INTEGER 1 (cofactor)
//!   },
//!   [1] BIT STRING (public key)
//! }
//! ```
//!
//! That is 214 bytes for a compressed public key and 279 for an uncompressed
//! one. Import accepts any `ECPrivateKey` that starts with version 1 and a
//! 32-byte octet string, including the short named-curve form.

use zeroize::Zeroizing;

/// `INTEGER 1` followed by the `OCTET STRING` tag and length of the key.
const KEY_PREFIX: [u8; 5] = [0x02, 0x01, 0x01, 0x04, 0x20];

/// OID 1.2.840.10045.1.1 (`prime-field`).
const PRIME_FIELD: [u8; 7] = [0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x01, 0x01];

/// Field prime `p`.
const P: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFC, 0x2F,
];

/// Group order `n`.
const N: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Generator x coordinate.
const GX: [u8; 32] = [
    0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B, 0x07,
    0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8, 0x17, 0x98,
];

/// Generator y coordinate (even, hence the `02` compressed prefix).
const GY: [u8; 32] = [
    0x48, 0x3A, 0xDA, 0x77, 0x26, 0xA3, 0xC4, 0x65, 0x5D, 0xA4, 0xFB, 0xFC, 0x0E, 0x11, 0x08, 0xA8,
    0xFD, 0x17, 0xB4, 0x48, 0xA6, 0x85, 0x54, 0x19, 0x9C, 0x47, 0xD0, 0x8F, 0xFB, 0x10, 0xD4, 0xB8,
];

const SEQUENCE: u8 = 0x30;
const INTEGER: u8 = 0x02;
const OCTET_STRING: u8 = 0x04;
const BIT_STRING: u8 = 0x03;
const OID: u8 = 0x06;
const CONTEXT_0: u8 = 0xA0;
const CONTEXT_1: u8 = 0xA1;

/// Append a tag-length-value. Lengths past 16 bits never occur here.
fn push_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    match content.len() {
        len @ 0..=0x7F => out.push(len as u8),
        len @ 0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
        len => {
            out.push(0x82);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        },
    }
    out.extend_from_slice(content);
}

/// Positive 256-bit integer with its high bit set, so it needs a zero pad.
fn push_unsigned(out: &mut Vec<u8>, value: &[u8; 32]) {
    let mut content = Vec::with_capacity(33);
    content.push(0x00);
    content.extend_from_slice(value);
    push_tlv(out, INTEGER, &content);
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    push_tlv(&mut out, tag, content);
    out
}

/// Explicit curve parameters, `[0]` contents.
fn ec_parameters(compressed: bool) -> Vec<u8> {
    let mut field_id = tlv(OID, &PRIME_FIELD);
    push_unsigned(&mut field_id, &P);

    let mut curve = tlv(OCTET_STRING, &[0x00]);
    push_tlv(&mut curve, OCTET_STRING, &[0x07]);

    let mut generator = Vec::with_capacity(65);
    if compressed {
        generator.push(0x02);
        generator.extend_from_slice(&GX);
    } else {
        generator.push(0x04);
        generator.extend_from_slice(&GX);
        generator.extend_from_slice(&GY);
    }

    let mut params = tlv(INTEGER, &[0x01]);
    push_tlv(&mut params, SEQUENCE, &field_id);
    push_tlv(&mut params, SEQUENCE, &curve);
    push_tlv(&mut params, OCTET_STRING, &generator);
    push_unsigned(&mut params, &N);
    push_tlv(&mut params, INTEGER, &[0x01]);
    tlv(SEQUENCE, &params)
}

/// Encode a private key with its public key. The generator's encoding follows
/// the public key's.
pub(crate) fn encode_private_key(seckey: &[u8; 32], pubkey: &[u8]) -> Vec<u8> {
    let compressed = pubkey.len() == 33;

    let mut bit_string = Vec::with_capacity(pubkey.len() + 1);
    bit_string.push(0x00);
    bit_string.extend_from_slice(pubkey);

    let mut body = Zeroizing::new(KEY_PREFIX.to_vec());
    body.extend_from_slice(seckey);
    push_tlv(&mut body, CONTEXT_0, &ec_parameters(compressed));
    push_tlv(&mut body, CONTEXT_1, &tlv(BIT_STRING, &bit_string));
    tlv(SEQUENCE, &body)
}

/// Extract the 32-byte secret key. The caller validates the scalar.
pub(crate) fn decode_private_key(der: &[u8]) -> Option<[u8; 32]> {
    let [0x30, rest @ ..] = der else {
        return None;
    };
    let (body_len, body) = read_length(rest)?;
    if body.len() != body_len {
        return None;
    }

    let key = body.strip_prefix(&KEY_PREFIX)?.get(..32)?;
    let mut seckey = [0u8; 32];
    seckey.copy_from_slice(key);
    Some(seckey)
}

/// Decode a DER length (short form, or long form of one or two bytes).
fn read_length(bytes: &[u8]) -> Option<(usize, &[u8])> {
    match bytes {
        [len @ 0x00..=0x7F, rest @ ..] => Some((usize::from(*len), rest)),
        [0x81, len, rest @ ..] => Some((usize::from(*len), rest)),
        [0x82, hi, lo, rest @ ..] => Some((usize::from(u16::from_be_bytes([*hi, *lo])), rest)),
        _ => None,
    }
}
