//! Known-answer tests against a fixed key, message and nonce.

use ecbind::{Context, ContextOptions, NonceSpec, Verification};

const SECKEY: &str = "428ad22cf55a7707f2d6873966ab800910d8b40cc6c86d2384c5a5796d527847";
const PUBKEY: &str = "038fcf3ec3a4b509871692939358f50c25f8bed3286467f8a1edd32c50b75ae19f";
const PUBKEY_UNCOMPRESSED: &str = "\
    048fcf3ec3a4b509871692939358f50c25f8bed3286467f8a1edd32c50b75ae19f\
    9b3ddd54c655121b91cad2a5809f0a9196c80c736a89771e3c4a810c197061f7";
const MSG32: &str = "07d046d5fac12b3f82daf5035b9aae86db5adc8275ebfbf05ec83005a4a8ba3e";
const NONCE: &str = "b8e7eed19f47f0c0555bd6a5fcd5b2f78fcd21d3b0bcff6a466de8d0b84a057a";
const SIGNATURE: &str = "\
    3045022100e7871dafd206902beb308a56e99b5f34bfe1d8f6c10b974f3dc30ef5f6f05286\
    02206b879aca9016de4ecac915cf7a04b76d22fe9bfdc188f4103fafd71f7076da5f";
const SIGNATURE_HIGH_S: &str = "\
    3046022100e7871dafd206902beb308a56e99b5f34bfe1d8f6c10b974f3dc30ef5f6f05286\
    022100947865356fe921b13536ea3085fb489197b040e8edbfac2b8022876d5fbf66e2";
const SIGNATURE_RFC6979: &str = "\
    3045022100865d52cf06207dcd907d95d9e744646451fc4ac1903daa5fc2d9d47c5b44eecf\
    02202944f1bf651c145acb4fb8d81b13ab9f86cb69badade981b22360b2c805de97c";

fn bytes(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str.replace(' ', "")).expect("fixture hex")
}

fn context() -> Context {
    Context::new(ContextOptions::all()).expect("context")
}

fn fixed_nonce<'a>() -> NonceSpec<'a> {
    NonceSpec::attempt_only(|_| Ok(Some(bytes(NONCE))))
}

#[test]
fn fixed_nonce_reproduces_the_signature() {
    let ctx = context();
    let sig = ctx.ecdsa_sign(bytes(MSG32), bytes(SECKEY), Some(fixed_nonce())).unwrap();
    assert_eq!(sig, Some(bytes(SIGNATURE)));
}

#[test]
fn fixture_signatures_verify() {
    let ctx = context();
    let pubkey = bytes(PUBKEY);

    assert_eq!(
        ctx.ecdsa_verify(bytes(MSG32), bytes(SIGNATURE), &pubkey).unwrap(),
        Verification::Valid
    );
    assert_eq!(
        ctx.ecdsa_verify(bytes(MSG32), bytes(SIGNATURE_HIGH_S), &pubkey).unwrap(),
        Verification::Valid,
        "high-S form still verifies"
    );
    assert_eq!(
        ctx.ecdsa_verify(bytes(MSG32), bytes(SIGNATURE), bytes(PUBKEY_UNCOMPRESSED)).unwrap(),
        Verification::Valid
    );
}

#[test]
fn verification_failures_are_distinguished() {
    let ctx = context();
    let mut other_msg = bytes(MSG32);
    other_msg[0] ^= 1;

    assert_eq!(
        ctx.ecdsa_verify(other_msg, bytes(SIGNATURE), bytes(PUBKEY)).unwrap(),
        Verification::Invalid
    );
    assert_eq!(
        ctx.ecdsa_verify(bytes(MSG32), bytes(SIGNATURE), [0x05; 33]).unwrap(),
        Verification::InvalidPublicKey
    );
    assert_eq!(
        ctx.ecdsa_verify(bytes(MSG32), [0x30, 0x00], bytes(PUBKEY)).unwrap(),
        Verification::InvalidSignature
    );
}

#[test]
fn rfc6979_signature_is_deterministic() {
    let ctx = context();
    let expected = bytes(SIGNATURE_RFC6979);
    assert_eq!(expected.len(), 71);

    for spec in [Some(NonceSpec::Rfc6979), Some(NonceSpec::Default), None] {
        let sig = ctx.ecdsa_sign(bytes(MSG32), bytes(SECKEY), spec).unwrap();
        assert_eq!(sig.as_deref(), Some(expected.as_slice()));
    }
}

#[test]
fn rfc6979_signature_prefix_and_suffix() {
    let ctx = context();
    let sig =
        ctx.ecdsa_sign(bytes(MSG32), bytes(SECKEY), Some(NonceSpec::Rfc6979)).unwrap().unwrap();

    assert_eq!(&sig[..9], &bytes("30 45 02 21 00 86 5d 52 cf")[..]);
    assert_eq!(&sig[35..37], &bytes("ee cf")[..]);
    assert_eq!(&sig[37..43], &bytes("02 20 29 44 f1 bf")[..]);
    assert_eq!(&sig[sig.len() - 2..], &bytes("e9 7c")[..]);
}

#[test]
fn public_key_derivation() {
    let ctx = context();
    assert_eq!(ctx.ec_pubkey_create(bytes(SECKEY), true).unwrap(), Some(bytes(PUBKEY)));
    assert_eq!(
        ctx.ec_pubkey_create(bytes(SECKEY), false).unwrap(),
        Some(bytes(PUBKEY_UNCOMPRESSED))
    );
    assert!(ctx.ec_pubkey_verify(bytes(PUBKEY)).unwrap());
}

#[test]
fn decompress() {
    let ctx = context();
    assert_eq!(ctx.ec_pubkey_decompress(bytes(PUBKEY)).unwrap(), Some(bytes(PUBKEY_UNCOMPRESSED)));
    assert_eq!(
        ctx.ec_pubkey_decompress(bytes(PUBKEY_UNCOMPRESSED)).unwrap(),
        Some(bytes(PUBKEY_UNCOMPRESSED)),
        "identity on uncompressed keys"
    );

    let err = ctx.ec_pubkey_decompress([0x03; 32]).unwrap_err();
    assert_eq!(err.to_string(), "invalid argument: pubkey has invalid length");
}

#[test]
fn compact_signature_with_fixed_nonce() {
    let ctx = context();
    let recoverable =
        ctx.ecdsa_sign_compact(bytes(MSG32), bytes(SECKEY), Some(fixed_nonce())).unwrap().unwrap();

    let der = bytes(SIGNATURE);
    assert_eq!(&recoverable.signature[..32], &der[5..37]);
    assert_eq!(&recoverable.signature[32..], &der[39..71]);
    assert_eq!(recoverable.recovery_id, 1);

    let recovered = ctx
        .ecdsa_recover_compact(bytes(MSG32), recoverable.signature, true, recoverable.recovery_id)
        .unwrap();
    assert_eq!(recovered, Some(bytes(PUBKEY)));
}

#[test]
fn private_key_export_import() {
    let ctx = context();
    for compressed in [true, false] {
        let der = ctx.ec_privkey_export(bytes(SECKEY), compressed).unwrap().unwrap();
        assert_eq!(der.len(), if compressed { 214 } else { 279 });
        assert_eq!(ctx.ec_privkey_import(&der).unwrap().map(Vec::from), Some(bytes(SECKEY)));
    }
    assert_eq!(ctx.ec_privkey_import([0x30, 0x00]).unwrap(), None);
}

#[test]
fn tweak_overflow_fails() {
    let ctx = context();
    assert_eq!(ctx.ec_privkey_tweak_add(bytes(SECKEY), [0xFF; 32]).unwrap(), None);
    assert_eq!(ctx.ec_pubkey_tweak_add(bytes(PUBKEY), [0xFF; 32]).unwrap(), None);

    for tweak in [[0x00; 32], [0xFF; 32]] {
        assert_eq!(ctx.ec_privkey_tweak_mul(bytes(SECKEY), tweak).unwrap(), None);
        assert_eq!(ctx.ec_pubkey_tweak_mul(bytes(PUBKEY), tweak).unwrap(), None);
        assert_eq!(ctx.ec_pubkey_tweak_mul(bytes(PUBKEY_UNCOMPRESSED), tweak).unwrap(), None);
    }

    let mut bad_prefix = bytes(PUBKEY);
    bad_prefix[0] = 0x05;
    assert!(ctx.ec_pubkey_verify(bytes(PUBKEY)).unwrap());
    assert!(!ctx.ec_pubkey_verify(&bad_prefix).unwrap());
    assert!(!ctx.ec_pubkey_verify(&bytes(PUBKEY)[..32]).unwrap());
    assert!(!ctx.ec_pubkey_verify([0u8; 0]).unwrap());
}

#[test]
fn tweaks_commute_with_derivation() {
    let ctx = context();
    let mut tweak = [0u8; 32];
    tweak[31] = 7;

    let added = ctx.ec_privkey_tweak_add(bytes(SECKEY), tweak).unwrap().unwrap();
    assert_eq!(
        ctx.ec_pubkey_tweak_add(bytes(PUBKEY), tweak).unwrap(),
        ctx.ec_pubkey_create(added, true).unwrap()
    );

    let multiplied = ctx.ec_privkey_tweak_mul(bytes(SECKEY), tweak).unwrap().unwrap();
    let tweaked = ctx.ec_pubkey_tweak_mul(bytes(PUBKEY_UNCOMPRESSED), tweak).unwrap().unwrap();
    assert_eq!(tweaked.len(), 65, "output keeps the input encoding");
    assert_eq!(Some(tweaked), ctx.ec_pubkey_create(multiplied, false).unwrap());
}
