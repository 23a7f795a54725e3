//! Fuzz target for argument validation
//!
//! # Strategy
//!
//! - Arbitrary byte strings against every named input constructor
//! - In-out buffers seeded with arbitrary initial contents
//!
//! # Invariants
//!
//! - Construction succeeds exactly when the length matches the shape
//! - A constructed input reports the length it was given
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use ecbind::argument::{SecretKeyInOut, Shape, StringIn, VarStringInOut};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    MessageHash(Vec<u8>),
    SecretKey(Vec<u8>),
    Tweak(Vec<u8>),
    Signature(Vec<u8>),
    CompactSignature(Vec<u8>),
    PublicKey(Vec<u8>),
    PrivateKeyDer(Vec<u8>),
    PublicKeyInOut(Vec<u8>),
    SecretKeyInOut(Vec<u8>),
}

fuzz_target!(|inputs: Vec<Input>| {
    for input in inputs {
        match input {
            Input::MessageHash(bytes) => {
                check(StringIn::message_hash(&bytes), &bytes, Shape::Exact(32));
            },
            Input::SecretKey(bytes) => {
                check(StringIn::secret_key(&bytes), &bytes, Shape::Exact(32));
            },
            Input::Tweak(bytes) => check(StringIn::tweak(&bytes), &bytes, Shape::Exact(32)),
            Input::Signature(bytes) => check(StringIn::signature(&bytes), &bytes, Shape::Any),
            Input::CompactSignature(bytes) => {
                check(StringIn::compact_signature(&bytes), &bytes, Shape::Exact(64));
            },
            Input::PublicKey(bytes) => check(StringIn::public_key(&bytes), &bytes, Shape::Any),
            Input::PrivateKeyDer(bytes) => {
                check(StringIn::private_key_der(&bytes), &bytes, Shape::Any);
            },
            Input::PublicKeyInOut(bytes) => {
                let result = VarStringInOut::public_key(&bytes);
                assert_eq!(result.is_ok(), bytes.len() == 33 || bytes.len() == 65);
                if let Ok(buf) = result {
                    assert_eq!(buf.input_len() as usize, bytes.len());
                }
            },
            Input::SecretKeyInOut(bytes) => {
                let result = SecretKeyInOut::secret_key(&bytes);
                assert_eq!(result.is_ok(), bytes.len() == 32);
                if let Ok(buf) = result {
                    assert_eq!(buf.value().as_slice(), bytes.as_slice());
                }
            },
        }
    }
});

fn check(result: Result<StringIn<'_>, ecbind::ArgumentError>, bytes: &[u8], shape: Shape) {
    let fits = match shape {
        Shape::Exact(expected) => bytes.len() == expected,
        Shape::OneOf(lengths) => lengths.contains(&bytes.len()),
        Shape::Any => true,
    };
    assert_eq!(result.is_ok(), fits);

    if let Ok(input) = result {
        assert_eq!(input.len(), bytes.len());
        assert_eq!(input.bytes(), bytes);
    }
}
