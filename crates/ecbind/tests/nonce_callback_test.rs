//! Custom nonce callbacks driven through real signing calls.

use std::{
    cell::{Cell, RefCell},
    fmt,
    panic::{self, AssertUnwindSafe},
};

use ecbind::{
    Context, ContextOptions, Error, NonceSpec, ProtocolViolation, Verification, sign_message,
};

const MSG32: [u8; 32] = [0x5A; 32];
const SECKEY: [u8; 32] = [0x17; 32];

#[derive(Debug, PartialEq, Eq)]
struct HardwareUnavailable {
    slot: u8,
}

impl fmt::Display for HardwareUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hardware nonce source {} unavailable", self.slot)
    }
}

impl std::error::Error for HardwareUnavailable {}

fn context() -> Context {
    Context::new(ContextOptions::all()).expect("context")
}

#[test]
fn callback_sees_message_key_and_attempt() {
    let ctx = context();
    let seen = RefCell::new(Vec::new());

    let spec = NonceSpec::custom(|msg32, seckey, attempt| {
        seen.borrow_mut().push((*msg32, *seckey, attempt));
        Ok(Some(vec![0x33; 32]))
    });
    let sig = ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap().unwrap();

    assert_eq!(seen.into_inner(), vec![(MSG32, SECKEY, 0)]);
    let pubkey = ctx.ec_pubkey_create(SECKEY, true).unwrap().unwrap();
    assert_eq!(ctx.ecdsa_verify(MSG32, sig, pubkey).unwrap(), Verification::Valid);
}

#[test]
fn no_nonce_means_no_signature_after_one_call() {
    let ctx = context();
    let calls = Cell::new(0u32);

    let spec = NonceSpec::attempt_only(|_| {
        calls.set(calls.get() + 1);
        Ok(None)
    });
    assert_eq!(ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap(), None);
    assert_eq!(calls.get(), 1);

    let spec = NonceSpec::attempt_only(|_| Ok(None));
    assert_eq!(ctx.ecdsa_sign_compact(MSG32, SECKEY, Some(spec)).unwrap(), None);
}

#[test]
fn invalid_candidates_are_retried_with_the_next_attempt() {
    let ctx = context();
    let attempts = RefCell::new(Vec::new());

    // A zero nonce is never a valid scalar, so the signer asks again
    let spec = NonceSpec::attempt_only(|attempt| {
        attempts.borrow_mut().push(attempt);
        Ok(Some(if attempt == 0 { vec![0u8; 32] } else { vec![0x44; 32] }))
    });
    assert!(ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap().is_some());
    assert_eq!(attempts.into_inner(), vec![0, 1]);
}

#[test]
fn callback_error_comes_back_unchanged() {
    let ctx = context();
    let spec = NonceSpec::attempt_only(|_| Err(HardwareUnavailable { slot: 3 }.into()));

    let err = ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap_err();
    assert!(!err.is_protocol_violation());

    let source = err.into_callback_error().expect("callback error");
    let source = source.downcast::<HardwareUnavailable>().unwrap();
    assert_eq!(*source, HardwareUnavailable { slot: 3 });
}

#[test]
fn callback_error_stops_the_signing_loop() {
    let ctx = context();
    let calls = Cell::new(0u32);

    let spec = NonceSpec::attempt_only(|_| {
        calls.set(calls.get() + 1);
        Err(HardwareUnavailable { slot: 0 }.into())
    });
    assert!(ctx.ecdsa_sign_compact(MSG32, SECKEY, Some(spec)).is_err());
    assert_eq!(calls.get(), 1);
}

#[test]
fn wrong_nonce_length_is_a_protocol_violation() {
    let ctx = context();
    for len in [0, 31, 33, 64] {
        let spec = NonceSpec::attempt_only(move |_| Ok(Some(vec![0x01; len])));
        let err = ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolViolation::NonceLength { actual }) if actual == len
        ));
    }
}

#[test]
fn callback_panic_resumes_on_the_caller() {
    let ctx = context();
    let spec = NonceSpec::attempt_only(|_| panic!("nonce source poisoned"));

    let outcome =
        panic::catch_unwind(AssertUnwindSafe(|| ctx.ecdsa_sign(MSG32, SECKEY, Some(spec))));
    let payload = outcome.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"nonce source poisoned"));

    // The context is still usable afterwards
    assert!(ctx.ecdsa_sign(MSG32, SECKEY, None).unwrap().is_some());
}

#[test]
fn every_nonce_spec_produces_a_valid_signature() {
    let ctx = context();
    let pubkey = ctx.ec_pubkey_create(SECKEY, false).unwrap().unwrap();

    let specs = || {
        [
            None,
            Some(NonceSpec::Default),
            Some(NonceSpec::Rfc6979),
            Some(NonceSpec::Null),
            Some(NonceSpec::attempt_only(|_| Ok(Some(vec![0x99; 32])))),
        ]
    };

    for spec in specs() {
        let sig = ctx.ecdsa_sign(MSG32, SECKEY, spec).unwrap().unwrap();
        assert_eq!(ctx.ecdsa_verify(MSG32, &sig, &pubkey).unwrap(), Verification::Valid);
    }

    for spec in specs() {
        let recoverable = ctx.ecdsa_sign_compact(MSG32, SECKEY, spec).unwrap().unwrap();
        let recovered = ctx
            .ecdsa_recover_compact(MSG32, recoverable.signature, false, recoverable.recovery_id)
            .unwrap();
        assert_eq!(recovered.as_ref(), Some(&pubkey));
    }
}

#[test]
fn message_signing_accepts_custom_nonces() {
    let ctx = context();
    let calls = Cell::new(0u32);
    let spec = NonceSpec::attempt_only(|_| {
        calls.set(calls.get() + 1);
        Ok(Some(vec![0x21; 32]))
    });

    let signature = sign_message(&ctx, b"payload", SECKEY, true, Some(spec)).unwrap().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(
        ecbind::recover_message(&ctx, b"payload", signature).unwrap(),
        ctx.ec_pubkey_create(SECKEY, true).unwrap()
    );
}

#[test]
fn named_nonce_helpers_match_signing() {
    let ctx = context();
    let nonce = ecbind::nonce_function_rfc6979(ctx.library(), MSG32, SECKEY, 0).unwrap().unwrap();

    let via_named = ctx.ecdsa_sign(MSG32, SECKEY, Some(NonceSpec::Rfc6979)).unwrap();
    let via_custom = ctx
        .ecdsa_sign(MSG32, SECKEY, Some(NonceSpec::attempt_only(|_| Ok(Some(nonce.to_vec())))))
        .unwrap();
    assert_eq!(via_named, via_custom);
}

#[test]
fn invalid_nonce_is_retried_until_callback_gives_up() {
    let ctx = context();
    let attempts = RefCell::new(Vec::new());

    // Zero is never a valid nonce scalar.
    let spec = NonceSpec::attempt_only(|attempt| {
        attempts.borrow_mut().push(attempt);
        Ok((attempt < 2).then(|| vec![0u8; 32]))
    });
    assert_eq!(ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap(), None);
    assert_eq!(*attempts.borrow(), vec![0, 1, 2]);
}

#[test]
fn invalid_nonce_is_replaced_on_retry() {
    let ctx = context();
    let calls = Cell::new(0);

    let spec = NonceSpec::attempt_only(|attempt| {
        calls.set(calls.get() + 1);
        Ok(Some(if attempt == 0 { vec![0xFF; 32] } else { vec![0x33; 32] }))
    });
    let sig = ctx.ecdsa_sign(MSG32, SECKEY, Some(spec)).unwrap().unwrap();
    assert_eq!(calls.get(), 2);

    let expected = ctx
        .ecdsa_sign(MSG32, SECKEY, Some(NonceSpec::attempt_only(|_| Ok(Some(vec![0x33; 32])))))
        .unwrap()
        .unwrap();
    assert_eq!(sig, expected);
}
