//! Sharing contexts across threads.

use std::{sync::Arc, thread};

use ecbind::{Context, ContextOptions, NonceSpec, Verification};

#[test]
fn shared_context_signs_and_verifies_in_parallel() {
    let ctx = Arc::new(Context::new(ContextOptions::all()).unwrap());

    let handles: Vec<_> = (1..=8u8)
        .map(|worker| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let seckey = [worker; 32];
                let msg32 = [worker.wrapping_mul(3); 32];
                let pubkey = ctx.ec_pubkey_create(seckey, true).unwrap().unwrap();

                for _ in 0..16 {
                    let sig = ctx.ecdsa_sign(msg32, seckey, Some(NonceSpec::Rfc6979)).unwrap();
                    let sig = sig.unwrap();
                    let verification = ctx.ecdsa_verify(msg32, &sig, &pubkey).unwrap();
                    assert_eq!(verification, Verification::Valid);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn custom_callbacks_run_on_the_calling_thread() {
    let ctx = Arc::new(Context::new(ContextOptions::all()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let me = thread::current().id();
                let spec = NonceSpec::attempt_only(move |_| {
                    assert_eq!(thread::current().id(), me);
                    Ok(Some(vec![0x42; 32]))
                });
                ctx.ecdsa_sign([0x01; 32], [0x02; 32], Some(spec)).unwrap().is_some()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn clones_are_independent() {
    let original = Context::new(ContextOptions { verify: true, sign: true }).unwrap();
    let copy = original.clone();
    assert_eq!(copy.options(), original.options());

    let moved = thread::spawn(move || {
        let pubkey = copy.ec_pubkey_create([0x09; 32], false).unwrap();
        drop(copy);
        pubkey
    })
    .join()
    .unwrap();

    assert_eq!(moved, original.ec_pubkey_create([0x09; 32], false).unwrap());
}
