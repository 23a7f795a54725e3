//! `extern "C"` entry points.
//!
//! Each function converts raw pointers into slices, delegates to
//! [`crate::curve`], and writes results back. Panics never unwind into the
//! caller: [`guard`] turns them into `c_int::MIN`, outside every result code
//! an entry point returns on its own (`-2..=1`).

use std::{
    panic::{self, AssertUnwindSafe},
    ptr, slice,
};

use ecbind_sys::{
    SECP256K1_START_SIGN, SECP256K1_START_VERIFY, c_int, c_uchar, c_uint, c_void,
    secp256k1_context_t, secp256k1_nonce_function_t,
};
use zeroize::Zeroizing;

use crate::{
    context::SoftContext,
    curve::{self, RawSignature},
    der, rfc6979,
};

const PANICKED: c_int = c_int::MIN;

fn guard(f: impl FnOnce() -> c_int) -> c_int {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(PANICKED)
}

/// Borrow a fixed-size input.
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `N` bytes for `'a`.
unsafe fn array<'a, const N: usize>(ptr: *const c_uchar) -> Option<&'a [u8; N]> {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr.cast::<[u8; N]>().as_ref() }
}

/// Borrow a variable-size input. Negative lengths are rejected.
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` bytes for `'a` (or null with
/// `len == 0`).
unsafe fn bytes<'a>(ptr: *const c_uchar, len: c_int) -> Option<&'a [u8]> {
    let len = usize::try_from(len).ok()?;
    if ptr.is_null() {
        return (len == 0).then_some(&[]);
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Copy `value` into an output buffer whose capacity is held in `len_cell`,
/// then narrow the cell to the written length.
///
/// # Safety
///
/// `out` must be valid for writes of `*len_cell` bytes; `len_cell` must be
/// valid for reads and writes.
unsafe fn write_var(out: *mut c_uchar, len_cell: *mut c_int, value: &[u8]) -> bool {
    if out.is_null() || len_cell.is_null() {
        return false;
    }
    // SAFETY: guaranteed by the caller.
    let Ok(capacity) = usize::try_from(unsafe { *len_cell }) else {
        return false;
    };
    if capacity < value.len() {
        return false;
    }
    // SAFETY: capacity checked above; buffers come from different owners.
    unsafe {
        ptr::copy_nonoverlapping(value.as_ptr(), out, value.len());
        *len_cell = value.len() as c_int;
    }
    true
}

/// Copy `value` into a fixed-size output buffer.
///
/// # Safety
///
/// `out` must be valid for writes of `value.len()` bytes.
unsafe fn write_fixed(out: *mut c_uchar, value: &[u8]) -> bool {
    if out.is_null() {
        return false;
    }
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::copy_nonoverlapping(value.as_ptr(), out, value.len()) };
    true
}

/// Run the signer, asking `noncefp` for candidates until one produces a valid
/// signature. Stops as soon as the nonce function reports failure.
///
/// # Safety
///
/// `noncefp` must be safe to call with 32-byte buffers and `ndata`.
unsafe fn sign_with_nonces(
    msg32: &[u8; 32],
    seckey: &[u8; 32],
    noncefp: secp256k1_nonce_function_t,
    ndata: *const c_void,
) -> Option<RawSignature> {
    let d = curve::parse_secret_key(seckey)?;
    let z = curve::message_scalar(msg32);
    let noncefp = noncefp.or(NONCE_FUNCTION_DEFAULT)?;

    let mut attempt: c_uint = 0;
    loop {
        let mut nonce = Zeroizing::new([0u8; 32]);
        // SAFETY: all buffers are 32 bytes and outlive the call.
        let produced =
            unsafe { noncefp(nonce.as_mut_ptr(), msg32.as_ptr(), seckey.as_ptr(), attempt, ndata) };
        if produced != 1 {
            return None;
        }

        if let Some(k) = curve::parse_secret_key(&nonce) {
            if let Some(signature) = curve::sign(&d, &z, &k) {
                return Some(signature);
            }
        }
        attempt = attempt.checked_add(1)?;
    }
}

pub(crate) const NONCE_FUNCTION_DEFAULT: secp256k1_nonce_function_t =
    Some(secp256k1_nonce_function_rfc6979);

pub(crate) unsafe extern "C" fn secp256k1_nonce_function_rfc6979(
    nonce32: *mut c_uchar,
    msg32: *const c_uchar,
    key32: *const c_uchar,
    attempt: c_uint,
    data: *const c_void,
) -> c_int {
    guard(|| {
        // SAFETY: the ABI requires 32-byte buffers; data is null or 32 bytes.
        let (Some(msg32), Some(key32), extra) =
            (unsafe { (array::<32>(msg32), array::<32>(key32), array::<32>(data.cast())) })
        else {
            return 0;
        };

        let nonce = Zeroizing::new(rfc6979::nonce(msg32, key32, extra, attempt));
        // SAFETY: nonce32 is a 32-byte output buffer.
        c_int::from(unsafe { write_fixed(nonce32, nonce.as_slice()) })
    })
}

pub(crate) unsafe extern "C" fn secp256k1_context_create(flags: c_int) -> *mut secp256k1_context_t {
    let ctx = SoftContext::new(flags);
    tracing::trace!(flags = ctx.flags(), "soft context created");
    ctx.into_raw()
}

pub(crate) unsafe extern "C" fn secp256k1_context_clone(
    ctx: *const secp256k1_context_t,
) -> *mut secp256k1_context_t {
    // SAFETY: ctx is a handle from this library.
    match unsafe { SoftContext::from_handle(ctx) } {
        Some(ctx) => ctx.clone().into_raw(),
        None => ptr::null_mut(),
    }
}

pub(crate) unsafe extern "C" fn secp256k1_context_destroy(ctx: *mut secp256k1_context_t) {
    // SAFETY: ctx is a handle from this library, destroyed once by its owner.
    unsafe { SoftContext::destroy(ctx) };
}

pub(crate) unsafe extern "C" fn secp256k1_ecdsa_verify(
    ctx: *const secp256k1_context_t,
    msg32: *const c_uchar,
    sig: *const c_uchar,
    siglen: c_int,
    pubkey: *const c_uchar,
    pubkeylen: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(msg32), Some(sig), Some(pubkey)) = (unsafe {
            (
                SoftContext::from_handle(ctx),
                array::<32>(msg32),
                bytes(sig, siglen),
                bytes(pubkey, pubkeylen),
            )
        }) else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_VERIFY, "secp256k1_ecdsa_verify") {
            return 0;
        }
        curve::verify_der(msg32, sig, pubkey)
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ecdsa_sign(
    ctx: *const secp256k1_context_t,
    msg32: *const c_uchar,
    sig: *mut c_uchar,
    siglen: *mut c_int,
    seckey: *const c_uchar,
    noncefp: secp256k1_nonce_function_t,
    ndata: *const c_void,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(msg32), Some(seckey)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(msg32), array::<32>(seckey)) })
        else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_SIGN, "secp256k1_ecdsa_sign") {
            return 0;
        }

        // SAFETY: noncefp is supplied by the caller per the ABI.
        let Some(signature) = (unsafe { sign_with_nonces(msg32, seckey, noncefp, ndata) }) else {
            return 0;
        };
        let Some(der) = signature.to_der() else {
            return 0;
        };
        // SAFETY: sig holds *siglen bytes.
        c_int::from(unsafe { write_var(sig, siglen, &der) })
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ecdsa_sign_compact(
    ctx: *const secp256k1_context_t,
    msg32: *const c_uchar,
    sig64: *mut c_uchar,
    seckey: *const c_uchar,
    noncefp: secp256k1_nonce_function_t,
    ndata: *const c_void,
    recid: *mut c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(msg32), Some(seckey)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(msg32), array::<32>(seckey)) })
        else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_SIGN, "secp256k1_ecdsa_sign_compact") {
            return 0;
        }

        // SAFETY: noncefp is supplied by the caller per the ABI.
        let Some(signature) = (unsafe { sign_with_nonces(msg32, seckey, noncefp, ndata) }) else {
            return 0;
        };
        if recid.is_null() {
            return 0;
        }
        // SAFETY: sig64 holds 64 bytes; recid checked non-null above.
        unsafe {
            if !write_fixed(sig64, &signature.to_compact()) {
                return 0;
            }
            *recid = c_int::from(signature.recid);
        }
        1
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ecdsa_recover_compact(
    ctx: *const secp256k1_context_t,
    msg32: *const c_uchar,
    sig64: *const c_uchar,
    pubkey: *mut c_uchar,
    pubkeylen: *mut c_int,
    compressed: c_int,
    recid: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(msg32), Some(sig64)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(msg32), array::<64>(sig64)) })
        else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_VERIFY, "secp256k1_ecdsa_recover_compact") {
            return 0;
        }
        let Ok(recid) = u8::try_from(recid) else {
            return 0;
        };

        let Some(point) = curve::recover(msg32, sig64, recid) else {
            return 0;
        };
        let Some(encoded) = curve::serialize_point(&point, compressed != 0) else {
            return 0;
        };
        // SAFETY: pubkey holds *pubkeylen bytes.
        c_int::from(unsafe { write_var(pubkey, pubkeylen, &encoded) })
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_seckey_verify(
    ctx: *const secp256k1_context_t,
    seckey: *const c_uchar,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(_), Some(seckey)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(seckey)) })
        else {
            return 0;
        };
        c_int::from(curve::parse_secret_key(seckey).is_some())
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_pubkey_verify(
    ctx: *const secp256k1_context_t,
    pubkey: *const c_uchar,
    pubkeylen: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(_), Some(pubkey)) =
            (unsafe { (SoftContext::from_handle(ctx), bytes(pubkey, pubkeylen)) })
        else {
            return 0;
        };
        c_int::from(curve::parse_public_key(pubkey).is_some())
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_pubkey_create(
    ctx: *const secp256k1_context_t,
    pubkey: *mut c_uchar,
    pubkeylen: *mut c_int,
    seckey: *const c_uchar,
    compressed: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(seckey)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(seckey)) })
        else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_SIGN, "secp256k1_ec_pubkey_create") {
            return 0;
        }

        let Some(encoded) = curve::pubkey_create(seckey, compressed != 0) else {
            return 0;
        };
        // SAFETY: pubkey holds *pubkeylen bytes.
        c_int::from(unsafe { write_var(pubkey, pubkeylen, &encoded) })
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_pubkey_decompress(
    ctx: *const secp256k1_context_t,
    pubkey: *mut c_uchar,
    pubkeylen: *mut c_int,
) -> c_int {
    guard(|| {
        if pubkeylen.is_null() {
            return 0;
        }
        // SAFETY: pubkey holds *pubkeylen initialised bytes and has room for 65.
        let (Some(_), Some(input)) =
            (unsafe { (SoftContext::from_handle(ctx), bytes(pubkey.cast_const(), *pubkeylen)) })
        else {
            return 0;
        };

        let Some(encoded) =
            curve::parse_public_key(input).and_then(|point| curve::serialize_point(&point, false))
        else {
            return 0;
        };
        // SAFETY: the ABI requires a 65-byte buffer for in-place decompression.
        unsafe {
            if !write_fixed(pubkey, &encoded) {
                return 0;
            }
            *pubkeylen = encoded.len() as c_int;
        }
        1
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_privkey_export(
    ctx: *const secp256k1_context_t,
    seckey: *const c_uchar,
    privkey: *mut c_uchar,
    privkeylen: *mut c_int,
    compressed: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(ctx), Some(seckey)) =
            (unsafe { (SoftContext::from_handle(ctx), array::<32>(seckey)) })
        else {
            return 0;
        };
        if !ctx.require(SECP256K1_START_SIGN, "secp256k1_ec_privkey_export") {
            return 0;
        }

        let Some(pubkey) = curve::pubkey_create(seckey, compressed != 0) else {
            return 0;
        };
        let der = Zeroizing::new(der::encode_private_key(seckey, &pubkey));
        // SAFETY: privkey holds *privkeylen bytes.
        c_int::from(unsafe { write_var(privkey, privkeylen, &der) })
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_privkey_import(
    ctx: *const secp256k1_context_t,
    seckey: *mut c_uchar,
    privkey: *const c_uchar,
    privkeylen: c_int,
) -> c_int {
    guard(|| {
        // SAFETY: pointers follow the ABI contract for this entry point.
        let (Some(_), Some(privkey)) =
            (unsafe { (SoftContext::from_handle(ctx), bytes(privkey, privkeylen)) })
        else {
            return 0;
        };

        let Some(key) = der::decode_private_key(privkey).map(Zeroizing::new) else {
            return 0;
        };
        if curve::parse_secret_key(&key).is_none() {
            return 0;
        }
        // SAFETY: seckey is a 32-byte output buffer.
        c_int::from(unsafe { write_fixed(seckey, key.as_slice()) })
    })
}

/// Shared body of the in-place secret key tweaks.
///
/// # Safety
///
/// `seckey` must be valid for reads and writes of 32 bytes, `tweak` for reads
/// of 32 bytes.
unsafe fn tweak_secret_key(
    ctx: *const secp256k1_context_t,
    seckey: *mut c_uchar,
    tweak: *const c_uchar,
    op: fn(&[u8; 32], &[u8; 32]) -> Option<[u8; 32]>,
) -> c_int {
    // SAFETY: guaranteed by the caller.
    let (Some(_), Some(current), Some(tweak)) = (unsafe {
        (SoftContext::from_handle(ctx), array::<32>(seckey.cast_const()), array::<32>(tweak))
    }) else {
        return 0;
    };

    let Some(updated) = op(current, tweak).map(Zeroizing::new) else {
        return 0;
    };
    // SAFETY: seckey is a 32-byte buffer; `current` is not used past this point.
    c_int::from(unsafe { write_fixed(seckey, updated.as_slice()) })
}

/// Shared body of the in-place public key tweaks. The output keeps the
/// input's length.
///
/// # Safety
///
/// `pubkey` must be valid for reads and writes of `pubkeylen` bytes, `tweak`
/// for reads of 32 bytes.
unsafe fn tweak_public_key(
    ctx: *const secp256k1_context_t,
    pubkey: *mut c_uchar,
    pubkeylen: c_int,
    tweak: *const c_uchar,
    function: &'static str,
    op: fn(&[u8], &[u8; 32]) -> Option<Vec<u8>>,
) -> c_int {
    // SAFETY: guaranteed by the caller.
    let (Some(ctx), Some(current), Some(tweak)) = (unsafe {
        (SoftContext::from_handle(ctx), bytes(pubkey.cast_const(), pubkeylen), array::<32>(tweak))
    }) else {
        return 0;
    };
    if !ctx.require(SECP256K1_START_VERIFY, function) {
        return 0;
    }

    let Some(updated) = op(current, tweak) else {
        return 0;
    };
    if updated.len() != current.len() {
        return 0;
    }
    // SAFETY: same length as the input buffer; `current` is not used past this point.
    c_int::from(unsafe { write_fixed(pubkey, &updated) })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_privkey_tweak_add(
    ctx: *const secp256k1_context_t,
    seckey: *mut c_uchar,
    tweak: *const c_uchar,
) -> c_int {
    // SAFETY: forwarded ABI contract.
    guard(|| unsafe { tweak_secret_key(ctx, seckey, tweak, curve::privkey_tweak_add) })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_privkey_tweak_mul(
    ctx: *const secp256k1_context_t,
    seckey: *mut c_uchar,
    tweak: *const c_uchar,
) -> c_int {
    // SAFETY: forwarded ABI contract.
    guard(|| unsafe { tweak_secret_key(ctx, seckey, tweak, curve::privkey_tweak_mul) })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_pubkey_tweak_add(
    ctx: *const secp256k1_context_t,
    pubkey: *mut c_uchar,
    pubkeylen: c_int,
    tweak: *const c_uchar,
) -> c_int {
    guard(|| {
        // SAFETY: forwarded ABI contract.
        unsafe {
            tweak_public_key(
                ctx,
                pubkey,
                pubkeylen,
                tweak,
                "secp256k1_ec_pubkey_tweak_add",
                curve::pubkey_tweak_add,
            )
        }
    })
}

pub(crate) unsafe extern "C" fn secp256k1_ec_pubkey_tweak_mul(
    ctx: *const secp256k1_context_t,
    pubkey: *mut c_uchar,
    pubkeylen: c_int,
    tweak: *const c_uchar,
) -> c_int {
    guard(|| {
        // SAFETY: forwarded ABI contract.
        unsafe {
            tweak_public_key(
                ctx,
                pubkey,
                pubkeylen,
                tweak,
                "secp256k1_ec_pubkey_tweak_mul",
                curve::pubkey_tweak_mul,
            )
        }
    })
}
