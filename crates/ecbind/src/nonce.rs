//! Nonce callback bridge.
//!
//! A signing call takes an optional [`NonceSpec`]. Named specs resolve to the
//! library's own nonce-function pointers; a custom callback resolves to an
//! `extern "C"` trampoline that receives the bridge state through the native
//! `ndata` pointer and calls back into Rust.
//!
//! Nothing unwinds across the C boundary. The trampoline records a callback
//! error, a panic, or a wrongly-sized nonce, tells the native side "no nonce"
//! (0), and refuses every later attempt. Once the native call has returned,
//! [`NonceBridge::finish`] hands the error back unchanged or resumes the
//! panic on the calling thread.

#![allow(unsafe_code)]

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    ptr,
    str::FromStr,
};

use ecbind_sys::{
    ForeignLibrary, NONCE_LENGTH, c_int, c_uchar, c_uint, c_void, secp256k1_nonce_function_t,
};
use zeroize::Zeroizing;

use crate::{
    argument::{NonceOut, StringIn},
    error::{ArgumentError, BoxError, Error, ProtocolViolation},
};

/// Canonical callback: `(msg32, seckey, attempt)` to a 32-byte nonce, `None`
/// for "no nonce", or the caller's own error.
pub type NonceCallback<'a> =
    Box<dyn FnMut(&[u8; 32], &[u8; 32], u32) -> Result<Option<Vec<u8>>, BoxError> + 'a>;

/// How a signing call generates its nonce.
pub enum NonceSpec<'a> {
    /// The library's default generator
    Default,
    /// The library's RFC6979 generator
    Rfc6979,
    /// A null function pointer; the library picks its built-in default
    Null,
    /// A caller-supplied generator
    Custom(NonceCallback<'a>),
}

impl<'a> NonceSpec<'a> {
    /// Wrap a callback taking `(msg32, seckey, attempt)`.
    pub fn custom<F>(callback: F) -> Self
    where
        F: FnMut(&[u8; 32], &[u8; 32], u32) -> Result<Option<Vec<u8>>, BoxError> + 'a,
    {
        Self::Custom(Box::new(callback))
    }

    /// Wrap a callback that only looks at the attempt counter.
    pub fn attempt_only<F>(mut callback: F) -> Self
    where
        F: FnMut(u32) -> Result<Option<Vec<u8>>, BoxError> + 'a,
    {
        Self::custom(move |_msg32, _seckey, attempt| callback(attempt))
    }
}

impl fmt::Debug for NonceSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Rfc6979 => f.write_str("Rfc6979"),
            Self::Null => f.write_str("Null"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for NonceSpec<'_> {
    type Err = ArgumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "rfc6979" => Ok(Self::Rfc6979),
            "null" => Ok(Self::Null),
            _ => Err(ArgumentError::InvalidNonceFunction { value: value.to_owned() }),
        }
    }
}

/// What an absent spec means at a given call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenAbsent {
    /// Use the library's default generator
    UseDefault,
    /// Pass a null function pointer
    PassNull,
}

enum Failure {
    Callback(BoxError),
    Panic(Box<dyn Any + Send + 'static>),
    Protocol(ProtocolViolation),
}

struct BridgeState<'a> {
    callback: NonceCallback<'a>,
    failure: Option<Failure>,
}

/// A nonce spec resolved for exactly one native call.
pub(crate) struct NonceBridge<'a> {
    function: secp256k1_nonce_function_t,
    state: Option<Box<BridgeState<'a>>>,
}

impl<'a> NonceBridge<'a> {
    pub(crate) fn new(
        spec: Option<NonceSpec<'a>>,
        when_absent: WhenAbsent,
        lib: &ForeignLibrary,
    ) -> Self {
        let spec = spec.unwrap_or(match when_absent {
            WhenAbsent::UseDefault => NonceSpec::Default,
            WhenAbsent::PassNull => NonceSpec::Null,
        });

        match spec {
            NonceSpec::Default => Self { function: lib.nonce_function_default, state: None },
            NonceSpec::Rfc6979 => Self { function: lib.nonce_function_rfc6979, state: None },
            NonceSpec::Null => Self { function: None, state: None },
            NonceSpec::Custom(callback) => Self {
                function: Some(trampoline),
                state: Some(Box::new(BridgeState { callback, failure: None })),
            },
        }
    }

    /// Function pointer to pass as `noncefp`.
    pub(crate) fn function(&self) -> secp256k1_nonce_function_t {
        self.function
    }

    /// Pointer to pass as `ndata`. Null unless a custom callback is installed.
    pub(crate) fn data(&mut self) -> *const c_void {
        match &mut self.state {
            Some(state) => ptr::from_mut::<BridgeState<'a>>(state.as_mut()).cast_const().cast(),
            None => ptr::null(),
        }
    }

    /// Surface whatever the trampoline recorded during the native call.
    ///
    /// A recorded panic is resumed here, after the native frame is gone.
    pub(crate) fn finish(self) -> Result<(), Error> {
        let Some(failure) = self.state.and_then(|state| state.failure) else {
            return Ok(());
        };

        match failure {
            Failure::Callback(err) => Err(Error::NonceCallback(err)),
            Failure::Protocol(violation) => {
                tracing::warn!(%violation, "nonce callback broke the nonce contract");
                Err(Error::Protocol(violation))
            },
            Failure::Panic(payload) => panic::resume_unwind(payload),
        }
    }
}

/// `secp256k1_nonce_function_t` implementation for custom callbacks.
///
/// # Safety
///
/// `data` must be null or the pointer returned by [`NonceBridge::data`] for
/// a bridge that outlives the call. `msg32` and `key32` must be readable for
/// 32 bytes and `nonce32` writable for 32 bytes.
unsafe extern "C" fn trampoline(
    nonce32: *mut c_uchar,
    msg32: *const c_uchar,
    key32: *const c_uchar,
    attempt: c_uint,
    data: *const c_void,
) -> c_int {
    // SAFETY: data was derived from a live `&mut BridgeState` that nothing
    // else touches during the native call.
    let Some(state) = (unsafe { data.cast_mut().cast::<BridgeState<'_>>().as_mut() }) else {
        return 0;
    };
    if state.failure.is_some() {
        return 0;
    }

    // SAFETY: the native side passes 32-byte message and key buffers.
    let (Some(msg32), Some(key32)) =
        (unsafe { (msg32.cast::<[u8; 32]>().as_ref(), key32.cast::<[u8; 32]>().as_ref()) })
    else {
        return 0;
    };

    tracing::trace!(attempt, "nonce callback");
    let callback = &mut state.callback;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(msg32, key32, attempt)));

    match outcome {
        Ok(Ok(None)) => 0,
        Ok(Ok(Some(nonce))) => {
            let nonce = Zeroizing::new(nonce);
            if nonce.len() != NONCE_LENGTH {
                state.failure = Some(Failure::Protocol(ProtocolViolation::NonceLength {
                    actual: nonce.len(),
                }));
                return 0;
            }
            if nonce32.is_null() {
                return 0;
            }
            // SAFETY: nonce32 is a 32-byte output buffer and nonce is exactly
            // 32 bytes of Rust-owned memory.
            unsafe { ptr::copy_nonoverlapping(nonce.as_ptr(), nonce32, NONCE_LENGTH) };
            1
        },
        Ok(Err(err)) => {
            state.failure = Some(Failure::Callback(err));
            0
        },
        Err(payload) => {
            state.failure = Some(Failure::Panic(payload));
            0
        },
    }
}

/// Run the library's default nonce generator directly.
///
/// Returns `None` if the generator declines to produce a nonce.
pub fn nonce_function_default(
    lib: &ForeignLibrary,
    msg32: impl AsRef<[u8]>,
    seckey: impl AsRef<[u8]>,
    attempt: u32,
) -> Result<Option<[u8; 32]>, Error> {
    call_named(
        lib.nonce_function_default,
        "secp256k1_nonce_function_default",
        msg32.as_ref(),
        seckey.as_ref(),
        attempt,
    )
}

/// Run the library's RFC6979 nonce generator directly.
pub fn nonce_function_rfc6979(
    lib: &ForeignLibrary,
    msg32: impl AsRef<[u8]>,
    seckey: impl AsRef<[u8]>,
    attempt: u32,
) -> Result<Option<[u8; 32]>, Error> {
    call_named(
        lib.nonce_function_rfc6979,
        "secp256k1_nonce_function_rfc6979",
        msg32.as_ref(),
        seckey.as_ref(),
        attempt,
    )
}

fn call_named(
    function: secp256k1_nonce_function_t,
    name: &'static str,
    msg32: &[u8],
    seckey: &[u8],
    attempt: u32,
) -> Result<Option<[u8; 32]>, Error> {
    let msg32 = StringIn::message_hash(msg32)?;
    let seckey = StringIn::secret_key(seckey)?;
    let Some(function) = function else {
        tracing::warn!(function = name, "library exports a null nonce function");
        return Ok(None);
    };

    let mut nonce = NonceOut::new("nonce32");
    // SAFETY: nonce holds 32 writable bytes, msg32 and seckey were validated
    // as 32 bytes, and named generators accept null extra data.
    let code = unsafe {
        function(nonce.as_mut_ptr(), msg32.as_ptr(), seckey.as_ptr(), attempt, ptr::null())
    };

    match code {
        1 => Ok(Some(nonce.value())),
        0 => Ok(None),
        code => {
            tracing::warn!(function = name, code, "unexpected result code");
            Err(ProtocolViolation::UnexpectedResult { function: name, code }.into())
        },
    }
}
