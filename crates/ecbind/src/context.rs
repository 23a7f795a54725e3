//! Native context ownership and the operations that run through it.
//!
//! A [`Context`] owns one native handle for its whole life: created in
//! [`Context::with_library`], duplicated only by [`Context::try_clone`], and
//! destroyed exactly once in `Drop`. Every operation follows the same steps:
//!
//! 1. check the capability the native function needs
//! 2. validate and wrap inputs (see [`crate::argument`])
//! 3. resolve the nonce spec, if any (see [`crate::nonce`])
//! 4. call through the [`ForeignLibrary`] table
//! 5. decode the result code, rejecting anything outside the documented set

#![allow(unsafe_code)]

use std::{fmt, ptr::NonNull};

use ecbind_sys::{ForeignLibrary, c_int, secp256k1_context_t};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::{
    argument::{
        Flag, RecidOut, SecretKeyInOut, SecretKeyOut, SignatureCompactOut, StringIn,
        VarStringInOut, VarStringOut,
    },
    error::{ArgumentError, Error, ProtocolViolation},
    nonce::{NonceBridge, NonceSpec, WhenAbsent},
    options::{Capability, ContextOptions},
};

/// Outcome of [`Context::ecdsa_verify`], one variant per native result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Verification {
    /// The signature is valid for the message and key
    Valid = 1,
    /// Well-formed inputs, but the signature does not match
    Invalid = 0,
    /// The public key could not be parsed
    InvalidPublicKey = -1,
    /// The signature could not be parsed
    InvalidSignature = -2,
}

impl Verification {
    /// The native result code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// True only for [`Verification::Valid`].
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    fn from_code(code: c_int) -> Option<Self> {
        match code {
            1 => Some(Self::Valid),
            0 => Some(Self::Invalid),
            -1 => Some(Self::InvalidPublicKey),
            -2 => Some(Self::InvalidSignature),
            _ => None,
        }
    }
}

/// A compact signature with the id needed to recover its public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// `r || s`, 32 bytes each
    pub signature: [u8; 64],
    /// 0..=3
    pub recovery_id: u8,
}

/// Library used by [`Context::new`]: the system `libsecp256k1` with feature
/// `system`, the software provider otherwise.
pub fn default_library() -> &'static ForeignLibrary {
    #[cfg(feature = "system")]
    {
        ecbind_sys::system()
    }
    #[cfg(not(feature = "system"))]
    {
        ecbind_soft::library()
    }
}

/// Owner of a native secp256k1 context.
pub struct Context {
    handle: NonNull<secp256k1_context_t>,
    options: ContextOptions,
    lib: &'static ForeignLibrary,
}

// SAFETY: the native context is immutable after creation and every entry
// point takes it as `const`; the only mutation (destroy) needs ownership.
unsafe impl Send for Context {}

// SAFETY: see `Send`. Concurrent `&self` calls only read the handle.
unsafe impl Sync for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("handle", &self.handle)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn decode_bool(function: &'static str, code: c_int) -> Result<bool, Error> {
    match code {
        1 => Ok(true),
        0 => Ok(false),
        code => Err(unexpected(function, code)),
    }
}

fn unexpected(function: &'static str, code: c_int) -> Error {
    tracing::warn!(function, code, "unexpected result code");
    ProtocolViolation::UnexpectedResult { function, code }.into()
}

impl Context {
    /// Create a context on the [`default_library`].
    pub fn new(options: ContextOptions) -> Result<Self, Error> {
        Self::with_library(default_library(), options)
    }

    /// Create a context on an explicit function table.
    pub fn with_library(
        lib: &'static ForeignLibrary,
        options: ContextOptions,
    ) -> Result<Self, Error> {
        const FUNCTION: &str = "secp256k1_context_create";
        let flags = options.flags();

        // SAFETY: context creation takes only the flag word.
        let raw = unsafe { (lib.secp256k1_context_create)(flags) };
        let Some(handle) = NonNull::new(raw) else {
            tracing::warn!(function = FUNCTION, flags, "native returned a null context");
            return Err(ProtocolViolation::NullContext { function: FUNCTION }.into());
        };

        tracing::debug!(flags, "context created");
        Ok(Self { handle, options, lib })
    }

    /// Capabilities the context was created with.
    pub fn options(&self) -> ContextOptions {
        self.options
    }

    /// Function table the context calls through.
    pub fn library(&self) -> &'static ForeignLibrary {
        self.lib
    }

    pub(crate) fn to_native_handle(&self) -> *const secp256k1_context_t {
        self.handle.as_ptr().cast_const()
    }

    /// Duplicate the native context. The copy is independent of `self`.
    pub fn try_clone(&self) -> Result<Self, Error> {
        const FUNCTION: &str = "secp256k1_context_clone";

        // SAFETY: the handle is live for as long as `self`.
        let raw = unsafe { (self.lib.secp256k1_context_clone)(self.to_native_handle()) };
        let Some(handle) = NonNull::new(raw) else {
            tracing::warn!(function = FUNCTION, "native returned a null context");
            return Err(ProtocolViolation::NullContext { function: FUNCTION }.into());
        };

        tracing::debug!(flags = self.options.flags(), "context cloned");
        Ok(Self { handle, options: self.options, lib: self.lib })
    }

    fn require(&self, operation: &'static str, capability: Capability) -> Result<(), Error> {
        if self.options.has(capability) {
            return Ok(());
        }
        tracing::debug!(operation, %capability, "operation rejected");
        Err(Error::MissingCapability { operation, capability })
    }

    /// Verify a DER signature.
    pub fn ecdsa_verify(
        &self,
        msg32: impl AsRef<[u8]>,
        sig: impl AsRef<[u8]>,
        pubkey: impl AsRef<[u8]>,
    ) -> Result<Verification, Error> {
        const FUNCTION: &str = "secp256k1_ecdsa_verify";
        self.require(FUNCTION, Capability::Verify)?;

        let msg32 = StringIn::message_hash(msg32.as_ref())?;
        let sig = StringIn::signature(sig.as_ref())?;
        let pubkey = StringIn::public_key(pubkey.as_ref())?;

        // SAFETY: inputs are validated and borrowed for the whole call.
        let code = unsafe {
            (self.lib.secp256k1_ecdsa_verify)(
                self.to_native_handle(),
                msg32.as_ptr(),
                sig.as_ptr(),
                sig.c_len(),
                pubkey.as_ptr(),
                pubkey.c_len(),
            )
        };
        Verification::from_code(code).ok_or_else(|| unexpected(FUNCTION, code))
    }

    /// Produce a DER signature.
    ///
    /// `None` for `nonce` passes a null nonce function, which the library
    /// treats as its default. Returns `Ok(None)` when nonce generation fails
    /// (for example a custom callback returning no nonce).
    pub fn ecdsa_sign(
        &self,
        msg32: impl AsRef<[u8]>,
        seckey: impl AsRef<[u8]>,
        nonce: Option<NonceSpec<'_>>,
    ) -> Result<Option<Vec<u8>>, Error> {
        const FUNCTION: &str = "secp256k1_ecdsa_sign";
        self.require(FUNCTION, Capability::Sign)?;

        let msg32 = StringIn::message_hash(msg32.as_ref())?;
        let seckey = StringIn::secret_key(seckey.as_ref())?;
        let mut sig = VarStringOut::signature();
        let mut bridge = NonceBridge::new(nonce, WhenAbsent::PassNull, self.lib);
        let ndata = bridge.data();

        // SAFETY: inputs are validated, `sig` and its length cell are owned
        // here, and the bridge state outlives the call.
        let code = unsafe {
            (self.lib.secp256k1_ecdsa_sign)(
                self.to_native_handle(),
                msg32.as_ptr(),
                sig.as_mut_ptr(),
                sig.len_ptr(),
                seckey.as_ptr(),
                bridge.function(),
                ndata,
            )
        };
        bridge.finish()?;

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(sig.value(FUNCTION)?))
    }

    /// Produce a compact signature with its recovery id.
    pub fn ecdsa_sign_compact(
        &self,
        msg32: impl AsRef<[u8]>,
        seckey: impl AsRef<[u8]>,
        nonce: Option<NonceSpec<'_>>,
    ) -> Result<Option<RecoverableSignature>, Error> {
        self.sign_compact(msg32.as_ref(), seckey.as_ref(), nonce, WhenAbsent::PassNull)
    }

    pub(crate) fn sign_compact(
        &self,
        msg32: &[u8],
        seckey: &[u8],
        nonce: Option<NonceSpec<'_>>,
        when_absent: WhenAbsent,
    ) -> Result<Option<RecoverableSignature>, Error> {
        const FUNCTION: &str = "secp256k1_ecdsa_sign_compact";
        self.require(FUNCTION, Capability::Sign)?;

        let msg32 = StringIn::message_hash(msg32)?;
        let seckey = StringIn::secret_key(seckey)?;
        let mut sig64 = SignatureCompactOut::new("sig64");
        let mut recid = RecidOut::new();
        let mut bridge = NonceBridge::new(nonce, when_absent, self.lib);
        let ndata = bridge.data();

        // SAFETY: inputs are validated, outputs are owned here, and the
        // bridge state outlives the call.
        let code = unsafe {
            (self.lib.secp256k1_ecdsa_sign_compact)(
                self.to_native_handle(),
                msg32.as_ptr(),
                sig64.as_mut_ptr(),
                seckey.as_ptr(),
                bridge.function(),
                ndata,
                recid.as_mut_ptr(),
            )
        };
        bridge.finish()?;

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(RecoverableSignature {
            signature: sig64.value(),
            recovery_id: recid.value(FUNCTION)?,
        }))
    }

    /// Recover the public key behind a compact signature.
    pub fn ecdsa_recover_compact(
        &self,
        msg32: impl AsRef<[u8]>,
        sig64: impl AsRef<[u8]>,
        compressed: bool,
        recid: u8,
    ) -> Result<Option<Vec<u8>>, Error> {
        const FUNCTION: &str = "secp256k1_ecdsa_recover_compact";
        self.require(FUNCTION, Capability::Verify)?;

        let msg32 = StringIn::message_hash(msg32.as_ref())?;
        let sig64 = StringIn::compact_signature(sig64.as_ref())?;
        if recid > 3 {
            return Err(ArgumentError::InvalidRecoveryId { recid }.into());
        }
        let mut pubkey = VarStringOut::public_key();

        // SAFETY: inputs are validated; `pubkey` and its length cell are
        // owned here.
        let code = unsafe {
            (self.lib.secp256k1_ecdsa_recover_compact)(
                self.to_native_handle(),
                msg32.as_ptr(),
                sig64.as_ptr(),
                pubkey.as_mut_ptr(),
                pubkey.len_ptr(),
                Flag::from(compressed).raw(),
                c_int::from(recid),
            )
        };

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(pubkey.value(FUNCTION)?))
    }

    /// Whether `seckey` is a valid secret key.
    pub fn ec_seckey_verify(&self, seckey: impl AsRef<[u8]>) -> Result<bool, Error> {
        const FUNCTION: &str = "secp256k1_ec_seckey_verify";
        let seckey = StringIn::secret_key(seckey.as_ref())?;

        // SAFETY: the input is validated and borrowed for the call.
        let code = unsafe {
            (self.lib.secp256k1_ec_seckey_verify)(self.to_native_handle(), seckey.as_ptr())
        };
        decode_bool(FUNCTION, code)
    }

    /// Whether `pubkey` parses as a public key.
    pub fn ec_pubkey_verify(&self, pubkey: impl AsRef<[u8]>) -> Result<bool, Error> {
        const FUNCTION: &str = "secp256k1_ec_pubkey_verify";
        let pubkey = StringIn::public_key(pubkey.as_ref())?;

        // SAFETY: the input is validated and borrowed for the call.
        let code = unsafe {
            (self.lib.secp256k1_ec_pubkey_verify)(
                self.to_native_handle(),
                pubkey.as_ptr(),
                pubkey.c_len(),
            )
        };
        decode_bool(FUNCTION, code)
    }

    /// Derive the public key of `seckey`.
    pub fn ec_pubkey_create(
        &self,
        seckey: impl AsRef<[u8]>,
        compressed: bool,
    ) -> Result<Option<Vec<u8>>, Error> {
        const FUNCTION: &str = "secp256k1_ec_pubkey_create";
        self.require(FUNCTION, Capability::Sign)?;

        let seckey = StringIn::secret_key(seckey.as_ref())?;
        let mut pubkey = VarStringOut::public_key();

        // SAFETY: the input is validated; `pubkey` and its length cell are
        // owned here.
        let code = unsafe {
            (self.lib.secp256k1_ec_pubkey_create)(
                self.to_native_handle(),
                pubkey.as_mut_ptr(),
                pubkey.len_ptr(),
                seckey.as_ptr(),
                Flag::from(compressed).raw(),
            )
        };

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(pubkey.value(FUNCTION)?))
    }

    /// Uncompressed (65-byte) form of a 33- or 65-byte public key.
    pub fn ec_pubkey_decompress(&self, pubkey: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>, Error> {
        const FUNCTION: &str = "secp256k1_ec_pubkey_decompress";
        let mut pubkey = VarStringInOut::public_key(pubkey.as_ref())?;

        // SAFETY: the 65-byte buffer and its length cell are owned here.
        let code = unsafe {
            (self.lib.secp256k1_ec_pubkey_decompress)(
                self.to_native_handle(),
                pubkey.as_mut_ptr(),
                pubkey.len_ptr(),
            )
        };

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(pubkey.value(FUNCTION)?))
    }

    /// DER-encode a secret key with its public key.
    pub fn ec_privkey_export(
        &self,
        seckey: impl AsRef<[u8]>,
        compressed: bool,
    ) -> Result<Option<Vec<u8>>, Error> {
        const FUNCTION: &str = "secp256k1_ec_privkey_export";
        self.require(FUNCTION, Capability::Sign)?;

        let seckey = StringIn::secret_key(seckey.as_ref())?;
        let mut privkey = VarStringOut::private_key_der();

        // SAFETY: the input is validated; `privkey` and its length cell are
        // owned here.
        let code = unsafe {
            (self.lib.secp256k1_ec_privkey_export)(
                self.to_native_handle(),
                seckey.as_ptr(),
                privkey.as_mut_ptr(),
                privkey.len_ptr(),
                Flag::from(compressed).raw(),
            )
        };

        if !decode_bool(FUNCTION, code)? {
            return Ok(None);
        }
        Ok(Some(privkey.value(FUNCTION)?))
    }

    /// Extract the secret key from a DER private key.
    pub fn ec_privkey_import(&self, privkey: impl AsRef<[u8]>) -> Result<Option<[u8; 32]>, Error> {
        const FUNCTION: &str = "secp256k1_ec_privkey_import";
        let privkey = StringIn::private_key_der(privkey.as_ref())?;
        let mut seckey = SecretKeyOut::new("seckey");

        // SAFETY: the input is validated; `seckey` is a 32-byte owned buffer.
        let code = unsafe {
            (self.lib.secp256k1_ec_privkey_import)(
                self.to_native_handle(),
                seckey.as_mut_ptr(),
                privkey.as_ptr(),
                privkey.c_len(),
            )
        };

        Ok(decode_bool(FUNCTION, code)?.then(|| seckey.value()))
    }

    /// `seckey + tweak` modulo the group order.
    pub fn ec_privkey_tweak_add(
        &self,
        seckey: impl AsRef<[u8]>,
        tweak: impl AsRef<[u8]>,
    ) -> Result<Option<[u8; 32]>, Error> {
        self.tweak_secret_key(
            "secp256k1_ec_privkey_tweak_add",
            self.lib.secp256k1_ec_privkey_tweak_add,
            seckey.as_ref(),
            tweak.as_ref(),
        )
    }

    /// `seckey * tweak` modulo the group order.
    pub fn ec_privkey_tweak_mul(
        &self,
        seckey: impl AsRef<[u8]>,
        tweak: impl AsRef<[u8]>,
    ) -> Result<Option<[u8; 32]>, Error> {
        self.tweak_secret_key(
            "secp256k1_ec_privkey_tweak_mul",
            self.lib.secp256k1_ec_privkey_tweak_mul,
            seckey.as_ref(),
            tweak.as_ref(),
        )
    }

    /// `pubkey + tweak * G`, in the input's encoding.
    pub fn ec_pubkey_tweak_add(
        &self,
        pubkey: impl AsRef<[u8]>,
        tweak: impl AsRef<[u8]>,
    ) -> Result<Option<Vec<u8>>, Error> {
        self.tweak_public_key(
            "secp256k1_ec_pubkey_tweak_add",
            self.lib.secp256k1_ec_pubkey_tweak_add,
            pubkey.as_ref(),
            tweak.as_ref(),
        )
    }

    /// `pubkey * tweak`, in the input's encoding.
    pub fn ec_pubkey_tweak_mul(
        &self,
        pubkey: impl AsRef<[u8]>,
        tweak: impl AsRef<[u8]>,
    ) -> Result<Option<Vec<u8>>, Error> {
        self.tweak_public_key(
            "secp256k1_ec_pubkey_tweak_mul",
            self.lib.secp256k1_ec_pubkey_tweak_mul,
            pubkey.as_ref(),
            tweak.as_ref(),
        )
    }

    fn tweak_secret_key(
        &self,
        function: &'static str,
        native: unsafe extern "C" fn(
            *const secp256k1_context_t,
            *mut ecbind_sys::c_uchar,
            *const ecbind_sys::c_uchar,
        ) -> c_int,
        seckey: &[u8],
        tweak: &[u8],
    ) -> Result<Option<[u8; 32]>, Error> {
        let mut seckey = SecretKeyInOut::secret_key(seckey)?;
        let tweak = StringIn::tweak(tweak)?;

        // SAFETY: `seckey` is a 32-byte owned buffer; `tweak` is validated.
        let code = unsafe { native(self.to_native_handle(), seckey.as_mut_ptr(), tweak.as_ptr()) };

        Ok(decode_bool(function, code)?.then(|| seckey.value()))
    }

    fn tweak_public_key(
        &self,
        function: &'static str,
        native: unsafe extern "C" fn(
            *const secp256k1_context_t,
            *mut ecbind_sys::c_uchar,
            c_int,
            *const ecbind_sys::c_uchar,
        ) -> c_int,
        pubkey: &[u8],
        tweak: &[u8],
    ) -> Result<Option<Vec<u8>>, Error> {
        self.require(function, Capability::Verify)?;

        let mut pubkey = VarStringInOut::public_key(pubkey)?;
        let tweak = StringIn::tweak(tweak)?;
        let pubkeylen = pubkey.input_len();

        // SAFETY: the buffer holds `pubkeylen` caller bytes and is owned here;
        // `tweak` is validated.
        let code = unsafe {
            native(self.to_native_handle(), pubkey.as_mut_ptr(), pubkeylen, tweak.as_ptr())
        };

        if !decode_bool(function, code)? {
            return Ok(None);
        }
        Ok(Some(pubkey.value(function)?))
    }

    /// Generate a random key pair.
    ///
    /// Draws 32-byte candidates from the OS RNG until one is a valid secret
    /// key, then derives its public key. Needs the sign capability.
    pub fn generate_key_pair(&self, compressed: bool) -> Result<([u8; 32], Vec<u8>), Error> {
        const FUNCTION: &str = "secp256k1_ec_pubkey_create";
        self.require(FUNCTION, Capability::Sign)?;

        let mut seckey = Zeroizing::new([0u8; 32]);
        loop {
            OsRng.fill_bytes(seckey.as_mut_slice());
            if self.ec_seckey_verify(seckey.as_slice())? {
                break;
            }
        }

        match self.ec_pubkey_create(seckey.as_slice(), compressed)? {
            Some(pubkey) => Ok((*seckey, pubkey)),
            None => Err(unexpected(FUNCTION, 0)),
        }
    }
}

impl Clone for Context {
    /// See [`Context::try_clone`].
    ///
    /// # Panics
    ///
    /// If the native library cannot allocate the copy.
    #[allow(clippy::panic)]
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(ctx) => ctx,
            Err(err) => panic!("context clone failed: {err}"),
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        tracing::debug!(flags = self.options.flags(), "context destroyed");
        // SAFETY: the handle came from create or clone on this table and is
        // destroyed exactly once, here.
        unsafe { (self.lib.secp256k1_context_destroy)(self.handle.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_codes_round_trip() {
        for code in [-2, -1, 0, 1] {
            assert_eq!(Verification::from_code(code).map(Verification::code), Some(code));
        }
        assert_eq!(Verification::from_code(2), None);
        assert!(Verification::Valid.is_valid());
        assert!(!Verification::InvalidSignature.is_valid());
    }

    #[test]
    fn operations_check_capabilities_first() {
        let ctx = Context::new(ContextOptions::default()).unwrap();

        let err = ctx.ecdsa_sign([0u8; 32], [1u8; 32], None).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingCapability {
                operation: "secp256k1_ecdsa_sign",
                capability: Capability::Sign,
            }
        ));

        let err = ctx.ecdsa_verify([0u8; 32], [0u8; 0], [0x02; 33]).unwrap_err();
        assert!(matches!(err, Error::MissingCapability { capability: Capability::Verify, .. }));
    }

    #[test]
    fn capability_free_operations_work_without_flags() {
        let ctx = Context::new(ContextOptions::default()).unwrap();
        let mut seckey = [0u8; 32];
        seckey[31] = 1;

        assert!(ctx.ec_seckey_verify(seckey).unwrap());
        assert!(!ctx.ec_seckey_verify([0u8; 32]).unwrap());
        assert_eq!(ctx.ec_privkey_tweak_add(seckey, seckey).unwrap().map(|key| key[31]), Some(2));
    }

    #[test]
    fn recovery_id_is_validated() {
        let ctx = Context::new(ContextOptions::all()).unwrap();
        let err = ctx.ecdsa_recover_compact([0u8; 32], [0u8; 64], true, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument(ArgumentError::InvalidRecoveryId { recid: 4 })
        ));
    }

    #[test]
    fn generated_keys_verify() {
        let ctx = Context::new(ContextOptions { verify: false, sign: true }).unwrap();
        let (seckey, pubkey) = ctx.generate_key_pair(true).unwrap();

        assert!(ctx.ec_seckey_verify(seckey).unwrap());
        assert_eq!(pubkey.len(), 33);
        assert_eq!(ctx.ec_pubkey_create(seckey, true).unwrap(), Some(pubkey));
    }
}
