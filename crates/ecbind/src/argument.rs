//! Binary argument types.
//!
//! Each type owns (or borrows) exactly the memory a native parameter needs and
//! checks its shape on construction, so a value that exists is always safe to
//! hand across the boundary. Names match the native parameter names and show
//! up in validation messages (`"msg32 must be 32 bytes long"`).
//!
//! Output buffers are Rust-owned; the native side only ever writes into them
//! during a call. Reading back never goes past the length the native call
//! reported, and a reported length outside the buffer is a
//! [`ProtocolViolation`].

use ecbind_sys::{
    COMPACT_SIGNATURE_LENGTH, HASH_LENGTH, MAX_PRIVKEY_DER_LENGTH, MAX_PUBKEY_LENGTH,
    MAX_SIGNATURE_LENGTH, NONCE_LENGTH, SECRET_KEY_LENGTH, TWEAK_LENGTH, VALID_PUBKEY_LENGTHS,
    c_int, c_uchar,
};
use zeroize::Zeroize;

use crate::error::{ArgumentError, ProtocolViolation};

/// Length constraint of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Exactly this many bytes
    Exact(usize),
    /// One of these lengths
    OneOf(&'static [usize]),
    /// Any length that fits a native `int`
    Any,
}

/// Convert a buffer length to the native `int` length type.
fn native_len(name: &'static str, len: usize) -> Result<c_int, ArgumentError> {
    c_int::try_from(len).map_err(|_| ArgumentError::LengthOverflow { name, actual: len })
}

/// A validated, borrowed input byte string.
#[derive(Debug, Clone, Copy)]
pub struct StringIn<'a> {
    name: &'static str,
    bytes: &'a [u8],
    len: c_int,
}

impl<'a> StringIn<'a> {
    /// Validate `bytes` against `shape`.
    pub fn new(name: &'static str, bytes: &'a [u8], shape: Shape) -> Result<Self, ArgumentError> {
        match shape {
            Shape::Exact(expected) if bytes.len() != expected => {
                return Err(ArgumentError::WrongLength { name, expected, actual: bytes.len() });
            },
            Shape::OneOf(lengths) if !lengths.contains(&bytes.len()) => {
                return Err(ArgumentError::InvalidLength { name, actual: bytes.len() });
            },
            Shape::Exact(_) | Shape::OneOf(_) | Shape::Any => {},
        }

        let len = native_len(name, bytes.len())?;
        Ok(Self { name, bytes, len })
    }

    /// 32-byte message hash (`msg32`).
    pub fn message_hash(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("msg32", bytes, Shape::Exact(HASH_LENGTH))
    }

    /// 32-byte secret key (`seckey`).
    pub fn secret_key(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("seckey", bytes, Shape::Exact(SECRET_KEY_LENGTH))
    }

    /// 32-byte tweak scalar (`tweak`).
    pub fn tweak(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("tweak", bytes, Shape::Exact(TWEAK_LENGTH))
    }

    /// DER signature of any length (`sig`).
    pub fn signature(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("sig", bytes, Shape::Any)
    }

    /// 64-byte compact signature (`sig64`).
    pub fn compact_signature(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("sig64", bytes, Shape::Exact(COMPACT_SIGNATURE_LENGTH))
    }

    /// Public key passed by value (`pubkey`). The native library judges the
    /// encoding.
    pub fn public_key(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("pubkey", bytes, Shape::Any)
    }

    /// DER private key (`privkey`).
    pub fn private_key_der(bytes: &'a [u8]) -> Result<Self, ArgumentError> {
        Self::new("privkey", bytes, Shape::Any)
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The validated bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Pointer for the native call.
    pub fn as_ptr(&self) -> *const c_uchar {
        self.bytes.as_ptr()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length input.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length as the native `int`.
    pub fn c_len(&self) -> c_int {
        self.len
    }
}

/// Fixed-size output buffer of exactly `N` bytes. Zeroised on drop.
#[derive(Debug)]
pub struct FixedStringOut<const N: usize> {
    name: &'static str,
    buf: [u8; N],
}

/// Output for `secp256k1_ec_privkey_import`.
pub type SecretKeyOut = FixedStringOut<SECRET_KEY_LENGTH>;

/// Output for `secp256k1_ecdsa_sign_compact`.
pub type SignatureCompactOut = FixedStringOut<COMPACT_SIGNATURE_LENGTH>;

/// Output of a nonce function.
pub type NonceOut = FixedStringOut<NONCE_LENGTH>;

impl<const N: usize> FixedStringOut<N> {
    /// Zero-filled buffer.
    pub fn new(name: &'static str) -> Self {
        Self { name, buf: [0u8; N] }
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Pointer for the native call to write through.
    pub fn as_mut_ptr(&mut self) -> *mut c_uchar {
        self.buf.as_mut_ptr()
    }

    /// The buffer contents.
    pub fn value(&self) -> [u8; N] {
        self.buf
    }
}

impl<const N: usize> Drop for FixedStringOut<N> {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Variable-size output buffer with a native length cell.
///
/// The cell starts at the capacity; the native call narrows it to the number
/// of bytes written. Zeroised on drop.
#[derive(Debug)]
pub struct VarStringOut {
    name: &'static str,
    buf: Vec<u8>,
    len: c_int,
}

impl VarStringOut {
    /// Buffer of `max` bytes.
    pub fn new(name: &'static str, max: usize) -> Result<Self, ArgumentError> {
        let len = native_len(name, max)?;
        Ok(Self { name, buf: vec![0u8; max], len })
    }

    /// Buffer sized by a library constant that always fits an `int`.
    fn sized(name: &'static str, capacity: usize) -> Self {
        debug_assert!(c_int::try_from(capacity).is_ok());
        Self { name, buf: vec![0u8; capacity], len: capacity as c_int }
    }

    /// DER signature output (`sig`, 72 bytes).
    pub fn signature() -> Self {
        Self::sized("sig", MAX_SIGNATURE_LENGTH)
    }

    /// Public key output (`pubkey`, 65 bytes).
    pub fn public_key() -> Self {
        Self::sized("pubkey", MAX_PUBKEY_LENGTH)
    }

    /// DER private key output (`privkey`, 279 bytes).
    pub fn private_key_der() -> Self {
        Self::sized("privkey", MAX_PRIVKEY_DER_LENGTH)
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Pointer for the native call to write through.
    pub fn as_mut_ptr(&mut self) -> *mut c_uchar {
        self.buf.as_mut_ptr()
    }

    /// Pointer to the length cell.
    pub fn len_ptr(&mut self) -> *mut c_int {
        &raw mut self.len
    }

    /// Current value of the length cell.
    pub fn reported_len(&self) -> c_int {
        self.len
    }

    /// The bytes `function` reported writing.
    pub fn value(&self, function: &'static str) -> Result<Vec<u8>, ProtocolViolation> {
        let reported = self.len;
        let Some(written) = usize::try_from(reported).ok().filter(|&len| len <= self.buf.len())
        else {
            tracing::warn!(function, reported, capacity = self.buf.len(), "output length overflow");
            return Err(ProtocolViolation::LengthOverflow {
                function,
                reported,
                capacity: self.buf.len(),
            });
        };
        Ok(self.buf[..written].to_vec())
    }
}

impl Drop for VarStringOut {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Variable-size buffer pre-filled with caller bytes.
///
/// The length cell starts at the input length and may change during the call
/// (`secp256k1_ec_pubkey_decompress` grows 33 bytes to 65).
#[derive(Debug)]
pub struct VarStringInOut {
    inner: VarStringOut,
    input_len: c_int,
}

impl VarStringInOut {
    /// Copy `initial` into a buffer of `max` bytes.
    pub fn new(name: &'static str, initial: &[u8], max: usize) -> Result<Self, ArgumentError> {
        if initial.len() > max {
            return Err(ArgumentError::TooLong { name, max, actual: initial.len() });
        }

        let mut inner = VarStringOut::new(name, max)?;
        inner.buf[..initial.len()].copy_from_slice(initial);
        let input_len = native_len(name, initial.len())?;
        inner.len = input_len;
        Ok(Self { inner, input_len })
    }

    /// In-place public key (`pubkey`): 33 or 65 bytes in a 65-byte buffer.
    pub fn public_key(initial: &[u8]) -> Result<Self, ArgumentError> {
        if !VALID_PUBKEY_LENGTHS.contains(&initial.len()) {
            return Err(ArgumentError::InvalidLength { name: "pubkey", actual: initial.len() });
        }
        Self::new("pubkey", initial, MAX_PUBKEY_LENGTH)
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Length of the caller's bytes, for functions taking the length by value.
    pub fn input_len(&self) -> c_int {
        self.input_len
    }

    /// Pointer for the native call to read and write through.
    pub fn as_mut_ptr(&mut self) -> *mut c_uchar {
        self.inner.as_mut_ptr()
    }

    /// Pointer to the length cell.
    pub fn len_ptr(&mut self) -> *mut c_int {
        self.inner.len_ptr()
    }

    /// The bytes held after the call, up to the reported length.
    pub fn value(&self, function: &'static str) -> Result<Vec<u8>, ProtocolViolation> {
        self.inner.value(function)
    }
}

/// Fixed-size buffer pre-filled with exactly `N` caller bytes.
#[derive(Debug)]
pub struct FixedStringInOut<const N: usize> {
    inner: FixedStringOut<N>,
}

/// In-place secret key for the secret key tweaks.
pub type SecretKeyInOut = FixedStringInOut<SECRET_KEY_LENGTH>;

impl<const N: usize> FixedStringInOut<N> {
    /// Copy `initial`, which must be exactly `N` bytes.
    pub fn new(name: &'static str, initial: &[u8]) -> Result<Self, ArgumentError> {
        if initial.len() != N {
            return Err(ArgumentError::WrongLength { name, expected: N, actual: initial.len() });
        }

        let mut inner = FixedStringOut::new(name);
        inner.buf.copy_from_slice(initial);
        Ok(Self { inner })
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Pointer for the native call to read and write through.
    pub fn as_mut_ptr(&mut self) -> *mut c_uchar {
        self.inner.as_mut_ptr()
    }

    /// The buffer contents.
    pub fn value(&self) -> [u8; N] {
        self.inner.value()
    }
}

impl SecretKeyInOut {
    /// In-place secret key (`seckey`).
    pub fn secret_key(initial: &[u8]) -> Result<Self, ArgumentError> {
        Self::new("seckey", initial)
    }
}

/// Recovery id out parameter.
#[derive(Debug)]
pub struct RecidOut {
    recid: c_int,
}

impl Default for RecidOut {
    fn default() -> Self {
        Self::new()
    }
}

impl RecidOut {
    /// Cell initialised to an invalid id, so an untouched cell is detected.
    pub fn new() -> Self {
        Self { recid: -1 }
    }

    /// Pointer for the native call to write through.
    pub fn as_mut_ptr(&mut self) -> *mut c_int {
        &raw mut self.recid
    }

    /// The recovery id, which must be 0..=3.
    pub fn value(&self, function: &'static str) -> Result<u8, ProtocolViolation> {
        match u8::try_from(self.recid) {
            Ok(recid @ 0..=3) => Ok(recid),
            _ => {
                tracing::warn!(function, recid = self.recid, "recovery id out of range");
                Err(ProtocolViolation::RecoveryId { function, recid: self.recid })
            },
        }
    }
}

/// Boolean passed to the native side as an `int` (`compressed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(c_int);

impl Flag {
    /// `0` or `1`.
    pub fn raw(self) -> c_int {
        self.0
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Self(c_int::from(value))
    }
}

impl From<Option<bool>> for Flag {
    fn from(value: Option<bool>) -> Self {
        Self::from(value.unwrap_or(false))
    }
}
