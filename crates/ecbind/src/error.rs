//! Error types for the marshalling layer.
//!
//! Three layers fail differently: argument validation happens before the
//! native boundary ([`ArgumentError`]), native results that break the C ABI
//! contract are protocol violations ([`ProtocolViolation`]), and a caller's
//! nonce callback can fail on its own terms (kept unchanged inside
//! [`Error::NonceCallback`]).
//!
//! Domain-negative outcomes (a signature that does not verify, a tweak that
//! overflows) are not errors; operations report them as `Ok(None)`,
//! `Ok(false)` or a [`crate::Verification`] variant.

use thiserror::Error;

use crate::options::Capability;

/// Boxed error produced by a caller's nonce callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`crate::Context`] operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller value did not have the shape the native function requires
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    /// The context was created without the capability the operation needs
    #[error("{operation} requires a context created with the {capability} capability")]
    MissingCapability {
        /// Native function that was about to be called
        operation: &'static str,
        /// Capability flag the context lacks
        capability: Capability,
    },

    /// The native library broke its calling contract
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// A custom nonce callback failed; the source is the caller's own error
    #[error("nonce callback failed: {0}")]
    NonceCallback(#[source] BoxError),
}

impl Error {
    /// Returns true if the native side misbehaved.
    ///
    /// Protocol violations point at a broken or mismatched library build (or
    /// a nonce callback that produced the wrong number of bytes). Retrying
    /// the same call will fail the same way.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// The caller's callback error, if this is one.
    pub fn into_callback_error(self) -> Option<BoxError> {
        match self {
            Self::NonceCallback(err) => Some(err),
            _ => None,
        }
    }
}

/// Validation failures, raised before any native call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// Input or in-out buffer with an exact size got a different size
    #[error("{name} must be {expected} bytes long")]
    WrongLength {
        /// Parameter name as the native function spells it
        name: &'static str,
        /// Required length
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Length is not one of the accepted set (public keys: 33 or 65)
    #[error("{name} has invalid length")]
    InvalidLength {
        /// Parameter name
        name: &'static str,
        /// Length supplied
        actual: usize,
    },

    /// Initial contents do not fit the output capacity
    #[error("{name} is too long")]
    TooLong {
        /// Parameter name
        name: &'static str,
        /// Buffer capacity
        max: usize,
        /// Length supplied
        actual: usize,
    },

    /// Length cannot be expressed as a native `int`
    #[error("{name} length {actual} does not fit a native int")]
    LengthOverflow {
        /// Parameter name
        name: &'static str,
        /// Length supplied
        actual: usize,
    },

    /// Unknown named nonce function
    #[error("invalid noncefp")]
    InvalidNonceFunction {
        /// The rejected name
        value: String,
    },

    /// Recovery id outside 0..=3
    #[error("recid must be between 0 and 3, got {recid}")]
    InvalidRecoveryId {
        /// The rejected id
        recid: u8,
    },
}

/// The native library returned something its contract rules out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Result code outside the documented set
    #[error("{function} returned unexpected result {code}")]
    UnexpectedResult {
        /// Native function name
        function: &'static str,
        /// Code returned
        code: i32,
    },

    /// Reported output length is negative or larger than the buffer
    #[error("{function} reported length {reported} for a {capacity}-byte buffer")]
    LengthOverflow {
        /// Native function name
        function: &'static str,
        /// Length written to the length cell
        reported: i32,
        /// Buffer capacity
        capacity: usize,
    },

    /// Recovery id written by a successful compact signature is not 0..=3
    #[error("{function} returned recovery id {recid}")]
    RecoveryId {
        /// Native function name
        function: &'static str,
        /// Id written to the out parameter
        recid: i32,
    },

    /// Context creation or cloning returned null
    #[error("{function} returned a null context")]
    NullContext {
        /// Native function name
        function: &'static str,
    },

    /// A custom nonce callback produced the wrong number of bytes
    #[error("nonce must be 32 bytes long, got {actual}")]
    NonceLength {
        /// Length produced
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_messages_name_the_field() {
        let err = ArgumentError::WrongLength { name: "msg32", expected: 32, actual: 31 };
        assert_eq!(err.to_string(), "msg32 must be 32 bytes long");

        let err = ArgumentError::InvalidLength { name: "pubkey", actual: 40 };
        assert_eq!(err.to_string(), "pubkey has invalid length");

        let err = ArgumentError::TooLong { name: "pubkey", max: 65, actual: 66 };
        assert_eq!(err.to_string(), "pubkey is too long");

        let err = ArgumentError::InvalidNonceFunction { value: "fancy".into() };
        assert_eq!(err.to_string(), "invalid noncefp");
    }

    #[test]
    fn only_protocol_errors_are_protocol_violations() {
        assert!(Error::from(ProtocolViolation::NonceLength { actual: 31 }).is_protocol_violation());
        assert!(
            !Error::from(ArgumentError::InvalidLength { name: "pubkey", actual: 1 })
                .is_protocol_violation()
        );
        assert!(
            !Error::MissingCapability {
                operation: "secp256k1_ecdsa_sign",
                capability: Capability::Sign,
            }
            .is_protocol_violation()
        );
    }

    #[test]
    fn callback_error_is_returned_unchanged() {
        let err = Error::NonceCallback(Box::new(std::fmt::Error));
        assert!(err.to_string().starts_with("nonce callback failed"));

        let inner = err.into_callback_error();
        assert!(inner.is_some_and(|inner| inner.is::<std::fmt::Error>()));
    }
}
