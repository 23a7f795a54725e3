//! Context configuration.

use std::fmt;

use ecbind_sys::{SECP256K1_START_SIGN, SECP256K1_START_VERIFY, c_int};

/// A context capability, backed by one native flag bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Verification tables (`SECP256K1_START_VERIFY`)
    Verify,
    /// Signing tables (`SECP256K1_START_SIGN`)
    Sign,
}

impl Capability {
    /// The native flag bit.
    pub fn flag(self) -> c_int {
        match self {
            Self::Verify => SECP256K1_START_VERIFY,
            Self::Sign => SECP256K1_START_SIGN,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify => f.write_str("verify"),
            Self::Sign => f.write_str("sign"),
        }
    }
}

/// Capabilities requested at context creation.
///
/// The default enables nothing: such a context can still validate keys,
/// decompress public keys and tweak secret keys, but cannot sign or verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Enable verification, public key recovery and public key tweaks
    pub verify: bool,
    /// Enable signing, public key derivation and private key export
    pub sign: bool,
}

impl ContextOptions {
    /// Both capabilities.
    pub fn all() -> Self {
        Self { verify: true, sign: true }
    }

    /// Native flag word passed to `secp256k1_context_create`.
    pub fn flags(&self) -> c_int {
        let mut flags = 0;
        if self.verify {
            flags |= SECP256K1_START_VERIFY;
        }
        if self.sign {
            flags |= SECP256K1_START_SIGN;
        }
        flags
    }

    /// Whether `capability` was requested.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Verify => self.verify,
            Capability::Sign => self.sign,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_the_native_bits() {
        assert_eq!(ContextOptions::default().flags(), 0);
        assert_eq!(ContextOptions { verify: true, sign: false }.flags(), 1);
        assert_eq!(ContextOptions { verify: false, sign: true }.flags(), 2);
        assert_eq!(ContextOptions::all().flags(), 3);
    }

    #[test]
    fn has_matches_flags() {
        let options = ContextOptions { verify: true, sign: false };
        assert!(options.has(Capability::Verify));
        assert!(!options.has(Capability::Sign));
        assert_eq!(options.flags() & Capability::Verify.flag(), Capability::Verify.flag());
    }
}
