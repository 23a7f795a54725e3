//! Context objects handed out by `secp256k1_context_create`.

use ecbind_sys::{SECP256K1_START_SIGN, SECP256K1_START_VERIFY, c_int, secp256k1_context_t};

/// Native-side context state. Only the capability flags are tracked; the
/// arithmetic backend needs no precomputed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SoftContext {
    flags: c_int,
}

impl SoftContext {
    pub(crate) fn new(flags: c_int) -> Self {
        Self { flags: flags & (SECP256K1_START_SIGN | SECP256K1_START_VERIFY) }
    }

    pub(crate) fn flags(&self) -> c_int {
        self.flags
    }

    /// Check a capability, logging misuse the way libsecp256k1's illegal
    /// argument callback would report it.
    pub(crate) fn require(&self, flag: c_int, function: &'static str) -> bool {
        let present = self.flags & flag == flag;
        if !present {
            tracing::error!(
                function,
                flags = self.flags,
                required = flag,
                "context lacks capability"
            );
        }
        present
    }

    /// Move onto the heap and return the opaque handle.
    pub(crate) fn into_raw(self) -> *mut secp256k1_context_t {
        Box::into_raw(Box::new(self)).cast()
    }

    /// Borrow the context behind a handle.
    ///
    /// # Safety
    ///
    /// `ctx` must be null or a live handle returned by [`Self::into_raw`].
    pub(crate) unsafe fn from_handle<'a>(ctx: *const secp256k1_context_t) -> Option<&'a Self> {
        // SAFETY: guaranteed by the caller.
        unsafe { ctx.cast::<Self>().as_ref() }
    }

    /// Release a handle.
    ///
    /// # Safety
    ///
    /// `ctx` must be null or a live handle returned by [`Self::into_raw`] that
    /// is not used afterwards.
    pub(crate) unsafe fn destroy(ctx: *mut secp256k1_context_t) {
        if ctx.is_null() {
            return;
        }
        // SAFETY: guaranteed by the caller; ownership returns to the Box.
        drop(unsafe { Box::from_raw(ctx.cast::<Self>()) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flag_bits_are_dropped() {
        assert_eq!(SoftContext::new(0xFF).flags(), SECP256K1_START_SIGN | SECP256K1_START_VERIFY);
    }

    #[test]
    fn require_checks_each_bit() {
        let ctx = SoftContext::new(SECP256K1_START_VERIFY);
        assert!(ctx.require(SECP256K1_START_VERIFY, "verify"));
        assert!(!ctx.require(SECP256K1_START_SIGN, "sign"));
    }

    #[test]
    fn handle_round_trip() {
        let raw = SoftContext::new(SECP256K1_START_SIGN).into_raw();
        // SAFETY: raw was just created and is destroyed below.
        let ctx = unsafe { SoftContext::from_handle(raw) }.copied();
        assert_eq!(ctx, Some(SoftContext::new(SECP256K1_START_SIGN)));
        // SAFETY: raw is live and not used afterwards.
        unsafe { SoftContext::destroy(raw) };
    }
}
