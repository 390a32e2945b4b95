//! Callback fence for `ChainedTable`.
//!
//! The fence goes up around every call into user code (hash, compare,
//! `on_delete`) and comes down when that call returns or unwinds. Reaching
//! the same table from inside the callback finds it up and panics. Only debug
//! builds carry the flag.

use core::marker::PhantomData;

#[cfg(debug_assertions)]
type Flag = core::cell::Cell<bool>;
#[cfg(not(debug_assertions))]
type Flag = ();

#[derive(Debug, Default)]
#[cfg_attr(not(debug_assertions), allow(dead_code))]
pub(crate) struct CallbackGuard {
    up: Flag,
    // Tables are single-owner; keep them !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl CallbackGuard {
    #[inline]
    pub(crate) fn enter(&self) -> Fence<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.up.replace(true),
                "table re-entered from a hash, compare or delete callback"
            );
        }
        Fence(self)
    }
}

/// Lowers the fence on drop.
#[cfg_attr(not(debug_assertions), allow(dead_code))]
pub(crate) struct Fence<'a>(&'a CallbackGuard);

impl Drop for Fence<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.0.up.set(false);
    }
}
