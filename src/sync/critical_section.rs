//! The single global critical section guarding the kernel context.
//!
//! §5 states the concurrency model plainly: this is a uniprocessor kernel,
//! so "no further locking is required because the architecture is
//! uniprocessor" — the only thing that must be simulated is the hardware's
//! own behavior of masking further interrupts for the duration of trap
//! handling. `CriticalSection<T>` does exactly that and nothing more: unlike
//! [`crate::sync::spinlock::SpinLock`] it never spins, because on a single
//! core there is never a second holder to wait for — disabling interrupts
//! *is* the mutual exclusion.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::arch::interrupts;

/// Wraps kernel-wide mutable state (the kernel context) so every access to
/// it happens with interrupts disabled.
pub struct CriticalSection<T> {
    data: UnsafeCell<T>,
}

impl<T> CriticalSection<T> {
    pub const fn new(value: T) -> Self {
        Self {
            data: UnsafeCell::new(value),
        }
    }

    /// Enter the critical section: disable interrupts, hand out exclusive
    /// access, and restore the prior interrupt-enabled state when the guard
    /// is dropped.
    pub fn enter(&self) -> CriticalSectionGuard<'_, T> {
        let were_enabled = interrupts::are_enabled();
        interrupts::disable();
        CriticalSectionGuard {
            section: self,
            were_enabled,
        }
    }
}

pub struct CriticalSectionGuard<'a, T> {
    section: &'a CriticalSection<T>,
    were_enabled: bool,
}

impl<T> Deref for CriticalSectionGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: interrupts are disabled for the guard's lifetime, and this
        // is the only code path that ever dereferences `data`.
        unsafe { &*self.section.data.get() }
    }
}

impl<T> DerefMut for CriticalSectionGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: see `Deref` above.
        unsafe { &mut *self.section.data.get() }
    }
}

impl<T> Drop for CriticalSectionGuard<'_, T> {
    fn drop(&mut self) {
        if self.were_enabled {
            interrupts::enable();
        }
    }
}

// SAFETY: all access to `data` is serialized by disabling interrupts on a
// single core, which is the only core this kernel ever runs on (§5).
unsafe impl<T: Send> Sync for CriticalSection<T> {}
unsafe impl<T: Send> Send for CriticalSection<T> {}
