//! The kernel context: the single global value bundling every piece of
//! kernel-wide mutable state (§9 "Global mutable state").
//!
//! Process table, scheduler queues, tick counter, mutex table and semaphore
//! table are constructed once at boot, in the fixed order queues → tables →
//! scheduler → IRQ registration (see [`crate::boot::kernel_main`]), and never
//! freed. Every operation in §4 is an `impl KernelContext` method spread
//! across this crate's modules (`process`, `scheduler`, `sync::mutex`,
//! `sync::semaphore`) and is only ever called from inside the implicit
//! "interrupts disabled" critical section.

pub mod context;

pub use context::{with_context, KernelContext, CONTEXT};
