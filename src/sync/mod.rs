//! Synchronization primitives.

pub mod bounded_queue;
pub mod critical_section;
pub mod mutex;
pub mod ringbuffer;
pub mod semaphore;
pub mod spinlock;
