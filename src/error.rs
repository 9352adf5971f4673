//! Kernel-wide error type for the `Result`-returning half of the core API.
//!
//! The syscall/ABI boundary (`syscall::dispatch`) and the bounded-container
//! primitives (`sync::bounded_queue`, `sync::ringbuffer`) keep the spec's
//! literal signed-integer `-1`-on-failure convention, since that convention
//! is part of the wire contract crossing the trap frame. Everything above
//! that boundary returns `Result<T, KernelError>` and propagates with `?`.

use core::fmt;

/// Error conditions raised by the process table, scheduler, mutex and
/// semaphore subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The process table has no free slot left.
    ProcessTableFull,
    /// No PCB with the requested pid exists.
    NoSuchProcess,
    /// The requested mutex/semaphore id is outside the configured table size.
    IdOutOfRange,
    /// The requested mutex/semaphore id is within range but not allocated.
    IdNotAllocated,
    /// Mutex table has no free slot left.
    MutexTableFull,
    /// Semaphore table has no free slot left.
    SemaphoreTableFull,
    /// Attempted to destroy a mutex that is currently held.
    MutexHeld,
    /// A bounded queue operation was attempted on a full queue.
    QueueFull,
    /// A bounded queue operation was attempted on an empty queue.
    QueueEmpty,
    /// A destination buffer was too small for the requested copy.
    BufferTooSmall,
    /// An operation targeted pid 0, which is forbidden (the idle process).
    PolicyViolation,
}

impl KernelError {
    /// The stable `-1`-style code callers at the syscall boundary observe.
    ///
    /// All `KernelError` variants collapse to `-1` at the ABI boundary; the
    /// variant itself is preserved internally (and logged) for diagnosis.
    pub const fn as_syscall_code(self) -> i64 {
        -1
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            KernelError::ProcessTableFull => "process table full",
            KernelError::NoSuchProcess => "no such process",
            KernelError::IdOutOfRange => "id out of range",
            KernelError::IdNotAllocated => "id not allocated",
            KernelError::MutexTableFull => "mutex table full",
            KernelError::SemaphoreTableFull => "semaphore table full",
            KernelError::MutexHeld => "mutex is held",
            KernelError::QueueFull => "queue full",
            KernelError::QueueEmpty => "queue empty",
            KernelError::BufferTooSmall => "buffer too small",
            KernelError::PolicyViolation => "policy violation",
        };
        f.write_str(msg)
    }
}

/// Convenience alias used throughout the core crate.
pub type KernelResult<T> = Result<T, KernelError>;
