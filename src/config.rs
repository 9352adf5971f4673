//! Compile-time configuration constants shared across every core subsystem.
//!
//! Mirrors the C kernel's `#define`-based configuration: every tunable named
//! here is a named constant, never a magic number scattered at call sites.

/// Maximum number of process table slots. Slot 0 is reserved for the idle process.
pub const PROC_MAX: usize = 16;

/// Size in bytes of each process's kernel stack.
pub const PROC_STACK_SIZE: usize = 16 * 1024;

/// Maximum length of a process name, excluding the NUL terminator.
pub const PROC_NAME_LEN: usize = 32;

/// Fallback name substituted when a requested name exceeds `PROC_NAME_LEN`.
///
/// Open question resolution (see DESIGN.md): oversized names are *substituted*,
/// not truncated, matching the source this was distilled from.
pub const DEFAULT_PROC_NAME: &str = "DefaultUserName";

/// Capacity of every bounded integer queue (run queue, sleep queue, waiter queues).
pub const QUEUE_SIZE: usize = PROC_MAX;

/// Capacity in bytes of every byte ring buffer (TTY and per-process I/O channels).
pub const RINGBUF_SIZE: usize = 1024;

/// Maximum number of live mutexes.
pub const MUTEX_MAX: usize = 16;

/// Maximum number of live semaphores.
pub const SEM_MAX: usize = 16;

/// Number of ticks a process may run before forced preemption.
pub const SCHEDULER_TIMESLICE: u64 = 3;

/// Timer interrupt rate in Hz. Open question resolution (see DESIGN.md):
/// declared explicitly rather than left implicit in a `* 100` / `/ 100` pair.
pub const TIMER_RATE_HZ: u64 = 100;

/// Name reported by `SYS_GET_NAME`.
pub const OS_NAME: &str = "wuros";

/// Number of shell-class processes seeded at boot (see §6 Boot Seed).
pub const BOOT_SHELL_COUNT: usize = 4;

/// Number of "ping" test processes seeded at boot.
pub const BOOT_PING_COUNT: usize = 3;

/// Number of "pong" test processes seeded at boot.
pub const BOOT_PONG_COUNT: usize = 3;

/// Number of independent TTYs the boot seed can bind processes to.
pub const TTY_COUNT: usize = 4;
