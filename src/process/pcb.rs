//! Process control block: the per-process bookkeeping record (§3).

use crate::arch::interrupts::SavedRegisters;
use crate::config::{PROC_NAME_LEN, PROC_STACK_SIZE};

/// Lifecycle state of a PCB (§4.4 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Slot is free; no process occupies it.
    None,
    /// Created or just woken, not currently enqueued for execution but
    /// eligible — sits on the run queue.
    Idle,
    /// Currently loaded; this is `active_proc`.
    Active,
    /// Parked on the sleep queue for a bounded number of ticks.
    Sleeping,
    /// Parked on a mutex or semaphore waiter queue.
    Waiting,
}

/// Process classification (§3). In this kernel both classes run in ring 0 —
/// there is no virtual memory or ring-3 transition (see §1 Non-goals) — so
/// `Kernel` vs. `User` is purely a bookkeeping distinction, exactly as in the
/// system this was distilled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    None,
    Kernel,
    User,
}

/// Selects which ring buffer a PCB's I/O binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Input = 0,
    Output = 1,
}

/// An I/O binding is a weak reference to a byte ring buffer owned by an
/// external TTY (§3), expressed as an index rather than a pointer per the
/// index-based design note in §9: `(tty index, direction)` is resolved
/// through the TTY table at access time, and the PCB never frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoBinding {
    pub tty_index: usize,
}

pub type EntryFn = extern "C" fn() -> !;

/// Entry function signature for a process. Stored so the process table can
/// rebuild a trap frame if ever needed; the live trap frame address itself
/// is what `trap_frame` points at.
#[derive(Clone, Copy)]
pub struct Pcb {
    pub pid: i64,
    pub state: ProcessState,
    pub proc_type: ProcessType,
    name: [u8; PROC_NAME_LEN],
    name_len: usize,
    pub start_time: u64,
    pub run_time: u64,
    pub cpu_time: u64,
    pub sleep_time: u64,
    pub stack: [u8; PROC_STACK_SIZE],
    /// Borrow into `stack`; see §9 "Stack-resident trap frame". `None` only
    /// while the slot is free.
    pub trap_frame: Option<*mut SavedRegisters>,
    pub io: [Option<IoBinding>; 2],
}

// SAFETY: a `Pcb`'s `trap_frame` pointer always refers into that same `Pcb`'s
// own `stack` array (invariant I5); moving/sending a whole `Pcb` carries the
// pointee with it because `stack` is an inline array, not a heap allocation.
unsafe impl Send for Pcb {}

impl Pcb {
    /// A fully sentineled, free slot (pid = -1, state = None).
    pub const fn free() -> Self {
        Self {
            pid: -1,
            state: ProcessState::None,
            proc_type: ProcessType::None,
            name: [0; PROC_NAME_LEN],
            name_len: 0,
            start_time: 0,
            run_time: 0,
            cpu_time: 0,
            sleep_time: 0,
            stack: [0; PROC_STACK_SIZE],
            trap_frame: None,
            io: [None, None],
        }
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("")
    }

    /// Set the process name, substituting [`crate::config::DEFAULT_PROC_NAME`]
    /// when `requested` does not fit — open question resolution, see §9.
    pub fn set_name(&mut self, requested: &str) {
        let bytes = if requested.len() > PROC_NAME_LEN {
            crate::config::DEFAULT_PROC_NAME.as_bytes()
        } else {
            requested.as_bytes()
        };
        let len = bytes.len().min(PROC_NAME_LEN);
        self.name[..len].copy_from_slice(&bytes[..len]);
        self.name_len = len;
    }

    pub const fn in_use(&self) -> bool {
        self.pid >= 0
    }

    pub fn io_binding(&self, dir: IoDirection) -> Option<IoBinding> {
        self.io[dir as usize]
    }

    pub fn bind_io(&mut self, dir: IoDirection, binding: IoBinding) {
        self.io[dir as usize] = Some(binding);
    }
}
