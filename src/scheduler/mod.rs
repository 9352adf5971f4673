//! Round-robin run queue, sleep queue, and timer-tick bookkeeping (§4.4).
//!
//! All operations are methods on [`KernelContext`] — there is no separate
//! scheduler-owned global; the queues and `active_proc` pointer it mutates
//! already live there (§9 "Global mutable state").
//!
//! ```text
//!          create              add
//! NONE  ─────────▶  IDLE  ─────────▶ (in Q_R)
//!                     ▲                    │ pick
//!                     │ timeslice          ▼
//!                     └────────────────── ACTIVE
//!                                          │ sleep(n)             wait on primitive
//!                                          ├──────▶ SLEEPING  ├──────▶ WAITING
//!                                          │         │ tick==1          │ post/unlock
//!                                          │         ▼                  ▼
//!                                          │        IDLE ◀──────────────┘
//!                                          │ destroy
//!                                          ▼
//!                                         NONE
//! ```

use crate::config::SCHEDULER_TIMESLICE;
use crate::error::{KernelError, KernelResult};
use crate::kernel::context::KernelContext;
use crate::process::pcb::ProcessState;
use crate::process::table::IDLE_PID;

impl KernelContext {
    /// Add a just-created (or just-woken) process to the run queue. The idle
    /// process (pid 0) is never enqueued — it is the scheduler's fallback
    /// when Q_R is empty — matching the source's `scheduler_add` early return.
    pub fn scheduler_add(&mut self, pid: i64) -> KernelResult<()> {
        if pid == IDLE_PID {
            return Ok(());
        }
        let pcb = self
            .table
            .lookup_by_pid_mut(pid)
            .ok_or(KernelError::NoSuchProcess)?;
        pcb.state = ProcessState::Idle;
        pcb.cpu_time = 0;
        self.run_queue.enqueue(pid).map_err(|_| KernelError::QueueFull)
    }

    /// Per-tick bookkeeping and selection, called from the timer IRQ handler.
    /// Order matches §4.5 step 3 ("run the scheduler") being invoked once the
    /// trap frame of the interrupted process has already been saved.
    pub fn scheduler_tick(&mut self) {
        self.tick += 1;
        self.apply_timeslice();
        self.wake_sleepers();
        self.select();
    }

    fn apply_timeslice(&mut self) {
        let Some(pid) = self.active_proc else {
            return;
        };
        let Some(pcb) = self.table.lookup_by_pid_mut(pid) else {
            // Defensive: active_proc referring to a destroyed pid would be a
            // bug elsewhere, but we must not panic on a timer tick for it.
            self.active_proc = None;
            return;
        };
        pcb.run_time += 1;
        pcb.cpu_time += 1;

        if pcb.cpu_time >= SCHEDULER_TIMESLICE {
            pcb.cpu_time = 0;
            if pid == IDLE_PID {
                pcb.state = ProcessState::Idle;
            } else {
                pcb.state = ProcessState::Idle;
                let _ = self.run_queue.enqueue(pid);
            }
            self.active_proc = None;
        }
    }

    /// Walk Q_S exactly once per tick: each entry's `sleep_time` is
    /// decremented, and an entry reaching 1 is woken this tick rather than
    /// next. The walk captures Q_S's size up front so a process re-enqueued
    /// onto Q_S during this same walk (which cannot currently happen, since
    /// no woken process re-sleeps inline) is never visited twice.
    fn wake_sleepers(&mut self) {
        let count = self.sleep_queue.len();
        for _ in 0..count {
            let pid = match self.sleep_queue.dequeue() {
                Ok(pid) => pid,
                Err(_) => break,
            };
            let Some(pcb) = self.table.lookup_by_pid_mut(pid) else {
                continue;
            };
            if pcb.sleep_time <= 1 {
                pcb.sleep_time = 0;
                let _ = self.scheduler_add(pid);
            } else {
                pcb.sleep_time -= 1;
                let _ = self.sleep_queue.enqueue(pid);
            }
        }
    }

    /// If no process is currently active, dequeue the next runnable pid from
    /// Q_R, falling back to the idle process if Q_R is empty.
    pub fn select(&mut self) {
        if self.active_proc.is_some() {
            return;
        }

        let pid = match self.run_queue.dequeue() {
            Ok(pid) => pid,
            Err(_) => IDLE_PID,
        };

        if let Some(pcb) = self.table.lookup_by_pid_mut(pid) {
            pcb.state = ProcessState::Active;
        }
        self.active_proc = Some(pid);
    }

    /// Park `pid` on the sleep queue for `n_ticks`. Re-sleeping an
    /// already-sleeping process overwrites its remaining time in place
    /// without re-enqueueing (it is already on Q_S).
    pub fn scheduler_sleep(&mut self, pid: i64, n_ticks: u64) -> KernelResult<()> {
        let already_sleeping = matches!(
            self.table.lookup_by_pid(pid).map(|p| p.state),
            Some(ProcessState::Sleeping)
        );

        let pcb = self
            .table
            .lookup_by_pid_mut(pid)
            .ok_or(KernelError::NoSuchProcess)?;
        pcb.sleep_time = n_ticks;

        if already_sleeping {
            return Ok(());
        }

        pcb.state = ProcessState::Sleeping;
        self.scheduler_remove(pid);
        self.sleep_queue
            .enqueue(pid)
            .map_err(|_| KernelError::QueueFull)
    }

    /// Remove `pid` from the run queue wherever it sits. If it was the
    /// active process, clear `active_proc` so the next `select` re-picks.
    pub fn scheduler_remove(&mut self, pid: i64) {
        self.run_queue.remove_value(pid);
        if self.active_proc == Some(pid) {
            self.active_proc = None;
        }
    }

    /// Suspend the currently active process into [`ProcessState::Waiting`]
    /// and remove it from scheduling consideration, returning its pid so the
    /// caller (a mutex/semaphore wait path) can push it onto a waiter queue.
    /// Returns `None` if there is no active process (a fatal condition at
    /// the syscall boundary; see §7).
    pub fn block_active_as_waiting(&mut self) -> Option<i64> {
        let pid = self.active_proc?;
        if let Some(pcb) = self.table.lookup_by_pid_mut(pid) {
            pcb.state = ProcessState::Waiting;
        }
        self.active_proc = None;
        Some(pid)
    }

    /// Reschedule a waiter popped from a mutex/semaphore waiter queue:
    /// transitions it back to `Idle` and enqueues it on Q_R.
    pub fn wake_waiter(&mut self, pid: i64) {
        let _ = self.scheduler_add(pid);
    }
}
