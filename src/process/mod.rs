//! Process control blocks, the fixed process table, and the convenience
//! operations that tie table mutation to scheduler bookkeeping (§4.3).

pub mod pcb;
pub mod table;

use crate::error::{KernelError, KernelResult};
use crate::kernel::context::KernelContext;
use crate::process::pcb::{EntryFn, ProcessType};
use crate::process::table::IDLE_PID;

impl KernelContext {
    /// Create a process and make it runnable: allocates its PCB/trap frame
    /// via the process table, then hands its pid to the scheduler.
    ///
    /// The idle process (the first ever created, pid 0) is the one
    /// exception: `scheduler_add` never enqueues it, since it is the
    /// scheduler's own fallback rather than a run-queue member.
    pub fn create_process(
        &mut self,
        entry: EntryFn,
        name: &str,
        proc_type: ProcessType,
    ) -> KernelResult<i64> {
        let pid = self.table.create(entry, name, proc_type, self.tick)?;
        self.scheduler_add(pid)?;
        Ok(pid)
    }

    /// Tear down a process: remove it from scheduling consideration
    /// (wherever it currently sits: Q_R, Q_S, or active), then free its PCB
    /// slot. Destroying the idle process always fails (§4.3, S6) and does
    /// so before touching any scheduler state, so a rejected destroy of the
    /// active idle process leaves it active and fully scheduled.
    pub fn destroy_process(&mut self, pid: i64) -> KernelResult<()> {
        if pid == IDLE_PID {
            return Err(KernelError::PolicyViolation);
        }
        self.scheduler_remove(pid);
        self.sleep_queue.remove_value(pid);
        self.table.destroy(pid)
    }
}
