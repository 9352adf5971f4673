//! Definition and storage of [`KernelContext`].

use crate::config::QUEUE_SIZE;
use crate::process::table::ProcessTable;
use crate::sync::bounded_queue::BoundedQueue;
use crate::sync::critical_section::CriticalSection;
use crate::sync::mutex::MutexTable;
use crate::sync::semaphore::SemaphoreTable;

/// Every piece of state shared across the core subsystems, per §9.
pub struct KernelContext {
    pub table: ProcessTable,
    /// Q_R: run queue of pids (§4.4).
    pub run_queue: BoundedQueue<QUEUE_SIZE>,
    /// Q_S: sleep queue of pids (§4.4).
    pub sleep_queue: BoundedQueue<QUEUE_SIZE>,
    /// `active_proc`: pid of the process whose trap frame is currently loaded.
    pub active_proc: Option<i64>,
    /// Global tick counter, advanced once per timer interrupt.
    pub tick: u64,
    pub mutexes: MutexTable,
    pub semaphores: SemaphoreTable,
}

impl KernelContext {
    pub const fn new() -> Self {
        Self {
            table: ProcessTable::new(),
            run_queue: BoundedQueue::new(),
            sleep_queue: BoundedQueue::new(),
            active_proc: None,
            tick: 0,
            mutexes: MutexTable::new(),
            semaphores: SemaphoreTable::new(),
        }
    }

    /// Boot-time initialization in the fixed order the design notes require:
    /// queues before tables before scheduler before IRQ registration. Queues
    /// and tables are reset here; scheduler/IRQ registration happen in
    /// [`crate::boot::kernel_main`] once this returns.
    pub fn init(&mut self) {
        self.run_queue.init();
        self.sleep_queue.init();
        self.table.init();
        self.mutexes.init();
        self.semaphores.init();
        self.active_proc = None;
        self.tick = 0;
    }
}

impl Default for KernelContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The single kernel context instance, guarded by the global critical
/// section (§5).
pub static CONTEXT: CriticalSection<KernelContext> = CriticalSection::new(KernelContext::new());

/// Run `f` with exclusive, interrupts-disabled access to the kernel context.
///
/// Every syscall handler, IRQ handler, and boot-time setup routine goes
/// through this function rather than touching `CONTEXT` directly.
pub fn with_context<R>(f: impl FnOnce(&mut KernelContext) -> R) -> R {
    let mut guard = CONTEXT.enter();
    f(&mut guard)
}
