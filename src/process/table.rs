//! Fixed process table with a free-slot allocator (§4.3).

use crate::arch::interrupts::{InterruptStackFrame, SavedRegisters};
use crate::config::PROC_MAX;
use crate::error::{KernelError, KernelResult};
use crate::process::pcb::{EntryFn, Pcb, ProcessState, ProcessType};
use crate::sync::bounded_queue::BoundedQueue;

/// `rflags` value written into a synthesized trap frame: interrupts enabled
/// (IF, bit 9) plus the reserved bit 1 that is always set on real hardware.
const INITIAL_RFLAGS: u64 = 0x202;

/// pid reserved for the idle process; its slot is index 0 and is never
/// returned to the free pool.
pub const IDLE_PID: i64 = 0;

pub struct ProcessTable {
    slots: [Pcb; PROC_MAX],
    free_slots: BoundedQueue<PROC_MAX>,
    next_pid: i64,
    /// Tick counter snapshot used as `start_time` for new processes; advanced
    /// by the scheduler, read here at creation time.
    pub boot_tick: u64,
}

impl ProcessTable {
    pub const fn new() -> Self {
        Self {
            slots: [Pcb::free(); PROC_MAX],
            free_slots: BoundedQueue::new(),
            next_pid: 0,
            boot_tick: 0,
        }
    }

    /// Prime the free-slot queue with every index in order and reset
    /// `next_pid`. Slot 0 is reserved for the idle process and is therefore
    /// *not* placed on the free queue.
    pub fn init(&mut self) {
        self.slots = [Pcb::free(); PROC_MAX];
        self.free_slots.init();
        for idx in 1..PROC_MAX {
            self.free_slots
                .enqueue(idx as i64)
                .expect("free-slot queue sized to PROC_MAX must accept every index");
        }
        self.next_pid = 0;
    }

    /// Allocate a slot, assign the next pid, synthesize its initial trap
    /// frame at the top of its stack, and return the new pid. Does not touch
    /// the scheduler; callers (`process::create`) enqueue it afterward.
    pub fn create(
        &mut self,
        entry: EntryFn,
        name: &str,
        proc_type: ProcessType,
        current_tick: u64,
    ) -> KernelResult<i64> {
        let slot_idx = if self.next_pid == IDLE_PID {
            // The very first process created is always the idle process,
            // which owns the reserved slot 0 rather than coming from the
            // free pool.
            0usize
        } else {
            self.free_slots
                .dequeue()
                .map_err(|_| KernelError::ProcessTableFull)? as usize
        };

        let pid = self.next_pid;
        self.next_pid += 1;

        let pcb = &mut self.slots[slot_idx];
        *pcb = Pcb::free();
        pcb.pid = pid;
        pcb.state = ProcessState::Idle;
        pcb.proc_type = proc_type;
        pcb.set_name(name);
        pcb.start_time = current_tick;
        pcb.run_time = 0;
        pcb.cpu_time = 0;
        pcb.sleep_time = 0;
        pcb.trap_frame = Some(synthesize_trap_frame(&mut pcb.stack, entry));

        Ok(pid)
    }

    /// Reset a slot to sentinel values and return it to the free pool.
    /// Destroying pid 0 (the idle process) always fails (§4.3, S6).
    pub fn destroy(&mut self, pid: i64) -> KernelResult<()> {
        if pid == IDLE_PID {
            return Err(KernelError::PolicyViolation);
        }
        let slot_idx = self.index_of_pid(pid).ok_or(KernelError::NoSuchProcess)?;
        self.slots[slot_idx] = Pcb::free();
        self.free_slots
            .enqueue(slot_idx as i64)
            .map_err(|_| KernelError::ProcessTableFull)?;
        Ok(())
    }

    pub fn lookup_by_pid(&self, pid: i64) -> Option<&Pcb> {
        self.index_of_pid(pid).map(|idx| &self.slots[idx])
    }

    pub fn lookup_by_pid_mut(&mut self, pid: i64) -> Option<&mut Pcb> {
        match self.index_of_pid(pid) {
            Some(idx) => Some(&mut self.slots[idx]),
            None => None,
        }
    }

    pub fn lookup_by_index(&self, idx: usize) -> Option<&Pcb> {
        self.slots.get(idx).filter(|pcb| pcb.in_use())
    }

    pub fn lookup_by_index_mut(&mut self, idx: usize) -> Option<&mut Pcb> {
        if idx < PROC_MAX && self.slots[idx].in_use() {
            Some(&mut self.slots[idx])
        } else {
            None
        }
    }

    fn index_of_pid(&self, pid: i64) -> Option<usize> {
        self.slots.iter().position(|pcb| pcb.in_use() && pcb.pid == pid)
    }

    /// Number of slots currently in the free pool, for the slot-conservation
    /// property test (§8 property 3).
    pub fn free_count(&self) -> usize {
        self.free_slots.len()
    }

    /// Number of slots currently occupied by a live pid.
    pub fn used_count(&self) -> usize {
        self.slots.iter().filter(|pcb| pcb.in_use()).count()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Carve the top of `stack` and write a plausible initial trap frame: flags
/// with interrupts enabled, instruction pointer at `entry`, kernel code/data
/// segment selectors (§9 "Stack-resident trap frame"). Returns a pointer to
/// the `SavedRegisters` portion, which is what the PCB's `trap_frame` field
/// stores and what the scheduler hands to `iretq` on first dispatch.
fn synthesize_trap_frame(stack: &mut [u8], entry: EntryFn) -> *mut SavedRegisters {
    use core::mem::size_of;

    let stack_base = stack.as_mut_ptr() as usize;
    let stack_top = stack_base + stack.len();

    let entry_rsp = (stack_top & !0xF) - 8;
    let iret_addr = entry_rsp - size_of::<InterruptStackFrame>();
    let frame_addr = iret_addr - size_of::<SavedRegisters>();

    let frame_ptr = frame_addr as *mut SavedRegisters;
    let iret_ptr = iret_addr as *mut InterruptStackFrame;

    // SAFETY: `frame_addr` and `iret_addr` both lie within `stack` by
    // construction (stack_top minus two struct sizes, stack is at least a
    // few hundred bytes per `PROC_STACK_SIZE`), satisfying invariant I5.
    unsafe {
        core::ptr::write(frame_ptr, SavedRegisters::default());
        core::ptr::write(
            iret_ptr,
            InterruptStackFrame {
                rip: entry as usize as u64,
                cs: crate::arch::gdt::KERNEL_CODE_SELECTOR as u64,
                rflags: INITIAL_RFLAGS,
                rsp: entry_rsp as u64,
                ss: crate::arch::gdt::KERNEL_DATA_SELECTOR as u64,
            },
        );
    }

    frame_ptr
}
