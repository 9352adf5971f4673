//! Counting semaphore subsystem: a nonnegative count plus a FIFO waiter
//! queue (§4.7).
//!
//! `sem_wait` only decrements when `count > 0`; otherwise it parks the
//! caller without touching `count`, so `count` never goes negative (§3:
//! "count (nonnegative)"). `sem_post` increments `count`, and if a waiter
//! is queued it pops one, decrements `count` back, and wakes it — the
//! resource is handed directly to the wakee, net count unchanged, matching
//! the original `ksem.c`.

use crate::config::{QUEUE_SIZE, SEM_MAX};
use crate::error::{KernelError, KernelResult};
use crate::kernel::context::KernelContext;
use crate::sync::bounded_queue::BoundedQueue;

#[derive(Clone, Copy)]
struct SemaphoreSlot {
    allocated: bool,
    count: i64,
    waiters: BoundedQueue<QUEUE_SIZE>,
}

impl SemaphoreSlot {
    const fn free() -> Self {
        Self {
            allocated: false,
            count: 0,
            waiters: BoundedQueue::new(),
        }
    }
}

pub struct SemaphoreTable {
    slots: [SemaphoreSlot; SEM_MAX],
    free_ids: BoundedQueue<SEM_MAX>,
}

impl SemaphoreTable {
    pub const fn new() -> Self {
        Self {
            slots: [SemaphoreSlot::free(); SEM_MAX],
            free_ids: BoundedQueue::new(),
        }
    }

    pub fn init(&mut self) {
        self.slots = [SemaphoreSlot::free(); SEM_MAX];
        self.free_ids.init();
        for id in 0..SEM_MAX {
            self.free_ids
                .enqueue(id as i64)
                .expect("free-id queue sized to SEM_MAX must accept every id");
        }
    }

    fn slot(&self, id: i64) -> KernelResult<&SemaphoreSlot> {
        let idx = usize::try_from(id).map_err(|_| KernelError::IdOutOfRange)?;
        let slot = self.slots.get(idx).ok_or(KernelError::IdOutOfRange)?;
        if !slot.allocated {
            return Err(KernelError::IdNotAllocated);
        }
        Ok(slot)
    }

    fn slot_mut(&mut self, id: i64) -> KernelResult<&mut SemaphoreSlot> {
        let idx = usize::try_from(id).map_err(|_| KernelError::IdOutOfRange)?;
        let slot = self.slots.get_mut(idx).ok_or(KernelError::IdOutOfRange)?;
        if !slot.allocated {
            return Err(KernelError::IdNotAllocated);
        }
        Ok(slot)
    }
}

impl Default for SemaphoreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelContext {
    /// Allocate a semaphore slot with the given initial count.
    pub fn sem_init_one(&mut self, initial_count: i64) -> KernelResult<i64> {
        let id = self
            .semaphores
            .free_ids
            .dequeue()
            .map_err(|_| KernelError::SemaphoreTableFull)?;
        let slot = &mut self.semaphores.slots[id as usize];
        *slot = SemaphoreSlot::free();
        slot.allocated = true;
        slot.count = initial_count;
        Ok(id)
    }

    /// Return a semaphore slot to the free pool. Fails when the count is
    /// zero, matching the original `ksem.c`'s "semaphore locked" guard — the
    /// spec is silent on destroy restrictions, so the original governs.
    pub fn sem_destroy(&mut self, id: i64) -> KernelResult<()> {
        {
            let slot = self.semaphores.slot(id)?;
            if slot.count == 0 {
                return Err(KernelError::PolicyViolation);
            }
        }
        self.semaphores
            .free_ids
            .enqueue(id)
            .map_err(|_| KernelError::SemaphoreTableFull)?;
        self.semaphores.slots[id as usize] = SemaphoreSlot::free();
        Ok(())
    }

    /// If the count is positive, decrement it and return immediately.
    /// Otherwise park the calling process as a waiter without touching the
    /// count, so the count never goes negative.
    pub fn sem_wait(&mut self, id: i64) -> KernelResult<()> {
        let should_block = {
            let slot = self.semaphores.slot_mut(id)?;
            if slot.count > 0 {
                slot.count -= 1;
                false
            } else {
                true
            }
        };
        if !should_block {
            return Ok(());
        }

        let blocked_pid = self
            .block_active_as_waiting()
            .ok_or(KernelError::NoSuchProcess)?;
        let slot = self.semaphores.slot_mut(id)?;
        slot.waiters
            .enqueue(blocked_pid)
            .map_err(|_| KernelError::QueueFull)
    }

    /// Increment the count. If a waiter is queued, hand the resource
    /// directly to it: pop the front of the FIFO waiter queue, decrement the
    /// count back (net unchanged), and wake it.
    pub fn sem_post(&mut self, id: i64) -> KernelResult<()> {
        let woken = {
            let slot = self.semaphores.slot_mut(id)?;
            slot.count += 1;
            if slot.waiters.is_empty() {
                None
            } else {
                slot.count -= 1;
                Some(slot.waiters.dequeue().map_err(|_| KernelError::QueueEmpty)?)
            }
        };
        if let Some(woken) = woken {
            self.wake_waiter(woken);
        }
        Ok(())
    }
}
