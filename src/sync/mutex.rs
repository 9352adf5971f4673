//! Binary mutex subsystem: owner tracking plus a FIFO waiter queue (§4.6).

use crate::config::{MUTEX_MAX, QUEUE_SIZE};
use crate::error::{KernelError, KernelResult};
use crate::kernel::context::KernelContext;
use crate::sync::bounded_queue::BoundedQueue;

#[derive(Clone, Copy)]
struct MutexSlot {
    allocated: bool,
    lock_count: u32,
    owner: Option<i64>,
    waiters: BoundedQueue<QUEUE_SIZE>,
}

impl MutexSlot {
    const fn free() -> Self {
        Self {
            allocated: false,
            lock_count: 0,
            owner: None,
            waiters: BoundedQueue::new(),
        }
    }
}

pub struct MutexTable {
    slots: [MutexSlot; MUTEX_MAX],
    free_ids: BoundedQueue<MUTEX_MAX>,
}

impl MutexTable {
    pub const fn new() -> Self {
        Self {
            slots: [MutexSlot::free(); MUTEX_MAX],
            free_ids: BoundedQueue::new(),
        }
    }

    pub fn init(&mut self) {
        self.slots = [MutexSlot::free(); MUTEX_MAX];
        self.free_ids.init();
        for id in 0..MUTEX_MAX {
            self.free_ids
                .enqueue(id as i64)
                .expect("free-id queue sized to MUTEX_MAX must accept every id");
        }
    }

    fn slot(&self, id: i64) -> KernelResult<&MutexSlot> {
        let idx = usize::try_from(id).map_err(|_| KernelError::IdOutOfRange)?;
        let slot = self.slots.get(idx).ok_or(KernelError::IdOutOfRange)?;
        if !slot.allocated {
            return Err(KernelError::IdNotAllocated);
        }
        Ok(slot)
    }

    fn slot_mut(&mut self, id: i64) -> KernelResult<&mut MutexSlot> {
        let idx = usize::try_from(id).map_err(|_| KernelError::IdOutOfRange)?;
        let slot = self.slots.get_mut(idx).ok_or(KernelError::IdOutOfRange)?;
        if !slot.allocated {
            return Err(KernelError::IdNotAllocated);
        }
        Ok(slot)
    }
}

impl Default for MutexTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelContext {
    /// Allocate a mutex slot and return its id.
    pub fn mutex_init_one(&mut self) -> KernelResult<i64> {
        let id = self
            .mutexes
            .free_ids
            .dequeue()
            .map_err(|_| KernelError::MutexTableFull)?;
        let slot = &mut self.mutexes.slots[id as usize];
        *slot = MutexSlot::free();
        slot.allocated = true;
        Ok(id)
    }

    /// Return a mutex slot to the free pool. Fails if the mutex is currently
    /// held (§4.6 failure semantics).
    ///
    /// Matches the source's clearing order exactly: the id is re-queued and
    /// *then* the slot is zeroed, which also clears `allocated`. This is
    /// sound because no live pid can ever reference a freed-but-unzeroed
    /// slot: the id isn't handed back to any caller until a later
    /// `mutex_init_one` reallocates and re-zeroes it (open question, §9).
    pub fn mutex_destroy(&mut self, id: i64) -> KernelResult<()> {
        {
            let slot = self.mutexes.slot(id)?;
            if slot.owner.is_some() {
                return Err(KernelError::MutexHeld);
            }
        }
        self.mutexes
            .free_ids
            .enqueue(id)
            .map_err(|_| KernelError::MutexTableFull)?;
        self.mutexes.slots[id as usize] = MutexSlot::free();
        Ok(())
    }

    /// Lock mutex `id` on behalf of the currently active process.
    ///
    /// `lock_count` is always incremented, even when the caller already owns
    /// the mutex: a second lock from any process — including the current
    /// owner — takes the blocking branch. This is the literal, undefended
    /// recursive-locking policy documented as an explicit open-question
    /// decision in SPEC_FULL.md §9: recursive locking self-deadlocks, and
    /// that is the caller's responsibility, not this function's.
    pub fn mutex_lock(&mut self, id: i64) -> KernelResult<()> {
        self.mutexes.slot(id)?; // validate id before touching the scheduler
        let caller = self.active_proc.ok_or(KernelError::NoSuchProcess)?;

        let was_held = self.mutexes.slot(id)?.owner.is_some();
        let slot = self.mutexes.slot_mut(id)?;
        slot.lock_count += 1;
        if !was_held {
            slot.owner = Some(caller);
            return Ok(());
        }

        // Someone else (or the caller itself) already holds the mutex: park
        // the caller on its waiter queue.
        let blocked_pid = self
            .block_active_as_waiting()
            .ok_or(KernelError::NoSuchProcess)?;
        let slot = self.mutexes.slot_mut(id)?;
        slot.waiters
            .enqueue(blocked_pid)
            .map_err(|_| KernelError::QueueFull)
    }

    /// Unlock mutex `id`. A no-op success if not currently held. Otherwise
    /// decrements `lock_count`; at zero the mutex becomes free, otherwise the
    /// next waiter (FIFO) becomes the new owner and is rescheduled.
    pub fn mutex_unlock(&mut self, id: i64) -> KernelResult<()> {
        let slot = self.mutexes.slot_mut(id)?;
        if slot.owner.is_none() {
            return Ok(());
        }

        slot.lock_count -= 1;
        if slot.lock_count == 0 {
            let slot = self.mutexes.slot_mut(id)?;
            slot.owner = None;
            return Ok(());
        }

        let next_owner = {
            let slot = self.mutexes.slot_mut(id)?;
            slot.waiters.dequeue().map_err(|_| KernelError::QueueEmpty)?
        };
        {
            let slot = self.mutexes.slot_mut(id)?;
            slot.owner = Some(next_owner);
        }
        self.wake_waiter(next_owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::pcb::ProcessType;

    extern "C" fn dummy_entry() -> ! {
        loop {}
    }

    fn booted_context() -> KernelContext {
        let mut ctx = KernelContext::new();
        ctx.init();
        let idle = ctx.table.create(dummy_entry, "idle", ProcessType::Kernel, 0).unwrap();
        ctx.active_proc = Some(idle);
        ctx
    }

    #[test]
    fn mutex_handoff_matches_seed_scenario_s4() {
        let mut ctx = booted_context();
        let a = ctx.table.create(dummy_entry, "a", ProcessType::User, 0).unwrap();
        let b = ctx.table.create(dummy_entry, "b", ProcessType::User, 0).unwrap();
        let m = ctx.mutex_init_one().unwrap();

        ctx.active_proc = Some(a);
        ctx.mutex_lock(m).unwrap();
        assert_eq!(ctx.mutexes.slot(m).unwrap().owner, Some(a));
        assert_eq!(ctx.mutexes.slot(m).unwrap().lock_count, 1);

        ctx.active_proc = Some(b);
        ctx.mutex_lock(m).unwrap();
        assert_eq!(ctx.active_proc, None, "B must have been parked");
        assert_eq!(
            ctx.table.lookup_by_pid(b).unwrap().state,
            crate::process::pcb::ProcessState::Waiting
        );
        assert_eq!(ctx.mutexes.slot(m).unwrap().lock_count, 2);

        ctx.active_proc = Some(a);
        ctx.mutex_unlock(m).unwrap();
        assert_eq!(ctx.mutexes.slot(m).unwrap().lock_count, 1);
        assert_eq!(ctx.mutexes.slot(m).unwrap().owner, Some(b));
        assert_eq!(
            ctx.table.lookup_by_pid(b).unwrap().state,
            crate::process::pcb::ProcessState::Idle
        );
    }

    #[test]
    fn destroying_a_held_mutex_fails() {
        let mut ctx = booted_context();
        let a = ctx.table.create(dummy_entry, "a", ProcessType::User, 0).unwrap();
        let m = ctx.mutex_init_one().unwrap();
        ctx.active_proc = Some(a);
        ctx.mutex_lock(m).unwrap();
        assert_eq!(ctx.mutex_destroy(m), Err(KernelError::MutexHeld));
    }

    #[test]
    fn unlock_when_not_held_is_a_no_op_success() {
        let mut ctx = booted_context();
        let m = ctx.mutex_init_one().unwrap();
        assert_eq!(ctx.mutex_unlock(m), Ok(()));
    }

    #[test]
    fn out_of_range_id_is_an_error() {
        let mut ctx = booted_context();
        assert_eq!(ctx.mutex_lock(MUTEX_MAX as i64), Err(KernelError::IdOutOfRange));
        assert_eq!(ctx.mutex_lock(-1), Err(KernelError::IdOutOfRange));
    }
}
