//! Ergonomic wrappers around the raw `int 0x80` ABI (§4.8), used by the
//! boot-seed tasks. Every wrapper returns `Ok` unless the kernel reports the
//! ABI's `-1` sentinel, in which case it maps to `Err(())`: the caller-facing
//! surface here is deliberately thin — there is no user-space yet to build a
//! richer error type for.

use super::abi;
use super::types::{SyscallId, SYSCALL_ERR};
use crate::process::pcb::IoDirection;

type SysResult<T> = Result<T, ()>;

fn decode(raw: u64) -> SysResult<u64> {
    if raw == SYSCALL_ERR {
        Err(())
    } else {
        Ok(raw)
    }
}

/// `IO_READ(direction, dst, n)`: returns the number of bytes copied.
#[inline(always)]
pub fn io_read(direction: IoDirection, dst: &mut [u8]) -> SysResult<usize> {
    let raw = unsafe {
        // SAFETY: `dst` is a valid Rust slice; this kernel runs every task in
        // ring 0 with no separate address spaces (§1 Non-goals).
        abi::syscall3(
            SyscallId::IoRead as u64,
            direction as u64,
            dst.as_mut_ptr() as u64,
            dst.len() as u64,
        )
    };
    decode(raw).map(|n| n as usize)
}

/// `IO_WRITE(direction, src, n)`: returns the number of bytes written.
#[inline(always)]
pub fn io_write(direction: IoDirection, src: &[u8]) -> SysResult<usize> {
    let raw = unsafe {
        // SAFETY: see `io_read`.
        abi::syscall3(
            SyscallId::IoWrite as u64,
            direction as u64,
            src.as_ptr() as u64,
            src.len() as u64,
        )
    };
    decode(raw).map(|n| n as usize)
}

/// `IO_FLUSH(direction)`.
#[inline(always)]
pub fn io_flush(direction: IoDirection) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::IoFlush as u64, direction as u64) };
    decode(raw).map(|_| ())
}

/// `SYS_GET_TIME`: seconds since boot.
#[inline(always)]
pub fn get_time() -> u64 {
    unsafe { abi::syscall0(SyscallId::SysGetTime as u64) }
}

/// `PROC_SLEEP(seconds)`.
#[inline(always)]
pub fn proc_sleep(seconds: u64) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::ProcSleep as u64, seconds) };
    decode(raw).map(|_| ())
}

/// `PROC_EXIT`. Never returns on a correctly functioning scheduler path; if
/// it somehow does, park the caller in a tight loop rather than fall through
/// into whatever code happens to follow.
#[inline(always)]
pub fn proc_exit() -> ! {
    unsafe {
        abi::syscall0(SyscallId::ProcExit as u64);
    }
    loop {
        core::hint::spin_loop();
    }
}

/// `PROC_GET_PID`.
#[inline(always)]
pub fn proc_get_pid() -> i64 {
    unsafe { abi::syscall0(SyscallId::ProcGetPid as u64) as i64 }
}

/// `MUTEX_INIT`: returns the new mutex id.
#[inline(always)]
pub fn mutex_init() -> SysResult<i64> {
    let raw = unsafe { abi::syscall0(SyscallId::MutexInit as u64) };
    decode(raw).map(|id| id as i64)
}

#[inline(always)]
pub fn mutex_lock(id: i64) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::MutexLock as u64, id as u64) };
    decode(raw).map(|_| ())
}

#[inline(always)]
pub fn mutex_unlock(id: i64) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::MutexUnlock as u64, id as u64) };
    decode(raw).map(|_| ())
}

/// `SEM_INIT(initial_count)`: returns the new semaphore id.
#[inline(always)]
pub fn sem_init(initial_count: i64) -> SysResult<i64> {
    let raw = unsafe { abi::syscall1(SyscallId::SemInit as u64, initial_count as u64) };
    decode(raw).map(|id| id as i64)
}

#[inline(always)]
pub fn sem_wait(id: i64) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::SemWait as u64, id as u64) };
    decode(raw).map(|_| ())
}

#[inline(always)]
pub fn sem_post(id: i64) -> SysResult<()> {
    let raw = unsafe { abi::syscall1(SyscallId::SemPost as u64, id as u64) };
    decode(raw).map(|_| ())
}
