//! Syscall identifiers and the ABI's numeric error convention (§4.8).
//!
//! The trap-frame register slots are fixed: `rax` carries the syscall id in,
//! and the return value out; `rdi`/`rsi`/`rdx`/`r10` carry up to four
//! arguments. This module only names the ids — encoding/decoding the
//! registers happens in [`super::dispatch`].

/// Raw `-1` return value, as the ABI boundary's bit pattern (`rax` is `u64`).
pub const SYSCALL_ERR: u64 = -1i64 as u64;

#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallId {
    IoRead = 0,
    IoWrite = 1,
    IoFlush = 2,
    SysGetTime = 3,
    SysGetName = 4,
    ProcSleep = 5,
    ProcExit = 6,
    ProcGetPid = 7,
    ProcGetName = 8,
    MutexInit = 9,
    MutexDestroy = 10,
    MutexLock = 11,
    MutexUnlock = 12,
    SemInit = 13,
    SemDestroy = 14,
    SemWait = 15,
    SemPost = 16,
}

impl SyscallId {
    pub const fn from_raw(nr: u64) -> Option<Self> {
        Some(match nr {
            0 => Self::IoRead,
            1 => Self::IoWrite,
            2 => Self::IoFlush,
            3 => Self::SysGetTime,
            4 => Self::SysGetName,
            5 => Self::ProcSleep,
            6 => Self::ProcExit,
            7 => Self::ProcGetPid,
            8 => Self::ProcGetName,
            9 => Self::MutexInit,
            10 => Self::MutexDestroy,
            11 => Self::MutexLock,
            12 => Self::MutexUnlock,
            13 => Self::SemInit,
            14 => Self::SemDestroy,
            15 => Self::SemWait,
            16 => Self::SemPost,
            _ => return None,
        })
    }
}
