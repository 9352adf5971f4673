//! Kernel-side syscall dispatcher (`int 0x80` path, §4.8).
//!
//! ABI for `dispatch` (decoded by [`crate::arch::interrupts::syscall_rust_dispatch`]):
//! - `rax` -> `syscall_nr`
//! - `rdi` -> `arg0`
//! - `rsi` -> `arg1`
//! - `rdx` -> `arg2`
//! - `r10` -> `arg3` (currently unused by every syscall below)
//!
//! Every handler resolves the calling process through `active_proc`; a
//! missing active process at syscall entry is fatal (§4.8), since it can
//! only mean dispatch ran outside of any process context.

use core::slice;

use crate::config::{OS_NAME, TIMER_RATE_HZ};
use crate::drivers::tty;
use crate::kernel::context::with_context;
use crate::process::pcb::IoDirection;

use super::types::{SyscallId, SYSCALL_ERR};

pub fn dispatch(syscall_nr: u64, arg0: u64, arg1: u64, arg2: u64, arg3: u64) -> u64 {
    let _ = arg3;
    let Some(id) = SyscallId::from_raw(syscall_nr) else {
        panic!("invalid syscall id {syscall_nr}");
    };

    match id {
        SyscallId::IoRead => io_read(arg0, arg1 as *mut u8, arg2 as usize),
        SyscallId::IoWrite => io_write(arg0, arg1 as *const u8, arg2 as usize),
        SyscallId::IoFlush => io_flush(arg0),
        SyscallId::SysGetTime => sys_get_time(),
        SyscallId::SysGetName => sys_get_name(arg0 as *mut u8, arg1 as usize),
        SyscallId::ProcSleep => proc_sleep(arg0),
        SyscallId::ProcExit => proc_exit(),
        SyscallId::ProcGetPid => proc_get_pid(),
        SyscallId::ProcGetName => proc_get_name(arg0 as *mut u8, arg1 as usize),
        SyscallId::MutexInit => mutex_init(),
        SyscallId::MutexDestroy => mutex_destroy(arg0),
        SyscallId::MutexLock => mutex_lock(arg0),
        SyscallId::MutexUnlock => mutex_unlock(arg0),
        SyscallId::SemInit => sem_init(arg0),
        SyscallId::SemDestroy => sem_destroy(arg0),
        SyscallId::SemWait => sem_wait(arg0),
        SyscallId::SemPost => sem_post(arg0),
    }
}

fn active_pid() -> i64 {
    with_context(|ctx| ctx.active_proc).unwrap_or_else(|| panic!("no active process at syscall entry"))
}

fn io_direction(raw: u64) -> Option<IoDirection> {
    match raw {
        0 => Some(IoDirection::Input),
        1 => Some(IoDirection::Output),
        _ => None,
    }
}

fn bound_tty_index(direction: IoDirection) -> Option<usize> {
    let pid = active_pid();
    with_context(|ctx| {
        ctx.table
            .lookup_by_pid(pid)
            .and_then(|pcb| pcb.io_binding(direction))
            .map(|binding| binding.tty_index)
    })
}

fn io_read(direction_raw: u64, dst: *mut u8, n: usize) -> u64 {
    let Some(direction) = io_direction(direction_raw) else {
        return SYSCALL_ERR;
    };
    let Some(tty_index) = bound_tty_index(direction) else {
        return SYSCALL_ERR;
    };
    if n != 0 && dst.is_null() {
        return SYSCALL_ERR;
    }
    // SAFETY: the caller supplies `dst`/`n` describing a buffer it owns; this
    // kernel has no address-space isolation to validate against (§1
    // Non-goals), matching the original syscall gateway's trust model.
    let buf = unsafe { slice::from_raw_parts_mut(dst, n) };
    match tty::read_input(tty_index, buf) {
        Some(copied) => copied as u64,
        None => SYSCALL_ERR,
    }
}

fn io_write(direction_raw: u64, src: *const u8, n: usize) -> u64 {
    let Some(direction) = io_direction(direction_raw) else {
        return SYSCALL_ERR;
    };
    let Some(tty_index) = bound_tty_index(direction) else {
        return SYSCALL_ERR;
    };
    if n == 0 {
        return 0;
    }
    if src.is_null() {
        return SYSCALL_ERR;
    }
    // SAFETY: see `io_read`.
    let buf = unsafe { slice::from_raw_parts(src, n) };
    match tty::write_output(tty_index, buf) {
        Some(written) => written as u64,
        None => SYSCALL_ERR,
    }
}

fn io_flush(direction_raw: u64) -> u64 {
    let Some(direction) = io_direction(direction_raw) else {
        return SYSCALL_ERR;
    };
    let Some(tty_index) = bound_tty_index(direction) else {
        return SYSCALL_ERR;
    };
    if tty::flush(tty_index, direction) {
        0
    } else {
        SYSCALL_ERR
    }
}

fn sys_get_time() -> u64 {
    with_context(|ctx| ctx.tick) / TIMER_RATE_HZ
}

fn copy_str_out(s: &str, dst: *mut u8, capacity: usize) -> u64 {
    let bytes = s.as_bytes();
    if bytes.len() > capacity || dst.is_null() {
        return SYSCALL_ERR;
    }
    // SAFETY: see `io_read`; `capacity` bounds the write to the caller's
    // declared buffer size.
    unsafe {
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
    }
    0
}

fn sys_get_name(dst: *mut u8, capacity: usize) -> u64 {
    copy_str_out(OS_NAME, dst, capacity)
}

fn proc_sleep(seconds: u64) -> u64 {
    let pid = active_pid();
    let ticks = seconds.saturating_mul(TIMER_RATE_HZ);
    match with_context(|ctx| ctx.scheduler_sleep(pid, ticks)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn proc_exit() -> u64 {
    let pid = active_pid();
    // Errors (e.g. pid 0) are unreachable here: the idle process never
    // issues syscalls. Still routed through the fallible API rather than
    // special-cased, consistent with every other destroy path.
    let _ = with_context(|ctx| ctx.destroy_process(pid));
    0
}

fn proc_get_pid() -> u64 {
    active_pid() as u64
}

fn proc_get_name(dst: *mut u8, capacity: usize) -> u64 {
    let pid = active_pid();
    let mut buf = [0u8; crate::config::PROC_NAME_LEN];
    let len = with_context(|ctx| {
        let name = ctx.table.lookup_by_pid(pid)?.name();
        let len = name.len();
        buf[..len].copy_from_slice(name.as_bytes());
        Some(len)
    });
    match len {
        Some(len) => {
            let name = core::str::from_utf8(&buf[..len]).unwrap_or("");
            copy_str_out(name, dst, capacity)
        }
        None => SYSCALL_ERR,
    }
}

fn mutex_init() -> u64 {
    match with_context(|ctx| ctx.mutex_init_one()) {
        Ok(id) => id as u64,
        Err(_) => SYSCALL_ERR,
    }
}

fn mutex_destroy(id: u64) -> u64 {
    match with_context(|ctx| ctx.mutex_destroy(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn mutex_lock(id: u64) -> u64 {
    match with_context(|ctx| ctx.mutex_lock(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn mutex_unlock(id: u64) -> u64 {
    match with_context(|ctx| ctx.mutex_unlock(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn sem_init(initial_count: u64) -> u64 {
    match with_context(|ctx| ctx.sem_init_one(initial_count as i64)) {
        Ok(id) => id as u64,
        Err(_) => SYSCALL_ERR,
    }
}

fn sem_destroy(id: u64) -> u64 {
    match with_context(|ctx| ctx.sem_destroy(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn sem_wait(id: u64) -> u64 {
    match with_context(|ctx| ctx.sem_wait(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}

fn sem_post(id: u64) -> u64 {
    match with_context(|ctx| ctx.sem_post(id as i64)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_ERR,
    }
}
