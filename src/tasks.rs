//! Boot-seed task entry points (§6 "Boot seed").
//!
//! Every entry point here is an [`EntryFn`] — `extern "C" fn() -> !` — so a
//! single function is shared by every instance of a kind (four shells, three
//! ping/pong pairs): each instance looks its own configuration up by its own
//! pid in a small fixed-size roster populated once at boot, before the
//! scheduler ever runs. This mirrors the process table's own "index by pid,
//! never by closure capture" design (§9).

use core::cell::UnsafeCell;

use crate::config::{BOOT_PING_COUNT, BOOT_SHELL_COUNT};
use crate::process::pcb::IoDirection;
use crate::syscall::user;

struct ShellRoster {
    ttys: UnsafeCell<[Option<(i64, usize)>; BOOT_SHELL_COUNT]>,
}

unsafe impl Sync for ShellRoster {}

static SHELL_ROSTER: ShellRoster = ShellRoster {
    ttys: UnsafeCell::new([None; BOOT_SHELL_COUNT]),
};

/// Record which TTY a freshly-created shell pid owns. Called from
/// `boot::kernel_main` right after `create_process`, before the scheduler
/// can possibly dispatch to it.
pub fn register_shell(pid: i64, tty_index: usize) {
    let slots = unsafe { &mut *SHELL_ROSTER.ttys.get() };
    for slot in slots.iter_mut() {
        if slot.is_none() {
            *slot = Some((pid, tty_index));
            return;
        }
    }
}

fn shell_tty_for(pid: i64) -> Option<usize> {
    let slots = unsafe { &*SHELL_ROSTER.ttys.get() };
    slots.iter().flatten().find(|(p, _)| *p == pid).map(|(_, tty)| *tty)
}

#[derive(Clone, Copy)]
enum Role {
    Ping,
    Pong,
}

#[derive(Clone, Copy)]
struct PingPongBinding {
    pid: i64,
    role: Role,
    self_sem: i64,
    peer_sem: i64,
    tty_index: usize,
}

struct PingPongRoster {
    bindings: UnsafeCell<[Option<PingPongBinding>; BOOT_PING_COUNT]>,
}

unsafe impl Sync for PingPongRoster {}

static PINGPONG_ROSTER: PingPongRoster = PingPongRoster {
    bindings: UnsafeCell::new([None; BOOT_PING_COUNT]),
};

fn register_pingpong(pid: i64, role: Role, self_sem: i64, peer_sem: i64, tty_index: usize) {
    let slots = unsafe { &mut *PINGPONG_ROSTER.bindings.get() };
    for slot in slots.iter_mut() {
        if slot.is_none() {
            *slot = Some(PingPongBinding {
                pid,
                role,
                self_sem,
                peer_sem,
                tty_index,
            });
            return;
        }
    }
}

/// Record the ping half of a pair. `self_sem` starts at 1 (ping runs first),
/// `peer_sem` starts at 0.
pub fn register_ping(pid: i64, ping_sem: i64, pong_sem: i64, tty_index: usize) {
    register_pingpong(pid, Role::Ping, ping_sem, pong_sem, tty_index);
}

/// Record the pong half of a pair. Note `self_sem`/`peer_sem` are swapped
/// relative to `register_ping`: pong waits on `pong_sem` and posts `ping_sem`.
pub fn register_pong(pid: i64, ping_sem: i64, pong_sem: i64, tty_index: usize) {
    register_pingpong(pid, Role::Pong, pong_sem, ping_sem, tty_index);
}

fn pingpong_binding_for(pid: i64) -> Option<PingPongBinding> {
    let slots = unsafe { &*PINGPONG_ROSTER.bindings.get() };
    slots.iter().flatten().find(|b| b.pid == pid).copied()
}

/// Idle process entry (pid 0): halts the CPU every iteration with
/// interrupts enabled, per §6's boot-seed description. The timer interrupt
/// (already enabled by `boot::kernel_main` before this task can ever become
/// active) wakes it back up on every tick regardless.
pub extern "C" fn idle_task() -> ! {
    loop {
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
    }
}

const SHELL_BUF_LEN: usize = 128;

/// Shell task entry: echoes whatever its bound TTY's input buffer has
/// accumulated since the last poll, back out to the same TTY. One process
/// per TTY (§6); this is not a real command shell, just enough interactive
/// behavior to exercise `IO_READ`/`IO_WRITE` against a live keyboard/console
/// pair end to end.
pub extern "C" fn shell_task() -> ! {
    let pid = user::proc_get_pid();
    let Some(tty_index) = shell_tty_for(pid) else {
        user::proc_exit();
    };
    let _ = tty_index;

    let mut buf = [0u8; SHELL_BUF_LEN];
    loop {
        match user::io_read(IoDirection::Input, &mut buf) {
            Ok(n) if n > 0 => {
                let _ = user::io_write(IoDirection::Output, &buf[..n]);
            }
            _ => {
                let _ = user::proc_sleep(0);
            }
        }
    }
}

/// Ping/pong task entry: alternates `sem_wait`/`sem_post` with its partner
/// process, writing a short line to its bound TTY on each turn. Demonstrates
/// semaphore handoff (§4.7) the same way the mutex subsystem's S4 scenario
/// demonstrates mutex handoff, but as a live running pair of processes
/// rather than a unit test.
pub extern "C" fn pingpong_task() -> ! {
    let pid = user::proc_get_pid();
    let Some(binding) = pingpong_binding_for(pid) else {
        user::proc_exit();
    };

    let message: &[u8] = match binding.role {
        Role::Ping => b"ping\n",
        Role::Pong => b"pong\n",
    };

    loop {
        if user::sem_wait(binding.self_sem).is_err() {
            user::proc_exit();
        }
        let _ = user::io_write(IoDirection::Output, message);
        let _ = user::sem_post(binding.peer_sem);
    }
}
