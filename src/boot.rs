//! Boot sequencing (§6 "Boot seed").
//!
//! `kernel_main` is the single entry point called by `_start` once the CPU
//! is in 64-bit long mode. Initialization order is fixed, per §9 "Global
//! mutable state": queues before tables before scheduler before IRQ
//! registration. `KernelContext::init` covers the first three; this
//! function covers arch bring-up, IRQ registration, and the boot-seed
//! process population, in that order.

use crate::arch::{gdt, interrupts};
use crate::config::{BOOT_PING_COUNT, BOOT_PONG_COUNT, BOOT_SHELL_COUNT, TTY_COUNT};
use crate::drivers::{keyboard, serial, tty};
use crate::kernel::context::with_context;
use crate::logging;
use crate::process::pcb::{IoBinding, IoDirection, ProcessType};
use crate::tasks;

/// Brings up every subsystem in dependency order and never returns: the
/// idle task (pid 0), created last among the fixed population, is always
/// runnable, so the final `interrupts::enable` is followed by an
/// unconditional halt loop that the scheduler preempts out of on the very
/// first timer tick.
pub fn kernel_main() -> ! {
    serial::init();
    logging::init();

    log::info!("booting");

    gdt::init();
    interrupts::init();

    with_context(|ctx| ctx.init());
    tty::init();
    keyboard::init();

    interrupts::register_irq_handler(interrupts::IRQ0_PIT_TIMER_VECTOR, interrupts::timer_irq_handler);
    interrupts::register_irq_handler(interrupts::IRQ1_KEYBOARD_VECTOR, interrupts::keyboard_irq_handler);
    interrupts::init_periodic_timer(crate::config::TIMER_RATE_HZ as u32);

    seed_boot_population();

    log::info!("entering scheduler");
    interrupts::enable();

    loop {
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
    }
}

/// Creates the idle process plus the fixed shell and ping/pong test
/// population described by §6, binding each to a TTY. Order within this
/// function does not matter to the scheduler (every `create_process` call
/// is independent), but the idle process must be first: the process table
/// requires the very first `create` call to land in the reserved slot 0
/// (`process::table::IDLE_PID`).
fn seed_boot_population() {
    let idle = with_context(|ctx| ctx.create_process(tasks::idle_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable from a freshly initialized table");
    debug_assert_eq!(idle, crate::process::table::IDLE_PID);

    for i in 0..BOOT_SHELL_COUNT {
        let tty_index = i % TTY_COUNT;
        let pid = with_context(|ctx| {
            let pid = ctx.create_process(tasks::shell_task, "shell", ProcessType::User)?;
            if let Some(pcb) = ctx.table.lookup_by_pid_mut(pid) {
                pcb.bind_io(IoDirection::Input, IoBinding { tty_index });
                pcb.bind_io(IoDirection::Output, IoBinding { tty_index });
            }
            Ok::<_, crate::error::KernelError>(pid)
        })
        .expect("process table sized to hold every boot-seed shell");
        tasks::register_shell(pid, tty_index);
    }

    let pairs = BOOT_PING_COUNT.min(BOOT_PONG_COUNT);
    for i in 0..pairs {
        let tty_index = i % TTY_COUNT;
        let (ping_sem, pong_sem) = with_context(|ctx| {
            let ping_sem = ctx.sem_init_one(1)?;
            let pong_sem = ctx.sem_init_one(0)?;
            Ok::<_, crate::error::KernelError>((ping_sem, pong_sem))
        })
        .expect("semaphore table sized to hold every boot-seed ping/pong pair");

        let ping_pid = with_context(|ctx| {
            let pid = ctx.create_process(tasks::pingpong_task, "ping", ProcessType::User)?;
            if let Some(pcb) = ctx.table.lookup_by_pid_mut(pid) {
                pcb.bind_io(IoDirection::Output, IoBinding { tty_index });
            }
            Ok::<_, crate::error::KernelError>(pid)
        })
        .expect("process table sized to hold every boot-seed ping task");
        tasks::register_ping(ping_pid, ping_sem, pong_sem, tty_index);

        let pong_pid = with_context(|ctx| {
            let pid = ctx.create_process(tasks::pingpong_task, "pong", ProcessType::User)?;
            if let Some(pcb) = ctx.table.lookup_by_pid_mut(pid) {
                pcb.bind_io(IoDirection::Output, IoBinding { tty_index });
            }
            Ok::<_, crate::error::KernelError>(pid)
        })
        .expect("process table sized to hold every boot-seed pong task");
        tasks::register_pong(pong_pid, ping_sem, pong_sem, tty_index);
    }
}
