//! Process table / scheduler lifecycle contract tests (§4.3, §4.4).

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(wuros::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use wuros::arch::{gdt, interrupts};
use wuros::config::PROC_MAX;
use wuros::kernel::context::with_context;
use wuros::process::pcb::ProcessType;
use wuros::process::table::IDLE_PID;

#[no_mangle]
#[link_section = ".text.boot"]
pub extern "C" fn KernelMain(_kernel_size: u64) -> ! {
    wuros::drivers::serial::init();
    gdt::init();
    interrupts::init();
    with_context(|ctx| ctx.init());

    test_main();
    loop {
        core::hint::spin_loop();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    wuros::testing::test_panic_handler(info)
}

extern "C" fn dummy_task() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Contract: the first process created after init is always the idle pid.
#[test_case]
fn test_first_process_after_init_is_idle() {
    let pid = with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable right after init");
    assert!(pid == IDLE_PID, "first pid after init must be the reserved idle pid");

    // Reset back to a pristine table so later tests in this binary are unaffected.
    with_context(|ctx| ctx.init());
}

/// Contract: destroying the idle process is always rejected (§4.3, S6).
#[test_case]
fn test_destroy_idle_process_is_rejected() {
    with_context(|ctx| ctx.init());
    let idle = with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable");
    assert!(idle == IDLE_PID);

    let err = with_context(|ctx| ctx.destroy_process(IDLE_PID));
    assert!(err.is_err(), "destroying the idle process must always fail");
}

/// Contract: the process table holds at most `PROC_MAX` live processes;
/// the table-full error surfaces once the free-slot queue is exhausted.
#[test_case]
fn test_process_table_rejects_creation_past_capacity() {
    with_context(|ctx| ctx.init());
    with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable");

    let mut created = 0;
    loop {
        let result =
            with_context(|ctx| ctx.create_process(dummy_task, "filler", ProcessType::User));
        match result {
            Ok(_) => created += 1,
            Err(_) => break,
        }
    }

    assert!(
        created == PROC_MAX - 1,
        "every non-idle slot must be fillable exactly once before the table reports full"
    );

    with_context(|ctx| ctx.init());
}

/// Contract: a freshly created process starts in the scheduler's idle (not
/// yet runnable) state until explicitly added to the run queue.
#[test_case]
fn test_created_process_is_not_scheduled_until_added() {
    with_context(|ctx| ctx.init());
    let idle = with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable");
    let pid = with_context(|ctx| ctx.create_process(dummy_task, "worker", ProcessType::User))
        .expect("worker process must be creatable");

    assert!(
        with_context(|ctx| ctx.active_proc) != Some(pid),
        "a newly created process must not become active on its own"
    );

    with_context(|ctx| ctx.scheduler_add(pid)).expect("adding a valid pid to the run queue must succeed");
    let _ = idle;
    with_context(|ctx| ctx.init());
}

/// Contract: process names are truncated/stored via the fixed-capacity name
/// buffer and read back exactly as set.
#[test_case]
fn test_process_name_roundtrip() {
    with_context(|ctx| ctx.init());
    let idle = with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("idle process must be creatable");
    let pid = with_context(|ctx| ctx.create_process(dummy_task, "shell", ProcessType::User))
        .expect("worker process must be creatable");

    let mut buf = [0u8; wuros::config::PROC_NAME_LEN];
    let len = with_context(|ctx| {
        let name = ctx.table.lookup_by_pid(pid)?.name();
        let len = name.len();
        buf[..len].copy_from_slice(name.as_bytes());
        Some(len)
    })
    .expect("process must exist in the table right after creation");
    assert!(
        core::str::from_utf8(&buf[..len]).unwrap_or("") == "shell",
        "process name must round-trip through the table"
    );

    let _ = idle;
    with_context(|ctx| ctx.init());
}
