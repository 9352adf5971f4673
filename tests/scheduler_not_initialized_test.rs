//! Process-table error-path tests that require a pristine, never-initialized
//! `KernelContext` (§4.3: the free-slot queue is only primed by
//! `KernelContext::init`; slot 0, the idle process, is handed out directly
//! and does not depend on that queue at all).

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(wuros::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use wuros::arch::interrupts;
use wuros::kernel::context::with_context;
use wuros::process::pcb::ProcessType;

#[no_mangle]
#[link_section = ".text.boot"]
pub extern "C" fn KernelMain(_kernel_size: u64) -> ! {
    wuros::drivers::serial::init();
    interrupts::init();

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

/// Contract: the very first `create_process` call always lands in the
/// reserved idle slot, even before `KernelContext::init` has primed the
/// free-slot queue.
/// Given: The subsystem is initialized with the explicit preconditions in this test body, including any literal addresses, vectors, sizes, flags, and constants used below.
/// When: The exact operation sequence in this function is executed against that state.
/// Then: All assertions must hold for the checked values and state transitions, preserving the contract "first create_process call succeeds as the idle process without prior init".
/// Failure Impact: Indicates a regression in subsystem behavior, ABI/layout, synchronization, or lifecycle semantics and should be treated as release-blocking until understood.
#[test_case]
fn test_first_create_process_succeeds_without_init() {
    let pid = with_context(|ctx| ctx.create_process(dummy_task, "idle", ProcessType::Kernel))
        .expect("first create_process call must succeed regardless of init state");
    assert!(pid == wuros::process::table::IDLE_PID, "first pid must be the idle pid");
}

/// Contract: a second `create_process` call before `init` fails, since the
/// free-slot queue was never primed.
/// Given: The subsystem is initialized with the explicit preconditions in this test body, including any literal addresses, vectors, sizes, flags, and constants used below.
/// When: The exact operation sequence in this function is executed against that state.
/// Then: All assertions must hold for the checked values and state transitions, preserving the contract "second create_process call without init fails".
/// Failure Impact: Indicates a regression in subsystem behavior, ABI/layout, synchronization, or lifecycle semantics and should be treated as release-blocking until understood.
#[test_case]
fn test_second_create_process_without_init_fails() {
    let err = with_context(|ctx| ctx.create_process(dummy_task, "second", ProcessType::User))
        .expect_err("free-slot queue is empty until KernelContext::init runs");
    let _ = err;
}
