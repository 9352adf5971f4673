//! Panic contract test for the syscall dispatcher.
//!
//! Verifies that dispatching a syscall which needs the calling process's
//! identity (anything routed through `active_pid`) panics with the
//! documented contract message when there is no active process - dispatch
//! running outside any process context can only mean a kernel bug.

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(wuros::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use wuros::arch::qemu::{exit_qemu, QemuExitCode};
use wuros::kernel::context::with_context;
use wuros::syscall::{self, SyscallId};

#[no_mangle]
#[link_section = ".text.boot"]
pub extern "C" fn KernelMain(_kernel_size: u64) -> ! {
    wuros::drivers::serial::init();
    with_context(|ctx| ctx.init());
    test_main();

    // If we ever reach this point, the expected panic did not happen.
    exit_qemu(QemuExitCode::Failed);
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let expected = "no active process at syscall entry";
    let matches_contract = info.message().as_str().is_some_and(|m| m.contains(expected));

    if matches_contract {
        exit_qemu(QemuExitCode::Success);
    } else {
        exit_qemu(QemuExitCode::Failed);
    }
}

/// Contract: proc_get_pid panics outside any process context.
/// Given: The subsystem is initialized with the explicit preconditions in this test body, including any literal addresses, vectors, sizes, flags, and constants used below.
/// When: The exact operation sequence in this function is executed against that state.
/// Then: All assertions must hold for the checked values and state transitions, preserving the contract "proc_get_pid panics outside any process context".
/// Failure Impact: Indicates a regression in subsystem behavior, ABI/layout, synchronization, or lifecycle semantics and should be treated as release-blocking until understood.
#[test_case]
fn test_proc_get_pid_panics_without_active_process() {
    // `active_proc` is `None` right after `ctx.init()`; nothing has been
    // scheduled yet.
    let _ = syscall::dispatch(SyscallId::ProcGetPid as u64, 0, 0, 0, 0);
}
