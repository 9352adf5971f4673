//! Death test for the fatal page-fault handling path (§1 Non-goals: no
//! demand paging, every page fault is fatal).

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(wuros::testing::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use wuros::arch::qemu::{exit_qemu, QemuExitCode};
use wuros::arch::{gdt, interrupts};

#[no_mangle]
#[link_section = ".text.boot"]
pub extern "C" fn KernelMain(_kernel_size: u64) -> ! {
    wuros::drivers::serial::init();
    gdt::init();
    interrupts::init();

    test_main();

    // The test must panic before reaching this point.
    exit_qemu(QemuExitCode::Failed);
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let expected = "page fault at";
    let matches_contract = info
        .message()
        .as_str()
        .is_some_and(|m| m.contains(expected));

    if matches_contract {
        exit_qemu(QemuExitCode::Success);
    } else {
        exit_qemu(QemuExitCode::Failed);
    }
}

/// Contract: dereferencing an unmapped address raises #PF, which this
/// kernel treats as fatal.
/// Given: The subsystem is initialized with the explicit preconditions in this test body, including any literal addresses, vectors, sizes, flags, and constants used below.
/// When: The exact operation sequence in this function is executed against that state.
/// Then: All assertions must hold for the checked values and state transitions, preserving the contract "page fault without mapping exits via test panic handler".
/// Failure Impact: Indicates a regression in subsystem behavior, ABI/layout, synchronization, or lifecycle semantics and should be treated as release-blocking until understood.
#[test_case]
fn test_page_fault_on_unmapped_address_exits_via_test_panic_handler() {
    let bogus = 0xFFFF_8123_4567_8000u64 as *const u8;
    // SAFETY: intentionally dereferencing an address with no backing
    // physical page to force #PF. The panic handler above, not this
    // function, decides whether the test passes.
    unsafe {
        core::ptr::read_volatile(bogus);
    }
}
