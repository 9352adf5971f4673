#![no_std]
#![no_main]

extern crate wuros;

use wuros::boot;

/// Entry point jumped to directly from the bootloader/boot assembly once
/// the CPU is in 64-bit long mode. The panic handler lives in
/// `wuros::panic` and is linked in transitively through the `boot` call
/// below; this binary does not define its own.
#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    boot::kernel_main();
}
