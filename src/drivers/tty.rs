//! Fixed table of TTYs: each one pairs an input ring buffer (filled by the
//! keyboard bottom half, drained by `IO_READ`) with an output ring buffer
//! (filled by `IO_WRITE`, drained to the hardware console here).
//!
//! Processes never touch a `ByteRingBuffer` directly; they hold an
//! [`crate::process::pcb::IoBinding`] naming a tty index, resolved through
//! this table at syscall time (§9 "I/O bindings are indices, not pointers").
//!
//! Only tty 0 is mirrored to the VGA screen — the hardware has one text
//! console, not `TTY_COUNT` of them. Every tty's output is always echoed to
//! the serial port, tagged with its index, so non-zero ttys remain
//! observable over COM1 even without a second screen.

use core::cell::UnsafeCell;

use crate::config::{RINGBUF_SIZE, TTY_COUNT};
use crate::drivers::screen::with_screen;
use crate::drivers::serial::Serial;
use crate::process::pcb::IoDirection;
use crate::sync::ringbuffer::ByteRingBuffer;

#[derive(Clone, Copy)]
struct Tty {
    input: ByteRingBuffer<RINGBUF_SIZE>,
    output: ByteRingBuffer<RINGBUF_SIZE>,
}

impl Tty {
    const fn new() -> Self {
        Self {
            input: ByteRingBuffer::new(),
            output: ByteRingBuffer::new(),
        }
    }
}

struct TtyTable {
    ttys: UnsafeCell<[Tty; TTY_COUNT]>,
}

// SAFETY: every access goes through functions in this module, all of which
// are only ever called with interrupts disabled (IRQ bottom half / syscall
// dispatch run inside the same global critical section as everything else).
unsafe impl Sync for TtyTable {}

static TTYS: TtyTable = TtyTable {
    ttys: UnsafeCell::new([Tty::new(); TTY_COUNT]),
};

fn table() -> &'static mut [Tty; TTY_COUNT] {
    unsafe { &mut *TTYS.ttys.get() }
}

pub fn init() {
    for tty in table().iter_mut() {
        tty.input.init();
        tty.output.init();
    }
}

/// Called from the keyboard bottom half for every decoded character.
pub fn push_input(tty_index: usize, byte: u8) -> bool {
    match table().get_mut(tty_index) {
        Some(tty) => tty.input.write(byte).is_ok(),
        None => false,
    }
}

/// `IO_READ`: copy at most `dst.len()` bytes out of the tty's input buffer
/// and flush whatever remains unread (§4.8).
pub fn read_input(tty_index: usize, dst: &mut [u8]) -> Option<usize> {
    let tty = table().get_mut(tty_index)?;
    let available = tty.input.len();
    let n = dst.len().min(available);
    if n > 0 {
        tty.input.read_mem(&mut dst[..n]).ok()?;
    }
    tty.input.flush();
    Some(n)
}

/// `IO_WRITE`: append `src` to the tty's output buffer, truncating to
/// whatever free space remains, then drain it straight through to the
/// console hardware (§4.8 "writes exactly n bytes or fewer if the buffer
/// fills").
pub fn write_output(tty_index: usize, src: &[u8]) -> Option<usize> {
    let tty = table().get_mut(tty_index)?;
    let n = src.len().min(tty.output.free_space());
    if n > 0 {
        tty.output.write_mem(&src[..n]).ok()?;
    }
    drain_output(tty_index, tty);
    Some(n)
}

/// `IO_FLUSH`: discard unread/unwritten bytes for one direction of a tty.
pub fn flush(tty_index: usize, direction: IoDirection) -> bool {
    let Some(tty) = table().get_mut(tty_index) else {
        return false;
    };
    match direction {
        IoDirection::Input => tty.input.flush(),
        IoDirection::Output => tty.output.flush(),
    }
    true
}

fn drain_output(tty_index: usize, tty: &mut Tty) {
    let serial = Serial::new();
    while let Ok(byte) = tty.output.read() {
        if tty_index == 0 {
            with_screen(|screen| screen.print_char(byte));
        }
        serial.write_byte(byte);
    }
}
