//! Kernel logging sink (§6A).
//!
//! A single [`KernelLogger`] implements [`log::Log`] and is installed once
//! at boot. Every severity fans out to the serial collaborator
//! unconditionally; `Error`/`Warn` records additionally reach the VGA
//! collaborator, matching the panic banner's own use of the screen. The
//! dynamic filter described in §4's "logging sink" collaborator is
//! `log::set_max_level`, exposed here as `set_level`/`level`, mirroring the
//! source's `kernel_set_log_level`/`kernel_get_log_level` pair.

use core::fmt::Write as _;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::drivers::screen::{with_screen, Color};
use crate::drivers::serial;

struct KernelLogger;

static LOGGER: KernelLogger = KernelLogger;

/// Default level until `set_level` is called; `Info` matches the teacher's
/// default verbosity for boot/runtime messages without drowning them in
/// per-tick scheduler chatter.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Stores the active filter as a plain integer so `level()` can be read
/// without going back through `log`'s own (one-directional) filter API.
static CURRENT_LEVEL: AtomicUsize = AtomicUsize::new(DEFAULT_LEVEL as usize);

fn level_from_usize(raw: usize) -> LevelFilter {
    match raw {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_from_usize(CURRENT_LEVEL.load(Ordering::Relaxed))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        serial::_debug_print(format_args!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        ));

        if matches!(record.level(), Level::Error | Level::Warn) {
            with_screen(|screen| {
                screen.set_color(if record.level() == Level::Error {
                    Color::LightRed
                } else {
                    Color::Yellow
                });
                let _ = writeln!(screen, "[{}] {}", record.level(), record.args());
                screen.set_color(Color::White);
            });
        }
    }

    fn flush(&self) {}
}

/// Installs the kernel logger. Must be called exactly once, before any
/// `log::info!`/etc. call site can fire (in practice: very first thing in
/// `boot::kernel_main`, right after the serial port is initialized).
pub fn init() {
    log::set_logger(&LOGGER).expect("logger installed more than once");
    log::set_max_level(DEFAULT_LEVEL);
}

/// Dynamic log-level filter (mirrors the source's `kernel_set_log_level`).
pub fn set_level(level: LevelFilter) {
    CURRENT_LEVEL.store(level as usize, Ordering::Relaxed);
    log::set_max_level(level);
}

/// Reads back the active filter (mirrors `kernel_get_log_level`).
pub fn level() -> LevelFilter {
    level_from_usize(CURRENT_LEVEL.load(Ordering::Relaxed))
}
