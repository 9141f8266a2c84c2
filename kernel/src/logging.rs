/// Kernel logger behind the `log` facade.
///
/// Protocol code only ever calls `log::debug!` and friends. On hardware the
/// boot code installs a `KernelLogger` over the serial console; in host
/// tests no logger is installed and the macros are no-ops.
use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerError {
    /// A logger was already installed.
    AlreadyInstalled,
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::AlreadyInstalled => write!(f, "logger already installed"),
        }
    }
}

/// Writes one line per record: `level [target] message`.
pub struct KernelLogger<W> {
    out: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> KernelLogger<W> {
    pub const fn new(out: W, level: LevelFilter) -> Self {
        Self {
            out: Mutex::new(out),
            level,
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Run `f` with the underlying writer locked.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        let mut out = self.out.lock();
        f(&mut *out)
    }
}

impl<W: Write + Send> Log for KernelLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = self.out.lock();
        // A full console is not worth failing the caller over.
        let _ = writeln!(out, "{:>5} [{}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Install `logger` as the global logger.
pub fn init<W: Write + Send + 'static>(logger: &'static KernelLogger<W>) -> Result<(), LoggerError> {
    log::set_logger(logger).map_err(|_| LoggerError::AlreadyInstalled)?;
    log::set_max_level(logger.level());
    Ok(())
}
