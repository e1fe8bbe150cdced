//! Simple logger implementation for early boot
//!
//! Formats `log` records into a fixed stack buffer, without allocating,
//! and hands the bytes to a platform sink (serial port, console...).
//! Safe to use from interrupt context as long as the sink is.

use core::fmt::Write;
use log::{Level, LevelFilter, Metadata, Record};
use spin::Once;

/// Longest formatted line; longer messages are cut
pub const LINE_CAPACITY: usize = 512;

/// Where formatted log lines go
pub trait LogSink: Sync {
    fn write_bytes(&self, bytes: &[u8]);
}

struct KernelLogger {
    sink: Once<&'static dyn LogSink>,
}

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.get() {
            let mut buf = [0u8; LINE_CAPACITY];
            let len = format_line(&mut buf, record.level(), *record.args());
            sink.write_bytes(&buf[..len]);
        }
    }

    fn flush(&self) {}
}

/// Simple buffer writer for formatting without alloc
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }
}

impl<'a> Write for BufferWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Format `[LEVEL] message\n` into `buf`; returns the bytes used
pub fn format_line(buf: &mut [u8], level: Level, args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufferWriter::new(buf);
    let _ = write!(writer, "[{}] {}\n", level_tag(level), args);
    writer.pos
}

/// Global logger instance
static LOGGER: KernelLogger = KernelLogger { sink: Once::new() };

/// Install the logger. Call once, early in boot.
pub fn init(sink: &'static dyn LogSink, level: LevelFilter) -> Result<(), log::SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Write straight to the sink, bypassing levels (early debug)
pub fn early_print(s: &str) {
    if let Some(sink) = LOGGER.sink.get() {
        sink.write_bytes(s.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let mut buf = [0u8; 64];
        let len = format_line(&mut buf, Level::Warn, format_args!("thread {} blocked", 3));
        assert_eq!(&buf[..len], b"[WARN ] thread 3 blocked\n");
    }

    #[test]
    fn test_buffer_writer_truncates() {
        let mut buf = [0u8; 8];
        let mut writer = BufferWriter::new(&mut buf);
        let _ = write!(writer, "0123456789");
        assert_eq!(writer.pos, 8);
        assert_eq!(&buf, b"01234567");
    }
}
