//! Process-wide `log` sink for tests that assert on emitted diagnostics.
//!
//! Only one logger can be installed per test binary, so every test that wants logging
//! goes through [`init`]. Records are kept in memory; filter them by the request id
//! that appears in the `BlobRequest[..]` prefix, since tests run in parallel.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, OnceLock};

struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

pub(crate) fn init() {
    let logger = LOGGER.get_or_init(|| CaptureLogger { records: Mutex::new(Vec::new()) });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Captured records at `level` whose message contains `needle`.
pub(crate) fn records(level: Level, needle: &str) -> Vec<String> {
    let Some(logger) = LOGGER.get() else {
        return Vec::new();
    };
    let records = logger.records.lock().unwrap();
    records
        .iter()
        .filter(|(l, msg)| *l == level && msg.contains(needle))
        .map(|(_, msg)| msg.clone())
        .collect()
}
