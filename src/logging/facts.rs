use log::Level;
use serde_json::Value;

/// Structured fact consumer. One emission per stage event.
pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Human-readable audit line consumer.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Discard-everything sink, the default for both traits.
#[derive(Default, Clone, Copy, Debug)]
pub struct JsonlSink;

impl FactsEmitter for JsonlSink {
    fn emit(&self, _subsystem: &str, _event: &str, _decision: &str, _fields: Value) {}
}

impl AuditSink for JsonlSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Audit sink forwarding to the `log` crate.
#[derive(Default, Clone, Copy, Debug)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(level, "{msg}");
    }
}
