//! Activity logging for monitor sessions.

pub mod jsonl;

pub use jsonl::{ActivityLog, ActivityLogConfig, EventType, LogEntry, Severity};
