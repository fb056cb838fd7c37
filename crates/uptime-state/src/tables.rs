//! redb table definitions for the uptime state store.

use redb::TableDefinition;

/// Monitor records keyed by monitor id.
pub const MONITORS: TableDefinition<u64, &[u8]> = TableDefinition::new("monitors");

/// Check log entries keyed by `{monitor_id:020}:{log_id:020}`.
pub const LOGS: TableDefinition<&str, &[u8]> = TableDefinition::new("logs");

/// Monotonic id counters keyed by sequence name.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub const MONITOR_SEQUENCE: &str = "monitor";
pub const LOG_SEQUENCE: &str = "log";
