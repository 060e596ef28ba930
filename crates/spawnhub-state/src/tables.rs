//! redb table definitions.

use redb::TableDefinition;

/// Service records (JSON) keyed by service label.
pub const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");
