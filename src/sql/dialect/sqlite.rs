//! SQLite SQL dialect.
//!
//! SQLite is the embedded, single-file backend connectors typically report
//! for local/dev connections:
//! - ANSI identifier quoting (`"`)
//! - No native PIVOT, no QUALIFY
//! - RETURNING supported since 3.35
//! - No MERGE (use INSERT ... ON CONFLICT)
//! - Dynamic typing means data types are advisory only

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_distinct_on(&self) -> bool {
        false
    }

    fn supports_named_windows(&self) -> bool {
        false
    }

    fn supports_aggregate_filter(&self) -> bool {
        true
    }

    fn supports_groups_frame(&self) -> bool {
        false
    }

    fn supports_qualify(&self) -> bool {
        false
    }

    fn supports_native_pivot(&self) -> bool {
        false
    }

    fn supports_merge(&self) -> bool {
        false
    }

    fn supports_truncate(&self) -> bool {
        // SQLite has no TRUNCATE; callers fall back to DELETE FROM.
        false
    }

    fn supports_truncate_cascade(&self) -> bool {
        false
    }

    fn supports_materialized_view(&self) -> bool {
        false
    }

    fn supports_include_columns(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }

    fn emit_data_type(&self, dt: &crate::model::types::DataType) -> String {
        helpers::emit_data_type_sqlite(dt)
    }
}
