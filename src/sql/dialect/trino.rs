//! Trino (formerly PrestoSQL) dialect.
//!
//! Trino is the federated query engine used to read across catalogs in a
//! unified semantic model:
//! - ANSI identifier quoting (`"`)
//! - Three-part `catalog.schema.table` references
//! - No RETURNING, no MERGE in older clusters (treated as unsupported here)
//! - Native window functions and QUALIFY-like filtering via subqueries only

use super::helpers;
use super::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// Trino SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Trino;

impl SqlDialect for Trino {
    fn name(&self) -> &'static str {
        "trino"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn supports_distinct_on(&self) -> bool {
        false
    }

    fn supports_named_windows(&self) -> bool {
        true
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

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_merge(&self) -> bool {
        false
    }

    fn supports_materialized_view(&self) -> bool {
        true
    }

    fn supports_include_columns(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_trino(name)
    }

    fn emit_data_type(&self, dt: &crate::model::types::DataType) -> String {
        helpers::emit_data_type_trino(dt)
    }

    fn date_add(&self, expr: TokenStream, amount: i64, unit: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Raw(format!("date_add('{}', {}, ", unit.to_lowercase(), amount)))
            .append(&expr)
            .push(Token::RParen);
        ts
    }
}
