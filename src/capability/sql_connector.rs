//! `SqlConnector`: executes dialect-native SQL and normalizes the result.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sql::dialect::Dialect;

#[derive(Debug, thiserror::Error)]
pub enum SqlConnectorError {
    #[error("connector execution failed: {0}")]
    Execution(String),

    #[error("connector timed out after {0:?}")]
    Timeout(Duration),
}

/// A normalized query result, independent of the underlying driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecuteResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub rowcount: Option<u64>,
    pub elapsed_ms: Option<u64>,
    pub sql: String,
}

#[async_trait]
pub trait SqlConnector: Send + Sync {
    /// The dialect this connector speaks; the translator and Analyst tool
    /// transpile canonical SQL to this before calling `execute`.
    fn dialect(&self) -> Dialect;

    async fn execute(
        &self,
        sql: &str,
        max_rows: Option<u32>,
        timeout: Option<Duration>,
    ) -> Result<ExecuteResult, SqlConnectorError>;

    /// Optional hook letting a connector rewrite an individual member
    /// expression before it's embedded in generated SQL (vendor-specific
    /// function substitution beyond what the dialect emitter covers).
    fn rewrite_expression(&self, expr: &str) -> String {
        expr.to_string()
    }
}

/// An in-memory connector backed by canned result sets keyed by the exact
/// SQL text, for deterministic tests without a live database.
#[derive(Debug, Default)]
pub struct InMemorySqlConnector {
    pub fixtures: HashMap<String, ExecuteResult>,
    pub dialect: Dialect,
}

impl InMemorySqlConnector {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            fixtures: HashMap::new(),
            dialect,
        }
    }

    pub fn with_fixture(mut self, sql: impl Into<String>, result: ExecuteResult) -> Self {
        self.fixtures.insert(sql.into(), result);
        self
    }
}

#[async_trait]
impl SqlConnector for InMemorySqlConnector {
    async fn execute(
        &self,
        sql: &str,
        max_rows: Option<u32>,
        _timeout: Option<Duration>,
    ) -> Result<ExecuteResult, SqlConnectorError> {
        let mut result = self
            .fixtures
            .get(sql)
            .cloned()
            .ok_or_else(|| SqlConnectorError::Execution(format!("no fixture registered for: {sql}")))?;
        if let Some(max) = max_rows {
            result.rows.truncate(max as usize);
        }
        Ok(result)
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}
