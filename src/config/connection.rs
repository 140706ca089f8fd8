//! Database connection configuration.
//!
//! Connections are identified by a [`Driver`] (one of the seven dialects the
//! translator targets) plus a connector-supplied connection string. Unlike
//! the single-backend builders this module once had, connection string
//! construction is delegated to the connector implementation behind the
//! `SqlConnector` capability trait -- this module only validates the driver
//! name and carries the opaque string through.

use std::env;

use crate::sql::dialect::Dialect;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Supported database drivers, one per translator dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    TSql,
    Trino,
    MySql,
    BigQuery,
    Snowflake,
    Sqlite,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            "tsql" | "mssql" | "sqlserver" | "sql_server" => Ok(Driver::TSql),
            "trino" | "presto" => Ok(Driver::Trino),
            "mysql" => Ok(Driver::MySql),
            "bigquery" | "bq" => Ok(Driver::BigQuery),
            "snowflake" => Ok(Driver::Snowflake),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the matching SQL dialect for the translator.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::Postgres => Dialect::Postgres,
            Driver::TSql => Dialect::TSql,
            Driver::Trino => Dialect::Trino,
            Driver::MySql => Dialect::MySql,
            Driver::BigQuery => Dialect::BigQuery,
            Driver::Snowflake => Dialect::Snowflake,
            Driver::Sqlite => Dialect::Sqlite,
        }
    }

    /// Driver name as used in config files and environment variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::TSql => "tsql",
            Driver::Trino => "trino",
            Driver::MySql => "mysql",
            Driver::BigQuery => "bigquery",
            Driver::Snowflake => "snowflake",
            Driver::Sqlite => "sqlite",
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Database driver.
    pub driver: Driver,
    /// Opaque connection string handed to the connector implementation.
    pub connection_string: String,
    /// Default schema for this connection.
    pub default_schema: Option<String>,
}

impl ConnectionConfig {
    pub fn new(driver: Driver, connection_string: impl Into<String>) -> Self {
        Self {
            driver,
            connection_string: connection_string.into(),
            default_schema: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `VANTAGE_DB_DRIVER`: one of the seven supported driver names
    /// - `VANTAGE_DB_CONNECTION_STRING`: connector-specific connection string
    pub fn from_env() -> Result<Self, ConnectionError> {
        let driver_str = env::var("VANTAGE_DB_DRIVER")
            .map_err(|_| ConnectionError::MissingEnvVar("VANTAGE_DB_DRIVER".to_string()))?;
        let driver = Driver::from_str(&driver_str)?;

        let connection_string = env::var("VANTAGE_DB_CONNECTION_STRING").map_err(|_| {
            ConnectionError::MissingEnvVar("VANTAGE_DB_CONNECTION_STRING".to_string())
        })?;

        let default_schema = env::var("VANTAGE_DB_SCHEMA").ok();

        Ok(Self {
            driver,
            connection_string,
            default_schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_parsing() {
        assert_eq!(Driver::from_str("postgres").unwrap(), Driver::Postgres);
        assert_eq!(Driver::from_str("sqlserver").unwrap(), Driver::TSql);
        assert_eq!(Driver::from_str("trino").unwrap(), Driver::Trino);
        assert_eq!(Driver::from_str("sqlite").unwrap(), Driver::Sqlite);
        assert!(Driver::from_str("oracle").is_err());
    }

    #[test]
    fn test_driver_dialect_mapping() {
        assert_eq!(Driver::Postgres.dialect(), Dialect::Postgres);
        assert_eq!(Driver::Sqlite.dialect(), Dialect::Sqlite);
        assert_eq!(Driver::Trino.dialect(), Dialect::Trino);
    }
}
