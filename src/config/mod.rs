//! Configuration: connection settings, worker/logging/planner settings.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, Driver};
pub use settings::{
    expand_env_vars, ConnectionSettings, LoggingSettings, PlannerSettings, Settings,
    SettingsError, WorkerSettings,
};
