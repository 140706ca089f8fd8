//! Vantage CLI
//!
//! Usage:
//!   vantage model validate <model.yaml>
//!   vantage model describe <model.yaml>
//!   vantage query compile <model.yaml> <query.yaml> [--dialect <dialect>]
//!   vantage ask <model.yaml> "<question>"
//!   vantage config show

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use vantage::agents::analyst::AnalystTool;
use vantage::capability::completer::StubCompleter;
use vantage::capability::sql_connector::InMemorySqlConnector;
use vantage::config::Settings;
use vantage::model::SemanticModel;
use vantage::orchestrator::{PlanningConstraints, Supervisor};
use vantage::query::SemanticQuery;
use vantage::sql::dialect::Dialect;
use vantage::translate::compile;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Vantage - natural-language analytics: semantic models compiled to SQL, driven by a multi-agent orchestrator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or validate a semantic model
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Compile a semantic query against a model
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },
    /// Run a single orchestrator turn against stub capabilities
    Ask {
        /// Path to the semantic model YAML file
        model: PathBuf,

        /// The natural-language question
        question: String,

        /// Maximum reasoning iterations
        #[arg(long, default_value_t = 3)]
        max_iterations: u32,
    },
    /// Show the loaded configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Validate a model YAML file without compiling anything
    Validate { file: PathBuf },
    /// Describe a model's tables, dimensions, measures, and metrics
    Describe { file: PathBuf },
}

#[derive(Subcommand)]
enum QueryCommands {
    /// Compile a semantic query YAML file against a model
    Compile {
        /// Path to the model YAML file
        model: PathBuf,

        /// Path to the semantic query YAML file
        query: PathBuf,

        /// SQL dialect to generate
        #[arg(short, long, default_value = "postgres")]
        dialect: DialectArg,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings that would be loaded from the default locations
    Show,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Sqlite,
    Postgres,
    Mysql,
    Tsql,
    Trino,
    Snowflake,
    Bigquery,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Trino => Dialect::Trino,
            DialectArg::Snowflake => Dialect::Snowflake,
            DialectArg::Bigquery => Dialect::BigQuery,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Model { command } => match command {
            ModelCommands::Validate { file } => cmd_model_validate(file),
            ModelCommands::Describe { file } => cmd_model_describe(file),
        },
        Commands::Query { command } => match command {
            QueryCommands::Compile { model, query, dialect } => cmd_query_compile(model, query, dialect),
        },
        Commands::Ask { model, question, max_iterations } => cmd_ask(model, question, max_iterations),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(),
        },
    }
}

fn load_model(path: &PathBuf) -> Result<SemanticModel, ExitCode> {
    SemanticModel::from_yaml_file(path).map_err(|e| {
        eprintln!("error loading model '{}': {e}", path.display());
        ExitCode::FAILURE
    })
}

fn cmd_model_validate(file: PathBuf) -> ExitCode {
    match load_model(&file) {
        Ok(_) => {
            println!("OK: {} is a valid semantic model", file.display());
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

fn cmd_model_describe(file: PathBuf) -> ExitCode {
    let model = match load_model(&file) {
        Ok(m) => m,
        Err(code) => return code,
    };

    println!("Model: {}", model.name.as_deref().unwrap_or("(unnamed)"));
    if let Some(description) = &model.description {
        println!("  {description}");
    }
    println!();

    println!("Tables:");
    let mut table_names: Vec<&String> = model.tables.keys().collect();
    table_names.sort();
    for name in table_names {
        let table = &model.tables[name];
        println!("  - {name} (table: {})", table.qualified_name());
        for dimension in &table.dimensions {
            println!("      dimension {}", dimension.name);
        }
        for measure in &table.measures {
            println!("      measure   {}", measure.name);
        }
    }

    if !model.relationships.is_empty() {
        println!();
        println!("Relationships:");
        for rel in &model.relationships {
            println!("  - {} -> {} ({:?})", rel.from_table, rel.to_table, rel.relationship_type);
        }
    }

    if !model.metrics.is_empty() {
        println!();
        println!("Metrics:");
        let mut metric_names: Vec<&String> = model.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            println!("  - {name}");
        }
    }

    ExitCode::SUCCESS
}

fn cmd_query_compile(model_path: PathBuf, query_path: PathBuf, dialect: DialectArg) -> ExitCode {
    let model = match load_model(&model_path) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let query_source = match fs::read_to_string(&query_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading query '{}': {e}", query_path.display());
            return ExitCode::FAILURE;
        }
    };

    let query: SemanticQuery = match serde_yaml::from_str(&query_source) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error parsing query '{}': {e}", query_path.display());
            return ExitCode::FAILURE;
        }
    };

    match compile(&model, &query, dialect.into()) {
        Ok(sql) => {
            println!("{sql}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("compilation error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_ask(model_path: PathBuf, question: String, max_iterations: u32) -> ExitCode {
    let model = match load_model(&model_path) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error starting async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dialect = model.dialect.unwrap_or_default();
    let completer = Arc::new(StubCompleter::new("```sql\nSELECT 1\n```"));
    let connector = Arc::new(InMemorySqlConnector::new(dialect));
    let analyst = Arc::new(AnalystTool::new(completer, connector, model, "cli_model"));
    let supervisor = Supervisor::new(analyst, max_iterations);

    let constraints = PlanningConstraints {
        max_steps: 4,
        prefer_low_latency: false,
        require_viz_when_chartable: false,
        allow_sql_analyst: true,
        allow_web_search: true,
        allow_deep_research: true,
        timebox_seconds: None,
        cost_sensitivity: 0.0,
    };

    let result = runtime.block_on(async {
        supervisor
            .run(&question, constraints, || {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0)
            })
            .await
    });

    println!("{}", result.summary);
    for diagnostic in &result.diagnostics {
        tracing::debug!(diagnostic, "orchestrator diagnostic");
    }
    if let Some(value) = &result.result {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }

    ExitCode::SUCCESS
}

fn cmd_config_show() -> ExitCode {
    match Settings::load() {
        Ok(settings) => {
            match toml::to_string_pretty(&settings) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("error serializing settings: {e}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error loading config: {e}");
            ExitCode::FAILURE
        }
    }
}
