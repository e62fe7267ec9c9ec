//! `tabula`: run one table data request against a SQLite database
//!
//! ```text
//! tabula --database data.db --table items --sort price --format table
//! tabula --database data.db --request request.json
//! ```

mod logging;
mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tabula_query::{SortOrder, TableDataRequest};
use tabula_services::{EngineConfig, LocalEngine, ServiceEngine, TableDataEngine};

use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// One in-process handle
    Local,
    /// Warm connection and response caches
    Service,
}

#[derive(Debug, Parser)]
#[command(name = "tabula", version, about = "Page, filter and aggregate SQLite tables")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "TABULA_DATABASE")]
    database: String,

    /// JSON request file (`-` reads stdin)
    #[arg(short, long, conflicts_with = "table")]
    request: Option<PathBuf>,

    /// Table to read when no request file is given
    #[arg(short, long, required_unless_present = "request")]
    table: Option<String>,

    /// Sort column (with --table)
    #[arg(long, requires = "table")]
    sort: Option<String>,

    /// Sort descending (with --sort)
    #[arg(long, requires = "sort")]
    desc: bool,

    #[arg(long, requires = "table")]
    limit: Option<u64>,

    #[arg(long, requires = "table")]
    offset: Option<u64>,

    /// Free-text search across all columns (with --table)
    #[arg(long, requires = "table")]
    search: Option<String>,

    /// Engine configuration (TOML)
    #[arg(short, long, env = "TABULA_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EngineKind::Local)]
    engine: EngineKind,

    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// More logging; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    fn table_request(&self) -> Result<TableDataRequest> {
        if let Some(path) = &self.request {
            let body = if path.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("reading request from stdin")?
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading request {}", path.display()))?
            };
            return serde_json::from_str(&body).context("parsing request JSON");
        }

        let Some(table) = &self.table else {
            bail!("either --request or --table is required");
        };
        let mut request = TableDataRequest::new(table.as_str());
        if let Some(column) = &self.sort {
            let order = if self.desc { SortOrder::Desc } else { SortOrder::Asc };
            request = request.with_sort(column.as_str(), order);
        }
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        if let Some(offset) = self.offset {
            request = request.with_offset(offset);
        }
        if let Some(search) = &self.search {
            request = request.with_search(search.as_str());
        }
        Ok(request)
    }

    fn open_engine(&self, config: EngineConfig) -> Result<Box<dyn TableDataEngine>> {
        Ok(match self.engine {
            EngineKind::Local => Box::new(
                LocalEngine::open(&self.database, config)
                    .with_context(|| format!("opening {}", self.database))?,
            ),
            EngineKind::Service => Box::new(ServiceEngine::new(self.database.clone(), config)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = logging::init(LoggingConfig::for_verbosity(cli.verbose))?;

    let config = cli.engine_config()?;
    let request = cli.table_request()?;
    let engine = cli.open_engine(config)?;

    match engine.table_data(&request).await {
        Ok(response) => {
            let rendered = match cli.format {
                Format::Json => output::json(&response)?,
                Format::Table => output::table(&response),
            };
            println!("{}", rendered);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "request failed");
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
