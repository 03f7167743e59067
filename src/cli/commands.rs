//! CLI command implementations
//!
//! Each command loads the catalog (and optionally config and rows), reads
//! one request from stdin and writes one response to stdout. Failures to
//! load inputs abort the process; a rejected request produces an error
//! response.

use std::path::Path;

use serde_json::{json, Value};
use tracing::warn;

use crate::config::PlannerConfig;
use crate::executor::MemoryDatabase;
use crate::planner::{ExplainPlan, PlannedQuery, QueryAssembler};
use crate::schema::Catalog;

use super::args::{Command, Inputs};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};
use super::request::PageQuery;

/// What to do with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plan,
    Explain,
    Run,
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Plan { inputs } => serve_one(Mode::Plan, &inputs, None),
        Command::Explain { inputs } => serve_one(Mode::Explain, &inputs, None),
        Command::Run { inputs, data } => serve_one(Mode::Run, &inputs, Some(&data)),
    }
}

fn serve_one(mode: Mode, inputs: &Inputs, data: Option<&Path>) -> CliResult<()> {
    let catalog = Catalog::load(&inputs.catalog)?;
    let config = load_config(inputs.config.as_deref())?;
    let db = data
        .map(|path| MemoryDatabase::load(&catalog, path))
        .transpose()?;

    let request = read_request()?;
    match respond(mode, &request, &catalog, &config, db.as_ref()) {
        Ok(data) => write_response(data),
        Err(err) => {
            warn!(code = err.code(), error = %err, "request rejected");
            write_error(err.code(), &err.to_string())
        }
    }
}

/// Reads the planner config, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> CliResult<PlannerConfig> {
    match path {
        Some(path) => PlannerConfig::load(path).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(PlannerConfig::default()),
    }
}

/// Produces the response data for one request
pub fn respond(
    mode: Mode,
    request: &Value,
    catalog: &Catalog,
    config: &PlannerConfig,
    db: Option<&MemoryDatabase<'_>>,
) -> CliResult<Value> {
    let planned = PageQuery::from_value(request).and_then(|query| plan(&query, catalog, config));

    match mode {
        Mode::Plan => Ok(serde_json::to_value(planned?)?),
        Mode::Explain => {
            let explain = match planned {
                Ok(planned) => ExplainPlan::from_planned(&planned),
                Err(CliError::Plan(err)) => ExplainPlan::from_error(&err),
                Err(err) => return Err(err),
            };
            Ok(json!({
                "explain": serde_json::to_value(&explain)?,
                "text": explain.to_string(),
            }))
        }
        Mode::Run => {
            let planned = planned?;
            let db = db.ok_or_else(|| CliError::request("no data loaded"))?;
            Ok(serde_json::to_value(db.run(&planned)?)?)
        }
    }
}

fn plan(query: &PageQuery, catalog: &Catalog, config: &PlannerConfig) -> CliResult<PlannedQuery> {
    Ok(QueryAssembler::new(catalog, config).assemble(
        &query.entity,
        &query.filter,
        &query.order,
        &query.permissions,
        &query.page,
        &query.caller,
    )?)
}
