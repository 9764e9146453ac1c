use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use super::demo::demo_application;
use crate::dispatcher::HandlerRequest;
use crate::ids::RequestId;
use crate::runtime_config::RuntimeConfig;

#[derive(Parser, Debug)]
#[command(name = "stackroute")]
#[command(about = "Route-collection and middleware-dispatch engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "STACKROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dotenv file layered over the TOML configuration
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the demo application's route table
    Routes {
        /// Emit JSON instead of one line per route
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch one request against the demo application
    Request {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, e.g. /users/1
        path: String,
        /// Header as `name:value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Query parameter as `name=value`, repeatable
        #[arg(short, long = "query")]
        query: Vec<String>,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// Configuration, argument or dispatch failures.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

/// Run a parsed command, writing its output to `out`.
///
/// # Errors
///
/// Configuration, argument or dispatch failures.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = RuntimeConfig::load(cli.config.as_deref(), cli.env_file.as_deref())
        .context("failed to load configuration")?;
    let app = demo_application(config)?;

    match cli.command {
        Commands::Routes { json } => {
            if json {
                serde_json::to_writer_pretty(&mut *out, &app.route_table())?;
                writeln!(out)?;
            } else {
                for line in app.registry().route_lines() {
                    writeln!(out, "{line}")?;
                }
            }
        }
        Commands::Request {
            method,
            path,
            headers,
            query,
            body,
        } => {
            let req = build_request(&method, &path, &headers, &query, body.as_deref())?;
            let res = app.handle(req)?;
            let headers: Map<String, Value> = res
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
            let rendered = json!({
                "status": res.status,
                "headers": headers,
                "body": res.body,
            });
            serde_json::to_writer_pretty(&mut *out, &rendered)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub(crate) fn build_request(
    method: &str,
    path: &str,
    headers: &[String],
    query: &[String],
    body: Option<&str>,
) -> anyhow::Result<HandlerRequest> {
    let (path, inline_query) = path.split_once('?').unwrap_or((path, ""));
    let mut req = HandlerRequest::from_parts(method, path)
        .with_context(|| format!("invalid HTTP method '{method}'"))?;

    for header in headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header '{header}' must look like name:value");
        };
        req = req.with_header(name.trim(), value.trim());
    }
    let request_id = RequestId::from_header_or_new(req.get_header("x-request-id"));
    req = req.with_request_id(request_id);

    let pairs = inline_query
        .split('&')
        .filter(|p| !p.is_empty())
        .chain(query.iter().map(String::as_str));
    for pair in pairs {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        req = req.with_query_param(name, value);
    }

    if let Some(body) = body {
        let body: Value = serde_json::from_str(body).context("request body is not valid JSON")?;
        req = req.with_body(body);
    }
    Ok(req)
}
