//! # CLI Module
//!
//! Command-line access to a demo application built with the engine.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table, one line per dispatch unit (or JSON with `--json`):
//!
//! ```bash
//! stackroute routes
//! stackroute routes --json
//! ```
//!
//! ### `request`
//!
//! Dispatch a single request and print the response as JSON:
//!
//! ```bash
//! stackroute request GET /users/1
//! stackroute request POST /users --body '{"name":"linus"}'
//! stackroute request GET /admin/stats -H 'authorization: Bearer letmein'
//! ```
//!
//! ## Global Options
//!
//! - `--config <FILE>` - TOML file for [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)
//! - `--env-file <FILE>` - dotenv file layered over it
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use stackroute::cli::{run, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run(cli, &mut std::io::stdout())?;
//! ```

mod commands;
mod demo;


pub use commands::{run, run_cli, Cli, Commands};
pub use demo::{demo_application, DEMO_ADMIN_TOKEN};
