use stackroute::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut log_config = LogConfig::from_env();
    // Keep stdout readable unless the caller asked for more.
    if std::env::var("STACKROUTE_LOG_LEVEL").is_err() {
        log_config.log_level = "warn".to_string();
    }
    init_logging_with_config(&log_config)?;

    stackroute::cli::run_cli()
}
