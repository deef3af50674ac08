use super::args::*;

pub mod check;
pub mod config;
pub mod metrics;
pub mod resolve;

use gathering_conditions_core::{ErrorResponse, ServiceConfig, ServiceError};

use crate::exit_codes::SUCCESS;
use crate::logging;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let mut config = match ServiceConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return Ok(report(&err)),
    };
    if cli.log_json {
        config.logging.json = true;
    }
    logging::init(&config.logging);

    match cli.cmd {
        Command::Check => check::run(&config),
        Command::Rules(args) => resolve::rules(&config, args),
        Command::RemoteConfig(args) => resolve::remote_config(&config, args),
        Command::Resolve(args) => resolve::artifact(&config, args),
        Command::Metrics(args) => metrics::run(&config, args),
        Command::Config(args) => match args.cmd {
            ConfigSub::Show => config::show(&config),
        },
        Command::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Print a service error as an error response body and pick the exit code.
pub(crate) fn report(err: &ServiceError) -> i32 {
    tracing::error!(kind = ?err.kind(), status = err.http_status(), "{}", err);
    match serde_json::to_string(&ErrorResponse::from(err)) {
        Ok(body) => eprintln!("{}", body),
        Err(_) => eprintln!("{}", err),
    }
    err.exit_code()
}
