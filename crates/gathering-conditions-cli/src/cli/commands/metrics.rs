use anyhow::Context;
use gathering_conditions_core::{ConfigResolver, RequestContext, ServiceConfig};
use tracing::warn;

use crate::cli::args::MetricsArgs;
use crate::exit_codes::SUCCESS;

use super::report;

/// Failed requests are skipped, so they never show up in the counters.
pub fn run(config: &ServiceConfig, args: MetricsArgs) -> anyhow::Result<i32> {
    let resolver = match ConfigResolver::from_config(config, None) {
        Ok(resolver) => resolver,
        Err(err) => return Ok(report(&err)),
    };
    let request = RequestContext {
        user_agent: args.user_agent,
    };

    for ocp_version in &args.ocp_versions {
        if let Err(err) = resolver.remote_configuration(&request, ocp_version) {
            warn!(ocp_version = %ocp_version, error = %err, "request failed");
        }
    }

    let text = resolver
        .metrics()
        .encode_text()
        .context("failed to encode metrics")?;
    print!("{}", text);
    Ok(SUCCESS)
}
