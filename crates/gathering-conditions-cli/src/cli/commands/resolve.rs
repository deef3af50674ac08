//! Offline resolution commands. Each one builds the resolver exactly as the
//! service does and prints what a request would receive.

use anyhow::Context;
use gathering_conditions_core::{ConfigResolver, RequestContext, ServiceConfig, ServiceResult};
use serde::Serialize;

use crate::cli::args::{RemoteConfigArgs, ResolveArgs, RulesArgs};
use crate::exit_codes::SUCCESS;

use super::report;

pub fn rules(config: &ServiceConfig, args: RulesArgs) -> anyhow::Result<i32> {
    let request = request_from(args.user_agent);
    with_resolver(config, |resolver| resolver.rules(&request))
}

pub fn remote_config(config: &ServiceConfig, args: RemoteConfigArgs) -> anyhow::Result<i32> {
    let request = request_from(args.user_agent);
    with_resolver(config, |resolver| {
        resolver.remote_configuration(&request, &args.ocp_version)
    })
}

pub fn artifact(config: &ServiceConfig, args: ResolveArgs) -> anyhow::Result<i32> {
    with_resolver(config, |resolver| {
        resolver
            .resolve_artifact(args.cohort, &args.ocp_version)
            .map(|path| path.display().to_string())
    })
}

fn request_from(user_agent: Option<String>) -> RequestContext {
    RequestContext { user_agent }
}

fn with_resolver<T, F>(config: &ServiceConfig, op: F) -> anyhow::Result<i32>
where
    T: Serialize,
    F: FnOnce(&ConfigResolver) -> ServiceResult<T>,
{
    let result = ConfigResolver::from_config(config, None).and_then(|resolver| op(&resolver));
    match result {
        Ok(value) => {
            let out = serde_json::to_string_pretty(&value).context("failed to encode response")?;
            println!("{}", out);
            Ok(SUCCESS)
        }
        Err(err) => Ok(report(&err)),
    }
}
