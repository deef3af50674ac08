use anyhow::Context;
use gathering_conditions_core::ServiceConfig;

use crate::exit_codes::SUCCESS;

pub fn show(config: &ServiceConfig) -> anyhow::Result<i32> {
    let out = serde_json::to_string_pretty(config).context("failed to encode configuration")?;
    println!("{}", out);
    Ok(SUCCESS)
}
