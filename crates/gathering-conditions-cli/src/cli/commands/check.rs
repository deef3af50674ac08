use gathering_conditions_core::{Cohort, ConfigResolver, ServiceConfig};

use crate::exit_codes::SUCCESS;

use super::report;

/// Validate both cohort maps the way service startup does.
pub fn run(config: &ServiceConfig) -> anyhow::Result<i32> {
    let resolver = match ConfigResolver::from_config(config, None) {
        Ok(resolver) => resolver,
        Err(err) => return Ok(report(&err)),
    };

    for cohort in [Cohort::Stable, Cohort::Canary] {
        let map = resolver.version_map(cohort);
        println!(
            "{}: {} entries ({} .. {})",
            cohort,
            map.len(),
            map.first_version(),
            map.last_version()
        );
    }
    println!("cluster maps are valid");
    Ok(SUCCESS)
}
