use clap::{Parser, Subcommand};
use gathering_conditions_core::Cohort;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gathering-conditions",
    version,
    about = "Serve gathering rules and remote configurations selected by OCP version and rollout cohort"
)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "GATHERING_CONDITIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the stable and canary cluster maps
    Check,
    /// Print the gathering rules a client would receive
    Rules(RulesArgs),
    /// Print the remote configuration a client would receive
    RemoteConfig(RemoteConfigArgs),
    /// Print the artifact a cohort's cluster map selects for a version
    Resolve(ResolveArgs),
    /// Replay requests and print the resulting Prometheus counters
    Metrics(MetricsArgs),
    /// Inspect the effective configuration
    Config(ConfigArgs),
    Version,
}

#[derive(Parser, Debug)]
pub struct RulesArgs {
    /// User-Agent header of the simulated request
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RemoteConfigArgs {
    #[arg(long)]
    pub ocp_version: String,

    /// User-Agent header of the simulated request
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[arg(long)]
    pub ocp_version: String,

    #[arg(long, default_value = "stable")]
    pub cohort: Cohort,
}

#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// OCP version of one simulated request (repeatable)
    #[arg(long = "ocp-version", required = true)]
    pub ocp_versions: Vec<String>,

    /// User-Agent header shared by every simulated request
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigSub,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSub {
    /// Print the configuration after file and environment overrides
    Show,
}
