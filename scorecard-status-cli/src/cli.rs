use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

use scorecard_status::Repository;
use scorecard_status::github::GITHUB_API_BASE;

/// Report a scan outcome to GitHub as a check run and/or commit status
#[derive(Parser)]
#[command(name = "scorecard-status", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a scan command and report whether it succeeded
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Command to run, after `--`
        #[arg(required = true, trailing_var_arg = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Report an outcome for a scan that ran elsewhere
    Report {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(value_enum)]
        outcome: Outcome,
    },

    /// Load a policy file and print its thresholds
    Policy {
        /// Path to the policy YAML; empty means no policy
        #[arg(default_value = "")]
        file: String,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Repository to report on, as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Repository,

    /// Commit SHA the results are pinned to
    #[arg(long, env = "GITHUB_SHA")]
    pub commit: String,

    /// GitHub token with checks:write and statuses:write
    #[arg(long, env = "GITHUB_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API_BASE)]
    pub api_url: String,

    /// Which channel to report through
    #[arg(long, value_enum, default_value_t = ReporterKind::CheckRun)]
    pub reporter: ReporterKind,

    /// Link shown next to the check run or status
    #[arg(long)]
    pub details_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReporterKind {
    CheckRun,
    Status,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Success,
    Failure,
}
