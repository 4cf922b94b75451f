mod cli;
mod reporters;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, Outcome, TargetArgs};
use reporters::Reporters;
use scorecard_status::policy;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.verbose.tracing_level_filter().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Run { target, command } => run(&target, &command).await,
        Command::Report { target, outcome } => {
            report(&target, outcome).await.map(|()| ExitCode::SUCCESS)
        }
        Command::Policy { file } => show_policy(&file).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(target: &TargetArgs, command: &[String]) -> Result<ExitCode> {
    let mut reporters = Reporters::new(target);
    reporters.start(target).await?;

    let (program, args) = command.split_first().context("no command given")?;
    debug!(%program, ?args, "spawning scan");
    let status = match tokio::process::Command::new(program).args(args).status().await {
        Ok(status) => status,
        Err(e) => {
            let spawn_error = anyhow::Error::from(e).context(format!("failed to run {program}"));
            if let Err(report_error) = reporters.finish(Outcome::Failure).await {
                let detail = format!("{report_error:#}");
                warn!(error = %detail, "failed to report spawn failure");
            }
            return Err(spawn_error);
        }
    };

    let outcome = if status.success() {
        Outcome::Success
    } else {
        Outcome::Failure
    };
    info!(%status, ?outcome, "scan finished");
    reporters.finish(outcome).await?;

    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

async fn report(target: &TargetArgs, outcome: Outcome) -> Result<()> {
    let mut reporters = Reporters::new(target);
    reporters.start(target).await?;
    reporters.finish(outcome).await
}

fn show_policy(file: &str) -> Result<()> {
    let Some(policy) = policy::load_from_file(file)? else {
        println!("no policy configured");
        return Ok(());
    };

    println!("version: {}", policy.version);
    for (check, criterion) in &policy.criteria {
        println!("{check}: mode={} score={}", criterion.mode, criterion.score);
    }
    Ok(())
}
