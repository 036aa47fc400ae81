use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use lexis_builder::{BucketOutcome, BuildPlan, Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let options = Cli::parse().into_options()?;
    info!(
        "using source at {} (mode: {:?})",
        options.source.display(),
        options.load_mode
    );
    info!("writing to {}", options.render.out_dir.display());
    match &options.plan {
        BuildPlan::Sample { percent } => info!("sampling first {percent}% of headwords"),
        BuildPlan::Buckets { scheme, only } => match only {
            Some(index) => info!("building bucket {} of {}", index + 1, scheme.len()),
            None => info!("building {} buckets", scheme.len()),
        },
    }
    if let Some(converter) = &options.render.converter {
        info!(
            "converter: {} (timeout {} s)",
            converter.program,
            converter.timeout.as_secs()
        );
    }

    let summary = run(&options).await?;
    for report in &summary.reports {
        let label = report.label.as_deref().unwrap_or("-");
        let n = report.index + 1;
        match &report.outcome {
            BucketOutcome::Written(path) | BucketOutcome::Converted(path) => info!(
                "bucket {n} [{label}]: {} headwords -> {}",
                report.headwords,
                path.display()
            ),
            BucketOutcome::TimedOut(after) => {
                warn!("bucket {n} [{label}]: converter timed out after {after:?}")
            }
            BucketOutcome::Failed(err) => error!("bucket {n} [{label}]: {err}"),
        }
    }

    if summary.all_failed() {
        error!("every bucket failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
