use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use vdl::cli::Args;
use vdl::config::EngineConfig;
use vdl::logging;

fn main() -> Result<ExitCode> {
    logging::init_logging();
    let args = Args::parse();

    let config = EngineConfig::load_or_default(args.config.as_deref())?;
    let download_folder = args.download_folder()?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(async {
        vdl::commands::run_downloads(&args.file, &download_folder, config, !args.no_progress).await
    })?;
    drop(rt);

    Ok(ExitCode::from(summary.exit_code()))
}
