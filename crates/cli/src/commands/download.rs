//! `download`: fetch the configured datasets with the kaggle CLI.

use super::{load, precondition};
use crate::cli::Cli;
use crate::render;
use bb_core::datasets::{check_credentials, download_all, KaggleCli};
use bb_protocol::run_models::EXIT_SUCCESS;
use color_eyre::Result;
use tracing::debug;

pub async fn execute(cli: &Cli) -> Result<i32> {
    let config = match load(cli).await {
        Ok(config) => config,
        Err(code) => return Ok(code),
    };

    if config.datasets.is_empty() {
        println!("No datasets configured");
        return Ok(EXIT_SUCCESS);
    }

    let credentials = match check_credentials() {
        Ok(credentials) => credentials,
        Err(e) => return Ok(precondition(e)),
    };
    debug!(?credentials, "kaggle credentials found");

    let source = KaggleCli::new();
    if which::which(source.program()).is_err() {
        return Ok(precondition(format!(
            "'{}' was not found on PATH; install it with `pip install kaggle`",
            source.program()
        )));
    }

    let verbosity = cli.verbosity(config.global.verbosity);
    let summary = download_all(&source, &config.datasets, |progress| {
        render::render_download(&progress, verbosity);
    })
    .await;

    render::print_download_summary(&summary);
    Ok(summary.exit_code())
}
