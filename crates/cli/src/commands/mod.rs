//! Command handlers. Each returns the process exit code.

mod background;
mod download;
mod init;
mod run;

use crate::cli::{Cli, Commands};
use bb_core::config::loader::load_config_dir;
use bb_core::config::models::AppConfig;
use colored::Colorize;
use color_eyre::Result;
use std::fmt::Display;

/// A precondition was not met; nothing was executed.
pub const EXIT_PRECONDITION: i32 = 2;

/// Interrupted with Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Terminated by SIGTERM, e.g. from `batchbook stop`.
pub const EXIT_TERMINATED: i32 = 143;

pub async fn dispatch(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Run { paths, opts } => run::execute(&cli, paths, opts).await,
        Commands::RunAll { opts } => run::execute(&cli, &[], opts).await,
        Commands::Start { paths, opts } => background::start(&cli, paths, opts).await,
        Commands::Stop => background::stop(&cli).await,
        Commands::Status { lines } => background::status(&cli, *lines).await,
        Commands::Download => download::execute(&cli).await,
        Commands::Init {
            dir,
            force,
            minimal,
        } => init::execute(dir, *force, *minimal).await,
    }
}

/// Report a failed precondition and return its exit code.
pub fn precondition(message: impl Display) -> i32 {
    eprintln!("{} {message}", "error:".red().bold());
    EXIT_PRECONDITION
}

/// Load the configuration named by `--config-dir`.
pub async fn load(cli: &Cli) -> std::result::Result<AppConfig, i32> {
    load_config_dir(&cli.config_dir)
        .await
        .map_err(precondition)
}
