//! `init`: write a `.batchbook/` directory from the embedded templates.

use super::precondition;
use bb_core::config::loader::CONFIG_DIR;
use bb_core::init::{generate_project_structure, InitError, InitOptions};
use bb_protocol::run_models::EXIT_SUCCESS;
use color_eyre::Result;
use colored::Colorize;
use std::path::Path;

pub async fn execute(dir: &Path, force: bool, minimal: bool) -> Result<i32> {
    let options = InitOptions {
        target_dir: dir.to_path_buf(),
        force,
        minimal,
    };

    match generate_project_structure(options).await {
        Ok(()) => {
            println!(
                "{} {}",
                "Initialized".green().bold(),
                dir.join(CONFIG_DIR).display()
            );
            println!("  config.toml  engine, kernel, timeout, failure policy");
            if !minimal {
                println!("  jobs.yaml    built-in job list and datasets");
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e @ InitError::DirectoryExists(_)) => Ok(precondition(e)),
        Err(e) => Err(e.into()),
    }
}
