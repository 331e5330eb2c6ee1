use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// Refusing to overwrite without `--force`.
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    DirectoryExists(PathBuf),

    /// The binary was built without this template.
    #[error("No embedded template named {0}")]
    TemplateNotFound(String),

    #[error("Cannot create {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
