//! Job list resolution.
//!
//! Turns command-line arguments (or the built-in job list) into an ordered
//! sequence of [`JobItem`]s whose output and log paths are derived from the
//! run id:
//!
//! ```text
//! notebooks/regression.ipynb
//!   -> outputs/executed/regression_executed_20240101_120000.ipynb
//!   -> logs/regression_20240101_120000.log
//! ```

use bb_protocol::job_models::{JobItem, JobSpec, Parameters, RunId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Extension of job inputs collected from directory arguments.
pub const DEFAULT_JOB_EXTENSION: &str = "ipynb";

/// Errors raised while resolving a job list.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Nothing to run: no arguments matched and the built-in list is empty.
    #[error("Invalid job list: {reason}")]
    InvalidJobList { reason: String },

    /// A directory argument could not be listed.
    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Where executed outputs and logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            log_dir: log_dir.into(),
        }
    }
}

/// `<output_dir>/<stem>_executed_<run-id>.<ext>`
pub fn output_path_for(source: &Path, output_dir: &Path, run_id: &RunId) -> PathBuf {
    let stem = file_stem(source);
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}_executed_{run_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_executed_{run_id}"),
    };
    output_dir.join(file_name)
}

/// `<log_dir>/<stem>_<run-id>.log`
pub fn log_path_for(source: &Path, log_dir: &Path, run_id: &RunId) -> PathBuf {
    log_dir.join(format!("{}_{run_id}.log", file_stem(source)))
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string())
}

/// Resolves the jobs of one run.
///
/// The built-in list is injected at construction, so callers decide where
/// it comes from (configuration file or compiled defaults).
#[derive(Debug, Clone)]
pub struct JobListResolver {
    builtin: Vec<JobSpec>,
    layout: OutputLayout,
    default_parameters: Parameters,
    extension: String,
}

impl JobListResolver {
    pub fn new(builtin: Vec<JobSpec>, layout: OutputLayout) -> Self {
        Self {
            builtin,
            layout,
            default_parameters: Parameters::new(),
            extension: DEFAULT_JOB_EXTENSION.to_string(),
        }
    }

    /// Parameters applied to every job underneath its own parameters.
    pub fn with_default_parameters(mut self, parameters: Parameters) -> Self {
        self.default_parameters = parameters;
        self
    }

    /// Extension collected when an argument names a directory.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Produce the ordered job list for `run_id`.
    ///
    /// - Explicit arguments are used in the order given. A directory expands
    ///   to its matching files sorted by name.
    /// - With no arguments, the built-in list is used in its configured order.
    /// - An argument naming a built-in job inherits that job's parameters.
    ///
    /// Paths are not checked for existence here; a missing input becomes a
    /// failed job when the runner reaches it.
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidJobList`] when the result would be empty.
    pub fn resolve<P: AsRef<Path>>(
        &self,
        explicit_args: &[P],
        run_id: &RunId,
    ) -> ResolveResult<Vec<JobItem>> {
        let specs = if explicit_args.is_empty() {
            if self.builtin.is_empty() {
                return Err(ResolveError::InvalidJobList {
                    reason: "no job paths given and the built-in job list is empty".to_string(),
                });
            }
            self.builtin.clone()
        } else {
            let mut specs = Vec::new();
            for arg in explicit_args {
                self.expand_argument(arg.as_ref(), &mut specs)?;
            }
            if specs.is_empty() {
                return Err(ResolveError::InvalidJobList {
                    reason: format!("no .{} files found in the given paths", self.extension),
                });
            }
            specs
        };

        let items: Vec<JobItem> = specs
            .iter()
            .map(|spec| self.derive_item(spec, run_id))
            .collect();

        debug!(run_id = %run_id, jobs = items.len(), "resolved job list");
        Ok(items)
    }

    /// Derive the output and log locations of one job.
    pub fn derive_item(&self, spec: &JobSpec, run_id: &RunId) -> JobItem {
        let mut parameters = self.default_parameters.clone();
        for (name, value) in &spec.parameters {
            parameters.insert(name.clone(), value.clone());
        }

        JobItem {
            source: spec.path.clone(),
            output: output_path_for(&spec.path, &self.layout.output_dir, run_id),
            log: log_path_for(&spec.path, &self.layout.log_dir, run_id),
            parameters,
        }
    }

    fn expand_argument(&self, arg: &Path, specs: &mut Vec<JobSpec>) -> ResolveResult<()> {
        if !arg.is_dir() {
            specs.push(self.spec_for(arg));
            return Ok(());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(arg).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| ResolveError::DirectoryWalk {
                path: arg.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(self.extension.as_str())
            {
                found.push(path.to_path_buf());
            }
        }
        found.sort();

        debug!(dir = %arg.display(), matched = found.len(), "expanded directory argument");
        specs.extend(found.iter().map(|path| self.spec_for(path)));
        Ok(())
    }

    fn spec_for(&self, path: &Path) -> JobSpec {
        self.builtin
            .iter()
            .find(|spec| spec.path == path)
            .cloned()
            .unwrap_or_else(|| JobSpec::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_protocol::job_models::ParamValue;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn run_id() -> RunId {
        RunId::new("20240101_120000")
    }

    fn resolver(builtin: &[&str]) -> JobListResolver {
        JobListResolver::new(
            builtin.iter().map(|p| JobSpec::new(*p)).collect(),
            OutputLayout::new("out", "logs"),
        )
    }

    #[test]
    fn test_empty_args_use_builtin_order() {
        let items = resolver(&["n/b.ipynb", "n/a.ipynb", "n/c.ipynb"])
            .resolve::<&str>(&[], &run_id())
            .expect("should resolve");

        let sources: Vec<PathBuf> = items.iter().map(|i| i.source.clone()).collect();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("n/b.ipynb"),
                PathBuf::from("n/a.ipynb"),
                PathBuf::from("n/c.ipynb")
            ]
        );
    }

    #[test]
    fn test_empty_args_and_empty_builtin_is_invalid() {
        let result = resolver(&[]).resolve::<&str>(&[], &run_id());
        assert!(matches!(result, Err(ResolveError::InvalidJobList { .. })));
    }

    #[test]
    fn test_explicit_args_keep_given_order() {
        let items = resolver(&["builtin.ipynb"])
            .resolve(&["z.ipynb", "a.ipynb"], &run_id())
            .expect("should resolve");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, PathBuf::from("z.ipynb"));
        assert_eq!(items[1].source, PathBuf::from("a.ipynb"));
    }

    #[test]
    fn test_output_and_log_naming() {
        let items = resolver(&[])
            .resolve(&["notebooks/regression.ipynb"], &run_id())
            .expect("should resolve");

        assert_eq!(
            items[0].output,
            PathBuf::from("out/regression_executed_20240101_120000.ipynb")
        );
        assert_eq!(items[0].log, PathBuf::from("logs/regression_20240101_120000.log"));
    }

    #[test]
    fn test_paths_distinct_within_a_run() {
        let items = resolver(&["a.ipynb", "b.ipynb", "c.ipynb"])
            .resolve::<&str>(&[], &run_id())
            .expect("should resolve");

        let outputs: HashSet<_> = items.iter().map(|i| i.output.clone()).collect();
        let logs: HashSet<_> = items.iter().map(|i| i.log.clone()).collect();
        assert_eq!(outputs.len(), items.len());
        assert_eq!(logs.len(), items.len());
    }

    #[test]
    fn test_run_id_keeps_runs_apart() {
        let r = resolver(&[]);
        let first = r
            .resolve(&["a.ipynb"], &RunId::new("20240101_120000"))
            .expect("should resolve");
        let second = r
            .resolve(&["a.ipynb"], &RunId::new("20240101_120001"))
            .expect("should resolve");

        assert_ne!(first[0].output, second[0].output);
        assert_ne!(first[0].log, second[0].log);
    }

    #[test]
    fn test_missing_paths_are_not_rejected() {
        let items = resolver(&[])
            .resolve(&["does/not/exist.ipynb"], &run_id())
            .expect("missing inputs are reported by the runner");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_directory_argument_expands_sorted() {
        let dir = tempdir().expect("Failed to create temp dir");
        for name in ["b.ipynb", "a.ipynb", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").expect("Failed to write");
        }
        fs::create_dir(dir.path().join(".ipynb_checkpoints")).expect("Failed to create dir");

        let items = resolver(&[])
            .resolve(&[dir.path()], &run_id())
            .expect("should resolve");

        let names: Vec<String> = items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["a.ipynb", "b.ipynb"]);
    }

    #[test]
    fn test_directory_without_matches_is_invalid() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("notes.txt"), "").expect("Failed to write");

        let result = resolver(&["x.ipynb"]).resolve(&[dir.path()], &run_id());
        assert!(matches!(result, Err(ResolveError::InvalidJobList { .. })));
    }

    #[test]
    fn test_parameters_merge_with_job_values_winning() {
        let mut defaults = Parameters::new();
        defaults.insert("seed".into(), ParamValue::Int(1));
        defaults.insert("fast".into(), ParamValue::Bool(true));

        let mut spec = JobSpec::new("a.ipynb");
        spec.parameters.insert("seed".into(), ParamValue::Int(9));

        let resolver = JobListResolver::new(vec![spec], OutputLayout::new("out", "logs"))
            .with_default_parameters(defaults);

        // Naming a built-in job explicitly keeps its parameters.
        let items = resolver
            .resolve(&["a.ipynb"], &run_id())
            .expect("should resolve");

        assert_eq!(items[0].parameters["seed"], ParamValue::Int(9));
        assert_eq!(items[0].parameters["fast"], ParamValue::Bool(true));
    }

    #[test]
    fn test_custom_extension() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("job.sh"), "").expect("Failed to write");
        fs::write(dir.path().join("other.ipynb"), "").expect("Failed to write");

        let items = resolver(&[])
            .with_extension("sh")
            .resolve(&[dir.path()], &run_id())
            .expect("should resolve");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].output.extension().and_then(|e| e.to_str()), Some("sh"));
    }
}
