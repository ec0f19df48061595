//! In-place file and directory preprocessing.
//!
//! Files are rewritten through a temporary file in the same directory that
//! is persisted over the original only once the whole file was processed,
//! so a malformed file is never left truncated.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, error, info, info_span};
use walkdir::WalkDir;

use crate::engine::Preprocessor;
use crate::error::CoreError;
use crate::symbols::DefinedSymbols;

/// Extension of the source files picked up by directory runs.
pub const DEFAULT_EXTENSION: &str = "lua";

/// What a directory run does when one file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing file.
    #[default]
    Halt,
    /// Record the failure and continue with the next file.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub extension: String,
    pub on_failure: FailurePolicy,
    /// Descend into symlinked directories and process symlinked files.
    pub follow_links: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            extension: DEFAULT_EXTENSION.to_string(),
            on_failure: FailurePolicy::default(),
            follow_links: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, CoreError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Preprocess a single file in place.
pub fn preprocess_file(
    path: impl AsRef<Path>,
    symbols: &DefinedSymbols,
    preprocessor: &Preprocessor,
) -> Result<(), CoreError> {
    let path = path.as_ref();
    // Engine events (tolerated violations) carry the file through this span.
    let _span = info_span!("file", path = %path.display()).entered();
    debug!("preprocessing file");

    let source = fs::read_to_string(path).map_err(|err| CoreError::io(path, err))?;
    let processed = preprocessor.process_lines(source.split_inclusive('\n'), symbols)?;
    replace_contents(path, processed.text().as_bytes())
}

/// Preprocess every file under `root` with the configured extension.
pub fn preprocess_dir(
    root: impl AsRef<Path>,
    symbols: &DefinedSymbols,
    preprocessor: &Preprocessor,
    options: &BatchOptions,
) -> Result<BatchReport, CoreError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(CoreError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut report = BatchReport::default();
    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let err = CoreError::io(path.clone(), err.into());
                record_failure(&mut report, options.on_failure, path, err)?;
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, &options.extension) {
            continue;
        }

        match preprocess_file(path, symbols, preprocessor) {
            Ok(()) => report.processed.push(path.to_path_buf()),
            Err(err) => {
                let err = CoreError::InFile {
                    path: path.to_path_buf(),
                    source: Box::new(err),
                };
                record_failure(&mut report, options.on_failure, path.to_path_buf(), err)?;
            }
        }
    }

    info!(
        root = %root.display(),
        processed = report.processed.len(),
        failed = report.failed.len(),
        "preprocessed directory"
    );
    Ok(report)
}

/// Preprocess `path` as a single file, or as a directory tree.
pub fn preprocess_path(
    path: impl AsRef<Path>,
    symbols: &DefinedSymbols,
    preprocessor: &Preprocessor,
    options: &BatchOptions,
) -> Result<BatchReport, CoreError> {
    let path = path.as_ref();
    if path.is_dir() {
        return preprocess_dir(path, symbols, preprocessor, options);
    }
    preprocess_file(path, symbols, preprocessor).map_err(|err| CoreError::InFile {
        path: path.to_path_buf(),
        source: Box::new(err),
    })?;
    Ok(BatchReport {
        processed: vec![path.to_path_buf()],
        failed: Vec::new(),
    })
}

/// Apply the failure policy: hand the error back under `Halt`, record it
/// under `Skip`.
fn record_failure(
    report: &mut BatchReport,
    policy: FailurePolicy,
    path: PathBuf,
    err: CoreError,
) -> Result<(), CoreError> {
    match policy {
        FailurePolicy::Halt => Err(err),
        FailurePolicy::Skip => {
            error!(path = %path.display(), error = %err, "failed to preprocess, skipping");
            report.failed.push((path, err));
            Ok(())
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn replace_contents(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)
        .map_err(|err| CoreError::io(path, err))?
        .permissions();

    let mut temp = NamedTempFile::new_in(directory).map_err(|err| CoreError::io(directory, err))?;
    temp.write_all(contents)
        .map_err(|err| CoreError::io(temp.path(), err))?;
    fs::set_permissions(temp.path(), permissions)
        .map_err(|err| CoreError::io(temp.path(), err))?;
    temp.persist(path)
        .map_err(|err| CoreError::io(path, err.error))?;
    Ok(())
}
