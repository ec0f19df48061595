use std::path::PathBuf;

use thiserror::Error;

use crate::region::RegionKind;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {violation}")]
    Structural { line: usize, violation: Violation },
    #[error(
        "file ended inside a block of region type {kind} opened at line {opened_at}; make sure the last region is closed"
    )]
    UnterminatedRegion { kind: RegionKind, opened_at: usize },
    #[error("failed to build the stripped-call pattern: {0}")]
    StripPattern(#[from] regex::Error),
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Strip any `InFile` wrappers and return the underlying error.
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Structural violation detected at a single directive line.
///
/// `found` is the kind of the innermost open region at the time of the
/// violation, or `None` when the stack was empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("an --#else was encountered outside an --#if(n) block (innermost region: {})", describe(.found))]
    ElseOutsideIf { found: Option<RegionKind> },
    #[error("an --#endif was encountered outside an --#if(n)/else block (innermost region: {})", describe(.found))]
    EndifOutsideIf { found: Option<RegionKind> },
    #[error("a target-only block end was encountered outside a target-only block (innermost region: {})", describe(.found))]
    BlockCloseOutsideBlock { found: Option<RegionKind> },
    #[error("a target-only block start was encountered inside a target-only block")]
    NestedBlock,
    #[error("target-only block opened with fence width {opened} but closed with width {closed}")]
    FenceWidthMismatch { opened: usize, closed: usize },
}

fn describe(kind: &Option<RegionKind>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "none".to_string(),
    }
}
