//! Core of the picopp source preprocessor.
//!
//! This crate rewrites line-oriented Lua sources meant for a PICO-8
//! build. The pipeline for each line is roughly:
//!
//!   raw line
//!     -> directive scanner   (if / ifn / else / endif / block fences)
//!     -> region stack        (copy or ignore, per nesting)
//!     -> comment elision     (whole-line comments only)
//!     -> call stripping      (one-line debug calls)
//!     -> output
//!
//! Higher-level tools (CLI, build scripts, etc.) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Line classification and region tracking
// ---------------------------------------------------------------------

pub mod symbols;
pub mod directive;
pub mod region;

// ---------------------------------------------------------------------
// Line elision
// ---------------------------------------------------------------------

pub mod comment;
pub mod strip;

// ---------------------------------------------------------------------
// Orchestration and in-place drivers
// ---------------------------------------------------------------------

pub mod engine;
pub mod driver;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use driver::{
    BatchOptions, BatchReport, FailurePolicy, preprocess_dir, preprocess_file, preprocess_path,
};
pub use engine::{FenceMatching, PreprocessOptions, Preprocessor, Processed, ViolationPolicy};
pub use error::{CoreError, Violation};
pub use region::RegionKind;
pub use strip::StripTable;
pub use symbols::DefinedSymbols;
