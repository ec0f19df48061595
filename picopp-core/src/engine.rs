//! Per-line preprocessing loop.
//!
//! Lines stream through the directive scanner and the region stack. Lines
//! admitted in accepted mode then go through comment elision and
//! diagnostic call stripping before reaching the output. Directive lines
//! themselves are never emitted.
//!
//! A `Preprocessor` holds configuration and the stripped-call pattern
//! cache only. The region stack is created for each run, so one instance
//! can process any number of files and symbol sets.

use tracing::warn;

use crate::comment::is_full_comment_line;
use crate::directive::{DEFAULT_TARGET_TAG, Directive, DirectiveScanner};
use crate::error::{CoreError, Violation};
use crate::region::{ParsingMode, RegionKind, RegionStack};
use crate::strip::{StatementStripper, StripTable};
use crate::symbols::DefinedSymbols;

/// What to do when the region structure is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationPolicy {
    /// Abort the current input on the first violation.
    #[default]
    Strict,
    /// Log the violation, skip the offending directive and continue.
    Lenient,
}

/// How target-only block fences are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceMatching {
    /// Open and close fences must have the same number of `=`.
    #[default]
    Exact,
    /// Any close fence ends the block.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub policy: ViolationPolicy,
    pub fence_matching: FenceMatching,
    pub target_tag: String,
    /// Drop whitespace-only lines in accepted regions.
    pub strip_blank_lines: bool,
    pub strip_table: StripTable,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        PreprocessOptions {
            policy: ViolationPolicy::default(),
            fence_matching: FenceMatching::default(),
            target_tag: DEFAULT_TARGET_TAG.to_string(),
            strip_blank_lines: false,
            strip_table: StripTable::default(),
        }
    }
}

/// Output of a single run.
///
/// `warnings` is only ever non-empty under the lenient policy.
#[derive(Debug, Default)]
pub struct Processed {
    pub lines: Vec<String>,
    pub warnings: Vec<CoreError>,
}

impl Processed {
    pub fn text(&self) -> String {
        self.lines.concat()
    }
}

#[derive(Debug, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
    scanner: DirectiveScanner,
    stripper: StatementStripper,
}

impl Preprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        let scanner = DirectiveScanner::new(options.target_tag.clone());
        let stripper = StatementStripper::new(options.strip_table.clone());
        Preprocessor {
            options,
            scanner,
            stripper,
        }
    }

    pub fn stripper(&self) -> &StatementStripper {
        &self.stripper
    }

    /// Preprocess a whole source string, keeping line terminators.
    pub fn process_str(&self, source: &str, symbols: &DefinedSymbols) -> Result<String, CoreError> {
        self.process_lines(source.split_inclusive('\n'), symbols)
            .map(|processed| processed.text())
    }

    /// Apply directives, comment elision and call stripping to `lines`.
    ///
    /// Each line is expected to carry its own terminator; emitted lines are
    /// copied verbatim.
    pub fn process_lines<I, S>(
        &self,
        lines: I,
        symbols: &DefinedSymbols,
    ) -> Result<Processed, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stack = RegionStack::new();
        let mut processed = Processed::default();

        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let line_number = index + 1;

            match self.scanner.scan(line) {
                Directive::IfOpen {
                    symbol,
                    alternative,
                } => {
                    stack.open_conditional(RegionKind::If, line_number, || {
                        symbols.contains(&symbol)
                            || alternative
                                .as_deref()
                                .is_some_and(|alternative| symbols.contains(alternative))
                    });
                }
                Directive::IfnOpen { symbol } => {
                    stack.open_conditional(RegionKind::IfNegated, line_number, || {
                        !symbols.contains(&symbol)
                    });
                }
                Directive::ElseSwitch => {
                    if let Err(violation) = stack.switch_else(line_number) {
                        self.tolerate(line_number, violation, &mut processed)?;
                    }
                }
                Directive::RegionClose => {
                    if let Err(violation) = stack.close_conditional() {
                        self.tolerate(line_number, violation, &mut processed)?;
                    }
                }
                Directive::BlockOpen { fence_width } => {
                    if let Err(violation) = stack.check_block_open() {
                        self.tolerate(line_number, violation, &mut processed)?;
                    }
                    stack.open_block(fence_width, line_number);
                }
                Directive::BlockClose { fence_width } => match stack.close_block() {
                    Ok(block) => {
                        let opened = block.fence_width.unwrap_or(fence_width);
                        if self.options.fence_matching == FenceMatching::Exact
                            && opened != fence_width
                        {
                            let violation = Violation::FenceWidthMismatch {
                                opened,
                                closed: fence_width,
                            };
                            self.tolerate(line_number, violation, &mut processed)?;
                        }
                    }
                    Err(violation) => self.tolerate(line_number, violation, &mut processed)?,
                },
                Directive::Ordinary => {
                    if stack.mode() == ParsingMode::Accepted && self.admits(line, symbols)? {
                        processed.lines.push(line.to_string());
                    }
                }
            }
        }

        if let Err(err) = stack.finish() {
            match self.options.policy {
                ViolationPolicy::Strict => return Err(err),
                ViolationPolicy::Lenient => {
                    warn!(error = %err, "input ended with an open region");
                    processed.warnings.push(err);
                }
            }
        }

        Ok(processed)
    }

    fn admits(&self, line: &str, symbols: &DefinedSymbols) -> Result<bool, CoreError> {
        if self.options.strip_blank_lines && line.trim().is_empty() {
            return Ok(false);
        }
        if is_full_comment_line(line) {
            return Ok(false);
        }
        Ok(!self.stripper.should_strip(line, symbols)?)
    }

    fn tolerate(
        &self,
        line: usize,
        violation: Violation,
        processed: &mut Processed,
    ) -> Result<(), CoreError> {
        let err = CoreError::Structural { line, violation };
        match self.options.policy {
            ViolationPolicy::Strict => Err(err),
            ViolationPolicy::Lenient => {
                warn!(line, error = %err, "skipping malformed directive");
                processed.warnings.push(err);
                Ok(())
            }
        }
    }
}
