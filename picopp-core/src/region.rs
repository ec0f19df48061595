//! Region stack machine.
//!
//! Regions can be nested (an `if` inside an `if`, a conditional inside a
//! target-only block, ...) so they are kept on a stack, innermost last.
//! The stack holds at most one `Refused` region along its path: once a
//! region is refused, everything pushed above it is `Ignored` and its own
//! condition is never evaluated. This keeps the stack balanced while the
//! refused content is skipped.
//!
//! The parsing mode is derived from the top of the stack and never
//! stored separately.

use std::fmt;

use crate::error::{CoreError, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Between `--#if` and the next `--#else` or `--#endif`.
    If,
    /// Between `--#ifn` and the next `--#else` or `--#endif`.
    IfNegated,
    /// Between `--#else` and `--#endif`.
    Else,
    /// Between the open and close fences of a target-only block.
    TargetOnlyBlock,
}

impl RegionKind {
    pub fn is_conditional(self) -> bool {
        matches!(self, RegionKind::If | RegionKind::IfNegated)
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::If => "If",
            RegionKind::IfNegated => "IfNegated",
            RegionKind::Else => "Else",
            RegionKind::TargetOnlyBlock => "TargetOnlyBlock",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The condition held: direct lines are copied.
    Accepted,
    /// The condition failed: direct lines are dropped, nested regions are
    /// still tracked for balance.
    Refused,
    /// An ancestor is refused, so the condition was never evaluated.
    Ignored,
}

impl Disposition {
    /// Disposition of the `else` branch that follows a region with this one.
    pub fn inverted(self) -> Self {
        match self {
            Disposition::Accepted => Disposition::Refused,
            Disposition::Refused => Disposition::Accepted,
            Disposition::Ignored => Disposition::Ignored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingMode {
    /// Copying each admitted line.
    Accepted,
    /// Dropping all content until the refusing region is closed.
    Ignoring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub disposition: Disposition,
    /// 1-based line of the directive that opened the region.
    pub opened_at: usize,
    /// Fence width, for target-only blocks only.
    pub fence_width: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RegionStack {
    regions: Vec<Region>,
}

impl RegionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ParsingMode {
        match self.regions.last() {
            None => ParsingMode::Accepted,
            Some(region) if region.disposition == Disposition::Accepted => ParsingMode::Accepted,
            Some(_) => ParsingMode::Ignoring,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.regions.len()
    }

    pub fn top(&self) -> Option<&Region> {
        self.regions.last()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn top_kind(&self) -> Option<RegionKind> {
        self.regions.last().map(|region| region.kind)
    }

    /// Push an `if`/`ifn` region.
    ///
    /// `condition` is only evaluated while the stack is in accepted mode.
    pub fn open_conditional(
        &mut self,
        kind: RegionKind,
        opened_at: usize,
        condition: impl FnOnce() -> bool,
    ) -> Disposition {
        debug_assert!(kind.is_conditional());
        let disposition = match self.mode() {
            ParsingMode::Accepted if condition() => Disposition::Accepted,
            ParsingMode::Accepted => Disposition::Refused,
            ParsingMode::Ignoring => Disposition::Ignored,
        };
        self.regions.push(Region {
            kind,
            disposition,
            opened_at,
            fence_width: None,
        });
        disposition
    }

    /// Replace the innermost `if`/`ifn` region by its `else` branch.
    pub fn switch_else(&mut self, opened_at: usize) -> Result<Disposition, Violation> {
        match self.top_kind() {
            Some(kind) if kind.is_conditional() => {}
            found => return Err(Violation::ElseOutsideIf { found }),
        }
        let Some(branch) = self.regions.pop() else {
            return Err(Violation::ElseOutsideIf { found: None });
        };
        let disposition = branch.disposition.inverted();
        self.regions.push(Region {
            kind: RegionKind::Else,
            disposition,
            opened_at,
            fence_width: None,
        });
        Ok(disposition)
    }

    /// Pop the innermost `if`/`ifn`/`else` region.
    pub fn close_conditional(&mut self) -> Result<Region, Violation> {
        match self.top_kind() {
            Some(RegionKind::If | RegionKind::IfNegated | RegionKind::Else) => {}
            found => return Err(Violation::EndifOutsideIf { found }),
        }
        self.regions
            .pop()
            .ok_or(Violation::EndifOutsideIf { found: None })
    }

    /// Target-only blocks cannot be nested, at any depth.
    pub fn check_block_open(&self) -> Result<(), Violation> {
        if self
            .regions
            .iter()
            .any(|region| region.kind == RegionKind::TargetOnlyBlock)
        {
            return Err(Violation::NestedBlock);
        }
        Ok(())
    }

    /// Push a target-only block. It is accepted unless an ancestor already
    /// refused its content.
    pub fn open_block(&mut self, fence_width: usize, opened_at: usize) -> Disposition {
        let disposition = match self.mode() {
            ParsingMode::Accepted => Disposition::Accepted,
            ParsingMode::Ignoring => Disposition::Ignored,
        };
        self.regions.push(Region {
            kind: RegionKind::TargetOnlyBlock,
            disposition,
            opened_at,
            fence_width: Some(fence_width),
        });
        disposition
    }

    /// Pop the innermost target-only block. Fence width is checked by the
    /// caller against the returned region.
    pub fn close_block(&mut self) -> Result<Region, Violation> {
        match self.top_kind() {
            Some(RegionKind::TargetOnlyBlock) => {}
            found => return Err(Violation::BlockCloseOutsideBlock { found }),
        }
        self.regions
            .pop()
            .ok_or(Violation::BlockCloseOutsideBlock { found: None })
    }

    /// Check that every region was closed at end of input.
    pub fn finish(&self) -> Result<(), CoreError> {
        match self.regions.last() {
            Some(region) => Err(CoreError::UnterminatedRegion {
                kind: region.kind,
                opened_at: region.opened_at,
            }),
            None => Ok(()),
        }
    }
}
