//! Directive scanner.
//!
//! Classifies a single raw line into a directive token or `Ordinary`.
//! Every directive is anchored at the start of the line once leading
//! whitespace is skipped, so a directive written after code on the same
//! line never changes the region structure.
//!
//! Grammar:
//!
//!   --#if NAME [|| NAME2]
//!   --#ifn NAME
//!   --#else
//!   --#endif
//!   --[=*[#TAG ...      (open fence, width = number of '=')
//!   --#TAG]=*] ...      (close fence)

use once_cell::sync::Lazy;
use regex::Regex;

/// Default tag of target-only blocks.
pub const DEFAULT_TARGET_TAG: &str = "pico8";

// At most one `||` alternative is supported.
static IF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*--#if (\w+)\s*(?:\|\|\s*(\w+))?\s*$").unwrap());
static IFN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*--#ifn (\w+)\s*$").unwrap());
static ELSE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*--#else\s*$").unwrap());
static ENDIF_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*--#endif\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    IfOpen {
        symbol: String,
        alternative: Option<String>,
    },
    IfnOpen {
        symbol: String,
    },
    ElseSwitch,
    RegionClose,
    BlockOpen {
        fence_width: usize,
    },
    BlockClose {
        fence_width: usize,
    },
    Ordinary,
}

/// Scanner configured with the tag used by target-only block fences.
#[derive(Debug, Clone)]
pub struct DirectiveScanner {
    target_tag: String,
}

impl Default for DirectiveScanner {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_TAG)
    }
}

impl DirectiveScanner {
    pub fn new(target_tag: impl Into<String>) -> Self {
        DirectiveScanner {
            target_tag: target_tag.into(),
        }
    }

    pub fn scan(&self, line: &str) -> Directive {
        if let Some(captures) = IF_PATTERN.captures(line) {
            return Directive::IfOpen {
                symbol: captures[1].to_string(),
                alternative: captures.get(2).map(|m| m.as_str().to_string()),
            };
        }
        if let Some(captures) = IFN_PATTERN.captures(line) {
            return Directive::IfnOpen {
                symbol: captures[1].to_string(),
            };
        }
        if ELSE_PATTERN.is_match(line) {
            return Directive::ElseSwitch;
        }
        if ENDIF_PATTERN.is_match(line) {
            return Directive::RegionClose;
        }

        let trimmed = line.trim_start();
        if let Some(fence_width) = self.block_open_width(trimmed) {
            return Directive::BlockOpen { fence_width };
        }
        if let Some(fence_width) = self.block_close_width(trimmed) {
            return Directive::BlockClose { fence_width };
        }
        Directive::Ordinary
    }

    // --[==[#tag
    fn block_open_width(&self, trimmed: &str) -> Option<usize> {
        let rest = trimmed.strip_prefix("--[")?;
        let (fence_width, rest) = split_fence(rest);
        let rest = rest.strip_prefix("[#")?;
        rest.starts_with(self.target_tag.as_str()).then_some(fence_width)
    }

    // --#tag]==]
    fn block_close_width(&self, trimmed: &str) -> Option<usize> {
        let rest = trimmed
            .strip_prefix("--#")?
            .strip_prefix(self.target_tag.as_str())?
            .strip_prefix(']')?;
        let (fence_width, rest) = split_fence(rest);
        rest.starts_with(']').then_some(fence_width)
    }
}

/// Scan with the default target tag.
pub fn scan(line: &str) -> Directive {
    static DEFAULT_SCANNER: Lazy<DirectiveScanner> = Lazy::new(DirectiveScanner::default);
    DEFAULT_SCANNER.scan(line)
}

fn split_fence(text: &str) -> (usize, &str) {
    let rest = text.trim_start_matches('=');
    (text.len() - rest.len(), rest)
}
