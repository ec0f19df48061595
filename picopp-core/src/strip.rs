//! Whole-line diagnostic call stripping.
//!
//! One-line calls to debug functions such as `log(...)` or `assert(...)`
//! are removed unless the symbol governing them is defined. This avoids
//! wrapping every such call in `--#if log` / `--#endif`.
//!
//! The match is deliberately simple: a line is stripped when it starts
//! with a candidate name, an opening parenthesis, and ends with a closing
//! parenthesis, optionally followed by a line comment. Bracket balance is
//! not checked, so a multi-line call whose first line does not end with
//! `)` is never stripped, and one whose first line does end with `)` is
//! stripped alone.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::{Regex, RegexBuilder};

use crate::error::CoreError;
use crate::symbols::DefinedSymbols;

/// Upper bound on the compiled size of a stripped-call pattern, in bytes.
pub const DEFAULT_PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Candidate function names and the symbols that preserve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripTable {
    candidates: Vec<String>,
    preserved_by_symbol: Vec<(String, Vec<String>)>,
    pattern_size_limit: usize,
}

impl Default for StripTable {
    /// `log`, `warn` and `err` all follow the `log` symbol.
    fn default() -> Self {
        StripTable::empty()
            .candidate("assert")
            .candidate("log")
            .candidate("warn")
            .candidate("err")
            .preserve("assert", ["assert"])
            .preserve("log", ["log", "warn", "err"])
    }
}

impl StripTable {
    pub fn empty() -> Self {
        StripTable {
            candidates: Vec::new(),
            preserved_by_symbol: Vec::new(),
            pattern_size_limit: DEFAULT_PATTERN_SIZE_LIMIT,
        }
    }

    pub fn candidate(mut self, name: impl Into<String>) -> Self {
        self.candidates.push(name.into());
        self
    }

    /// Defining `symbol` exempts `names` from stripping.
    pub fn preserve<I, S>(mut self, symbol: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved_by_symbol
            .push((symbol.into(), names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn pattern_size_limit(mut self, limit: usize) -> Self {
        self.pattern_size_limit = limit;
        self
    }

    /// Names still eligible for stripping under `symbols`, in candidate order.
    pub fn stripped_functions(&self, symbols: &DefinedSymbols) -> Vec<String> {
        let preserved: Vec<&str> = self
            .preserved_by_symbol
            .iter()
            .filter(|(symbol, _)| symbols.contains(symbol))
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect();
        self.candidates
            .iter()
            .filter(|name| !preserved.contains(&name.as_str()))
            .cloned()
            .collect()
    }
}

/// Build the alternation pattern for `names`, or `None` when there is
/// nothing to strip. An empty alternation would match any line starting
/// with brackets.
pub fn stripped_call_pattern(
    names: &[String],
    size_limit: usize,
) -> Result<Option<Regex>, regex::Error> {
    if names.is_empty() {
        return Ok(None);
    }
    let alternatives: Vec<String> = names.iter().map(|name| regex::escape(name)).collect();
    let pattern = format!(
        r"^\s*(?:{})\(.*\)\s*(?:--.*)?\s*$",
        alternatives.join("|")
    );
    RegexBuilder::new(&pattern)
        .size_limit(size_limit)
        .build()
        .map(Some)
}

/// Compiled patterns keyed by the canonical defined-symbols list.
///
/// Entries are a pure function of their key, so the cache is never
/// invalidated and concurrent inserts of the same key are harmless.
#[derive(Debug, Default)]
pub struct StripPatternCache {
    patterns: RwLock<HashMap<Vec<String>, Option<Regex>>>,
}

impl StripPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the pattern for `symbols`, compiling it on first use. Build
    /// failures are returned and never cached.
    pub fn get_or_build(
        &self,
        table: &StripTable,
        symbols: &DefinedSymbols,
    ) -> Result<Option<Regex>, CoreError> {
        let key = symbols.cache_key();
        if let Ok(map) = self.patterns.read() {
            if let Some(pattern) = map.get(&key) {
                return Ok(pattern.clone());
            }
        }

        let pattern = stripped_call_pattern(
            &table.stripped_functions(symbols),
            table.pattern_size_limit,
        )?;
        if let Ok(mut map) = self.patterns.write() {
            map.entry(key).or_insert_with(|| pattern.clone());
        }
        Ok(pattern)
    }
}

#[derive(Debug, Default)]
pub struct StatementStripper {
    table: StripTable,
    cache: StripPatternCache,
}

impl StatementStripper {
    pub fn new(table: StripTable) -> Self {
        StatementStripper {
            table,
            cache: StripPatternCache::new(),
        }
    }

    pub fn cache(&self) -> &StripPatternCache {
        &self.cache
    }

    /// True iff `line` is a whole-line call (optionally followed by a
    /// comment) to a function that is stripped under `symbols`.
    pub fn should_strip(&self, line: &str, symbols: &DefinedSymbols) -> Result<bool, CoreError> {
        Ok(self
            .cache
            .get_or_build(&self.table, symbols)?
            .is_some_and(|pattern| pattern.is_match(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> DefinedSymbols {
        names.iter().copied().collect()
    }

    fn strips(stripper: &StatementStripper, line: &str, defined: &[&str]) -> bool {
        stripper
            .should_strip(line, &symbols(defined))
            .expect("pattern builds")
    }

    fn pattern(names: &[&str]) -> Option<Regex> {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        stripped_call_pattern(&names, DEFAULT_PATTERN_SIZE_LIMIT).expect("pattern builds")
    }

    #[test]
    fn stripped_functions_follow_defined_symbols() {
        let table = StripTable::default();
        assert_eq!(
            table.stripped_functions(&symbols(&[])),
            vec!["assert", "log", "warn", "err"]
        );
        assert_eq!(
            table.stripped_functions(&symbols(&["assert"])),
            vec!["log", "warn", "err"]
        );
        assert_eq!(table.stripped_functions(&symbols(&["log"])), vec!["assert"]);
        assert!(
            table
                .stripped_functions(&symbols(&["assert", "log"]))
                .is_empty()
        );
    }

    #[test]
    fn no_pattern_without_stripped_functions() {
        assert!(pattern(&[]).is_none());
        let stripper = StatementStripper::default();
        assert!(!strips(&stripper, "(f)()\n", &["assert", "log"]));
    }

    #[test]
    fn pattern_matches_whole_line_calls() {
        let pattern = pattern(&["assert"]).expect("pattern");
        assert!(pattern.is_match("assert(x > 0)\n"));
        assert!(pattern.is_match("    assert(x > 0, \"msg\")  -- check\n"));
        assert!(!pattern.is_match("local ok = assert(x)\n"));
        assert!(!pattern.is_match("assertion(x)\n"));
    }

    #[test]
    fn strips_warn_unless_log_is_defined() {
        let stripper = StatementStripper::default();
        let line = "warn(\"message (inside brackets)\")\n";
        assert!(strips(&stripper, line, &[]));
        assert!(!strips(&stripper, line, &["log"]));
    }

    #[test]
    fn log_call_is_elided_unless_log_defined() {
        let stripper = StatementStripper::default();
        assert!(strips(&stripper, "log(\"debug message\")", &[]));
        assert!(!strips(&stripper, "log(\"debug message\")", &["log"]));
    }

    #[test]
    fn multi_line_call_is_never_stripped() {
        let stripper = StatementStripper::default();
        assert!(!strips(&stripper, "log(\"first\",\n", &[]));
        assert!(!strips(&stripper, "  \"second\")\n", &[]));
    }

    #[test]
    fn cache_is_keyed_by_canonical_symbol_set() {
        let stripper = StatementStripper::default();
        assert!(stripper.cache().is_empty());
        strips(&stripper, "log(1)\n", &["log", "debug"]);
        strips(&stripper, "log(1)\n", &["debug", "log"]);
        assert_eq!(stripper.cache().len(), 1);
        strips(&stripper, "log(1)\n", &[]);
        assert_eq!(stripper.cache().len(), 2);
    }

    #[test]
    fn custom_table_strips_configured_names() {
        let table = StripTable::empty()
            .candidate("trace")
            .preserve("profiling", ["trace"]);
        let stripper = StatementStripper::new(table);
        assert!(strips(&stripper, "trace(\"frame\")\n", &[]));
        assert!(!strips(&stripper, "log(\"frame\")\n", &[]));
        assert!(!strips(&stripper, "trace(\"frame\")\n", &["profiling"]));
    }

    #[test]
    fn oversized_pattern_is_reported() {
        let table = StripTable::default().pattern_size_limit(16);
        let stripper = StatementStripper::new(table);
        let err = stripper
            .should_strip("log(1)\n", &symbols(&[]))
            .unwrap_err();
        assert!(matches!(err, CoreError::StripPattern(_)));
        assert!(stripper.cache().is_empty());

        // Nothing left to strip, so nothing is compiled.
        assert!(!strips(&stripper, "log(1)\n", &["assert", "log"]));
    }

    #[test]
    fn shared_stripper_builds_one_pattern_across_threads() {
        let stripper = StatementStripper::default();
        let defined = symbols(&["assert"]);
        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| stripper.should_strip("log(1)\n", &defined)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread").expect("pattern builds"))
                .collect()
        });
        assert!(results.iter().all(|&stripped| stripped));
        assert_eq!(stripper.cache().len(), 1);
    }
}
