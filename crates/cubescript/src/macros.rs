//! Macro memoization.
//!
//! Macro bodies are parsed once per parser run and cached here, keyed by
//! macro name. The table also tracks which macros are currently being
//! resolved, which is how self-referential and mutually recursive macro
//! definitions are detected and rejected.
//!
//! The table is owned by the parser run, not by tree nodes: a finished
//! tree carries its expansions immutably and needs no lazily-written
//! cache state.

use indexmap::IndexMap;

use crate::ast::Node;

/// Memoization table for resolved macro bodies.
#[derive(Debug, Default)]
pub(crate) struct MacroResolver {
    cache: IndexMap<String, Node>,
    in_progress: Vec<String>,
}

impl MacroResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached expansion of a macro, if it was resolved before.
    pub(crate) fn cached(&self, name: &str) -> Option<&Node> {
        self.cache.get(name)
    }

    /// Returns whether the named macro is currently being resolved, i.e.
    /// whether expanding it again would recurse.
    pub(crate) fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress.iter().any(|n| n == name)
    }

    /// Marks the macro as being resolved.
    pub(crate) fn begin(&mut self, name: &str) {
        self.in_progress.push(name.to_owned());
    }

    /// Unmarks the macro. Called on success and on failure.
    pub(crate) fn end(&mut self, name: &str) {
        if let Some(i) = self.in_progress.iter().rposition(|n| n == name) {
            self.in_progress.remove(i);
        }
    }

    /// Stores the resolved expansion of a macro.
    pub(crate) fn insert(&mut self, name: &str, expansion: Node) {
        self.cache.insert(name.to_owned(), expansion);
    }
}
