//! Context-switching tokenizer for selector-like queries.
//!
//! A query such as `@a/b [name="x"] :has(#id)` is scanned by a set of named
//! grammar contexts. Each context is an ordered list of [`PatternRule`]s; the
//! rule that fires decides whether the scanner stays put, switches context in
//! place, descends into a child context (opening a new tree level) or climbs
//! back to the parent level. The result is a [`TokenTree`].
//!
//! ```text
//! "@titi [a=1]"
//!   selectors ─▶ selector ─▶ selector_element ─▶ path      "titi"
//!                                            └─▶ attribute "a" "=" "1"
//! ```
//!
//! Most callers only need [`parse`]; custom grammars go through
//! [`GrammarRegistry`] and [`parse_with`].

use bitflags::bitflags;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
pub mod grammar;
mod tree;

pub use api::{DEFAULT_START_CONTEXT, Options, default_registry, parse, parse_verbose_with, parse_with};
pub use engine::{
    CompiledContext, CompiledRule, ContextId, ContextMatcher, GrammarRegistry, RegexMatcher, RuleMatch, ScanMetrics,
    ScanRun, Scanner,
};
pub use error::{CompileCause, Error, Position, Result};
pub use tree::{NodeId, Span, Token, TokenTree};

// --- Grammar data model ------------------------------------------------------

/// How a matched rule moves the scanner between grammar contexts.
///
/// The variants are mutually exclusive: a rule changes the grammar in at most
/// one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Keep the active context and tree level.
    Stay,
    /// Replace the active context without changing the tree level.
    Switch(&'static str),
    /// Make the new token the active level and scan its children with the
    /// named context.
    Enter(&'static str),
    /// Return to the parent level and the context that was active when the
    /// current level was opened.
    Terminate,
}

impl Transition {
    /// Name of the context this transition jumps to, if any.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            Transition::Switch(name) | Transition::Enter(name) => Some(name),
            Transition::Stay | Transition::Terminate => None,
        }
    }
}

bitflags! {
    /// Independent suppression flags carried by a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Suppress: u8 {
        /// The token is scanned (and may still contribute text to its
        /// ancestors) but is not appended to its parent's children.
        const FROM_TREE    = 1 << 0;
        /// Lookahead: the matched text stays in the input and the token's own
        /// captured text is empty.
        const TEXT_CAPTURE = 1 << 1;
    }
}

/// One alternative of a [`GrammarContext`].
///
/// Usually built with the [`rule!`] macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    /// Unique within its context; becomes the token's rule name.
    pub name: &'static str,
    /// Regular expression, tested anchored at the cursor.
    pub pattern: &'static str,
    /// Whether a match may contain line breaks.
    pub spans_lines: bool,
    pub transition: Transition,
    pub suppress: Suppress,
}

impl PatternRule {
    /// A plain rule: stays in its context, consumes its match and shows up in
    /// the tree.
    pub fn new(name: &'static str, pattern: &'static str) -> Self {
        PatternRule { name, pattern, spans_lines: false, transition: Transition::Stay, suppress: Suppress::empty() }
    }

    /// True unless the rule is a lookahead dispatcher.
    pub fn captures_text(&self) -> bool {
        !self.suppress.contains(Suppress::TEXT_CAPTURE)
    }

    /// True unless tokens of this rule are hidden from the tree.
    pub fn is_visible(&self) -> bool {
        !self.suppress.contains(Suppress::FROM_TREE)
    }
}

/// A named, ordered set of [`PatternRule`]s. Declaration order is priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarContext {
    pub name: &'static str,
    pub rules: Vec<PatternRule>,
    /// Whether a level scanned with this context may be left open when the
    /// input runs out. Such levels are closed implicitly at end of input.
    pub closes_at_end_of_input: bool,
}

impl GrammarContext {
    pub fn new(name: &'static str, rules: Vec<PatternRule>) -> Self {
        GrammarContext { name, rules, closes_at_end_of_input: false }
    }

    /// Mark the context as implicitly closed at end of input.
    pub fn closing_at_end_of_input(mut self) -> Self {
        self.closes_at_end_of_input = true;
        self
    }
}
