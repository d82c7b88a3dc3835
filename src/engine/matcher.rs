//! Single-context matching.
//!
//! A [`ContextMatcher`] answers one question: which rule of a context matches
//! at the start of the remaining input, and how long is the match?
//!
//! The policy is **ordered alternatives, first wins**: among all rules that
//! match at the cursor, the one declared first is selected, however short its
//! match. Grammars are written with that priority in mind, so replacement
//! matchers must keep it.
//!
//! ```text
//! rules:  [ path_literal: [^/*]+ , path_token: [^/]+ ]
//! text:   "a*b/c"
//! set:    {0, 1} match at 0  ──▶ rule 0, len 1 ("a")   (not rule 1, len 3)
//! ```
//!
//! [`RegexMatcher`] anchors every pattern with `\A`, uses a `RegexSet` to
//! learn which rules match, then runs only the winning rule to get its length.

use std::fmt;

use regex::{Regex, RegexSet};

use crate::{CompileCause, PatternRule};

/// The rule selected at the cursor: index into the context's rules, and the
/// byte length of the match (possibly zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: usize,
    pub len: usize,
}

/// Compiled matcher for one grammar context.
///
/// Implementations are built once per context and then shared read-only
/// between scans, possibly on several threads.
pub trait ContextMatcher: fmt::Debug + Send + Sync + Sized {
    /// Compile the rules of one context, in priority order.
    fn compile(rules: &[PatternRule]) -> Result<Self, CompileCause>;

    /// Find the first rule (in declaration order) matching a prefix of `text`.
    fn find(&self, text: &str) -> Option<RuleMatch>;
}

#[derive(Debug, Clone)]
pub struct RegexMatcher {
    set: RegexSet,
    anchored: Vec<Regex>,
}

impl ContextMatcher for RegexMatcher {
    fn compile(rules: &[PatternRule]) -> Result<Self, CompileCause> {
        let mut anchored = Vec::with_capacity(rules.len());

        for rule in rules {
            let re = Regex::new(&format!(r"\A(?:{})", rule.pattern))
                .map_err(|source| CompileCause::InvalidPattern { rule: rule.name, source })?;

            // A match of "\n" that contains the break can only start at 0, so
            // the anchored form is enough for this check.
            if !rule.spans_lines && re.find("\n").is_some_and(|m| m.as_str().contains('\n')) {
                return Err(CompileCause::UndeclaredLineBreak(rule.name));
            }
            anchored.push(re);
        }

        let set = RegexSet::new(anchored.iter().map(Regex::as_str)).map_err(CompileCause::Matcher)?;
        Ok(RegexMatcher { set, anchored })
    }

    fn find(&self, text: &str) -> Option<RuleMatch> {
        let rule = self.set.matches(text).into_iter().next()?;
        let m = self.anchored[rule].find(text)?;
        Some(RuleMatch { rule, len: m.end() })
    }
}
