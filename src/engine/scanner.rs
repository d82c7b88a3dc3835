//! The scan loop.
//!
//! This module is the operational core of the engine. A scan is a state
//! machine over `(cursor, active context, active node)`:
//!
//! ```text
//! loop while input remains:
//!   1. match the active context at the cursor      (no match: Syntax error)
//!   2. new token under the active node
//!   3. consume the match, or leave it (lookahead)
//!   4. append to the parent's children unless hidden
//!   5. add the captured text to every ancestor
//!   6. transition:
//!        Stay       (ctx, node)        unchanged
//!        Switch(X)  (X, node)
//!        Enter(X)   (X, token)         one level down, entry(token) = X
//!        Terminate  (entry(parent), parent)  one level up
//! end of input:
//!   close levels whose context allows it, then require depth 0
//! ```
//!
//! ## Lookahead
//!
//! A rule flagged `Suppress::TEXT_CAPTURE` picks a transition without eating
//! its match. `Enter` + lookahead lets the child context see the character
//! that selected it; `Terminate` + lookahead hands a terminator back to the
//! enclosing context so it can tokenize it itself.
//!
//! ## Returning to a level
//!
//! Every node that opens a level remembers its *entry context*, the context
//! its children started being scanned in (the start context for the root).
//! Leaving a level restores the entry context of the parent being returned to.
//! In-place switches made at that level before the child level was opened are
//! dropped. The same context name can be entered from many places, so this is
//! stored per node and never recomputed from names.

use std::time::Instant;

use tracing::{debug, trace};

use super::cursor::Cursor;
use super::matcher::{ContextMatcher, RegexMatcher};
use super::metrics::{ScanMetrics, ScanRun};
use super::progress::ProgressGuard;
use super::registry::{CompiledContext, CompiledRule, GrammarRegistry};
use crate::{Error, NodeId, Result, Span, TokenTree, Transition};

/// Drives the grammar contexts of a registry across a query.
///
/// A scanner borrows its registry and holds no per-scan state, so one scanner
/// (or many, on several threads) can be reused for any number of queries.
#[derive(Debug, Clone)]
pub struct Scanner<'r, M: ContextMatcher = RegexMatcher> {
    registry: &'r GrammarRegistry<M>,
    max_steps: Option<usize>,
}

impl<'r, M: ContextMatcher> Scanner<'r, M> {
    pub fn new(registry: &'r GrammarRegistry<M>) -> Self {
        Scanner { registry, max_steps: None }
    }

    /// Fail with [`Error::StepLimitExceeded`] once `max_steps` rules have fired.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Scan `query` starting in the context named `start`.
    pub fn scan(&self, query: &str, start: &str) -> Result<TokenTree> {
        self.scan_with_metrics(query, start).map(|run| run.tree)
    }

    /// Like [`Scanner::scan`], and also report what the scan did.
    pub fn scan_with_metrics(&self, query: &str, start: &str) -> Result<ScanRun> {
        let started = Instant::now();
        let context = self.registry.resolve(start)?;

        let mut state = ScanState {
            registry: self.registry,
            cursor: Cursor::new(query),
            tree: TokenTree::with_root(context.name(), context.id()),
            context,
            node: NodeId::ROOT,
            guard: ProgressGuard::default(),
            metrics: ScanMetrics::default(),
        };

        while !state.cursor.is_at_end() {
            if let Some(limit) = self.max_steps {
                if state.metrics.steps >= limit {
                    return Err(Error::StepLimitExceeded { limit, position: state.cursor.position() });
                }
            }
            state.step()?;
        }
        state.close_at_end_of_input()?;

        let ScanState { tree, mut metrics, .. } = state;
        metrics.elapsed = started.elapsed();
        debug!(steps = metrics.steps, nodes = tree.node_count(), elapsed = ?metrics.elapsed, "scan complete");

        Ok(ScanRun { tree, metrics })
    }
}

/// Mutable state of one scan.
struct ScanState<'r, 'q, M: ContextMatcher> {
    registry: &'r GrammarRegistry<M>,
    cursor: Cursor<'q>,
    tree: TokenTree,
    context: &'r CompiledContext<M>,
    node: NodeId,
    guard: ProgressGuard,
    metrics: ScanMetrics,
}

impl<'r, M: ContextMatcher> ScanState<'r, '_, M> {
    fn step(&mut self) -> Result<()> {
        let context = self.context;
        let depth = self.tree.depth_of(self.node);

        if self.guard.revisits(context.id(), depth) {
            return Err(Error::NoProgress { position: self.cursor.position(), context: context.name().to_string() });
        }
        self.metrics.steps += 1;

        let rest = self.cursor.rest();
        let Some((matched, len)) = context.find(rest) else {
            return Err(Error::Syntax {
                position: self.cursor.position(),
                remaining: rest.to_string(),
                context: context.name().to_string(),
            });
        };
        let rule = &matched.rule;
        trace!(
            context = context.name(),
            rule = rule.name,
            text = &rest[..len],
            offset = self.cursor.offset(),
            lookahead = !rule.captures_text(),
            "rule matched"
        );

        let start = self.cursor.offset();
        let captured = if rule.captures_text() {
            self.cursor.advance(len, rule.spans_lines);
            self.metrics.consumed_steps += 1;
            if len > 0 {
                self.guard.reset();
            }
            &rest[..len]
        } else {
            self.metrics.lookahead_steps += 1;
            ""
        };

        let span = Span { start, end: start + captured.len() };
        let token =
            self.tree.push(self.node, rule.name, context.name(), context.id(), captured, span, rule.is_visible());

        match rule.transition {
            Transition::Stay => {}
            Transition::Switch(_) => {
                let target = self.target(matched)?;
                debug!(from = context.name(), to = target.name(), rule = rule.name, "switch context");
                self.context = target;
                self.metrics.switches += 1;
            }
            Transition::Enter(_) => {
                let target = self.target(matched)?;
                debug!(from = context.name(), to = target.name(), rule = rule.name, depth = depth + 1, "enter context");
                self.tree.enter(token, target.id());
                self.context = target;
                self.node = token;
                self.metrics.descents += 1;
                self.metrics.max_depth = self.metrics.max_depth.max(depth + 1);
            }
            Transition::Terminate => {
                if !self.ascend()? {
                    return Err(Error::UnbalancedContext {
                        rule: rule.name,
                        context: context.name().to_string(),
                        position: self.cursor.position(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Leave the active level for its parent, restoring the parent's entry
    /// context. Returns `false` at the root.
    fn ascend(&mut self) -> Result<bool> {
        let Some(parent) = self.tree.parent_of(self.node) else {
            return Ok(false);
        };
        let registry = self.registry;
        let resumed = registry.context(self.tree.entry(parent))?;

        debug!(from = self.context.name(), to = resumed.name(), depth = self.tree.depth_of(parent), "leave context");
        self.context = resumed;
        self.node = parent;
        self.guard.unwind(self.tree.depth_of(parent));
        self.metrics.ascents += 1;
        Ok(true)
    }

    fn close_at_end_of_input(&mut self) -> Result<()> {
        while self.context.closes_at_end_of_input() && self.ascend()? {
            self.metrics.auto_closed += 1;
        }

        if self.node != NodeId::ROOT {
            return Err(Error::UnterminatedContext {
                context: self.context.name().to_string(),
                depth: self.tree.depth_of(self.node),
            });
        }
        Ok(())
    }

    fn target(&self, rule: &CompiledRule) -> Result<&'r CompiledContext<M>> {
        let registry = self.registry;
        match rule.target {
            Some(id) => registry.context(id),
            None => Err(Error::UnknownContext(rule.rule.transition.target().unwrap_or_default().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transition::{Enter, Switch, Terminate};
    use crate::{GrammarContext, Position, Suppress, Token};
    use pretty_assertions::assert_eq;

    const HIDDEN: Suppress = Suppress::FROM_TREE;
    const PEEK: Suppress = Suppress::TEXT_CAPTURE;

    fn registry(contexts: Vec<GrammarContext>) -> GrammarRegistry {
        GrammarRegistry::new(contexts).unwrap()
    }

    fn scan(reg: &GrammarRegistry, query: &str) -> Result<ScanRun> {
        Scanner::new(reg).scan_with_metrics(query, "top")
    }

    fn child_names(token: Token<'_>) -> Vec<&'static str> {
        token.children().map(|t| t.rule_name()).collect()
    }

    /// `a (b (c d) e) f`-style nesting with hidden whitespace.
    fn groups() -> GrammarRegistry {
        let body = |name| {
            GrammarContext::new(
                name,
                vec![
                    rule! { name: "close", pattern: r"\)", transition: Terminate },
                    rule! { name: "open", pattern: r"\(", transition: Enter("group") },
                    rule! { name: "word", pattern: "[a-z]+" },
                    rule! { name: "space", pattern: r"\s+", spans_lines: true, suppress: HIDDEN },
                ],
            )
        };
        registry(vec![body("top"), body("group")])
    }

    #[test]
    fn lookahead_dispatcher_hands_its_text_to_the_child_context() {
        let reg = registry(vec![
            GrammarContext::new("top", vec![rule! { name: "dispatch", pattern: "@", transition: Enter("path"), suppress: PEEK }]),
            GrammarContext::new(
                "path",
                vec![rule! { name: "at", pattern: "@", suppress: HIDDEN }, rule! { name: "segment", pattern: r"\w+" }],
            )
            .closing_at_end_of_input(),
        ]);

        let run = scan(&reg, "@id").unwrap();
        let root = run.tree.root();
        assert_eq!(child_names(root), vec!["dispatch"]);

        let dispatch = root.children().next().unwrap();
        assert_eq!(dispatch.captured_text(), "");
        assert!(dispatch.span().is_empty());
        assert_eq!(child_names(dispatch), vec!["segment"]);
        assert_eq!(dispatch.children().next().unwrap().accumulated_text(), "id");
        assert_eq!(dispatch.accumulated_text(), "@id");
        assert_eq!(root.accumulated_text(), "@id");

        assert_eq!(run.metrics.lookahead_steps, 1);
        assert_eq!(run.metrics.auto_closed, 1);
    }

    #[test]
    fn hidden_whitespace_still_counts_toward_the_parent_text() {
        let reg = groups();
        let tree = scan(&reg, "ab cd").unwrap().tree;

        assert_eq!(child_names(tree.root()), vec!["word", "word"]);
        assert_eq!(tree.root().accumulated_text(), "ab cd");
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn unmatched_input_is_a_syntax_error() {
        let reg = registry(vec![GrammarContext::new(
            "top",
            vec![rule! { name: "word", pattern: r"\w+" }, rule! { name: "mention", pattern: r"@\w+" }],
        )]);

        let err = scan(&reg, "ab@@@").unwrap_err();
        assert_eq!(
            err,
            Error::Syntax {
                position: Position { offset: 2, line: 1, column: 3 },
                remaining: "@@@".into(),
                context: "top".into(),
            }
        );
    }

    #[test]
    fn unclosed_nested_construct_is_unterminated() {
        let reg = groups();
        let err = scan(&reg, "a (b (c)").unwrap_err();
        assert_eq!(err, Error::UnterminatedContext { context: "group".into(), depth: 1 });
    }

    #[test]
    fn earlier_rule_wins_even_with_a_shorter_match() {
        let reg = registry(vec![GrammarContext::new(
            "top",
            vec![rule! { name: "first", pattern: "ab" }, rule! { name: "second", pattern: r"a\w*|\w+" }],
        )]);

        let tree = scan(&reg, "abc").unwrap().tree;
        let texts: Vec<_> = tree.root().children().map(|t| (t.rule_name(), t.captured_text())).collect();
        assert_eq!(texts, vec![("first", "ab"), ("second", "c")]);
    }

    #[test]
    fn peeked_terminator_is_rescanned_by_the_enclosing_context() {
        let reg = registry(vec![
            GrammarContext::new(
                "top",
                vec![
                    rule! { name: "open", pattern: r"\(", transition: Enter("inside") },
                    rule! { name: "close", pattern: r"\)" },
                ],
            ),
            GrammarContext::new(
                "inside",
                vec![
                    rule! { name: "word", pattern: r"\w+" },
                    rule! { name: "end", pattern: r"[,)]", transition: Terminate, suppress: PEEK.union(HIDDEN) },
                ],
            ),
        ]);

        let tree = scan(&reg, "(a)").unwrap().tree;
        let root = tree.root();
        assert_eq!(child_names(root), vec!["open", "close"]);

        let open = root.children().next().unwrap();
        assert_eq!(child_names(open), vec!["word"]);
        assert_eq!(open.accumulated_text(), "(a");
        assert_eq!(root.children().nth(1).unwrap().captured_text(), ")");
        assert_eq!(root.accumulated_text(), "(a)");
    }

    #[test]
    fn leaving_a_level_restores_the_context_it_was_opened_from() {
        let reg = registry(vec![
            GrammarContext::new(
                "top",
                vec![
                    rule! { name: "open", pattern: r"\[", transition: Enter("key") },
                    rule! { name: "word", pattern: r"\w+" },
                ],
            ),
            GrammarContext::new("key", vec![rule! { name: "name", pattern: r"\w+", transition: Switch("value") }]),
            GrammarContext::new(
                "value",
                vec![
                    rule! { name: "eq", pattern: "=" },
                    rule! { name: "val", pattern: r"\w+" },
                    rule! { name: "close", pattern: r"\]", transition: Terminate, suppress: HIDDEN },
                ],
            ),
        ]);

        let run = scan(&reg, "[a=b]c").unwrap();
        let root = run.tree.root();
        assert_eq!(child_names(root), vec!["open", "word"]);
        let open = root.children().next().unwrap();
        assert_eq!(child_names(open), vec!["name", "eq", "val"]);
        let contexts: Vec<_> = open.children().map(|t| t.context()).collect();
        assert_eq!(contexts, vec!["key", "value", "value"]);
        assert_eq!(run.metrics.switches, 1);
    }

    #[test]
    fn leaving_a_level_drops_switches_made_before_it_was_opened() {
        let reg = registry(vec![
            GrammarContext::new(
                "plain",
                vec![
                    rule! { name: "to_group", pattern: "!", transition: Switch("grouping") },
                    rule! { name: "y", pattern: "y" },
                ],
            ),
            GrammarContext::new("grouping", vec![rule! { name: "open", pattern: r"\(", transition: Enter("inner") }]),
            GrammarContext::new(
                "inner",
                vec![
                    rule! { name: "x", pattern: "x" },
                    rule! { name: "close", pattern: r"\)", transition: Terminate, suppress: HIDDEN },
                ],
            ),
        ]);

        let tree = Scanner::new(&reg).scan("!(x)y", "plain").unwrap();
        assert_eq!(child_names(tree.root()), vec!["to_group", "open", "y"]);
        assert_eq!(tree.root().children().nth(2).unwrap().context(), "plain");
    }

    #[test]
    fn entry_context_is_kept_per_node_not_per_context_name() {
        let reg = registry(vec![
            GrammarContext::new(
                "top",
                vec![
                    rule! { name: "a", pattern: "a" },
                    rule! { name: "open", pattern: r"\(", transition: Enter("inner") },
                    rule! { name: "square", pattern: r"\[", transition: Enter("box") },
                ],
            ),
            GrammarContext::new(
                "box",
                vec![
                    rule! { name: "b", pattern: "b" },
                    rule! { name: "open", pattern: r"\(", transition: Enter("inner") },
                    rule! { name: "close", pattern: r"\]", transition: Terminate, suppress: HIDDEN },
                ],
            ),
            GrammarContext::new(
                "inner",
                vec![
                    rule! { name: "char", pattern: r"\w" },
                    rule! { name: "close", pattern: r"\)", transition: Terminate, suppress: HIDDEN },
                ],
            ),
        ]);

        let tree = scan(&reg, "a(x)[b(y)b]a").unwrap().tree;
        let root = tree.root();
        assert_eq!(child_names(root), vec!["a", "open", "square", "a"]);
        assert_eq!(child_names(root.children().nth(2).unwrap()), vec!["b", "open", "b"]);
    }

    #[test]
    fn successful_scans_balance_descents_and_ascents() {
        let reg = groups();
        let run = scan(&reg, "a (b (c d) e) f").unwrap();

        assert_eq!(run.metrics.descents, 2);
        assert_eq!(run.metrics.ascents, 2);
        assert_eq!(run.metrics.max_depth, 2);
        assert_eq!(run.metrics.auto_closed, 0);
    }

    #[test]
    fn every_character_is_captured_exactly_once() {
        let reg = groups();
        let query = "a (b (c d)\n e) f";
        let tree = scan(&reg, query).unwrap().tree;

        let rebuilt: String = tree.all().map(|t| t.captured_text()).collect();
        assert_eq!(rebuilt, query);
        assert_eq!(tree.root().accumulated_text(), query);
    }

    #[test]
    fn accumulated_text_is_own_text_plus_children_text() {
        let reg = groups();
        let tree = scan(&reg, "a (b (c d) e) f").unwrap().tree;

        for token in tree.all() {
            let below: String = tree
                .all()
                .filter(|t| t.parent().map(|p| p.id()) == Some(token.id()))
                .map(|t| t.accumulated_text())
                .collect();
            assert_eq!(token.accumulated_text(), format!("{}{}", token.captured_text(), below));
        }
    }

    #[test]
    fn repeated_scans_build_identical_trees() {
        let reg = groups();
        let first = scan(&reg, "a (b (c d) e) f").unwrap();
        let second = scan(&reg, "a (b (c d) e) f").unwrap();

        assert_eq!(first.tree.to_string(), second.tree.to_string());
        assert_eq!(first.tree.node_count(), second.tree.node_count());
        assert_eq!(first.metrics.steps, second.metrics.steps);
    }

    #[test]
    fn terminating_the_root_level_is_unbalanced() {
        let reg = groups();
        let err = scan(&reg, "a)").unwrap_err();
        assert_eq!(
            err,
            Error::UnbalancedContext {
                rule: "close",
                context: "top".into(),
                position: Position { offset: 2, line: 1, column: 3 },
            }
        );
    }

    #[test]
    fn unknown_start_context_is_rejected() {
        let reg = groups();
        let err = Scanner::new(&reg).scan("a", "nowhere").unwrap_err();
        assert_eq!(err, Error::UnknownContext("nowhere".into()));
    }

    #[test]
    fn empty_query_yields_a_bare_root() {
        let reg = groups();
        let run = scan(&reg, "").unwrap();
        assert_eq!(run.tree.node_count(), 1);
        assert_eq!(run.tree.root().rule_name(), "root");
        assert_eq!(run.metrics.steps, 0);
    }

    #[test]
    fn lookahead_that_never_consumes_is_stopped() {
        let reg = registry(vec![GrammarContext::new(
            "top",
            vec![rule! { name: "peek", pattern: "x", suppress: PEEK }, rule! { name: "x", pattern: "x" }],
        )]);

        let err = scan(&reg, "x").unwrap_err();
        assert_eq!(err, Error::NoProgress { position: Position::START, context: "top".into() });
    }

    #[test]
    fn contexts_bouncing_on_the_same_text_are_stopped() {
        let reg = registry(vec![
            GrammarContext::new("top", vec![rule! { name: "go", pattern: "x", transition: Enter("other"), suppress: PEEK }]),
            GrammarContext::new("other", vec![rule! { name: "back", pattern: "x", transition: Terminate, suppress: PEEK }]),
        ]);
        assert!(matches!(scan(&reg, "ax").unwrap_err(), Error::Syntax { .. }));
        assert!(matches!(scan(&reg, "x").unwrap_err(), Error::NoProgress { .. }));

        let descent = registry(vec![GrammarContext::new(
            "top",
            vec![rule! { name: "deeper", pattern: "x", transition: Enter("top"), suppress: PEEK }],
        )]);
        assert!(matches!(scan(&descent, "x").unwrap_err(), Error::NoProgress { .. }));
    }

    #[test]
    fn zero_width_match_that_stays_put_is_stopped() {
        let reg = registry(vec![GrammarContext::new(
            "top",
            vec![rule! { name: "boundary", pattern: r"\b" }, rule! { name: "word", pattern: r"\w+" }],
        )]);
        assert!(matches!(scan(&reg, "ab").unwrap_err(), Error::NoProgress { .. }));
    }

    #[test]
    fn step_limit_stops_long_scans() {
        let reg = groups();
        let err = Scanner::new(&reg).with_max_steps(Some(2)).scan("a b c", "top").unwrap_err();
        assert_eq!(err, Error::StepLimitExceeded { limit: 2, position: Position { offset: 2, line: 1, column: 3 } });
        assert!(Scanner::new(&reg).with_max_steps(Some(5)).scan("a b c", "top").is_ok());
    }

    #[test]
    fn error_positions_follow_line_breaks() {
        let reg = groups();
        let err = scan(&reg, "ab\ncd!").unwrap_err();
        assert!(matches!(err, Error::Syntax { position: Position { offset: 5, line: 2, column: 3 }, .. }));
    }
}
