//! Selector query grammar.
//!
//! Scans comma-separated selectors made of whitespace-separated elements:
//!
//! ```text
//! @a/b/*c*          path, literal and wildcard segments
//! #name             id
//! [attr]            attribute presence
//! [attr op value]   attribute comparison, value: null | "string" | number | bool
//! :value op value   node value comparison
//! :has(...)         elements having matching descendants
//! :not(...)         elements not matching
//! :empty  :parent   elements without / with children
//! ```
//!
//! Start in [`START`]. The tree mirrors the nesting: one `selector` per
//! comma-separated selector, one `selector_element` per element, and below it
//! the element's own construct (`path`, `attribute`, `id`, `value`, `has`,
//! `not`).
//!
//! `selector`, `selector_element`, `path` and `value_operator` may run up to
//! the end of the query. Brackets and parentheses must be closed.

use crate::Transition::{Enter, Switch, Terminate};
use crate::{GrammarContext, PatternRule, Suppress, Transition};

/// Context a selector query starts in.
pub const START: &str = "selectors";

const HIDDEN: Suppress = Suppress::FROM_TREE;
const PEEK: Suppress = Suppress::TEXT_CAPTURE;

/// Every context of the grammar.
pub fn contexts() -> Vec<GrammarContext> {
    vec![
        selectors(),
        selector(),
        selector_element(),
        path(),
        id(),
        has(),
        not(),
        attribute(),
        attribute_operator(),
        attribute_value(),
        attribute_end(),
        value_operator(),
        value_value(),
    ]
}

// --- Shared rules -----------------------------------------------------------

fn space() -> PatternRule {
    rule! { name: "space", pattern: r"\s+", spans_lines: true, suppress: HIDDEN }
}

fn operator(next: &'static str) -> PatternRule {
    rule! { name: "operator", pattern: "[&|~=<>*?!^$]+", transition: Switch(next) }
}

fn closing_bracket() -> PatternRule {
    rule! { name: "attribute_end", pattern: r"\]", spans_lines: true, transition: Terminate, suppress: HIDDEN }
}

/// `null`, strings, numbers and booleans. `null` moves on with `null_then`,
/// the others with `then`.
fn literals(null_then: Transition, then: Transition) -> Vec<PatternRule> {
    vec![
        rule! { name: "null", pattern: "null", transition: null_then },
        rule! { name: "string", pattern: r#""(?:[^"\\]|\\.)*""#, transition: then },
        rule! { name: "number", pattern: r"-?\d+\.?\d*", transition: then },
        rule! { name: "bool", pattern: "(?:true|false)", transition: then },
    ]
}

// --- Selector lists ---------------------------------------------------------

fn selectors() -> GrammarContext {
    GrammarContext::new(
        "selectors",
        vec![
            space(),
            rule! { name: "selector", pattern: ".", spans_lines: true, transition: Enter("selector"), suppress: PEEK },
        ],
    )
}

fn selector() -> GrammarContext {
    GrammarContext::new(
        "selector",
        vec![
            space(),
            rule! { name: "end", pattern: ",", transition: Terminate },
            rule! {
                name: "selector_element",
                pattern: ".",
                spans_lines: true,
                transition: Enter("selector_element"),
                suppress: PEEK,
            },
        ],
    )
    .closing_at_end_of_input()
}

fn selector_element() -> GrammarContext {
    GrammarContext::new(
        "selector_element",
        vec![
            rule! { name: "path", pattern: "@", transition: Enter("path") },
            rule! { name: "attribute", pattern: r"\[", transition: Enter("attribute") },
            rule! { name: "id", pattern: "#", transition: Enter("id") },
            rule! { name: "value", pattern: ":value", transition: Enter("value_operator") },
            rule! { name: "has", pattern: r":has\(", transition: Enter("has") },
            rule! { name: "not", pattern: r":not\(", transition: Enter("not") },
            rule! { name: "empty", pattern: ":empty" },
            rule! { name: "parent", pattern: ":parent" },
            rule! { name: "end", pattern: r"[),\s]", spans_lines: true, transition: Terminate, suppress: PEEK },
        ],
    )
    .closing_at_end_of_input()
}

// --- Element constructs -----------------------------------------------------

fn path() -> GrammarContext {
    GrammarContext::new(
        "path",
        vec![
            rule! { name: "separator", pattern: "/" },
            rule! { name: "path_literal", pattern: r"[^/\t\n\s)|\]*?^]+" },
            rule! { name: "path_token", pattern: r"[^/\t\n\s)|\]]+" },
            rule! {
                name: "path_end",
                pattern: r"[/\t\n\s)|\]]+",
                spans_lines: true,
                transition: Terminate,
                suppress: HIDDEN.union(PEEK),
            },
        ],
    )
    .closing_at_end_of_input()
}

fn id() -> GrammarContext {
    GrammarContext::new("id", vec![rule! { name: "id_name", pattern: r"[^/\s=<>*?!\])]+", transition: Terminate }])
}

fn has() -> GrammarContext {
    nested_selector("has", "has_element")
}

fn not() -> GrammarContext {
    nested_selector("not", "not_element")
}

/// Body of `:has(...)` and `:not(...)`: elements up to the closing parenthesis.
fn nested_selector(name: &'static str, element: &'static str) -> GrammarContext {
    GrammarContext::new(
        name,
        vec![
            rule! { name: "end", pattern: r"\)", transition: Terminate, suppress: HIDDEN },
            space(),
            rule! {
                name: element,
                pattern: ".",
                spans_lines: true,
                transition: Enter("selector_element"),
                suppress: PEEK,
            },
        ],
    )
}

// --- Attributes -------------------------------------------------------------

fn attribute() -> GrammarContext {
    GrammarContext::new(
        "attribute",
        vec![
            space(),
            rule! { name: "attribute_name", pattern: r"[^/\s=<>*?!\])]+", transition: Switch("attribute_operator") },
        ],
    )
}

fn attribute_operator() -> GrammarContext {
    GrammarContext::new("attribute_operator", vec![space(), operator("attribute_value"), closing_bracket()])
}

fn attribute_value() -> GrammarContext {
    GrammarContext::new("attribute_value", literals(Switch("attribute_end"), Switch("attribute_end")))
}

fn attribute_end() -> GrammarContext {
    GrammarContext::new("attribute_end", vec![closing_bracket()])
}

// --- `:value` comparisons ---------------------------------------------------

fn value_operator() -> GrammarContext {
    GrammarContext::new(
        "value_operator",
        vec![
            operator("value_value"),
            rule! {
                name: "value_end",
                pattern: r"[/\t\n\s)|\]]",
                spans_lines: true,
                transition: Terminate,
                suppress: HIDDEN.union(PEEK),
            },
        ],
    )
    .closing_at_end_of_input()
}

fn value_value() -> GrammarContext {
    GrammarContext::new("value_value", literals(Switch("attribute_end"), Terminate))
}
