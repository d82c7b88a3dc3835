/// Build a [`PatternRule`](crate::PatternRule).
///
/// Only `name` and `pattern` are required; the optional keys must appear in
/// the order shown.
///
/// ```
/// use querylex::{Suppress, Transition, rule};
///
/// let dispatch = rule! {
///     name: "selector",
///     pattern: r".",
///     spans_lines: true,
///     transition: Transition::Enter("selector"),
///     suppress: Suppress::TEXT_CAPTURE,
/// };
/// assert!(!dispatch.captures_text());
/// ```
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        pattern: $pat:expr
        $(, spans_lines: $spans:expr)?
        $(, transition: $transition:expr)?
        $(, suppress: $suppress:expr)?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut rule = $crate::PatternRule::new($name, $pat);
        $(rule.spans_lines = $spans;)?
        $(rule.transition = $transition;)?
        $(rule.suppress = $suppress;)?
        rule
    }};
}
