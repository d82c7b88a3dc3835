use crate::engine::{ContextMatcher, GrammarRegistry, ScanRun, Scanner};
use crate::{Result, TokenTree};
use once_cell::sync::Lazy;

/// Context the bundled grammar starts in.
pub const DEFAULT_START_CONTEXT: &str = crate::grammar::selectors::START;

static DEFAULT_REGISTRY: Lazy<Result<GrammarRegistry>> =
    Lazy::new(|| GrammarRegistry::new(crate::grammar::selectors::contexts()));

/// Scan options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Name of the context the scan starts in.
    pub start_context: String,
    /// Upper bound on the number of rules fired. `None` means unbounded.
    pub max_steps: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options { start_context: DEFAULT_START_CONTEXT.to_string(), max_steps: None }
    }
}

/// The registry holding the bundled selector grammar.
///
/// Built on first use and shared by every caller. Contexts compile lazily, so
/// a broken context only surfaces once a scan reaches it.
pub fn default_registry() -> Result<&'static GrammarRegistry> {
    DEFAULT_REGISTRY.as_ref().map_err(Clone::clone)
}

/// Scan `query` with the bundled grammar and default [`Options`].
///
/// # Example
/// ```
/// use querylex::parse;
///
/// let tree = parse("@a/b [x=1]").unwrap();
/// let root = tree.root();
/// assert_eq!(root.child_count(), 1);
/// assert_eq!(root.accumulated_text(), "@a/b [x=1]");
/// ```
pub fn parse(query: &str) -> Result<TokenTree> {
    parse_with(query, default_registry()?, &Options::default())
}

/// Scan `query` with any registry and the provided `options`.
pub fn parse_with<M: ContextMatcher>(query: &str, registry: &GrammarRegistry<M>, options: &Options) -> Result<TokenTree> {
    scanner(registry, options).scan(query, &options.start_context)
}

/// Like [`parse_with`], and also return the scan metrics.
///
/// Useful to debug a grammar: the metrics tell how often each kind of
/// transition fired and how deep the scan went.
pub fn parse_verbose_with<M: ContextMatcher>(
    query: &str,
    registry: &GrammarRegistry<M>,
    options: &Options,
) -> Result<ScanRun> {
    scanner(registry, options).scan_with_metrics(query, &options.start_context)
}

fn scanner<'r, M: ContextMatcher>(registry: &'r GrammarRegistry<M>, options: &Options) -> Scanner<'r, M> {
    Scanner::new(registry).with_max_steps(options.max_steps)
}
