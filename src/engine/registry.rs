//! Grammar registry and context compilation.
//!
//! This module holds the *static* side of the engine: the named grammar
//! contexts and what is derived from them before any input is scanned.
//!
//! 1. **Register** (`GrammarRegistry::new`): contexts are stored in declaration
//!    order and each name gets a [`ContextId`].
//! 2. **Compile** (`GrammarRegistry::resolve` / `compile_all`): a context's
//!    rules are checked, handed to the [`ContextMatcher`] and their transition
//!    targets are resolved to ids. This happens lazily on first use, or
//!    eagerly through `compile_all`.
//!
//! ## Invariants
//!
//! - `ContextId` is an index into both `contexts` and `compiled`; those vectors
//!   stay aligned.
//! - A context is compiled at most once per registry. Every later resolve
//!   returns the very same `CompiledContext`, so the matcher cannot change
//!   under a running scan. A failed compilation stores nothing and fails again
//!   on the next attempt.
//! - Once compiled the registry is read-only and can be shared by concurrent
//!   scans.

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::matcher::{ContextMatcher, RegexMatcher};
use crate::{CompileCause, Error, GrammarContext, PatternRule, Result};

/// Index of a context inside its [`GrammarRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

impl ContextId {
    pub(crate) const fn new(index: usize) -> Self {
        ContextId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A rule with its transition target resolved.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: PatternRule,
    /// Set for `Switch` and `Enter` transitions.
    pub target: Option<ContextId>,
}

/// A grammar context ready for scanning.
#[derive(Debug)]
pub struct CompiledContext<M = RegexMatcher> {
    id: ContextId,
    name: &'static str,
    rules: Vec<CompiledRule>,
    closes_at_end_of_input: bool,
    matcher: M,
}

impl<M: ContextMatcher> CompiledContext<M> {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn closes_at_end_of_input(&self) -> bool {
        self.closes_at_end_of_input
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// The winning rule at the start of `text` and its match length.
    pub fn find(&self, text: &str) -> Option<(&CompiledRule, usize)> {
        let found = self.matcher.find(text)?;
        self.rules.get(found.rule).map(|rule| (rule, found.len))
    }
}

/// Owns a set of named grammar contexts and their compiled forms.
#[derive(Debug)]
pub struct GrammarRegistry<M: ContextMatcher = RegexMatcher> {
    contexts: Vec<GrammarContext>,
    compiled: Vec<OnceCell<CompiledContext<M>>>,
    by_name: HashMap<&'static str, ContextId>,
}

impl<M: ContextMatcher> GrammarRegistry<M> {
    /// Register `contexts`. Nothing is compiled yet.
    pub fn new(contexts: Vec<GrammarContext>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(contexts.len());
        for (index, context) in contexts.iter().enumerate() {
            if by_name.insert(context.name, ContextId::new(index)).is_some() {
                return Err(Error::DuplicateContext(context.name.to_string()));
            }
        }

        let compiled = contexts.iter().map(|_| OnceCell::new()).collect();
        Ok(GrammarRegistry { contexts, compiled, by_name })
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Context names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.contexts.iter().map(|c| c.name)
    }

    pub fn id_of(&self, name: &str) -> Result<ContextId> {
        self.by_name.get(name).copied().ok_or_else(|| Error::UnknownContext(name.to_string()))
    }

    /// Resolve `name` to its compiled context, compiling it on first use.
    pub fn resolve(&self, name: &str) -> Result<&CompiledContext<M>> {
        self.context(self.id_of(name)?)
    }

    /// Whether `name` has been compiled already.
    pub fn is_compiled(&self, name: &str) -> bool {
        self.id_of(name).map(|id| self.compiled[id.0].get().is_some()).unwrap_or(false)
    }

    /// Compile every context. Contexts compiled earlier are left untouched.
    pub fn compile_all(&self) -> Result<()> {
        for index in 0..self.contexts.len() {
            self.context(ContextId::new(index))?;
        }

        let names: Vec<&str> = self.names().collect();
        info!(contexts = names.len(), ?names, "grammar contexts compiled");
        Ok(())
    }

    /// `id` must come from this registry.
    pub(crate) fn context(&self, id: ContextId) -> Result<&CompiledContext<M>> {
        self.compiled[id.0].get_or_try_init(|| self.compile(id))
    }

    fn compile(&self, id: ContextId) -> Result<CompiledContext<M>> {
        let def = &self.contexts[id.0];
        let fail = |cause| Error::GrammarCompile { context: def.name.to_string(), cause };

        if def.rules.is_empty() {
            return Err(fail(CompileCause::EmptyContext));
        }

        let mut seen = HashSet::with_capacity(def.rules.len());
        for rule in &def.rules {
            if !seen.insert(rule.name) {
                return Err(fail(CompileCause::DuplicateRule(rule.name)));
            }
        }

        let rules = def
            .rules
            .iter()
            .map(|rule| {
                let target = rule.transition.target().map(|name| self.id_of(name)).transpose()?;
                Ok(CompiledRule { rule: rule.clone(), target })
            })
            .collect::<Result<Vec<_>>>()?;

        let matcher = M::compile(&def.rules).map_err(fail)?;

        debug!(context = def.name, rules = rules.len(), "compiled grammar context");

        Ok(CompiledContext { id, name: def.name, rules, closes_at_end_of_input: def.closes_at_end_of_input, matcher })
    }
}
