//! Grammars bundled with the crate.
//!
//! Custom grammars are plain `Vec<GrammarContext>` values handed to
//! [`GrammarRegistry::new`](crate::GrammarRegistry::new); the modules here are
//! ready-made ones.

pub mod selectors;
