//! Scanning engine.
//!
//! The engine turns a query into a [`TokenTree`](crate::TokenTree) by running
//! one context matcher at a time and hopping between grammar contexts as the
//! matched rules dictate.
//!
//! ## How the parts work together
//!
//! ```text
//! GrammarContext (all) ──┐
//!                        │  GrammarRegistry::new / resolve  (registry.rs)
//!                        └──────────────┬──────────────
//!                                       │ compiled once per context
//!                                       v
//!                            CompiledContext + RegexMatcher  (matcher.rs)
//!                                       │
//! query ── Cursor (cursor.rs) ──────────┤
//!                                       v
//!                            Scanner::scan_with_metrics  (scanner.rs)
//!                              - match at cursor
//!                              - consume or peek
//!                              - push token, propagate text
//!                              - stay / switch / enter / terminate
//!                              - ProgressGuard (progress.rs)
//!                                       │
//!                                       v
//!                            TokenTree + ScanMetrics  (metrics.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: owns the grammar contexts, compiles each one at most once
//!   and resolves names (and transition targets) to [`ContextId`]s.
//! - `matcher.rs`: the [`ContextMatcher`] seam and the default regex-backed
//!   first-wins matcher.
//! - `cursor.rs`: byte offset plus line/column bookkeeping.
//! - `scanner.rs`: the scan loop and its state machine.
//! - `progress.rs`: detects scans that can no longer advance.
//! - `metrics.rs`: per-run counters and timing.
//!
//! ## Debugging
//!
//! The engine emits `tracing` events: `trace` for every step, `debug` for
//! context transitions and compilation, `info` once a registry is fully
//! compiled. The CLI reads its filter from `QUERYLEX_LOG`.

#[path = "engine/cursor.rs"]
mod cursor;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/progress.rs"]
mod progress;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/scanner.rs"]
mod scanner;

pub use matcher::{ContextMatcher, RegexMatcher, RuleMatch};
pub use metrics::{ScanMetrics, ScanRun};
pub use registry::{CompiledContext, CompiledRule, ContextId, GrammarRegistry};
pub use scanner::Scanner;
