//! Scan metrics.
//!
//! The intended usage is:
//!
//! - `Scanner::scan` for normal operation.
//! - `Scanner::scan_with_metrics` for debugging grammars and inspecting how a
//!   query was walked.
//!
//! On a successful scan `descents == ascents`: every level opened by an
//! `Enter` rule was closed again, either by a `Terminate` rule or implicitly
//! at end of input (`auto_closed`).

use std::time::Duration;

use crate::TokenTree;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanMetrics {
    /// Rules fired.
    pub steps: usize,
    /// Steps that captured text (possibly zero-width).
    pub consumed_steps: usize,
    /// Steps of lookahead rules.
    pub lookahead_steps: usize,
    /// `Enter` transitions taken.
    pub descents: usize,
    /// Levels closed, by `Terminate` rules or at end of input.
    pub ascents: usize,
    /// Levels closed at end of input.
    pub auto_closed: usize,
    /// In-place context switches.
    pub switches: usize,
    /// Deepest level reached.
    pub max_depth: usize,
    /// Wall-clock time for the whole scan.
    pub elapsed: Duration,
}

/// Scanner output bundled with its metrics.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub tree: TokenTree,
    pub metrics: ScanMetrics,
}
