//! Zero-progress detection.
//!
//! Lookahead rules leave the cursor where it is, so a badly written grammar can
//! bounce between contexts forever without consuming anything. While the
//! cursor stands still the matcher's answer depends only on the active
//! context, which makes such loops detectable exactly:
//!
//! - every (context, depth) visited since the last advance is recorded per
//!   tree depth;
//! - popping out of a level forgets what was recorded at that level and below
//!   it in the tree, because those levels are gone;
//! - meeting a context that is already recorded at the current depth or at any
//!   shallower, still-open depth means the run since then will replay forever
//!   (same depth: a cycle; deeper: an endless descent).
//!
//! ```text
//! cursor fixed at "x"
//! A@0 ──enter──▶ B@1 ──terminate──▶ A@0   A already seen at depth 0: loop
//! A@0 ──enter──▶ A@1                      A seen at depth 0 ≤ 1: endless descent
//! P@2 ──terminate──▶ S@1 ──terminate──▶ R@0  (frames dropped on the way up: fine)
//! ```

use super::registry::ContextId;

#[derive(Debug, Default)]
pub(crate) struct ProgressGuard {
    /// Contexts seen since the last advance, indexed by tree depth.
    frames: Vec<Vec<ContextId>>,
}

impl ProgressGuard {
    /// Record a visit of `context` at `depth`. Returns `true` when the scan can
    /// no longer make progress.
    pub(crate) fn revisits(&mut self, context: ContextId, depth: usize) -> bool {
        if self.frames.iter().take(depth + 1).any(|seen| seen.contains(&context)) {
            return true;
        }
        if self.frames.len() <= depth {
            self.frames.resize_with(depth + 1, Vec::new);
        }
        self.frames[depth].push(context);
        false
    }

    /// The cursor moved: everything recorded is stale.
    pub(crate) fn reset(&mut self) {
        self.frames.clear();
    }

    /// The scan climbed back to `depth`.
    pub(crate) fn unwind(&mut self, depth: usize) {
        self.frames.truncate(depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ContextId = ContextId::new(0);
    const B: ContextId = ContextId::new(1);
    const C: ContextId = ContextId::new(2);

    #[test]
    fn same_context_at_same_depth_is_a_loop() {
        let mut guard = ProgressGuard::default();
        assert!(!guard.revisits(A, 0));
        assert!(!guard.revisits(B, 1));
        guard.unwind(0);
        assert!(guard.revisits(A, 0));
    }

    #[test]
    fn same_context_deeper_is_an_endless_descent() {
        let mut guard = ProgressGuard::default();
        assert!(!guard.revisits(A, 0));
        assert!(guard.revisits(A, 1));
    }

    #[test]
    fn popped_levels_are_forgotten() {
        let mut guard = ProgressGuard::default();
        assert!(!guard.revisits(C, 2));
        guard.unwind(1);
        assert!(!guard.revisits(B, 1));
        guard.unwind(0);
        assert!(!guard.revisits(A, 0));
        assert!(!guard.revisits(C, 1));
    }

    #[test]
    fn reset_clears_everything() {
        let mut guard = ProgressGuard::default();
        assert!(!guard.revisits(A, 0));
        guard.reset();
        assert!(!guard.revisits(A, 0));
    }
}
