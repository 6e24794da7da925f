// transform.rs — Memoized signal-graph rewrite engine
//
// `Transform` is the engine every rewrite pass implements: `resolve` is the
// single recursion entry point and memoizes by node identity, so each unique
// node is rewritten at most once per run no matter how many parents share
// it. Rule sets are expressed as "identity plus overrides": a pass overrides
// `rewrite` for the variants it cares about and falls back to
// `identity::rewrite_children` for the rest.
//
// Preconditions: the input graph is well-formed (every id valid, every
//   projection targeting a recursive group).
// Postconditions: the returned id is the rewritten counterpart of the input;
//   sharing is preserved through the cache.
// Failure modes: `TransformError::UnrecognizedNode` on malformed input —
//   fatal, never retried.
// Side effects: new nodes interned into the graph; the per-pass cache.

use std::collections::HashMap;

use thiserror::Error;

use crate::graph::SignalGraph;
use crate::sig::SigId;

// ── Error ───────────────────────────────────────────────────────────────────

/// Fatal rewrite failure. A pass has no sound fallback for a node it does
/// not understand, so this aborts the whole compilation unit.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The node does not match any shape the active rule set handles:
    /// either the input graph is malformed or the rule set is missing a
    /// variant added upstream. Carries the offending node's textual form.
    #[error("unrecognized signal: {sig}")]
    UnrecognizedNode { sig: String },
}

// ── Cache ───────────────────────────────────────────────────────────────────

/// Per-pass memoization table, keyed by the identity of the *original*
/// node. Never shared between pass instances.
#[derive(Debug, Default)]
pub struct RewriteCache {
    done: HashMap<SigId, SigId>,
}

impl RewriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, sig: SigId) -> Option<SigId> {
        self.done.get(&sig).copied()
    }

    pub fn record(&mut self, sig: SigId, rewritten: SigId) {
        self.done.insert(sig, rewritten);
    }

    /// Number of distinct nodes rewritten so far.
    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// A memoized rewrite pass over a signal graph.
pub trait Transform {
    /// The pass's private memoization cache.
    fn cache_mut(&mut self) -> &mut RewriteCache;

    /// Whether `rewrite` descends into table-generator subtrees. Explicit
    /// per-pass configuration, not ambient state.
    fn visit_generators(&self) -> bool {
        false
    }

    /// Rewrite one node. Invoked only through `resolve`, at most once per
    /// unique node — except the sanctioned recursive-group sentinel
    /// re-entry (see identity.rs).
    fn rewrite(&mut self, g: &mut SignalGraph, sig: SigId) -> Result<SigId, TransformError>;

    /// Memoized entry point: rewrite `sig`, reusing the cached result when
    /// this node was already visited.
    fn resolve(&mut self, g: &mut SignalGraph, sig: SigId) -> Result<SigId, TransformError> {
        if g.try_node(sig).is_none() {
            return Err(TransformError::UnrecognizedNode {
                sig: format!("{sig} (dangling node id)"),
            });
        }
        if let Some(done) = self.cache_mut().lookup(sig) {
            return Ok(done);
        }
        let done = self.rewrite(g, sig)?;
        self.cache_mut().record(sig, done);
        Ok(done)
    }

    /// Element-wise `resolve` over an ordered list (foreign-function
    /// arguments, recursive-group equations).
    fn resolve_list(
        &mut self,
        g: &mut SignalGraph,
        sigs: &[SigId],
    ) -> Result<Vec<SigId>, TransformError> {
        sigs.iter().map(|&s| self.resolve(g, s)).collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
