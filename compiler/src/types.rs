// types.rs — Numeric nature classification and the type oracle surface
//
// Rewrite passes consult a `TypeOracle` for the previously certified type of
// a node; the only judgment they need is the binary *nature* (integer or
// real). The full type-inference pass is an external collaborator — this
// module defines the query surface plus `NatureTable`, a small fixpoint
// nature annotator used by the CLI, benches, and tests.
//
// Preconditions: oracles must be total over every node handed to a pass.
// Postconditions: natures are immutable input metadata, never recomputed by
//   the passes themselves.
// Failure modes: querying an untyped node is a caller bug (panics).
// Side effects: none.

use std::collections::HashMap;

use crate::graph::SignalGraph;
use crate::sig::{BinOp, Sig, SigId};

// ── Nature ──────────────────────────────────────────────────────────────────

/// Binary numeric classification of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nature {
    Int,
    Real,
}

impl Nature {
    /// Least upper bound in the two-point lattice Int < Real.
    pub fn join(self, other: Nature) -> Nature {
        match (self, other) {
            (Nature::Int, Nature::Int) => Nature::Int,
            _ => Nature::Real,
        }
    }
}

/// Certified type of a signal node. Exposes the nature; richer judgments
/// (intervals, variability) stay with the external inference pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigType {
    pub nature: Nature,
}

impl SigType {
    pub fn new(nature: Nature) -> Self {
        Self { nature }
    }
}

// ── Oracle ──────────────────────────────────────────────────────────────────

/// Per-node type query, total over the input graph of a pass.
///
/// Passes query the *original* (pre-rewrite) children, so an oracle never
/// needs to know about nodes a pass creates.
pub trait TypeOracle {
    fn sig_type(&self, sig: SigId) -> SigType;
}

// ── NatureTable ─────────────────────────────────────────────────────────────

/// Table-backed oracle with a built-in bottom-up nature annotator.
///
/// `infer` iterates a monotone transfer function over the reachable nodes
/// until stable, so natures propagate correctly through recursive groups
/// (the lattice has height two; the loop always terminates).
#[derive(Debug, Default, Clone)]
pub struct NatureTable {
    natures: HashMap<SigId, Nature>,
}

impl NatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a nature explicitly (tests, hand-built judgments).
    pub fn set(&mut self, sig: SigId, nature: Nature) {
        self.natures.insert(sig, nature);
    }

    pub fn get(&self, sig: SigId) -> Option<Nature> {
        self.natures.get(&sig).copied()
    }

    /// Annotate every node reachable from `roots`.
    pub fn infer(g: &SignalGraph, roots: &[SigId]) -> Self {
        let reachable = g.reachable(roots);
        let mut natures: HashMap<SigId, Nature> = HashMap::with_capacity(reachable.len());

        loop {
            let mut changed = false;
            for &id in &reachable {
                let n = transfer(g, id, &natures);
                if natures.insert(id, n) != Some(n) {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        Self { natures }
    }
}

impl TypeOracle for NatureTable {
    /// Panics if `sig` was never annotated — oracle totality is a
    /// precondition of every pass.
    fn sig_type(&self, sig: SigId) -> SigType {
        match self.natures.get(&sig) {
            Some(&nature) => SigType::new(nature),
            None => panic!("no certified type for {sig}"),
        }
    }
}

// ── Transfer function ───────────────────────────────────────────────────────

/// Nature of a foreign C type name.
fn ctype_nature(ctype: &str) -> Nature {
    match ctype {
        "int" | "long" | "bool" => Nature::Int,
        _ => Nature::Real,
    }
}

/// One step of the nature transfer function. Unvisited operands read as
/// Int (lattice bottom), which the fixpoint loop refines upward.
fn transfer(g: &SignalGraph, id: SigId, natures: &HashMap<SigId, Nature>) -> Nature {
    let nat = |s: SigId| natures.get(&s).copied().unwrap_or(Nature::Int);

    match g.node(id) {
        Sig::IntConst(_) => Nature::Int,
        Sig::RealConst(_) => Nature::Real,
        Sig::Waveform(entries) => entries
            .iter()
            .fold(Nature::Int, |acc, &e| acc.join(nat(e))),

        // audio inputs are real-valued sample streams
        Sig::Input(_) => Nature::Real,
        Sig::Output(_, x) => nat(*x),

        Sig::Delay1(x) => nat(*x),
        Sig::FixDelay { sig, .. } => nat(*sig),
        Sig::Prefix { init, sig } => nat(*init).join(nat(*sig)),
        Sig::Iota(_) => Nature::Int,
        Sig::Gen(x) => nat(*x),

        Sig::BinOp(op, x, y) => match op {
            BinOp::Div => Nature::Real,
            BinOp::Shl | BinOp::Shr | BinOp::And | BinOp::Or | BinOp::Xor => Nature::Int,
            _ if op.is_comparison() => Nature::Int,
            _ => nat(*x).join(nat(*y)),
        },

        Sig::Ffun { rtype, .. } => ctype_nature(rtype),
        Sig::Fconst { ctype, .. } | Sig::Fvar { ctype, .. } => ctype_nature(ctype),

        Sig::Table { init, .. } => nat(*init),
        Sig::WrTbl { table, data, .. } => nat(*table).join(nat(*data)),
        Sig::RdTbl { table, .. } => nat(*table),
        Sig::DocConstantTbl { init, .. } => nat(*init),
        Sig::DocWriteTbl { init, data, .. } => nat(*init).join(nat(*data)),
        Sig::DocAccessTbl { table, .. } => nat(*table),

        Sig::Select2 { x, y, .. } => nat(*x).join(nat(*y)),
        Sig::Select3 { x, y, z, .. } => nat(*x).join(nat(*y)).join(nat(*z)),

        Sig::Proj { idx, group } => match g.group_var(*group).and_then(|v| g.rec_def(v)) {
            Some(eqs) => eqs
                .get(*idx as usize)
                .map(|&eq| nat(eq))
                .unwrap_or(Nature::Int),
            None => Nature::Int,
        },
        // a group is not a value; projections read through to the equations
        Sig::RecGroup { .. } => Nature::Int,

        Sig::IntCast(_) => Nature::Int,
        Sig::FloatCast(_) => Nature::Real,

        // controls are real-valued parameter streams
        Sig::Button { .. }
        | Sig::Checkbox { .. }
        | Sig::VSlider { .. }
        | Sig::HSlider { .. }
        | Sig::NumEntry { .. } => Nature::Real,
        Sig::VBargraph { sig, .. } | Sig::HBargraph { sig, .. } => nat(*sig),

        Sig::Soundfile { .. } => Nature::Int,
        Sig::SoundfileLength(_) | Sig::SoundfileRate(_) | Sig::SoundfileChannels(_) => {
            Nature::Int
        }
        Sig::SoundfileBuffer { .. } => Nature::Real,

        Sig::Attach(x, _) | Sig::Enable(x, _) | Sig::Control(x, _) => nat(*x),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
