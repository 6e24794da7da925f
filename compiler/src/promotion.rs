// promotion.rs — Type promotion: explicit casts unifying operand natures
//
// Specializes the identity rule set for the variants whose numeric
// semantics depend on operand nature: fixed delays, binary operators,
// 2-/3-way selects, and explicit casts. Run before code generation so that
// every arithmetic and control operation sees operands of a single nature.
//
// Preconditions: `oracle` is total over the input graph (types certified by
//   the upstream inference pass). Types are queried on the original,
//   pre-rewrite children.
// Postconditions: output graph is structurally isomorphic to the input plus
//   inserted cast nodes; redundant explicit casts are normalized away.
// Failure modes: `UnrecognizedNode`, via the identity fallback.
// Side effects: cast nodes interned into the graph.

use crate::graph::SignalGraph;
use crate::identity::rewrite_children;
use crate::sig::{BinOp, Sig, SigId};
use crate::transform::{RewriteCache, Transform, TransformError};
use crate::types::{Nature, SigType, TypeOracle};

// ── Cast helpers ────────────────────────────────────────────────────────────

/// Wrap `sig` in an int cast only if its certified type is real; already
/// integer-natured signals pass through untouched.
pub fn cast_to_int(g: &mut SignalGraph, t: SigType, sig: SigId) -> SigId {
    match t.nature {
        Nature::Real => g.sig_int_cast(sig),
        Nature::Int => sig,
    }
}

/// Wrap `sig` in a float cast only if its certified type is integer.
pub fn cast_to_real(g: &mut SignalGraph, t: SigType, sig: SigId) -> SigId {
    match t.nature {
        Nature::Int => g.sig_float_cast(sig),
        Nature::Real => sig,
    }
}

// ── TypePromotion pass ──────────────────────────────────────────────────────

/// The promotion pass: identity plus overrides for the four
/// nature-sensitive variant families.
pub struct TypePromotion<'o, O: TypeOracle> {
    oracle: &'o O,
    cache: RewriteCache,
    visit_gen: bool,
}

impl<'o, O: TypeOracle> TypePromotion<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            cache: RewriteCache::new(),
            visit_gen: false,
        }
    }

    /// Promotion pass that also descends into table-generator subtrees.
    /// The oracle must then be total over generator contents as well.
    pub fn with_generator_visit(oracle: &'o O) -> Self {
        Self {
            oracle,
            cache: RewriteCache::new(),
            visit_gen: true,
        }
    }
}

impl<O: TypeOracle> Transform for TypePromotion<'_, O> {
    fn cache_mut(&mut self) -> &mut RewriteCache {
        &mut self.cache
    }

    fn visit_generators(&self) -> bool {
        self.visit_gen
    }

    fn rewrite(&mut self, g: &mut SignalGraph, sig: SigId) -> Result<SigId, TransformError> {
        match g.node(sig).clone() {
            // the delay amount is an index: force it to integer nature.
            // Children are resolved before the oracle is consulted so a
            // malformed child id fails with a diagnostic, not an oracle
            // miss; the type queried is still that of the original child.
            Sig::FixDelay { sig: x, delay } => {
                let rx = self.resolve(g, x)?;
                let rdelay = self.resolve(g, delay)?;
                let td = self.oracle.sig_type(delay);
                let rdelay = cast_to_int(g, td, rdelay);
                Ok(g.sig_fix_delay(rx, rdelay))
            }

            Sig::BinOp(op, x, y) => {
                let rx = self.resolve(g, x)?;
                let ry = self.resolve(g, y)?;
                let tx = self.oracle.sig_type(x);
                let ty = self.oracle.sig_type(y);

                match op {
                    BinOp::Add
                    | BinOp::Sub
                    | BinOp::Mul
                    | BinOp::Rem
                    | BinOp::Gt
                    | BinOp::Lt
                    | BinOp::Ge
                    | BinOp::Le
                    | BinOp::Eq
                    | BinOp::Ne => {
                        if tx.nature == ty.nature {
                            // same nature: no promotion needed
                            Ok(g.sig_bin_op(op, rx, ry))
                        } else {
                            // unify by promoting the integer side to real
                            let rx = cast_to_real(g, tx, rx);
                            let ry = cast_to_real(g, ty, ry);
                            Ok(g.sig_bin_op(op, rx, ry))
                        }
                    }
                    BinOp::Div => {
                        // the result of a division is always real-valued
                        let rx = cast_to_real(g, tx, rx);
                        let ry = cast_to_real(g, ty, ry);
                        Ok(g.sig_bin_op(op, rx, ry))
                    }
                    // TODO: no promotion rule for bitwise/shift operators;
                    // operands pass through unchanged even on mismatch
                    BinOp::Shl | BinOp::Shr | BinOp::And | BinOp::Or | BinOp::Xor => {
                        Ok(g.sig_bin_op(op, rx, ry))
                    }
                }
            }

            Sig::Select2 { sel, x, y } => {
                let rsel = self.resolve(g, sel)?;
                let rx = self.resolve(g, x)?;
                let ry = self.resolve(g, y)?;
                let ts = self.oracle.sig_type(sel);
                let tx = self.oracle.sig_type(x);
                let ty = self.oracle.sig_type(y);
                let rsel = cast_to_int(g, ts, rsel);
                if tx.nature == ty.nature {
                    Ok(g.sig_select2(rsel, rx, ry))
                } else {
                    let rx = cast_to_real(g, tx, rx);
                    let ry = cast_to_real(g, ty, ry);
                    Ok(g.sig_select2(rsel, rx, ry))
                }
            }
            Sig::Select3 { sel, x, y, z } => {
                let rsel = self.resolve(g, sel)?;
                let rx = self.resolve(g, x)?;
                let ry = self.resolve(g, y)?;
                let rz = self.resolve(g, z)?;
                let ts = self.oracle.sig_type(sel);
                let tx = self.oracle.sig_type(x);
                let ty = self.oracle.sig_type(y);
                let tz = self.oracle.sig_type(z);
                let rsel = cast_to_int(g, ts, rsel);
                if tx.nature == ty.nature && tx.nature == tz.nature {
                    Ok(g.sig_select3(rsel, rx, ry, rz))
                } else {
                    let rx = cast_to_real(g, tx, rx);
                    let ry = cast_to_real(g, ty, ry);
                    let rz = cast_to_real(g, tz, rz);
                    Ok(g.sig_select3(rsel, rx, ry, rz))
                }
            }

            // explicit casts are re-derived from the child's certified
            // type, which erases redundant ones
            Sig::IntCast(x) => {
                let rx = self.resolve(g, x)?;
                let tx = self.oracle.sig_type(x);
                Ok(cast_to_int(g, tx, rx))
            }
            Sig::FloatCast(x) => {
                let rx = self.resolve(g, x)?;
                let tx = self.oracle.sig_type(x);
                Ok(cast_to_real(g, tx, rx))
            }

            _ => rewrite_children(self, g, sig),
        }
    }
}

/// Run the promotion pass over a single root.
pub fn promote<O: TypeOracle>(
    g: &mut SignalGraph,
    oracle: &O,
    root: SigId,
) -> Result<SigId, TransformError> {
    TypePromotion::new(oracle).resolve(g, root)
}

// ── Tests ───────────────────────────────────────────────────────────────────
