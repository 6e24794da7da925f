// identity.rs — Default rule set: structure-preserving memoized rewrite
//
// `rewrite_children` reconstructs every variant with its children resolved,
// and is the fallback every concrete pass delegates to for the variants it
// does not override. Because construction is hash-consed, running the plain
// identity pass returns the input graph unchanged, node for node.
//
// Cycle-breaking protocol for recursive groups: on first visit the group's
// equation list is taken out of its definition slot, leaving the in-progress
// sentinel behind; a projection that re-enters the group while the sentinel
// is present returns the group reference unchanged; once the equations are
// rewritten they are republished on the same group node. This is targeted at
// the one legal cycle shape (group ↔ projection) and must not be generalized
// into a visited-set.
//
// Preconditions: see transform.rs.
// Postconditions: output is variant- and field-identical to the input up to
//   resolved children.
// Failure modes: `UnrecognizedNode` for projections that do not target a
//   recursive group.
// Side effects: republishes rewritten equation lists on visited groups.

use crate::graph::SignalGraph;
use crate::pp::render_sig;
use crate::sig::{Sig, SigId};
use crate::transform::{RewriteCache, Transform, TransformError};

// ── Identity rule set ───────────────────────────────────────────────────────

/// Rewrite `sig` by resolving all children and reconstructing the same
/// variant. The exhaustive per-variant rule table shared by every pass.
pub fn rewrite_children<T>(
    t: &mut T,
    g: &mut SignalGraph,
    sig: SigId,
) -> Result<SigId, TransformError>
where
    T: Transform + ?Sized,
{
    match g.node(sig).clone() {
        // Leaves: nothing to resolve, the node is reused as-is. Waveforms
        // are leaves by definition — their entries are constants.
        Sig::IntConst(_)
        | Sig::RealConst(_)
        | Sig::Waveform(_)
        | Sig::Input(_)
        | Sig::Fconst { .. }
        | Sig::Fvar { .. }
        | Sig::Button { .. }
        | Sig::Checkbox { .. }
        | Sig::Soundfile { .. } => Ok(sig),

        Sig::Output(ch, x) => {
            let x = t.resolve(g, x)?;
            Ok(g.sig_output(ch, x))
        }

        Sig::Delay1(x) => {
            let x = t.resolve(g, x)?;
            Ok(g.sig_delay1(x))
        }
        Sig::FixDelay { sig: x, delay } => {
            let x = t.resolve(g, x)?;
            let delay = t.resolve(g, delay)?;
            Ok(g.sig_fix_delay(x, delay))
        }

        Sig::Prefix { init, sig: x } => {
            let init = t.resolve(g, init)?;
            let x = t.resolve(g, x)?;
            Ok(g.sig_prefix(init, x))
        }
        Sig::Iota(n) => {
            let n = t.resolve(g, n)?;
            Ok(g.sig_iota(n))
        }
        Sig::Gen(content) => {
            if t.visit_generators() {
                let content = t.resolve(g, content)?;
                Ok(g.sig_gen(content))
            } else {
                Ok(sig)
            }
        }

        Sig::BinOp(op, x, y) => {
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            Ok(g.sig_bin_op(op, x, y))
        }

        Sig::Ffun { name, rtype, args } => {
            let args = t.resolve_list(g, &args)?;
            Ok(g.sig_ffun(name, rtype, args))
        }

        Sig::Table { id, size, init } => {
            let size = t.resolve(g, size)?;
            let init = t.resolve(g, init)?;
            Ok(g.sig_table(id, size, init))
        }
        Sig::WrTbl {
            id,
            table,
            idx,
            data,
        } => {
            let table = t.resolve(g, table)?;
            let idx = t.resolve(g, idx)?;
            let data = t.resolve(g, data)?;
            Ok(g.sig_wr_tbl(id, table, idx, data))
        }
        Sig::RdTbl { table, idx } => {
            let table = t.resolve(g, table)?;
            let idx = t.resolve(g, idx)?;
            Ok(g.sig_rd_tbl(table, idx))
        }

        Sig::DocConstantTbl { size, init } => {
            let size = t.resolve(g, size)?;
            let init = t.resolve(g, init)?;
            Ok(g.sig_doc_constant_tbl(size, init))
        }
        Sig::DocWriteTbl {
            size,
            init,
            idx,
            data,
        } => {
            let size = t.resolve(g, size)?;
            let init = t.resolve(g, init)?;
            let idx = t.resolve(g, idx)?;
            let data = t.resolve(g, data)?;
            Ok(g.sig_doc_write_tbl(size, init, idx, data))
        }
        Sig::DocAccessTbl { table, idx } => {
            let table = t.resolve(g, table)?;
            let idx = t.resolve(g, idx)?;
            Ok(g.sig_doc_access_tbl(table, idx))
        }

        Sig::Select2 { sel, x, y } => {
            let sel = t.resolve(g, sel)?;
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            Ok(g.sig_select2(sel, x, y))
        }
        Sig::Select3 { sel, x, y, z } => {
            let sel = t.resolve(g, sel)?;
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            let z = t.resolve(g, z)?;
            Ok(g.sig_select3(sel, x, y, z))
        }

        Sig::Proj { idx, group } => {
            let group = t.resolve(g, group)?;
            if g.group_var(group).is_some() {
                Ok(g.sig_proj(idx, group))
            } else {
                Err(TransformError::UnrecognizedNode {
                    sig: render_sig(g, sig),
                })
            }
        }
        Sig::RecGroup { var } => {
            // a variable without a slot only arises from malformed input
            // (the constructors always allocate one)
            if !g.has_rec_var(var) {
                return Err(TransformError::UnrecognizedNode {
                    sig: render_sig(g, sig),
                });
            }
            match g.take_rec_def(var) {
                // sentinel present: this group is already being rewritten
                // higher up the stack; keep the reference to terminate the cycle
                None => Ok(sig),
                // first visit: the slot now holds the sentinel, so projections
                // re-entering this group during equation rewriting stop above
                Some(eqs) => {
                    let eqs = t.resolve_list(g, &eqs)?;
                    g.set_rec_def(var, eqs);
                    Ok(sig)
                }
            }
        }

        Sig::IntCast(x) => {
            let x = t.resolve(g, x)?;
            Ok(g.sig_int_cast(x))
        }
        Sig::FloatCast(x) => {
            let x = t.resolve(g, x)?;
            Ok(g.sig_float_cast(x))
        }

        Sig::VSlider {
            label,
            init,
            min,
            max,
            step,
        } => {
            let init = t.resolve(g, init)?;
            let min = t.resolve(g, min)?;
            let max = t.resolve(g, max)?;
            let step = t.resolve(g, step)?;
            Ok(g.sig_vslider(label, init, min, max, step))
        }
        Sig::HSlider {
            label,
            init,
            min,
            max,
            step,
        } => {
            let init = t.resolve(g, init)?;
            let min = t.resolve(g, min)?;
            let max = t.resolve(g, max)?;
            let step = t.resolve(g, step)?;
            Ok(g.sig_hslider(label, init, min, max, step))
        }
        Sig::NumEntry {
            label,
            init,
            min,
            max,
            step,
        } => {
            let init = t.resolve(g, init)?;
            let min = t.resolve(g, min)?;
            let max = t.resolve(g, max)?;
            let step = t.resolve(g, step)?;
            Ok(g.sig_num_entry(label, init, min, max, step))
        }
        Sig::VBargraph {
            label,
            min,
            max,
            sig: x,
        } => {
            let min = t.resolve(g, min)?;
            let max = t.resolve(g, max)?;
            let x = t.resolve(g, x)?;
            Ok(g.sig_vbargraph(label, min, max, x))
        }
        Sig::HBargraph {
            label,
            min,
            max,
            sig: x,
        } => {
            let min = t.resolve(g, min)?;
            let max = t.resolve(g, max)?;
            let x = t.resolve(g, x)?;
            Ok(g.sig_hbargraph(label, min, max, x))
        }

        Sig::SoundfileLength(sf) => {
            let sf = t.resolve(g, sf)?;
            Ok(g.sig_soundfile_length(sf))
        }
        Sig::SoundfileRate(sf) => {
            let sf = t.resolve(g, sf)?;
            Ok(g.sig_soundfile_rate(sf))
        }
        Sig::SoundfileChannels(sf) => {
            let sf = t.resolve(g, sf)?;
            Ok(g.sig_soundfile_channels(sf))
        }
        Sig::SoundfileBuffer { sf, chan, ridx } => {
            let sf = t.resolve(g, sf)?;
            let chan = t.resolve(g, chan)?;
            let ridx = t.resolve(g, ridx)?;
            Ok(g.sig_soundfile_buffer(sf, chan, ridx))
        }

        Sig::Attach(x, y) => {
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            Ok(g.sig_attach(x, y))
        }
        Sig::Enable(x, y) => {
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            Ok(g.sig_enable(x, y))
        }
        Sig::Control(x, y) => {
            let x = t.resolve(g, x)?;
            let y = t.resolve(g, y)?;
            Ok(g.sig_control(x, y))
        }
    }
}

// ── SigIdentity pass ────────────────────────────────────────────────────────

/// The default pass: a structure-preserving deep copy with memoized
/// sharing. Mostly useful as the base line other passes are measured
/// against, and for revalidating a graph end to end.
#[derive(Debug, Default)]
pub struct SigIdentity {
    cache: RewriteCache,
    visit_gen: bool,
}

impl SigIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity pass that also descends into table-generator subtrees.
    pub fn with_generator_visit() -> Self {
        Self {
            cache: RewriteCache::new(),
            visit_gen: true,
        }
    }
}

impl Transform for SigIdentity {
    fn cache_mut(&mut self) -> &mut RewriteCache {
        &mut self.cache
    }

    fn visit_generators(&self) -> bool {
        self.visit_gen
    }

    fn rewrite(&mut self, g: &mut SignalGraph, sig: SigId) -> Result<SigId, TransformError> {
        rewrite_children(self, g, sig)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
