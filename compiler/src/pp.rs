// pp.rs — Textual rendering of signals
//
// Produces a deterministic, functional-style rendering of a signal for
// diagnostics and snapshot tests. Follows sharing naively (a shared node is
// printed once per occurrence) but is cycle-safe: a recursive group being
// printed renders as its bare binding variable when re-entered.
//
// Preconditions: every id reachable from the printed root is valid.
// Postconditions: output depends only on graph content (stable across runs).
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::collections::HashSet;
use std::fmt::Write;

use crate::graph::SignalGraph;
use crate::sig::{RecVar, Sig, SigId};

/// Render the signal rooted at `sig`.
pub fn render_sig(g: &SignalGraph, sig: SigId) -> String {
    let mut p = Printer {
        g,
        active: HashSet::new(),
        out: String::new(),
    };
    p.sig(sig);
    p.out
}

struct Printer<'g> {
    g: &'g SignalGraph,
    /// Groups currently being printed; re-entry prints the variable only.
    active: HashSet<RecVar>,
    out: String,
}

impl Printer<'_> {
    fn sig(&mut self, id: SigId) {
        let Some(node) = self.g.try_node(id) else {
            let _ = write!(self.out, "{id}<dangling>");
            return;
        };
        match node.clone() {
            Sig::IntConst(n) => {
                let _ = write!(self.out, "{n}");
            }
            Sig::RealConst(r) => {
                let _ = write!(self.out, "{r}");
            }
            Sig::Waveform(entries) => {
                self.out.push_str("waveform{");
                self.list(&entries);
                self.out.push('}');
            }

            Sig::Input(ch) => {
                let _ = write!(self.out, "input({ch})");
            }
            Sig::Output(ch, x) => {
                let _ = write!(self.out, "output({ch}, ");
                self.sig(x);
                self.out.push(')');
            }

            Sig::Delay1(x) => self.call("delay1", &[x]),
            Sig::FixDelay { sig, delay } => self.call("delay", &[sig, delay]),
            Sig::Prefix { init, sig } => self.call("prefix", &[init, sig]),
            Sig::Iota(n) => self.call("iota", &[n]),
            Sig::Gen(x) => self.call("gen", &[x]),

            Sig::BinOp(op, x, y) => {
                self.out.push('(');
                self.sig(x);
                let _ = write!(self.out, " {} ", op.symbol());
                self.sig(y);
                self.out.push(')');
            }

            Sig::Ffun { name, args, .. } => {
                let _ = write!(self.out, "ffun:{name}(");
                self.list(&args);
                self.out.push(')');
            }
            Sig::Fconst { name, .. } => {
                let _ = write!(self.out, "fconst:{name}");
            }
            Sig::Fvar { name, .. } => {
                let _ = write!(self.out, "fvar:{name}");
            }

            Sig::Table { id, size, init } => {
                let _ = write!(self.out, "table<{}>(", id.0);
                self.list(&[size, init]);
                self.out.push(')');
            }
            Sig::WrTbl {
                id,
                table,
                idx,
                data,
            } => {
                let _ = write!(self.out, "writetable<{}>(", id.0);
                self.list(&[table, idx, data]);
                self.out.push(')');
            }
            Sig::RdTbl { table, idx } => self.call("readtable", &[table, idx]),
            Sig::DocConstantTbl { size, init } => self.call("docconstanttbl", &[size, init]),
            Sig::DocWriteTbl {
                size,
                init,
                idx,
                data,
            } => self.call("docwritetbl", &[size, init, idx, data]),
            Sig::DocAccessTbl { table, idx } => self.call("docaccesstbl", &[table, idx]),

            Sig::Select2 { sel, x, y } => self.call("select2", &[sel, x, y]),
            Sig::Select3 { sel, x, y, z } => self.call("select3", &[sel, x, y, z]),

            Sig::Proj { idx, group } => {
                let _ = write!(self.out, "proj{idx}(");
                self.sig(group);
                self.out.push(')');
            }
            Sig::RecGroup { var } => {
                if self.active.contains(&var) {
                    let _ = write!(self.out, "{var}");
                    return;
                }
                match self.g.rec_def(var) {
                    None => {
                        let _ = write!(self.out, "letrec({var} = <open>)");
                    }
                    Some(eqs) => {
                        let eqs = eqs.to_vec();
                        self.active.insert(var);
                        let _ = write!(self.out, "letrec({var} = [");
                        for (i, &eq) in eqs.iter().enumerate() {
                            if i > 0 {
                                self.out.push_str("; ");
                            }
                            self.sig(eq);
                        }
                        self.out.push_str("])");
                        self.active.remove(&var);
                    }
                }
            }

            Sig::IntCast(x) => self.call("intCast", &[x]),
            Sig::FloatCast(x) => self.call("floatCast", &[x]),

            Sig::Button { label } => {
                let _ = write!(self.out, "button(\"{label}\")");
            }
            Sig::Checkbox { label } => {
                let _ = write!(self.out, "checkbox(\"{label}\")");
            }
            Sig::VSlider {
                label,
                init,
                min,
                max,
                step,
            } => self.labeled("vslider", &label, &[init, min, max, step]),
            Sig::HSlider {
                label,
                init,
                min,
                max,
                step,
            } => self.labeled("hslider", &label, &[init, min, max, step]),
            Sig::NumEntry {
                label,
                init,
                min,
                max,
                step,
            } => self.labeled("nentry", &label, &[init, min, max, step]),
            Sig::VBargraph {
                label,
                min,
                max,
                sig,
            } => self.labeled("vbargraph", &label, &[min, max, sig]),
            Sig::HBargraph {
                label,
                min,
                max,
                sig,
            } => self.labeled("hbargraph", &label, &[min, max, sig]),

            Sig::Soundfile { label } => {
                let _ = write!(self.out, "soundfile(\"{label}\")");
            }
            Sig::SoundfileLength(sf) => self.call("sf_length", &[sf]),
            Sig::SoundfileRate(sf) => self.call("sf_rate", &[sf]),
            Sig::SoundfileChannels(sf) => self.call("sf_channels", &[sf]),
            Sig::SoundfileBuffer { sf, chan, ridx } => {
                self.call("sf_buffer", &[sf, chan, ridx])
            }

            Sig::Attach(x, y) => self.call("attach", &[x, y]),
            Sig::Enable(x, y) => self.call("enable", &[x, y]),
            Sig::Control(x, y) => self.call("control", &[x, y]),
        }
    }

    fn call(&mut self, name: &str, args: &[SigId]) {
        let _ = write!(self.out, "{name}(");
        self.list(args);
        self.out.push(')');
    }

    fn labeled(&mut self, name: &str, label: &str, args: &[SigId]) {
        let _ = write!(self.out, "{name}(\"{label}\", ");
        self.list(args);
        self.out.push(')');
    }

    fn list(&mut self, args: &[SigId]) {
        for (i, &a) in args.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.sig(a);
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_and_operators() {
        let mut g = SignalGraph::new();
        let x = g.sig_input(0);
        let c = g.sig_real(0.5);
        let m = g.sig_mul(x, c);
        let one = g.sig_int(1);
        let a = g.sig_add(m, one);
        assert_eq!(render_sig(&g, a), "((input(0) * 0.5) + 1)");
    }

    #[test]
    fn whole_reals_keep_their_point() {
        let mut g = SignalGraph::new();
        let r = g.sig_real(2.0);
        assert_eq!(render_sig(&g, r), "2.0");
    }

    #[test]
    fn casts_and_selects() {
        let mut g = SignalGraph::new();
        let sel = g.sig_real(0.5);
        let csel = g.sig_int_cast(sel);
        let a = g.sig_int(1);
        let b = g.sig_int(2);
        let s = g.sig_select2(csel, a, b);
        assert_eq!(render_sig(&g, s), "select2(intCast(0.5), 1, 2)");
    }

    #[test]
    fn recursive_group_prints_once() {
        let mut g = SignalGraph::new();
        let grp = g.new_rec_group();
        let p = g.sig_proj(0, grp);
        let x = g.sig_input(0);
        let eq = g.sig_add(p, x);
        g.define_rec_group(grp, vec![eq]);

        assert_eq!(
            render_sig(&g, p),
            "proj0(letrec(W0 = [(proj0(W0) + input(0))]))"
        );
    }

    #[test]
    fn open_group_renders_as_such() {
        let mut g = SignalGraph::new();
        let grp = g.new_rec_group();
        assert_eq!(render_sig(&g, grp), "letrec(W0 = <open>)");
    }

    #[test]
    fn ui_and_foreign_nodes() {
        let mut g = SignalGraph::new();
        let init = g.sig_real(0.5);
        let min = g.sig_real(0.0);
        let max = g.sig_real(1.0);
        let step = g.sig_real(0.01);
        let sl = g.sig_vslider("gain", init, min, max, step);
        assert_eq!(
            render_sig(&g, sl),
            "vslider(\"gain\", 0.5, 0.0, 1.0, 0.01)"
        );

        let fc = g.sig_fconst("int", "SR", "math.h");
        assert_eq!(render_sig(&g, fc), "fconst:SR");
    }
}
