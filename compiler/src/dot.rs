// dot.rs — Graphviz DOT output for signal graphs
//
// Renders the subgraph reachable from the given roots into DOT format
// suitable for `dot`, `neato`, or other Graphviz layout engines. Cast nodes
// are highlighted so the effect of the promotion pass is visible at a
// glance; recursive-group equations are drawn as dashed edges.
//
// Preconditions: roots refer to valid nodes.
// Postconditions: returns a valid DOT string; node order is deterministic.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::graph::SignalGraph;
use crate::sig::{Sig, SigId};

/// Emit the reachable subgraph as a Graphviz DOT string.
pub fn emit_dot(g: &SignalGraph, roots: &[SigId]) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph signals {{").unwrap();
    writeln!(buf, "    rankdir=BT;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];").unwrap();
    writeln!(buf).unwrap();

    // reachable() returns ascending id order, keeping output deterministic
    let nodes = g.reachable(roots);

    for &id in &nodes {
        let node = g.node(id);
        let style = if matches!(node, Sig::IntCast(_) | Sig::FloatCast(_)) {
            ", style=filled, fillcolor=lightgoldenrod"
        } else {
            ""
        };
        writeln!(buf, "    {id} [label=\"{}\"{style}];", node_label(node)).unwrap();
    }
    writeln!(buf).unwrap();

    for &id in &nodes {
        let node = g.node(id);
        for child in node.children() {
            writeln!(buf, "    {id} -> {child};").unwrap();
        }
        if let Sig::RecGroup { var } = node {
            if let Some(eqs) = g.rec_def(*var) {
                for (i, eq) in eqs.iter().enumerate() {
                    writeln!(buf, "    {id} -> {eq} [style=dashed, label=\"eq{i}\"];").unwrap();
                }
            }
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

/// Compact label for one node.
fn node_label(node: &Sig) -> String {
    match node {
        Sig::IntConst(n) => format!("{n}"),
        Sig::RealConst(r) => format!("{r}"),
        Sig::Input(ch) => format!("input {ch}"),
        Sig::Output(ch, _) => format!("output {ch}"),
        Sig::BinOp(op, ..) => escape(op.symbol()),
        Sig::Proj { idx, .. } => format!("proj {idx}"),
        Sig::RecGroup { var } => format!("rec {var}"),
        Sig::Ffun { name, .. } => format!("ffun {name}"),
        Sig::Fconst { name, .. } => format!("fconst {name}"),
        Sig::Fvar { name, .. } => format!("fvar {name}"),
        Sig::Table { id, .. } => format!("table {}", id.0),
        Sig::WrTbl { id, .. } => format!("writetable {}", id.0),
        Sig::Button { label }
        | Sig::Checkbox { label }
        | Sig::VSlider { label, .. }
        | Sig::HSlider { label, .. }
        | Sig::NumEntry { label, .. }
        | Sig::VBargraph { label, .. }
        | Sig::HBargraph { label, .. }
        | Sig::Soundfile { label } => format!("{} {}", node.opcode(), escape(label)),
        other => other.opcode().to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ───────────────────────────────────────────────────────────────────
