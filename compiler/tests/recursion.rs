// Integration tests for recursive groups: cycle termination, definition
// republishing, and cast insertion inside feedback loops.

use sigc::graph::{GraphFile, SignalGraph};
use sigc::identity::SigIdentity;
use sigc::promotion::promote;
use sigc::sig::{BinOp, Sig};
use sigc::transform::Transform;
use sigc::types::NatureTable;

#[test]
fn identity_terminates_on_simple_feedback() {
    // eq0 = proj0 + input(0), the one-pole integrator shape
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let p = g.sig_proj(0, grp);
    let x = g.sig_input(0);
    let eq = g.sig_add(p, x);
    g.define_rec_group(grp, vec![eq]);
    let root = g.sig_output(0, p);
    let before = g.len();

    let out = SigIdentity::new().resolve(&mut g, root).unwrap();
    assert_eq!(out, root);
    assert_eq!(g.len(), before);

    let var = g.group_var(grp).unwrap();
    assert_eq!(g.rec_def(var), Some(&[eq][..]));
}

#[test]
fn identity_terminates_on_mutually_recursive_groups() {
    // groups referencing each other's projections: both cycles must break
    let mut g = SignalGraph::new();
    let ga = g.new_rec_group();
    let gb = g.new_rec_group();
    let pa = g.sig_proj(0, ga);
    let pb = g.sig_proj(0, gb);
    let x = g.sig_input(0);
    let eq_a = g.sig_add(pb, x);
    let half = g.sig_real(0.5);
    let eq_b = g.sig_mul(pa, half);
    g.define_rec_group(ga, vec![eq_a]);
    g.define_rec_group(gb, vec![eq_b]);
    let root = g.sig_output(0, pa);

    let out = SigIdentity::new().resolve(&mut g, root).unwrap();
    assert_eq!(out, root);

    let va = g.group_var(ga).unwrap();
    let vb = g.group_var(gb).unwrap();
    assert_eq!(g.rec_def(va), Some(&[eq_a][..]));
    assert_eq!(g.rec_def(vb), Some(&[eq_b][..]));
}

#[test]
fn undefined_group_passes_through_unchanged() {
    // a group whose equations were never published is the caller's problem;
    // the pass just keeps the reference
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let out = SigIdentity::new().resolve(&mut g, grp).unwrap();
    assert_eq!(out, grp);
    let var = g.group_var(grp).unwrap();
    assert!(g.rec_def(var).is_none());
}

#[test]
fn promotion_republishes_rewritten_equations_on_the_same_group() {
    // eq0 = intCast(proj0) * 0.5: the loop body mixes natures
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let p = g.sig_proj(0, grp);
    let trunc = g.sig_int_cast(p);
    let half = g.sig_real(0.5);
    let eq = g.sig_mul(trunc, half);
    g.define_rec_group(grp, vec![eq]);
    let root = g.sig_output(0, p);

    let t = NatureTable::infer(&g, &[root]);
    let out = promote(&mut g, &t, root).unwrap();
    assert_eq!(out, root); // the group node keeps its identity

    let var = g.group_var(grp).unwrap();
    let eqs = g.rec_def(var).unwrap().to_vec();
    assert_eq!(eqs.len(), 1);
    let cast = g.sig_float_cast(trunc);
    assert_eq!(g.node(eqs[0]), &Sig::BinOp(BinOp::Mul, cast, half));
}

#[test]
fn multi_equation_group_keeps_arity_through_promotion() {
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let p0 = g.sig_proj(0, grp);
    let p1 = g.sig_proj(1, grp);
    let x = g.sig_input(0);
    let one = g.sig_int(1);
    let eq0 = g.sig_add(p1, x); // real feedback
    let eq1 = g.sig_add(p0, one); // mixed: p0 is real, 1 is int
    g.define_rec_group(grp, vec![eq0, eq1]);
    let r0 = g.sig_output(0, p0);
    let r1 = g.sig_output(1, p1);

    let t = NatureTable::infer(&g, &[r0, r1]);
    let out = promote(&mut g, &t, r0).unwrap();
    assert_eq!(out, r0);

    let var = g.group_var(grp).unwrap();
    let eqs = g.rec_def(var).unwrap().to_vec();
    assert_eq!(eqs.len(), 2);
    assert_eq!(eqs[0], eq0); // both operands real already
    let cone = g.sig_float_cast(one);
    assert_eq!(g.node(eqs[1]), &Sig::BinOp(BinOp::Add, p0, cone));
}

#[test]
fn nodes_shared_between_loop_body_and_outside_stay_shared() {
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let p = g.sig_proj(0, grp);
    let i = g.sig_int(2);
    let r = g.sig_real(0.5);
    let shared = g.sig_mul(i, r); // promoted to (floatCast(2) * 0.5)
    let eq = g.sig_add(p, shared);
    g.define_rec_group(grp, vec![eq]);
    let outer = g.sig_add(p, shared);
    let root = g.sig_output(0, outer);

    let t = NatureTable::infer(&g, &[root]);
    let out = promote(&mut g, &t, root).unwrap();

    // pull the promoted `shared` from both places and compare ids
    let var = g.group_var(grp).unwrap();
    let eqs = g.rec_def(var).unwrap().to_vec();
    let Sig::BinOp(BinOp::Add, _, in_loop) = g.node(eqs[0]).clone() else {
        panic!("expected add equation");
    };
    let Sig::Output(_, o) = g.node(out).clone() else {
        panic!("expected output root");
    };
    let Sig::BinOp(BinOp::Add, _, outside) = g.node(o).clone() else {
        panic!("expected add at root");
    };
    assert_eq!(in_loop, outside);
}

#[test]
fn group_variable_without_a_slot_is_unrecognized() {
    // unconstructible through the API (constructors always allocate the
    // slot) but reachable through deserialized input
    let json = r#"{"graph":{"nodes":[{"RecGroup":{"var":3}}],"rec_defs":[]},"roots":[0]}"#;
    let mut file: GraphFile = serde_json::from_str(json).unwrap();
    let root = file.roots[0];
    let err = SigIdentity::new()
        .resolve(&mut file.graph, root)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unrecognized signal"), "{msg}");
    assert!(msg.contains("W3"), "{msg}");
}

#[test]
fn promotion_is_idempotent_across_the_loop() {
    let mut g = SignalGraph::new();
    let grp = g.new_rec_group();
    let p = g.sig_proj(0, grp);
    let trunc = g.sig_int_cast(p);
    let half = g.sig_real(0.5);
    let eq = g.sig_mul(trunc, half);
    g.define_rec_group(grp, vec![eq]);
    let root = g.sig_output(0, p);

    let t = NatureTable::infer(&g, &[root]);
    let once = promote(&mut g, &t, root).unwrap();
    let len_once = g.len();

    // natures must be re-certified for the nodes the first run inserted
    let t2 = NatureTable::infer(&g, &[once]);
    let twice = promote(&mut g, &t2, once).unwrap();
    assert_eq!(twice, once);
    assert_eq!(g.len(), len_once);
}
