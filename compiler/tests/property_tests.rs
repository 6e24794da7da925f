// Property tests over randomly generated signal expressions: the identity
// pass is a no-op, and promotion always leaves arithmetic with matching
// operand natures, inserts no redundant casts, and is idempotent.

use proptest::prelude::*;

use sigc::graph::SignalGraph;
use sigc::identity::SigIdentity;
use sigc::promotion::promote;
use sigc::sig::{BinOp, Sig, SigId};
use sigc::transform::Transform;
use sigc::types::{Nature, NatureTable, TypeOracle};

// ── Expression plans ────────────────────────────────────────────────────────

/// Construction recipe, decoupled from the arena so a plan can be built
/// into any graph (and rebuilt to check hash-consing).
#[derive(Debug, Clone)]
enum Plan {
    Int(i64),
    Real(f64),
    Input(u32),
    Bin(BinOp, Box<Plan>, Box<Plan>),
    Delay(Box<Plan>, Box<Plan>),
    Select2(Box<Plan>, Box<Plan>, Box<Plan>),
    IntCast(Box<Plan>),
    FloatCast(Box<Plan>),
}

fn build(g: &mut SignalGraph, plan: &Plan) -> SigId {
    match plan {
        Plan::Int(n) => g.sig_int(*n),
        Plan::Real(r) => g.sig_real(*r),
        Plan::Input(ch) => g.sig_input(*ch),
        Plan::Bin(op, a, b) => {
            let a = build(g, a);
            let b = build(g, b);
            g.sig_bin_op(*op, a, b)
        }
        Plan::Delay(x, d) => {
            let x = build(g, x);
            let d = build(g, d);
            g.sig_fix_delay(x, d)
        }
        Plan::Select2(sel, x, y) => {
            let sel = build(g, sel);
            let x = build(g, x);
            let y = build(g, y);
            g.sig_select2(sel, x, y)
        }
        Plan::IntCast(x) => {
            let x = build(g, x);
            g.sig_int_cast(x)
        }
        Plan::FloatCast(x) => {
            let x = build(g, x);
            g.sig_float_cast(x)
        }
    }
}

fn op_strategy() -> impl Strategy<Value = BinOp> {
    prop_oneof![
        Just(BinOp::Add),
        Just(BinOp::Sub),
        Just(BinOp::Mul),
        Just(BinOp::Div),
        Just(BinOp::Rem),
        Just(BinOp::Lt),
        Just(BinOp::Ge),
    ]
}

fn plan_strategy() -> impl Strategy<Value = Plan> {
    let leaf = prop_oneof![
        (-100i64..100).prop_map(Plan::Int),
        (-100.0f64..100.0).prop_map(Plan::Real),
        (0u32..4).prop_map(Plan::Input),
    ];
    leaf.prop_recursive(5, 48, 3, |inner| {
        prop_oneof![
            (op_strategy(), inner.clone(), inner.clone())
                .prop_map(|(op, a, b)| Plan::Bin(op, Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(x, d)| Plan::Delay(Box::new(x), Box::new(d))),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(s, x, y)| Plan::Select2(Box::new(s), Box::new(x), Box::new(y))),
            inner.clone().prop_map(|x| Plan::IntCast(Box::new(x))),
            inner.prop_map(|x| Plan::FloatCast(Box::new(x))),
        ]
    })
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn identity_pass_is_a_noop(plan in plan_strategy()) {
        let mut g = SignalGraph::new();
        let root = build(&mut g, &plan);
        let before = g.len();

        let out = SigIdentity::new().resolve(&mut g, root).unwrap();
        prop_assert_eq!(out, root);
        prop_assert_eq!(g.len(), before);
    }

    #[test]
    fn rebuilding_a_plan_hits_the_cons_index(plan in plan_strategy()) {
        let mut g = SignalGraph::new();
        let first = build(&mut g, &plan);
        let len = g.len();
        let second = build(&mut g, &plan);
        prop_assert_eq!(first, second);
        prop_assert_eq!(g.len(), len);
    }

    #[test]
    fn promoted_graphs_have_unified_natures(plan in plan_strategy()) {
        let mut g = SignalGraph::new();
        let root = build(&mut g, &plan);
        let t = NatureTable::infer(&g, &[root]);
        let out = promote(&mut g, &t, root).unwrap();

        let t2 = NatureTable::infer(&g, &[out]);
        for id in g.reachable(&[out]) {
            match g.node(id) {
                Sig::BinOp(op, x, y) => {
                    let nx = t2.sig_type(*x).nature;
                    let ny = t2.sig_type(*y).nature;
                    if *op == BinOp::Div {
                        prop_assert_eq!(nx, Nature::Real);
                        prop_assert_eq!(ny, Nature::Real);
                    } else {
                        prop_assert_eq!(nx, ny);
                    }
                }
                Sig::FixDelay { delay, .. } => {
                    prop_assert_eq!(t2.sig_type(*delay).nature, Nature::Int);
                }
                Sig::Select2 { sel, x, y } => {
                    prop_assert_eq!(t2.sig_type(*sel).nature, Nature::Int);
                    prop_assert_eq!(t2.sig_type(*x).nature, t2.sig_type(*y).nature);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn promoted_graphs_contain_no_redundant_casts(plan in plan_strategy()) {
        let mut g = SignalGraph::new();
        let root = build(&mut g, &plan);
        let t = NatureTable::infer(&g, &[root]);
        let out = promote(&mut g, &t, root).unwrap();

        // a cast surviving promotion must actually change the nature
        let t2 = NatureTable::infer(&g, &[out]);
        for id in g.reachable(&[out]) {
            match g.node(id) {
                Sig::IntCast(x) => {
                    prop_assert_eq!(t2.sig_type(*x).nature, Nature::Real);
                }
                Sig::FloatCast(x) => {
                    prop_assert_eq!(t2.sig_type(*x).nature, Nature::Int);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn promotion_is_idempotent(plan in plan_strategy()) {
        let mut g = SignalGraph::new();
        let root = build(&mut g, &plan);
        let t = NatureTable::infer(&g, &[root]);
        let once = promote(&mut g, &t, root).unwrap();
        let len_once = g.len();

        let t2 = NatureTable::infer(&g, &[once]);
        let twice = promote(&mut g, &t2, once).unwrap();
        prop_assert_eq!(twice, once);
        prop_assert_eq!(g.len(), len_once);
    }
}
