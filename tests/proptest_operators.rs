//! Property tests for the operator algebra

use std::sync::Arc;

use fuzzy_relations::{BinaryOp, Dimension, Dimensions, Expr, FuzzySet, Inputs, Relations, UnaryOp};
use proptest::prelude::*;

/// Shapes over a universe of [0, 100] with strictly ordered breakpoints
#[derive(Clone, Debug)]
enum ShapeParams {
    Trapezoid(f64, f64, f64, f64),
    LeftLinear(f64, f64),
    RightLinear(f64, f64),
    LeftQuadratic(f64, f64, f64),
    Bell(f64, f64, f64),
}

fn arb_shape() -> impl Strategy<Value = ShapeParams> {
    prop_oneof![
        (0u32..40, 1u32..20, 0u32..20, 1u32..20).prop_map(|(a, b, c, d)| {
            let (s0, k0) = (a, a + b);
            let (k1, s1) = (k0 + c, k0 + c + d);

            ShapeParams::Trapezoid(f64::from(s0), f64::from(k0), f64::from(k1), f64::from(s1))
        }),
        (0u32..90, 1u32..=10).prop_map(|(s, w)| ShapeParams::LeftLinear(f64::from(s), f64::from(s + w))),
        (0u32..90, 1u32..=10).prop_map(|(k, w)| ShapeParams::RightLinear(f64::from(k), f64::from(k + w))),
        (0u32..80, 1u32..10, 1u32..10).prop_map(|(s, c, k)| {
            ShapeParams::LeftQuadratic(f64::from(s), f64::from(s + c), f64::from(s + c + k))
        }),
        (30u32..70, 1u32..10, 1u32..10).prop_map(|(p, c, s)| {
            ShapeParams::Bell(f64::from(p), f64::from(c), f64::from(c + s))
        }),
    ]
}

fn build(params: &ShapeParams, dimension: &Arc<Dimension>, caption: &str) -> Arc<FuzzySet> {
    let set = match *params {
        ShapeParams::Trapezoid(s0, k0, k1, s1) => FuzzySet::trapezoidal(dimension, caption, k0..=k1, s0..=s1),
        ShapeParams::LeftLinear(s, k) => FuzzySet::left_linear(dimension, caption, s, k),
        ShapeParams::RightLinear(k, s) => FuzzySet::right_linear(dimension, caption, k, s),
        ShapeParams::LeftQuadratic(s, c, k) => FuzzySet::left_quadratic(dimension, caption, s, c, k),
        ShapeParams::Bell(p, c, s) => FuzzySet::bell(dimension, caption, p, c, s),
    };

    Arc::new(set.unwrap())
}

fn universe() -> Arc<Dimension> {
    Dimensions::new().add_continuous("X", "", "", 0., 100.).unwrap()
}

fn is_member(expr: Expr, dimension: &Dimension, x: f64) -> f64 {
    let mut relations = Relations::new();
    let root = relations.insert(expr);
    let mut inputs = Inputs::new();

    inputs.add(dimension, x);

    relations.get(root).unwrap().is_member(&inputs).unwrap()
}

const BINARY_OPS: [BinaryOp; 7] = [
    BinaryOp::AndM,
    BinaryOp::AndA,
    BinaryOp::AndB,
    BinaryOp::OrM,
    BinaryOp::OrA,
    BinaryOp::OrB,
    BinaryOp::Rss,
];

proptest! {
    /// Every shape stays within [0, 1] across its universe
    #[test]
    fn membership_is_bounded(params in arb_shape(), x in 0.0..=100.0f64) {
        let dim = universe();
        let set = build(&params, &dim, "a");
        let degree = set.membership_degree(x).unwrap();

        prop_assert!((0. ..=1.).contains(&degree));
        prop_assert!((0. ..=1.).contains(&set.membership_degree(0.).unwrap()));
        prop_assert!((0. ..=1.).contains(&set.membership_degree(100.).unwrap()));
    }

    /// And-m and Or-m are the pointwise min and max, in either order
    #[test]
    fn min_max_commute(a in arb_shape(), b in arb_shape(), x in 0.0..=100.0f64) {
        let dim = universe();
        let (a, b) = (build(&a, &dim, "a"), build(&b, &dim, "b"));
        let (u, v) = (a.membership_degree(x).unwrap(), b.membership_degree(x).unwrap());

        prop_assert_eq!(is_member(Expr::set(&a) & &b, &dim, x), u.min(v));
        prop_assert_eq!(is_member(Expr::set(&b) & &a, &dim, x), u.min(v));
        prop_assert_eq!(is_member(Expr::set(&a) | &b, &dim, x), u.max(v));
        prop_assert_eq!(is_member(Expr::set(&b) | &a, &dim, x), u.max(v));
    }

    /// Complementing twice gives the set back
    #[test]
    fn double_complement(params in arb_shape(), x in 0.0..=100.0f64) {
        let dim = universe();
        let set = build(&params, &dim, "a");
        let twice = is_member(!!Expr::set(&set), &dim, x);

        prop_assert!((twice - set.membership_degree(x).unwrap()).abs() < 1e-12);

        let function = UnaryOp::Complement.apply(&UnaryOp::Complement.apply(set.intervals()).unwrap()).unwrap();

        prop_assert!(function.equals(set.intervals()).unwrap());
    }

    /// Symbolic operators agree with the scalar rule at every point
    #[test]
    fn symbolic_matches_scalar(a in arb_shape(), b in arb_shape(), x in 0.0..=100.0f64) {
        let dim = universe();
        let (a, b) = (build(&a, &dim, "a"), build(&b, &dim, "b"));
        let (u, v) = (a.membership_degree(x).unwrap(), b.membership_degree(x).unwrap());

        for op in BINARY_OPS {
            let function = op.apply(a.intervals(), b.intervals()).unwrap();
            let symbolic = function.membership_degree(x).unwrap();

            prop_assert!((symbolic - op.call(u, v)).abs() < 1e-4, "{} at {}: {} vs {}", op, x, symbolic, op.call(u, v));
        }

        for op in [UnaryOp::Complement, UnaryOp::Intensification] {
            let symbolic = op.apply(a.intervals()).unwrap().membership_degree(x).unwrap();

            prop_assert!((symbolic - op.call(u)).abs() < 1e-4);
        }
    }

    /// An RSS chain of n equal degrees v evaluates to v², however it is nested
    #[test]
    fn rss_chain_of_uniform_degrees(n in 2usize..7, v in 0.0..=1.0f64, balanced in any::<bool>()) {
        let dim = universe();
        let v = (v * 1000.).round() / 1000.;
        let leaves: Vec<_> = (0..n)
            .map(|i| Arc::new(FuzzySet::polyline(&dim, &format!("r{i}"), &[(50., v)]).unwrap()))
            .collect();
        let mut relations = Relations::new();
        let mut roots: Vec<_> = leaves.iter().map(|leaf| relations.insert(leaf)).collect();

        while roots.len() > 1 {
            roots = if balanced {
                roots
                    .chunks(2)
                    .map(|pair| match *pair {
                        [left, right] => relations.combine(left, BinaryOp::Rss, right).unwrap(),
                        [single] => single,
                        _ => unreachable!(),
                    })
                    .collect()
            } else {
                let (left, right) = (roots[0], roots[1]);
                let mut rest = vec![relations.combine(left, BinaryOp::Rss, right).unwrap()];

                rest.extend_from_slice(&roots[2..]);
                rest
            };
        }

        let root = relations.get(roots[0]).unwrap();
        let mut inputs = Inputs::new();

        inputs.add(&dim, 25.);

        prop_assert!((root.is_member(&inputs).unwrap() - v * v).abs() < 1e-9);

        let function = root.function(&Inputs::new()).unwrap();

        prop_assert!((function.membership_degree(75.).unwrap() - v * v).abs() < 1e-5);
    }
}
