use std::fmt;

use num::{Float, One, Zero};
use tracing::{debug, trace};

use crate::error::Result;
use crate::interval::Interval;
use crate::interval_set::{IntervalSet, SubRange};
use crate::polynomial::Polynomial;

/// `(lower, upper, polynomial)` produced for one piece of a merged function.
type Piece = (f64, f64, Polynomial);

/// Operator taking a single fuzzy relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Complement,
    /// Linguistic hedge "very"
    Intensification,
}

impl UnaryOp {
    pub fn caption(self) -> &'static str {
        match self {
            Self::Complement => "Complement",
            Self::Intensification => "Intensification",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Complement => "Complementary set implemented for set A as 1-μA(x), x∈U",
            Self::Intensification => {
                "Alteration corresponding to linguistic variable \"very\". Implemented as μA(x)^2, x∈U"
            },
        }
    }

    pub fn call<F: Float>(self, u: F) -> F {
        match self {
            Self::Complement => F::one() - u,
            Self::Intensification => u * u,
        }
    }

    /// Same as [`UnaryOp::call`], on a whole membership function.
    pub fn apply(self, set: &IntervalSet) -> Result<IntervalSet> {
        match self {
            Self::Complement => set.map(|p| &Polynomial::one() - p),
            Self::Intensification => set.map(|p| p.powi(2)),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// Operator combining two fuzzy relations. `M` variants are the min/max family, `A` the
/// algebraic one and `B` the bounded one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    AndM,
    AndA,
    AndB,
    OrM,
    OrA,
    OrB,
    /// Root-sum-square, `(μ1² + … + μn²) / n` across a chain of RSS nodes
    Rss,
}

impl BinaryOp {
    pub fn caption(self) -> &'static str {
        match self {
            Self::AndM => "And m",
            Self::AndA => "And a",
            Self::AndB => "And b",
            Self::OrM => "Or m",
            Self::OrA => "Or a",
            Self::OrB => "Or b",
            Self::Rss => "Root-Sum-Square",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AndM => "Intersection implemented as min(μA(x), μB(x)), x∈U",
            Self::AndA => "Intersection implemented as μA(x) * μB(x), x∈U",
            Self::AndB => "Intersection implemented as max(0, μA(x)+μB(x)-1), x∈U",
            Self::OrM => "Union implemented as max(μA(x), μB(x)), x∈U",
            Self::OrA => "Union implemented as μA(x)+μB(x)-μA(x)*μB(x), x∈U",
            Self::OrB => "Union implemented as min(1, μA(x)+μB(x)), x∈U",
            Self::Rss => {
                "Implemented as (μA1(x)^2+μA2(x)^2...μAn(x)^2)/n, x∈U. To be used together with \
                 Center-Of-Maximum defuzzification."
            },
        }
    }

    /// Combines two membership degrees. `Rss` on its own is the two-term chain.
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::AndM => F::min(u, v),
            Self::AndA => u * v,
            Self::AndB => F::max(F::zero(), u + v - F::one()),
            Self::OrM => F::max(u, v),
            Self::OrA => u + v - u * v,
            Self::OrB => F::min(F::one(), u + v),
            Self::Rss => RssChain::default().call(u, v, true),
        }
    }

    /// Same as [`BinaryOp::call`], on whole membership functions over one dimension.
    pub fn apply(self, a: &IntervalSet, b: &IntervalSet) -> Result<IntervalSet> {
        match self {
            Self::AndM => merge(a, b, |r| min_max_pieces(r, true)),
            Self::OrM => merge(a, b, |r| min_max_pieces(r, false)),
            Self::AndA => merge(a, b, |r| vec![(r.lower, r.upper, &r.first * &r.second)]),
            Self::OrA => merge(a, b, |r| {
                let sum = &r.first + &r.second;

                vec![(r.lower, r.upper, &sum - &(&r.first * &r.second))]
            }),
            Self::AndB => merge(a, b, |r| {
                let bounded = SubRange {
                    first: &(&r.first + &r.second) - &Polynomial::one(),
                    second: Polynomial::zero(),
                    ..*r
                };

                min_max_pieces(&bounded, false)
            }),
            Self::OrB => merge(a, b, |r| {
                let bounded = SubRange {
                    first: &r.first + &r.second,
                    second: Polynomial::one(),
                    ..*r
                };

                min_max_pieces(&bounded, true)
            }),
            Self::Rss => RssChain::default().apply(a, b, true),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// Bookkeeping of one RSS node within a chain of RSS nodes.
///
/// An operand that is itself an RSS node hands over its sum of squares undivided, so it is
/// neither squared again nor counted as a single term: its own terms are counted instead.
/// Only the outermost node of the chain divides by the total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RssChain {
    pub terms: u32,
    pub square_left: bool,
    pub square_right: bool,
}

impl Default for RssChain {
    fn default() -> Self {
        RssChain {
            terms: 2,
            square_left: true,
            square_right: true,
        }
    }
}

impl RssChain {
    /// Chain for a node whose operands are RSS nodes with the given chains, if they are.
    pub fn new(left: Option<&RssChain>, right: Option<&RssChain>) -> Self {
        let mut chain = RssChain::default();

        if let Some(left) = left {
            chain.square_left = false;
            chain.terms += left.terms - 1;
        }

        if let Some(right) = right {
            chain.square_right = false;
            chain.terms += right.terms - 1;
        }

        chain
    }

    pub fn call<F: Float>(&self, u: F, v: F, final_division: bool) -> F {
        let u = if self.square_left { u * u } else { u };
        let v = if self.square_right { v * v } else { v };
        let sum = u + v;

        if !final_division {
            return sum;
        }

        match F::from(self.terms) {
            Some(terms) => sum / terms,
            None => sum,
        }
    }

    pub fn apply(&self, a: &IntervalSet, b: &IntervalSet, final_division: bool) -> Result<IntervalSet> {
        if final_division {
            debug!("dividing RSS chain of {} terms", self.terms);
        }

        let divisor = if final_division { f64::from(self.terms) } else { 1. };

        merge(a, b, |r| {
            let first = if self.square_left { r.first.powi(2) } else { r.first.clone() };
            let second = if self.square_right { r.second.powi(2) } else { r.second.clone() };

            vec![(r.lower, r.upper, (first + second).scale(1. / divisor))]
        })
    }
}

/// Builds the combined function from the pieces `pieces` emits for every sub-range of the
/// common refinement of `a` and `b`.
fn merge(a: &IntervalSet, b: &IntervalSet, pieces: impl Fn(&SubRange) -> Vec<Piece>) -> Result<IntervalSet> {
    let mut out = IntervalSet::new(a.dimension().clone());

    for range in a.sub_ranges(b)? {
        for (lower, upper, polynomial) in pieces(&range) {
            let polynomial = polynomial.trimmed_on(lower, upper);

            out.add_interval(Interval::new(lower, upper, polynomial)?)?;
        }
    }

    out.check()?;

    Ok(out)
}

/// Pointwise minimum (or maximum) of the two polynomials of a sub-range.
///
/// The sub-range is split at the real roots of their difference, so within each piece one
/// operand dominates throughout; it is identified by the sign of the difference in the
/// middle of the piece. Neighbouring pieces won by the same operand are joined again.
pub(crate) fn min_max_pieces(range: &SubRange, minimum: bool) -> Vec<Piece> {
    let first_wins = |difference: f64| if minimum { difference <= 0. } else { difference >= 0. };
    let label = if minimum { "min" } else { "max" };

    if range.is_point() {
        let x = range.lower;
        let winner = if first_wins(range.first.eval(x) - range.second.eval(x)) {
            &range.first
        } else {
            &range.second
        };

        return vec![(x, x, winner.clone())];
    }

    let difference = &range.first - &range.second;

    if difference.is_negligible_on(range.lower, range.upper) {
        trace!("{label} on <{}, {}>: operands coincide", range.lower, range.upper);

        return vec![(range.lower, range.upper, range.first.clone())];
    }

    let mut cuts = vec![range.lower];

    cuts.extend(difference.real_roots(range.lower, range.upper));
    cuts.push(range.upper);
    cuts.dedup();

    let mut pieces: Vec<(f64, f64, bool)> = Vec::with_capacity(cuts.len());

    for window in cuts.windows(2) {
        let (lower, upper) = (window[0], window[1]);

        if lower >= upper {
            continue;
        }

        let first = first_wins(difference.eval((lower + upper) / 2.));

        trace!("{label} on <{lower}, {upper}>: operand {} wins", if first { 1 } else { 2 });

        match pieces.last_mut() {
            Some(last) if last.2 == first && last.1 == lower => last.1 = upper,
            _ => pieces.push((lower, upper, first)),
        }
    }

    pieces
        .into_iter()
        .map(|(lower, upper, first)| {
            let winner = if first { &range.first } else { &range.second };

            (lower, upper, winner.clone())
        })
        .collect()
}

#[cfg(test)]
fn ramps() -> (IntervalSet, IntervalSet) {
    let mut dims = crate::dimension::Dimensions::new();
    let dim = dims.add_continuous("Percent", "", "%", 0., 100.).unwrap();
    let mut rising = IntervalSet::new(dim.clone());

    rising.add_interval(Interval::linear(0., 100., 0.01, 0.).unwrap()).unwrap();
    rising.check().unwrap();

    let mut falling = IntervalSet::new(dim);

    falling.add_interval(Interval::linear(0., 100., -0.01, 1.).unwrap()).unwrap();
    falling.check().unwrap();

    (rising, falling)
}

#[test]
fn test_scalar() {
    assert_eq!(BinaryOp::AndM.call(0.3, 0.6), 0.3);
    assert_eq!(BinaryOp::OrM.call(0.3, 0.6), 0.6);
    assert!((BinaryOp::AndA.call(0.5, 0.6) - 0.3).abs() < 1e-12);
    assert!((BinaryOp::OrA.call(0.5, 0.6) - 0.8).abs() < 1e-12);
    assert_eq!(BinaryOp::AndB.call(0.25, 0.5), 0.);
    assert_eq!(BinaryOp::AndB.call(0.75, 0.5), 0.25);
    assert_eq!(BinaryOp::OrB.call(0.75, 0.5), 1.);
    assert_eq!(BinaryOp::OrB.call(0.25, 0.5), 0.75);
    assert_eq!(BinaryOp::Rss.call(0.5f32, 0.5), 0.25);
    assert_eq!(UnaryOp::Complement.call(0.25), 0.75);
    assert_eq!(UnaryOp::Intensification.call(0.5), 0.25);
    assert_eq!(BinaryOp::AndB.to_string(), "And b");
}

#[test]
fn test_min_max_split_at_crossing() {
    let (rising, falling) = ramps();
    let and = BinaryOp::AndM.apply(&rising, &falling).unwrap();
    let intervals = and.intervals().unwrap();

    assert_eq!(intervals.len(), 2);
    assert_eq!((intervals[0].lower(), intervals[0].upper()), (0., 50.));
    assert_eq!(intervals[0].polynomial(), rising.intervals().unwrap()[0].polynomial());
    assert_eq!(intervals[1].polynomial(), falling.intervals().unwrap()[0].polynomial());

    let or = BinaryOp::OrM.apply(&rising, &falling).unwrap();

    assert_eq!(or.membership_degree(50.).unwrap(), 0.5);
    assert_eq!(or.membership_degree(10.).unwrap(), 0.9);
    assert_eq!(or.membership_degree(80.).unwrap(), 0.8);
}

#[test]
fn test_symbolic_matches_scalar() {
    let (rising, falling) = ramps();

    for op in [
        BinaryOp::AndM,
        BinaryOp::AndA,
        BinaryOp::AndB,
        BinaryOp::OrM,
        BinaryOp::OrA,
        BinaryOp::OrB,
        BinaryOp::Rss,
    ] {
        let combined = op.apply(&rising, &falling).unwrap();

        for x in [0., 12.5, 30., 50., 64., 99., 100.] {
            let expected = op.call(rising.membership_degree(x).unwrap(), falling.membership_degree(x).unwrap());

            assert!(
                (combined.membership_degree(x).unwrap() - expected).abs() < 1e-5,
                "{op} at {x}"
            );
        }
    }

    for op in [UnaryOp::Complement, UnaryOp::Intensification] {
        let changed = op.apply(&rising).unwrap();

        for x in [0., 33., 100.] {
            let expected = op.call(rising.membership_degree(x).unwrap());

            assert!((changed.membership_degree(x).unwrap() - expected).abs() < 1e-5);
        }
    }
}

#[test]
fn test_bounded_ops_clip() {
    let (rising, falling) = ramps();
    let and = BinaryOp::AndB.apply(&rising, &rising).unwrap();

    // max(0, 0.02x - 1) crosses zero at 50
    assert_eq!(and.membership_degree(25.).unwrap(), 0.);
    assert_eq!(and.membership_degree(75.).unwrap(), 0.5);

    let or = BinaryOp::OrB.apply(&rising, &falling).unwrap();

    assert_eq!(or.membership_degree(30.).unwrap(), 1.);
}

#[test]
fn test_rss_chain() {
    let leaf = RssChain::default();
    let left_nested = RssChain::new(Some(&leaf), None);

    assert_eq!(left_nested.terms, 3);
    assert!(!left_nested.square_left && left_nested.square_right);

    let both_nested = RssChain::new(Some(&leaf), Some(&leaf));

    assert_eq!(both_nested.terms, 4);

    // ((a² + b²) + c²) / 3 with a = b = c = 0.6
    let inner = leaf.call(0.6, 0.6, false);

    assert!((left_nested.call(inner, 0.6, true) - 0.36).abs() < 1e-12);
}
