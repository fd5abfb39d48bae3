use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::dimension::{Dimension, DiscreteMember};
use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::interval_set::IntervalSet;
use crate::math::segment;
use crate::polynomial::Polynomial;

/// How many members of a discrete set get marked significant on their dimension.
const MAX_MEMBERS_TO_DISPLAY: usize = 10;

/// Discrete sets render at most this many members.
const DISPLAY_LIMIT: usize = 20;

/// Parameters a set was built from.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Trapezoidal {
        kernel: (f64, f64),
        support: (f64, f64),
    },
    /// Piecewise quadratic rise and fall through the crossover points
    Quadratic {
        kernel: (f64, f64),
        support: (f64, f64),
        crossover: (f64, f64),
    },
    Bell {
        peak: f64,
        crossover_distance: f64,
        support_distance: f64,
    },
    Singleton {
        value: f64,
    },
    Universe,
    Empty,
    Discrete,
    /// Linear interpolation between `(x, μ)` coordinates
    Polyline(Vec<(f64, f64)>),
    Intervals,
}

/// Fuzzy set over exactly one dimension, the leaf of every relation.
#[derive(Clone, Debug)]
pub struct FuzzySet {
    caption: String,
    shape: Shape,
    intervals: IntervalSet,
    members: Vec<(DiscreteMember, f64)>,
}

impl FuzzySet {
    fn build(caption: &str, shape: Shape, mut intervals: IntervalSet) -> Result<Self> {
        intervals.check()?;

        Ok(FuzzySet {
            caption: caption.to_owned(),
            shape,
            intervals,
            members: Vec::new(),
        })
    }

    /// Membership 1 on `kernel`, linear edges down to 0 at the ends of `support`.
    pub fn trapezoidal(
        dimension: &Arc<Dimension>,
        caption: &str,
        kernel: RangeInclusive<f64>,
        support: RangeInclusive<f64>,
    ) -> Result<Self> {
        let (kernel_min, kernel_max) = kernel.into_inner();
        let (support_min, support_max) = support.into_inner();
        let (min, max) = continuous_bounds(dimension, caption)?;

        if kernel_min > kernel_max {
            return Err(Error::shape(caption, "kernel minimum must not exceed the kernel maximum"));
        }

        if support_min > support_max {
            return Err(Error::shape(caption, "support minimum must not exceed the support maximum"));
        }

        if support_min > kernel_min || support_max < kernel_max {
            return Err(Error::shape(caption, "support must be at least as broad as the kernel"));
        }

        if support_min == support_max {
            return Err(Error::shape(caption, "support must have a non-zero width"));
        }

        if support_min < min || support_max > max {
            return Err(Error::shape(caption, "support exceeds the universe of the dimension"));
        }

        let mut intervals = IntervalSet::new(dimension.clone());

        if min < support_min {
            intervals.add_interval(Interval::constant(min, support_min, 0.)?)?;
        }

        if support_min < kernel_min {
            let rising = segment((support_min, 0.), (kernel_min, 1.));

            intervals.add_interval(Interval::new(support_min, kernel_min, rising)?)?;
        }

        if kernel_min < kernel_max {
            intervals.add_interval(Interval::constant(kernel_min, kernel_max, 1.)?)?;
        }

        if kernel_max < support_max {
            let falling = segment((kernel_max, 1.), (support_max, 0.));

            intervals.add_interval(Interval::new(kernel_max, support_max, falling)?)?;
        }

        if support_max < max {
            intervals.add_interval(Interval::constant(support_max, max, 0.)?)?;
        }

        let shape = Shape::Trapezoidal {
            kernel: (kernel_min, kernel_max),
            support: (support_min, support_max),
        };

        Self::build(caption, shape, intervals)
    }

    pub fn triangular(
        dimension: &Arc<Dimension>,
        caption: &str,
        peak: f64,
        support_min: f64,
        support_max: f64,
    ) -> Result<Self> {
        Self::trapezoidal(dimension, caption, peak..=peak, support_min..=support_max)
    }

    /// Triangle of total `width` centered at `peak`.
    pub fn symmetric_triangular(dimension: &Arc<Dimension>, caption: &str, peak: f64, width: f64) -> Result<Self> {
        Self::triangular(dimension, caption, peak, peak - width / 2., peak + width / 2.)
    }

    /// 0 up to `support_bound`, rising to 1 at `kernel_bound` and staying there.
    pub fn left_linear(dimension: &Arc<Dimension>, caption: &str, support_bound: f64, kernel_bound: f64) -> Result<Self> {
        if kernel_bound < support_bound {
            return Err(Error::shape(caption, "kernel bound must not be lower than the support bound"));
        }

        let max = dimension.max_value();

        Self::trapezoidal(dimension, caption, kernel_bound..=max, support_bound..=max)
    }

    /// 1 up to `kernel_bound`, falling to 0 at `support_bound` and staying there.
    pub fn right_linear(dimension: &Arc<Dimension>, caption: &str, kernel_bound: f64, support_bound: f64) -> Result<Self> {
        if kernel_bound > support_bound {
            return Err(Error::shape(caption, "kernel bound must not be higher than the support bound"));
        }

        let min = dimension.min_value();

        Self::trapezoidal(dimension, caption, min..=kernel_bound, min..=support_bound)
    }

    /// Smooth trapezoid: each edge consists of two parabolas meeting at the crossover
    /// point, where the membership is 0.5.
    pub fn quadratic(
        dimension: &Arc<Dimension>,
        caption: &str,
        kernel: RangeInclusive<f64>,
        support: RangeInclusive<f64>,
        crossover: RangeInclusive<f64>,
    ) -> Result<Self> {
        let (kernel_min, kernel_max) = kernel.into_inner();
        let (support_min, support_max) = support.into_inner();
        let (crossover_lower, crossover_upper) = crossover.into_inner();
        let (min, max) = continuous_bounds(dimension, caption)?;

        if kernel_min > kernel_max {
            return Err(Error::shape(caption, "kernel minimum must not exceed the kernel maximum"));
        }

        if support_min >= support_max {
            return Err(Error::shape(caption, "support minimum must be lower than the support maximum"));
        }

        if support_min > kernel_min || support_max < kernel_max {
            return Err(Error::shape(caption, "support must be at least as broad as the kernel"));
        }

        if crossover_lower < support_min || crossover_lower > kernel_min {
            return Err(Error::shape(caption, "lower crossover must lie between the support minimum and kernel minimum"));
        }

        if crossover_upper > support_max || crossover_upper < kernel_max {
            return Err(Error::shape(caption, "upper crossover must lie between the kernel maximum and support maximum"));
        }

        if support_min < min || support_max > max {
            return Err(Error::shape(caption, "support exceeds the universe of the dimension"));
        }

        let mut intervals = IntervalSet::new(dimension.clone());

        if kernel_min > min {
            if !(support_min < crossover_lower && crossover_lower < kernel_min) {
                return Err(Error::shape(caption, "rising edge needs support minimum < lower crossover < kernel minimum"));
            }

            let m = 1. / (2. * (crossover_lower - support_min).powi(2));
            let k = -1. / (2. * (kernel_min - crossover_lower).powi(2));

            if min < support_min {
                intervals.add_interval(Interval::constant(min, support_min, 0.)?)?;
            }

            intervals.add_interval(parabola(support_min, crossover_lower, m, support_min, 0.)?)?;
            intervals.add_interval(parabola(crossover_lower, kernel_min, k, kernel_min, 1.)?)?;
        }

        if kernel_min < kernel_max {
            intervals.add_interval(Interval::constant(kernel_min, kernel_max, 1.)?)?;
        }

        if kernel_max < max {
            if !(kernel_max < crossover_upper && crossover_upper < support_max) {
                return Err(Error::shape(caption, "falling edge needs kernel maximum < upper crossover < support maximum"));
            }

            let l = -1. / (2. * (crossover_upper - kernel_max).powi(2));
            let n = 1. / (2. * (crossover_upper - support_max).powi(2));

            intervals.add_interval(parabola(kernel_max, crossover_upper, l, kernel_max, 1.)?)?;
            intervals.add_interval(parabola(crossover_upper, support_max, n, support_max, 0.)?)?;

            if support_max < max {
                intervals.add_interval(Interval::constant(support_max, max, 0.)?)?;
            }
        }

        let shape = Shape::Quadratic {
            kernel: (kernel_min, kernel_max),
            support: (support_min, support_max),
            crossover: (crossover_lower, crossover_upper),
        };

        Self::build(caption, shape, intervals)
    }

    /// Quadratic rise from `support_bound` through `crossover` to 1 at `kernel_bound`.
    pub fn left_quadratic(
        dimension: &Arc<Dimension>,
        caption: &str,
        support_bound: f64,
        crossover: f64,
        kernel_bound: f64,
    ) -> Result<Self> {
        if kernel_bound < support_bound {
            return Err(Error::shape(caption, "kernel bound must be higher than the support bound"));
        }

        let max = dimension.max_value();

        Self::quadratic(
            dimension,
            caption,
            kernel_bound..=max,
            support_bound..=max,
            crossover..=max,
        )
    }

    /// Quadratic fall from 1 at `kernel_bound` through `crossover` to 0 at `support_bound`.
    pub fn right_quadratic(
        dimension: &Arc<Dimension>,
        caption: &str,
        kernel_bound: f64,
        crossover: f64,
        support_bound: f64,
    ) -> Result<Self> {
        if kernel_bound > support_bound {
            return Err(Error::shape(caption, "kernel bound must be lower than the support bound"));
        }

        let min = dimension.min_value();

        Self::quadratic(
            dimension,
            caption,
            min..=kernel_bound,
            min..=support_bound,
            min..=crossover,
        )
    }

    /// Symmetric quadratic bell peaking at `peak`.
    pub fn bell(
        dimension: &Arc<Dimension>,
        caption: &str,
        peak: f64,
        crossover_distance: f64,
        support_distance: f64,
    ) -> Result<Self> {
        if crossover_distance <= 0. || support_distance <= 0. {
            return Err(Error::shape(caption, "positive number expected to define a distance"));
        }

        if support_distance <= crossover_distance {
            return Err(Error::shape(caption, "support distance must be higher than the crossover distance"));
        }

        let mut set = Self::quadratic(
            dimension,
            caption,
            peak..=peak,
            peak - support_distance..=peak + support_distance,
            peak - crossover_distance..=peak + crossover_distance,
        )?;

        set.shape = Shape::Bell {
            peak,
            crossover_distance,
            support_distance,
        };

        Ok(set)
    }

    /// Membership 1 in exactly one point, 0 elsewhere.
    pub fn singleton(dimension: &Arc<Dimension>, caption: &str, value: f64) -> Result<Self> {
        let (min, max) = continuous_bounds(dimension, caption)?;

        if value < min || value > max {
            return Err(Error::shape(caption, format!("{value} is outside the universe")));
        }

        let mut intervals = IntervalSet::new(dimension.clone());

        if min < value {
            intervals.add_interval(Interval::constant(min, value, 0.)?)?;
        }

        intervals.add_interval(Interval::singleton(value, 1.))?;

        if value < max {
            intervals.add_interval(Interval::constant(value, max, 0.)?)?;
        }

        Self::build(caption, Shape::Singleton { value }, intervals)
    }

    pub fn universe(dimension: &Arc<Dimension>, caption: &str) -> Result<Self> {
        continuous_bounds(dimension, caption)?;

        Self::build(caption, Shape::Universe, IntervalSet::constant(dimension.clone(), 1.)?)
    }

    pub fn empty(dimension: &Arc<Dimension>, caption: &str) -> Result<Self> {
        continuous_bounds(dimension, caption)?;

        Self::build(caption, Shape::Empty, IntervalSet::constant(dimension.clone(), 0.)?)
    }

    /// Enumeration of `(member, degree)` pairs over a discrete dimension. Members left out
    /// have degree 0. The first few members are marked significant on the dimension.
    pub fn discrete<'m>(
        dimension: &Arc<Dimension>,
        caption: &str,
        members: impl IntoIterator<Item = (&'m DiscreteMember, f64)>,
    ) -> Result<Self> {
        if !dimension.is_discrete() {
            return Err(Error::shape(caption, format!("dimension \"{}\" is not discrete", dimension.name())));
        }

        let mut intervals = IntervalSet::new(dimension.clone());
        let mut listed: Vec<(DiscreteMember, f64)> = Vec::new();

        for (member, degree) in members {
            if member.dimension() != dimension.id() {
                return Err(Error::shape(
                    caption,
                    format!("member \"{member}\" belongs to another dimension"),
                ));
            }

            if !(0. ..=1.).contains(&degree) {
                return Err(Error::shape(
                    caption,
                    format!("membership degree {degree} for \"{member}\" does not belong to <0,1>"),
                ));
            }

            if listed.iter().any(|(m, _)| m.value() == member.value()) {
                return Err(Error::shape(caption, format!("member \"{member}\" listed twice")));
            }

            intervals.add_interval(Interval::singleton(f64::from(member.value()), degree))?;

            if dimension.significant_values().len() < MAX_MEMBERS_TO_DISPLAY {
                dimension.make_significant(f64::from(member.value()))?;
            }

            listed.push((member.clone(), degree));
        }

        let mut set = Self::build(caption, Shape::Discrete, intervals)?;

        set.members = listed;

        Ok(set)
    }

    /// Piecewise linear set through the `(x, μ)` coordinates, held constant before the
    /// first and after the last one.
    pub fn polyline(dimension: &Arc<Dimension>, caption: &str, points: &[(f64, f64)]) -> Result<Self> {
        let (min, max) = continuous_bounds(dimension, caption)?;
        let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) = (points.first(), points.last()) else {
            return Err(Error::shape(caption, "at least one coordinate is required"));
        };

        if points.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(Error::shape(caption, "coordinates must be strictly increasing in x"));
        }

        if let Some((x, y)) = points.iter().find(|(x, y)| !(0. ..=1.).contains(y) || *x < min || *x > max) {
            return Err(Error::shape(caption, format!("coordinate ({x}, {y}) is out of range")));
        }

        let mut intervals = IntervalSet::new(dimension.clone());

        if min < first_x {
            intervals.add_interval(Interval::constant(min, first_x, first_y)?)?;
        }

        for w in points.windows(2) {
            intervals.add_interval(Interval::new(w[0].0, w[1].0, segment(w[0], w[1]))?)?;
        }

        if last_x < max {
            intervals.add_interval(Interval::constant(last_x, max, last_y)?)?;
        }

        if min == max {
            intervals.add_interval(Interval::singleton(min, first_y))?;
        }

        Self::build(caption, Shape::Polyline(points.to_vec()), intervals)
    }

    /// Set from an arbitrary membership function, e.g. one obtained by projection. Over a
    /// discrete dimension every registered member is listed with its degree.
    pub fn from_intervals(caption: &str, intervals: IntervalSet) -> Result<Self> {
        let dimension = intervals.dimension().clone();
        let mut set = Self::build(caption, Shape::Intervals, intervals)?;

        if dimension.is_discrete() {
            set.members = dimension
                .members()
                .into_iter()
                .map(|member| {
                    let degree = set.intervals.membership_degree(f64::from(member.value()))?;

                    Ok((member, degree))
                })
                .collect::<Result<_>>()?;
        }

        Ok(set)
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dimension(&self) -> &Arc<Dimension> {
        self.intervals.dimension()
    }

    pub fn intervals(&self) -> &IntervalSet {
        &self.intervals
    }

    pub fn membership_degree(&self, x: f64) -> Result<f64> {
        self.intervals.membership_degree(x)
    }

    /// True if both sets share the dimension and agree everywhere on it.
    pub fn equals(&self, other: &FuzzySet) -> Result<bool> {
        self.intervals.equals(&other.intervals)
    }

    /// True if `other` is a subset of `self`: `μ_other(x) <= μ_self(x)` everywhere.
    pub fn includes(&self, other: &FuzzySet) -> Result<bool> {
        self.intervals.includes(&other.intervals)
    }

    pub fn is_subset_of(&self, other: &FuzzySet) -> Result<bool> {
        other.includes(self)
    }

    pub fn is_proper_subset_of(&self, other: &FuzzySet) -> Result<bool> {
        Ok(other.includes(self)? && !self.equals(other)?)
    }

    pub fn is_proper_superset_of(&self, other: &FuzzySet) -> Result<bool> {
        Ok(self.includes(other)? && !self.equals(other)?)
    }

    /// Members listed in a discrete set, in the order they were given.
    pub fn members(&self) -> impl Iterator<Item = &DiscreteMember> {
        self.members.iter().map(|(m, _)| m)
    }

    pub fn member_degree(&self, member: &DiscreteMember) -> Option<f64> {
        self.members
            .iter()
            .find(|(m, _)| m.value() == member.value() && m.dimension() == member.dimension())
            .map(|(_, degree)| *degree)
    }

    pub fn member(&self, value: u32) -> Option<&DiscreteMember> {
        self.members().find(|m| m.value() == value)
    }

    /// Members with `minimum <= μ <= maximum`.
    pub fn members_between(&self, minimum: f64, maximum: f64) -> Result<Vec<&DiscreteMember>> {
        if !(0. ..=1.).contains(&minimum) || !(0. ..=1.).contains(&maximum) || maximum < minimum {
            return Err(Error::InvalidInputs(format!(
                "membership range <{minimum},{maximum}> must be an ascending range within <0,1>"
            )));
        }

        Ok(self
            .members
            .iter()
            .filter(|(_, degree)| (minimum..=maximum).contains(degree))
            .map(|(m, _)| m)
            .collect())
    }
}

fn continuous_bounds(dimension: &Dimension, caption: &str) -> Result<(f64, f64)> {
    if dimension.is_discrete() {
        return Err(Error::shape(caption, format!("dimension \"{}\" is not continuous", dimension.name())));
    }

    Ok((dimension.min_value(), dimension.max_value()))
}

/// `μ(x) = a·(x - vertex)² + offset` over `[lower, upper]`.
fn parabola(lower: f64, upper: f64, a: f64, vertex: f64, offset: f64) -> Result<Interval> {
    Interval::new(
        lower,
        upper,
        Polynomial::quadratic(a, -2. * a * vertex, a * vertex * vertex + offset),
    )
}

impl fmt::Display for FuzzySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape != Shape::Discrete {
            return write!(f, "{}", self.intervals);
        }

        for (i, (member, degree)) in self.members.iter().take(DISPLAY_LIMIT).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            write!(f, "({member},{degree:.5})")?;
        }

        if self.members.len() > DISPLAY_LIMIT {
            f.write_str("...")?;
        }

        Ok(())
    }
}

#[cfg(test)]
fn percent() -> Arc<Dimension> {
    let mut dims = crate::dimension::Dimensions::new();

    dims.add_continuous("Percent", "", "%", 0., 100.).unwrap()
}

#[test]
fn test_right_linear() {
    let cold = FuzzySet::right_linear(&percent(), "cold", 20., 40.).unwrap();

    for (x, expected) in [(0., 1.), (20., 1.), (25., 0.75), (30., 0.5), (40., 0.), (41., 0.), (100., 0.)] {
        assert_eq!(cold.membership_degree(x).unwrap(), expected, "at {x}");
    }

    assert!(FuzzySet::right_linear(&percent(), "bad", 50., 40.).is_err());
}

#[test]
fn test_left_linear() {
    let high = FuzzySet::left_linear(&percent(), "high", 60., 80.).unwrap();

    for (x, expected) in [(0., 0.), (60., 0.), (70., 0.5), (80., 1.), (100., 1.)] {
        assert_eq!(high.membership_degree(x).unwrap(), expected, "at {x}");
    }
}

#[test]
fn test_trapezoid_and_triangle() {
    let dim = percent();
    let warm = FuzzySet::trapezoidal(&dim, "warm", 40.0..=60., 20.0..=80.).unwrap();

    assert_eq!(warm.membership_degree(30.).unwrap(), 0.5);
    assert_eq!(warm.membership_degree(50.).unwrap(), 1.);
    assert_eq!(warm.membership_degree(70.).unwrap(), 0.5);
    assert_eq!(warm.intervals().len(), 5);

    let peak = FuzzySet::triangular(&dim, "peak", 50., 30., 70.).unwrap();

    assert_eq!(peak.membership_degree(50.).unwrap(), 1.);
    assert_eq!(peak.membership_degree(40.).unwrap(), 0.5);
    assert!(peak.equals(&FuzzySet::symmetric_triangular(&dim, "same", 50., 40.).unwrap()).unwrap());

    assert!(FuzzySet::trapezoidal(&dim, "bad", 10.0..=60., 20.0..=80.).is_err());
    assert!(FuzzySet::trapezoidal(&dim, "wide", 40.0..=60., -10.0..=80.).is_err());
}

#[test]
fn test_zero_width_support() {
    let dim = percent();

    assert!(FuzzySet::trapezoidal(&dim, "spike", 50.0..=50., 50.0..=50.).is_err());
    assert!(FuzzySet::triangular(&dim, "spike", 50., 50., 50.).is_err());
    assert!(FuzzySet::trapezoidal(&dim, "edge", 0.0..=0., 0.0..=0.).is_err());
    assert!(FuzzySet::right_linear(&dim, "edge", 0., 0.).is_err());
    assert!(FuzzySet::triangular(&dim, "narrow", 50., 49., 51.).is_ok());
}

#[test]
fn test_quadratic_shapes() {
    let dim = percent();
    let rising = FuzzySet::left_quadratic(&dim, "rising", 0., 15., 20.).unwrap();

    assert_eq!(rising.membership_degree(0.).unwrap(), 0.);
    assert_eq!(rising.membership_degree(15.).unwrap(), 0.5);
    assert_eq!(rising.membership_degree(20.).unwrap(), 1.);
    assert_eq!(rising.membership_degree(90.).unwrap(), 1.);

    let falling = FuzzySet::right_quadratic(&dim, "falling", 20., 30., 40.).unwrap();

    assert_eq!(falling.membership_degree(10.).unwrap(), 1.);
    assert_eq!(falling.membership_degree(30.).unwrap(), 0.5);
    assert_eq!(falling.membership_degree(40.).unwrap(), 0.);

    let bell = FuzzySet::bell(&dim, "bell", 50., 10., 20.).unwrap();

    assert_eq!(bell.membership_degree(50.).unwrap(), 1.);
    assert_eq!(bell.membership_degree(40.).unwrap(), 0.5);
    assert_eq!(bell.membership_degree(60.).unwrap(), 0.5);
    assert_eq!(bell.membership_degree(75.).unwrap(), 0.);
    assert!(FuzzySet::bell(&dim, "flat", 50., 20., 10.).is_err());
    assert!(FuzzySet::left_quadratic(&dim, "degenerate", 15., 15., 20.).is_err());
}

#[test]
fn test_singleton_universe_empty() {
    let dim = percent();
    let point = FuzzySet::singleton(&dim, "exactly 42", 42.).unwrap();

    assert_eq!(point.membership_degree(42.).unwrap(), 1.);
    assert_eq!(point.membership_degree(41.9).unwrap(), 0.);

    let all = FuzzySet::universe(&dim, "all").unwrap();
    let none = FuzzySet::empty(&dim, "none").unwrap();

    assert!(all.includes(&point).unwrap());
    assert!(point.includes(&none).unwrap());
    assert!(none.is_proper_subset_of(&all).unwrap());
    assert!(!all.is_subset_of(&none).unwrap());
    assert!(all.is_proper_superset_of(&point).unwrap());
}

#[test]
fn test_polyline() {
    let dim = percent();
    let line = FuzzySet::polyline(&dim, "line", &[(10., 0.), (30., 1.), (50., 0.2)]).unwrap();

    assert_eq!(line.membership_degree(0.).unwrap(), 0.);
    assert_eq!(line.membership_degree(20.).unwrap(), 0.5);
    assert_eq!(line.membership_degree(40.).unwrap(), 0.6);
    assert_eq!(line.membership_degree(90.).unwrap(), 0.2);
    assert!(FuzzySet::polyline(&dim, "bad", &[(30., 0.), (10., 1.)]).is_err());
    assert!(FuzzySet::polyline(&dim, "bad", &[]).is_err());
}

#[test]
fn test_discrete() {
    let mut dims = crate::dimension::Dimensions::new();
    let fruit = dims.add_discrete("Fruit", "");
    let apple = fruit.register_member("apple").unwrap();
    let pear = fruit.register_member("pear").unwrap();
    let plum = fruit.register_member("plum").unwrap();
    let sweet = FuzzySet::discrete(&fruit, "sweet", [(&apple, 0.5), (&pear, 1.)]).unwrap();

    assert_eq!(sweet.membership_degree(2.).unwrap(), 1.);
    assert_eq!(sweet.membership_degree(3.).unwrap(), 0.);
    assert_eq!(sweet.member_degree(&apple), Some(0.5));
    assert_eq!(sweet.member_degree(&plum), None);
    assert_eq!(sweet.members_between(0.6, 1.).unwrap(), vec![&pear]);
    assert!(sweet.members_between(0.6, 0.2).is_err());
    assert_eq!(sweet.to_string(), "(apple,0.50000),(pear,1.00000)");
    assert_eq!(fruit.significant_values(), vec![1., 2.]);
    assert!(FuzzySet::discrete(&fruit, "bad", [(&apple, 1.5)]).is_err());
    assert!(FuzzySet::universe(&fruit, "all").is_err());
}

#[test]
fn test_member_of_other_registry() {
    let mut first = crate::dimension::Dimensions::new();
    let mut second = crate::dimension::Dimensions::new();
    let fruit = first.add_discrete("Fruit", "");
    let veg = second.add_discrete("Vegetable", "");
    let apple = fruit.register_member("apple").unwrap();
    let leek = veg.register_member("leek").unwrap();

    assert_eq!(fruit.key(), veg.key());
    assert!(FuzzySet::discrete(&veg, "green", [(&leek, 1.)]).is_ok());
    assert!(FuzzySet::discrete(&veg, "green", [(&apple, 1.)]).is_err());
}

#[test]
fn test_from_intervals_lists_discrete_members() {
    let mut dims = crate::dimension::Dimensions::new();
    let fruit = dims.add_discrete("Fruit", "");
    let apple = fruit.register_member("apple").unwrap();
    let pear = fruit.register_member("pear").unwrap();
    let plum = fruit.register_member("plum").unwrap();
    let sweet = FuzzySet::discrete(&fruit, "sweet", [(&apple, 0.5), (&pear, 1.)]).unwrap();
    let copy = FuzzySet::from_intervals("copy", sweet.intervals().clone()).unwrap();

    assert_eq!(copy.members().collect::<Vec<_>>(), vec![&apple, &pear, &plum]);
    assert_eq!(copy.member_degree(&pear), Some(1.));
    assert_eq!(copy.member_degree(&plum), Some(0.));
    assert_eq!(copy.members_between(0.4, 0.6).unwrap(), vec![&apple]);

    let all = FuzzySet::universe(&percent(), "all").unwrap();

    assert_eq!(FuzzySet::from_intervals("all", all.intervals().clone()).unwrap().members().count(), 0);
}
