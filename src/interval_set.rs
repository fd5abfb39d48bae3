use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use num::Zero;

use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::interval::{Interval, Plateau};
use crate::math::round_to;
use crate::polynomial::Polynomial;

/// Intervals rendered by `Display` before the listing is cut short.
const DISPLAY_LIMIT: usize = 20;

/// Decimals compared when deciding whether two polynomials are the same.
const EQUALITY_DECIMALS: i32 = 6;

/// Piecewise-polynomial membership function over one dimension.
///
/// Intervals may be appended in any order. The set is sorted and its coverage of the
/// universe verified lazily: [`IntervalSet::check`] does it in place, every read on an
/// unchecked set validates a sorted copy instead.
#[derive(Clone, Debug)]
pub struct IntervalSet {
    dimension: Arc<Dimension>,
    intervals: Vec<Interval>,
    checked: bool,
}

/// A piece of the common refinement of two sets: both operands' polynomials over the
/// same range, or over the same single point when `lower == upper`.
#[derive(Clone, Debug, PartialEq)]
pub struct SubRange {
    pub lower: f64,
    pub upper: f64,
    pub first: Polynomial,
    pub second: Polynomial,
}

impl SubRange {
    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

impl IntervalSet {
    pub fn new(dimension: Arc<Dimension>) -> Self {
        IntervalSet {
            dimension,
            intervals: Vec::new(),
            checked: false,
        }
    }

    /// The same membership degree everywhere: one interval across a continuous universe,
    /// or one singleton per registered member of a discrete one.
    pub fn constant(dimension: Arc<Dimension>, degree: f64) -> Result<Self> {
        let mut set = Self::new(dimension);

        if set.dimension.is_discrete() {
            for member in 1..=set.dimension.member_count() {
                set.add_interval(Interval::singleton(f64::from(member), degree))?;
            }
        } else {
            let (min, max) = (set.dimension.min_value(), set.dimension.max_value());

            set.add_interval(Interval::constant(min, max, degree)?)?;
        }

        set.check()?;

        Ok(set)
    }

    pub fn dimension(&self) -> &Arc<Dimension> {
        &self.dimension
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn add_interval(&mut self, interval: Interval) -> Result<()> {
        if self.dimension.is_discrete() {
            let x = interval.lower();

            if !interval.is_singleton() || x.fract() != 0. || x < 1. {
                return Err(Error::InvalidInterval(format!(
                    "only singletons on member numbers are allowed in discrete dimension \"{}\", got {interval}",
                    self.dimension.name()
                )));
            }
        } else if interval.lower() < self.dimension.min_value() || interval.upper() > self.dimension.max_value() {
            return Err(Error::InvalidInterval(format!(
                "{interval} is out of scope of the universe of \"{}\"",
                self.dimension.name()
            )));
        }

        self.intervals.push(interval);
        self.checked = false;

        Ok(())
    }

    /// Sorts the intervals and verifies they tile the universe.
    pub fn check(&mut self) -> Result<()> {
        if self.checked {
            return Ok(());
        }

        sort_intervals(&mut self.intervals);
        validate(&self.dimension, &self.intervals)?;
        self.checked = true;

        Ok(())
    }

    /// The intervals sorted by `(lower, upper)`.
    pub fn intervals(&self) -> Result<Cow<'_, [Interval]>> {
        if self.checked {
            return Ok(Cow::Borrowed(&self.intervals));
        }

        let mut intervals = self.intervals.clone();

        sort_intervals(&mut intervals);
        validate(&self.dimension, &intervals)?;

        Ok(Cow::Owned(intervals))
    }

    /// Membership degree at `x`. Singletons take precedence; among ranges sharing a bound
    /// the later one wins, which makes ranges behave as `<lower, upper)`. Points covered by
    /// nothing have degree 0.
    pub fn membership_degree(&self, x: f64) -> Result<f64> {
        let intervals = self.intervals()?;

        match interval_at(&intervals, x) {
            Some(interval) => interval.membership_degree(x),
            None => Ok(0.),
        }
    }

    /// The interval spanning exactly `[lower, upper]`.
    pub fn exact_interval(&self, lower: f64, upper: f64) -> Option<&Interval> {
        self.intervals
            .iter()
            .find(|i| i.lower() == lower && i.upper() == upper)
    }

    /// Closed unless a singleton at the lower bound takes over that point.
    pub fn is_left_open(&self, interval: &Interval) -> bool {
        if self.dimension.is_discrete() || interval.is_singleton() || interval.lower() == self.dimension.min_value() {
            return false;
        }

        self.exact_interval(interval.lower(), interval.lower()).is_some()
    }

    /// Open unless the interval reaches the top of the universe.
    pub fn is_right_open(&self, interval: &Interval) -> bool {
        !(self.dimension.is_discrete() || interval.is_singleton() || interval.upper() == self.dimension.max_value())
    }

    /// Renders one interval of this set, including the openness of its bounds or the
    /// caption of the discrete member it stands for.
    pub fn describe(&self, interval: &Interval) -> String {
        let polynomial = interval.polynomial();

        if !interval.is_singleton() {
            let open = if self.is_left_open(interval) { '(' } else { '<' };
            let close = if self.is_right_open(interval) { ')' } else { '>' };

            return format!(
                "{polynomial} for xϵ{open}{:.5},{:.5}{close}",
                interval.lower(),
                interval.upper()
            );
        }

        if !self.dimension.is_discrete() {
            return format!("{polynomial} for x={:.5}", interval.lower());
        }

        match self.dimension.member_caption(interval.lower()) {
            Some(caption) => format!("{polynomial} for x is {caption}"),
            None => format!("{polynomial} for x is #{:.0}", interval.lower()),
        }
    }

    /// Global maxima of the function, sorted by position.
    pub fn maximum(&self) -> Result<Vec<Plateau>> {
        let mut local: Vec<Plateau> = Vec::new();

        for interval in self.intervals()?.iter() {
            for plateau in interval.maximum()? {
                match local.iter_mut().find(|p| p.same_bounds(&plateau)) {
                    Some(existing) => existing.value = existing.value.max(plateau.value),
                    None => local.push(plateau),
                }
            }
        }

        let Some(global) = local.iter().map(|p| p.value).reduce(f64::max) else {
            return Ok(Vec::new());
        };

        if !(0. ..=1.).contains(&global) {
            return Err(Error::Unexpected(format!("maximum {global} out of range <0,1>")));
        }

        let mut sorted: Vec<Plateau> = local.into_iter().filter(|p| p.value == global).collect();

        sorted.sort_by(|a, b| a.lower.total_cmp(&b.lower).then(a.upper.total_cmp(&b.upper)));

        // Touching plateaus form one flat region
        let mut maxima: Vec<Plateau> = Vec::with_capacity(sorted.len());

        for plateau in sorted {
            match maxima.last_mut() {
                Some(last) if plateau.lower <= last.upper => last.upper = last.upper.max(plateau.upper),
                _ => maxima.push(plateau),
            }
        }

        Ok(maxima)
    }

    /// Applies `f` to every polynomial, keeping the partition.
    pub fn map(&self, f: impl Fn(&Polynomial) -> Polynomial) -> Result<IntervalSet> {
        let mut out = IntervalSet::new(self.dimension.clone());

        for interval in self.intervals()?.iter() {
            let polynomial = f(interval.polynomial()).trimmed_on(interval.lower(), interval.upper());

            out.add_interval(Interval::new(interval.lower(), interval.upper(), polynomial)?)?;
        }

        out.check()?;

        Ok(out)
    }

    /// Refines both sets onto their common partition.
    ///
    /// Every boundary of either set splits the universe. Each resulting range yields one
    /// record with the polynomial governing it in each operand (zero where an operand has
    /// nothing). Each boundary carrying a singleton in either operand additionally yields a
    /// point record with both operands' degrees at that point.
    pub fn sub_ranges(&self, other: &IntervalSet) -> Result<Vec<SubRange>> {
        if *self.dimension != *other.dimension {
            return Err(Error::DimensionMismatch(
                self.dimension.name().to_owned(),
                other.dimension.name().to_owned(),
            ));
        }

        let first = self.intervals()?;
        let second = other.intervals()?;
        let mut bounds: Vec<f64> = first
            .iter()
            .chain(second.iter())
            .flat_map(|i| [i.lower(), i.upper()])
            .collect();

        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        let mut out = Vec::with_capacity(bounds.len() * 2);

        for (n, &x) in bounds.iter().enumerate() {
            let has_point = |intervals: &[Interval]| intervals.iter().any(|i| i.is_singleton() && i.lower() == x);

            if has_point(&first) || has_point(&second) {
                out.push(SubRange {
                    lower: x,
                    upper: x,
                    first: point_polynomial(&first, x),
                    second: point_polynomial(&second, x),
                });
            }

            let Some(&next) = bounds.get(n + 1) else {
                continue;
            };

            match (covering(&first, x, next), covering(&second, x, next)) {
                (None, None) => {},
                (p1, p2) => out.push(SubRange {
                    lower: x,
                    upper: next,
                    first: p1.cloned().unwrap_or_else(Polynomial::zero),
                    second: p2.cloned().unwrap_or_else(Polynomial::zero),
                }),
            }
        }

        Ok(out)
    }

    /// Pointwise equality across the whole universe.
    pub fn equals(&self, other: &IntervalSet) -> Result<bool> {
        if *self.dimension != *other.dimension {
            return Ok(false);
        }

        Ok(self
            .sub_ranges(other)?
            .iter()
            .all(|r| same_polynomial(&r.first, &r.second)))
    }

    /// True if `other ⊆ self`, i.e. `μ_other(x) <= μ_self(x)` everywhere. Equality is a
    /// special case of inclusion.
    pub fn includes(&self, other: &IntervalSet) -> Result<bool> {
        if *self.dimension != *other.dimension {
            return Ok(false);
        }

        for range in self.sub_ranges(other)? {
            let minimum = crate::ops::min_max_pieces(&range, true);

            if !minimum.iter().all(|(_, _, p)| same_polynomial(p, &range.second)) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn sort_intervals(intervals: &mut [Interval]) {
    intervals.sort_by(|a, b| a.lower().total_cmp(&b.lower()).then(a.upper().total_cmp(&b.upper())));
}

/// Continuous universes must be tiled by the non-singleton intervals without gaps, from
/// the minimum to the maximum. Discrete sets only need sorting.
fn validate(dimension: &Dimension, intervals: &[Interval]) -> Result<()> {
    if dimension.is_discrete() {
        return Ok(());
    }

    let (min, max) = (dimension.min_value(), dimension.max_value());
    let ranges: Vec<&Interval> = intervals.iter().filter(|i| !i.is_singleton()).collect();

    let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
        // A single-point universe is covered by a singleton
        if min == max && intervals.iter().any(|i| i.lower() == min) {
            return Ok(());
        }

        return Err(Error::Coverage(format!("no intervals cover \"{}\"", dimension.name())));
    };

    if first.lower() != min {
        return Err(Error::Coverage(format!(
            "membership function not specified for lower boundary {min} of \"{}\"",
            dimension.name()
        )));
    }

    if last.upper() != max {
        return Err(Error::Coverage(format!(
            "membership function not specified for upper boundary {max} of \"{}\"",
            dimension.name()
        )));
    }

    for pair in ranges.windows(2) {
        if pair[0].upper() != pair[1].lower() {
            return Err(Error::Coverage(format!(
                "membership function not specified for interval <{},{})",
                pair[0].upper(),
                pair[1].lower()
            )));
        }
    }

    Ok(())
}

/// Interval deciding the degree at `x` in a sorted slice.
pub(crate) fn interval_at(intervals: &[Interval], x: f64) -> Option<&Interval> {
    intervals
        .iter()
        .find(|i| i.is_singleton() && i.lower() == x)
        .or_else(|| intervals.iter().rev().find(|i| i.contains(x)))
}

fn point_polynomial(intervals: &[Interval], x: f64) -> Polynomial {
    match interval_at(intervals, x) {
        Some(interval) => Polynomial::constant(interval.polynomial().eval(x)),
        None => Polynomial::zero(),
    }
}

fn covering(intervals: &[Interval], lower: f64, upper: f64) -> Option<&Polynomial> {
    intervals
        .iter()
        .rev()
        .find(|i| !i.is_singleton() && i.lower() <= lower && i.upper() >= upper)
        .map(Interval::polynomial)
}

fn same_polynomial(p1: &Polynomial, p2: &Polynomial) -> bool {
    let (c1, c2) = (p1.coefficients(), p2.coefficients());

    (0..c1.len().max(c2.len())).all(|i| {
        let a = c1.get(i).copied().unwrap_or(0.);
        let b = c2.get(i).copied().unwrap_or(0.);

        round_to(a, EQUALITY_DECIMALS) == round_to(b, EQUALITY_DECIMALS)
    })
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut intervals = self.intervals.clone();

        sort_intervals(&mut intervals);

        for interval in intervals.iter().take(DISPLAY_LIMIT) {
            writeln!(f, "{}", self.describe(interval))?;
        }

        if intervals.len() > DISPLAY_LIMIT {
            writeln!(f, "...")?;
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
fn test_lazy_check() {
    let mut set = IntervalSet::new(percent());

    set.add_interval(Interval::constant(50., 100., 0.).unwrap()).unwrap();
    set.add_interval(Interval::linear(20., 50., -1. / 30., 50. / 30.).unwrap()).unwrap();

    // Not yet covering the universe
    assert!(matches!(set.membership_degree(30.), Err(Error::Coverage(_))));

    set.add_interval(Interval::constant(0., 20., 1.).unwrap()).unwrap();

    assert!(!set.is_checked());
    assert_eq!(set.intervals().unwrap()[0].lower(), 0.);
    assert_eq!(set.membership_degree(35.).unwrap(), 0.5);

    set.check().unwrap();

    assert!(set.is_checked());

    set.add_interval(Interval::singleton(60., 0.3)).unwrap();

    assert!(!set.is_checked());
    assert_eq!(set.membership_degree(60.).unwrap(), 0.3);
    assert!(set.add_interval(Interval::constant(90., 120., 0.).unwrap()).is_err());
}

#[test]
fn test_gap_is_reported() {
    let mut set = IntervalSet::new(percent());

    set.add_interval(Interval::constant(0., 40., 1.).unwrap()).unwrap();
    set.add_interval(Interval::constant(50., 100., 0.).unwrap()).unwrap();

    let err = set.check().unwrap_err();

    assert!(err.is_modeling());
    assert_eq!(
        err.to_string(),
        "membership function does not cover the universe: membership function not specified for interval <40,50)"
    );
}

#[test]
fn test_lookup_and_openness() {
    let mut set = IntervalSet::new(percent());

    set.add_interval(Interval::constant(0., 50., 0.2).unwrap()).unwrap();
    set.add_interval(Interval::constant(50., 100., 0.8).unwrap()).unwrap();
    set.add_interval(Interval::singleton(50., 0.5)).unwrap();
    set.check().unwrap();

    assert_eq!(set.membership_degree(49.9).unwrap(), 0.2);
    assert_eq!(set.membership_degree(50.).unwrap(), 0.5);
    assert_eq!(set.membership_degree(100.).unwrap(), 0.8);

    let intervals = set.intervals().unwrap();

    assert_eq!(set.describe(&intervals[0]), "0.20000 for xϵ<0.00000,50.00000)");
    assert_eq!(set.describe(&intervals[1]), "0.50000 for x=50.00000");
    assert_eq!(set.describe(&intervals[2]), "0.80000 for xϵ(50.00000,100.00000>");
    assert_eq!(set.to_string().lines().count(), 3);
}

#[test]
fn test_sub_ranges() {
    let dim = percent();
    let mut a = IntervalSet::new(dim.clone());

    a.add_interval(Interval::constant(0., 40., 1.).unwrap()).unwrap();
    a.add_interval(Interval::constant(40., 100., 0.).unwrap()).unwrap();

    let mut b = IntervalSet::new(dim.clone());

    b.add_interval(Interval::constant(0., 60., 0.25).unwrap()).unwrap();
    b.add_interval(Interval::constant(60., 100., 0.75).unwrap()).unwrap();
    b.add_interval(Interval::singleton(60., 0.5)).unwrap();

    let ranges = a.sub_ranges(&b).unwrap();
    let spans: Vec<_> = ranges.iter().map(|r| (r.lower, r.upper)).collect();

    assert_eq!(spans, vec![(0., 40.), (40., 60.), (60., 60.), (60., 100.)]);
    assert_eq!(ranges[1].first, Polynomial::constant(0.));
    assert_eq!(ranges[1].second, Polynomial::constant(0.25));
    assert_eq!(ranges[2].first, Polynomial::constant(0.));
    assert_eq!(ranges[2].second, Polynomial::constant(0.5));

    let mut dims = crate::dimension::Dimensions::new();
    let other = dims.add_continuous("Other", "", "", 0., 100.).unwrap();

    assert!(matches!(
        a.sub_ranges(&IntervalSet::constant(other, 1.).unwrap()),
        Err(Error::DimensionMismatch(..))
    ));
}

#[test]
fn test_equals_and_includes() {
    let dim = percent();
    let mut split = IntervalSet::new(dim.clone());

    split.add_interval(Interval::constant(0., 30., 0.5).unwrap()).unwrap();
    split.add_interval(Interval::constant(30., 100., 0.5).unwrap()).unwrap();

    let whole = IntervalSet::constant(dim.clone(), 0.5).unwrap();
    let full = IntervalSet::constant(dim.clone(), 1.).unwrap();

    assert!(whole.equals(&split).unwrap());
    assert!(full.includes(&whole).unwrap());
    assert!(!whole.includes(&full).unwrap());
    assert!(whole.includes(&split).unwrap());
    assert!(!whole.equals(&full).unwrap());
}

#[test]
fn test_maximum() {
    let mut set = IntervalSet::new(percent());

    set.add_interval(Interval::linear(0., 50., 0.02, 0.).unwrap()).unwrap();
    set.add_interval(Interval::linear(50., 100., -0.02, 2.).unwrap()).unwrap();
    set.check().unwrap();

    assert_eq!(set.maximum().unwrap(), vec![Plateau::point(50., 1.)]);

    let mut flat = IntervalSet::new(percent());

    flat.add_interval(Interval::constant(0., 20., 0.).unwrap()).unwrap();
    flat.add_interval(Interval::constant(20., 30., 0.7).unwrap()).unwrap();
    flat.add_interval(Interval::constant(30., 60., 0.).unwrap()).unwrap();
    flat.add_interval(Interval::constant(60., 100., 0.7).unwrap()).unwrap();

    let maxima = flat.maximum().unwrap();

    assert_eq!(maxima.len(), 2);
    assert_eq!((maxima[0].lower, maxima[1].upper), (20., 100.));

    let mut ramps = IntervalSet::new(percent());

    ramps.add_interval(Interval::linear(0., 20., 0.05, 0.).unwrap()).unwrap();
    ramps.add_interval(Interval::constant(20., 25., 1.).unwrap()).unwrap();
    ramps.add_interval(Interval::constant(25., 30., 1.).unwrap()).unwrap();
    ramps.add_interval(Interval::linear(30., 50., -0.05, 2.5).unwrap()).unwrap();
    ramps.add_interval(Interval::constant(50., 100., 0.).unwrap()).unwrap();

    assert_eq!(
        ramps.maximum().unwrap(),
        vec![Plateau {
            lower: 20.,
            upper: 30.,
            value: 1.
        }]
    );
}
