use std::fmt;

use num::Zero;

use crate::error::{Error, Result};
use crate::math::{round_to, MEMBERSHIP_DECIMALS};
use crate::polynomial::Polynomial;

/// One piece of a membership function: a polynomial over `[lower, upper]`.
///
/// A singleton (`lower == upper`) pins the membership degree of exactly one point and
/// always carries a constant polynomial.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    lower: f64,
    upper: f64,
    polynomial: Polynomial,
}

impl Interval {
    pub fn new(lower: f64, upper: f64, polynomial: Polynomial) -> Result<Self> {
        if !(lower.is_finite() && upper.is_finite()) {
            return Err(Error::InvalidInterval(format!("bounds {lower}, {upper} must be finite")));
        }

        if upper < lower {
            return Err(Error::InvalidInterval(format!(
                "lower bound {lower} cannot be higher than upper bound {upper}"
            )));
        }

        if lower == upper {
            return Ok(Self::singleton(lower, polynomial.eval(lower)));
        }

        Ok(Interval {
            lower,
            upper,
            polynomial,
        })
    }

    pub fn singleton(x: f64, degree: f64) -> Self {
        Interval {
            lower: x,
            upper: x,
            polynomial: Polynomial::constant(degree),
        }
    }

    pub fn constant(lower: f64, upper: f64, degree: f64) -> Result<Self> {
        Self::new(lower, upper, Polynomial::constant(degree))
    }

    /// `μ(x) = a·x + b`
    pub fn linear(lower: f64, upper: f64, a: f64, b: f64) -> Result<Self> {
        Self::new(lower, upper, Polynomial::linear(a, b))
    }

    /// `μ(x) = a·x² + b·x + c`
    pub fn quadratic(lower: f64, upper: f64, a: f64, b: f64, c: f64) -> Result<Self> {
        Self::new(lower, upper, Polynomial::quadratic(a, b, c))
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    pub fn coefficients(&self) -> &[f64] {
        self.polynomial.coefficients()
    }

    pub fn is_singleton(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_constant(&self) -> bool {
        self.polynomial.is_constant()
    }

    pub fn is_linear(&self) -> bool {
        self.polynomial.is_linear()
    }

    /// True if the membership function is identically 0 here.
    pub fn is_empty(&self) -> bool {
        self.polynomial.is_zero()
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    pub fn length(&self) -> f64 {
        self.upper - self.lower
    }

    /// Evaluates the polynomial at `x`, rounded to the membership precision. A result
    /// outside `[0, 1]` means the membership function itself is broken.
    pub fn membership_degree(&self, x: f64) -> Result<f64> {
        // Adding zero folds -0.0 into 0.0
        let degree = round_to(self.polynomial.eval(x), MEMBERSHIP_DECIMALS) + 0.;

        if !(0. ..=1.).contains(&degree) {
            return Err(Error::MembershipOutOfRange {
                formula: self.to_string(),
                x,
            });
        }

        Ok(degree)
    }

    /// Area below the graph of the membership function.
    pub fn area(&self) -> f64 {
        self.polynomial.integrate(self.lower, self.upper)
    }

    /// Sub-intervals where this piece reaches its own maximum.
    pub fn maximum(&self) -> Result<Vec<Plateau>> {
        if self.is_singleton() {
            return Ok(vec![Plateau::point(self.lower, self.membership_degree(self.lower)?)]);
        }

        if self.is_constant() {
            return Ok(vec![Plateau {
                lower: self.lower,
                upper: self.upper,
                value: self.membership_degree(self.lower)?,
            }]);
        }

        if self.is_linear() {
            let end = if self.coefficients()[1] > 0. { self.upper } else { self.lower };

            return Ok(vec![Plateau::point(end, self.membership_degree(end)?)]);
        }

        let mut extremes = vec![self.lower, self.upper];

        extremes.extend(self.polynomial.derivative().real_roots(self.lower, self.upper));
        extremes.sort_by(f64::total_cmp);
        extremes.dedup();

        let extremes = extremes
            .into_iter()
            .map(|x| Ok(Plateau::point(x, self.membership_degree(x)?)))
            .collect::<Result<Vec<_>>>()?;
        let maximum = extremes.iter().map(|p| p.value).fold(f64::MIN, f64::max);

        Ok(extremes.into_iter().filter(|p| p.value == maximum).collect())
    }
}

/// Without the owning set the openness of the bounds is unknown, so both render closed.
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            write!(f, "{} for x={:.5}", self.polynomial, self.lower)
        } else {
            write!(f, "{} for xϵ<{:.5},{:.5}>", self.polynomial, self.lower, self.upper)
        }
    }
}

/// A range (or point) where a membership function is flat, used to describe maxima.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plateau {
    pub lower: f64,
    pub upper: f64,
    pub value: f64,
}

impl Plateau {
    pub fn point(x: f64, value: f64) -> Self {
        Plateau {
            lower: x,
            upper: x,
            value,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.lower == self.upper
    }

    pub fn length(&self) -> f64 {
        self.upper - self.lower
    }

    pub(crate) fn same_bounds(&self, other: &Plateau) -> bool {
        self.lower == other.lower && self.upper == other.upper
    }
}

#[test]
fn test_membership_degree() {
    let rising = Interval::linear(30., 50., 0.05, -1.5).unwrap();

    assert_eq!(rising.membership_degree(40.).unwrap(), 0.5);
    assert_eq!(rising.membership_degree(30.).unwrap(), 0.);
    assert_eq!(rising.to_string(), "0.05000x-1.50000 for xϵ<30.00000,50.00000>");

    let err = rising.membership_degree(70.).unwrap_err();

    assert!(err.is_modeling());
    assert_eq!(
        err.to_string(),
        "formula 0.05000x-1.50000 for xϵ<30.00000,50.00000> is out of range [0,1] for x=70.000"
    );
    assert!(Interval::constant(5., 1., 0.).is_err());
}

#[test]
fn test_singleton() {
    let point = Interval::new(3., 3., Polynomial::linear(0.1, 0.)).unwrap();

    assert!(point.is_singleton());
    assert!(point.is_constant());
    assert!((point.coefficients()[0] - 0.3).abs() < 1e-12);
    assert_eq!(point.area(), 0.);
    assert_eq!(Interval::singleton(7., 0.25).to_string(), "0.25000 for x=7.00000");
}

#[test]
fn test_area() {
    let rising = Interval::linear(30., 50., 0.05, -1.5).unwrap();

    assert!((rising.area() - 10.).abs() < 1e-9);
    assert_eq!(Interval::constant(0., 4., 0.5).unwrap().area(), 2.);
}

#[test]
fn test_maximum() {
    let flat = Interval::constant(0., 10., 0.4).unwrap();

    assert_eq!(flat.maximum().unwrap(), vec![Plateau { lower: 0., upper: 10., value: 0.4 }]);

    let falling = Interval::linear(20., 40., -0.05, 2.).unwrap();

    assert_eq!(falling.maximum().unwrap(), vec![Plateau::point(20., 1.)]);

    let rising = Interval::linear(30., 50., 0.05, -1.5).unwrap();

    assert_eq!(rising.maximum().unwrap(), vec![Plateau::point(50., 1.)]);

    // Hump peaking at 5: 1 - (x - 5)² / 25
    let hump = Interval::quadratic(0., 10., -0.04, 0.4, 0.).unwrap();

    assert_eq!(hump.maximum().unwrap(), vec![Plateau::point(5., 1.)]);

    // Valley: both ends are maximal
    let valley = Interval::quadratic(0., 10., 0.04, -0.4, 1.).unwrap();

    assert_eq!(valley.maximum().unwrap(), vec![Plateau::point(0., 1.), Plateau::point(10., 1.)]);
}
