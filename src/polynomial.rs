use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num::{One, Zero};

use crate::math::{magnitude, position_tolerance, COEFFICIENT_EPSILON};

/// Dense real polynomial `c0 + c1·x + c2·x² + …`, coefficients in ascending order.
///
/// There is always at least one coefficient and the leading one is non-zero unless the
/// polynomial is the zero constant.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial(Vec<f64>);

impl Polynomial {
    pub fn new(mut coefficients: Vec<f64>) -> Self {
        while coefficients.len() > 1 && coefficients.last() == Some(&0.) {
            coefficients.pop();
        }

        if coefficients.is_empty() {
            coefficients.push(0.);
        }

        Polynomial(coefficients)
    }

    pub fn constant(value: f64) -> Self {
        Polynomial(vec![value])
    }

    /// `a·x + b`
    pub fn linear(a: f64, b: f64) -> Self {
        Self::new(vec![b, a])
    }

    /// `a·x² + b·x + c`
    pub fn quadratic(a: f64, b: f64, c: f64) -> Self {
        Self::new(vec![c, b, a])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.0
    }

    pub fn degree(&self) -> usize {
        self.0.len() - 1
    }

    /// Horner evaluation.
    pub fn eval(&self, x: f64) -> f64 {
        self.0.iter().rev().fold(0., |acc, c| acc * x + c)
    }

    pub fn is_constant(&self) -> bool {
        self.0[1..].iter().all(|c| *c == 0.)
    }

    pub fn is_linear(&self) -> bool {
        self.0.len() <= 2 || self.0[2..].iter().all(|c| *c == 0.)
    }

    pub fn derivative(&self) -> Self {
        let coefficients = self.0.iter().enumerate().skip(1).map(|(i, c)| c * i as f64).collect();

        Self::new(coefficients)
    }

    /// Antiderivative with a zero integration constant.
    pub fn integral(&self) -> Self {
        let coefficients = std::iter::once(0.)
            .chain(self.0.iter().enumerate().map(|(i, c)| c / (i + 1) as f64))
            .collect();

        Self::new(coefficients)
    }

    /// Definite integral over `[lower, upper]`.
    pub fn integrate(&self, lower: f64, upper: f64) -> f64 {
        let integral = self.integral();

        integral.eval(upper) - integral.eval(lower)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.0.iter().map(|c| c * factor).collect())
    }

    pub fn powi(&self, exponent: u32) -> Self {
        (0..exponent).fold(Self::one(), |acc, _| &acc * self)
    }

    /// Sum of the absolute values of all terms at `x`; the scale against which rounding
    /// noise of [`Polynomial::eval`] is judged.
    fn term_magnitude(&self, x: f64) -> f64 {
        self.0.iter().rev().fold(0., |acc, c| acc * x.abs() + c.abs())
    }

    fn vanishes_at(&self, x: f64) -> bool {
        self.eval(x).abs() <= COEFFICIENT_EPSILON * self.term_magnitude(x).max(f64::MIN_POSITIVE)
    }

    /// Drops high-order coefficients that contribute less than the coefficient tolerance
    /// anywhere on `[lower, upper]`. Arithmetic on exact shapes leaves such crumbs behind.
    pub(crate) fn trimmed_on(&self, lower: f64, upper: f64) -> Self {
        let scale = magnitude(lower, upper);
        let mut coefficients = self.0.clone();

        while coefficients.len() > 1 {
            let i = coefficients.len() - 1;
            let last = coefficients[i];

            if last != 0. && (last * scale.powi(i as i32)).abs() > COEFFICIENT_EPSILON {
                break;
            }

            coefficients.pop();
        }

        Self::new(coefficients)
    }

    /// True if every term stays below the coefficient tolerance on `[lower, upper]`.
    pub(crate) fn is_negligible_on(&self, lower: f64, upper: f64) -> bool {
        let scale = magnitude(lower, upper);

        self.0
            .iter()
            .enumerate()
            .all(|(i, c)| (c * scale.powi(i as i32)).abs() <= COEFFICIENT_EPSILON)
    }

    /// Distinct real roots within `[lower, upper]`, sorted ascending. Roots within the
    /// position tolerance of a bound are reported as exactly that bound. The zero
    /// polynomial has no isolated roots and yields an empty list.
    pub fn real_roots(&self, lower: f64, upper: f64) -> Vec<f64> {
        let poly = self.trimmed_on(lower, upper);
        let tolerance = position_tolerance(lower).max(position_tolerance(upper));
        let candidates = match poly.degree() {
            0 => Vec::new(),
            1 => vec![-poly.0[0] / poly.0[1]],
            2 => poly.quadratic_roots(),
            _ => poly.bracketed_roots(lower, upper),
        };

        let mut roots: Vec<f64> = candidates
            .into_iter()
            .filter(|r| r.is_finite() && *r >= lower - tolerance && *r <= upper + tolerance)
            .map(|r| {
                if (r - lower).abs() <= tolerance {
                    lower
                } else if (r - upper).abs() <= tolerance {
                    upper
                } else {
                    r
                }
            })
            .collect();

        roots.sort_by(f64::total_cmp);
        roots.dedup_by(|a, b| (*a - *b).abs() <= tolerance);

        roots
    }

    fn quadratic_roots(&self) -> Vec<f64> {
        let (c, b, a) = (self.0[0], self.0[1], self.0[2]);
        let discriminant = b * b - 4. * a * c;
        let noise = 1e-10 * (b * b + (4. * a * c).abs());

        if discriminant < -noise {
            return Vec::new();
        }

        if discriminant <= noise {
            return vec![-b / (2. * a)];
        }

        // Numerically stable variant, avoids cancellation between b and the square root.
        let q = -0.5 * (b + b.signum() * discriminant.sqrt());

        if q == 0. {
            return vec![0.];
        }

        vec![q / a, c / q]
    }

    /// Splits the range at the critical points (roots of the derivative, found
    /// recursively) so that every piece is monotonic, then bisects each sign change.
    fn bracketed_roots(&self, lower: f64, upper: f64) -> Vec<f64> {
        let mut points = vec![lower];
        points.extend(self.derivative().real_roots(lower, upper));
        points.push(upper);
        points.sort_by(f64::total_cmp);
        points.dedup();

        // Touching roots sit on critical points and never change sign
        let mut roots: Vec<f64> = points.iter().copied().filter(|p| self.vanishes_at(*p)).collect();

        for window in points.windows(2) {
            let (a, b) = (window[0], window[1]);

            if self.vanishes_at(a) || self.vanishes_at(b) {
                continue;
            }

            if self.eval(a).signum() != self.eval(b).signum() {
                roots.push(self.bisect(a, b));
            }
        }

        roots
    }

    fn bisect(&self, mut a: f64, mut b: f64) -> f64 {
        let mut fa = self.eval(a);

        for _ in 0..200 {
            let mid = 0.5 * (a + b);

            if mid <= a || mid >= b {
                break;
            }

            let fm = self.eval(mid);

            if fm == 0. {
                return mid;
            }

            if fm.signum() == fa.signum() {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }

        0.5 * (a + b)
    }
}

impl Zero for Polynomial {
    fn zero() -> Self {
        Self::constant(0.)
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|c| *c == 0.)
    }
}

impl One for Polynomial {
    fn one() -> Self {
        Self::constant(1.)
    }
}

impl From<f64> for Polynomial {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.0.len().max(rhs.0.len());
        let coefficients = (0..len)
            .map(|i| self.0.get(i).unwrap_or(&0.) + rhs.0.get(i).unwrap_or(&0.))
            .collect();

        Polynomial::new(coefficients)
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut coefficients = vec![0.; self.0.len() + rhs.0.len() - 1];

        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in rhs.0.iter().enumerate() {
                coefficients[i + j] += a * b;
            }
        }

        Polynomial::new(coefficients)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.)
    }
}

macro_rules! forward_owned_binop {
    ($($trait:ident $method:ident),*) => {$(
        impl $trait for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: Polynomial) -> Polynomial {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Polynomial> for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: &Polynomial) -> Polynomial {
                (&self).$method(rhs)
            }
        }
    )*};
}

forward_owned_binop!(Add add, Sub sub, Mul mul);

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

/// Renders highest degree first with five decimals, e.g. `0.05000x-1.50000`.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();

        for (i, c) in self.0.iter().enumerate().rev() {
            if *c == 0. && !(i == 0 && out.is_empty()) {
                continue;
            }

            let term = match i {
                0 => format!("{c:.5}"),
                1 => format!("{c:.5}x"),
                _ => format!("{c:.5}x^{i}"),
            };

            if !out.is_empty() && !term.starts_with('-') {
                out.push('+');
            }

            out.push_str(&term);
        }

        f.write_str(&out)
    }
}

#[test]
fn test_arithmetic() {
    let p = Polynomial::linear(2., -1.);
    let q = Polynomial::constant(3.);

    assert_eq!((&p + &q).coefficients(), &[2., 2.]);
    assert_eq!((&p - &p).coefficients(), &[0.]);
    assert!((&p - &p).is_zero());
    assert_eq!((&p * &p).coefficients(), &[1., -4., 4.]);
    assert_eq!(p.powi(0), Polynomial::one());
    assert_eq!(p.powi(2), &p * &p);
    assert_eq!(p.derivative().coefficients(), &[2.]);
    assert_eq!(p.integral().coefficients(), &[0., -1., 1.]);
    assert_eq!(Polynomial::linear(1., 0.).integrate(0., 2.), 2.);
}

#[test]
fn test_display() {
    assert_eq!(Polynomial::linear(0.05, -1.5).to_string(), "0.05000x-1.50000");
    assert_eq!(Polynomial::quadratic(1., 0., 2.).to_string(), "1.00000x^2+2.00000");
    assert_eq!(Polynomial::zero().to_string(), "0.00000");
    assert_eq!(Polynomial::new(vec![0., -2.]).to_string(), "-2.00000x");
}

#[test]
fn test_real_roots() {
    // (x - 1)(x - 2)(x - 3)
    let cubic = Polynomial::new(vec![-6., 11., -6., 1.]);
    let roots = cubic.real_roots(0., 10.);

    assert_eq!(roots.len(), 3);
    for (root, expected) in roots.iter().zip([1., 2., 3.]) {
        assert!((root - expected).abs() < 1e-9);
    }

    assert_eq!(cubic.real_roots(1.5, 2.5).len(), 1);
    assert!(cubic.real_roots(3.5, 10.).is_empty());

    // Double root touches zero without changing sign
    let touching = Polynomial::quadratic(1., -4., 4.);

    assert_eq!(touching.real_roots(0., 5.), vec![2.]);

    let quartic = touching.powi(2);
    let roots = quartic.real_roots(0., 5.);

    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 2.).abs() < 1e-6);

    // Roots next to a bound snap onto it
    let line = Polynomial::linear(1., -50. - 1e-12);

    assert_eq!(line.real_roots(30., 50.), vec![50.]);
    assert!(Polynomial::zero().real_roots(0., 1.).is_empty());
    assert!(Polynomial::constant(0.5).real_roots(0., 1.).is_empty());
}

#[test]
fn test_trimming() {
    let noisy = Polynomial::new(vec![0.5, 1e-18, 1e-20]);

    assert!(noisy.trimmed_on(0., 100.).is_constant());
    assert!(Polynomial::new(vec![1e-14, -1e-16]).is_negligible_on(0., 10.));
    assert!(!Polynomial::new(vec![0., 0., 1e-9]).is_negligible_on(0., 100.));
}
