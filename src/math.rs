use num::Float;

use crate::polynomial::Polynomial;

/// Membership degrees are reported with this many decimal places.
pub(crate) const MEMBERSHIP_DECIMALS: i32 = 5;

/// Coefficients whose contribution over an interval stays below this are treated as zero.
pub(crate) const COEFFICIENT_EPSILON: f64 = 1e-12;

/// Relative tolerance used when matching roots against interval boundaries.
pub(crate) const ROOT_EPSILON: f64 = 1e-9;

/// Rounds half away from zero to `decimals` places.
pub(crate) fn round_to<F: Float>(value: F, decimals: i32) -> F {
    let Some(ten) = F::from(10.) else {
        return value;
    };
    let factor = ten.powi(decimals);

    (value * factor).round() / factor
}

/// Largest magnitude of `x` over `[lower, upper]`, never below one. Used to scale
/// tolerances for polynomial coefficients.
pub(crate) fn magnitude(lower: f64, upper: f64) -> f64 {
    lower.abs().max(upper.abs()).max(1.)
}

/// Absolute tolerance for comparing positions around `x`.
pub(crate) fn position_tolerance(x: f64) -> f64 {
    ROOT_EPSILON * x.abs().max(1.)
}

/// Line through `(x1, y1)` and `(x2, y2)`, i.e. `y1 + (x - x1) * (y2 - y1) / (x2 - x1)`.
/// A vertical segment degrades to the constant `y2`.
pub(crate) fn segment((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> Polynomial {
    if x1 == x2 {
        return Polynomial::constant(y2);
    }

    let slope = (y2 - y1) / (x2 - x1);

    Polynomial::new(vec![y1 - slope * x1, slope])
}

/// Rounds `step` to 1, 2, 5 or 10 times a power of ten, always downwards, so that the
/// axis marks stay at least as dense as requested. Returns the step and its exponent.
pub(crate) fn nice_step(step: f64) -> (f64, i32) {
    let log = step.log10().floor() as i32;
    let first_digit = step / 10f64.powi(log);
    let first_digit = if first_digit >= 10. {
        10.
    } else if first_digit >= 5. {
        5.
    } else if first_digit >= 2. {
        2.
    } else {
        1.
    };

    (first_digit * 10f64.powi(log), log)
}

#[test]
fn test_round_to() {
    assert_eq!(round_to(0.123456, 5), 0.12346);
    assert_eq!(round_to(1.0000000000000002, 5), 1.);
    assert_eq!(round_to(-0.000001, 5), 0.);
    assert_eq!(round_to(2.5f32, 0), 3.);
}

#[test]
fn test_segment() {
    let falling = segment((20., 1.), (40., 0.));

    for (x, y) in [(20., 1.), (30., 0.5), (40., 0.)] {
        assert!((falling.eval(x) - y).abs() < 1e-12);
    }

    let flat = segment((5., 0.3), (5., 0.7));

    assert_eq!(flat.eval(100.), 0.7);
}

#[test]
fn test_nice_step() {
    assert_eq!(nice_step(25.), (20., 1));
    assert_eq!(nice_step(0.25), (0.2, -1));
    assert_eq!(nice_step(7.5), (5., 0));
    assert_eq!(nice_step(100.), (100., 2));
    assert_eq!(nice_step(1.5), (1., 0));
}
