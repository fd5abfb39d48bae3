use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::inputs::Inputs;
use crate::interval::Plateau;
use crate::interval_set::IntervalSet;
use crate::polynomial::Polynomial;
use crate::relation::Relation;

/// Method for reducing the output membership function to one crisp value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefuzzificationMethod {
    /// Point splitting the area below the function in halves
    CenterOfGravity,
    /// Smallest value for which the membership function is maximum
    LeftOfMaximum,
    /// Largest value for which the membership function is maximum
    RightOfMaximum,
    /// Mean of the values for which the membership function is maximum
    MeanOfMaximum,
    /// Weighted average of singletons, to be used with RSS rule bases
    CenterOfMaximum,
}

impl DefuzzificationMethod {
    pub const ALL: [DefuzzificationMethod; 5] = [
        Self::CenterOfGravity,
        Self::LeftOfMaximum,
        Self::RightOfMaximum,
        Self::MeanOfMaximum,
        Self::CenterOfMaximum,
    ];

    pub fn caption(self) -> &'static str {
        match self {
            Self::CenterOfGravity => "Center-Of-Gravity",
            Self::LeftOfMaximum => "Left-Of-Maximum",
            Self::RightOfMaximum => "Right-Of-Maximum",
            Self::MeanOfMaximum => "Mean-Of-Maximum",
            Self::CenterOfMaximum => "Center-Of-Maximum",
        }
    }

    fn abbreviation(self) -> &'static str {
        match self {
            Self::CenterOfGravity => "cog",
            Self::LeftOfMaximum => "lom",
            Self::RightOfMaximum => "rom",
            Self::MeanOfMaximum => "mom",
            Self::CenterOfMaximum => "com",
        }
    }
}

impl fmt::Display for DefuzzificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// Accepts the caption in any case, with or without separators, or the three letter
/// abbreviation.
impl FromStr for DefuzzificationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|method| {
                normalized == method.caption().replace('-', "").to_lowercase() || normalized == method.abbreviation()
            })
            .ok_or_else(|| Error::UnknownMethod(s.to_owned()))
    }
}

/// Result of defuzzifying a relation for a set of inputs. The output dimension is the one
/// dimension of the relation the inputs leave open.
pub struct Defuzzification<'r> {
    relation: Relation<'r>,
    inputs: Inputs,
    output: Arc<Dimension>,
    method: DefuzzificationMethod,
    course: IntervalSet,
    crisp: OnceLock<f64>,
}

/// Builds the defuzzification of `relation` with the given method.
pub fn get_defuzzification<'r>(
    relation: Relation<'r>,
    inputs: Inputs,
    method: DefuzzificationMethod,
) -> Result<Defuzzification<'r>> {
    Defuzzification::new(relation, inputs, method)
}

impl<'r> Defuzzification<'r> {
    pub fn new(relation: Relation<'r>, inputs: Inputs, method: DefuzzificationMethod) -> Result<Self> {
        let output = relation.variable_dimension(&inputs)?;

        if output.is_discrete() {
            return Err(Error::InvalidInputs(format!(
                "continuous dimension expected as output dimension, dimension \"{}\" is discrete",
                output.name()
            )));
        }

        let course = relation.function_of(&inputs, &output)?;

        Ok(Self {
            relation,
            inputs,
            output,
            method,
            course,
            crisp: OnceLock::new(),
        })
    }

    pub fn method(&self) -> DefuzzificationMethod {
        self.method
    }

    pub fn relation(&self) -> Relation<'r> {
        self.relation
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn output_dimension(&self) -> &Arc<Dimension> {
        &self.output
    }

    /// The output membership function being defuzzified.
    pub fn function(&self) -> &IntervalSet {
        &self.course
    }

    /// The crisp value, computed on the first call.
    pub fn crisp_value(&self) -> Result<f64> {
        if let Some(&value) = self.crisp.get() {
            return Ok(value);
        }

        let value = match self.method {
            DefuzzificationMethod::CenterOfGravity => self.center_of_gravity()?,
            DefuzzificationMethod::CenterOfMaximum => self.center_of_maximum()?,
            DefuzzificationMethod::LeftOfMaximum => self.maxima()?[0].lower,
            DefuzzificationMethod::RightOfMaximum => {
                let maxima = self.maxima()?;

                maxima[maxima.len() - 1].upper
            },
            DefuzzificationMethod::MeanOfMaximum => mean_of_maximum(&self.maxima()?),
        };

        debug!(method = %self.method, output = self.output.name(), value, "defuzzified");

        Ok(*self.crisp.get_or_init(|| value))
    }

    /// Membership degree belonging to the crisp value. For Center-Of-Maximum this is the
    /// average degree of the singletons.
    pub fn membership_degree(&self) -> Result<f64> {
        match self.method {
            DefuzzificationMethod::CenterOfGravity => self.course.membership_degree(self.crisp_value()?),
            DefuzzificationMethod::CenterOfMaximum => {
                let singletons = self.singletons()?;

                if singletons.is_empty() {
                    return Ok(0.);
                }

                Ok(singletons.iter().map(|(_, degree)| degree).sum::<f64>() / singletons.len() as f64)
            },
            _ => Ok(self.maxima()?[0].value),
        }
    }

    fn indecisive(&self, reason: &str) -> f64 {
        let midpoint = self.output.midpoint();

        warn!(method = %self.method, output = self.output.name(), midpoint, "{reason}, falling back to midpoint");

        midpoint
    }

    fn maxima(&self) -> Result<Vec<Plateau>> {
        let maxima = self.course.maximum()?;

        if maxima.is_empty() {
            return Err(Error::Unexpected("no maxima found".to_owned()));
        }

        Ok(maxima)
    }

    fn center_of_gravity(&self) -> Result<f64> {
        let intervals = self.course.intervals()?;
        let mut offsets = Vec::with_capacity(intervals.len() + 1);
        let mut total = 0.;

        for interval in intervals.iter() {
            offsets.push(total);
            total += interval.area();
        }

        offsets.push(total);

        if total <= 0. {
            return Ok(self.indecisive("no area below the output function"));
        }

        let half = total / 2.;

        for (i, interval) in intervals.iter().enumerate() {
            let (before, after) = (offsets[i], offsets[i + 1]);

            if before > half || after < half {
                continue;
            }

            // The half is reached exactly at the end of this piece, any zero-area gap up to
            // the next piece with area is split in the middle
            if after == half {
                if let Some(next) = intervals[i + 1..].iter().find(|next| next.area() > 0.) {
                    return Ok((interval.upper() + next.lower()) / 2.);
                }
            }

            let remaining = (half - before).clamp(0., interval.area().max(0.));
            let integral = interval.polynomial().integral();
            let target = integral.eval(interval.lower()) + remaining;
            let difference = &integral - &Polynomial::constant(target);

            return Ok(match difference.real_roots(interval.lower(), interval.upper()).first() {
                Some(&x) => x,
                None => self.indecisive("the half area could not be located"),
            });
        }

        Err(Error::Unexpected(format!("half area {half} not reached by {}", self.course)))
    }

    /// `(position, degree)` of every non-empty singleton of the output function.
    fn singletons(&self) -> Result<Vec<(f64, f64)>> {
        let mut singletons = Vec::new();

        for interval in self.course.intervals()?.iter().filter(|i| !i.is_empty()) {
            if !interval.is_singleton() {
                return Err(Error::NotSingleton(self.course.describe(interval)));
            }

            singletons.push((interval.lower(), interval.membership_degree(interval.lower())?));
        }

        Ok(singletons)
    }

    fn center_of_maximum(&self) -> Result<f64> {
        let singletons = self.singletons()?;
        let weight: f64 = singletons.iter().map(|(_, degree)| degree).sum();

        if weight == 0. {
            return Ok(self.indecisive("no weight in the output singletons"));
        }

        Ok(singletons.iter().map(|(x, degree)| x * degree).sum::<f64>() / weight)
    }
}

/// Mean of the maxima. Flat maxima are laid next to each other, the middle of that line is
/// mapped back into the plateau it falls into.
fn mean_of_maximum(maxima: &[Plateau]) -> f64 {
    if maxima.iter().all(Plateau::is_singleton) {
        return maxima.iter().map(|m| m.lower).sum::<f64>() / maxima.len() as f64;
    }

    let mut segments = Vec::with_capacity(maxima.len());
    let mut pointer = maxima[0].lower;

    for maximum in maxima {
        segments.push((pointer, pointer + maximum.length()));
        pointer += maximum.length();
    }

    let mean = (maxima[0].lower + pointer) / 2.;

    for (i, &(start, end)) in segments.iter().enumerate() {
        if start > mean || end < mean {
            continue;
        }

        // Two plateaus of the same width: the mean lies in the gap between them
        if i + 1 < segments.len() && end == mean && segments[i + 1].0 == mean {
            return (maxima[i].upper + maxima[i + 1].lower) / 2.;
        }

        return mean - start + maxima[i].lower;
    }

    maxima[maxima.len() - 1].upper
}

impl fmt::Debug for Defuzzification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defuzzification")
            .field("relation", &self.relation.to_string())
            .field("output", &self.output.name())
            .field("method", &self.method)
            .finish()
    }
}

#[cfg(test)]
fn defuzzify(set: crate::sets::FuzzySet, method: DefuzzificationMethod) -> (f64, f64) {
    let mut relations = crate::relation::Relations::new();
    let root = relations.insert(set);
    let defuzzification = get_defuzzification(relations.get(root).unwrap(), Inputs::new(), method).unwrap();

    (defuzzification.crisp_value().unwrap(), defuzzification.membership_degree().unwrap())
}

#[test]
fn test_method_names() {
    for method in DefuzzificationMethod::ALL {
        assert_eq!(method.to_string().parse::<DefuzzificationMethod>().unwrap(), method);
    }

    assert_eq!(
        "center_of_gravity".parse::<DefuzzificationMethod>(),
        Ok(DefuzzificationMethod::CenterOfGravity)
    );
    assert_eq!("MoM".parse::<DefuzzificationMethod>(), Ok(DefuzzificationMethod::MeanOfMaximum));
    assert_eq!(
        "bisector".parse::<DefuzzificationMethod>(),
        Err(Error::UnknownMethod("bisector".to_owned()))
    );
}

#[test]
fn test_center_of_gravity() {
    use crate::sets::FuzzySet;
    use DefuzzificationMethod::CenterOfGravity;

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_continuous("Action", "", "", 0., 100.).unwrap();

    let (x, mu) = defuzzify(FuzzySet::triangular(&action, "hold", 50., 30., 70.).unwrap(), CenterOfGravity);

    assert!((x - 50.).abs() < 1e-6);
    assert!((mu - 1.).abs() < 1e-4);

    let (x, _) = defuzzify(FuzzySet::right_linear(&action, "sell", 20., 40.).unwrap(), CenterOfGravity);

    assert!((x - 15.).abs() < 1e-9);

    let buy = FuzzySet::left_quadratic(&action, "buy", 0., 15., 20.).unwrap();
    let intervals = buy.intervals().intervals().unwrap().into_owned();
    let (x, mu) = defuzzify(buy, CenterOfGravity);
    let total: f64 = intervals.iter().map(|i| i.area()).sum();
    let left: f64 = intervals
        .iter()
        .filter(|i| i.lower() < x)
        .map(|i| i.polynomial().integrate(i.lower(), i.upper().min(x)))
        .sum();

    assert!((left - total / 2.).abs() < 1e-6);
    assert!(mu > 0.99);

    // Nothing to weigh
    let (x, mu) = defuzzify(FuzzySet::empty(&action, "nothing").unwrap(), CenterOfGravity);

    assert_eq!((x, mu), (50., 0.));
}

#[test]
fn test_center_of_gravity_in_gap() {
    use crate::sets::FuzzySet;
    use DefuzzificationMethod::CenterOfGravity;

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let apart = [(8., 0.), (16., 1.), (24., 0.), (72., 0.), (80., 1.), (88., 0.)];

    // Equal areas on both sides of the gap between 24 and 72
    assert_eq!(defuzzify(FuzzySet::polyline(&action, "apart", &apart).unwrap(), CenterOfGravity), (48., 0.));

    let adjacent = [(32., 0.), (48., 1.), (64., 0.)];

    assert_eq!(defuzzify(FuzzySet::polyline(&action, "adjacent", &adjacent).unwrap(), CenterOfGravity), (48., 1.));
}

#[test]
fn test_crisp_value_is_cached() {
    use crate::sets::FuzzySet;

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let mut relations = crate::relation::Relations::new();
    let root = relations.insert(FuzzySet::triangular(&action, "hold", 48., 32., 64.).unwrap());

    for method in DefuzzificationMethod::ALL.into_iter().filter(|m| *m != DefuzzificationMethod::CenterOfMaximum) {
        let result = get_defuzzification(relations.get(root).unwrap(), Inputs::new(), method).unwrap();

        assert_eq!(result.crisp.get(), None);
        assert_eq!(result.membership_degree().unwrap(), 1.);

        let first = result.crisp_value().unwrap();

        assert_eq!(result.crisp.get(), Some(&first));
        assert_eq!(result.crisp_value().unwrap(), first);
        assert_eq!(first, 48.);
    }

    let result = get_defuzzification(
        relations.get(root).unwrap(),
        Inputs::new(),
        DefuzzificationMethod::CenterOfGravity,
    )
    .unwrap();

    result.membership_degree().unwrap();

    // The degree of Center-Of-Gravity is read at the cached value
    assert_eq!(result.crisp.get(), Some(&48.));
}

#[test]
fn test_maximum_methods() {
    use crate::sets::FuzzySet;
    use DefuzzificationMethod::{LeftOfMaximum, MeanOfMaximum, RightOfMaximum};

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let trapezoid = || FuzzySet::trapezoidal(&action, "hold", 40. ..=60., 20. ..=80.).unwrap();

    assert_eq!(defuzzify(trapezoid(), LeftOfMaximum), (40., 1.));
    assert_eq!(defuzzify(trapezoid(), RightOfMaximum), (60., 1.));
    assert_eq!(defuzzify(trapezoid(), MeanOfMaximum), (50., 1.));
    assert_eq!(
        defuzzify(FuzzySet::triangular(&action, "peak", 70., 60., 80.).unwrap(), MeanOfMaximum).0,
        70.
    );

    let twins = [(10., 0.), (20., 0.8), (30., 0.8), (40., 0.), (60., 0.), (70., 0.8), (80., 0.8), (90., 0.)];

    assert_eq!(
        defuzzify(FuzzySet::polyline(&action, "twins", &twins).unwrap(), MeanOfMaximum),
        (50., 0.8)
    );

    let uneven = [(10., 0.), (20., 0.8), (30., 0.8), (40., 0.), (60., 0.), (70., 0.8), (90., 0.8), (95., 0.)];

    assert_eq!(defuzzify(FuzzySet::polyline(&action, "uneven", &uneven).unwrap(), MeanOfMaximum).0, 75.);
}

#[test]
fn test_center_of_maximum() {
    use crate::relation::Relations;
    use crate::sets::FuzzySet;

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let mut relations = Relations::new();
    let sell = relations.insert(FuzzySet::singleton(&action, "sell", 0.).unwrap());
    let buy = relations.insert(FuzzySet::singleton(&action, "buy", 100.).unwrap());
    let both = relations.combine(sell, crate::ops::BinaryOp::OrM, buy).unwrap();
    let com = Defuzzification::new(
        relations.get(both).unwrap(),
        Inputs::new(),
        DefuzzificationMethod::CenterOfMaximum,
    )
    .unwrap();

    assert_eq!(com.crisp_value().unwrap(), 50.);
    assert_eq!(com.membership_degree().unwrap(), 1.);

    let ramp = relations.insert(FuzzySet::left_linear(&action, "up", 20., 40.).unwrap());
    let com = Defuzzification::new(
        relations.get(ramp).unwrap(),
        Inputs::new(),
        DefuzzificationMethod::CenterOfMaximum,
    )
    .unwrap();
    let err = com.crisp_value().unwrap_err();

    assert!(matches!(err, Error::NotSingleton(_)));
    assert!(err.is_modeling());
}

#[test]
fn test_rejects_discrete_output() {
    use crate::sets::FuzzySet;

    let mut dims = crate::dimension::Dimensions::new();
    let fruit = dims.add_discrete("Fruit", "");
    let apple = fruit.register_member("apple").unwrap();
    let sweet = FuzzySet::discrete(&fruit, "sweet", [(&apple, 0.7)]).unwrap();
    let mut relations = crate::relation::Relations::new();
    let root = relations.insert(sweet);

    assert!(matches!(
        get_defuzzification(relations.get(root).unwrap(), Inputs::new(), DefuzzificationMethod::LeftOfMaximum),
        Err(Error::InvalidInputs(_))
    ));
}
