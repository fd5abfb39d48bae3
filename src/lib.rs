//! Fuzzy relations over continuous and discrete dimensions with exact piecewise-polynomial
//! membership functions.
//!
//! Sets are built over [`Dimension`]s, combined into relation trees with [`BinaryOp`] and
//! [`UnaryOp`] (or the [`Expr`] combinators), evaluated at crisp points, projected onto one
//! dimension and finally defuzzified to a crisp value.
//!
//! ```ignore
//! let mut dims = Dimensions::new();
//! let rsi = dims.add_continuous("RSI", "Relative strength index", "", 0., 100.)?;
//! let action = dims.add_continuous("Action", "Sell (0) to buy (100)", "", 0., 100.)?;
//! let low_rsi = Arc::new(FuzzySet::right_linear(&rsi, "low", 20., 40.)?);
//! let buy = Arc::new(FuzzySet::left_linear(&action, "buy", 50., 80.)?);
//!
//! let mut relations = Relations::new();
//! let rule = relations.insert(Expr::set(&low_rsi) & &buy);
//! let mut inputs = Inputs::new();
//!
//! inputs.add(&rsi, 5.);
//!
//! let result = get_defuzzification(relations.get(rule).unwrap(), inputs, DefuzzificationMethod::MeanOfMaximum)?;
//! let crisp = result.crisp_value()?;
//! ```

mod defuzzification;
mod dimension;
mod dsl;
mod error;
mod inputs;
mod interval;
mod interval_set;
mod math;
mod ops;
mod polynomial;
mod relation;
mod sets;
mod terms;

pub use defuzzification::{get_defuzzification, Defuzzification, DefuzzificationMethod};
pub use dimension::{Dimension, DimensionId, DimensionKey, DimensionKind, Dimensions, DiscreteMember};
pub use dsl::Expr;
pub use error::{Error, Result};
pub use inputs::Inputs;
pub use interval::{Interval, Plateau};
pub use interval_set::{IntervalSet, SubRange};
pub use ops::{BinaryOp, RssChain, UnaryOp};
pub use polynomial::Polynomial;
pub use relation::{Relation, RelationKey, RelationKind, Relations};
pub use sets::{FuzzySet, Shape};
pub use terms::{Key, Term, Terms};
