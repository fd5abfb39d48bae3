use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use crate::ops::{BinaryOp, UnaryOp};
use crate::sets::FuzzySet;

/// Relation expression, materialized with [`crate::Relations::insert`].
///
/// `&`, `|` and `!` stand for the min/max operators and the complement; everything else
/// has a named combinator.
#[derive(Clone, Debug)]
pub enum Expr {
    Set(Arc<FuzzySet>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn set(set: &Arc<FuzzySet>) -> Self {
        Expr::Set(set.clone())
    }

    pub fn unary(self, op: UnaryOp) -> Self {
        Expr::Unary(op, Box::new(self))
    }

    pub fn binary(self, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
        Expr::Binary(op, Box::new(self), Box::new(rhs.into()))
    }

    pub fn and_m(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::AndM, rhs)
    }

    pub fn and_a(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::AndA, rhs)
    }

    pub fn and_b(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::AndB, rhs)
    }

    pub fn or_m(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::OrM, rhs)
    }

    pub fn or_a(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::OrA, rhs)
    }

    pub fn or_b(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::OrB, rhs)
    }

    pub fn rss(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Rss, rhs)
    }

    pub fn complement(self) -> Self {
        self.unary(UnaryOp::Complement)
    }

    /// Intensification, the hedge "very".
    pub fn very(self) -> Self {
        self.unary(UnaryOp::Intensification)
    }

    /// Leaf sets in left-to-right order, repeats included.
    pub fn sets(&self) -> Vec<&Arc<FuzzySet>> {
        let mut sets = Vec::new();

        fn walk<'e>(expr: &'e Expr, out: &mut Vec<&'e Arc<FuzzySet>>) {
            match expr {
                Expr::Set(set) => out.push(set),
                Expr::Unary(_, operand) => walk(operand, out),
                Expr::Binary(_, left, right) => {
                    walk(left, out);
                    walk(right, out);
                },
            }
        }

        walk(self, &mut sets);

        sets
    }
}

impl From<Arc<FuzzySet>> for Expr {
    fn from(set: Arc<FuzzySet>) -> Self {
        Expr::Set(set)
    }
}

impl From<&Arc<FuzzySet>> for Expr {
    fn from(set: &Arc<FuzzySet>) -> Self {
        Expr::Set(set.clone())
    }
}

impl From<FuzzySet> for Expr {
    fn from(set: FuzzySet) -> Self {
        Expr::Set(Arc::new(set))
    }
}

impl<R: Into<Expr>> BitAnd<R> for Expr {
    type Output = Expr;

    fn bitand(self, rhs: R) -> Expr {
        self.and_m(rhs)
    }
}

impl<R: Into<Expr>> BitOr<R> for Expr {
    type Output = Expr;

    fn bitor(self, rhs: R) -> Expr {
        self.or_m(rhs)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.complement()
    }
}

#[test]
fn test_operators_build_tree() {
    let mut dims = crate::dimension::Dimensions::new();
    let dim = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&dim, "cold", 10., 20.).unwrap());
    let hot = Arc::new(FuzzySet::left_linear(&dim, "hot", 25., 35.).unwrap());

    let expr = !(Expr::set(&cold) | &hot) & Expr::set(&hot).very();

    let Expr::Binary(BinaryOp::AndM, left, right) = &expr else {
        panic!("expected and");
    };

    assert!(matches!(**left, Expr::Unary(UnaryOp::Complement, _)));
    assert!(matches!(**right, Expr::Unary(UnaryOp::Intensification, _)));

    let captions: Vec<_> = expr.sets().iter().map(|s| s.caption()).collect();

    assert_eq!(captions, ["cold", "hot", "hot"]);
}
