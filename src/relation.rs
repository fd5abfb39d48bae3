use std::fmt;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::dimension::{Dimension, DimensionId};
use crate::dsl::Expr;
use crate::error::{Error, Result};
use crate::inputs::Inputs;
use crate::interval_set::IntervalSet;
use crate::ops::{BinaryOp, RssChain, UnaryOp};
use crate::sets::FuzzySet;

new_key_type! {
    /// A relation key
    pub struct RelationKey;
}

#[derive(Clone, Debug)]
pub enum RelationKind {
    Leaf(Arc<FuzzySet>),
    Unary {
        op: UnaryOp,
        operand: RelationKey,
    },
    Binary {
        op: BinaryOp,
        left: RelationKey,
        right: RelationKey,
        /// Present for RSS nodes
        rss: Option<RssChain>,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct RelationNode {
    kind: RelationKind,
    parent: Option<RelationKey>,
}

/// Arena holding relation trees. Nodes refer to their children and to their parent by
/// key, so a tree never owns itself.
#[derive(Default)]
pub struct Relations(pub(crate) SlotMap<RelationKey, RelationNode>);

impl Relations {
    pub fn new() -> Self {
        Self(SlotMap::with_key())
    }

    /// Materializes an expression into a new tree and returns its root. Every occurrence
    /// of a set becomes a leaf of its own.
    pub fn insert(&mut self, expr: impl Into<Expr>) -> RelationKey {
        match expr.into() {
            Expr::Set(set) => self.0.insert(RelationNode {
                kind: RelationKind::Leaf(set),
                parent: None,
            }),
            Expr::Unary(op, operand) => {
                let operand = self.insert(*operand);

                self.attach_unary(op, operand)
            },
            Expr::Binary(op, left, right) => {
                let left = self.insert(*left);
                let right = self.insert(*right);

                self.attach_binary(op, left, right)
            },
        }
    }

    /// Combines two existing roots under a new binary node.
    pub fn combine(&mut self, left: RelationKey, op: BinaryOp, right: RelationKey) -> Result<RelationKey> {
        self.ensure_root(left)?;
        self.ensure_root(right)?;

        if left == right {
            return Err(Error::AlreadyComposed);
        }

        Ok(self.attach_binary(op, left, right))
    }

    /// Applies a unary operator to an existing root.
    pub fn apply(&mut self, op: UnaryOp, operand: RelationKey) -> Result<RelationKey> {
        self.ensure_root(operand)?;

        Ok(self.attach_unary(op, operand))
    }

    pub fn get(&self, key: RelationKey) -> Option<Relation<'_>> {
        self.0.contains_key(key).then_some(Relation { relations: self, key })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn ensure_root(&self, key: RelationKey) -> Result<()> {
        match self.0.get(key) {
            None => Err(Error::InvalidInputs("unknown relation".to_owned())),
            Some(node) if node.parent.is_some() => Err(Error::AlreadyComposed),
            Some(_) => Ok(()),
        }
    }

    fn rss_chain(&self, key: RelationKey) -> Option<RssChain> {
        match self.0.get(key).map(|n| &n.kind) {
            Some(RelationKind::Binary { rss, .. }) => *rss,
            _ => None,
        }
    }

    fn attach_unary(&mut self, op: UnaryOp, operand: RelationKey) -> RelationKey {
        let key = self.0.insert(RelationNode {
            kind: RelationKind::Unary { op, operand },
            parent: None,
        });

        self.0[operand].parent = Some(key);

        key
    }

    fn attach_binary(&mut self, op: BinaryOp, left: RelationKey, right: RelationKey) -> RelationKey {
        let rss = match op {
            BinaryOp::Rss => Some(RssChain::new(
                self.rss_chain(left).as_ref(),
                self.rss_chain(right).as_ref(),
            )),
            _ => None,
        };
        let key = self.0.insert(RelationNode {
            kind: RelationKind::Binary { op, left, right, rss },
            parent: None,
        });

        self.0[left].parent = Some(key);
        self.0[right].parent = Some(key);

        key
    }
}

/// A node of a relation tree together with the arena it lives in.
#[derive(Clone, Copy)]
pub struct Relation<'r> {
    relations: &'r Relations,
    key: RelationKey,
}

impl<'r> Relation<'r> {
    fn node(&self) -> &'r RelationNode {
        &self.relations.0[self.key]
    }

    fn at(&self, key: RelationKey) -> Relation<'r> {
        Relation {
            relations: self.relations,
            key,
        }
    }

    pub fn key(&self) -> RelationKey {
        self.key
    }

    pub fn kind(&self) -> &'r RelationKind {
        &self.node().kind
    }

    pub fn parent(&self) -> Option<Relation<'r>> {
        self.node().parent.map(|key| self.at(key))
    }

    /// True for a plain fuzzy set.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind(), RelationKind::Leaf(_))
    }

    pub fn set(&self) -> Option<&'r Arc<FuzzySet>> {
        match self.kind() {
            RelationKind::Leaf(set) => Some(set),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<Relation<'r>> {
        match *self.kind() {
            RelationKind::Leaf(_) => Vec::new(),
            RelationKind::Unary { operand, .. } => vec![self.at(operand)],
            RelationKind::Binary { left, right, .. } => vec![self.at(left), self.at(right)],
        }
    }

    /// Caption of the operator of a composite node.
    pub fn operator(&self) -> Option<&'static str> {
        match self.kind() {
            RelationKind::Leaf(_) => None,
            RelationKind::Unary { op, .. } => Some(op.caption()),
            RelationKind::Binary { op, .. } => Some(op.caption()),
        }
    }

    /// True for an RSS node that ends its chain, i.e. whose parent is not an RSS node.
    pub fn is_final_division(&self) -> bool {
        !matches!(
            self.parent().map(|p| p.kind()),
            Some(RelationKind::Binary { rss: Some(_), .. })
        )
    }

    /// Distinct dimensions of all leaves, in order of first appearance.
    pub fn dimensions(&self) -> Vec<Arc<Dimension>> {
        let mut dimensions: Vec<Arc<Dimension>> = Vec::new();

        self.collect_dimensions(&mut dimensions);

        dimensions
    }

    fn collect_dimensions(&self, out: &mut Vec<Arc<Dimension>>) {
        if let Some(set) = self.set() {
            if !out.iter().any(|d| d == set.dimension()) {
                out.push(set.dimension().clone());
            }

            return;
        }

        for child in self.children() {
            child.collect_dimensions(out);
        }
    }

    fn dimension_ids(&self) -> Vec<DimensionId> {
        self.dimensions().iter().map(|d| d.id()).collect()
    }

    /// Degree to which the crisp point `inputs` belongs to this relation. Exactly the
    /// dimensions of the relation must be given.
    pub fn is_member(&self, inputs: &Inputs) -> Result<f64> {
        let dimensions = self.dimensions();

        if inputs.len() != dimensions.len() {
            return Err(Error::InvalidInputs(format!(
                "number of inputs ({}) does not match with number of dimensions in this relation ({})",
                inputs.len(),
                dimensions.len()
            )));
        }

        if let Some(missing) = dimensions.iter().find(|d| !inputs.contains(d.id())) {
            return Err(Error::InvalidInputs(format!(
                "there is missing dimension \"{}\" within the inputs",
                missing.name()
            )));
        }

        self.membership(inputs)
    }

    fn membership(&self, inputs: &Inputs) -> Result<f64> {
        match *self.kind() {
            RelationKind::Leaf(ref set) => {
                let value = leaf_input(set, inputs)?;

                set.membership_degree(value)
            },
            RelationKind::Unary { op, operand } => {
                let operand = self.at(operand);

                Ok(op.call(operand.membership(&inputs.restricted_to(&operand.dimension_ids()))?))
            },
            RelationKind::Binary { op, left, right, rss } => {
                let (left, right) = (self.at(left), self.at(right));
                let u = left.membership(&inputs.restricted_to(&left.dimension_ids()))?;
                let v = right.membership(&inputs.restricted_to(&right.dimension_ids()))?;

                Ok(match rss {
                    Some(chain) => chain.call(u, v, self.is_final_division()),
                    None => op.call(u, v),
                })
            },
        }
    }

    /// Membership function over the one dimension `inputs` leaves unspecified, with all
    /// other dimensions held at their input values. Inputs for dimensions the relation
    /// doesn't use are ignored.
    pub fn function(&self, inputs: &Inputs) -> Result<IntervalSet> {
        let variable = self.variable_dimension(inputs)?;

        self.function_of(inputs, &variable)
    }

    /// Membership function over `variable`, every other dimension held at its input value.
    pub fn function_of(&self, inputs: &Inputs, variable: &Arc<Dimension>) -> Result<IntervalSet> {
        match *self.kind() {
            RelationKind::Leaf(ref set) => {
                if set.dimension() == variable {
                    return Ok(set.intervals().clone());
                }

                let degree = set.membership_degree(leaf_input(set, inputs)?)?;

                IntervalSet::constant(variable.clone(), degree)
            },
            RelationKind::Unary { op, operand } => op.apply(&self.at(operand).function_of(inputs, variable)?),
            RelationKind::Binary { op, left, right, rss } => {
                let a = self.at(left).function_of(inputs, variable)?;
                let b = self.at(right).function_of(inputs, variable)?;

                match rss {
                    Some(chain) => chain.apply(&a, &b, self.is_final_division()),
                    None => op.apply(&a, &b),
                }
            },
        }
    }

    /// The only dimension of this relation without an input.
    pub fn variable_dimension(&self, inputs: &Inputs) -> Result<Arc<Dimension>> {
        let mut unspecified: Vec<Arc<Dimension>> = self
            .dimensions()
            .into_iter()
            .filter(|d| !inputs.contains(d.id()))
            .collect();

        match unspecified.len() {
            0 => Err(Error::InvalidInputs(
                "there are no unspecified dimensions left, the function would be a constant".to_owned(),
            )),
            1 => Ok(unspecified.remove(0)),
            n => Err(Error::InvalidInputs(format!("there are {n} unspecified dimensions left, expected one"))),
        }
    }

    /// Start of the first non-empty piece of the projected function.
    pub fn lower_support_bound(&self, inputs: &Inputs) -> Result<f64> {
        let function = self.function(inputs)?;
        let intervals = function.intervals()?;

        Ok(match intervals.iter().find(|i| !i.is_empty()) {
            Some(interval) => interval.lower(),
            None => fallback_bound(function.dimension(), Dimension::min_value),
        })
    }

    /// End of the last non-empty piece of the projected function.
    pub fn upper_support_bound(&self, inputs: &Inputs) -> Result<f64> {
        let function = self.function(inputs)?;
        let intervals = function.intervals()?;

        Ok(match intervals.iter().rev().find(|i| !i.is_empty()) {
            Some(interval) => interval.upper(),
            None => fallback_bound(function.dimension(), Dimension::max_value),
        })
    }

    /// Collapses the relation into a fuzzy set over its single unspecified dimension.
    pub fn project(&self, inputs: &Inputs) -> Result<FuzzySet> {
        FuzzySet::from_intervals(&self.to_string(), self.function(inputs)?)
    }
}

fn leaf_input(set: &FuzzySet, inputs: &Inputs) -> Result<f64> {
    inputs.get(set.dimension().id()).ok_or_else(|| {
        Error::InvalidInputs(format!(
            "the input does not specify dimension \"{}\" used by set \"{}\"",
            set.dimension().name(),
            set.caption()
        ))
    })
}

fn fallback_bound(dimension: &Dimension, bound: fn(&Dimension) -> f64) -> f64 {
    if dimension.is_discrete() {
        0.
    } else {
        bound(dimension)
    }
}

impl fmt::Display for Relation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.kind() {
            RelationKind::Leaf(ref set) => f.write_str(set.caption()),
            RelationKind::Unary { op, operand } => write!(f, "{op}({})", self.at(operand)),
            RelationKind::Binary { op, left, right, .. } => {
                write!(f, "({} {op} {})", self.at(left), self.at(right))
            },
        }
    }
}

#[cfg(test)]
fn flat(dimension: &Arc<Dimension>, caption: &str, degree: f64) -> Arc<FuzzySet> {
    Arc::new(FuzzySet::polyline(dimension, caption, &[(50., degree)]).unwrap())
}

#[test]
fn test_tree_structure() {
    let mut dims = crate::dimension::Dimensions::new();
    let temp = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let humidity = dims.add_continuous("Humidity", "", "%", 0., 100.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let damp = Arc::new(FuzzySet::left_linear(&humidity, "damp", 60., 80.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold) & Expr::set(&damp).very() | &cold);
    let relation = relations.get(root).unwrap();

    assert_eq!(relation.to_string(), "((cold And m Intensification(damp)) Or m cold)");
    assert!(relation.parent().is_none());
    assert!(!relation.is_terminal());

    let names: Vec<_> = relation.dimensions().iter().map(|d| d.name().to_owned()).collect();

    assert_eq!(names, ["Temperature", "Humidity"]);

    let children = relation.children();

    assert_eq!(children[0].parent().map(|p| p.key()), Some(root));
    assert!(children[1].is_terminal());
    assert_eq!(relations.len(), 6);

    let inner = children[0].key();

    assert_eq!(relations.combine(inner, BinaryOp::OrA, root), Err(Error::AlreadyComposed));
}

#[test]
fn test_is_member_validates_inputs() {
    let mut dims = crate::dimension::Dimensions::new();
    let temp = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let humidity = dims.add_continuous("Humidity", "", "%", 0., 100.).unwrap();
    let wind = dims.add_continuous("Wind", "", "m/s", 0., 30.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let damp = Arc::new(FuzzySet::left_linear(&humidity, "damp", 60., 80.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold).and_a(&damp));
    let relation = relations.get(root).unwrap();
    let mut inputs = Inputs::new();

    inputs.add(&temp, 15.);

    assert!(matches!(relation.is_member(&inputs), Err(Error::InvalidInputs(_))));

    inputs.add(&humidity, 70.);

    assert_eq!(relation.is_member(&inputs).unwrap(), 0.25);

    inputs.add(&wind, 3.);

    assert!(matches!(relation.is_member(&inputs), Err(Error::InvalidInputs(_))));
}

#[test]
fn test_function_projects_fixed_inputs() {
    let mut dims = crate::dimension::Dimensions::new();
    let temp = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let heating = dims.add_continuous("Heating", "", "%", 0., 100.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let high = Arc::new(FuzzySet::left_linear(&heating, "high", 50., 100.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold) & &high);
    let relation = relations.get(root).unwrap();
    let mut inputs = Inputs::new();

    inputs.add(&temp, 17.5);

    let function = relation.function(&inputs).unwrap();

    assert_eq!(function.dimension().name(), "Heating");
    assert_eq!(function.membership_degree(20.).unwrap(), 0.);
    assert_eq!(function.membership_degree(60.).unwrap(), 0.2);
    assert_eq!(function.membership_degree(90.).unwrap(), 0.25);
    assert_eq!(relation.lower_support_bound(&inputs).unwrap(), 50.);
    assert_eq!(relation.upper_support_bound(&inputs).unwrap(), 100.);

    let projected = relation.project(&inputs).unwrap();

    assert_eq!(projected.caption(), "(cold And m high)");
    assert_eq!(projected.membership_degree(90.).unwrap(), 0.25);

    // Both dimensions open
    assert!(relation.function(&Inputs::new()).is_err());

    inputs.add(&heating, 10.);

    assert!(relation.function(&inputs).is_err());
}

#[test]
fn test_rss_divides_once_per_chain() {
    let mut dims = crate::dimension::Dimensions::new();
    let dim = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let sets: Vec<_> = (0..4).map(|i| flat(&dim, &format!("r{i}"), 0.6)).collect();
    let mut relations = Relations::new();
    let mut inputs = Inputs::new();

    inputs.add(&dim, 30.);

    let two = relations.insert(Expr::set(&sets[0]).rss(&sets[1]));
    let three = relations.insert(Expr::set(&sets[0]).rss(&sets[1]).rss(&sets[2]));
    let four = relations.insert(Expr::set(&sets[0]).rss(&sets[1]).rss(Expr::set(&sets[2]).rss(&sets[3])));
    let chained = relations.insert(Expr::set(&sets[0]).rss(&sets[1]).rss(&sets[2]).rss(&sets[3]));

    for root in [two, three, four, chained] {
        let relation = relations.get(root).unwrap();

        assert!((relation.is_member(&inputs).unwrap() - 0.36).abs() < 1e-9, "{relation}");

        let function = relation.function(&Inputs::new()).unwrap();

        assert!((function.membership_degree(70.).unwrap() - 0.36).abs() < 1e-9);
    }

    let a = flat(&dim, "a", 0.2);
    let b = flat(&dim, "b", 0.4);
    let c = flat(&dim, "c", 0.6);
    let uneven = relations.insert(Expr::set(&a).rss(&b).rss(&c));

    assert!((relations.get(uneven).unwrap().is_member(&inputs).unwrap() - 0.56 / 3.).abs() < 1e-9);
}

#[test]
fn test_combine_extends_rss_chain() {
    let mut dims = crate::dimension::Dimensions::new();
    let dim = dims.add_continuous("Action", "", "", 0., 100.).unwrap();
    let mut relations = Relations::new();
    let first = relations.insert(Expr::set(&flat(&dim, "a", 0.2)).rss(&flat(&dim, "b", 0.4)));
    let mut inputs = Inputs::new();

    inputs.add(&dim, 10.);

    assert!((relations.get(first).unwrap().is_member(&inputs).unwrap() - 0.1).abs() < 1e-9);

    let third = relations.insert(flat(&dim, "c", 0.6));
    let root = relations.combine(first, BinaryOp::Rss, third).unwrap();

    // The former root no longer divides on its own
    assert!(!relations.get(first).unwrap().is_final_division());
    assert!((relations.get(root).unwrap().is_member(&inputs).unwrap() - 0.56 / 3.).abs() < 1e-9);
    assert_eq!(relations.combine(first, BinaryOp::AndM, third), Err(Error::AlreadyComposed));
}

#[test]
fn test_concurrent_evaluation() {
    let mut dims = crate::dimension::Dimensions::new();
    let temp = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let warm = Arc::new(FuzzySet::triangular(&temp, "warm", 25., 15., 35.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold) | &warm);
    let relations = &relations;

    std::thread::scope(|scope| {
        for t in 0..4 {
            let (temp, cold, warm) = (temp.clone(), cold.clone(), warm.clone());

            scope.spawn(move || {
                let relation = relations.get(root).unwrap();

                for i in 0..40 {
                    let x = f64::from(t * 40 + i) / 4.;
                    let mut inputs = Inputs::new();

                    inputs.add(&temp, x);

                    let expected = f64::max(cold.membership_degree(x).unwrap(), warm.membership_degree(x).unwrap());

                    assert_eq!(relation.is_member(&inputs).unwrap(), expected);
                }
            });
        }
    });
}

#[test]
fn test_dimensions_from_separate_registries() {
    let mut sensors = crate::dimension::Dimensions::new();
    let mut controls = crate::dimension::Dimensions::new();
    let temp = sensors.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let heating = controls.add_continuous("Heating", "", "%", 0., 100.).unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let high = Arc::new(FuzzySet::left_linear(&heating, "high", 50., 100.).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold) & &high);
    let relation = relations.get(root).unwrap();

    // First dimension of each registry
    assert_eq!(temp.key(), heating.key());
    assert_eq!(relation.dimensions().len(), 2);

    let mut inputs = Inputs::new();

    inputs.add(&temp, 17.5);

    assert_eq!(relation.variable_dimension(&inputs).unwrap().name(), "Heating");
    assert_eq!(relation.function(&inputs).unwrap().membership_degree(90.).unwrap(), 0.25);

    inputs.add(&heating, 60.);

    assert_eq!(relation.is_member(&inputs).unwrap(), 0.2);
}

#[test]
fn test_project_onto_discrete_dimension() {
    let mut dims = crate::dimension::Dimensions::new();
    let temp = dims.add_continuous("Temperature", "", "°C", 0., 40.).unwrap();
    let fruit = dims.add_discrete("Fruit", "");
    let apple = fruit.register_member("apple").unwrap();
    let pear = fruit.register_member("pear").unwrap();
    let plum = fruit.register_member("plum").unwrap();
    let cold = Arc::new(FuzzySet::right_linear(&temp, "cold", 10., 20.).unwrap());
    let ripe = Arc::new(FuzzySet::discrete(&fruit, "ripe", [(&apple, 0.3), (&pear, 1.)]).unwrap());
    let mut relations = Relations::new();
    let root = relations.insert(Expr::set(&cold) & &ripe);
    let mut inputs = Inputs::new();

    inputs.add(&temp, 15.);

    let projected = relations.get(root).unwrap().project(&inputs).unwrap();

    assert_eq!(projected.members().collect::<Vec<_>>(), vec![&apple, &pear, &plum]);
    assert_eq!(projected.member_degree(&apple), Some(0.3));
    assert_eq!(projected.member_degree(&pear), Some(0.5));
    assert_eq!(projected.member_degree(&plum), Some(0.));
    assert_eq!(projected.members_between(0.5, 1.).unwrap(), vec![&pear]);
}
