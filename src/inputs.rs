use std::collections::HashMap;

use crate::dimension::{Dimension, DimensionId, DiscreteMember};

/// Crisp values assigned to dimensions for an evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs(pub(crate) HashMap<DimensionId, f64>);

impl Inputs {
    pub fn new() -> Self {
        Inputs(HashMap::new())
    }

    pub fn add(&mut self, dimension: &Dimension, value: f64) -> &mut Self {
        self.0.insert(dimension.id(), value);
        self
    }

    /// Assigns a member of a discrete dimension.
    pub fn add_member(&mut self, member: &DiscreteMember) -> &mut Self {
        self.0.insert(member.dimension(), f64::from(member.value()));
        self
    }

    pub fn insert(&mut self, id: DimensionId, value: f64) -> Option<f64> {
        self.0.insert(id, value)
    }

    pub fn get(&self, id: DimensionId) -> Option<f64> {
        self.0.get(&id).copied()
    }

    pub fn contains(&self, id: DimensionId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Only the values for `ids`.
    pub(crate) fn restricted_to(&self, ids: &[DimensionId]) -> Inputs {
        Inputs(
            self.0
                .iter()
                .filter(|(k, _)| ids.contains(k))
                .map(|(k, v)| (*k, *v))
                .collect(),
        )
    }
}

impl FromIterator<(DimensionId, f64)> for Inputs {
    fn from_iter<T: IntoIterator<Item = (DimensionId, f64)>>(iter: T) -> Self {
        Inputs(iter.into_iter().collect())
    }
}

#[test]
fn test_inputs() {
    let mut dims = crate::dimension::Dimensions::new();
    let rsi = dims.add_continuous("RSI", "", "", 0., 100.).unwrap();
    let sector = dims.add_discrete("Sector", "");
    let tech = sector.register_member("tech").unwrap();
    let mut inputs = Inputs::new();

    inputs.add(&rsi, 5.).add_member(&tech);

    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs.get(rsi.id()), Some(5.));
    assert_eq!(inputs.get(sector.id()), Some(1.));

    let only_rsi = inputs.restricted_to(&[rsi.id()]);

    assert_eq!(only_rsi.len(), 1);
    assert!(!only_rsi.contains(sector.id()));

    // A second registry starts its keys over, the ids stay apart
    let mut others = crate::dimension::Dimensions::new();
    let macd = others.add_continuous("MACD", "", "", 0., 100.).unwrap();

    assert_eq!(macd.key(), rsi.key());

    inputs.add(&macd, 90.);

    assert_eq!(inputs.len(), 3);
    assert_eq!(inputs.get(rsi.id()), Some(5.));
    assert_eq!(inputs.get(macd.id()), Some(90.));
}
