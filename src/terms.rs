use std::sync::Arc;

pub use fixed_map::key::Key as Term;
pub use fixed_map::Key;
use fixed_map::Map as FixedMap;

use crate::dimension::{Dimension, DiscreteMember};
use crate::error::{Error, Result};
use crate::sets::FuzzySet;

/// Linguistic vocabulary of a discrete dimension: every term of the enum `K` is backed by
/// one registered member.
///
/// ```ignore
/// #[derive(Clone, Copy, Key)]
/// enum Fruit { Apple, Pear }
///
/// let terms = Terms::register(&fruit, [(Fruit::Apple, "apple"), (Fruit::Pear, "pear")])?;
/// let sweet = terms.set(&fruit, "sweet", [(Fruit::Apple, 0.5), (Fruit::Pear, 1.)])?;
/// ```
#[derive(Default)]
pub struct Terms<K: Term>(pub(crate) FixedMap<K, DiscreteMember>);

impl<K: Term> Terms<K> {
    pub fn new() -> Self {
        Self(FixedMap::new())
    }

    /// Registers one member per term, in the given order.
    pub fn register<S: Into<String>>(
        dimension: &Dimension,
        captions: impl IntoIterator<Item = (K, S)>,
    ) -> Result<Self> {
        let mut terms = Self::new();

        for (key, caption) in captions {
            terms.insert(key, dimension.register_member(caption)?);
        }

        Ok(terms)
    }

    pub fn insert(&mut self, key: K, member: DiscreteMember) {
        self.0.insert(key, member);
    }

    pub fn get(&self, key: K) -> Option<&DiscreteMember> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Discrete fuzzy set with the given degree per term.
    pub fn set(
        &self,
        dimension: &Arc<Dimension>,
        caption: &str,
        degrees: impl IntoIterator<Item = (K, f64)>,
    ) -> Result<FuzzySet> {
        let members = degrees
            .into_iter()
            .map(|(key, degree)| match self.0.get(key) {
                Some(member) => Ok((member, degree)),
                None => Err(Error::shape(caption, "term has no registered member")),
            })
            .collect::<Result<Vec<_>>>()?;

        FuzzySet::discrete(dimension, caption, members)
    }
}

#[test]
fn test_vocabulary() {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Key)]
    enum Signal {
        Sell,
        Hold,
        Buy,
    }

    let mut dims = crate::dimension::Dimensions::new();
    let action = dims.add_discrete("Action", "What to do with the stock");
    let terms = Terms::register(&action, [(Signal::Sell, "sell"), (Signal::Hold, "hold")]).unwrap();

    assert_eq!(terms.len(), 2);
    assert_eq!(terms.get(Signal::Hold).map(DiscreteMember::value), Some(2));
    assert!(terms.get(Signal::Buy).is_none());

    let cautious = terms
        .set(&action, "cautious", [(Signal::Hold, 1.), (Signal::Sell, 0.4)])
        .unwrap();

    assert_eq!(cautious.membership_degree(1.).unwrap(), 0.4);
    assert_eq!(cautious.membership_degree(2.).unwrap(), 1.);
    assert!(terms.set(&action, "eager", [(Signal::Buy, 1.)]).is_err());
}
