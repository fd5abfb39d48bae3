use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};
use crate::math::{nice_step, round_to};

new_key_type! {
    /// A dimension key
    pub struct DimensionKey;
}

/// Process-wide identity of a dimension. Unlike a [`DimensionKey`], which is only unique
/// within its [`Dimensions`] registry, no two dimensions ever share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(u64);

impl DimensionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);

        DimensionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Axis marks are derived from at least this many steps across a continuous universe.
const MIN_NUMBER_OF_STEPS: f64 = 4.;

/// The universe of a dimension.
#[derive(Debug)]
pub enum DimensionKind {
    Continuous { min: f64, max: f64, unit: String },
    /// Members are numbered from 1 in registration order; `members[i]` is the caption of
    /// member `i + 1`.
    Discrete { members: Mutex<Vec<String>> },
}

/// A named variable a fuzzy relation ranges over, e.g. "Outdoor temperature".
///
/// Dimensions are shared read-only behind an `Arc` once built. The only mutable parts are
/// the member registry of a discrete dimension and the list of significant values.
#[derive(Debug)]
pub struct Dimension {
    id: DimensionId,
    key: DimensionKey,
    name: String,
    description: String,
    kind: DimensionKind,
    significant: RwLock<Vec<f64>>,
}

impl Dimension {
    pub fn id(&self) -> DimensionId {
        self.id
    }

    /// Key within the registry that created this dimension.
    pub fn key(&self) -> DimensionKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &DimensionKind {
        &self.kind
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, DimensionKind::Discrete { .. })
    }

    pub fn unit(&self) -> Option<&str> {
        match &self.kind {
            DimensionKind::Continuous { unit, .. } => Some(unit),
            DimensionKind::Discrete { .. } => None,
        }
    }

    /// Lower bound of the universe. Discrete members start at 1.
    pub fn min_value(&self) -> f64 {
        match &self.kind {
            DimensionKind::Continuous { min, .. } => *min,
            DimensionKind::Discrete { .. } => 1.,
        }
    }

    /// Upper bound of the universe. For a discrete dimension, the number of the last
    /// registered member (0 while there are none).
    pub fn max_value(&self) -> f64 {
        match &self.kind {
            DimensionKind::Continuous { max, .. } => *max,
            DimensionKind::Discrete { .. } => f64::from(self.member_count()),
        }
    }

    /// Middle of a continuous universe; the fallback answer of degenerate defuzzifications.
    pub fn midpoint(&self) -> f64 {
        (self.min_value() + self.max_value()) / 2.
    }

    pub fn contains(&self, x: f64) -> bool {
        match &self.kind {
            DimensionKind::Continuous { min, max, .. } => *min <= x && x <= *max,
            DimensionKind::Discrete { .. } => x.fract() == 0. && x >= 1. && x <= self.max_value(),
        }
    }

    pub fn member_count(&self) -> u32 {
        match &self.kind {
            DimensionKind::Continuous { .. } => 0,
            DimensionKind::Discrete { members } => {
                members.lock().unwrap_or_else(PoisonError::into_inner).len() as u32
            },
        }
    }

    /// Registers a new member and hands out its number. Numbering is serialized, so
    /// members registered from several threads never share a number.
    pub fn register_member(&self, caption: impl Into<String>) -> Result<DiscreteMember> {
        let DimensionKind::Discrete { members } = &self.kind else {
            return Err(self.invalid("members can only be registered on a discrete dimension"));
        };
        let caption = caption.into();
        let mut members = members.lock().unwrap_or_else(PoisonError::into_inner);

        members.push(caption.clone());

        Ok(DiscreteMember {
            caption,
            value: members.len() as u32,
            dimension: self.id,
        })
    }

    /// Caption of the member numbered `value`, if any.
    pub fn member_caption(&self, value: f64) -> Option<String> {
        let DimensionKind::Discrete { members } = &self.kind else {
            return None;
        };

        if value.fract() != 0. || value < 1. {
            return None;
        }

        let members = members.lock().unwrap_or_else(PoisonError::into_inner);

        members.get(value as usize - 1).cloned()
    }

    /// Every registered member, in numbering order.
    pub(crate) fn members(&self) -> Vec<DiscreteMember> {
        let DimensionKind::Discrete { members } = &self.kind else {
            return Vec::new();
        };
        let members = members.lock().unwrap_or_else(PoisonError::into_inner);

        members
            .iter()
            .zip(1..)
            .map(|(caption, value)| DiscreteMember {
                caption: caption.clone(),
                value,
                dimension: self.id,
            })
            .collect()
    }

    /// Sorted values worth marking on a rendered axis.
    pub fn significant_values(&self) -> Vec<f64> {
        self.significant.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Marks a discrete member as significant. Marking it twice has no further effect.
    pub fn make_significant(&self, value: f64) -> Result<()> {
        if !self.is_discrete() {
            return Err(self.invalid("only members of a discrete dimension can be made significant"));
        }

        let mut significant = self.significant.write().unwrap_or_else(PoisonError::into_inner);

        if let Err(pos) = significant.binary_search_by(|v| v.total_cmp(&value)) {
            significant.insert(pos, value);
        }

        Ok(())
    }

    /// Replaces the automatically derived marks.
    pub fn set_significant_values(&self, values: impl IntoIterator<Item = f64>) -> Result<()> {
        let mut values: Vec<f64> = values.into_iter().collect();

        if let Some(outside) = values.iter().find(|v| !self.contains(**v)) {
            return Err(self.invalid(format!("significant value {outside} is outside the universe")));
        }

        values.sort_by(f64::total_cmp);
        values.dedup();

        *self.significant.write().unwrap_or_else(PoisonError::into_inner) = values;

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidDimension {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Dimensions compare by identity: two registrations are two dimensions even when they
/// look alike.
impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit() {
            Some(unit) if !unit.is_empty() => write!(f, "{} [{unit}]", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

/// Marks for a continuous axis: both bounds plus every step of a rounded quarter of the
/// range in between.
fn axis_marks(min: f64, max: f64) -> Vec<f64> {
    if min == max {
        return vec![min];
    }

    let (step, log) = nice_step((max - min) / MIN_NUMBER_OF_STEPS);
    let decimals = (-log).max(0) + 1;
    let mut marks = vec![min];
    let mut i = 1.;

    loop {
        let mark = round_to(min + i * step, decimals);

        if mark >= max {
            break;
        }

        marks.push(mark);
        i += 1.;
    }

    marks.push(max);
    marks.dedup();

    marks
}

/// A member of a discrete dimension: its caption and its 1-based number.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteMember {
    caption: String,
    value: u32,
    dimension: DimensionId,
}

impl DiscreteMember {
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }
}

impl fmt::Display for DiscreteMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.caption)
    }
}

#[derive(Default)]
pub struct Dimensions(pub(crate) SlotMap<DimensionKey, Arc<Dimension>>);

impl Dimensions {
    pub fn new() -> Self {
        Self(SlotMap::with_key())
    }

    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Result<Arc<Dimension>> {
        let name = name.into();

        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(Error::InvalidDimension {
                name,
                reason: format!("bounds {min}..={max} don't form a finite range"),
            });
        }

        let description = description.into();
        let unit = unit.into();
        let key = self.0.insert_with_key(|key| {
            Arc::new(Dimension {
                id: DimensionId::next(),
                key,
                name,
                description,
                kind: DimensionKind::Continuous { min, max, unit },
                significant: RwLock::new(axis_marks(min, max)),
            })
        });

        Ok(self.0[key].clone())
    }

    pub fn add_discrete(&mut self, name: impl Into<String>, description: impl Into<String>) -> Arc<Dimension> {
        let name = name.into();
        let description = description.into();
        let key = self.0.insert_with_key(|key| {
            Arc::new(Dimension {
                id: DimensionId::next(),
                key,
                name,
                description,
                kind: DimensionKind::Discrete {
                    members: Mutex::new(Vec::new()),
                },
                significant: RwLock::new(Vec::new()),
            })
        });

        self.0[key].clone()
    }

    pub fn get(&self, key: DimensionKey) -> Option<&Arc<Dimension>> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Dimension>> {
        self.0.values()
    }
}

#[test]
fn test_continuous_marks() {
    let mut dims = Dimensions::new();
    let temperature = dims.add_continuous("Temperature", "Outdoor", "°C", -20., 40.).unwrap();

    assert_eq!(temperature.significant_values(), vec![-20., -10., 0., 10., 20., 30., 40.]);
    assert_eq!(temperature.to_string(), "Temperature [°C]");
    assert_eq!(temperature.midpoint(), 10.);

    let percent = dims.add_continuous("Percent", "", "%", 0., 100.).unwrap();

    assert_eq!(percent.significant_values(), vec![0., 20., 40., 60., 80., 100.]);

    let point = dims.add_continuous("Point", "", "", 3., 3.).unwrap();

    assert_eq!(point.significant_values(), vec![3.]);
    assert!(dims.add_continuous("Broken", "", "", 5., 1.).is_err());
    assert_eq!(dims.len(), 3);
}

#[test]
fn test_discrete_members() {
    let mut dims = Dimensions::new();
    let fruit = dims.add_discrete("Fruit", "Things on the table");

    assert_eq!(fruit.member_count(), 0);
    assert!(fruit.significant_values().is_empty());

    let apple = fruit.register_member("apple").unwrap();
    let pear = fruit.register_member("pear").unwrap();

    assert_eq!((apple.value(), pear.value()), (1, 2));
    assert_eq!(fruit.member_count(), 2);
    assert_eq!(fruit.member_caption(2.).as_deref(), Some("pear"));
    assert_eq!(fruit.member_caption(3.), None);
    assert!(fruit.contains(2.) && !fruit.contains(2.5) && !fruit.contains(0.));

    fruit.make_significant(2.).unwrap();
    fruit.make_significant(1.).unwrap();
    fruit.make_significant(2.).unwrap();

    assert_eq!(fruit.significant_values(), vec![1., 2.]);

    let mut other = Dimensions::new();
    let length = other.add_continuous("Length", "", "m", 0., 1.).unwrap();

    assert!(length.register_member("nope").is_err());
    assert!(length.make_significant(0.5).is_err());
    assert!(length.set_significant_values([0., 2.]).is_err());

    length.set_significant_values([1., 0., 0.5, 0.5]).unwrap();

    assert_eq!(length.significant_values(), vec![0., 0.5, 1.]);
}

#[test]
fn test_concurrent_registration() {
    let mut dims = Dimensions::new();
    let product = dims.add_discrete("Product", "");
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let product = product.clone();

            std::thread::spawn(move || {
                (0..25)
                    .map(|i| product.register_member(format!("{t}-{i}")).unwrap().value())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut values: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

    values.sort_unstable();

    assert_eq!(values, (1..=200).collect::<Vec<_>>());
    assert_eq!(product.member_count(), 200);
}

#[test]
fn test_identity_across_registries() {
    let mut first = Dimensions::new();
    let mut second = Dimensions::new();
    let macd = first.add_continuous("MACD", "", "", 0., 100.).unwrap();
    let action = second.add_continuous("Action", "", "", 0., 100.).unwrap();

    // Both registries hand out the same first key
    assert_eq!(macd.key(), action.key());
    assert_ne!(macd.id(), action.id());
    assert!(*macd != *action);

    let sector = second.add_discrete("Sector", "");
    let tech = sector.register_member("tech").unwrap();

    assert_eq!(tech.dimension(), sector.id());
}
