use thiserror::Error;

/// Everything that can go wrong while building or evaluating fuzzy relations.
///
/// The first group are construction errors: the caller handed in something malformed and
/// can fix the call. The second group are modeling errors: the rule base itself is
/// inconsistent. See [`Error::is_modeling`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid dimension \"{name}\": {reason}")]
    InvalidDimension { name: String, reason: String },

    #[error("invalid shape for set \"{caption}\": {reason}")]
    InvalidShape { caption: String, reason: String },

    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("invalid inputs: {0}")]
    InvalidInputs(String),

    #[error("dimensions don't match: \"{0}\" vs \"{1}\"")]
    DimensionMismatch(String, String),

    #[error("relation is already a child of another relation")]
    AlreadyComposed,

    #[error("unknown defuzzification method \"{0}\"")]
    UnknownMethod(String),

    #[error("formula {formula} is out of range [0,1] for x={x:.3}")]
    MembershipOutOfRange { formula: String, x: f64 },

    #[error("membership function does not cover the universe: {0}")]
    Coverage(String),

    #[error("the following part of the output set is not a singleton, center of maximum cannot be used: {0}")]
    NotSingleton(String),

    #[error("unexpected behaviour: {0}")]
    Unexpected(String),
}

impl Error {
    /// True for violations of modeling invariants, i.e. defects in how the rule base was
    /// authored. Such errors are never worth retrying.
    pub fn is_modeling(&self) -> bool {
        matches!(
            self,
            Self::MembershipOutOfRange { .. } | Self::Coverage(_) | Self::NotSingleton(_) | Self::Unexpected(_)
        )
    }

    pub(crate) fn shape(caption: &str, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            caption: caption.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[test]
fn test_error_classes() {
    assert!(Error::Coverage("gap".into()).is_modeling());
    assert!(Error::NotSingleton("x".into()).is_modeling());
    assert!(!Error::InvalidInputs("missing".into()).is_modeling());
    assert!(!Error::shape("warm", "kernel outside support").is_modeling());
    assert_eq!(
        Error::shape("warm", "kernel outside support").to_string(),
        "invalid shape for set \"warm\": kernel outside support"
    );
}
