//! Error taxonomy for dice, sessions and analyzers.
//!
//! Every validation failure is raised at the boundary call that received the
//! bad input. Face labels are rendered with their `Debug` form so the error
//! type stays independent of the label type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiceError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiceError {
    /// Wrong shape of input at an untyped boundary (weight literal, form
    /// selector, config value) or an empty face/dice collection.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("die faces not distinct: {face} appears more than once")]
    DuplicateFace { face: String },

    #[error("face {face} is not a face of this die")]
    UnknownFace { face: String },

    /// Die `die_index` does not carry the same face set as die 0.
    #[error("all dice must have the same set of faces (die {die_index} differs)")]
    FaceMismatch { die_index: usize },

    #[error("the session has no results; play it before analyzing")]
    NoResults,

    /// The die's weights do not form a distribution (all zero, negative or
    /// non-finite), so it cannot be rolled.
    #[error("cannot roll die: {message}")]
    InvalidWeights { message: String },
}

impl DiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn duplicate_face(face: &impl std::fmt::Debug) -> Self {
        Self::DuplicateFace {
            face: format!("{face:?}"),
        }
    }

    pub(crate) fn unknown_face(face: &impl std::fmt::Debug) -> Self {
        Self::UnknownFace {
            face: format!("{face:?}"),
        }
    }
}
