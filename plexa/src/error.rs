//! Registration errors.
//!
//! Every variant rejects the registration as a whole: no candidate of a
//! failing registration ever reaches a dispatch point.

use thiserror::Error;

use crate::lattice::TypeExprError;

/// Errors raised while turning an implementation into candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error(transparent)]
    TypeExpression(#[from] TypeExprError),

    #[error("parameter `{param}` (position {index}) has a default value but no type annotation")]
    MissingAnnotation { param: String, index: usize },

    #[error("cannot permute an empty signature")]
    EmptySignature,

    #[error("no parameter information available for `{name}`")]
    Unreflectable { name: String },
}

/// Registration result type.
pub type RegisterResult<T> = Result<T, RegisterError>;
