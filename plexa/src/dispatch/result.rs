//! Dispatch result types and errors.

use std::fmt;

use thiserror::Error;

use crate::candidate::Candidate;
use crate::lattice::TypeDesc;

/// Result of dispatch resolution.
#[derive(Debug)]
pub enum DispatchResult<'r> {
    /// A unique candidate was selected.
    Resolved(&'r Candidate),
    /// No candidate accepts the arguments.
    NoMatch(NoMatchError),
    /// Several candidates remain after every tie-break.
    Ambiguous(AmbiguityError),
}

impl<'r> DispatchResult<'r> {
    /// The selected candidate, if any.
    pub fn candidate(&self) -> Option<&'r Candidate> {
        match self {
            DispatchResult::Resolved(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, DispatchResult::Resolved(_))
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<&'r Candidate, DispatchError> {
        match self {
            DispatchResult::Resolved(c) => Ok(c),
            DispatchResult::NoMatch(e) => Err(e.into()),
            DispatchResult::Ambiguous(e) => Err(e.into()),
        }
    }
}

/// Error when no candidate matches the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no applicable candidate for `{point}` with argument types ({})", TypeList(.arg_types))]
pub struct NoMatchError {
    /// The dispatch point that was called.
    pub point: String,
    /// The argument types provided.
    pub arg_types: Vec<TypeDesc>,
}

/// Error when several candidates tie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "ambiguous dispatch for `{point}` with argument types ({}): {} candidates tie",
    TypeList(.arg_types),
    .candidates.len()
)]
pub struct AmbiguityError {
    /// The dispatch point that was called.
    pub point: String,
    /// The argument types provided.
    pub arg_types: Vec<TypeDesc>,
    /// The tied candidates, in trie order.
    pub candidates: Vec<Candidate>,
}

impl AmbiguityError {
    /// Names of the implementations involved, without repeats.
    pub fn implementation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for c in &self.candidates {
            let name = c.implementation().target().name.as_ref();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NoApplicableCandidate(#[from] NoMatchError),

    #[error(transparent)]
    AmbiguousDispatch(#[from] AmbiguityError),
}

struct TypeList<'a>(&'a [TypeDesc]);

impl fmt::Display for TypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        Ok(())
    }
}
