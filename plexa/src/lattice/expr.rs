//! Declared type expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::desc::{TypeDesc, Value};

/// Variance marker on a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

/// A type placeholder with an optional upper bound and constraint set.
///
/// A placeholder with a constraint set stands for exactly one of the listed
/// types. One without is "unconstrained": it stands for its bound, or for
/// anything when it has no bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    /// The placeholder name (diagnostics only).
    pub name: String,
    /// Upper bound, if any.
    pub bound: Option<TypeDesc>,
    /// Finite constraint set. Empty means unconstrained.
    pub constraints: Vec<TypeDesc>,
    /// Declared variance.
    pub variance: Variance,
}

impl Placeholder {
    /// An unbounded, unconstrained, invariant placeholder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
            constraints: Vec::new(),
            variance: Variance::Invariant,
        }
    }

    /// Set the upper bound.
    pub fn bounded(mut self, bound: TypeDesc) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Set the constraint set.
    pub fn constrained(mut self, constraints: impl IntoIterator<Item = TypeDesc>) -> Self {
        self.constraints = constraints.into_iter().collect();
        self
    }

    /// Set the variance marker.
    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }

    /// Whether the placeholder has a finite constraint set.
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }
}

/// A declared parameter type, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Concrete(TypeDesc),
    Wildcard,
    /// The enclosing type of a method; resolved from registration context.
    SelfType,
    Placeholder(Placeholder),
    /// A union: any of the members.
    Alternative(Vec<TypeExpr>),
    /// A set of singleton values.
    Literal(Vec<Value>),
}

impl TypeExpr {
    /// Shorthand for a union of concrete types.
    pub fn any_of(types: impl IntoIterator<Item = TypeDesc>) -> Self {
        TypeExpr::Alternative(types.into_iter().map(TypeExpr::Concrete).collect())
    }
}

impl From<TypeDesc> for TypeExpr {
    fn from(ty: TypeDesc) -> Self {
        if ty.is_any() {
            TypeExpr::Wildcard
        } else {
            TypeExpr::Concrete(ty)
        }
    }
}

impl From<Placeholder> for TypeExpr {
    fn from(p: Placeholder) -> Self {
        TypeExpr::Placeholder(p)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Concrete(ty) => write!(f, "{}", ty),
            TypeExpr::Wildcard => write!(f, "Any"),
            TypeExpr::SelfType => write!(f, "Self"),
            TypeExpr::Placeholder(p) => write!(f, "{}", p.name),
            TypeExpr::Alternative(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", m)?;
                }
                Ok(())
            }
            TypeExpr::Literal(values) => {
                write!(f, "Literal[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}
