//! Candidates: concrete, fully typed overload entries.
//!
//! # Module Structure
//!
//! - [`builder`] - Turns a declared parameter list into candidates
//! - [`permute`] - Adds argument-order permutations of a candidate

pub mod builder;
pub mod permute;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lattice::{TypeDesc, TypeExpr, Value};

pub use builder::CandidateBuilder;
pub use permute::expand;

/// Host-assigned identity of an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImplId(pub u32);

/// Reference to a host callable.
///
/// The engine never calls implementations; it hands the reference back to
/// the host's call mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImplRef {
    pub id: ImplId,
    pub name: Arc<str>,
}

impl ImplRef {
    pub fn new(id: u32, name: impl Into<Arc<str>>) -> Self {
        Self {
            id: ImplId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for ImplRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Reorders call arguments into declaration order.
///
/// `order[j]` is the declaration position of the argument passed at call
/// position `j`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForwardingShim {
    order: Vec<usize>,
}

impl ForwardingShim {
    /// Create a shim from a permutation of `0..order.len()`.
    pub fn new(order: Vec<usize>) -> Self {
        debug_assert!({
            let mut sorted = order.clone();
            sorted.sort_unstable();
            sorted.iter().copied().eq(0..order.len())
        });
        Self { order }
    }

    /// The permutation.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Move arguments from call order to declaration order.
    ///
    /// Arguments past the permuted prefix are passed through unchanged.
    pub fn arrange<T>(&self, args: Vec<T>) -> Vec<T> {
        let mut slots: Vec<Option<T>> = (0..self.order.len()).map(|_| None).collect();
        let mut rest = Vec::new();
        for (j, arg) in args.into_iter().enumerate() {
            match self.order.get(j) {
                Some(&dest) => slots[dest] = Some(arg),
                None => rest.push(arg),
            }
        }
        slots.into_iter().flatten().chain(rest).collect()
    }

    /// A shim applying `self` after first permuting by `outer`.
    fn compose(&self, outer: &[usize]) -> Self {
        Self::new(outer.iter().map(|&p| self.order[p]).collect())
    }
}

/// What a candidate dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Implementation {
    /// Call the implementation with the arguments as given.
    Direct(ImplRef),
    /// Reorder the arguments through the shim, then call the target.
    Forwarded { target: ImplRef, shim: ForwardingShim },
}

impl Implementation {
    /// The implementation that ends up being called.
    pub fn target(&self) -> &ImplRef {
        match self {
            Implementation::Direct(target) | Implementation::Forwarded { target, .. } => target,
        }
    }

    /// Arrange call arguments for the target.
    pub fn arrange<T>(&self, args: Vec<T>) -> Vec<T> {
        match self {
            Implementation::Direct(_) => args,
            Implementation::Forwarded { shim, .. } => shim.arrange(args),
        }
    }

    /// This implementation reached through an argument permutation.
    pub(crate) fn permuted(&self, order: &[usize]) -> Self {
        match self {
            Implementation::Direct(target) => Implementation::Forwarded {
                target: target.clone(),
                shim: ForwardingShim::new(order.to_vec()),
            },
            Implementation::Forwarded { target, shim } => Implementation::Forwarded {
                target: target.clone(),
                shim: shim.compose(order),
            },
        }
    }
}

/// Ordering key between candidates. Greater is preferred.
///
/// Declaration order beats permuted order regardless of `base`. Within
/// each, compared by `base`, then by fewer placeholder positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Priority {
    /// Caller-supplied priority.
    pub base: i64,
    /// Positions typed only through an unconstrained placeholder.
    pub placeholders: u32,
    /// Whether the candidate comes from an argument permutation.
    pub permuted: bool,
}

impl Priority {
    pub fn new(base: i64) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .permuted
            .cmp(&self.permuted)
            .then_with(|| self.base.cmp(&other.base))
            .then_with(|| other.placeholders.cmp(&self.placeholders))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One concrete overload entry of a dispatch point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    param_types: Vec<TypeDesc>,
    implementation: Implementation,
    priority: Priority,
    source_name: Option<Arc<str>>,
    accepts_extra: bool,
}

impl Candidate {
    /// A candidate calling `implementation` directly.
    pub fn new(param_types: Vec<TypeDesc>, implementation: ImplRef, priority: Priority) -> Self {
        Self {
            param_types,
            implementation: Implementation::Direct(implementation),
            priority,
            source_name: None,
            accepts_extra: false,
        }
    }

    /// Attach a source name for diagnostics.
    pub fn with_source_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Also accept (unconstrained) arguments past the typed prefix.
    pub fn accepting_extra(mut self, accepts_extra: bool) -> Self {
        self.accepts_extra = accepts_extra;
        self
    }

    /// The dispatch signature.
    pub fn param_types(&self) -> &[TypeDesc] {
        &self.param_types
    }

    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Whether calls may pass more arguments than [`arity`](Self::arity).
    pub fn accepts_extra(&self) -> bool {
        self.accepts_extra
    }

    /// The signature extended with `Any` up to `arity` positions.
    pub fn padded_types(&self, arity: usize) -> Vec<TypeDesc> {
        let mut types = self.param_types.clone();
        if types.len() < arity {
            types.resize(arity, TypeDesc::ANY);
        }
        types
    }

    /// A sibling candidate with permuted parameter order.
    pub(crate) fn permuted(&self, order: &[usize]) -> Self {
        Self {
            param_types: order.iter().map(|&p| self.param_types[p]).collect(),
            implementation: self.implementation.permuted(order),
            priority: Priority {
                permuted: true,
                ..self.priority
            },
            source_name: self.source_name.clone(),
            accepts_extra: self.accepts_extra,
        }
    }
}

/// How a parameter can be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    #[default]
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    /// Keyword-only and variadic parameters end the dispatch signature.
    pub fn ends_signature(self) -> bool {
        matches!(
            self,
            ParamKind::VarPositional | ParamKind::KeywordOnly | ParamKind::VarKeyword
        )
    }
}

/// A declared parameter, as reported by host reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<TypeExpr>,
    pub default: Option<Value>,
}

impl Parameter {
    /// An unannotated positional-or-keyword parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation: None,
            default: None,
        }
    }

    /// A positional-or-keyword parameter annotated with `expr`.
    pub fn typed(name: impl Into<String>, expr: impl Into<TypeExpr>) -> Self {
        Self::new(name).annotated(expr)
    }

    pub fn annotated(mut self, expr: impl Into<TypeExpr>) -> Self {
        self.annotation = Some(expr.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Host reflection: the declared parameters of a callable.
pub trait Reflect {
    /// Ordered parameters of `implementation`, or `None` when the host
    /// cannot describe it.
    fn parameters(&self, implementation: &ImplRef) -> Option<Vec<Parameter>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let plain = Priority::new(0);
        let placeholder = Priority {
            placeholders: 1,
            ..plain
        };
        let permuted = Priority {
            permuted: true,
            ..plain
        };

        assert!(plain > placeholder);
        assert!(plain > permuted);
        assert!(Priority::new(1) > plain);
        assert!(Priority::new(1) > Priority { placeholders: 3, ..Priority::new(0) });
    }

    #[test]
    fn test_declared_beats_permuted_at_any_base() {
        let permuted = Priority {
            permuted: true,
            ..Priority::new(100)
        };
        assert!(Priority::new(-5) > permuted);
        assert!(Priority { permuted: true, ..Priority::new(1) } > Priority { permuted: true, ..Priority::new(0) });
    }

    #[test]
    fn test_shim_arrange() {
        // Declared (a: A, b: B, c: C); called as (c, a, b).
        let shim = ForwardingShim::new(vec![2, 0, 1]);
        assert_eq!(shim.arrange(vec!["c", "a", "b"]), vec!["a", "b", "c"]);
        assert_eq!(shim.arrange(vec!["c", "a", "b", "x"]), vec!["a", "b", "c", "x"]);
    }

    #[test]
    fn test_shim_compose() {
        let imp = Implementation::Direct(ImplRef::new(1, "f"));
        let once = imp.permuted(&[1, 0, 2]);
        let twice = once.permuted(&[2, 0, 1]);

        // Declaration order (x, y, z); first permutation (y, x, z); second
        // takes that to (z, y, x).
        assert_eq!(twice.arrange(vec!["z", "y", "x"]), vec!["x", "y", "z"]);
        assert_eq!(twice.target().name.as_ref(), "f");
    }

    #[test]
    fn test_padded_types() {
        let c = Candidate::new(vec![TypeDesc::new(1)], ImplRef::new(0, "f"), Priority::new(0))
            .accepting_extra(true);
        assert_eq!(c.padded_types(3), vec![TypeDesc::new(1), TypeDesc::ANY, TypeDesc::ANY]);
        assert_eq!(c.padded_types(1), vec![TypeDesc::new(1)]);
    }
}
