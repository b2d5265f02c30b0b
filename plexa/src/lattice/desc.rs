//! Type descriptors, host values, and the subtype oracle boundary.

use std::fmt;

use ordered_float::OrderedFloat;

/// Opaque identifier for a concrete host type.
///
/// Descriptors are handed out by the host (see [`super::Hierarchy`] for the
/// nominal implementation used by the tools and tests). The engine never
/// looks inside one; it only compares them for identity and asks the
/// [`TypeOracle`] about subtyping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDesc(u32);

impl TypeDesc {
    /// The wildcard descriptor. Every type is a subtype of it.
    pub const ANY: TypeDesc = TypeDesc(u32::MAX);

    /// Create a descriptor from a raw host index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw host index.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Whether this is the wildcard descriptor.
    pub const fn is_any(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "Any")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// A host value the engine has to reason about.
///
/// Values show up in two places: as parameter defaults (whose type may widen
/// a parameter's admissible set) and as members of a literal type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    Ellipsis,
    NotImplemented,
    /// An arbitrary host object of the given type.
    Object(TypeDesc),
}

impl Value {
    /// Whether this value is one of the singleton sentinels a literal type
    /// may be built from.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            Value::None | Value::Bool(_) | Value::Ellipsis | Value::NotImplemented
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Ellipsis => write!(f, "..."),
            Value::NotImplemented => write!(f, "NotImplemented"),
            Value::Object(ty) => write!(f, "<object of {}>", ty),
        }
    }
}

/// Host capabilities the engine consumes.
///
/// Implementations only need to answer for concrete descriptors; the
/// wildcard is handled by [`is_subtype`] before the oracle is consulted.
pub trait TypeOracle {
    /// Whether `sub` is a subtype of (or the same type as) `sup`.
    fn is_subtype(&self, sub: TypeDesc, sup: TypeDesc) -> bool;

    /// The concrete type of a host value.
    fn type_of(&self, value: &Value) -> TypeDesc;

    /// A printable name for a descriptor, used in diagnostics.
    fn type_name(&self, ty: TypeDesc) -> String {
        ty.to_string()
    }
}

/// Subtype test with wildcard handling.
///
/// - `x <: Any` for every `x`
/// - `Any <: x` only when `x` is `Any`
/// - otherwise identity, then the oracle
pub fn is_subtype(oracle: &dyn TypeOracle, sub: TypeDesc, sup: TypeDesc) -> bool {
    if sup.is_any() {
        return true;
    }
    if sub.is_any() {
        return false;
    }
    sub == sup || oracle.is_subtype(sub, sup)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat;

    impl TypeOracle for Flat {
        fn is_subtype(&self, sub: TypeDesc, sup: TypeDesc) -> bool {
            sub == sup
        }

        fn type_of(&self, _value: &Value) -> TypeDesc {
            TypeDesc::new(0)
        }
    }

    #[test]
    fn test_wildcard_is_top() {
        let a = TypeDesc::new(1);
        assert!(is_subtype(&Flat, a, TypeDesc::ANY));
        assert!(!is_subtype(&Flat, TypeDesc::ANY, a));
        assert!(is_subtype(&Flat, TypeDesc::ANY, TypeDesc::ANY));
    }

    #[test]
    fn test_sentinels() {
        assert!(Value::None.is_sentinel());
        assert!(Value::Bool(false).is_sentinel());
        assert!(Value::Ellipsis.is_sentinel());
        assert!(!Value::Int(3).is_sentinel());
        assert!(!Value::Str("x".into()).is_sentinel());
    }
}
