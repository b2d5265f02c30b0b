//! A nominal type hierarchy implementing [`TypeOracle`].
//!
//! Real hosts bring their own subtype test; this one backs the CLI, the
//! configuration loader and the test suite. Types are identified by interned
//! names and related by declared parents. Subtyping is the reflexive,
//! transitive closure of the parent relation.

use rustc_hash::{FxHashMap, FxHashSet};
use string_interner::{DefaultStringInterner, DefaultSymbol, Symbol};

use super::desc::{TypeDesc, TypeOracle, Value};

/// Descriptors of the builtin value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    pub object: TypeDesc,
    pub none: TypeDesc,
    pub bool: TypeDesc,
    pub int: TypeDesc,
    pub float: TypeDesc,
    pub str: TypeDesc,
    pub ellipsis: TypeDesc,
    pub not_implemented: TypeDesc,
}

/// Name of the wildcard type as it appears in configuration files.
pub const WILDCARD_NAME: &str = "Any";

/// A nominal type hierarchy.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    /// Type names. The symbol index doubles as the descriptor index.
    names: DefaultStringInterner,
    /// Declared direct parents.
    parents: FxHashMap<TypeDesc, Vec<TypeDesc>>,
    builtins: Builtins,
}

impl Hierarchy {
    /// A hierarchy holding only the builtin types.
    ///
    /// `bool` is a subtype of `int`; every other builtin sits directly under
    /// `object`.
    pub fn new() -> Self {
        let mut names = DefaultStringInterner::new();
        let mut parents = FxHashMap::default();

        let object = intern(&mut names, "object");
        parents.insert(object, Vec::new());

        let mut under = |names: &mut DefaultStringInterner, name: &str, parent: TypeDesc| {
            let ty = intern(names, name);
            parents.insert(ty, vec![parent]);
            ty
        };
        let none = under(&mut names, "NoneType", object);
        let int = under(&mut names, "int", object);
        let bool = under(&mut names, "bool", int);
        let float = under(&mut names, "float", object);
        let str = under(&mut names, "str", object);
        let ellipsis = under(&mut names, "ellipsis", object);
        let not_implemented = under(&mut names, "NotImplementedType", object);

        Self {
            names,
            parents,
            builtins: Builtins {
                object,
                none,
                bool,
                int,
                float,
                str,
                ellipsis,
                not_implemented,
            },
        }
    }

    /// The builtin value types.
    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    /// Declare a type with the given direct parents.
    ///
    /// An empty parent list places the type directly under `object`.
    /// Redeclaring an existing name replaces its parents.
    pub fn declare(&mut self, name: &str, parents: &[TypeDesc]) -> TypeDesc {
        let ty = intern(&mut self.names, name);
        let parents = if parents.is_empty() && ty != self.builtins.object {
            vec![self.builtins.object]
        } else {
            parents.to_vec()
        };
        self.parents.insert(ty, parents);
        ty
    }

    /// Look up a declared type by name. `"Any"` names the wildcard.
    pub fn lookup(&self, name: &str) -> Option<TypeDesc> {
        if name == WILDCARD_NAME {
            return Some(TypeDesc::ANY);
        }
        self.names.get(name).map(|sym| TypeDesc::new(sym.to_usize() as u32))
    }

    /// The name of a descriptor, if it was declared here.
    pub fn name(&self, ty: TypeDesc) -> Option<&str> {
        if ty.is_any() {
            return Some(WILDCARD_NAME);
        }
        let sym = DefaultSymbol::try_from_usize(ty.index() as usize)?;
        self.names.resolve(sym)
    }

    /// Direct parents of a type.
    pub fn parents(&self, ty: TypeDesc) -> &[TypeDesc] {
        self.parents.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declared types, builtins included.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Always false: the builtins are always present.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeOracle for Hierarchy {
    fn is_subtype(&self, sub: TypeDesc, sup: TypeDesc) -> bool {
        if sub == sup {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(ty) = stack.pop() {
            if !seen.insert(ty) {
                continue;
            }
            for &parent in self.parents(ty) {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }
        false
    }

    fn type_of(&self, value: &Value) -> TypeDesc {
        let b = &self.builtins;
        match value {
            Value::None => b.none,
            Value::Bool(_) => b.bool,
            Value::Int(_) => b.int,
            Value::Float(_) => b.float,
            Value::Str(_) => b.str,
            Value::Ellipsis => b.ellipsis,
            Value::NotImplemented => b.not_implemented,
            Value::Object(ty) => *ty,
        }
    }

    fn type_name(&self, ty: TypeDesc) -> String {
        match self.name(ty) {
            Some(name) => name.to_string(),
            None => ty.to_string(),
        }
    }
}

fn intern(names: &mut DefaultStringInterner, name: &str) -> TypeDesc {
    TypeDesc::new(names.get_or_intern(name).to_usize() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_relations() {
        let h = Hierarchy::new();
        let b = h.builtins();

        assert!(h.is_subtype(b.bool, b.int));
        assert!(h.is_subtype(b.bool, b.object));
        assert!(!h.is_subtype(b.int, b.bool));
        assert!(!h.is_subtype(b.int, b.float));
        assert_eq!(h.type_of(&Value::None), b.none);
        assert_eq!(h.type_of(&Value::Bool(true)), b.bool);
    }

    #[test]
    fn test_declare_and_lookup() {
        let mut h = Hierarchy::new();
        let number = h.declare("Number", &[]);
        let integer = h.declare("Integer", &[number]);

        assert_eq!(h.lookup("Integer"), Some(integer));
        assert_eq!(h.lookup("Any"), Some(TypeDesc::ANY));
        assert_eq!(h.lookup("Missing"), None);
        assert_eq!(h.name(integer), Some("Integer"));
        assert!(h.is_subtype(integer, number));
        assert!(h.is_subtype(integer, h.builtins().object));
        assert!(!h.is_subtype(number, integer));
    }

    #[test]
    fn test_diamond() {
        let mut h = Hierarchy::new();
        let a = h.declare("A", &[]);
        let b = h.declare("B", &[a]);
        let c = h.declare("C", &[a]);
        let d = h.declare("D", &[b, c]);

        assert!(h.is_subtype(d, a));
        assert!(!h.is_subtype(b, c));
    }
}
