//! Normalization of type expressions into concrete descriptor lists.
//!
//! # Rules
//!
//! | Expression | Result |
//! |------------|--------|
//! | `Concrete(t)` | alias list of `t` (`t` first), or `[t]` |
//! | `Wildcard` | `[Any]` |
//! | `SelfType` | `Concrete(self)`; error without a self type |
//! | `Placeholder` with constraints | each constraint normalized, concatenated |
//! | `Placeholder` with bound only | `Concrete(bound)` |
//! | `Placeholder` with neither | `[Any]` |
//! | `Literal(values)` | `Concrete(type_of(v))` for each sentinel `v` |
//! | `Alternative(members)` | each member normalized, concatenated |
//!
//! Every result is deduplicated keeping first occurrences. Non-invariant
//! placeholders and non-sentinel literals are rejected.

use thiserror::Error;

use super::alias::AliasTable;
use super::desc::{TypeDesc, TypeOracle, Value};
use super::expr::{Placeholder, TypeExpr, Variance};

/// Errors raised while normalizing a type expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeExprError {
    #[error("`Self` used outside of a type context")]
    MissingSelfContext,

    #[error("placeholder `{name}` is declared {variance:?}; variance has no meaning for dispatch")]
    InvalidVariance { name: String, variance: Variance },

    #[error("unsupported literal value `{value}`: only None, booleans, Ellipsis and NotImplemented are allowed")]
    UnsupportedLiteral { value: Value },
}

/// One admissible type of a parameter, with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admissible {
    /// The concrete descriptor.
    pub ty: TypeDesc,
    /// Reached only through an unconstrained placeholder.
    pub via_placeholder: bool,
}

/// Normalizes type expressions against an alias table and a host oracle.
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    aliases: &'a AliasTable,
    oracle: &'a dyn TypeOracle,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer.
    pub fn new(aliases: &'a AliasTable, oracle: &'a dyn TypeOracle) -> Self {
        Self { aliases, oracle }
    }

    /// The alias table in use.
    pub fn aliases(&self) -> &'a AliasTable {
        self.aliases
    }

    /// The host oracle in use.
    pub fn oracle(&self) -> &'a dyn TypeOracle {
        self.oracle
    }

    /// Normalize `expr` into an ordered, deduplicated descriptor list.
    pub fn normalize(
        &self,
        expr: &TypeExpr,
        self_type: Option<TypeDesc>,
    ) -> Result<Vec<TypeDesc>, TypeExprError> {
        Ok(self
            .normalize_tracked(expr, self_type)?
            .into_iter()
            .map(|a| a.ty)
            .collect())
    }

    /// Like [`normalize`](Self::normalize), keeping placeholder provenance.
    ///
    /// A descriptor reached both through a placeholder and through a
    /// concrete path counts as concrete.
    pub fn normalize_tracked(
        &self,
        expr: &TypeExpr,
        self_type: Option<TypeDesc>,
    ) -> Result<Vec<Admissible>, TypeExprError> {
        let mut out = Vec::new();
        self.collect(expr, self_type, false, &mut out)?;
        Ok(out)
    }

    fn collect(
        &self,
        expr: &TypeExpr,
        self_type: Option<TypeDesc>,
        via_placeholder: bool,
        out: &mut Vec<Admissible>,
    ) -> Result<(), TypeExprError> {
        match expr {
            TypeExpr::Concrete(ty) => {
                self.push_concrete(*ty, via_placeholder, out);
            }
            TypeExpr::Wildcard => push(out, TypeDesc::ANY, via_placeholder),
            TypeExpr::SelfType => {
                let ty = self_type.ok_or(TypeExprError::MissingSelfContext)?;
                self.push_concrete(ty, via_placeholder, out);
            }
            TypeExpr::Placeholder(p) => self.collect_placeholder(p, via_placeholder, out)?,
            TypeExpr::Literal(values) => {
                if let Some(bad) = values.iter().find(|v| !v.is_sentinel()) {
                    return Err(TypeExprError::UnsupportedLiteral { value: bad.clone() });
                }
                for value in values {
                    let ty = self.oracle.type_of(value);
                    self.push_concrete(ty, via_placeholder, out);
                }
            }
            TypeExpr::Alternative(members) => {
                for member in members {
                    self.collect(member, self_type, via_placeholder, out)?;
                }
            }
        }
        Ok(())
    }

    fn collect_placeholder(
        &self,
        p: &Placeholder,
        via_placeholder: bool,
        out: &mut Vec<Admissible>,
    ) -> Result<(), TypeExprError> {
        if p.variance != Variance::Invariant {
            return Err(TypeExprError::InvalidVariance {
                name: p.name.clone(),
                variance: p.variance,
            });
        }
        if p.is_constrained() {
            for &c in &p.constraints {
                self.push_concrete(c, via_placeholder, out);
            }
            return Ok(());
        }
        match p.bound {
            Some(bound) => self.push_concrete(bound, true, out),
            None => push(out, TypeDesc::ANY, true),
        }
        Ok(())
    }

    fn push_concrete(&self, ty: TypeDesc, via_placeholder: bool, out: &mut Vec<Admissible>) {
        if ty.is_any() {
            push(out, ty, via_placeholder);
            return;
        }
        match self.aliases.lookup(ty) {
            Some(list) => {
                for &t in list {
                    push(out, t, via_placeholder);
                }
            }
            None => push(out, ty, via_placeholder),
        }
    }
}

fn push(out: &mut Vec<Admissible>, ty: TypeDesc, via_placeholder: bool) {
    match out.iter_mut().find(|a| a.ty == ty) {
        Some(existing) => existing.via_placeholder &= via_placeholder,
        None => out.push(Admissible { ty, via_placeholder }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Hierarchy;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    struct Fixture {
        hierarchy: Hierarchy,
        aliases: AliasTable,
        number: TypeDesc,
        integer: TypeDesc,
    }

    fn fixture() -> Fixture {
        let mut hierarchy = Hierarchy::new();
        let number = hierarchy.declare("Number", &[]);
        let integer = hierarchy.declare("Integer", &[number]);
        let aliases = AliasTable::builder().widen(number, [integer]).build();
        Fixture {
            hierarchy,
            aliases,
            number,
            integer,
        }
    }

    #[test]
    fn test_concrete_alias_first() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);

        assert_eq!(
            n.normalize(&TypeExpr::Concrete(fx.number), None).unwrap(),
            vec![fx.number, fx.integer]
        );
        assert_eq!(
            n.normalize(&TypeExpr::Concrete(fx.integer), None).unwrap(),
            vec![fx.integer]
        );
        assert_eq!(n.normalize(&TypeExpr::Wildcard, None).unwrap(), vec![TypeDesc::ANY]);
    }

    #[test]
    fn test_self_type() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);

        assert_eq!(
            n.normalize(&TypeExpr::SelfType, None),
            Err(TypeExprError::MissingSelfContext)
        );
        assert_eq!(
            n.normalize(&TypeExpr::SelfType, Some(fx.number)).unwrap(),
            vec![fx.number, fx.integer]
        );
    }

    #[test]
    fn test_placeholders() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);
        let b = fx.hierarchy.builtins();

        let constrained = Placeholder::new("T").constrained([b.str, fx.integer, b.str]);
        assert_eq!(
            n.normalize(&constrained.into(), None).unwrap(),
            vec![b.str, fx.integer]
        );

        let bounded = Placeholder::new("N").bounded(fx.number);
        let tracked = n.normalize_tracked(&bounded.into(), None).unwrap();
        assert_eq!(
            tracked,
            vec![
                Admissible { ty: fx.number, via_placeholder: true },
                Admissible { ty: fx.integer, via_placeholder: true },
            ]
        );

        let free = Placeholder::new("U");
        assert_eq!(
            n.normalize_tracked(&free.into(), None).unwrap(),
            vec![Admissible { ty: TypeDesc::ANY, via_placeholder: true }]
        );
    }

    #[test]
    fn test_variance_rejected() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);
        let co = Placeholder::new("T_co").with_variance(Variance::Covariant);

        let err = n.normalize(&co.into(), None).unwrap_err();
        assert!(matches!(err, TypeExprError::InvalidVariance { ref name, .. } if name == "T_co"));
    }

    #[test]
    fn test_literals() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);
        let b = fx.hierarchy.builtins();

        let ok = TypeExpr::Literal(vec![Value::None, Value::Bool(true), Value::Bool(false)]);
        assert_eq!(n.normalize(&ok, None).unwrap(), vec![b.none, b.bool]);

        let bad = TypeExpr::Literal(vec![Value::None, Value::Int(3)]);
        assert_eq!(
            n.normalize(&bad, None),
            Err(TypeExprError::UnsupportedLiteral { value: Value::Int(3) })
        );
    }

    #[test]
    fn test_alternative_dedup_across_members() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);
        let b = fx.hierarchy.builtins();

        let expr = TypeExpr::Alternative(vec![
            TypeExpr::Concrete(fx.integer),
            TypeExpr::Concrete(fx.number),
            TypeExpr::Literal(vec![Value::None]),
            TypeExpr::Concrete(b.none),
        ]);
        assert_eq!(
            n.normalize(&expr, None).unwrap(),
            vec![fx.integer, fx.number, b.none]
        );
    }

    #[test]
    fn test_concrete_path_clears_placeholder_flag() {
        let fx = fixture();
        let n = Normalizer::new(&fx.aliases, &fx.hierarchy);

        let expr = TypeExpr::Alternative(vec![
            Placeholder::new("T").into(),
            TypeExpr::Wildcard,
        ]);
        assert_eq!(
            n.normalize_tracked(&expr, None).unwrap(),
            vec![Admissible { ty: TypeDesc::ANY, via_placeholder: false }]
        );
    }

    fn arb_expr(leaves: Vec<TypeDesc>) -> impl Strategy<Value = TypeExpr> {
        let leaf = prop_oneof![
            proptest::sample::select(leaves).prop_map(TypeExpr::Concrete),
            Just(TypeExpr::Wildcard),
            Just(TypeExpr::SelfType),
            Just(TypeExpr::Literal(vec![Value::None])),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(TypeExpr::Alternative)
        })
    }

    proptest! {
        #[test]
        fn prop_normalize_is_deterministic_and_deduplicated(
            expr in arb_expr(vec![TypeDesc::new(1), TypeDesc::new(2), TypeDesc::new(3)])
        ) {
            let fx = fixture();
            let n = Normalizer::new(&fx.aliases, &fx.hierarchy);
            let first = n.normalize(&expr, Some(fx.number)).unwrap();
            let second = n.normalize(&expr, Some(fx.number)).unwrap();
            prop_assert_eq!(&first, &second);

            let mut seen = std::collections::HashSet::new();
            prop_assert!(first.iter().all(|t| seen.insert(*t)));
        }
    }
}
