//! Candidate construction from declared parameters.
//!
//! # Algorithm
//!
//! 1. Walk the parameters in order up to the first keyword-only or
//!    variadic parameter.
//! 2. Type each parameter from its annotation, or the configured fallback.
//!    An untyped parameter without a default ends the signature; an untyped
//!    parameter with a default is an error.
//! 3. A default value whose type is not admissible widens the parameter.
//!    Every defaulted position is a default boundary.
//! 4. Emit one overload level for the full signature and one per default
//!    boundary, truncated before that boundary.
//! 5. Each level yields the Cartesian product of its admissible types.

use tracing::trace;

use crate::error::{RegisterError, RegisterResult};
use crate::lattice::{is_subtype, Admissible, Normalizer, TypeDesc, TypeExpr};

use super::{Candidate, ImplRef, ParamKind, Parameter, Priority};

/// Builds the candidates of one implementation.
pub struct CandidateBuilder<'a> {
    normalizer: Normalizer<'a>,
    fallback: Option<&'a TypeExpr>,
}

/// The dispatch-relevant part of a parameter list.
#[derive(Debug, Default)]
struct Signature {
    /// Admissible types per position.
    positions: Vec<Vec<Admissible>>,
    /// Positions holding a default value.
    boundaries: Vec<usize>,
    /// Whether arguments past the signature are accepted.
    open_tail: bool,
}

impl<'a> CandidateBuilder<'a> {
    /// Create a builder without a fallback type.
    pub fn new(normalizer: Normalizer<'a>) -> Self {
        Self {
            normalizer,
            fallback: None,
        }
    }

    /// Type unannotated parameters with `fallback`.
    pub fn with_fallback(mut self, fallback: Option<&'a TypeExpr>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build every candidate of `implementation`.
    ///
    /// Either all candidates are returned or none: the first error aborts
    /// the whole build.
    pub fn build(
        &self,
        implementation: &ImplRef,
        params: &[Parameter],
        self_type: Option<TypeDesc>,
        base_priority: i64,
    ) -> RegisterResult<Vec<Candidate>> {
        let signature = self.signature(params, self_type)?;
        let full = signature.positions.len();

        let mut levels = vec![full];
        levels.extend(signature.boundaries.iter().copied());
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels.dedup();

        let mut candidates = Vec::new();
        for level in levels {
            let open_tail = level == full && signature.open_tail;
            let before = candidates.len();
            for_each_tuple(&signature.positions[..level], |tuple| {
                let placeholders = tuple.iter().filter(|a| a.via_placeholder).count() as u32;
                let priority = Priority {
                    base: base_priority,
                    placeholders,
                    permuted: false,
                };
                let types = tuple.iter().map(|a| a.ty).collect();
                candidates.push(
                    Candidate::new(types, implementation.clone(), priority).accepting_extra(open_tail),
                );
            });
            trace!(
                implementation = %implementation,
                level,
                emitted = candidates.len() - before,
                "built overload level"
            );
        }
        Ok(candidates)
    }

    fn signature(&self, params: &[Parameter], self_type: Option<TypeDesc>) -> RegisterResult<Signature> {
        let oracle = self.normalizer.oracle();
        let mut signature = Signature::default();

        for (index, param) in params.iter().enumerate() {
            if param.kind.ends_signature() {
                signature.open_tail = param.kind == ParamKind::VarPositional;
                break;
            }

            let expr = match (param.annotation.as_ref().or(self.fallback), &param.default) {
                (Some(expr), _) => expr,
                (None, None) => {
                    signature.open_tail = true;
                    break;
                }
                (None, Some(_)) => {
                    return Err(RegisterError::MissingAnnotation {
                        param: param.name.clone(),
                        index,
                    });
                }
            };

            let mut admissible = self.normalizer.normalize_tracked(expr, self_type)?;
            if let Some(default) = &param.default {
                let ty = oracle.type_of(default);
                if !admissible.iter().any(|a| is_subtype(oracle, ty, a.ty)) {
                    admissible.push(Admissible {
                        ty,
                        via_placeholder: false,
                    });
                }
                signature.boundaries.push(index);
            }
            signature.positions.push(admissible);
        }

        Ok(signature)
    }
}

/// Call `f` with every element of the Cartesian product of `positions`, in
/// lexicographic order (last position varies fastest).
fn for_each_tuple(positions: &[Vec<Admissible>], mut f: impl FnMut(&[Admissible])) {
    if positions.iter().any(Vec::is_empty) {
        return;
    }
    let mut odometer = vec![0usize; positions.len()];
    let mut tuple: Vec<Admissible> = positions.iter().map(|p| p[0]).collect();
    loop {
        f(&tuple);

        // Advance the rightmost digit that still has room.
        let mut pos = positions.len();
        loop {
            if pos == 0 {
                return;
            }
            pos -= 1;
            odometer[pos] += 1;
            if odometer[pos] < positions[pos].len() {
                tuple[pos] = positions[pos][odometer[pos]];
                break;
            }
            odometer[pos] = 0;
            tuple[pos] = positions[pos][0];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{AliasTable, Hierarchy, Placeholder, TypeExprError, Value};
    use pretty_assertions::assert_eq;

    struct Fixture {
        h: Hierarchy,
        aliases: AliasTable,
        number: TypeDesc,
        integer: TypeDesc,
        text: TypeDesc,
    }

    fn fixture() -> Fixture {
        let mut h = Hierarchy::new();
        let number = h.declare("Number", &[]);
        let integer = h.declare("Integer", &[number]);
        let text = h.declare("Text", &[]);
        let aliases = AliasTable::builder().widen(number, [integer]).build();
        Fixture {
            h,
            aliases,
            number,
            integer,
            text,
        }
    }

    fn imp() -> ImplRef {
        ImplRef::new(7, "f")
    }

    fn tuples(candidates: &[Candidate]) -> Vec<Vec<TypeDesc>> {
        candidates.iter().map(|c| c.param_types().to_vec()).collect()
    }

    #[test]
    fn test_cartesian_count() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [
            Parameter::typed("a", fx.number),
            Parameter::typed("b", TypeExpr::any_of([fx.text, fx.integer, fx.number])),
        ];

        let out = builder.build(&imp(), &params, None, 0).unwrap();
        // 2 admissible types x 3 admissible types.
        assert_eq!(out.len(), 6);
        assert_eq!(
            tuples(&out),
            vec![
                vec![fx.number, fx.text],
                vec![fx.number, fx.integer],
                vec![fx.number, fx.number],
                vec![fx.integer, fx.text],
                vec![fx.integer, fx.integer],
                vec![fx.integer, fx.number],
            ]
        );
    }

    #[test]
    fn test_default_boundary_levels() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [
            Parameter::typed("p1", fx.text),
            Parameter::typed("p2", fx.integer).with_default(Value::Object(fx.integer)),
        ];

        let out = builder.build(&imp(), &params, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.text, fx.integer], vec![fx.text]]);
    }

    #[test]
    fn test_default_widens_admissible() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let none = fx.h.builtins().none;
        let params = [Parameter::typed("x", fx.integer).with_default(Value::None)];

        let out = builder.build(&imp(), &params, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.integer], vec![none], vec![]]);
    }

    #[test]
    fn test_missing_annotation_with_default() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [
            Parameter::typed("a", fx.integer),
            Parameter::new("b").with_default(Value::Int(1)),
        ];

        assert_eq!(
            builder.build(&imp(), &params, None, 0),
            Err(RegisterError::MissingAnnotation {
                param: "b".to_string(),
                index: 1
            })
        );
    }

    #[test]
    fn test_unannotated_required_ends_signature() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [
            Parameter::typed("a", fx.integer),
            Parameter::new("b"),
            Parameter::typed("c", fx.text),
        ];

        let out = builder.build(&imp(), &params, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.integer]]);
        assert!(out[0].accepts_extra());
    }

    #[test]
    fn test_fallback_types_unannotated() {
        let fx = fixture();
        let fallback = TypeExpr::Wildcard;
        let builder =
            CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h)).with_fallback(Some(&fallback));
        let params = [Parameter::new("a"), Parameter::typed("b", fx.text)];

        let out = builder.build(&imp(), &params, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![TypeDesc::ANY, fx.text]]);
        assert!(!out[0].accepts_extra());
    }

    #[test]
    fn test_keyword_only_and_variadic_excluded() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));

        let keyword = [
            Parameter::typed("a", fx.integer),
            Parameter::typed("k", fx.text).with_kind(ParamKind::KeywordOnly),
        ];
        let out = builder.build(&imp(), &keyword, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.integer]]);
        assert!(!out[0].accepts_extra());

        let variadic = [
            Parameter::typed("a", fx.integer),
            Parameter::typed("rest", fx.text).with_kind(ParamKind::VarPositional),
        ];
        let out = builder.build(&imp(), &variadic, None, 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.integer]]);
        assert!(out[0].accepts_extra());
    }

    #[test]
    fn test_placeholder_lowers_priority() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let t = Placeholder::new("T");
        let params = [
            Parameter::typed("a", TypeExpr::Alternative(vec![fx.text.into(), t.clone().into()])),
            Parameter::typed("b", t),
        ];

        let out = builder.build(&imp(), &params, None, 5).unwrap();
        let summary: Vec<_> = out
            .iter()
            .map(|c| (c.param_types().to_vec(), c.priority().placeholders))
            .collect();
        assert_eq!(
            summary,
            vec![
                (vec![fx.text, TypeDesc::ANY], 1),
                (vec![TypeDesc::ANY, TypeDesc::ANY], 2),
            ]
        );
        assert!(out[0].priority() > out[1].priority());
        assert!(out.iter().all(|c| c.priority().base == 5));
    }

    #[test]
    fn test_self_type_required() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [Parameter::typed("self", TypeExpr::SelfType)];

        assert_eq!(
            builder.build(&imp(), &params, None, 0),
            Err(RegisterError::TypeExpression(TypeExprError::MissingSelfContext))
        );
        let out = builder.build(&imp(), &params, Some(fx.text), 0).unwrap();
        assert_eq!(tuples(&out), vec![vec![fx.text]]);
    }

    #[test]
    fn test_failure_anywhere_aborts() {
        let fx = fixture();
        let builder = CandidateBuilder::new(Normalizer::new(&fx.aliases, &fx.h));
        let params = [
            Parameter::typed("a", fx.integer),
            Parameter::typed("b", TypeExpr::Literal(vec![Value::Str("x".into())])),
        ];

        assert!(matches!(
            builder.build(&imp(), &params, None, 0),
            Err(RegisterError::TypeExpression(TypeExprError::UnsupportedLiteral { .. }))
        ));
    }
}
