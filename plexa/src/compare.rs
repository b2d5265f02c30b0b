//! Specificity: the partial order over types and type tuples.
//!
//! A type is narrower than another when it is a strict subtype of it. A
//! tuple is narrower than another when it is narrower in at least one
//! position and not wider in any.

use crate::lattice::{is_subtype, Placeholder, TypeDesc, TypeOracle};

/// Outcome of comparing a right operand against a left one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specificity {
    Equal,
    /// The right operand is strictly narrower.
    RightNarrower,
    /// The left operand is strictly narrower.
    LeftNarrower,
    Incomparable,
}

impl Specificity {
    /// The verdict with the operands swapped.
    pub fn mirror(self) -> Self {
        match self {
            Specificity::RightNarrower => Specificity::LeftNarrower,
            Specificity::LeftNarrower => Specificity::RightNarrower,
            other => other,
        }
    }

    /// Whether the verdict orders the operands.
    pub fn is_decisive(self) -> bool {
        matches!(self, Specificity::RightNarrower | Specificity::LeftNarrower)
    }
}

/// A comparison operand: a concrete descriptor or a placeholder.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Type(TypeDesc),
    Placeholder(&'a Placeholder),
}

impl From<TypeDesc> for Operand<'_> {
    fn from(ty: TypeDesc) -> Self {
        Operand::Type(ty)
    }
}

impl<'a> From<&'a Placeholder> for Operand<'a> {
    fn from(p: &'a Placeholder) -> Self {
        Operand::Placeholder(p)
    }
}

/// Compare two concrete descriptors.
pub fn compare_types(oracle: &dyn TypeOracle, right: TypeDesc, left: TypeDesc) -> Specificity {
    let right_sub = is_subtype(oracle, right, left);
    let left_sub = is_subtype(oracle, left, right);
    match (right_sub, left_sub) {
        (true, true) => Specificity::Equal,
        (true, false) => Specificity::RightNarrower,
        (false, true) => Specificity::LeftNarrower,
        (false, false) => Specificity::Incomparable,
    }
}

/// Compare two operands, resolving placeholders first.
///
/// An unconstrained placeholder stands for its bound (or `Any`). A
/// constrained one yields the verdict all of its constraints agree on, and
/// `Incomparable` when they disagree.
pub fn compare_operands(oracle: &dyn TypeOracle, right: Operand<'_>, left: Operand<'_>) -> Specificity {
    match (right, left) {
        (Operand::Type(r), Operand::Type(l)) => compare_types(oracle, r, l),
        (Operand::Placeholder(p), other) => {
            agreed(p, |c| compare_operands(oracle, Operand::Type(c), other))
        }
        (other, Operand::Placeholder(p)) => {
            agreed(p, |c| compare_operands(oracle, other, Operand::Type(c)))
        }
    }
}

fn agreed(p: &Placeholder, mut verdict_for: impl FnMut(TypeDesc) -> Specificity) -> Specificity {
    if !p.is_constrained() {
        return verdict_for(p.bound.unwrap_or(TypeDesc::ANY));
    }
    let mut agreed = None;
    for &c in &p.constraints {
        let v = verdict_for(c);
        match agreed {
            None => agreed = Some(v),
            Some(prev) if prev != v => return Specificity::Incomparable,
            Some(_) => {}
        }
    }
    agreed.unwrap_or(Specificity::Incomparable)
}

/// Compare two tuples position by position.
///
/// Tuples of different lengths are incomparable. The two tuples are assumed
/// to differ; identical tuples yield `Equal`.
pub fn compare_tuples(oracle: &dyn TypeOracle, right: &[TypeDesc], left: &[TypeDesc]) -> Specificity {
    if right.len() != left.len() {
        return Specificity::Incomparable;
    }
    let mut direction = Specificity::Equal;
    for (&r, &l) in right.iter().zip(left) {
        match compare_types(oracle, r, l) {
            Specificity::Incomparable => return Specificity::Incomparable,
            Specificity::Equal => {}
            verdict if direction == Specificity::Equal => direction = verdict,
            verdict if verdict != direction => return Specificity::Incomparable,
            _ => {}
        }
    }
    direction
}

/// Index of the unique tuple narrower than every other one.
///
/// Returns `None` for fewer than two tuples. Callers holding a single
/// applicable entry must take it themselves rather than rely on this
/// function. Also `None` as soon as two tuples turn out incomparable or
/// equal.
pub fn select_most_specific(oracle: &dyn TypeOracle, tuples: &[&[TypeDesc]]) -> Option<usize> {
    if tuples.len() < 2 {
        return None;
    }

    let mut best = 0;
    for i in 1..tuples.len() {
        match compare_tuples(oracle, tuples[i], tuples[best]) {
            Specificity::RightNarrower => best = i,
            Specificity::LeftNarrower => {}
            Specificity::Equal | Specificity::Incomparable => return None,
        }
    }

    // The scan only compared against the running best; confirm against the rest.
    let dominates_all = tuples.iter().enumerate().all(|(i, t)| {
        i == best || compare_tuples(oracle, tuples[best], t) == Specificity::RightNarrower
    });
    dominates_all.then_some(best)
}
