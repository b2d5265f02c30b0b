//! Argument-order permutations.
//!
//! A commutative operation registered once as `f(a: A, b: B)` can also be
//! reached as `f(B, A)`. Expansion adds one sibling candidate per distinct
//! reordering of the signature. Siblings forward to the original
//! implementation through a [`ForwardingShim`](super::ForwardingShim) and
//! rank below the declared order, so an exact match always wins.

use rustc_hash::FxHashSet;

use crate::error::{RegisterError, RegisterResult};
use crate::lattice::TypeDesc;

use super::Candidate;

/// Expand `candidate` into one candidate per distinct permutation of its
/// signature, the original first.
pub fn expand(candidate: &Candidate) -> RegisterResult<Vec<Candidate>> {
    let n = candidate.arity();
    if n == 0 {
        return Err(RegisterError::EmptySignature);
    }

    let mut seen: FxHashSet<Vec<TypeDesc>> = FxHashSet::default();
    seen.insert(candidate.param_types().to_vec());
    let mut out = vec![candidate.clone()];

    let mut order: Vec<usize> = (0..n).collect();
    while next_permutation(&mut order) {
        let types: Vec<TypeDesc> = order.iter().map(|&p| candidate.param_types()[p]).collect();
        if seen.insert(types) {
            out.push(candidate.permuted(&order));
        }
    }
    Ok(out)
}

/// Advance `order` to the next lexicographic permutation. Returns `false`
/// once `order` was the last one.
fn next_permutation(order: &mut [usize]) -> bool {
    let Some(pivot) = order.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let successor = order
        .iter()
        .rposition(|&x| x > order[pivot])
        .unwrap_or(pivot + 1);
    order.swap(pivot, successor);
    order[pivot + 1..].reverse();
    true
}
