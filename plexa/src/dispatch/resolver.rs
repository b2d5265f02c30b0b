//! Main dispatch resolution algorithm.

use tracing::trace;

use crate::candidate::Candidate;
use crate::compare::{compare_tuples, select_most_specific, Specificity};
use crate::lattice::{is_subtype, TypeDesc, TypeOracle};
use crate::trie::Trie;

use super::result::{AmbiguityError, DispatchResult, NoMatchError};

/// Selects the candidate of a dispatch point for a call.
pub struct DispatchResolver<'a> {
    oracle: &'a dyn TypeOracle,
}

impl<'a> DispatchResolver<'a> {
    pub fn new(oracle: &'a dyn TypeOracle) -> Self {
        Self { oracle }
    }

    /// Resolve a call to `point` with argument types `args` against the
    /// candidates stored in `trie`.
    pub fn resolve<'t>(
        &self,
        point: &str,
        args: &[TypeDesc],
        trie: &'t Trie<TypeDesc, Candidate>,
    ) -> DispatchResult<'t> {
        // Step 1: Collect applicable candidates
        let applicable = self.applicable(args, trie);
        trace!(point, arity = args.len(), applicable = applicable.len(), "collected applicable candidates");

        // Step 2: Handle zero or one
        match applicable.as_slice() {
            [] => {
                return DispatchResult::NoMatch(NoMatchError {
                    point: point.to_string(),
                    arg_types: args.to_vec(),
                });
            }
            [only] => return DispatchResult::Resolved(*only),
            _ => {}
        }

        // Step 3: Unique most specific signature
        let padded: Vec<Vec<TypeDesc>> = applicable.iter().map(|c| c.padded_types(args.len())).collect();
        let tuples: Vec<&[TypeDesc]> = padded.iter().map(Vec::as_slice).collect();
        if let Some(best) = select_most_specific(self.oracle, &tuples) {
            trace!(point, signature = ?tuples[best], "most specific candidate");
            return DispatchResult::Resolved(applicable[best]);
        }

        // Step 4: Break ties among the maximal candidates, exact arity over
        // an open tail with the same padded tuple, then by priority
        let mut maximal = self.find_maximal(&tuples);
        let padded_twin = |i: usize| {
            applicable[i].arity() < args.len()
                && maximal
                    .iter()
                    .any(|&j| applicable[j].arity() == args.len() && tuples[j] == tuples[i])
        };
        let shadowed: Vec<usize> = maximal.iter().copied().filter(|&i| padded_twin(i)).collect();
        if !shadowed.is_empty() {
            trace!(point, dropped = shadowed.len(), "open tails shadowed by exact arity");
            maximal.retain(|i| !shadowed.contains(i));
        }
        let Some(top) = maximal.iter().map(|&i| applicable[i].priority()).max() else {
            return DispatchResult::NoMatch(NoMatchError {
                point: point.to_string(),
                arg_types: args.to_vec(),
            });
        };
        let tied: Vec<&Candidate> = maximal
            .iter()
            .map(|&i| applicable[i])
            .filter(|c| c.priority() == top)
            .collect();

        if let [winner] = tied.as_slice() {
            trace!(point, priority = ?top, "resolved by priority");
            return DispatchResult::Resolved(*winner);
        }

        trace!(point, tied = tied.len(), "ambiguous");
        DispatchResult::Ambiguous(AmbiguityError {
            point: point.to_string(),
            arg_types: args.to_vec(),
            candidates: tied.into_iter().cloned().collect(),
        })
    }

    /// Candidates accepting `args`, in trie order.
    ///
    /// A candidate applies when every argument is a subtype of the type at
    /// its position. Candidates with an open tail also apply to calls with
    /// more arguments than their signature holds.
    pub fn applicable<'t>(&self, args: &[TypeDesc], trie: &'t Trie<TypeDesc, Candidate>) -> Vec<&'t Candidate> {
        let mut found = Vec::new();
        trie.walk_pruned(
            args.len(),
            |depth, &key| is_subtype(self.oracle, args[depth], key),
            |depth, candidate: &'t Candidate| {
                if depth == args.len() || candidate.accepts_extra() {
                    found.push(candidate);
                }
            },
        );
        found
    }

    /// Indices of the tuples no other tuple is strictly narrower than.
    fn find_maximal(&self, tuples: &[&[TypeDesc]]) -> Vec<usize> {
        (0..tuples.len())
            .filter(|&i| {
                !tuples
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && self.is_more_specific(other, tuples[i]))
            })
            .collect()
    }

    /// Whether `a` is strictly narrower than `b`.
    pub fn is_more_specific(&self, a: &[TypeDesc], b: &[TypeDesc]) -> bool {
        compare_tuples(self.oracle, a, b) == Specificity::RightNarrower
    }
}
