//! Dispatch points and the registration surface.
//!
//! A [`Registry`] owns the alias table, the host's type oracle, and one
//! candidate trie per dispatch point. Registration takes `&mut self`, so a
//! fully populated registry can be shared by reference across threads and
//! resolved against without locking. [`SharedRegistry`] covers hosts that
//! keep registering after calls have started.

use std::borrow::Cow;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use tracing::{debug, warn};

use crate::candidate::{expand, Candidate, CandidateBuilder, ImplRef, Parameter, Reflect};
use crate::error::{RegisterError, RegisterResult};
use crate::lattice::{AliasTable, Normalizer, TypeDesc, TypeExpr, TypeOracle, Value};
use crate::trie::Trie;

use super::resolver::DispatchResolver;
use super::result::{DispatchError, DispatchResult, NoMatchError};

/// Per-registration settings.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Base priority of every candidate built.
    pub priority: i64,
    /// Type used for unannotated parameters.
    pub fallback: Option<TypeExpr>,
    /// What `Self` annotations refer to.
    pub self_type: Option<TypeDesc>,
    /// Also register every argument-order permutation.
    pub expand_permutations: bool,
    /// Source name attached to candidates for diagnostics.
    pub source_name: Option<String>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<TypeExpr>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_self_type(mut self, ty: TypeDesc) -> Self {
        self.self_type = Some(ty);
        self
    }

    pub fn permuted(mut self) -> Self {
        self.expand_permutations = true;
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// What a successful registration did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisterSummary {
    pub point: String,
    pub implementation: String,
    /// Candidates built, permutations included.
    pub built: usize,
    /// Candidates stored under a new type tuple.
    pub inserted: usize,
    /// Existing entries replaced by a higher-priority candidate.
    pub replaced: usize,
    /// Candidates dropped in favor of an existing entry.
    pub kept_existing: usize,
}

/// A named operation with its candidates.
#[derive(Debug, Default)]
struct DispatchPoint {
    candidates: Trie<TypeDesc, Candidate>,
}

/// All dispatch points of a host.
pub struct Registry {
    aliases: Cow<'static, AliasTable>,
    oracle: Box<dyn TypeOracle + Send + Sync>,
    points: IndexMap<String, DispatchPoint, FxBuildHasher>,
}

impl Registry {
    /// Create an empty registry over `oracle`, widening with `aliases`.
    pub fn new(aliases: AliasTable, oracle: impl TypeOracle + Send + Sync + 'static) -> Self {
        Self {
            aliases: Cow::Owned(aliases),
            oracle: Box::new(oracle),
            points: IndexMap::default(),
        }
    }

    /// Create an empty registry widening with the process-wide table.
    ///
    /// See [`AliasTable::install_global`]. Without an installed table no
    /// widening happens.
    pub fn with_global_aliases(oracle: impl TypeOracle + Send + Sync + 'static) -> Self {
        Self {
            aliases: Cow::Borrowed(AliasTable::global()),
            oracle: Box::new(oracle),
            points: IndexMap::default(),
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn oracle(&self) -> &dyn TypeOracle {
        self.oracle.as_ref()
    }

    /// Register `implementation` under `point`.
    ///
    /// Either every candidate of the registration is stored or none is.
    /// When a built candidate has the same type tuple as a stored one, the
    /// higher priority wins and a tie keeps the stored entry.
    pub fn register(
        &mut self,
        point: &str,
        implementation: ImplRef,
        params: &[Parameter],
        options: &RegisterOptions,
    ) -> RegisterResult<RegisterSummary> {
        let candidates = match self.build(&implementation, params, options) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(point, implementation = %implementation, error = %err, "registration rejected");
                return Err(err);
            }
        };

        let mut summary = RegisterSummary {
            point: point.to_string(),
            implementation: implementation.name.to_string(),
            built: candidates.len(),
            ..RegisterSummary::default()
        };

        let trie = &mut self.points.entry(point.to_string()).or_default().candidates;
        for candidate in candidates {
            match trie.get_mut(candidate.param_types()) {
                Some(existing) if candidate.priority() > existing.priority() => {
                    debug!(
                        point,
                        signature = ?candidate.param_types(),
                        replaced = %existing.implementation().target(),
                        "replaced lower-priority candidate"
                    );
                    *existing = candidate;
                    summary.replaced += 1;
                }
                Some(existing) => {
                    debug!(
                        point,
                        signature = ?candidate.param_types(),
                        kept = %existing.implementation().target(),
                        "kept existing candidate"
                    );
                    summary.kept_existing += 1;
                }
                None => {
                    trie.insert(candidate.param_types().to_vec(), candidate);
                    summary.inserted += 1;
                }
            }
        }

        debug!(
            point,
            implementation = %implementation,
            built = summary.built,
            inserted = summary.inserted,
            replaced = summary.replaced,
            kept = summary.kept_existing,
            "registered"
        );
        Ok(summary)
    }

    /// Register `implementation`, asking `reflect` for its parameters.
    pub fn register_reflected(
        &mut self,
        point: &str,
        implementation: ImplRef,
        reflect: &dyn Reflect,
        options: &RegisterOptions,
    ) -> RegisterResult<RegisterSummary> {
        let Some(params) = reflect.parameters(&implementation) else {
            let err = RegisterError::Unreflectable {
                name: implementation.name.to_string(),
            };
            warn!(point, error = %err, "registration rejected");
            return Err(err);
        };
        self.register(point, implementation, &params, options)
    }

    /// Resolve a call to `point` with the given argument types.
    pub fn resolve(&self, point: &str, args: &[TypeDesc]) -> DispatchResult<'_> {
        match self.points.get(point) {
            Some(dp) => DispatchResolver::new(self.oracle()).resolve(point, args, &dp.candidates),
            None => DispatchResult::NoMatch(NoMatchError {
                point: point.to_string(),
                arg_types: args.to_vec(),
            }),
        }
    }

    /// Resolve a call to `point` with the given argument values.
    pub fn resolve_values(&self, point: &str, args: &[Value]) -> DispatchResult<'_> {
        let types: Vec<TypeDesc> = args.iter().map(|v| self.oracle.type_of(v)).collect();
        self.resolve(point, &types)
    }

    /// Names of every dispatch point, in registration order.
    pub fn points(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    pub fn contains_point(&self, point: &str) -> bool {
        self.points.contains_key(point)
    }

    /// Stored candidates of `point`, in trie order.
    pub fn candidates(&self, point: &str) -> impl Iterator<Item = &Candidate> {
        self.points.get(point).into_iter().flat_map(|dp| dp.candidates.values())
    }

    /// Drop `point` and all of its candidates.
    pub fn remove_point(&mut self, point: &str) -> bool {
        self.points.shift_remove(point).is_some()
    }

    fn build(
        &self,
        implementation: &ImplRef,
        params: &[Parameter],
        options: &RegisterOptions,
    ) -> RegisterResult<Vec<Candidate>> {
        let normalizer = Normalizer::new(&self.aliases, self.oracle());
        let builder = CandidateBuilder::new(normalizer).with_fallback(options.fallback.as_ref());
        let mut candidates = builder.build(implementation, params, options.self_type, options.priority)?;

        if options.expand_permutations {
            let mut expanded = Vec::with_capacity(candidates.len());
            for (i, candidate) in candidates.iter().enumerate() {
                // A nullary default level has nothing to permute.
                if i > 0 && candidate.arity() == 0 {
                    expanded.push(candidate.clone());
                    continue;
                }
                expanded.extend(expand(candidate)?);
            }
            candidates = expanded;
        }

        if let Some(name) = &options.source_name {
            candidates = candidates
                .into_iter()
                .map(|c| c.with_source_name(name.as_str()))
                .collect();
        }
        Ok(candidates)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("aliases", &self.aliases)
            .field("points", &self.points)
            .finish_non_exhaustive()
    }
}

/// A [`Registry`] behind a read-write lock.
///
/// Registrations hold the write lock for their whole duration, so a
/// concurrent resolve sees either none or all of a registration.
#[derive(Debug)]
pub struct SharedRegistry {
    inner: RwLock<Registry>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: RwLock::new(registry),
        }
    }

    pub fn register(
        &self,
        point: &str,
        implementation: ImplRef,
        params: &[Parameter],
        options: &RegisterOptions,
    ) -> RegisterResult<RegisterSummary> {
        self.inner.write().register(point, implementation, params, options)
    }

    /// Resolve a call, cloning the selected candidate out of the lock.
    pub fn resolve(&self, point: &str, args: &[TypeDesc]) -> Result<Candidate, DispatchError> {
        self.inner.read().resolve(point, args).into_result().cloned()
    }

    /// Read access to the underlying registry.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read()
    }

    pub fn into_inner(self) -> Registry {
        self.inner.into_inner()
    }
}
