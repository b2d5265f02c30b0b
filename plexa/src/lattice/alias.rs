//! Widening aliases.
//!
//! An alias entry declares that a parameter annotated with `t` also accepts
//! some other concrete types, e.g. `float` accepting `int`. The table is
//! built once, frozen, and read-only from then on. Cycles are not detected:
//! the table is expected to already be a closed, acyclic widening relation.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::desc::TypeDesc;

static GLOBAL: OnceLock<AliasTable> = OnceLock::new();

/// Error returned when a process-wide table is installed twice.
#[derive(Debug, Error)]
#[error("a process-wide alias table is already installed")]
pub struct AliasTableAlreadyInstalled;

/// Immutable mapping from a type to the ordered list of types it accepts.
///
/// Every stored list starts with the key itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: FxHashMap<TypeDesc, Vec<TypeDesc>>,
}

impl AliasTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a table.
    pub fn builder() -> AliasTableBuilder {
        AliasTableBuilder::default()
    }

    /// The widened list for `ty`, if `ty` has an entry.
    pub fn lookup(&self, ty: TypeDesc) -> Option<&[TypeDesc]> {
        self.entries.get(&ty).map(Vec::as_slice)
    }

    /// The widened list for `ty`, or just `[ty]`.
    pub fn widen(&self, ty: TypeDesc) -> Vec<TypeDesc> {
        match self.lookup(ty) {
            Some(list) => list.to_vec(),
            None => vec![ty],
        }
    }

    /// Number of types with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install `table` as the process-wide table. Only the first call wins.
    pub fn install_global(table: AliasTable) -> Result<&'static AliasTable, AliasTableAlreadyInstalled> {
        let mut installed = false;
        let stored = GLOBAL.get_or_init(|| {
            installed = true;
            table
        });
        if installed {
            Ok(stored)
        } else {
            Err(AliasTableAlreadyInstalled)
        }
    }

    /// The process-wide table, or an empty one when none was installed.
    pub fn global() -> &'static AliasTable {
        static EMPTY: OnceLock<AliasTable> = OnceLock::new();
        GLOBAL
            .get()
            .unwrap_or_else(|| EMPTY.get_or_init(AliasTable::empty))
    }
}

/// Builder for an [`AliasTable`].
#[derive(Debug, Default)]
pub struct AliasTableBuilder {
    entries: FxHashMap<TypeDesc, Vec<TypeDesc>>,
}

impl AliasTableBuilder {
    /// Declare that `ty` additionally accepts `accepted`, in order.
    ///
    /// Repeated calls for the same `ty` append; duplicates are dropped.
    pub fn widen(mut self, ty: TypeDesc, accepted: impl IntoIterator<Item = TypeDesc>) -> Self {
        let list = self.entries.entry(ty).or_insert_with(|| vec![ty]);
        for t in accepted {
            if !list.contains(&t) {
                list.push(t);
            }
        }
        self
    }

    /// Freeze the table.
    pub fn build(self) -> AliasTable {
        AliasTable {
            entries: self.entries,
        }
    }
}
