//! Plexa: runtime multiple dispatch
//!
//! Picks the implementation of a named operation from the runtime types of
//! all of its arguments, the way a dynamically typed host would resolve an
//! overloaded call.
//!
//! # Features
//!
//! - Declared parameter types normalized against widening aliases
//! - One candidate per admissible type combination and default boundary
//! - Optional argument-order permutations for commutative operations
//! - Specificity-first selection with priority tie-breaking
//! - Trie storage with subtree pruning during resolution
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────┐
//! │ lattice  │──►│ candidate │──►│ permute │──►│ trie │
//! │normalize │   │  builder  │   │         │   │      │
//! └──────────┘   └───────────┘   └─────────┘   └──┬───┘
//!                                                 │
//!                   ┌─────────┐   ┌──────────┐    │
//!                   │ compare │◄──│ dispatch │◄───┘
//!                   └─────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use plexa::{AliasTable, Hierarchy, ImplRef, Parameter, RegisterOptions, Registry};
//!
//! let mut h = Hierarchy::new();
//! let number = h.declare("Number", &[]);
//! let integer = h.declare("Integer", &[number]);
//!
//! let aliases = AliasTable::builder().widen(number, [integer]).build();
//! let mut registry = Registry::new(aliases, h);
//!
//! let opts = RegisterOptions::new();
//! registry
//!     .register("add", ImplRef::new(1, "add_int"), &[Parameter::typed("a", integer), Parameter::typed("b", integer)], &opts)
//!     .unwrap();
//! registry
//!     .register("add", ImplRef::new(2, "add_num"), &[Parameter::typed("a", number), Parameter::typed("b", number)], &opts)
//!     .unwrap();
//!
//! let chosen = registry.resolve("add", &[integer, integer]).into_result().unwrap();
//! assert_eq!(chosen.implementation().target().name.as_ref(), "add_int");
//! ```

pub mod candidate;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lattice;
pub mod trie;

pub use candidate::{Candidate, ImplId, ImplRef, Implementation, ParamKind, Parameter, Priority, Reflect};
pub use compare::{select_most_specific, Specificity};
pub use config::{ConfigError, ScenarioConfig};
pub use dispatch::{
    AmbiguityError, DispatchError, DispatchResult, NoMatchError, RegisterOptions, RegisterSummary, Registry,
    SharedRegistry,
};
pub use error::{RegisterError, RegisterResult};
pub use lattice::{AliasTable, Hierarchy, Placeholder, TypeDesc, TypeExpr, TypeOracle, Value};
pub use trie::{Trie, TrieError};
