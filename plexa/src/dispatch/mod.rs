//! Runtime multiple dispatch.
//!
//! Selects which registered implementation of a dispatch point handles a
//! call, based on the runtime types of all arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Collect applicable**: Walk the point's candidate trie, descending
//!    only into positions whose key accepts the argument at that position
//! 2. **Trivial cases**: No applicable candidate is a miss; exactly one wins
//! 3. **Most specific**: A signature narrower than every other one wins
//! 4. **Priority**: Among the maximal candidates the unique highest priority
//!    wins; a tie is ambiguous
//!
//! # Module Structure
//!
//! - [`registry`] - Dispatch points, registration and the shared wrapper
//! - [`resolver`] - Main dispatch resolution algorithm
//! - [`result`] - Dispatch result types and errors

mod registry;
mod resolver;
mod result;


pub use registry::{RegisterOptions, RegisterSummary, Registry, SharedRegistry};

pub use resolver::DispatchResolver;

pub use result::{AmbiguityError, DispatchError, DispatchResult, NoMatchError};
