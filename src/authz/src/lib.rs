//! # Gatekeep Authorization Engine
//!
//! Decides whether a subject may perform an action on a resource.
//!
//! ## Features
//!
//! - **Hierarchical resource names**: `res:team=acme/project=web/ws=abc123`,
//!   with `*` wildcards in ID positions and `*` for every resource
//! - **Resource graph**: resolves a bare `ws=abc123` into every fully-qualified
//!   name it is registered under, including shared sub-resources
//! - **Subject-scoped policies** with `$subject` substitution
//! - **Deny-overrides-allow** combination over every (policy, name) pair
//! - **Thread-safe, append-only stores** shared via `Arc`
//!
//! ## Example
//!
//! ```rust
//! use gatekeep_authz::{Action, Evaluator, Policy, PolicyStore, ResourceGraph, ResourceName, ResourceSegment};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), gatekeep_authz::AuthzError> {
//! let resources = Arc::new(ResourceGraph::new());
//! resources.add(&ResourceName::new("res:team=acme/project=web/ws=abc123"))?;
//!
//! let policies = Arc::new(PolicyStore::new());
//! policies.add(
//!     &ResourceName::wildcard(),
//!     vec![Policy::allow(["res:team=acme/project=*/ws=*"], vec![Action::new("read")?])],
//! )?;
//!
//! let evaluator = Evaluator::new(resources, policies);
//! let allowed = evaluator.is_allowed(
//!     &ResourceName::new("res:user=bob"),
//!     &Action::new("read")?,
//!     &ResourceSegment::new("ws", "abc123"),
//! )?;
//!
//! assert!(allowed);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod policy;
pub mod resource;

// Re-export commonly used types
pub use action::Action;
pub use config::{AuthzConfig, EvaluatorConfig, GraphConfig};
pub use decision::{Decision, DecisionReason, MatchedPolicy};
pub use error::{AuthzError, Result};
pub use evaluator::Evaluator;
pub use graph::{GraphEdge, GraphExport, ResourceGraph};
pub use policy::{Effect, Policy, PolicyStore};
pub use resource::{ParsedResourceName, ResourceName, ResourceSegment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
