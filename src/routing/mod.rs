//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteConfig[] + Registry
//!     → router.rs (check provider names and kinds)
//!     → node.rs (wrap in synthetic root, link parents, compile patterns)
//!     → Freeze as Router
//!
//! Incoming Message (method, path)
//!     → router.rs (walk the tree level by level)
//!     → matcher.rs (first child whose verbs and pattern fit)
//!     → node.rs (fallback when nothing fits, scope on first visit)
//!     → Message.request.{route, params}
//!
//! Introspection:
//!     Router::flatten → flatten.rs (harmonize, fold, sort)
//! ```
//!
//! # Design Decisions
//! - Tree is immutable at runtime apart from compute-once cells
//! - No regex in hot path (positional segment comparison)
//! - Deterministic: first declared sibling wins
//! - Misses resolve to a synthesized `not_found` leaf, never an error

pub mod flatten;
pub mod matcher;
pub mod node;
pub mod router;

pub use flatten::{FlatRoute, ALL_METHODS};
pub use node::RouteNode;
pub use router::{Resolved, Router, RouterBuilder, RouterError};
