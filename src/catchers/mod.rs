//! Built-in catchers.
//!
//! The synthetic root always declares `catch_all`, so an unexpected error
//! anywhere in the tree has somewhere to land.

pub mod catch_all;

pub use catch_all::CatchAll;

use crate::scope::{Provider, Registry};

pub fn register(registry: &mut Registry) {
    registry.insert(Provider::catcher("catch_all", |_| Ok(CatchAll)));
}
