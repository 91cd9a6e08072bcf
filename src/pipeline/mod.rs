//! Dispatch pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Message (unrouted)
//!     → Router::route (request.route, request.params)
//!     → prehandle  (middlewares root → leaf, fan-out + merge)
//!     → handle     (route's handler, once)
//!     → posthandle (middlewares leaf → root, fan-out + merge)
//!     ↘ on error: domain exception → its response
//!                 anything else    → nearest catcher (root has catch_all)
//!     → postcatch  (middlewares leaf → root, always)
//!     → Message with response
//! ```
//!
//! # Design Decisions
//! - Three capability traits, no shared base; middleware hooks default to
//!   pass-through
//! - Fan-out is a sequential loop over copies, not concurrent streams
//! - Every request ends with a definite status; nothing escapes `dispatch`
//! - Dropping the dispatch future cancels the remaining phases

pub mod dispatcher;
pub mod error;
pub mod merge;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use error::{BoxError, Error};
pub use merge::merge;
pub use traits::{Catcher, Handler, Middleware, Phase};
