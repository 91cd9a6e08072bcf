//! Built-in middlewares.
//!
//! # Middlewares
//! - `normalizer` (postcatch): status default, content type and length
//! - `timer` (prehandle, posthandle): request timing headers
//! - `request_logger` (postcatch): one log line per request
//!
//! # Design Decisions
//! - The router config requires `normalizer` by default, attaching it to
//!   the synthetic root so it runs last in postcatch
//! - `request_logger` reads optional settings from the service
//!   `request_logger_options`

pub mod normalizer;
pub mod request_logger;
pub mod timer;

pub use normalizer::Normalizer;
pub use request_logger::{RequestLogger, RequestLoggerOptions, REQUEST_LOGGER_OPTIONS};
pub use timer::Timer;

use crate::scope::{Provider, Registry};

pub fn register(registry: &mut Registry) {
    registry
        .insert(Provider::middleware("normalizer", |_| Ok(Normalizer)))
        .insert(Provider::middleware("timer", |_| Ok(Timer)))
        .insert(Provider::middleware("request_logger", |resolver| {
            let options = resolver
                .optional::<RequestLoggerOptions>(REQUEST_LOGGER_OPTIONS)?
                .map(|o| o.as_ref().clone())
                .unwrap_or_default();
            Ok(RequestLogger::new(options))
        }));
}
