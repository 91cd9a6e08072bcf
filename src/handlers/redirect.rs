use async_trait::async_trait;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};

use crate::message::Message;
use crate::pipeline::{Error, Handler};

/// Redirects to the matched route's `redirect_to`, with its `redirect_as`
/// status or 301.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectTo;

#[async_trait]
impl Handler for RedirectTo {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        let route = message.request.route.clone();
        let target = route
            .as_ref()
            .and_then(|r| r.redirect_to())
            .ok_or_else(|| Error::other("route has no redirect target"))?;
        let location = HeaderValue::from_str(target).map_err(Error::other)?;

        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, location);
        message.response.headers = headers;
        message.response.status = Some(
            route
                .as_ref()
                .and_then(|r| r.redirect_as())
                .unwrap_or(StatusCode::MOVED_PERMANENTLY),
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Method;

    use crate::config::{InfoConfig, RouteConfig};
    use crate::message::Request;
    use crate::pipeline::Dispatcher;
    use crate::routing::Router;

    use super::*;

    #[tokio::test]
    async fn test_redirect_defaults_to_301() {
        let router = Router::builder()
            .route(RouteConfig::new("/old").redirect("https://example.com/new", None))
            .route(RouteConfig::new("/temp").redirect("/elsewhere", Some(307)))
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(router), InfoConfig::default());

        let old = dispatcher
            .dispatch(dispatcher.message(Request::new(Method::GET, "/old")))
            .await;
        assert_eq!(old.response.status, Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(old.response.headers[LOCATION], "https://example.com/new");

        let temp = dispatcher
            .dispatch(dispatcher.message(Request::new(Method::GET, "/temp")))
            .await;
        assert_eq!(temp.response.status, Some(StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(temp.response.headers[LOCATION], "/elsewhere");
    }
}
