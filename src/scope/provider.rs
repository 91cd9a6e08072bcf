//! Named providers and the registry they live in.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::pipeline::{Catcher, Handler, Middleware};
use crate::scope::{Resolver, ScopeError};

/// A constructed service, handler, middleware or catcher.
///
/// Capability instances are stored as `Arc<dyn Handler>` (etc.) inside the
/// `Any`, so the same trait object is handed out on every resolution.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance, pulling dependencies from the resolver.
pub type Factory = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance, ScopeError> + Send + Sync>;

/// What a provider produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Service,
    Handler,
    Middleware,
    Catcher,
}

/// A named constructor.
#[derive(Clone)]
pub struct Provider {
    name: String,
    kind: ProviderKind,
    factory: Factory,
}

impl Provider {
    /// A service built from its dependencies.
    pub fn service<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolver<'_>) -> Result<T, ScopeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ProviderKind::Service,
            factory: Arc::new(move |resolver| Ok(Arc::new(factory(resolver)?) as Instance)),
        }
    }

    /// A pre-built value, shared by every scope that declares it.
    pub fn value<T>(name: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        let value: Instance = Arc::new(value);
        Self {
            name: name.into(),
            kind: ProviderKind::Service,
            factory: Arc::new(move |_| Ok(value.clone())),
        }
    }

    pub fn handler<H, F>(name: impl Into<String>, factory: F) -> Self
    where
        H: Handler + 'static,
        F: Fn(&Resolver<'_>) -> Result<H, ScopeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ProviderKind::Handler,
            factory: Arc::new(move |resolver| {
                let handler: Arc<dyn Handler> = Arc::new(factory(resolver)?);
                Ok(Arc::new(handler) as Instance)
            }),
        }
    }

    pub fn middleware<M, F>(name: impl Into<String>, factory: F) -> Self
    where
        M: Middleware + 'static,
        F: Fn(&Resolver<'_>) -> Result<M, ScopeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ProviderKind::Middleware,
            factory: Arc::new(move |resolver| {
                let middleware: Arc<dyn Middleware> = Arc::new(factory(resolver)?);
                Ok(Arc::new(middleware) as Instance)
            }),
        }
    }

    pub fn catcher<C, F>(name: impl Into<String>, factory: F) -> Self
    where
        C: Catcher + 'static,
        F: Fn(&Resolver<'_>) -> Result<C, ScopeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ProviderKind::Catcher,
            factory: Arc::new(move |resolver| {
                let catcher: Arc<dyn Catcher> = Arc::new(factory(resolver)?);
                Ok(Arc::new(catcher) as Instance)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub(crate) fn build(&self, resolver: &Resolver<'_>) -> Result<Instance, ScopeError> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Every provider a route tree may reference, keyed by name.
///
/// Route nodes hold names; the router looks them up here when it builds a
/// node's scope. Registering a name twice replaces the earlier provider.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: HashMap<String, Provider>,
}

impl Registry {
    /// An empty registry. Routers built from it need the built-ins supplied
    /// by hand; prefer [`Registry::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in handlers, catcher and middlewares.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::handlers::register(&mut registry);
        crate::catchers::register(&mut registry);
        crate::middlewares::register(&mut registry);
        registry
    }

    pub fn insert(&mut self, provider: Provider) -> &mut Self {
        self.providers.insert(provider.name.clone(), provider);
        self
    }

    /// Builder-style [`Registry::insert`].
    pub fn with(mut self, provider: Provider) -> Self {
        self.insert(provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = Registry::with_builtins();
        for (name, kind) in [
            ("status_200", ProviderKind::Handler),
            ("redirect_to", ProviderKind::Handler),
            ("not_found", ProviderKind::Handler),
            ("route_listing", ProviderKind::Handler),
            ("catch_all", ProviderKind::Catcher),
            ("normalizer", ProviderKind::Middleware),
            ("timer", ProviderKind::Middleware),
            ("request_logger", ProviderKind::Middleware),
        ] {
            assert_eq!(registry.get(name).map(Provider::kind), Some(kind), "{}", name);
        }
    }

    #[test]
    fn test_later_registration_replaces() {
        let registry = Registry::new()
            .with(Provider::value("answer", 41u32))
            .with(Provider::value("answer", 42u32));
        assert_eq!(registry.len(), 1);
    }
}
