//! Chained dependency scopes.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::pipeline::{Catcher, Handler, Middleware};
use crate::scope::{Instance, Provider, ScopeError};

/// The providers declared by one route node plus a link to its parent's scope.
///
/// Instances are memoised per scope: every request that resolves to the same
/// route sees the same handler, middleware and service instances.
pub struct Scope {
    label: String,
    providers: HashMap<String, Provider>,
    instances: DashMap<String, Instance>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new(
        label: impl Into<String>,
        providers: impl IntoIterator<Item = Provider>,
        parent: Option<Arc<Scope>>,
    ) -> Self {
        Self {
            label: label.into(),
            providers: providers
                .into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
            instances: DashMap::new(),
            parent,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// True when `name` is declared at this level (ignoring ancestors).
    pub fn declares(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Resolve a raw instance, building it on first use.
    pub fn instance(&self, name: &str) -> Result<Instance, ScopeError> {
        let stack = RefCell::new(Vec::new());
        resolve(self, name, &stack)
    }

    /// Resolve a typed service.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ScopeError> {
        downcast(name, self.instance(name)?)
    }

    pub fn handler(&self, name: &str) -> Result<Arc<dyn Handler>, ScopeError> {
        self.get::<Arc<dyn Handler>>(name).map(|h| h.as_ref().clone())
    }

    pub fn middleware(&self, name: &str) -> Result<Arc<dyn Middleware>, ScopeError> {
        self.get::<Arc<dyn Middleware>>(name).map(|m| m.as_ref().clone())
    }

    pub fn catcher(&self, name: &str) -> Result<Arc<dyn Catcher>, ScopeError> {
        self.get::<Arc<dyn Catcher>>(name).map(|c| c.as_ref().clone())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut declared: Vec<_> = self.providers.keys().collect();
        declared.sort();
        f.debug_struct("Scope")
            .field("label", &self.label)
            .field("declared", &declared)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Handed to provider factories so they can pull their own dependencies.
///
/// Dependencies resolve from the scope that declares the provider being
/// built, falling back through its ancestors.
pub struct Resolver<'a> {
    scope: &'a Scope,
    stack: &'a RefCell<Vec<String>>,
}

impl Resolver<'_> {
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ScopeError> {
        downcast(name, resolve(self.scope, name, self.stack)?)
    }

    /// Like [`Resolver::get`], but a missing provider yields `None`.
    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, ScopeError> {
        match self.get(name) {
            Ok(value) => Ok(Some(value)),
            Err(ScopeError::UnknownProvider { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Label of the scope doing the resolving.
    pub fn scope_label(&self) -> &str {
        self.scope.label()
    }
}

fn resolve(start: &Scope, name: &str, stack: &RefCell<Vec<String>>) -> Result<Instance, ScopeError> {
    let mut current = Some(start);
    while let Some(scope) = current {
        if let Some(provider) = scope.providers.get(name) {
            if let Some(existing) = scope.instances.get(name).map(|i| i.value().clone()) {
                return Ok(existing);
            }

            if stack.borrow().iter().any(|n| n == name) {
                let mut chain = stack.borrow().clone();
                chain.push(name.to_string());
                return Err(ScopeError::Cycle { chain });
            }

            stack.borrow_mut().push(name.to_string());
            let built = provider.build(&Resolver { scope, stack });
            stack.borrow_mut().pop();
            let built = built?;

            // No lock is held while the factory runs; a concurrent builder may
            // have won, in which case its instance is the one kept.
            let instance = scope
                .instances
                .entry(name.to_string())
                .or_insert(built)
                .value()
                .clone();
            return Ok(instance);
        }
        current = scope.parent.as_deref();
    }

    Err(ScopeError::UnknownProvider {
        name: name.to_string(),
        scope: start.label.clone(),
    })
}

fn downcast<T: Any + Send + Sync>(name: &str, instance: Instance) -> Result<Arc<T>, ScopeError> {
    instance
        .downcast::<T>()
        .map_err(|_| ScopeError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Clock(u64);

    struct Greeter {
        clock: Arc<Clock>,
    }

    #[test]
    fn test_instances_are_memoised() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let scope = Scope::new(
            "/",
            [Provider::service("clock", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Clock(7))
            })],
            None,
        );

        let a = scope.get::<Clock>("clock").unwrap();
        let b = scope.get::<Clock>("clock").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_falls_back_to_parent() {
        let parent = Arc::new(Scope::new("/", [Provider::value("clock", Clock(1))], None));
        let child = Scope::new(
            "/greet",
            [Provider::service("greeter", |r| {
                Ok(Greeter {
                    clock: r.get::<Clock>("clock")?,
                })
            })],
            Some(parent.clone()),
        );

        let greeter = child.get::<Greeter>("greeter").unwrap();
        assert_eq!(greeter.clock.0, 1);
        assert!(Arc::ptr_eq(&greeter.clock, &parent.get::<Clock>("clock").unwrap()));
        assert!(child.declares("greeter"));
        assert!(!child.declares("clock"));
    }

    #[test]
    fn test_nearest_declaration_wins() {
        let parent = Arc::new(Scope::new("/", [Provider::value("clock", Clock(1))], None));
        let child = Scope::new("/c", [Provider::value("clock", Clock(2))], Some(parent));
        assert_eq!(child.get::<Clock>("clock").unwrap().0, 2);
    }

    #[test]
    fn test_unknown_and_mismatch() {
        let scope = Scope::new("/x", [Provider::value("clock", Clock(1))], None);
        assert!(matches!(
            scope.get::<Clock>("nope"),
            Err(ScopeError::UnknownProvider { ref scope, .. }) if scope == "/x"
        ));
        assert!(matches!(
            scope.get::<String>("clock"),
            Err(ScopeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_cycles_are_reported() {
        let scope = Scope::new(
            "/",
            [
                Provider::service("a", |r| r.get::<u8>("b").map(|b| *b)),
                Provider::service("b", |r| r.get::<u8>("a").map(|a| *a)),
            ],
            None,
        );
        match scope.get::<u8>("a") {
            Err(ScopeError::Cycle { chain }) => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {:?}", other.map(|v| *v)),
        }
    }

    #[test]
    fn test_optional_dependency() {
        let scope = Scope::new(
            "/",
            [Provider::service("maybe", |r| {
                Ok(r.optional::<Clock>("clock")?.map(|c| c.0))
            })],
            None,
        );
        assert_eq!(*scope.get::<Option<u64>>("maybe").unwrap(), None);
    }
}
