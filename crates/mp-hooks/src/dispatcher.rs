use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::HookError;
use crate::flow::{HookFlow, HookHandler};
use crate::name::HookName;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

type Registry = BTreeMap<HookName, Vec<Arc<dyn HookHandler>>>;

/// Registry of ordered handler chains keyed by hook name.
///
/// The dispatcher is owned by whoever drives the process lifecycle and shared
/// by reference (usually behind an [`Arc`]) with the components that register
/// or call hooks. Handlers are copied out of the table before they run, so a
/// handler may call back into the dispatcher and a failing handler never
/// leaves the table half-updated.
#[derive(Default)]
pub struct HookDispatcher {
    registry: RwLock<Registry>,
}

impl HookDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a closure to the chain for `name`.
    ///
    /// Registrations are never replaced or deduplicated.
    pub fn register<F>(&self, name: impl Into<HookName>, handler: F)
    where
        F: Fn(Option<&Value>, Value) -> Result<HookFlow, HookError> + Send + Sync + 'static,
    {
        self.register_handler(name, Arc::new(handler));
    }

    /// Appends a shared handler to the chain for `name`.
    pub fn register_handler(&self, name: impl Into<HookName>, handler: Arc<dyn HookHandler>) {
        let name = name.into();
        let mut registry = self.write();
        let chain = registry.entry(name.clone()).or_default();
        chain.push(handler);
        debug!(
            target: DISPATCH_TARGET,
            hook = %name,
            position = chain.len(),
            "registered hook handler"
        );
    }

    /// Runs every handler registered for `name` in registration order.
    ///
    /// Returns the final `last_return`, or `Value::Null` when nothing is
    /// registered. A [`HookFlow::Halt`] ends the chain early with its value.
    ///
    /// # Errors
    ///
    /// The first handler error aborts the remaining chain and is returned
    /// unchanged.
    pub fn call(&self, name: &str, params: Option<&Value>) -> Result<Value, HookError> {
        let chain = self.chain(name);
        debug!(target: DISPATCH_TARGET, hook = name, handlers = chain.len(), "calling hook");

        let mut last_return = Value::Null;
        for handler in chain {
            match handler.handle(params, last_return)? {
                HookFlow::Continue(value) => last_return = value,
                HookFlow::Halt(value) => return Ok(value),
            }
        }
        Ok(last_return)
    }

    /// Runs every handler for `name`, carrying on past failures.
    ///
    /// A failing handler leaves `last_return` untouched for the next one. The
    /// returned vector holds every error in the order it was raised.
    #[must_use]
    pub fn call_best_effort(&self, name: &str, params: Option<&Value>) -> (Value, Vec<HookError>) {
        let chain = self.chain(name);
        debug!(
            target: DISPATCH_TARGET,
            hook = name,
            handlers = chain.len(),
            "calling hook best effort"
        );

        let mut last_return = Value::Null;
        let mut failures = Vec::new();
        for handler in chain {
            match handler.handle(params, last_return.clone()) {
                Ok(HookFlow::Continue(value)) => last_return = value,
                Ok(HookFlow::Halt(value)) => return (value, failures),
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, hook = name, %error, "hook handler failed");
                    failures.push(error);
                }
            }
        }
        (last_return, failures)
    }

    /// Drops every registration.
    pub fn free(&self) {
        let mut registry = self.write();
        let hooks = registry.len();
        registry.clear();
        debug!(target: DISPATCH_TARGET, hooks, "freed hook registry");
    }

    /// Number of handlers currently registered for `name`.
    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.read().get(name).map_or(0, Vec::len)
    }

    /// Reports whether no handlers are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn chain(&self, name: &str) -> Vec<Arc<dyn HookHandler>> {
        self.read().get(name).cloned().unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.read();
        let mut map = formatter.debug_map();
        for (name, chain) in registry.iter() {
            map.entry(&name.as_str(), &chain.len());
        }
        map.finish()
    }
}
