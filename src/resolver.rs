mod preload;
mod resolve;

use crate::{
    config::Config,
    error::ResolveError,
    graph::DependencyFilter,
    host::Host,
    method::MethodSpec,
    registry::Registry,
    sync::{MethodLocks, OnceFlag},
    types::{HashMap, HostOf, IndexSet, ResolveResult, Value, ValueOf},
};
use core::{convert::Infallible, str::FromStr};
use derive_more::Debug;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::instrument;

/// Which data methods are "in play" for a resolver, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveDependencies {
    /// Every managed name, in the order of the flattened dependency graph.
    #[default]
    Derived,
    /// An explicit priority list.
    Explicit(Vec<String>),
}

impl FromStr for ActiveDependencies {
    type Err = Infallible;

    /// Parse a comma and/or whitespace separated list of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self::Explicit(names))
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveDependencies {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::Explicit(iter.into_iter().map(Into::into).collect())
    }
}

/// Runtime knobs of a [`Resolver`].
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Allow-list and priority of the methods in play.
    pub active: ActiveDependencies,
    /// Names under dependency management.
    pub filter: DependencyFilter,
}

/// Per-instance resolution context of a host.
///
/// Owns the host, the single-slot cache store and the per-method locks, and
/// shares the [`Registry`] with every other resolver of the same host type.
///
/// Every data method is reached through [`Resolver::call`]:
/// - A call blocks while another thread resolves the same method on the same
///   resolver, then observes its cached result.
/// - A present cached result is returned without evaluating anything.
/// - Otherwise the method is gated, its eligible sources are tried in
///   priority order, and the default value is used as a last resort.
#[must_use]
#[derive(Debug)]
pub struct Resolver<C: Config> {
    #[debug(skip)]
    registry: Arc<Registry<C>>,
    host: HostOf<C>,
    /// Allow-list, highest priority first.
    active: IndexSet<String>,
    /// Filtered flattened dependency graph.
    managed: IndexSet<String>,
    /// Storage key -> present result.
    cache: RwLock<HashMap<String, ValueOf<C>>>,
    #[debug(skip)]
    locks: MethodLocks,
    #[debug(skip)]
    preload_started: OnceFlag,
}

impl<C: Config> Resolver<C> {
    /// Resolver with a derived allow-list and a match-all filter.
    pub fn new(registry: Arc<Registry<C>>, host: HostOf<C>) -> Self {
        Self::with_options(registry, host, ResolverOptions::default())
    }

    /// Resolver with explicit options.
    pub fn with_options(
        registry: Arc<Registry<C>>,
        host: HostOf<C>,
        options: ResolverOptions,
    ) -> Self {
        let ResolverOptions { active, filter } = options;
        let managed: IndexSet<String> = registry
            .graph()
            .flattened(&filter)
            .into_keys()
            .collect();
        let active = match active {
            ActiveDependencies::Derived => managed.clone(),
            ActiveDependencies::Explicit(names) => names.into_iter().collect(),
        };
        tracing::debug!(
            managed = managed.len(),
            active = active.len(),
            "resolver created"
        );
        Self {
            registry,
            host,
            active,
            managed,
            cache: RwLock::default(),
            locks: MethodLocks::default(),
            preload_started: OnceFlag::default(),
        }
    }

    /// The owning host instance.
    pub fn host(&self) -> &HostOf<C> {
        &self.host
    }

    /// The shared registry.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Active allow-list, highest priority first.
    pub fn dependency_order(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    /// Whether `name` is in the active allow-list.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Whether `name` is under dependency management.
    #[must_use]
    pub fn is_managed(&self, name: &str) -> bool {
        self.managed.contains(name)
    }

    /// Managed names without a callable accessor.
    ///
    /// Diagnostics only: a missing accessor surfaces as
    /// [`ResolveError::UnknownMethod`] when a source actually needs it.
    #[must_use]
    pub fn missing_dependencies(&self) -> Vec<String> {
        let missing = self.registry.missing(&self.managed, &self.host);
        if !missing.is_empty() {
            tracing::warn!(?missing, "dependencies without accessor");
        }
        missing
    }

    /// Resolve the data method or host accessor `name`.
    ///
    /// Registered data methods run under their per-method lock and go through
    /// the single-slot cache. Host accessors are invoked directly.
    ///
    /// # Errors
    /// - [`ResolveError::Source`] if a source target or transform failed.
    /// - [`ResolveError::UnknownMethod`] if `name`, or a method a source
    ///   needed, has no accessor.
    /// - [`ResolveError::Cycle`] if resolving `name` needs `name` itself,
    ///   either on this thread or through threads waiting on each other.
    #[instrument(level = "debug", skip(self))]
    pub fn call(&self, name: &str) -> ResolveResult<C> {
        let Some(spec) = self.registry.get(name) else {
            if self.host.responds_to(name) {
                return Ok(self.host.call(name)?);
            }
            return Err(ResolveError::UnknownMethod {
                name: name.to_owned(),
            });
        };
        let Some(_in_flight) = self.locks.enter(name) else {
            return Err(ResolveError::Cycle {
                method: name.to_owned(),
            });
        };
        self.with_cache(spec)
    }

    /// Present result cached under `key`.
    #[must_use]
    pub fn cached(&self, key: &str) -> Option<ValueOf<C>> {
        self.cache.read().get(key).cloned()
    }

    /// Drop the result cached under `key`.
    pub fn forget(&self, key: &str) -> Option<ValueOf<C>> {
        self.cache.write().remove(key)
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn with_cache(&self, spec: &MethodSpec<C>) -> ResolveResult<C> {
        let Some(key) = spec.storage_key() else {
            return self.resolve(spec);
        };
        let hit = self
            .cache
            .read()
            .get(key)
            .filter(|value| value.is_present())
            .cloned();
        if let Some(value) = hit {
            tracing::trace!(key, "cache hit");
            return Ok(Some(value));
        }

        let value = self.resolve(spec)?;
        if let Some(value) = value.as_ref().filter(|value| value.is_present()) {
            self.cache.write().insert(key.to_owned(), value.clone());
        }
        Ok(value)
    }
}
