use crate::{
    config::Config,
    method::MethodSpec,
    order::{Unmatched, order_against_reference},
    registry::Registry,
    types::{IndexMap, IndexSet},
};
use derive_more::Debug;
use regex::Regex;
use std::{collections::VecDeque, sync::Arc};

/// Selects the names that are under dependency management.
#[derive(Debug, Clone, Default)]
pub enum DependencyFilter {
    /// Every name is managed.
    #[default]
    All,
    /// Names matching the regular expression are managed.
    Regex(Regex),
    /// Names accepted by the predicate are managed.
    Predicate(#[debug("<predicate>")] Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl DependencyFilter {
    /// Filter from a regular expression.
    ///
    /// # Errors
    /// If `pattern` is not a valid regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Filter from a predicate.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Whether `name` passes the filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Regex(regex) => regex.is_match(name),
            Self::Predicate(f) => f(name),
        }
    }
}

/// Names of the data methods and host accessors `spec` cites as source
/// targets, in declaration order, without duplicates.
pub fn direct_dependencies<C: Config>(spec: &MethodSpec<C>) -> IndexSet<&str> {
    spec.sources()
        .iter()
        .filter_map(|source| source.method_name())
        .collect()
}

/// Direct dependencies of `spec` unioned with the transitive dependencies of
/// every direct dependency registered in `registry`.
///
/// Each registered method is expanded at most once, so cycles terminate. A
/// method taking part in a cycle shows up in its own result.
pub fn transitive_dependencies<C: Config>(
    registry: &Registry<C>,
    spec: &MethodSpec<C>,
) -> IndexSet<String> {
    let methods = registry.all();
    let mut visited = vec![false; methods.len()];
    if let Some(idx) = methods.get_index_of(spec.name()) {
        visited[idx] = true;
    }

    let mut found = IndexSet::default();
    let mut pending = VecDeque::new();
    for name in direct_dependencies(spec) {
        if found.insert(name.to_owned()) {
            pending.push_back(name);
        }
    }
    while let Some(name) = pending.pop_front() {
        let Some((idx, _, dependency)) = methods.get_full(name) else {
            // Host accessor: nothing to expand.
            continue;
        };
        if std::mem::replace(&mut visited[idx], true) {
            continue;
        }
        for nested in direct_dependencies(dependency) {
            if found.insert(nested.to_owned()) {
                pending.push_back(nested);
            }
        }
    }
    found
}

/// Dependency structure derived from a [`Registry`].
///
/// Computed purely from the registry, so every resolver sharing the registry
/// sees the same graph.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Registered names, declaration order.
    registered: Vec<String>,
    /// How many sources across the registry cite each name as a target.
    citations: IndexMap<String, usize>,
    /// Registered name -> transitive dependency -> citation count.
    tree: IndexMap<String, IndexMap<String, usize>>,
}

impl DependencyGraph {
    /// Build the graph of every method in `registry`.
    pub fn build<C: Config>(registry: &Registry<C>) -> Self {
        let mut citations: IndexMap<String, usize> = IndexMap::default();
        for spec in registry.all().values() {
            for name in spec.sources().iter().filter_map(|source| source.method_name()) {
                *citations.entry(name.to_owned()).or_default() += 1;
            }
        }

        let tree = registry
            .all()
            .iter()
            .map(|(name, spec)| {
                let dependencies = transitive_dependencies(registry, spec)
                    .into_iter()
                    .map(|dependency| {
                        let count = citations.get(&dependency).copied().unwrap_or_default();
                        (dependency, count)
                    })
                    .collect();
                (name.clone(), dependencies)
            })
            .collect();

        Self {
            registered: registry.names().map(str::to_owned).collect(),
            citations,
            tree,
        }
    }

    /// Registered name -> transitive dependency -> citation count.
    #[must_use]
    pub fn tree(&self) -> &IndexMap<String, IndexMap<String, usize>> {
        &self.tree
    }

    /// Transitive dependencies of the registered method `name`.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Option<&IndexMap<String, usize>> {
        self.tree.get(name)
    }

    /// How many sources across the registry cite `name` as a target.
    #[must_use]
    pub fn citations(&self, name: &str) -> usize {
        self.citations.get(name).copied().unwrap_or_default()
    }

    /// Every registered name and every dependency name that passes `filter`,
    /// mapped to its citation count.
    ///
    /// Registered names come first, in declaration order, followed by
    /// unregistered dependency names in order of first appearance.
    #[must_use]
    pub fn flattened(&self, filter: &DependencyFilter) -> IndexMap<String, usize> {
        let mut names: IndexSet<&str> = self.registered.iter().map(String::as_str).collect();
        names.extend(
            self.tree
                .values()
                .flat_map(|dependencies| dependencies.keys().map(String::as_str)),
        );
        let names = names.into_iter().filter(|name| filter.matches(name));
        order_against_reference(
            names,
            self.registered.iter().map(String::as_str),
            Unmatched::End,
            |name| Some(*name),
        )
        .into_iter()
        .map(|name| (name.to_owned(), self.citations(name)))
        .collect()
    }
}
