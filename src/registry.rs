use crate::{
    config::Config,
    graph::DependencyGraph,
    host::Host,
    method::{MethodBuilder, MethodSpec},
    types::IndexMap,
};
use derive_more::Debug;
use std::sync::{Arc, OnceLock};

/// Declaration-ordered store of the data methods of one host type.
///
/// Filled during setup through `&mut` access, then shared read-only by every
/// [`Resolver`](crate::resolver::Resolver) of that host type, typically as an
/// `Arc<Registry<C>>`.
#[must_use]
#[derive(Debug)]
pub struct Registry<C: Config> {
    methods: IndexMap<String, Arc<MethodSpec<C>>>,
    #[debug(skip)]
    graph: OnceLock<DependencyGraph>,
}

impl<C: Config> Registry<C> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            methods: IndexMap::default(),
            graph: OnceLock::new(),
        }
    }

    /// Declare the data method `name`, replacing a previous declaration.
    ///
    /// A replaced method keeps its original declaration position.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        declare: impl FnOnce(MethodBuilder<C>) -> MethodBuilder<C>,
    ) -> &mut Self {
        let spec = declare(MethodSpec::builder(name)).build();
        self.insert(spec)
    }

    /// Insert an already built declaration, replacing one with the same name.
    pub fn insert(&mut self, spec: MethodSpec<C>) -> &mut Self {
        let name = spec.name().to_owned();
        if let Some(previous) = self.methods.insert(name, Arc::new(spec)) {
            tracing::debug!(method = previous.name(), "data method redeclared");
        }
        // The memoized graph no longer reflects the declarations.
        self.graph.take();
        self
    }

    /// Every declared method, in declaration order.
    pub fn all(&self) -> &IndexMap<String, Arc<MethodSpec<C>>> {
        &self.methods
    }

    /// Declaration of `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<MethodSpec<C>>> {
        self.methods.get(name)
    }

    /// Whether `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of declared methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Dependency graph of the current declarations, memoized until the next
    /// [`Registry::register`].
    pub fn graph(&self) -> &DependencyGraph {
        self.graph.get_or_init(|| DependencyGraph::build(self))
    }

    /// The subset of `names` that has no callable accessor: neither declared
    /// here nor answered by [`Host::responds_to`].
    pub fn missing<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
        host: &C::Host,
    ) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| {
                let name = name.as_ref();
                !self.contains(name) && !host.responds_to(name)
            })
            .map(|name| name.as_ref().to_owned())
            .collect()
    }
}

impl<C: Config> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;
    use crate::method::{ScopeOptions, Source};
    use std::convert::Infallible;

    #[derive(Debug)]
    struct Cfg;

    #[derive(Debug)]
    struct Accessors(&'static [&'static str]);

    impl Host<Cfg> for Accessors {
        fn has_scope(&self, _: &[()], _: &ScopeOptions) -> bool {
            true
        }

        fn responds_to(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("never")]
    struct Never(Infallible);

    impl Config for Cfg {
        type Host = Accessors;
        type Value = u32;
        type Scope = ();
        type ScopeExtra = ();
        type Error = Never;
    }

    #[test]
    fn register_keeps_declaration_order_on_replace() {
        let mut registry = Registry::<Cfg>::new();
        registry
            .register("a", |m| m)
            .register("b", |m| m)
            .register("a", |m| m.source(Source::literal(7)));
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().sources().len(), 1);
    }

    #[test]
    fn graph_reflects_new_declarations() {
        let mut registry = Registry::<Cfg>::new();
        registry.register("a", |m| m.source_from("b"));
        assert_eq!(registry.graph().citations("b"), 1);
        registry.register("c", |m| m.source_from("b"));
        assert_eq!(registry.graph().citations("b"), 2);
        assert!(registry.graph().dependencies_of("c").is_some());
    }

    #[test]
    fn missing_reports_names_without_accessor() {
        let mut registry = Registry::<Cfg>::new();
        registry.register("a", |m| m);
        let host = Accessors(&["token"]);
        let missing = registry.missing(["a", "token", "ghost", "other"], &host);
        assert_eq!(missing, ["ghost", "other"]);
    }

    #[test]
    fn storage_defaults_to_name() {
        let mut registry = Registry::<Cfg>::new();
        registry
            .register("a", |m| m)
            .register("b", |m| m.storage("shared"))
            .register("c", |m| m.no_cache());
        assert_eq!(registry.get("a").unwrap().storage_key(), Some("a"));
        assert_eq!(registry.get("b").unwrap().storage_key(), Some("shared"));
        assert_eq!(registry.get("c").unwrap().storage_key(), None);
    }
}
