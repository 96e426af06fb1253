use crate::{
    config::Config,
    resolver::Resolver,
    types::{ErrorOf, ResolveResult, ScopeOf, ScopeOptionsOf, Value, ValueOf},
};
use core::fmt;
use derive_more::{Debug, Display};
use std::sync::Arc;

/// How the scope queries of a data method are combined.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScopeMode {
    /// Every query must be satisfied.
    #[display("and")]
    And,
    /// At least one query must be satisfied.
    #[default]
    #[display("or")]
    Or,
}

/// Options forwarded to [`Host::has_scope`](crate::host::Host::has_scope).
///
/// `extra` carries host-defined options, see
/// [`Config::ScopeExtra`](crate::config::Config::ScopeExtra).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScopeOptions<X = ()> {
    /// Combination logic for the declared queries.
    pub mode: ScopeMode,
    /// Host-defined options.
    pub extra: X,
}

impl<X: Default> From<ScopeMode> for ScopeOptions<X> {
    fn from(mode: ScopeMode) -> Self {
        Self {
            mode,
            extra: X::default(),
        }
    }
}

/// Cache slot of a data method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Use the method name as the cache key.
    #[default]
    Name,
    /// Use an explicit key, possibly shared with other methods.
    Key(String),
    /// Never cache; every call recomputes.
    Disabled,
}

impl From<&str> for Storage {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for Storage {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<bool> for Storage {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Name } else { Self::Disabled }
    }
}

/// Boolean expression evaluated against the resolver.
pub type PredicateFn<C> = Arc<dyn Fn(&Resolver<C>) -> bool + Send + Sync>;
/// External expression producing a source value.
pub type ExprFn<C> = Arc<dyn Fn(&Resolver<C>) -> ResolveResult<C> + Send + Sync>;
/// Function extracting the final value from a source result.
pub type MapFn<C> = Arc<dyn Fn(ValueOf<C>) -> Result<Option<ValueOf<C>>, ErrorOf<C>> + Send + Sync>;

/// Gating condition of a data method.
///
/// `All` with more than one element is AND-combined, a single element is
/// evaluated as that element, and an empty `All` is always true.
pub enum Condition<C: Config> {
    /// Literal truth value.
    Const(bool),
    /// Expression evaluated for truthiness.
    Expr(PredicateFn<C>),
    /// Nested sequence of conditions.
    All(Vec<Condition<C>>),
}

impl<C: Config> Condition<C> {
    /// Condition backed by a closure.
    pub fn expr(f: impl Fn(&Resolver<C>) -> bool + Send + Sync + 'static) -> Self {
        Self::Expr(Arc::new(f))
    }

    /// Nested sequence of conditions.
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Evaluate the condition tree.
    pub fn evaluate(&self, resolver: &Resolver<C>) -> bool {
        match self {
            Self::Const(value) => *value,
            Self::Expr(f) => f(resolver),
            Self::All(conditions) => match conditions.as_slice() {
                [] => true,
                [single] => single.evaluate(resolver),
                many => many.iter().all(|condition| condition.evaluate(resolver)),
            },
        }
    }
}

impl<C: Config> From<bool> for Condition<C> {
    fn from(value: bool) -> Self {
        Self::Const(value)
    }
}

impl<C: Config> Clone for Condition<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Const(value) => Self::Const(*value),
            Self::Expr(f) => Self::Expr(f.clone()),
            Self::All(conditions) => Self::All(conditions.clone()),
        }
    }
}

// Written out: a derived bound on `Vec<Condition<C>>` would be recursive.
impl<C: Config> fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => f.debug_tuple("Const").field(value).finish(),
            Self::Expr(_) => f.write_str("Expr(..)"),
            Self::All(conditions) => f.debug_tuple("All").field(conditions).finish(),
        }
    }
}

/// What a source evaluates before its transform is applied.
#[derive(Debug)]
pub enum Target<C: Config> {
    /// Another registered data method or a host accessor.
    Method(String),
    /// A literal value.
    Literal(ValueOf<C>),
    /// An external expression handle.
    Expr(#[debug("<expr>")] ExprFn<C>),
}

impl<C: Config> Target<C> {
    /// Name of the data method or host accessor, if this target calls one.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Self::Method(name) => Some(name),
            Self::Literal(_) | Self::Expr(_) => None,
        }
    }
}

impl<C: Config> Clone for Target<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Method(name) => Self::Method(name.clone()),
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Expr(f) => Self::Expr(f.clone()),
        }
    }
}

/// Extraction applied to a present target result.
#[derive(Debug)]
pub enum Transform<C: Config> {
    /// Use the target result as is.
    Identity,
    /// Apply a function.
    Map(#[debug("<map>")] MapFn<C>),
    /// Walk members of the result one step at a time.
    Chain(Vec<String>),
}

impl<C: Config> Transform<C> {
    /// Apply the transform to a target result.
    ///
    /// # Errors
    /// Whatever a [`Transform::Map`] function raises.
    pub fn apply(&self, value: ValueOf<C>) -> Result<Option<ValueOf<C>>, ErrorOf<C>> {
        match self {
            Self::Identity => Ok(Some(value)),
            Self::Map(f) => f(value),
            Self::Chain(steps) => Ok(steps
                .iter()
                .try_fold(value, |current, step| current.member(step))),
        }
    }
}

impl<C: Config> Clone for Transform<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Map(f) => Self::Map(f.clone()),
            Self::Chain(steps) => Self::Chain(steps.clone()),
        }
    }
}

/// One way of producing a data method's result: a target and a transform.
#[derive(Debug)]
pub struct Source<C: Config> {
    target: Target<C>,
    transform: Transform<C>,
}

impl<C: Config> Source<C> {
    /// Source calling the data method or host accessor `name`.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(Target::Method(name.into()))
    }

    /// Source yielding a literal value.
    pub fn literal(value: ValueOf<C>) -> Self {
        Self::new(Target::Literal(value))
    }

    /// Source evaluating an external expression.
    pub fn expr(f: impl Fn(&Resolver<C>) -> ResolveResult<C> + Send + Sync + 'static) -> Self {
        Self::new(Target::Expr(Arc::new(f)))
    }

    fn new(target: Target<C>) -> Self {
        Self {
            target,
            transform: Transform::Identity,
        }
    }

    /// Extract the final value with an infallible function.
    #[must_use]
    pub fn map(
        self,
        f: impl Fn(ValueOf<C>) -> Option<ValueOf<C>> + Send + Sync + 'static,
    ) -> Self {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Extract the final value with a fallible function.
    #[must_use]
    pub fn try_map(
        mut self,
        f: impl Fn(ValueOf<C>) -> Result<Option<ValueOf<C>>, ErrorOf<C>> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Transform::Map(Arc::new(f));
        self
    }

    /// Extract the final value by walking `steps` through [`Value::member`].
    #[must_use]
    pub fn chain<S: Into<String>>(mut self, steps: impl IntoIterator<Item = S>) -> Self {
        self.transform = Transform::Chain(steps.into_iter().map(Into::into).collect());
        self
    }

    /// The target of this source.
    pub fn target(&self) -> &Target<C> {
        &self.target
    }

    /// The transform of this source.
    pub fn transform(&self) -> &Transform<C> {
        &self.transform
    }

    /// Name of the data method or host accessor this source calls, if any.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.target.method_name()
    }
}

impl<C: Config> Clone for Source<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            transform: self.transform.clone(),
        }
    }
}

/// Immutable declaration of a data method.
///
/// Built through [`MethodBuilder`], usually via
/// [`Registry::register`](crate::registry::Registry::register).
#[derive(Debug)]
pub struct MethodSpec<C: Config> {
    name: String,
    scope_queries: Vec<ScopeOf<C>>,
    scope_options: ScopeOptionsOf<C>,
    conditions: Condition<C>,
    sources: Vec<Source<C>>,
    storage_key: Option<String>,
    default_value: Option<ValueOf<C>>,
}

impl<C: Config> MethodSpec<C> {
    /// Start declaring a data method called `name`.
    pub fn builder(name: impl Into<String>) -> MethodBuilder<C> {
        MethodBuilder::new(name)
    }

    /// Unique name within the owning registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared scope queries, in declaration order.
    pub fn scope_queries(&self) -> &[ScopeOf<C>] {
        &self.scope_queries
    }

    /// How the scope queries are combined.
    pub fn scope_options(&self) -> &ScopeOptionsOf<C> {
        &self.scope_options
    }

    /// Gating condition tree.
    pub fn conditions(&self) -> &Condition<C> {
        &self.conditions
    }

    /// Sources, in declared priority order.
    pub fn sources(&self) -> &[Source<C>] {
        &self.sources
    }

    /// Cache key, or `None` when caching is disabled.
    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    /// Value used when no source produces a result.
    pub fn default_value(&self) -> Option<&ValueOf<C>> {
        self.default_value.as_ref()
    }
}

/// Chained declaration of a data method, compiled once into a [`MethodSpec`].
#[must_use]
#[derive(Debug)]
pub struct MethodBuilder<C: Config> {
    name: String,
    scope_queries: Vec<ScopeOf<C>>,
    scope_options: ScopeOptionsOf<C>,
    conditions: Vec<Condition<C>>,
    sources: Vec<Source<C>>,
    storage: Storage,
    default_value: Option<ValueOf<C>>,
}

impl<C: Config> MethodBuilder<C> {
    /// Empty declaration: no scopes, no conditions, no sources, cached under
    /// its own name, no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope_queries: Vec::new(),
            scope_options: ScopeOptions::default(),
            conditions: Vec::new(),
            sources: Vec::new(),
            storage: Storage::Name,
            default_value: None,
        }
    }

    /// Require a scope.
    pub fn scope(mut self, query: ScopeOf<C>) -> Self {
        self.scope_queries.push(query);
        self
    }

    /// Require a scope and replace the scope options.
    pub fn scope_with(self, query: ScopeOf<C>, options: ScopeOptionsOf<C>) -> Self {
        self.scope(query).scope_opts(options)
    }

    /// Replace the scope options.
    pub fn scope_opts(mut self, options: ScopeOptionsOf<C>) -> Self {
        self.scope_options = options;
        self
    }

    /// Replace the scope combination mode.
    pub fn scope_mode(mut self, mode: ScopeMode) -> Self {
        self.scope_options.mode = mode;
        self
    }

    /// Append a source. Earlier sources have higher priority.
    pub fn source(mut self, source: Source<C>) -> Self {
        self.sources.push(source);
        self
    }

    /// Append a source calling `name` without a transform.
    pub fn source_from(self, name: impl Into<String>) -> Self {
        self.source(Source::method(name))
    }

    /// Set the cache slot: a key, `true` for the method name, `false` to
    /// disable caching.
    pub fn storage(mut self, storage: impl Into<Storage>) -> Self {
        self.storage = storage.into();
        self
    }

    /// Disable caching.
    pub fn no_cache(self) -> Self {
        self.storage(Storage::Disabled)
    }

    /// Append a gating condition. All conditions must hold.
    pub fn condition(mut self, condition: impl Into<Condition<C>>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Append a closure-backed gating condition.
    pub fn condition_fn(self, f: impl Fn(&Resolver<C>) -> bool + Send + Sync + 'static) -> Self {
        self.condition(Condition::expr(f))
    }

    /// Value returned when no source produces a result.
    pub fn default_value(mut self, value: ValueOf<C>) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Compile the declaration.
    pub fn build(self) -> MethodSpec<C> {
        let Self {
            name,
            scope_queries,
            scope_options,
            conditions,
            sources,
            storage,
            default_value,
        } = self;
        let storage_key = match storage {
            Storage::Name => Some(name.clone()),
            Storage::Key(key) => Some(key),
            Storage::Disabled => None,
        };
        MethodSpec {
            name,
            scope_queries,
            scope_options,
            conditions: Condition::All(conditions),
            sources,
            storage_key,
            default_value,
        }
    }
}

