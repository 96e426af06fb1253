use crate::{
    config::Config,
    types::{ErrorOf, ScopeOf, ScopeOptionsOf, ValueOf},
};

/// The owning instance of a set of data methods.
///
/// The engine never inspects scopes itself, and it only reaches host-defined
/// accessors through this trait. Data methods registered in the
/// [`Registry`](crate::registry::Registry) take precedence over host accessors
/// of the same name.
pub trait Host<C: Config>: Send + Sync {
    /// Whether the caller's grants satisfy `queries`, combined according to
    /// `options.mode` and refined by the host's own `options.extra`.
    ///
    /// Only invoked for data methods that declared at least one scope query.
    fn has_scope(&self, queries: &[ScopeOf<C>], options: &ScopeOptionsOf<C>) -> bool;

    /// Whether the host exposes a zero-argument accessor called `name`.
    fn responds_to(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Invoke the host accessor `name`.
    ///
    /// Only called when [`Host::responds_to`] returned `true` for `name`.
    /// `Ok(None)` means the accessor produced nothing.
    ///
    /// # Errors
    /// Whatever the accessor raises; it aborts the resolution that needed it.
    fn call(&self, name: &str) -> Result<Option<ValueOf<C>>, ErrorOf<C>> {
        let _ = name;
        Ok(None)
    }
}
