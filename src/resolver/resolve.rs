use crate::{
    config::Config,
    host::Host,
    method::{MethodSpec, Source, Target},
    order::{Unmatched, order_against_reference},
    resolver::Resolver,
    types::{ResolveResult, Value},
};

impl<C: Config> Resolver<C> {
    /// Gate, then try the eligible sources, then fall back to the default.
    ///
    /// Errors from a source abort the whole resolution: neither the remaining
    /// sources nor the default are attempted.
    pub(super) fn resolve(&self, spec: &MethodSpec<C>) -> ResolveResult<C> {
        let method = spec.name();
        if !self.gate(spec) {
            tracing::debug!(method, "gate closed, falling back to default");
            return Ok(spec.default_value().cloned());
        }
        for source in self.select_sources(spec) {
            if let Some(value) = self.evaluate(source).inspect_err(|err| {
                tracing::debug!(method, ?source, %err, "source evaluation failed");
            })? {
                return Ok(Some(value));
            }
        }
        tracing::debug!(method, "no source produced a value, falling back to default");
        Ok(spec.default_value().cloned())
    }

    /// Scope check (only when queries are declared) and condition tree.
    fn gate(&self, spec: &MethodSpec<C>) -> bool {
        let queries = spec.scope_queries();
        if !queries.is_empty() && !self.host.has_scope(queries, spec.scope_options()) {
            return false;
        }
        spec.conditions().evaluate(self)
    }

    /// Sources whose target is active or unmanaged, ordered by the active
    /// allow-list. Sources not in the allow-list keep their declared order
    /// after the prioritized ones.
    pub(super) fn select_sources<'s>(&self, spec: &'s MethodSpec<C>) -> Vec<&'s Source<C>> {
        let eligible = spec.sources().iter().filter(|source| {
            source
                .method_name()
                .is_none_or(|name| self.is_active(name) || !self.is_managed(name))
        });
        order_against_reference(
            eligible,
            self.active.iter().map(String::as_str),
            Unmatched::End,
            |source| source.method_name(),
        )
    }

    /// Evaluate a source's target and apply its transform to a present
    /// result.
    fn evaluate(&self, source: &Source<C>) -> ResolveResult<C> {
        let raw = match source.target() {
            Target::Method(name) => self.call(name)?,
            Target::Literal(value) => Some(value.clone()),
            Target::Expr(f) => f(self)?,
        };
        let Some(raw) = raw.filter(|value| value.is_present()) else {
            return Ok(None);
        };
        let value = source.transform().apply(raw)?;
        Ok(value.filter(|value| value.is_present()))
    }
}
