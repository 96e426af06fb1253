use thiserror::Error;

/// Error returned by [`Resolver::call`](crate::resolver::Resolver::call).
///
/// A gate failure is not an error: it yields the method's default value.
/// Everything here aborts the whole call, and nothing gets cached.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError<E> {
    /// A source target or transform raised an error.
    #[error("source evaluation failed")]
    Source(#[from] E),
    /// The name is neither a registered data method nor a host accessor.
    #[error("`{name}` is neither a registered data method nor a host accessor")]
    UnknownMethod {
        /// Name that was looked up.
        name: String,
    },
    /// The method was re-entered on the same thread while it was resolving.
    #[error("data method `{method}` depends on itself")]
    Cycle {
        /// Method that was re-entered.
        method: String,
    },
}

/// Error returned by [`Resolver::preload`](crate::resolver::Resolver::preload).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreloadError<E> {
    /// The worker pool could not be started.
    #[error("failed to start preload workers")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// First data method that failed while preloading.
    #[error("preloading `{method}` failed")]
    Resolve {
        /// Method whose resolution failed.
        method: String,
        /// Underlying failure.
        #[source]
        source: ResolveError<E>,
    },
}
