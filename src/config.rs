use crate::{host::Host, types::Value};
use core::fmt::Debug;

/// Configuration entry-point for instantiating the engine.
///
/// A concrete `Config` binds the host type owning the data methods, the value
/// type data methods produce, the opaque scope query type forwarded to
/// [`Host::has_scope`] and the error type raised by host accessors and source
/// closures.
pub trait Config: Sized + 'static {
    /// The owning instance: answers scope checks and exposes host accessors.
    type Host: Host<Self>;
    /// Result type of every data method.
    type Value: Value;
    /// Scope requirement descriptor. Opaque to the engine.
    type Scope: Debug + Send + Sync + 'static;
    /// Host-defined scope options, declared with
    /// [`MethodBuilder::scope_with`](crate::method::MethodBuilder::scope_with)
    /// and handed back in [`ScopeOptions::extra`](crate::method::ScopeOptions::extra).
    /// `()` when the host has none.
    type ScopeExtra: Debug + Clone + Default + Send + Sync + 'static;
    /// Error raised while evaluating a source target or transform.
    type Error: std::error::Error + Send + Sync + 'static;
}
