//! Declarative data methods with dependency-aware source fallback,
//! single-slot memoization and concurrent preload.
//!
//! A host type declares named computations ("data methods") in a
//! [`Registry`](registry::Registry). Each declaration may require authorization
//! scopes, gate on conditions, and list several alternative sources, each
//! either another data method, a host accessor, a literal or an expression.
//! This crate:
//! - Derives the dependency graph of the declarations, tolerating cycles, and
//!   flattens it into the set of names under dependency management.
//! - Orders a method's candidate sources by the caller's active allow-list so
//!   that higher-priority upstream sources are attempted first.
//! - Caches present results per resolver, keyed by storage slot, under a
//!   per-method lock so a method is resolved at most once at a time.
//! - Pre-fetches many methods on a worker pool ahead of synchronous use.
//!
//! Key modules:
//! - `config`: binds the host, value, scope and error types via the `Config`
//!   trait.
//! - `host`: the `Host` trait the engine consumes from the owning instance.
//! - `method`: method declarations, sources, conditions and their builder.
//! - `registry`: the shared store of declarations.
//! - `graph` and `order`: dependency graph construction, flattening and
//!   ordering against a reference priority list.
//! - `resolver`: per-instance resolution, caching and preload.
//!
//! Quick start:
//! 1. Implement `Config` and `Host` for your host type.
//! 2. Declare data methods with `Registry::register`, chaining `source`,
//!    `scope`, `condition`, `storage` and `default_value` on the builder.
//! 3. Wrap the registry in an `Arc`, create one `Resolver` per host instance
//!    and `call` data methods by name, optionally after `preload`.
//!
//! Errors raised by a source abort the whole call: the engine never falls back
//! past a failing source, and a failed resolution is never cached.

/// Binding of the concrete types used by one instantiation of the engine.
///
/// Exposes the `Config` trait, which names the host, value, scope and error
/// types.
pub mod config;
/// Error types returned by resolution and preload.
pub mod error;
/// Dependency graph engine.
///
/// Direct and transitive dependencies of declarations, citation counts and
/// the filtered, flattened set of managed names.
pub mod graph;
/// The boundary between the engine and the owning instance.
pub mod host;
/// Data method declarations.
///
/// Defines `MethodSpec`, its `MethodBuilder`, sources with their targets and
/// transforms, and gating conditions.
pub mod method;
/// Ordering of sequences against a reference priority list.
pub mod order;
/// Shared, declaration-ordered store of data methods.
pub mod registry;
/// Per-instance resolution context.
///
/// Gating, source selection and evaluation, the single-slot cache, the
/// per-method locks and the concurrent preload.
pub mod resolver;
mod sync;
/// Shared aliases and the `Value` trait implemented by data method results.
pub mod types;
