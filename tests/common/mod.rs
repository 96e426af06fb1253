#![allow(dead_code, missing_docs)]

use dmg::{
    config::Config,
    host::Host,
    method::{ScopeMode, ScopeOptions, Source},
    registry::Registry,
    resolver::{Resolver, ResolverOptions},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

#[derive(Debug)]
pub struct TestConfig;

impl Config for TestConfig {
    type Host = TestHost;
    type Value = String;
    type Scope = &'static str;
    type ScopeExtra = ();
    type Error = TestError;
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    #[error("upstream unavailable")]
    Upstream,
}

/// Grants a fixed set of scopes and exposes two accessors:
/// `token` (always `"T0"`) and `broken` (always fails).
#[derive(Debug, Default)]
pub struct TestHost {
    pub granted: Vec<&'static str>,
}

impl Host<TestConfig> for TestHost {
    fn has_scope(&self, queries: &[&'static str], options: &ScopeOptions) -> bool {
        let granted = |query: &&'static str| self.granted.contains(query);
        match options.mode {
            ScopeMode::And => queries.iter().all(granted),
            ScopeMode::Or => queries.iter().any(granted),
        }
    }

    fn responds_to(&self, name: &str) -> bool {
        matches!(name, "token" | "broken")
    }

    fn call(&self, name: &str) -> Result<Option<String>, TestError> {
        match name {
            "token" => Ok(Some("T0".to_owned())),
            "broken" => Err(TestError::Upstream),
            _ => Ok(None),
        }
    }
}

/// Counts evaluations of the sources it creates.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Source yielding `value` and counting each evaluation.
    pub fn source(&self, value: &'static str) -> Source<TestConfig> {
        self.slow_source(value, Duration::ZERO)
    }

    /// Like [`Counter::source`], sleeping for `delay` before yielding.
    pub fn slow_source(&self, value: &'static str, delay: Duration) -> Source<TestConfig> {
        let counter = self.clone();
        Source::expr(move |_| {
            counter.0.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            Ok(Some(value.to_owned()))
        })
    }

    /// Source failing with [`TestError::Upstream`] and counting each
    /// evaluation.
    pub fn failing_source(&self) -> Source<TestConfig> {
        let counter = self.clone();
        Source::expr(move |_| {
            counter.0.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Upstream.into())
        })
    }
}

pub fn resolver(registry: Registry<TestConfig>) -> Resolver<TestConfig> {
    Resolver::new(Arc::new(registry), TestHost::default())
}

pub fn resolver_with(
    registry: Registry<TestConfig>,
    host: TestHost,
    options: ResolverOptions,
) -> Resolver<TestConfig> {
    Resolver::with_options(Arc::new(registry), host, options)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
