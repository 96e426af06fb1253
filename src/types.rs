use crate::{config::Config, error::ResolveError, method::ScopeOptions};
use core::fmt::Debug;
use indexmap::{IndexMap as _IndexMap, IndexSet as _IndexSet};
use rustc_hash::FxBuildHasher;
use std::collections::HashMap as _HashMap;

/// Result type produced by data methods of a concrete [`Config`].
pub trait Value: Clone + Debug + Send + Sync + 'static {
    /// Whether this value counts as a genuine result.
    ///
    /// Absent values are never cached and make the resolver move on to the
    /// next source.
    fn is_present(&self) -> bool;

    /// Member access used by [`Transform::Chain`](crate::method::Transform).
    ///
    /// Returns `None` when the value has no member called `name`.
    fn member(&self, name: &str) -> Option<Self> {
        let _ = name;
        None
    }
}

impl Value for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Value for bool {
    fn is_present(&self) -> bool {
        *self
    }
}

macro_rules! impl_value_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Value for $ty {
                fn is_present(&self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_value_for_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: Clone + Debug + Send + Sync + 'static> Value for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Value> Value for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Value::is_present)
    }

    fn member(&self, name: &str) -> Option<Self> {
        self.as_ref()?.member(name).map(Some)
    }
}

impl Value for serde_json::Value {
    fn is_present(&self) -> bool {
        use serde_json::Value as Json;
        match self {
            Json::Null | Json::Bool(false) => false,
            Json::String(s) => !s.is_empty(),
            Json::Array(items) => !items.is_empty(),
            Json::Object(fields) => !fields.is_empty(),
            Json::Bool(true) | Json::Number(_) => true,
        }
    }

    fn member(&self, name: &str) -> Option<Self> {
        use serde_json::Value as Json;
        match self {
            Json::Object(fields) => fields.get(name).cloned(),
            Json::Array(items) => items.get(name.parse::<usize>().ok()?).cloned(),
            _ => None,
        }
    }
}

/// Host type bound to a specific `Config`.
pub type HostOf<C> = <C as Config>::Host;
/// Value type produced by data methods bound to a specific `Config`.
pub type ValueOf<C> = <C as Config>::Value;
/// Scope query type bound to a specific `Config`.
pub type ScopeOf<C> = <C as Config>::Scope;
/// Scope options carrying the host-defined extras of a specific `Config`.
pub type ScopeOptionsOf<C> = ScopeOptions<<C as Config>::ScopeExtra>;
/// Source error type bound to a specific `Config`.
pub type ErrorOf<C> = <C as Config>::Error;
/// Outcome of resolving one data method.
pub type ResolveResult<C> = Result<Option<ValueOf<C>>, ResolveError<ErrorOf<C>>>;

pub(crate) type HashMap<K, V> = _HashMap<K, V, FxBuildHasher>;
/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
/// `IndexSet` type with fast hasher.
pub type IndexSet<T> = _IndexSet<T, FxBuildHasher>;
