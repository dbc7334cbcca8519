//! Extra key/value pairs merged into a record.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// One context entry. Serialization runs when the entry is inserted; a value
/// that cannot be turned into JSON is kept as `Unserializable` so the emitter
/// can degrade the record later instead of failing the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Json(Value),
    Unserializable {
        type_name: &'static str,
        reason: String,
    },
}

/// Ordered context map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: BTreeMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, replacing any previous entry.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        let entry = match serde_json::to_value(&value) {
            Ok(json) => ContextValue::Json(json),
            Err(e) => ContextValue::Unserializable {
                type_name: std::any::type_name::<T>(),
                reason: e.to_string(),
            },
        };
        self.entries.insert(key.into(), entry);
    }

    /// Builder form of [`Context::insert`].
    pub fn with<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: &Context) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k, ContextValue::Json(v)))
                .collect(),
        }
    }
}

/// Build a [`Context`] from `key => value` pairs.
///
/// ```
/// let ctx = elections_logs::context! { "module" => "main", "line" => 42 };
/// assert_eq!(ctx.len(), 2);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::logging::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::logging::Context::new();
        $( ctx.insert($key, $value); )+
        ctx
    }};
}
