//! Typed annotation documents produced by the comment parser.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Position, Result};
use crate::grammar::ValueKind;

/// Key prefix for file-level annotations that apply to every route
pub const GLOBAL_PREFIX: &str = "@global.";

/// Ordered sub-key map of a composite annotation value
pub type ValueMap = IndexMap<String, AnnotationValue>;

/// A coerced annotation value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Json(serde_json::Value),
    List(Vec<String>),
    Map(ValueMap),
    MapList(Vec<ValueMap>),
    /// A value split by suffix bounds, such as `integer(int64)`
    Cut { primary: String, extra: String },
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            AnnotationValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_list(&self) -> Option<&[ValueMap]> {
        match self {
            AnnotationValue::MapList(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnnotationValue::List(list) => Some(list.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Str(s) => f.write_str(s),
            AnnotationValue::Bool(b) => write!(f, "{}", b),
            AnnotationValue::Int(n) => write!(f, "{}", n),
            AnnotationValue::Json(value) => write!(f, "{}", value),
            AnnotationValue::List(items) => f.write_str(&items.join(",")),
            AnnotationValue::Cut { primary, extra } => write!(f, "{}({})", primary, extra),
            AnnotationValue::Map(_) | AnnotationValue::MapList(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// Store `value` under `key`, accumulating according to the key's value kind.
///
/// Map lists append, maps merge sub-keys, everything else overwrites.
pub(crate) fn accumulate(map: &mut ValueMap, key: &str, kind: ValueKind, value: AnnotationValue) {
    match (kind, value) {
        (ValueKind::MapList, AnnotationValue::MapList(more)) => {
            if let Some(AnnotationValue::MapList(existing)) = map.get_mut(key) {
                existing.extend(more);
            } else {
                map.insert(key.to_string(), AnnotationValue::MapList(more));
            }
        }
        (ValueKind::Map, AnnotationValue::Map(more)) => {
            if let Some(AnnotationValue::Map(existing)) = map.get_mut(key) {
                existing.extend(more);
            } else {
                map.insert(key.to_string(), AnnotationValue::Map(more));
            }
        }
        (_, value) => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Annotations parsed from one comment block, keyed by top-level key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnnotationDocument {
    entries: ValueMap,
}

impl AnnotationDocument {
    pub(crate) fn from_entries(entries: ValueMap) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnnotationValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes declared by the `@router` entries of this document.
    ///
    /// Entries missing either `method` or `path` are ignored.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        let Some(routers) = self.get("@router").and_then(AnnotationValue::as_map_list) else {
            return Vec::new();
        };

        routers
            .iter()
            .filter_map(|router| {
                let method = router.get("method").and_then(AnnotationValue::as_str)?;
                let path = router.get("path").and_then(AnnotationValue::as_str)?;
                if method.is_empty() || path.is_empty() {
                    return None;
                }
                Some(RouteKey {
                    method: method.to_string(),
                    path: path.to_string(),
                })
            })
            .collect()
    }

    /// Type expressions named by `@body` and `@res` content entries, in order
    pub fn referenced_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        let mut push = |value: Option<&AnnotationValue>| {
            if let Some(content) = value.and_then(AnnotationValue::as_str) {
                if !content.is_empty() && !types.iter().any(|t| t == content) {
                    types.push(content.to_string());
                }
            }
        };

        if let Some(body) = self.get("@body").and_then(AnnotationValue::as_map) {
            push(body.get("content"));
        }
        if let Some(responses) = self.get("@res").and_then(AnnotationValue::as_map_list) {
            for response in responses {
                push(response.get("content"));
            }
        }

        types
    }

    /// Return a copy of this route document with the `@global.*` entries of
    /// `globals` merged in.
    ///
    /// Global map lists are appended after the route's own entries, global
    /// map sub-keys overwrite the route's, and absent keys are inserted.
    pub fn with_globals(&self, globals: &AnnotationDocument) -> AnnotationDocument {
        let mut entries = self.entries.clone();

        for (key, value) in globals.iter() {
            let Some(name) = key.strip_prefix(GLOBAL_PREFIX) else {
                continue;
            };
            let route_key = format!("@{}", name);
            debug!("Merging global {} into route document", route_key);

            match entries.get_mut(&route_key) {
                Some(AnnotationValue::MapList(own)) => {
                    if let AnnotationValue::MapList(shared) = value {
                        own.extend(shared.iter().cloned());
                    }
                }
                Some(AnnotationValue::Map(own)) => {
                    if let AnnotationValue::Map(shared) = value {
                        for (k, v) in shared {
                            own.insert(k.clone(), v.clone());
                        }
                    }
                }
                Some(_) => {}
                None => {
                    entries.insert(route_key, value.clone());
                }
            }
        }

        AnnotationDocument { entries }
    }
}

/// Method and path of one documented route
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteKey {
    pub method: String,
    pub path: String,
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.to_uppercase(), self.path)
    }
}

/// Route documents indexed by method and path
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: IndexMap<RouteKey, AnnotationDocument>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under each route its `@router` entries declare.
    ///
    /// Documents without a complete `@router` entry are not routes and are
    /// skipped. Returns the number of routes registered.
    pub fn insert(&mut self, document: AnnotationDocument, position: &Position) -> Result<usize> {
        let keys = document.route_keys();
        for key in &keys {
            if self.routes.contains_key(key) {
                return Err(Error::DuplicateRoute {
                    position: position.clone(),
                    method: key.method.clone(),
                    path: key.path.clone(),
                });
            }
        }

        for key in &keys {
            debug!("Registering route {}", key);
            self.routes.insert(key.clone(), document.clone());
        }
        Ok(keys.len())
    }

    pub fn get(&self, key: &RouteKey) -> Option<&AnnotationDocument> {
        self.routes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &AnnotationDocument)> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
