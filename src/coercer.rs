//! Coercion of raw annotation text into typed [`AnnotationValue`]s.
//!
//! The coercer is driven entirely by the [`GrammarTable`]: the entry found for a
//! key decides how its text is split, which sub-keys are accepted and what type
//! each piece becomes. Composite values recurse into child entries.

use log::debug;
use std::collections::HashMap;

use crate::document::{accumulate, AnnotationValue, ValueMap};
use crate::error::{Error, Position, Result};
use crate::grammar::{GrammarEntry, GrammarTable, ValueKind, FLAG_VALUE};

/// Converts raw annotation text into typed values for one parse session.
///
/// The coercer owns the session's uniqueness set, so two coercers never see
/// each other's values.
pub struct ValueCoercer<'g> {
    grammar: &'g GrammarTable,
    /// Fingerprint of every unique (key, value) pair seen so far
    seen: HashMap<String, Position>,
}

impl<'g> ValueCoercer<'g> {
    pub fn new(grammar: &'g GrammarTable) -> Self {
        Self {
            grammar,
            seen: HashMap::new(),
        }
    }

    pub fn grammar(&self) -> &'g GrammarTable {
        self.grammar
    }

    /// Coerce `raw` according to the grammar entry at `path`.
    ///
    /// # Errors
    ///
    /// Returns a validation error positioned at `position` when the text does
    /// not fit the entry, or when a unique value repeats within the session.
    /// An unknown `path` coerces to a plain string.
    pub fn coerce(&mut self, path: &str, raw: &str, position: &Position) -> Result<AnnotationValue> {
        let Some(entry) = self.grammar.get(path) else {
            debug!("No grammar entry for {}, keeping raw text", path);
            return Ok(AnnotationValue::Str(raw.to_string()));
        };
        let raw = raw.trim();

        let value = match entry.kind {
            ValueKind::String => Self::coerce_string(path, raw, entry, position)?,
            ValueKind::Integer => Self::coerce_integer(path, raw, entry, position)?,
            ValueKind::Bool => Self::coerce_bool(path, raw, entry, position)?,
            ValueKind::Json => Self::coerce_json(path, raw, position)?,
            ValueKind::StringList => Self::coerce_list(path, raw, entry, position)?,
            ValueKind::Map | ValueKind::MapList => {
                let map = self.coerce_map(path, raw, entry, position)?;
                if entry.kind == ValueKind::Map {
                    AnnotationValue::Map(map)
                } else if map.is_empty() {
                    AnnotationValue::MapList(Vec::new())
                } else {
                    AnnotationValue::MapList(vec![map])
                }
            }
        };

        if entry.unique {
            self.check_unique(path, raw, position)?;
        }

        Ok(value)
    }

    fn check_unique(&mut self, path: &str, value: &str, position: &Position) -> Result<()> {
        let fingerprint = format!("{}\u{0}{}", path, value);
        if let Some(first) = self.seen.get(&fingerprint) {
            return Err(Error::Duplicate {
                key: path.to_string(),
                value: value.to_string(),
                first: first.clone(),
                second: position.clone(),
            });
        }
        self.seen.insert(fingerprint, position.clone());
        Ok(())
    }

    fn check_allowed(path: &str, value: &str, entry: &GrammarEntry, position: &Position) -> Result<()> {
        if entry.permits(value) {
            return Ok(());
        }
        Err(Error::EnumViolation {
            position: position.clone(),
            key: path.to_string(),
            value: value.to_string(),
            allowed: entry.allowed_values.clone().unwrap_or_default(),
        })
    }

    fn coerce_string(
        path: &str,
        raw: &str,
        entry: &GrammarEntry,
        position: &Position,
    ) -> Result<AnnotationValue> {
        if let Some((open, close)) = entry.suffix_bounds {
            if let Some((primary, extra)) = split_suffix(raw, open, close) {
                Self::check_allowed(path, primary, entry, position)?;
                return Ok(AnnotationValue::Cut {
                    primary: primary.to_string(),
                    extra: extra.to_string(),
                });
            }
        }

        Self::check_allowed(path, raw, entry, position)?;
        Ok(AnnotationValue::Str(raw.to_string()))
    }

    fn coerce_integer(
        path: &str,
        raw: &str,
        entry: &GrammarEntry,
        position: &Position,
    ) -> Result<AnnotationValue> {
        Self::check_allowed(path, raw, entry, position)?;
        raw.parse::<i64>()
            .map(AnnotationValue::Int)
            .map_err(|_| Error::Type {
                position: position.clone(),
                key: path.to_string(),
                value: raw.to_string(),
                expected: ValueKind::Integer,
            })
    }

    fn coerce_bool(
        path: &str,
        raw: &str,
        entry: &GrammarEntry,
        position: &Position,
    ) -> Result<AnnotationValue> {
        Self::check_allowed(path, raw, entry, position)?;
        match raw {
            "true" => Ok(AnnotationValue::Bool(true)),
            "false" => Ok(AnnotationValue::Bool(false)),
            _ => Err(Error::Type {
                position: position.clone(),
                key: path.to_string(),
                value: raw.to_string(),
                expected: ValueKind::Bool,
            }),
        }
    }

    fn coerce_json(path: &str, raw: &str, position: &Position) -> Result<AnnotationValue> {
        serde_json::from_str(raw)
            .map(AnnotationValue::Json)
            .map_err(|e| Error::Parse {
                position: position.clone(),
                key: path.to_string(),
                message: e.to_string(),
            })
    }

    fn coerce_list(
        path: &str,
        raw: &str,
        entry: &GrammarEntry,
        position: &Position,
    ) -> Result<AnnotationValue> {
        let items: Vec<String> = match entry.list_separator {
            Some(separator) => raw.split(separator).map(|s| s.trim().to_string()).collect(),
            None => vec![raw.to_string()],
        };

        if entry.allowed_values.is_some() {
            for item in &items {
                Self::check_allowed(path, item, entry, position)?;
            }
        }

        Ok(AnnotationValue::List(items))
    }

    /// Split a composite value into its working map.
    ///
    /// Items without a pair separator are flags stored as the string `true`.
    /// Items whose sub-key has no grammar rule are glued back onto the last
    /// recognized sub-key's value, separator included, or dropped when no
    /// sub-key has been recognized yet.
    fn coerce_map(
        &mut self,
        path: &str,
        raw: &str,
        entry: &GrammarEntry,
        position: &Position,
    ) -> Result<ValueMap> {
        let items: Vec<&str> = match entry.list_separator {
            Some(separator) => raw.split(separator).collect(),
            None => vec![raw],
        };
        let separator = entry.list_separator.map(String::from).unwrap_or_default();

        let mut map = ValueMap::new();
        let mut last_key: Option<String> = None;

        for item in items {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                continue;
            }

            let pair = entry
                .pair_separator
                .and_then(|pair_separator| trimmed.split_once(pair_separator));

            let Some((sub_key, sub_value)) = pair else {
                Self::check_allowed(path, trimmed, entry, position)?;
                map.insert(trimmed.to_string(), AnnotationValue::Str(FLAG_VALUE.to_string()));
                continue;
            };

            let sub_key = sub_key.trim();
            match self.grammar.child(path, sub_key) {
                Some((child_path, child)) => {
                    let kind = child.kind;
                    let value = self.coerce(&child_path, sub_value, position)?;
                    accumulate(&mut map, sub_key, kind, value);
                    last_key = Some(sub_key.to_string());
                }
                None => {
                    let Some(previous) = last_key.as_deref() else {
                        debug!("Dropping {:?} from {}: no earlier sub-key to continue", item, path);
                        continue;
                    };
                    debug!("Continuing {}.{} with {:?}", path, previous, item);
                    let continued = match map.get(previous) {
                        Some(value) => format!("{}{}{}", value, separator, item),
                        None => item.to_string(),
                    };
                    map.insert(previous.to_string(), AnnotationValue::Str(continued));
                }
            }
        }

        Ok(map)
    }
}

/// Split `head<open>tail<close>` into `(head, tail)`.
///
/// The head ends at the first `open`; the text must end with `close`.
fn split_suffix(raw: &str, open: char, close: char) -> Option<(&str, &str)> {
    let (head, rest) = raw.split_once(open)?;
    let tail = rest.strip_suffix(close)?;
    Some((head, tail))
}
