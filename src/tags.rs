//! Struct field tag reading.
//!
//! A field tag such as `json:"id,omitempty" openapi:"required;minimum=1"`
//! decides the field's published name and carries the constraint extensions
//! the schema generator applies to the field's node.

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::grammar::{FLAG_VALUE, ITEM_SEPARATOR, LIST_SEPARATOR, PAIR_SEPARATOR};

/// Tag whose value is either a bare flag or a map of extensions
pub const EXTENSION_TAG: &str = "openapi";
/// Name marking a field as not published
pub const SKIP_NAME: &str = "-";

const RENAME_TAGS: &[&str] = &["xml", "json"];

static TAG_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)[ \t]*:[ \t]*"((?:[^"\\]|\\.)*)""#)
        .expect("tag pattern is valid")
});

/// The value of one `name:"value"` tag pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// `,`-separated items
    List(Vec<String>),
    /// `;`-separated `key=v1,v2` entries; bare keys map to `["true"]`
    Map(IndexMap<String, Vec<String>>),
}

/// What a field tag says about its field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    /// Name from the `json` or `xml` tag, `json` winning
    pub rename: Option<String>,
    pub skip: bool,
    pub extensions: IndexMap<String, Vec<String>>,
}

/// Reads every `name:"value"` pair of a tag literal, in order.
///
/// Surrounding backticks are ignored.
pub fn parse_tag_pairs(tag: &str) -> IndexMap<String, TagValue> {
    let tag = tag.trim().trim_matches('`');
    TAG_PAIR
        .captures_iter(tag)
        .map(|caps| (caps[1].to_string(), parse_tag_value(&caps[2])))
        .collect()
}

fn split_items(value: &str) -> Vec<String> {
    value
        .split(ITEM_SEPARATOR)
        .map(|item| item.trim().to_string())
        .collect()
}

fn parse_tag_value(value: &str) -> TagValue {
    if !value.contains(LIST_SEPARATOR) {
        return TagValue::List(split_items(value));
    }

    let mut map = IndexMap::new();
    for entry in value.split(LIST_SEPARATOR) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once(PAIR_SEPARATOR) {
            Some((key, rest)) => {
                map.insert(key.trim().to_string(), split_items(rest.trim()));
            }
            None => {
                map.insert(entry.to_string(), vec![FLAG_VALUE.to_string()]);
            }
        }
    }
    TagValue::Map(map)
}

/// Interprets a raw field tag.
///
/// # Example
///
/// ```
/// use openapi_annotations::tags::parse_field_tag;
///
/// let tag = parse_field_tag(r#"json:"id" openapi:"required;minimum=1""#);
/// assert_eq!(tag.rename.as_deref(), Some("id"));
/// assert_eq!(tag.extensions["minimum"], vec!["1"]);
/// ```
pub fn parse_field_tag(tag: &str) -> FieldTag {
    let mut pairs = parse_tag_pairs(tag);
    let mut field = FieldTag::default();

    for name in RENAME_TAGS {
        if let Some(TagValue::List(items)) = pairs.shift_remove(*name) {
            match items.first().map(String::as_str) {
                Some(SKIP_NAME) => field.skip = true,
                Some(head) if !head.is_empty() => field.rename = Some(head.to_string()),
                _ => {}
            }
        }
    }

    match pairs.shift_remove(EXTENSION_TAG) {
        Some(TagValue::List(items)) => {
            let joined = items.join(&ITEM_SEPARATOR.to_string());
            match joined.split_once(PAIR_SEPARATOR) {
                Some((key, rest)) => {
                    field
                        .extensions
                        .insert(key.trim().to_string(), split_items(rest.trim()));
                }
                None => {
                    if let Some(flag) = items.into_iter().next().filter(|flag| !flag.is_empty()) {
                        field.extensions.insert(flag, vec![FLAG_VALUE.to_string()]);
                    }
                }
            }
        }
        Some(TagValue::Map(map)) => field.extensions.extend(map),
        None => {}
    }

    for (name, value) in pairs {
        match value {
            TagValue::List(items) if !items.is_empty() => {
                field.extensions.insert(name, items);
            }
            _ => debug!("Ignoring map-valued tag {}", name),
        }
    }

    field
}
