//! Declarative grammar for annotation keys.
//!
//! A [`GrammarTable`] maps key paths such as `@res` or `@res._.status` to the
//! [`GrammarEntry`] describing how that key's raw text is split, validated and
//! coerced. Composite entries declare their children with two conventions:
//!
//! - `parent._.<name>` for a named sub-key of a map item (`@param._.in`)
//! - `parent._` for a generic rule applied to every sub-key (`@security._`)
//!
//! Two tables are built once at startup: [`DOCUMENT_GRAMMAR`] for file-level
//! document metadata, and [`ROUTE_GRAMMAR`] for per-route comments.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Separator between list items of a composite value
pub const LIST_SEPARATOR: char = ';';
/// Separator between a sub-key and its value
pub const PAIR_SEPARATOR: char = '=';
/// Separator between items of a nested list
pub const ITEM_SEPARATOR: char = ',';
/// Value stored for a bare flag item
pub const FLAG_VALUE: &str = "true";

const MEDIA_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
];

/// The shape a key's value is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    String,
    Bool,
    Integer,
    Json,
    StringList,
    Map,
    MapList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Json => "json",
            ValueKind::StringList => "list",
            ValueKind::Map => "map",
            ValueKind::MapList => "map list",
        };
        f.write_str(name)
    }
}

/// Parsing and validation rule for one annotation key
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarEntry {
    pub kind: ValueKind,
    pub list_separator: Option<char>,
    pub pair_separator: Option<char>,
    pub allowed_values: Option<Vec<String>>,
    pub unique: bool,
    /// `(open, close)` splitting `integer(int64)` into `integer` and `int64`
    pub suffix_bounds: Option<(char, char)>,
}

impl GrammarEntry {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            list_separator: None,
            pair_separator: None,
            allowed_values: None,
            unique: false,
            suffix_bounds: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ValueKind::String)
    }

    pub fn bool() -> Self {
        Self::new(ValueKind::Bool)
    }

    pub fn integer() -> Self {
        Self::new(ValueKind::Integer)
    }

    pub fn json() -> Self {
        Self::new(ValueKind::Json)
    }

    pub fn list(separator: char) -> Self {
        Self::new(ValueKind::StringList).list_separator(separator)
    }

    /// A map of `key=value` items separated by `;`
    pub fn map() -> Self {
        Self::new(ValueKind::Map)
            .list_separator(LIST_SEPARATOR)
            .pair_separator(PAIR_SEPARATOR)
    }

    /// A map of bare flag items separated by `;`
    pub fn flags() -> Self {
        Self::new(ValueKind::Map).list_separator(LIST_SEPARATOR)
    }

    /// A repeatable map of `key=value` items; each occurrence adds one map
    pub fn map_list() -> Self {
        Self::new(ValueKind::MapList)
            .list_separator(LIST_SEPARATOR)
            .pair_separator(PAIR_SEPARATOR)
    }

    pub fn list_separator(mut self, separator: char) -> Self {
        self.list_separator = Some(separator);
        self
    }

    pub fn pair_separator(mut self, separator: char) -> Self {
        self.pair_separator = Some(separator);
        self
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn suffix_bounds(mut self, open: char, close: char) -> Self {
        self.suffix_bounds = Some((open, close));
        self
    }

    /// Whether `value` belongs to the closed set, if one is declared
    pub fn permits(&self, value: &str) -> bool {
        match &self.allowed_values {
            Some(allowed) => allowed.iter().any(|v| v == value),
            None => true,
        }
    }
}

/// Immutable lookup from key path to [`GrammarEntry`]
#[derive(Debug, Clone, Default)]
pub struct GrammarTable {
    entries: HashMap<String, GrammarEntry>,
}

impl GrammarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous rule for the same path
    pub fn with(mut self, path: impl Into<String>, entry: GrammarEntry) -> Self {
        self.entries.insert(path.into(), entry);
        self
    }

    pub fn get(&self, path: &str) -> Option<&GrammarEntry> {
        self.entries.get(path)
    }

    /// Look up a key that may start a comment line.
    ///
    /// Child paths (anything containing a `._` segment) never match here.
    pub fn title(&self, key: &str) -> Option<&GrammarEntry> {
        if Self::is_child_path(key) {
            return None;
        }
        self.get(key)
    }

    /// Find the rule for `sub_key` inside the composite at `parent`.
    ///
    /// The named form `parent._.sub_key` wins over the generic `parent._`.
    /// Returns the matched path with its entry.
    pub fn child(&self, parent: &str, sub_key: &str) -> Option<(String, &GrammarEntry)> {
        let named = format!("{}._.{}", parent, sub_key);
        if let Some(entry) = self.entries.get(&named) {
            return Some((named, entry));
        }
        let generic = format!("{}._", parent);
        self.entries.get(&generic).map(|entry| (generic, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_child_path(key: &str) -> bool {
        key.ends_with("._") || key.contains("._.")
    }
}

/// Grammar for per-route comments
pub static ROUTE_GRAMMAR: Lazy<GrammarTable> = Lazy::new(route_grammar);

/// Grammar for file-level document metadata comments
pub static DOCUMENT_GRAMMAR: Lazy<GrammarTable> = Lazy::new(document_grammar);

fn route_entries() -> Vec<(&'static str, GrammarEntry)> {
    vec![
        ("@summary", GrammarEntry::string()),
        ("@description", GrammarEntry::string()),
        ("@tags", GrammarEntry::flags()),
        // param
        ("@param", GrammarEntry::map_list().allowed(["required"])),
        (
            "@param._.in",
            GrammarEntry::string().allowed(["query", "header", "path", "cookie"]),
        ),
        ("@param._.name", GrammarEntry::string()),
        ("@param._.type", GrammarEntry::string().suffix_bounds('(', ')')),
        ("@param._.required", GrammarEntry::bool()),
        ("@param._.desc", GrammarEntry::string()),
        ("@param._.minimum", GrammarEntry::integer()),
        ("@param._.maximum", GrammarEntry::integer()),
        ("@param._.minLength", GrammarEntry::integer()),
        ("@param._.maxLength", GrammarEntry::integer()),
        ("@param._.example", GrammarEntry::string()),
        ("@param._.default", GrammarEntry::string()),
        ("@param._.enum", GrammarEntry::list(ITEM_SEPARATOR)),
        // body
        ("@body", GrammarEntry::map()),
        (
            "@body._.in",
            GrammarEntry::list(ITEM_SEPARATOR).allowed(MEDIA_TYPES.iter().copied()),
        ),
        ("@body._.content", GrammarEntry::string()),
        ("@body._.desc", GrammarEntry::string()),
        // res
        ("@res", GrammarEntry::map_list()),
        ("@res._.status", GrammarEntry::integer()),
        (
            "@res._.in",
            GrammarEntry::list(ITEM_SEPARATOR).allowed(["application/json", "application/xml"]),
        ),
        ("@res._.content", GrammarEntry::string()),
        ("@res._.desc", GrammarEntry::string()),
        // security
        ("@security", GrammarEntry::map()),
        ("@security._", GrammarEntry::list(ITEM_SEPARATOR)),
        // router
        ("@router", GrammarEntry::map_list()),
        (
            "@router._.method",
            GrammarEntry::string().allowed([
                "get", "put", "post", "delete", "options", "head", "patch", "trace",
            ]),
        ),
        ("@router._.path", GrammarEntry::string()),
    ]
}

fn route_grammar() -> GrammarTable {
    route_entries()
        .into_iter()
        .fold(GrammarTable::new(), |table, (path, entry)| table.with(path, entry))
}

fn document_grammar() -> GrammarTable {
    let table = GrammarTable::new()
        // info
        .with("@info.title", GrammarEntry::string())
        .with("@info.description", GrammarEntry::string())
        .with("@info.termsOfService", GrammarEntry::string())
        .with("@info.contact.name", GrammarEntry::string())
        .with("@info.contact.url", GrammarEntry::string())
        .with("@info.contact.email", GrammarEntry::string())
        .with("@info.license.name", GrammarEntry::string())
        .with("@info.license.url", GrammarEntry::string())
        .with("@info.version", GrammarEntry::string())
        // externalDocs
        .with("@externalDocs.description", GrammarEntry::string())
        .with("@externalDocs.url", GrammarEntry::string())
        // servers
        .with("@servers", GrammarEntry::map_list())
        .with("@servers._.url", GrammarEntry::string())
        .with("@servers._.description", GrammarEntry::string())
        // tags
        .with("@tags", GrammarEntry::map_list())
        .with("@tags._.name", GrammarEntry::string())
        .with("@tags._.description", GrammarEntry::string())
        // components
        .with("@components.securitySchemes", GrammarEntry::map_list())
        .with(
            "@components.securitySchemes._.field",
            GrammarEntry::string().unique(),
        )
        .with(
            "@components.securitySchemes._.type",
            GrammarEntry::string().allowed(["apiKey", "http", "oauth2"]),
        )
        .with("@components.securitySchemes._.scheme", GrammarEntry::string())
        .with(
            "@components.securitySchemes._.bearerFormat",
            GrammarEntry::string(),
        )
        .with("@components.securitySchemes._.name", GrammarEntry::string())
        .with(
            "@components.securitySchemes._.in",
            GrammarEntry::string().allowed(["query", "header", "cookie"]),
        )
        .with("@components.securitySchemes._.flows", GrammarEntry::json());

    // global responses and parameters reuse the route rules under an @global. prefix
    route_entries()
        .into_iter()
        .filter(|(path, _)| path.starts_with("@res") || path.starts_with("@param"))
        .fold(table, |table, (path, entry)| {
            table.with(format!("@global.{}", &path[1..]), entry)
        })
}
