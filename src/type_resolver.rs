use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use crate::tags::parse_field_tag;

/// A field of an aggregate as reported by source inspection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldDescriptor {
    /// Published field name; empty for an embedded aggregate
    pub name: String,
    /// Type expression such as `int64`, `[]pkg.Item` or `map[string]pkg.Item`
    pub type_expr: String,
    /// Trailing field comment
    pub comment: Option<String>,
    /// Tag-derived extensions (`minimum`, `enum`, `required`, ...)
    pub extensions: IndexMap<String, Vec<String>>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: type_expr.into(),
            ..Self::default()
        }
    }

    /// An embedded (nameless) field whose own fields are flattened into the parent
    pub fn embedded(type_expr: impl Into<String>) -> Self {
        Self::new("", type_expr)
    }

    /// Build a field from its declared name and raw tag literal.
    ///
    /// Returns `None` when the tag marks the field as skipped.
    pub fn from_tag(name: &str, type_expr: &str, tag: &str) -> Option<Self> {
        let tag = parse_field_tag(tag);
        if tag.skip {
            debug!("Skipping field {} by tag", name);
            return None;
        }
        Some(Self {
            name: tag.rename.unwrap_or_else(|| name.to_string()),
            type_expr: type_expr.to_string(),
            comment: None,
            extensions: tag.extensions,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_extension<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.name.is_empty()
    }
}

/// A named aggregate (struct) type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDescriptor {
    /// Qualified name, e.g. `example.com/app/model.User`
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl AggregateDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Aggregate descriptors and type aliases known to one resolution pass
#[derive(Debug, Clone, Default)]
pub struct AggregateRegistry {
    aggregates: HashMap<String, AggregateDescriptor>,
    aliases: HashMap<String, String>,
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an aggregate, replacing any previous one with the same name
    pub fn insert(&mut self, aggregate: AggregateDescriptor) {
        debug!("Registering aggregate {}", aggregate.name);
        self.aggregates.insert(aggregate.name.clone(), aggregate);
    }

    /// Declare `name` as a transparent synonym of `target`
    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(name.into(), target.into());
    }

    pub fn get(&self, name: &str) -> Option<&AggregateDescriptor> {
        self.aggregates.get(name)
    }

    pub fn alias_target(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Fields of `name` with embedded aggregates expanded in place.
    ///
    /// The first field with a given name wins. Embedded types that are not
    /// registered aggregates are dropped, as are embedding cycles.
    pub fn flattened_fields(&self, name: &str) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        let mut names = HashSet::new();
        let mut expanding = HashSet::new();
        self.collect_fields(name, &mut fields, &mut names, &mut expanding);
        fields
    }

    fn collect_fields(
        &self,
        name: &str,
        fields: &mut Vec<FieldDescriptor>,
        names: &mut HashSet<String>,
        expanding: &mut HashSet<String>,
    ) {
        let Some(aggregate) = self.get(name) else {
            return;
        };
        if !expanding.insert(name.to_string()) {
            warn!("Embedding cycle through {}", name);
            return;
        }

        for field in &aggregate.fields {
            if field.is_embedded() {
                let embedded = self.follow_aliases(TypeExpr::parse(&field.type_expr).innermost());
                match embedded {
                    Some(embedded) if self.get(&embedded).is_some() => {
                        self.collect_fields(&embedded, fields, names, expanding);
                    }
                    _ => debug!("Dropping embedded non-aggregate {}", field.type_expr),
                }
            } else if names.insert(field.name.clone()) {
                fields.push(field.clone());
            } else {
                debug!("Field {}.{} shadowed by an earlier field", name, field.name);
            }
        }

        expanding.remove(name);
    }

    /// Follows alias hops from `name`; `None` on an alias cycle
    pub fn follow_aliases(&self, name: &str) -> Option<String> {
        let mut current = name;
        let mut seen = HashSet::new();
        while let Some(target) = self.alias_target(current) {
            if !seen.insert(current) {
                return None;
            }
            current = target;
        }
        Some(current.to_string())
    }
}

/// Structural reading of a type expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeExpr<'a> {
    /// `[]T`, `[N]T`, `Vec<T>` and the set types
    Array(&'a str),
    /// `map[K]V`, `HashMap<K, V>`, `BTreeMap<K, V>`, `IndexMap<K, V>`
    Map { key: &'a str, value: &'a str },
    /// `*T`, `Option<T>`, `Box<T>`, `Arc<T>`, `Rc<T>`
    Wrapped(&'a str),
    /// A primitive or aggregate name
    Named(&'a str),
}

const ARRAY_WRAPPERS: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "IndexSet"];
const MAP_WRAPPERS: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];
const TRANSPARENT_WRAPPERS: &[&str] = &["Option", "Box", "Arc", "Rc"];

impl<'a> TypeExpr<'a> {
    pub fn parse(expr: &'a str) -> Self {
        let expr = expr.trim();

        if let Some(element) = expr.strip_prefix("[]") {
            return TypeExpr::Array(element);
        }
        if let Some(rest) = expr.strip_prefix('[') {
            if let Some((len, element)) = rest.split_once(']') {
                if len.chars().all(|c| c.is_ascii_digit()) {
                    return TypeExpr::Array(element);
                }
            }
        }
        if let Some(rest) = expr.strip_prefix("map[") {
            if let Some(close) = matching_bracket(rest, '[', ']') {
                return TypeExpr::Map {
                    key: &rest[..close],
                    value: &rest[close + 1..],
                };
            }
        }
        if let Some(inner) = expr.strip_prefix('*') {
            return TypeExpr::Wrapped(inner);
        }
        if let Some(parsed) = Self::parse_generic(expr) {
            return parsed;
        }
        TypeExpr::Named(expr)
    }

    fn parse_generic(expr: &'a str) -> Option<Self> {
        let (base, rest) = expr.split_once('<')?;
        let args = rest.strip_suffix('>')?;
        let base = base.rsplit("::").next().unwrap_or(base).trim();
        let args = split_generic_args(args);

        match *args.as_slice() {
            [inner] if ARRAY_WRAPPERS.contains(&base) => Some(TypeExpr::Array(inner)),
            [inner] if TRANSPARENT_WRAPPERS.contains(&base) => Some(TypeExpr::Wrapped(inner)),
            [key, value] if MAP_WRAPPERS.contains(&base) => Some(TypeExpr::Map { key, value }),
            _ => None,
        }
    }

    /// The named type under any array, map and wrapper layers
    pub fn innermost(self) -> &'a str {
        match self {
            TypeExpr::Array(inner) | TypeExpr::Wrapped(inner) => TypeExpr::parse(inner).innermost(),
            TypeExpr::Map { value, .. } => TypeExpr::parse(value).innermost(),
            TypeExpr::Named(name) => name,
        }
    }
}

/// Index of the bracket closing an already-opened one
fn matching_bracket(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

/// Split generic arguments on top-level commas
fn split_generic_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[start..].trim());
    parts
}

/// The canonical primitive kinds of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Number,
    Boolean,
    String,
}

impl PrimitiveType {
    /// Map a source primitive name to its canonical kind.
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8"
            | "u16" | "u32" | "u64" | "u128" | "usize" | "integer" => PrimitiveType::Integer,
            "float32" | "float64" | "f32" | "f64" | "number" => PrimitiveType::Number,
            "bool" | "boolean" => PrimitiveType::Boolean,
            "string" | "String" | "str" | "char" => PrimitiveType::String,
            _ => return None,
        };
        Some(primitive)
    }

    /// Canonical kind for any expression; unknown names are strings
    pub fn of(expr: &str) -> Self {
        Self::from_name(expr.trim()).unwrap_or(PrimitiveType::String)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
        }
    }

    /// Refinement format for `name`, absent when it adds nothing
    pub fn format_of(&self, name: &str) -> Option<String> {
        if name == self.as_str() || matches!(name, "String" | "str") {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// Schema registry name of an aggregate: path separators become dots
pub fn canonical_name(name: &str) -> String {
    name.trim().replace('/', ".")
}

/// Last dotted segment of a canonical name, used as the XML element name
pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
