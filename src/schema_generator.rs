use indexmap::IndexMap;
use log::{debug, warn};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::type_resolver::{
    canonical_name, short_name, AggregateRegistry, FieldDescriptor, PrimitiveType, TypeExpr,
};

/// Prefix of every schema reference
pub const REF_PREFIX: &str = "#/components/schemas/";

/// Schema generator - resolves type expressions to schema nodes
///
/// Named aggregates are built once into the [`SchemaRegistry`] and referred to
/// by name, so self-referential and mutually referential types terminate.
pub struct SchemaGenerator {
    /// Aggregates and aliases reported by source inspection
    aggregates: AggregateRegistry,
    /// Finalized aggregate schemas, each name inserted once
    schemas: SchemaRegistry,
}

/// A resolved schema node
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub description: Option<String>,
    pub constraints: Constraints,
}

/// Shape of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Primitive {
        base: PrimitiveType,
        /// Original type name when it refines the base kind
        format: Option<String>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Object {
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
        xml_name: Option<String>,
    },
    /// Points at a Schema Registry entry by canonical name
    Reference { name: String },
}

/// Validation constraints carried by a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub example: Option<Value>,
    pub default: Option<Value>,
    pub enum_values: Vec<String>,
}

impl SchemaNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            description: None,
            constraints: Constraints::default(),
        }
    }

    pub fn primitive(base: PrimitiveType, format: Option<String>) -> Self {
        Self::new(NodeKind::Primitive { base, format })
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(NodeKind::Array {
            items: Box::new(items),
        })
    }

    pub fn object(properties: IndexMap<String, SchemaNode>) -> Self {
        Self::new(NodeKind::Object {
            properties,
            required: Vec::new(),
            xml_name: None,
        })
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Reference { name: name.into() })
    }

    /// Registry name this node refers to, if it is a reference
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Reference { name } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn required(&self) -> &[String] {
        match &self.kind {
            NodeKind::Object { required, .. } => required.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Serialize)]
struct XmlObject<'a> {
    name: &'a str,
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;

        match &self.kind {
            NodeKind::Reference { name } => {
                // siblings of $ref are ignored by readers
                map.serialize_entry("$ref", &format!("{}{}", REF_PREFIX, name))?;
                return map.end();
            }
            NodeKind::Primitive { base, format } => {
                map.serialize_entry("type", base.as_str())?;
                if let Some(format) = format {
                    map.serialize_entry("format", format)?;
                }
            }
            NodeKind::Array { items } => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
            }
            NodeKind::Object {
                properties,
                required,
                xml_name,
            } => {
                map.serialize_entry("type", "object")?;
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
                if !required.is_empty() {
                    map.serialize_entry("required", required)?;
                }
                if let Some(name) = xml_name {
                    map.serialize_entry("xml", &XmlObject { name: name.as_str() })?;
                }
            }
        }

        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }

        let c = &self.constraints;
        if let Some(v) = c.minimum {
            map.serialize_entry("minimum", &v)?;
        }
        if let Some(v) = c.maximum {
            map.serialize_entry("maximum", &v)?;
        }
        if let Some(v) = c.min_length {
            map.serialize_entry("minLength", &v)?;
        }
        if let Some(v) = c.max_length {
            map.serialize_entry("maxLength", &v)?;
        }
        if let Some(v) = c.min_items {
            map.serialize_entry("minItems", &v)?;
        }
        if let Some(v) = c.max_items {
            map.serialize_entry("maxItems", &v)?;
        }
        if let Some(v) = &c.example {
            map.serialize_entry("example", v)?;
        }
        if let Some(v) = &c.default {
            map.serialize_entry("default", v)?;
        }
        if !c.enum_values.is_empty() {
            map.serialize_entry("enum", &c.enum_values)?;
        }

        map.end()
    }
}

/// Canonical aggregate name → finalized object node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finalized schema; an existing entry is never replaced.
    ///
    /// Returns whether the node was inserted.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) -> bool {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return false;
        }
        self.schemas.insert(name, node);
        true
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Recursion counts along one resolution branch.
///
/// Entering an aggregate or substituting an alias yields a fresh copy, so
/// sibling branches never see each other's visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visited {
    counts: HashMap<String, usize>,
    /// Aliases already substituted on this branch
    aliases: HashSet<String>,
}

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Copy of this branch with `name` entered once more
    pub fn entered(&self, name: &str) -> Self {
        let mut branch = self.clone();
        *branch.counts.entry(name.to_string()).or_insert(0) += 1;
        branch
    }

    pub fn has_substituted(&self, alias: &str) -> bool {
        self.aliases.contains(alias)
    }

    /// Copy of this branch with `alias` marked as substituted
    pub fn substituted(&self, alias: &str) -> Self {
        let mut branch = self.clone();
        branch.aliases.insert(alias.to_string());
        branch
    }
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator over the given aggregates
    pub fn new(aggregates: AggregateRegistry) -> Self {
        debug!("Initializing SchemaGenerator with {} aggregates", aggregates.len());
        Self {
            aggregates,
            schemas: SchemaRegistry::new(),
        }
    }

    /// Resolve a top-level type expression.
    ///
    /// Never fails: unknown names become string nodes carrying the
    /// expression as their format.
    pub fn resolve(&mut self, type_expr: &str) -> SchemaNode {
        self.resolve_with(type_expr, &Visited::new())
    }

    /// Resolve `type_expr` on the branch described by `visited`.
    pub fn resolve_with(&mut self, type_expr: &str, visited: &Visited) -> SchemaNode {
        let type_expr = type_expr.trim();

        if visited.count(type_expr) > 0 {
            debug!("Recursive reference to {}, emitting $ref", type_expr);
            return SchemaNode::reference(canonical_name(type_expr));
        }

        if self.aggregates.alias_target(type_expr).is_some() {
            if visited.has_substituted(type_expr) {
                warn!("Alias {} contains itself, treating it as a string", type_expr);
                return SchemaNode::primitive(PrimitiveType::String, Some(type_expr.to_string()));
            }
            return match self.aggregates.follow_aliases(type_expr) {
                Some(target) => {
                    debug!("Alias {} resolves to {}", type_expr, target);
                    self.resolve_with(&target, &visited.substituted(type_expr))
                }
                None => {
                    warn!("Alias cycle through {}, treating it as a string", type_expr);
                    SchemaNode::primitive(PrimitiveType::String, Some(type_expr.to_string()))
                }
            };
        }

        match TypeExpr::parse(type_expr) {
            TypeExpr::Array(element) => SchemaNode::array(self.resolve_with(element, visited)),
            TypeExpr::Map { key, value } => {
                let mut properties = IndexMap::new();
                properties.insert(key.replace('/', "."), self.resolve_with(value, visited));
                SchemaNode::object(properties)
            }
            TypeExpr::Wrapped(inner) => self.resolve_with(inner, visited),
            TypeExpr::Named(name) => {
                if let Some(primitive) = PrimitiveType::from_name(name) {
                    return SchemaNode::primitive(primitive, primitive.format_of(name));
                }
                if self.aggregates.get(name).is_some() {
                    return self.resolve_aggregate(name, visited);
                }
                debug!("Unknown type {}, using string placeholder", name);
                SchemaNode::primitive(PrimitiveType::String, Some(name.to_string()))
            }
        }
    }

    fn resolve_aggregate(&mut self, name: &str, visited: &Visited) -> SchemaNode {
        let canonical = canonical_name(name);
        if self.schemas.contains(&canonical) {
            debug!("Schema for {} already exists", canonical);
            return SchemaNode::reference(canonical);
        }

        debug!("Generating object schema for: {}", canonical);
        let doc = self.aggregates.get(name).and_then(|a| a.doc.clone());
        let fields = self.aggregates.flattened_fields(name);
        let branch = visited.entered(name);

        let mut properties = IndexMap::new();
        let mut required = Vec::new();
        for field in fields {
            let mut node = self.resolve_with(&field.type_expr, &branch);
            if field.comment.is_some() {
                node.description = field.comment.clone();
            }
            if self.apply_extensions(&mut node, &field) {
                required.push(field.name.clone());
            }
            properties.insert(field.name, node);
        }

        let object = SchemaNode {
            kind: NodeKind::Object {
                properties,
                required,
                xml_name: Some(short_name(&canonical).to_string()),
            },
            description: doc,
            constraints: Constraints::default(),
        };
        self.schemas.insert(canonical.clone(), object);

        SchemaNode::reference(canonical)
    }

    /// Apply a field's tag extensions to its node; returns whether the field
    /// is required.
    fn apply_extensions(&self, node: &mut SchemaNode, field: &FieldDescriptor) -> bool {
        let mut required = false;
        let c = &mut node.constraints;

        for (name, values) in &field.extensions {
            let Some(first) = values.first().map(|v| v.trim()) else {
                continue;
            };
            match name.as_str() {
                "minimum" => c.minimum = parse_or_warn(field, name, first),
                "maximum" => c.maximum = parse_or_warn(field, name, first),
                "minLength" => c.min_length = parse_or_warn(field, name, first),
                "maxLength" => c.max_length = parse_or_warn(field, name, first),
                "minItems" => c.min_items = parse_or_warn(field, name, first),
                "maxItems" => c.max_items = parse_or_warn(field, name, first),
                "example" => c.example = Some(Value::String(first.to_string())),
                "default" => c.default = self.typed_default(field, first),
                "enum" => c.enum_values = values.clone(),
                "required" => required = first == "true",
                _ => debug!("Ignoring extension {} on field {}", name, field.name),
            }
        }

        required
    }

    /// Default value typed by the field's canonical primitive kind
    fn typed_default(&self, field: &FieldDescriptor, raw: &str) -> Option<Value> {
        let kind = match self.aggregates.follow_aliases(field.type_expr.trim()) {
            Some(target) => field_kind(&target),
            None => PrimitiveType::String,
        };
        match kind {
            PrimitiveType::Integer => parse_or_warn::<i64>(field, "default", raw).map(Value::from),
            PrimitiveType::Number => parse_or_warn::<f64>(field, "default", raw)
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            PrimitiveType::Boolean => parse_or_warn::<bool>(field, "default", raw).map(Value::Bool),
            PrimitiveType::String => Some(Value::String(raw.to_string())),
        }
    }

    /// Get all generated schemas
    pub fn get_schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn into_schemas(self) -> SchemaRegistry {
        self.schemas
    }
}

/// Canonical kind of a field type, looking through wrapper layers
fn field_kind(type_expr: &str) -> PrimitiveType {
    match TypeExpr::parse(type_expr) {
        TypeExpr::Wrapped(inner) => field_kind(inner),
        TypeExpr::Named(name) => PrimitiveType::of(name),
        _ => PrimitiveType::String,
    }
}

fn parse_or_warn<T: std::str::FromStr>(field: &FieldDescriptor, name: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Skipping {}={:?} on field {}: not a valid value", name, raw, field.name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_resolver::{AggregateDescriptor, FieldDescriptor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Helper function to create a generator from aggregate descriptors
    fn create_generator(aggregates: Vec<AggregateDescriptor>) -> SchemaGenerator {
        let mut registry = AggregateRegistry::new();
        for aggregate in aggregates {
            registry.insert(aggregate);
        }
        SchemaGenerator::new(registry)
    }

    fn foo() -> AggregateDescriptor {
        AggregateDescriptor::new(
            "pkg.Foo",
            vec![
                FieldDescriptor::new("id", "int64"),
                FieldDescriptor::new("label", "string"),
            ],
        )
    }

    fn property_names(node: &SchemaNode) -> Vec<&str> {
        node.properties()
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_primitive_types() {
        let mut generator = create_generator(vec![]);

        assert_eq!(
            generator.resolve("int64"),
            SchemaNode::primitive(PrimitiveType::Integer, Some("int64".to_string()))
        );
        assert_eq!(
            generator.resolve("float32"),
            SchemaNode::primitive(PrimitiveType::Number, Some("float32".to_string()))
        );
        assert_eq!(
            generator.resolve("String"),
            SchemaNode::primitive(PrimitiveType::String, None)
        );
        assert_eq!(
            generator.resolve("Option<u8>"),
            SchemaNode::primitive(PrimitiveType::Integer, Some("u8".to_string()))
        );
    }

    #[test]
    fn test_unknown_type_falls_back_to_string() {
        let mut generator = create_generator(vec![]);
        let node = generator.resolve("time.Time");
        assert_eq!(
            node,
            SchemaNode::primitive(PrimitiveType::String, Some("time.Time".to_string()))
        );
        assert!(generator.get_schemas().is_empty());
    }

    #[test]
    fn test_array_element_matches_named_resolution() {
        let mut generator = create_generator(vec![foo()]);

        let array = generator.resolve("[]pkg.Foo");
        let named = generator.resolve("pkg.Foo");
        match &array.kind {
            NodeKind::Array { items } => assert_eq!(**items, named),
            other => panic!("expected array, got {:?}", other),
        }

        let schema = generator.get_schemas().get("pkg.Foo").unwrap();
        assert_eq!(property_names(schema), vec!["id", "label"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut generator = create_generator(vec![foo()]);

        let first = generator.resolve("pkg.Foo");
        let second = generator.resolve("pkg.Foo");
        assert_eq!(first.reference_name(), Some("pkg.Foo"));
        assert_eq!(second, first);
        assert_eq!(generator.get_schemas().len(), 1);
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut generator = create_generator(vec![AggregateDescriptor::new(
            "pkg.Node",
            vec![
                FieldDescriptor::new("Value", "int"),
                FieldDescriptor::new("Next", "*pkg.Node"),
                FieldDescriptor::new("Children", "[]pkg.Node"),
            ],
        )]);

        let root = generator.resolve("pkg.Node");
        assert_eq!(root.reference_name(), Some("pkg.Node"));

        let node = generator.get_schemas().get("pkg.Node").unwrap();
        let properties = node.properties().unwrap();
        assert_eq!(properties["Next"].reference_name(), Some("pkg.Node"));
        match &properties["Children"].kind {
            NodeKind::Array { items } => assert_eq!(items.reference_name(), Some("pkg.Node")),
            other => panic!("expected array, got {:?}", other),
        }
        assert_eq!(generator.get_schemas().len(), 1);
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let mut generator = create_generator(vec![
            AggregateDescriptor::new("pkg.A", vec![FieldDescriptor::new("b", "pkg.B")]),
            AggregateDescriptor::new("pkg.B", vec![FieldDescriptor::new("a", "[]pkg.A")]),
        ]);

        generator.resolve("pkg.A");
        let schemas = generator.get_schemas();
        assert_eq!(schemas.len(), 2);
        // B finishes first since A is still being built
        let names: Vec<&str> = schemas.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["pkg.B", "pkg.A"]);
        assert_eq!(
            schemas.get("pkg.A").unwrap().properties().unwrap()["b"].reference_name(),
            Some("pkg.B")
        );
    }

    #[test]
    fn test_sibling_fields_resolve_independently() {
        let mut generator = create_generator(vec![
            foo(),
            AggregateDescriptor::new(
                "pkg.Pair",
                vec![
                    FieldDescriptor::new("X", "pkg.Foo"),
                    FieldDescriptor::new("Y", "pkg.Foo"),
                ],
            ),
        ]);

        generator.resolve("pkg.Pair");
        let schemas = generator.get_schemas();
        let pair = schemas.get("pkg.Pair").unwrap().properties().unwrap();
        assert_eq!(pair["X"].reference_name(), Some("pkg.Foo"));
        assert_eq!(pair["Y"].reference_name(), Some("pkg.Foo"));

        // Foo was fully expanded rather than capped as a recursive reference
        assert_eq!(property_names(schemas.get("pkg.Foo").unwrap()), vec!["id", "label"]);
        assert_eq!(schemas.len(), 2);
    }

    #[test]
    fn test_visited_is_copied_on_enter() {
        let root = Visited::new();
        let left = root.entered("pkg.Foo");
        let deeper = left.entered("pkg.Foo");

        assert_eq!(root.count("pkg.Foo"), 0);
        assert_eq!(left.count("pkg.Foo"), 1);
        assert_eq!(deeper.count("pkg.Foo"), 2);

        let aliased = left.substituted("pkg.Status");
        assert!(aliased.has_substituted("pkg.Status"));
        assert!(!left.has_substituted("pkg.Status"));
        assert_eq!(aliased.count("pkg.Foo"), 1);

        let mut generator = create_generator(vec![foo()]);
        let node = generator.resolve_with("pkg.Foo", &left);
        assert_eq!(node.reference_name(), Some("pkg.Foo"));
        assert!(generator.get_schemas().is_empty());
    }

    #[test]
    fn test_alias_substitution() {
        let mut registry = AggregateRegistry::new();
        registry.insert(foo());
        registry.alias("pkg.Status", "int32");
        registry.alias("pkg.FooAlias", "pkg.Foo");
        registry.alias("pkg.Ping", "pkg.Pong");
        registry.alias("pkg.Pong", "pkg.Ping");
        let mut generator = SchemaGenerator::new(registry);

        assert_eq!(
            generator.resolve("pkg.Status"),
            SchemaNode::primitive(PrimitiveType::Integer, Some("int32".to_string()))
        );
        assert_eq!(generator.resolve("[]pkg.FooAlias"), SchemaNode::array(SchemaNode::reference("pkg.Foo")));
        assert_eq!(
            generator.resolve("pkg.Ping"),
            SchemaNode::primitive(PrimitiveType::String, Some("pkg.Ping".to_string()))
        );
    }

    #[test]
    fn test_alias_containing_itself_terminates() {
        let mut registry = AggregateRegistry::new();
        registry.alias("pkg.List", "[]pkg.List");
        registry.alias("pkg.Tree", "map[string]pkg.Tree");
        registry.alias("pkg.Left", "[]pkg.Right");
        registry.alias("pkg.Right", "pkg.Left");
        let mut generator = SchemaGenerator::new(registry);

        assert_eq!(
            generator.resolve("pkg.List"),
            SchemaNode::array(SchemaNode::primitive(
                PrimitiveType::String,
                Some("pkg.List".to_string())
            ))
        );

        let tree = generator.resolve("pkg.Tree");
        assert_eq!(property_names(&tree), vec!["string"]);
        assert_eq!(
            tree.properties().unwrap()["string"],
            SchemaNode::primitive(PrimitiveType::String, Some("pkg.Tree".to_string()))
        );

        match &generator.resolve("pkg.Left").kind {
            NodeKind::Array { items } => assert_eq!(
                items.kind,
                NodeKind::Array {
                    items: Box::new(SchemaNode::primitive(
                        PrimitiveType::String,
                        Some("pkg.Right".to_string())
                    ))
                }
            ),
            other => panic!("expected array, got {:?}", other),
        }
        assert!(generator.get_schemas().is_empty());
    }

    #[test]
    fn test_alias_reused_by_sibling_fields() {
        let mut registry = AggregateRegistry::new();
        registry.alias("pkg.Codes", "[]int32");
        registry.insert(AggregateDescriptor::new(
            "pkg.Report",
            vec![
                FieldDescriptor::new("open", "pkg.Codes"),
                FieldDescriptor::new("closed", "map[string]pkg.Codes"),
            ],
        ));
        let mut generator = SchemaGenerator::new(registry);

        generator.resolve("pkg.Report");
        let report = generator.get_schemas().get("pkg.Report").unwrap();
        let codes = SchemaNode::array(SchemaNode::primitive(
            PrimitiveType::Integer,
            Some("int32".to_string()),
        ));
        assert_eq!(report.properties().unwrap()["open"], codes);
        assert_eq!(
            report.properties().unwrap()["closed"].properties().unwrap()["string"],
            codes
        );
    }

    #[test]
    fn test_map_becomes_single_property_object() {
        let mut generator = create_generator(vec![foo()]);
        let node = generator.resolve("map[example.com/app/pkg.Key]pkg.Foo");

        assert_eq!(property_names(&node), vec!["example.com.app.pkg.Key"]);
        assert_eq!(
            node.properties().unwrap()["example.com.app.pkg.Key"].reference_name(),
            Some("pkg.Foo")
        );
    }

    #[test]
    fn test_embedded_fields_are_flattened() {
        let mut generator = create_generator(vec![
            AggregateDescriptor::new(
                "pkg.Base",
                vec![
                    FieldDescriptor::new("id", "int64"),
                    FieldDescriptor::new("name", "int"),
                ],
            ),
            AggregateDescriptor::new(
                "pkg.User",
                vec![
                    FieldDescriptor::new("name", "string"),
                    FieldDescriptor::embedded("pkg.Base"),
                ],
            ),
        ]);

        generator.resolve("pkg.User");
        let user = generator.get_schemas().get("pkg.User").unwrap();
        assert_eq!(property_names(user), vec!["name", "id"]);
        assert_eq!(
            user.properties().unwrap()["name"],
            SchemaNode::primitive(PrimitiveType::String, None)
        );
        assert!(generator.get_schemas().get("pkg.Base").is_none());
    }

    #[test]
    fn test_field_extensions_and_required() {
        let mut generator = create_generator(vec![AggregateDescriptor::new(
            "pkg.Pet",
            vec![
                FieldDescriptor::new("age", "int")
                    .with_extension("minimum", ["1"])
                    .with_extension("maximum", ["oops"])
                    .with_extension("default", ["3"])
                    .with_extension("required", ["true"]),
                FieldDescriptor::new("name", "string")
                    .with_extension("minLength", ["2"])
                    .with_extension("example", ["doggie"])
                    .with_extension("required", ["false"]),
                FieldDescriptor::new("status", "string").with_extension("enum", ["available", "sold"]),
                FieldDescriptor::new("weight", "float64").with_extension("default", ["2.5"]),
                FieldDescriptor::new("tags", "[]string")
                    .with_extension("minItems", ["1"])
                    .with_extension("maxItems", ["5"]),
            ],
        )]);

        generator.resolve("pkg.Pet");
        let pet = generator.get_schemas().get("pkg.Pet").unwrap();
        let properties = pet.properties().unwrap();

        let age = &properties["age"].constraints;
        assert_eq!(age.minimum, Some(1.0));
        assert_eq!(age.maximum, None);
        assert_eq!(age.default, Some(json!(3)));

        let name = &properties["name"].constraints;
        assert_eq!(name.min_length, Some(2));
        assert_eq!(name.example, Some(json!("doggie")));

        assert_eq!(properties["status"].constraints.enum_values, vec!["available", "sold"]);
        assert_eq!(properties["weight"].constraints.default, Some(json!(2.5)));
        assert_eq!(properties["tags"].constraints.min_items, Some(1));
        assert_eq!(properties["tags"].constraints.max_items, Some(5));

        assert_eq!(pet.required(), &["age".to_string()]);
    }

    #[test]
    fn test_descriptions_and_xml_name() {
        let mut generator = create_generator(vec![AggregateDescriptor::new(
            "example.com/app/model.Order",
            vec![FieldDescriptor::new("id", "int64").with_comment("order id")],
        )
        .with_doc("An order for pets")]);

        let root = generator.resolve("example.com/app/model.Order");
        assert_eq!(root.reference_name(), Some("example.com.app.model.Order"));

        let order = generator.get_schemas().get("example.com.app.model.Order").unwrap();
        assert_eq!(order.description.as_deref(), Some("An order for pets"));
        assert_eq!(
            order.properties().unwrap()["id"].description.as_deref(),
            Some("order id")
        );
        match &order.kind {
            NodeKind::Object { xml_name, .. } => assert_eq!(xml_name.as_deref(), Some("Order")),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_schema_nodes() {
        let mut generator = create_generator(vec![AggregateDescriptor::new(
            "pkg.Tag",
            vec![
                FieldDescriptor::new("id", "int64").with_extension("required", ["true"]),
                FieldDescriptor::new("names", "[]string").with_comment("aliases"),
            ],
        )]);

        let root = generator.resolve("[]pkg.Tag");
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({"type": "array", "items": {"$ref": "#/components/schemas/pkg.Tag"}})
        );

        assert_eq!(
            serde_json::to_value(generator.get_schemas()).unwrap(),
            json!({
                "pkg.Tag": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer", "format": "int64"},
                        "names": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "aliases"
                        }
                    },
                    "required": ["id"],
                    "xml": {"name": "Tag"}
                }
            })
        );
    }

    #[test]
    fn test_registry_insert_once() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.insert("pkg.A", SchemaNode::object(IndexMap::new())));
        assert!(!registry.insert("pkg.A", SchemaNode::primitive(PrimitiveType::String, None)));
        assert!(registry.get("pkg.A").unwrap().properties().is_some());
    }
}
