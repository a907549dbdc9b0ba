//! OpenAPI annotations - structured API metadata embedded in source comments.
//!
//! This library parses `@key: value` annotation comments against a declarative
//! grammar and resolves the type expressions those annotations name into
//! JSON-Schema-like nodes, registering every named aggregate it meets.
//!
//! # Architecture
//!
//! 1. [`grammar`] - Key paths and the rule describing each key's value
//! 2. [`coercer`] - Splits, validates and coerces one raw value per rule
//! 3. [`parser`] - Turns comment blocks into [`document::AnnotationDocument`]s
//! 4. [`document`] - Parsed documents, global merging and the route table
//! 5. [`tags`] - Field tag parsing (renames, skips, schema extensions)
//! 6. [`type_resolver`] - Type expressions, primitives and the aggregate registry
//! 7. [`schema_generator`] - Converts type expressions to schema nodes
//! 8. [`bundle`] - Collects routes and the schemas their content types need
//! 9. [`manifest`] and [`serializer`] - Input and output of the command-line tool
//!
//! # Example Usage
//!
//! ```
//! use openapi_annotations::{
//!     error::Position,
//!     grammar::ROUTE_GRAMMAR,
//!     parser::{CommentLine, CommentParser},
//!     schema_generator::SchemaGenerator,
//!     type_resolver::{AggregateDescriptor, AggregateRegistry, FieldDescriptor},
//! };
//!
//! let lines = vec![
//!     CommentLine::new("@summary: Find pet", Position::new("pet.go", 10)),
//!     CommentLine::new("@router: method=get; path=/pet/{id}", Position::new("pet.go", 11)),
//! ];
//! let document = CommentParser::new(&ROUTE_GRAMMAR).parse_block(&lines).unwrap();
//! assert_eq!(document.route_keys().len(), 1);
//!
//! let mut registry = AggregateRegistry::new();
//! registry.insert(AggregateDescriptor::new(
//!     "model.Pet",
//!     vec![FieldDescriptor::new("id", "int64")],
//! ));
//! let mut schema_gen = SchemaGenerator::new(registry);
//! let node = schema_gen.resolve("[]model.Pet");
//! assert!(schema_gen.get_schemas().contains("model.Pet"));
//! # let _ = node;
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module, which reads a
//! [`manifest::Manifest`] and writes the resulting [`bundle::Bundle`].

pub mod bundle;
pub mod cli;
pub mod coercer;
pub mod document;
pub mod error;
pub mod grammar;
pub mod manifest;
pub mod parser;
pub mod schema_generator;
pub mod serializer;
pub mod tags;
pub mod type_resolver;
