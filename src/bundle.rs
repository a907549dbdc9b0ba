use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::document::{AnnotationDocument, RouteTable};
use crate::error::{Position, Result};
use crate::schema_generator::{SchemaGenerator, SchemaNode, SchemaRegistry};

/// Collects parsed route documents and the schemas their content types need
pub struct BundleBuilder {
    /// File-level document, whose `@global.*` entries apply to every route
    document: Option<AnnotationDocument>,
    routes: RouteTable,
    /// Resolved node per top-level type expression
    roots: IndexMap<String, SchemaNode>,
}

/// Everything the core produced for one manifest
#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<AnnotationDocument>,
    pub routes: Vec<RouteEntry>,
    pub roots: IndexMap<String, SchemaNode>,
    pub schemas: SchemaRegistry,
}

/// One documented route with its merged annotations
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    pub annotations: AnnotationDocument,
}

impl BundleBuilder {
    pub fn new() -> Self {
        debug!("Initializing BundleBuilder");
        Self {
            document: None,
            routes: RouteTable::new(),
            roots: IndexMap::new(),
        }
    }

    /// Attach the file-level document
    pub fn with_document(mut self, document: AnnotationDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Add a parsed route comment.
    ///
    /// Globals are merged in first, then the content types the route's body
    /// and responses name are resolved. Returns the number of routes the
    /// document declares; zero means it was not a route comment.
    pub fn add_route(
        &mut self,
        document: AnnotationDocument,
        position: &Position,
        schema_gen: &mut SchemaGenerator,
    ) -> Result<usize> {
        let document = match &self.document {
            Some(globals) => document.with_globals(globals),
            None => document,
        };
        let referenced = document.referenced_types();

        let added = self.routes.insert(document, position)?;
        if added == 0 {
            debug!("Comment at {} declares no route", position);
            return Ok(0);
        }

        for type_expr in referenced {
            self.add_root(&type_expr, schema_gen);
        }
        Ok(added)
    }

    /// Resolve a top-level type expression once
    pub fn add_root(&mut self, type_expr: &str, schema_gen: &mut SchemaGenerator) {
        if self.roots.contains_key(type_expr) {
            return;
        }
        debug!("Resolving root type {}", type_expr);
        let node = schema_gen.resolve(type_expr);
        self.roots.insert(type_expr.to_string(), node);
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Build the bundle, taking the generator's finished schemas
    pub fn build(self, schema_gen: SchemaGenerator) -> Bundle {
        let routes = self
            .routes
            .iter()
            .map(|(key, document)| RouteEntry {
                method: key.method.clone(),
                path: key.path.clone(),
                annotations: document.clone(),
            })
            .collect();

        Bundle {
            document: self.document,
            routes,
            roots: self.roots,
            schemas: schema_gen.into_schemas(),
        }
    }
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
