//! Input manifest for the command-line harness.
//!
//! A manifest lists what a source inspector would hand to the core: comment
//! blocks with their positions, and the aggregates and aliases found in the
//! code. YAML and JSON manifests are both accepted.
//!
//! ```yaml
//! document:
//!   file: api/doc.go
//!   lines:
//!     - "// @info.title: Swagger Petstore"
//! routes:
//!   - file: api/pet.go
//!     line: 12
//!     lines:
//!       - "// @router: method=get; path=/pet/{petId}"
//!       - "// @res: status=200; in=application/json; content=model.Pet; desc=ok"
//! aggregates:
//!   - name: model.Pet
//!     fields:
//!       - name: ID
//!         type: int64
//!         tag: 'json:"id" openapi:"required"'
//! aliases:
//!   model.Status: string
//! ```

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Position;
use crate::parser::CommentLine;
use crate::type_resolver::{AggregateDescriptor, AggregateRegistry, FieldDescriptor};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    /// File-level document metadata comment
    #[serde(default)]
    pub document: Option<CommentUnit>,
    /// Per-route comments
    #[serde(default)]
    pub routes: Vec<CommentUnit>,
    #[serde(default)]
    pub aggregates: Vec<AggregateEntry>,
    /// Alias name → aliased type expression
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    /// Extra type expressions to resolve besides those the routes reference
    #[serde(default)]
    pub roots: Vec<String>,
}

/// One comment block and where it starts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentUnit {
    pub file: PathBuf,
    /// 1-based line of the first comment line
    #[serde(default = "default_line")]
    pub line: usize,
    pub lines: Vec<String>,
}

fn default_line() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregateEntry {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldEntry {
    /// Declared field name; absent for an embedded aggregate
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Raw struct tag literal
    #[serde(default)]
    pub tag: Option<String>,
}

impl Manifest {
    /// Load a manifest from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading manifest: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        debug!(
            "Manifest has {} routes, {} aggregates, {} aliases",
            manifest.routes.len(),
            manifest.aggregates.len(),
            manifest.aliases.len()
        );
        Ok(manifest)
    }

    /// Build the aggregate registry the schema generator resolves against
    pub fn registry(&self) -> AggregateRegistry {
        let mut registry = AggregateRegistry::new();
        for entry in &self.aggregates {
            registry.insert(entry.descriptor());
        }
        for (name, target) in &self.aliases {
            registry.alias(name.as_str(), target.as_str());
        }
        registry
    }
}

impl CommentUnit {
    pub fn position(&self) -> Position {
        Position::new(&self.file, self.line)
    }

    /// Delimiter-stripped lines with their positions
    pub fn comment_lines(&self) -> Vec<CommentLine> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                CommentLine::new(
                    strip_comment_delimiters(text),
                    Position::new(&self.file, self.line + i),
                )
            })
            .collect()
    }
}

impl AggregateEntry {
    pub fn descriptor(&self) -> AggregateDescriptor {
        let fields = self.fields.iter().filter_map(FieldEntry::descriptor).collect();
        let mut aggregate = AggregateDescriptor::new(self.name.as_str(), fields);
        aggregate.doc = self.doc.clone();
        aggregate
    }
}

impl FieldEntry {
    /// `None` when the field's tag hides it
    pub fn descriptor(&self) -> Option<FieldDescriptor> {
        let mut field = match &self.tag {
            Some(tag) => FieldDescriptor::from_tag(&self.name, &self.type_expr, tag)?,
            None => FieldDescriptor::new(self.name.as_str(), self.type_expr.as_str()),
        };
        field.comment = self.comment.clone();
        Some(field)
    }
}

/// Strip `//`, `/*`, `*/` and a leading `*` from one comment line.
pub fn strip_comment_delimiters(line: &str) -> String {
    let trimmed = line.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("//") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest)
    } else if let Some(rest) = trimmed.strip_suffix("*/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix('*') {
        rest
    } else {
        return line.trim_end().to_string();
    };
    body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
document:
  file: api/doc.go
  lines:
    - "// @info.title: Petstore"
routes:
  - file: api/pet.go
    line: 40
    lines:
      - "// @summary: Find pet"
      - "//"
      - "// @router: method=get; path=/pet"
aggregates:
  - name: model.Pet
    doc: A pet
    fields:
      - name: ID
        type: int64
        tag: 'json:"id" openapi:"required"'
      - name: Secret
        type: string
        tag: 'json:"-"'
      - type: model.Base
      - name: Name
        type: string
        comment: pet name
aliases:
  model.Status: string
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        assert!(manifest.document.is_some());
        assert_eq!(manifest.routes.len(), 1);
        assert_eq!(manifest.routes[0].line, 40);
        assert_eq!(manifest.document.as_ref().unwrap().line, 1);
        assert!(manifest.roots.is_empty());
    }

    #[test]
    fn test_comment_lines_are_stripped_and_positioned() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let lines = manifest.routes[0].comment_lines();

        assert_eq!(lines[0].text, "@summary: Find pet");
        assert_eq!(lines[1].text, "");
        assert_eq!(lines[2].position, Position::new("api/pet.go", 42));
    }

    #[test]
    fn test_registry_applies_tags() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let registry = manifest.registry();

        let pet = registry.get("model.Pet").unwrap();
        let names: Vec<&str> = pet.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "", "Name"]);
        assert!(pet.fields[1].is_embedded());
        assert_eq!(pet.fields[2].comment.as_deref(), Some("pet name"));
        assert_eq!(pet.doc.as_deref(), Some("A pet"));
        assert_eq!(registry.alias_target("model.Status"), Some("string"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"roots": ["[]model.Pet"]}"#).unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.roots, vec!["[]model.Pet"]);
        assert!(manifest.routes.is_empty());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = Manifest::load(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }

    #[test]
    fn test_strip_comment_delimiters() {
        assert_eq!(strip_comment_delimiters("// @summary: x"), "@summary: x");
        assert_eq!(strip_comment_delimiters("//@summary: x"), "@summary: x");
        assert_eq!(strip_comment_delimiters("/* @tags: a */"), "@tags: a");
        assert_eq!(strip_comment_delimiters(" * line"), "line");
        assert_eq!(strip_comment_delimiters("//   indented"), "  indented");
        assert_eq!(strip_comment_delimiters("plain text  "), "plain text");
    }
}
