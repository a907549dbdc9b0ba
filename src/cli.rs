use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::bundle::{Bundle, BundleBuilder};
use crate::grammar::{DOCUMENT_GRAMMAR, ROUTE_GRAMMAR};
use crate::manifest::Manifest;
use crate::parser::CommentParser;
use crate::schema_generator::SchemaGenerator;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

/// OpenAPI annotations - parse annotation comments and resolve their types into schemas
#[derive(Parser, Debug)]
#[command(name = "openapi-annotations")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the manifest listing comment blocks and aggregates
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest.exists() {
        anyhow::bail!("Manifest does not exist: {}", args.manifest.display());
    }

    if !args.manifest.is_file() {
        anyhow::bail!("Manifest is not a file: {}", args.manifest.display());
    }

    info!("Manifest: {}", args.manifest.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Parse every comment of `manifest` and resolve the types the routes need.
///
/// Each source file gets its own parse session, so uniqueness constraints
/// apply per file.
pub fn generate(manifest: &Manifest) -> Result<Bundle> {
    // Step 1: File-level document metadata
    let mut builder = BundleBuilder::new();
    if let Some(unit) = &manifest.document {
        info!("Parsing document annotations from {}", unit.file.display());
        let document = CommentParser::new(&DOCUMENT_GRAMMAR)
            .parse_block(&unit.comment_lines())
            .with_context(|| format!("Invalid document annotations in {}", unit.file.display()))?;
        debug!("Document has {} keys", document.len());
        builder = builder.with_document(document);
    }

    // Step 2: Aggregates and aliases
    let registry = manifest.registry();
    info!("Registered {} aggregates", registry.len());
    let mut schema_gen = SchemaGenerator::new(registry);

    // Step 3: Route comments, one parse session per file
    info!("Parsing {} route comments...", manifest.routes.len());
    let mut sessions: HashMap<&Path, CommentParser<'static>> = HashMap::new();
    for unit in &manifest.routes {
        let parser = sessions
            .entry(unit.file.as_path())
            .or_insert_with(|| CommentParser::new(&ROUTE_GRAMMAR));
        let position = unit.position();
        let document = parser
            .parse_block(&unit.comment_lines())
            .with_context(|| format!("Invalid route annotations in comment at {}", position))?;
        builder
            .add_route(document, &position, &mut schema_gen)
            .with_context(|| format!("Failed to register route comment at {}", position))?;
    }

    // Step 4: Extra roots
    for type_expr in &manifest.roots {
        builder.add_root(type_expr, &mut schema_gen);
    }

    info!("Collected {} routes", builder.route_count());
    Ok(builder.build(schema_gen))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Loading manifest...");
    let manifest = Manifest::load(&args.manifest)?;

    let bundle = generate(&manifest)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&bundle)?,
        OutputFormat::Json => serialize_json(&bundle)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Summary:");
    info!("  - Routes: {}", bundle.routes.len());
    info!("  - Root types: {}", bundle.roots.len());
    info!("  - Schemas: {}", bundle.schemas.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_cli_defaults() {
        let args = CliArgs::parse_from(["openapi-annotations", "manifest.yaml"]);
        assert_eq!(args.manifest, PathBuf::from("manifest.yaml"));
        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert!(args.output_path.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_cli_options() {
        let args = CliArgs::parse_from([
            "openapi-annotations",
            "m.json",
            "-f",
            "json",
            "-o",
            "out/bundle.json",
            "-v",
        ]);
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.output_path, Some(PathBuf::from("out/bundle.json")));
        assert!(args.verbose);
    }

    #[test]
    fn test_validation_rejects_missing_and_directory() {
        let missing = CliArgs::parse_from(["openapi-annotations", "no/such/manifest.yaml"]);
        assert!(parse_args_from_parsed(missing).is_err());

        let temp_dir = TempDir::new().unwrap();
        let dir = CliArgs::parse_from([
            OsStr::new("openapi-annotations"),
            temp_dir.path().as_os_str(),
        ]);
        let err = parse_args_from_parsed(dir).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_duplicate_route_across_files_fails() {
        let unit = |file: &str| crate::manifest::CommentUnit {
            file: PathBuf::from(file),
            line: 1,
            lines: vec!["@router: method=get; path=/a".to_string()],
        };
        let manifest = Manifest {
            routes: vec![unit("a.go")],
            ..Manifest::default()
        };
        assert!(generate(&manifest).is_ok());

        let manifest = Manifest {
            routes: vec![unit("a.go"), unit("b.go")],
            ..Manifest::default()
        };
        let err = generate(&manifest).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_route_parse_error_names_comment() {
        let manifest = Manifest {
            routes: vec![crate::manifest::CommentUnit {
                file: PathBuf::from("api/order.go"),
                line: 12,
                lines: vec![
                    "// @summary: Place order".to_string(),
                    "// @router: method=fetch; path=/order".to_string(),
                ],
            }],
            ..Manifest::default()
        };

        let err = generate(&manifest).unwrap_err();
        assert!(err.to_string().contains("api/order.go:12"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::EnumViolation { .. })
        ));
    }

    #[test]
    fn test_run_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest_path = temp_dir.path().join("manifest.yaml");
        fs::write(
            &manifest_path,
            "routes:\n  - file: a.go\n    lines: ['@router: method=get; path=/ping']\nroots: ['int64']\n",
        )
        .unwrap();
        let output_path = temp_dir.path().join("out").join("bundle.json");

        let args = CliArgs {
            manifest: manifest_path,
            output_format: OutputFormat::Json,
            output_path: Some(output_path.clone()),
            verbose: false,
        };
        run(args).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output_path).unwrap()).unwrap();
        assert_eq!(parsed["routes"][0]["path"], "/ping");
        assert_eq!(parsed["roots"]["int64"]["format"], "int64");
    }
}
