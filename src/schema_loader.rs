//! JSON Schema loading for snapshot documents.
//!
//! The bundled schema (`schema/catalog_snapshot.schema.json`) pins its
//! `schema_version` as a const; the loader extracts it so callers can check
//! a document's declared version against the schema they compiled.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Compiled snapshot schema plus the version it pins.
pub struct SnapshotSchema {
    path: PathBuf,
    version: String,
    compiled: JSONSchema,
}

impl SnapshotSchema {
    /// Load and compile a schema file.
    ///
    /// When `allowed_versions` is given the schema's pinned version must be a
    /// member.
    pub fn load(path: &Path, allowed_versions: Option<&BTreeSet<String>>) -> Result<Self> {
        let schema: Value = serde_json::from_reader(
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
        )
        .with_context(|| format!("parsing schema {}", path.display()))?;

        let version = extract_schema_version(&schema, "/properties/schema_version/const")
            .ok_or_else(|| anyhow!("schema {} missing schema_version const", path.display()))?;

        if let Some(allowed) = allowed_versions {
            if !allowed.contains(&version) {
                bail!(
                    "schema_version '{}' not in allowed set {:?}",
                    version,
                    allowed
                );
            }
        }

        let compiled = JSONSchema::compile(&schema)
            .map_err(|err| anyhow!("compiling schema {}: {err}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            version,
            compiled,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate a document, collecting every violation into one error.
    pub fn validate(&self, document: &Value) -> Result<()> {
        if let Err(errors) = self.compiled.validate(document) {
            let details = errors
                .map(|err| format!("{}: {err}", err.instance_path))
                .collect::<Vec<_>>()
                .join("\n");
            bail!(
                "document failed validation against {}:\n{}",
                self.path.display(),
                details
            );
        }
        Ok(())
    }
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}
