//! Declarative template modules stored as TOML files.
//!
//! The dotted path `game_system.entities` resolves to
//! `<search path>/game_system/entities.toml`. A file declares its classes:
//!
//! ```toml
//! [classes.Pawn]
//! extends = "Replicable"
//!
//! [classes.Pawn.attributes]
//! health = 100
//! speed = 4.5
//! tags = ["not", "captured"]
//! ```

use super::source::{MemberKind, MemberValue, TemplateMember, TemplateSource};
use crate::error::TemplateError;
use crate::types::Value;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    classes: BTreeMap<String, SchemaMember>,
}

#[derive(Debug, Deserialize)]
struct SchemaMember {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    kind: SchemaKind,
    #[serde(default)]
    attributes: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SchemaKind {
    #[default]
    Class,
    Other,
}

/// Loads template modules from TOML schema files.
#[derive(Debug, Clone)]
pub struct SchemaTemplateSource {
    search_paths: Vec<PathBuf>,
}

impl SchemaTemplateSource {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// First existing schema file for `path`, in search path order.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative: PathBuf = path.split('.').collect::<PathBuf>().with_extension("toml");

        self.search_paths
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    fn parse(file: &Path, content: &str) -> Result<Vec<TemplateMember>, TemplateError> {
        let schema: SchemaFile = toml::from_str(content).map_err(|e| TemplateError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

        let members = schema
            .classes
            .into_iter()
            .map(|(name, member)| TemplateMember {
                name,
                kind: match member.kind {
                    SchemaKind::Class => MemberKind::Class,
                    SchemaKind::Other => MemberKind::Other,
                },
                extends: member.extends,
                attributes: member
                    .attributes
                    .into_iter()
                    .map(|(key, value)| (key, convert(value)))
                    .collect(),
            })
            .collect();

        Ok(members)
    }
}

fn convert(value: toml::Value) -> MemberValue {
    match value {
        toml::Value::Integer(i) => MemberValue::Scalar(Value::Int(i)),
        toml::Value::Boolean(b) => MemberValue::Scalar(Value::Bool(b)),
        toml::Value::Float(f) => MemberValue::Scalar(Value::Float(f)),
        toml::Value::String(s) => MemberValue::Scalar(Value::String(s)),
        _ => MemberValue::Complex,
    }
}

impl TemplateSource for SchemaTemplateSource {
    fn load(&self, path: &str) -> Result<Vec<TemplateMember>, TemplateError> {
        let file = self
            .resolve(path)
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))?;

        debug!("📄 Reading template schema {}", file.display());

        let content = std::fs::read_to_string(&file).map_err(|source| TemplateError::Io {
            path: file.clone(),
            source,
        })?;

        Self::parse(&file, &content)
    }
}
