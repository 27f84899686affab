//! Template composition engine.
//!
//! Template modules declare reusable classes whose class-level scalar values
//! become attribute defaults. Each object attaches an ordered list of
//! modules; the active classes across those modules are composed into one
//! resolved default set every pass.
//!
//! * [`source`] - how a dotted module path becomes a list of members
//! * [`schema`] - TOML schema files as a module source
//! * [`cache`] - process-wide arena of imported modules
//! * [`module`] - per-object module descriptors and class discovery
//! * [`compose`] - merging active defaults with designer overrides

pub mod cache;
pub mod compose;
pub mod module;
pub mod schema;
pub mod source;

pub use cache::TemplateCache;
pub use compose::{active_template_names, compose, ResolvedTemplateDefault};
pub use module::{discover, AttributeDefault, TemplateClass, TemplateModule};
pub use schema::SchemaTemplateSource;
pub use source::{LayeredSource, MemberKind, MemberValue, RegisteredTemplates, TemplateMember, TemplateSource};

use serde::{Deserialize, Serialize};

/// A module every networked object carries, with the classes it must keep
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinModule {
    pub path: String,
    #[serde(default)]
    pub required: Vec<String>,
}

impl BuiltinModule {
    pub fn new(path: impl Into<String>, required: &[&str]) -> Self {
        Self {
            path: path.into(),
            required: required.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Rules for discovering template classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRules {
    /// Every template class must derive from this class.
    pub base_class: String,
    /// Members whose name starts with this prefix are private.
    pub reserved_prefix: String,
    /// Intermediate base classes never offered as templates.
    pub hidden_bases: Vec<String>,
    /// Modules attached to every networked object, in order.
    pub builtin_modules: Vec<BuiltinModule>,
}

impl Default for TemplateRules {
    fn default() -> Self {
        Self {
            base_class: "Replicable".to_string(),
            reserved_prefix: "_".to_string(),
            hidden_bases: vec!["Entity".to_string()],
            builtin_modules: vec![
                BuiltinModule::new("game_system.entities", &["Actor"]),
                BuiltinModule::new("network_addon.actors", &["SCAActor"]),
            ],
        }
    }
}

impl TemplateRules {
    pub fn is_builtin(&self, path: &str) -> bool {
        self.builtin_modules.iter().any(|module| module.path == path)
    }

    /// Classes that must stay active in the module at `path`.
    pub fn required_classes(&self, path: &str) -> &[String] {
        self.builtin_modules
            .iter()
            .find(|module| module.path == path)
            .map(|module| module.required.as_slice())
            .unwrap_or(&[])
    }
}
