//! Template module sources.
//!
//! A source turns a dotted module path into the members that module
//! declares. Only the shape captured by [`TemplateMember`] is visible to the
//! engine; anything else a module contains is ignored.

use crate::error::TemplateError;
use crate::types::Value;
use std::collections::HashMap;

/// Whether a member is a class that may take part in composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Class,
    Other,
}

/// A class-level attribute value as declared by the module.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    Scalar(Value),
    /// Lists, tables and other non-scalar values. Never captured as defaults.
    Complex,
}

/// A member declared by a template module.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMember {
    pub name: String,
    pub kind: MemberKind,
    /// Direct parent class, by name.
    pub extends: Option<String>,
    pub attributes: Vec<(String, MemberValue)>,
}

impl TemplateMember {
    pub fn class(name: impl Into<String>, extends: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Class,
            extends: Some(extends.into()),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .push((name.into(), MemberValue::Scalar(value.into())));
        self
    }

    pub fn with_complex(mut self, name: impl Into<String>) -> Self {
        self.attributes.push((name.into(), MemberValue::Complex));
        self
    }
}

/// Anything that can import a template module by path.
pub trait TemplateSource: Send + Sync {
    fn load(&self, path: &str) -> Result<Vec<TemplateMember>, TemplateError>;
}

/// Template modules registered explicitly in code.
#[derive(Debug, Default, Clone)]
pub struct RegisteredTemplates {
    modules: HashMap<String, Vec<TemplateMember>>,
}

impl RegisteredTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<String>, members: Vec<TemplateMember>) {
        self.modules.insert(path.into(), members);
    }

    pub fn with_module(mut self, path: impl Into<String>, members: Vec<TemplateMember>) -> Self {
        self.register(path, members);
        self
    }
}

impl TemplateSource for RegisteredTemplates {
    fn load(&self, path: &str) -> Result<Vec<TemplateMember>, TemplateError> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))
    }
}

/// Tries each source in order, returning the first module found.
pub struct LayeredSource {
    layers: Vec<Box<dyn TemplateSource>>,
}

impl LayeredSource {
    pub fn new(layers: Vec<Box<dyn TemplateSource>>) -> Self {
        Self { layers }
    }
}

impl TemplateSource for LayeredSource {
    fn load(&self, path: &str) -> Result<Vec<TemplateMember>, TemplateError> {
        for layer in &self.layers {
            match layer.load(path) {
                Err(TemplateError::NotFound(_)) => continue,
                other => return other,
            }
        }

        Err(TemplateError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_source_lookup() {
        let source = RegisteredTemplates::new().with_module(
            "game.pawns",
            vec![TemplateMember::class("Pawn", "Replicable").with_attribute("health", 100)],
        );

        let members = source.load("game.pawns").unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].attributes[0].1, MemberValue::Scalar(Value::Int(100)));

        assert!(matches!(source.load("game.missing"), Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_layered_source_falls_through() {
        let first = RegisteredTemplates::new().with_module("a", vec![]);
        let second = RegisteredTemplates::new()
            .with_module("b", vec![TemplateMember::class("B", "Replicable")]);
        let layered = LayeredSource::new(vec![Box::new(first), Box::new(second)]);

        assert!(layered.load("a").unwrap().is_empty());
        assert_eq!(layered.load("b").unwrap()[0].name, "B");
        assert!(layered.load("c").is_err());
    }
}
