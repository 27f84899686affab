//! Attribute registry.
//!
//! Mirrors an object's raw game properties into typed attribute descriptors
//! carrying the replication flags chosen by the designer. The registry is
//! regenerated every pass; flags survive as long as a property of the same
//! name exists.

use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A host game property, in the host's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    pub name: String,
    pub value: Value,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A typed, flag-annotated attribute of a networked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub default: Value,
    #[serde(default)]
    pub replicate: bool,
    #[serde(default = "default_true")]
    pub replicate_after_initial: bool,
    #[serde(default = "default_true")]
    pub replicate_for_owner: bool,
}

fn default_true() -> bool {
    true
}

impl AttributeDescriptor {
    /// Descriptor for a newly seen property: not replicated until the
    /// designer opts in.
    pub fn from_property(property: &RawProperty) -> Self {
        Self {
            name: property.name.clone(),
            value_type: property.value.value_type(),
            default: property.value.clone(),
            replicate: false,
            replicate_after_initial: true,
            replicate_for_owner: true,
        }
    }

    pub fn replicated(mut self) -> Self {
        self.replicate = true;
        self
    }
}

/// Regenerates the attribute list from the raw property set.
///
/// Existing descriptors keep their position and flags but take the type and
/// value of the matching property. Properties without a descriptor are
/// appended in raw order. Descriptors without a property, and properties
/// whose name fails `is_valid`, are dropped.
pub fn sync<F>(
    existing: &[AttributeDescriptor],
    properties: &[RawProperty],
    is_valid: F,
) -> Vec<AttributeDescriptor>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    let valid: Vec<&RawProperty> = properties
        .iter()
        .filter(|property| is_valid(&property.name))
        .filter(|property| seen.insert(property.name.as_str()))
        .collect();

    let mut synced: Vec<AttributeDescriptor> = Vec::with_capacity(valid.len());

    for descriptor in existing {
        if synced.iter().any(|kept| kept.name == descriptor.name) {
            continue;
        }

        if let Some(property) = valid.iter().find(|p| p.name == descriptor.name) {
            let mut kept = descriptor.clone();
            kept.value_type = property.value.value_type();
            kept.default = property.value.clone();
            synced.push(kept);
        }
    }

    for property in valid {
        if !synced.iter().any(|kept| kept.name == property.name) {
            synced.push(AttributeDescriptor::from_property(property));
        }
    }

    synced
}
