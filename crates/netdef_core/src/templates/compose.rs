//! Composition of active template defaults into one resolved set.

use super::module::TemplateModule;
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// The final value of one attribute across the active templates.
///
/// `modified` marks a designer override. Modified entries are never touched
/// by composition; unmodified ones always mirror the latest pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTemplateDefault {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Value,
    #[serde(default)]
    pub modified: bool,
}

/// Merges the defaults of every active class, modules and classes in list
/// order. A later class overwrites an earlier class's unmodified entry.
/// Names no longer declared by any active class are dropped.
pub fn compose(
    modules: &[TemplateModule],
    previous: &[ResolvedTemplateDefault],
) -> Vec<ResolvedTemplateDefault> {
    let mut resolved: Vec<ResolvedTemplateDefault> = Vec::new();

    let declared = modules
        .iter()
        .flat_map(|module| module.active_classes())
        .flat_map(|class| class.defaults.iter());

    for default in declared {
        if let Some(entry) = resolved.iter_mut().find(|e| e.name == default.name) {
            if !entry.modified {
                entry.value_type = default.value_type;
                entry.value = default.value.clone();
            }
            continue;
        }

        let overridden = previous
            .iter()
            .find(|e| e.modified && e.name == default.name)
            .cloned();

        resolved.push(overridden.unwrap_or_else(|| ResolvedTemplateDefault {
            name: default.name.clone(),
            value_type: default.value_type,
            value: default.value.clone(),
            modified: false,
        }));
    }

    resolved
}

/// `"module.class"` for every active class, in list order.
pub fn active_template_names(modules: &[TemplateModule]) -> Vec<String> {
    modules
        .iter()
        .flat_map(|module| {
            module
                .active_classes()
                .map(move |class| format!("{}.{}", module.path, class.name))
        })
        .collect()
}
