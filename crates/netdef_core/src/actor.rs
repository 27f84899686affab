//! Network configuration of one networked object.
//!
//! `ActorConfig` is the aggregate the pass reads and updates. Every
//! designer-facing mutation goes through its methods, which reject
//! invalid states before they can reach the compiler.

use crate::attributes::{self, AttributeDescriptor, RawProperty};
use crate::error::DefinitionError;
use crate::rpc::{self, RpcCall};
use crate::states::{self, NetmodeStateGroup};
use crate::templates::{self, ResolvedTemplateDefault, TemplateCache, TemplateModule, TemplateRules};
use crate::types::{is_valid_identifier, is_valid_module_path, NetworkRole, RpcTarget, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
    #[serde(default)]
    pub rpc_calls: Vec<RpcCall>,
    #[serde(default)]
    pub templates: Vec<TemplateModule>,
    #[serde(default)]
    pub template_defaults: Vec<ResolvedTemplateDefault>,
    #[serde(default)]
    pub states: Vec<NetmodeStateGroup>,
    #[serde(default)]
    pub remote_role: NetworkRole,
}

impl ActorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut AttributeDescriptor> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn rpc_call(&self, name: &str) -> Option<&RpcCall> {
        self.rpc_calls.iter().find(|r| r.name == name)
    }

    pub fn rpc_call_mut(&mut self, name: &str) -> Option<&mut RpcCall> {
        self.rpc_calls.iter_mut().find(|r| r.name == name)
    }

    pub fn state_group(&self, name: &str) -> Option<&NetmodeStateGroup> {
        self.states.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    pub fn state_group_mut(&mut self, name: &str) -> Option<&mut NetmodeStateGroup> {
        self.states.iter_mut().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    pub fn template_module(&self, path: &str) -> Option<&TemplateModule> {
        self.templates.iter().find(|m| m.path == path)
    }

    pub fn resolved_default(&self, name: &str) -> Option<&ResolvedTemplateDefault> {
        self.template_defaults.iter().find(|d| d.name == name)
    }

    // --- pass steps ---------------------------------------------------------

    /// Mirrors the raw property set into the attribute registry.
    pub fn sync_attributes(&mut self, properties: &[RawProperty]) {
        self.attributes = attributes::sync(&self.attributes, properties, is_valid_identifier);
    }

    /// Recomputes the argument list of every remote call.
    pub fn resolve_rpc_arguments(&mut self) {
        for call in &mut self.rpc_calls {
            rpc::resolve_arguments(call, &self.attributes);
        }
    }

    /// Attaches any missing built-in module, ahead of user modules.
    pub fn ensure_builtin_modules(&mut self, rules: &TemplateRules) {
        for (position, builtin) in rules.builtin_modules.iter().enumerate() {
            if self.template_module(&builtin.path).is_none() {
                let at = position.min(self.templates.len());
                self.templates.insert(at, TemplateModule::new(builtin.path.clone()));
            }
        }
    }

    /// Imports every module that is not loaded yet. Import failures are
    /// logged and leave the module unloaded for the next pass.
    pub fn load_template_modules(&mut self, cache: &mut TemplateCache, rules: &TemplateRules) {
        for module in self.templates.iter_mut().filter(|m| !m.loaded) {
            if let Err(e) = cache.load_with_parents(&module.path, rules) {
                warn!("⚠️ Template module {} stays unloaded: {}", module.path, e);
                continue;
            }

            let imported: &TemplateCache = cache;
            let Some(members) = imported.members(&module.path) else {
                continue;
            };

            let discovered = templates::discover(&module.path, members, rules, |path| imported.members(path));
            module.populate(discovered, rules.required_classes(&module.path));
        }
    }

    /// Re-composes the resolved default set from the active templates.
    pub fn compose_defaults(&mut self) {
        self.template_defaults = templates::compose(&self.templates, &self.template_defaults);

        if self.template_defaults.is_empty() {
            debug!("Final class could not be built from the selected template classes");
        }
    }

    pub fn ensure_state_groups(&mut self) {
        states::ensure_default_groups(&mut self.states);
    }

    // --- designer mutations -------------------------------------------------

    pub fn add_rpc_call(&mut self, name: impl Into<String>, target: RpcTarget) -> Result<&mut RpcCall, DefinitionError> {
        let name = name.into();
        if self.rpc_call(&name).is_some() {
            return Err(DefinitionError::DuplicateRpc(name));
        }

        let mut call = RpcCall::new(name, target);
        rpc::resolve_arguments(&mut call, &self.attributes);
        self.rpc_calls.push(call);

        let last = self.rpc_calls.len() - 1;
        Ok(&mut self.rpc_calls[last])
    }

    pub fn remove_rpc_call(&mut self, name: &str) -> Result<RpcCall, DefinitionError> {
        let index = self
            .rpc_calls
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| DefinitionError::RpcNotFound(name.to_string()))?;

        Ok(self.rpc_calls.remove(index))
    }

    /// Attaches a user template module at the end of the list. It is
    /// imported on the next pass.
    pub fn add_template_module(&mut self, path: &str) -> Result<(), DefinitionError> {
        if !is_valid_module_path(path) {
            return Err(DefinitionError::InvalidModulePath(path.to_string()));
        }

        if self.template_module(path).is_some() {
            return Err(DefinitionError::DuplicateModule(path.to_string()));
        }

        self.templates.push(TemplateModule::new(path));
        Ok(())
    }

    pub fn remove_template_module(&mut self, path: &str, rules: &TemplateRules) -> Result<(), DefinitionError> {
        if rules.is_builtin(path) {
            return Err(DefinitionError::BuiltinModule(path.to_string()));
        }

        let index = self
            .templates
            .iter()
            .position(|m| m.path == path)
            .ok_or_else(|| DefinitionError::ModuleNotFound(path.to_string()))?;

        self.templates.remove(index);
        Ok(())
    }

    /// Marks a module for re-discovery on the next pass.
    pub fn mark_module_stale(&mut self, path: &str) -> bool {
        match self.templates.iter_mut().find(|m| m.path == path) {
            Some(module) => {
                module.loaded = false;
                true
            }
            None => false,
        }
    }

    pub fn set_template_active(&mut self, module: &str, class: &str, active: bool) -> Result<(), DefinitionError> {
        let template = self
            .templates
            .iter_mut()
            .find(|m| m.path == module)
            .ok_or_else(|| DefinitionError::ModuleNotFound(module.to_string()))?
            .class_mut(class)
            .ok_or_else(|| DefinitionError::ClassNotFound {
                module: module.to_string(),
                class: class.to_string(),
            })?;

        if template.required && !active {
            return Err(DefinitionError::RequiredTemplate {
                module: module.to_string(),
                class: class.to_string(),
            });
        }

        template.active = active;
        Ok(())
    }

    /// Records a designer override for a resolved default.
    pub fn set_default_override(&mut self, name: &str, value: Value) -> Result<(), DefinitionError> {
        let entry = self
            .template_defaults
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| DefinitionError::UnknownDefault(name.to_string()))?;

        if entry.value_type != value.value_type() {
            return Err(DefinitionError::TypeMismatch {
                name: name.to_string(),
                expected: entry.value_type,
                found: value.value_type(),
            });
        }

        entry.value = value;
        entry.modified = true;
        Ok(())
    }

    /// Drops an override; the entry follows composition again from the next
    /// pass.
    pub fn clear_default_override(&mut self, name: &str) -> Result<(), DefinitionError> {
        let entry = self
            .template_defaults
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| DefinitionError::UnknownDefault(name.to_string()))?;

        entry.modified = false;
        Ok(())
    }
}
