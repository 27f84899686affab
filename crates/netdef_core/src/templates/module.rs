//! Per-object template module descriptors and class discovery.

use super::source::{MemberKind, MemberValue, TemplateMember};
use super::TemplateRules;
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// A default value declared by a template class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefault {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Value,
}

impl AttributeDefault {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            value_type: value.value_type(),
            value,
        }
    }
}

/// A template class discovered in a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateClass {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub defaults: Vec<AttributeDefault>,
}

/// A template module attached to an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateModule {
    pub path: String,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub classes: Vec<TemplateClass>,
}

impl TemplateModule {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            loaded: false,
            classes: Vec::new(),
        }
    }

    pub fn class(&self, name: &str) -> Option<&TemplateClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut TemplateClass> {
        self.classes.iter_mut().find(|c| c.name == name)
    }

    pub fn active_classes(&self) -> impl Iterator<Item = &TemplateClass> {
        self.classes.iter().filter(|c| c.active)
    }

    /// Replaces the class list with freshly discovered classes and marks the
    /// module loaded. Required classes are forced active; other classes keep
    /// the `active` flag they had before a reload, or start inactive.
    pub fn populate(&mut self, discovered: Vec<TemplateClass>, required: &[String]) {
        let previously_active: HashSet<String> = self
            .active_classes()
            .map(|class| class.name.clone())
            .collect();

        self.classes = discovered
            .into_iter()
            .map(|mut class| {
                class.required = required.iter().any(|r| *r == class.name);
                class.active = class.required || previously_active.contains(&class.name);
                class
            })
            .collect();

        self.loaded = true;
    }
}

/// Picks the template classes out of a module's members.
///
/// A member qualifies when it is a class whose ancestry reaches the base
/// class (without being the base), whose name does not start with the
/// reserved prefix, and which is not a hidden base. Its defaults are the
/// public scalar attributes of the class and its ancestors, with the nearest
/// declaration winning. Classes and defaults are ordered by name.
///
/// Parents declared in other modules are looked up through `modules`, which
/// returns the members of an already imported module. A dotted `extends`
/// names its module explicitly; a bare name missing from the declaring
/// module is searched in the built-in modules, in configured order.
pub fn discover<'a, F>(
    module_path: &str,
    members: &'a [TemplateMember],
    rules: &TemplateRules,
    modules: F,
) -> Vec<TemplateClass>
where
    F: Fn(&str) -> Option<&'a [TemplateMember]>,
{
    let mut discovered: Vec<TemplateClass> = Vec::new();

    for member in members.iter().filter(|member| member.kind == MemberKind::Class) {
        if member.name == rules.base_class
            || member.name.starts_with(&rules.reserved_prefix)
            || rules.hidden_bases.iter().any(|hidden| *hidden == member.name)
        {
            continue;
        }

        let Some(chain) = lineage(module_path, members, member, rules, &modules) else {
            debug!("Skipping {}.{}: not a {} subtype", module_path, member.name, rules.base_class);
            continue;
        };

        info!("🔍 Found template class {}.{}", module_path, member.name);

        discovered.push(TemplateClass {
            name: member.name.clone(),
            active: false,
            required: false,
            defaults: collect_defaults(&chain, &rules.reserved_prefix),
        });
    }

    discovered.sort_by(|a, b| a.name.cmp(&b.name));
    discovered.dedup_by(|a, b| a.name == b.name);
    discovered
}

/// Modules that must be imported before `members` can be discovered: the
/// module of every dotted parent, plus the built-in modules when a bare
/// parent is not declared locally.
pub fn parent_modules(module_path: &str, members: &[TemplateMember], rules: &TemplateRules) -> Vec<String> {
    let mut paths = Vec::new();

    for parent in members
        .iter()
        .filter(|member| member.kind == MemberKind::Class)
        .filter_map(|member| member.extends.as_deref())
    {
        match parent.rsplit_once('.') {
            Some((path, class)) => {
                if class != rules.base_class && path != module_path {
                    paths.push(path.to_string());
                }
            }
            None => {
                if parent != rules.base_class && find_class(members, parent).is_none() {
                    paths.extend(
                        rules
                            .builtin_modules
                            .iter()
                            .filter(|builtin| builtin.path != module_path)
                            .map(|builtin| builtin.path.clone()),
                    );
                }
            }
        }
    }

    paths.sort();
    paths.dedup();
    paths
}

fn find_class<'a>(members: &'a [TemplateMember], name: &str) -> Option<&'a TemplateMember> {
    members
        .iter()
        .find(|member| member.kind == MemberKind::Class && member.name == name)
}

/// A class together with the module that declares it.
struct Located<'a> {
    path: String,
    members: &'a [TemplateMember],
    class: &'a TemplateMember,
}

fn resolve_parent<'a, F>(parent: &str, scope: &Located<'a>, rules: &TemplateRules, modules: &F) -> Option<Located<'a>>
where
    F: Fn(&str) -> Option<&'a [TemplateMember]>,
{
    if let Some((path, name)) = parent.rsplit_once('.') {
        let members = if path == scope.path { scope.members } else { modules(path)? };
        return find_class(members, name).map(|class| Located {
            path: path.to_string(),
            members,
            class,
        });
    }

    if let Some(class) = find_class(scope.members, parent) {
        return Some(Located {
            path: scope.path.clone(),
            members: scope.members,
            class,
        });
    }

    rules
        .builtin_modules
        .iter()
        .filter(|builtin| builtin.path != scope.path)
        .find_map(|builtin| {
            let members = modules(&builtin.path)?;
            find_class(members, parent).map(|class| Located {
                path: builtin.path.clone(),
                members,
                class,
            })
        })
}

/// The chain from the outermost ancestor down to `member`, or `None` if the
/// chain never reaches the base class (unknown parent, no parent, or a
/// cycle).
fn lineage<'a, F>(
    module_path: &str,
    members: &'a [TemplateMember],
    member: &'a TemplateMember,
    rules: &TemplateRules,
    modules: &F,
) -> Option<Vec<&'a TemplateMember>>
where
    F: Fn(&str) -> Option<&'a [TemplateMember]>,
{
    let mut chain = vec![member];
    let mut visited: HashSet<String> = HashSet::from([format!("{}.{}", module_path, member.name)]);
    let mut current = Located {
        path: module_path.to_string(),
        members,
        class: member,
    };

    loop {
        let parent = current.class.extends.as_deref()?;
        let parent_name = parent.rsplit('.').next().unwrap_or(parent);
        if parent_name == rules.base_class {
            chain.reverse();
            return Some(chain);
        }

        let next = resolve_parent(parent, &current, rules, modules)?;
        if !visited.insert(format!("{}.{}", next.path, next.class.name)) {
            return None;
        }

        chain.push(next.class);
        current = next;
    }
}

fn collect_defaults(lineage: &[&TemplateMember], reserved_prefix: &str) -> Vec<AttributeDefault> {
    let mut merged: HashMap<&str, &MemberValue> = HashMap::new();
    for class in lineage {
        for (name, value) in &class.attributes {
            merged.insert(name.as_str(), value);
        }
    }

    let mut defaults: Vec<AttributeDefault> = merged
        .into_iter()
        .filter(|(name, _)| !name.starts_with(reserved_prefix))
        .filter_map(|(name, value)| match value {
            MemberValue::Scalar(scalar) => Some(AttributeDefault::new(name, scalar.clone())),
            MemberValue::Complex => None,
        })
        .collect();

    defaults.sort_by(|a, b| a.name.cmp(&b.name));
    defaults
}
