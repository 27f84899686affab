//! On-disk definition artifacts.
//!
//! These structs are the wire contract read by the runtime. Maps are
//! ordered by key so that identical configurations produce identical files.

use crate::actor::ActorConfig;
use crate::scene::Scene;
use crate::states::STATE_COUNT;
use crate::templates::active_template_names;
use crate::types::{NetworkRole, RpcTarget, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ACTOR_DEFINITION_FILE: &str = "actor.definition";
pub const MAIN_DEFINITION_FILE: &str = "main.definition";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub default: Value,
    pub initial_only: bool,
    pub ignore_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcDefinition {
    pub arguments: BTreeMap<String, ValueType>,
    pub target: RpcTarget,
    pub reliable: bool,
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    pub states: [bool; STATE_COUNT],
    pub simulated_states: [bool; STATE_COUNT],
}

/// Contents of `<scene>/<object>/actor.definition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDefinitionFile {
    pub attributes: BTreeMap<String, AttributeDefinition>,
    pub rpc_calls: BTreeMap<String, RpcDefinition>,
    pub templates: Vec<String>,
    pub defaults: BTreeMap<String, Value>,
    pub states: BTreeMap<String, StateDefinition>,
    pub remote_role: NetworkRole,
}

impl From<&ActorConfig> for ActorDefinitionFile {
    fn from(actor: &ActorConfig) -> Self {
        let attributes = actor
            .attributes
            .iter()
            .filter(|a| a.replicate)
            .map(|a| {
                let definition = AttributeDefinition {
                    default: a.default.clone(),
                    initial_only: !a.replicate_after_initial,
                    ignore_owner: !a.replicate_for_owner,
                };
                (a.name.clone(), definition)
            })
            .collect();

        let rpc_calls = actor
            .rpc_calls
            .iter()
            .map(|call| {
                let definition = RpcDefinition {
                    arguments: call
                        .included_arguments()
                        .map(|arg| (arg.name.clone(), arg.value_type))
                        .collect(),
                    target: call.target,
                    reliable: call.reliable,
                    simulated: call.simulated,
                };
                (call.name.clone(), definition)
            })
            .collect();

        let defaults = actor
            .template_defaults
            .iter()
            .filter(|d| d.modified)
            .map(|d| (d.name.clone(), d.value.clone()))
            .collect();

        let states = actor
            .states
            .iter()
            .map(|group| {
                let definition = StateDefinition {
                    states: group.states,
                    simulated_states: group.simulated_states,
                };
                (group.name.clone(), definition)
            })
            .collect();

        Self {
            attributes,
            rpc_calls,
            templates: active_template_names(&actor.templates),
            defaults,
            states,
            remote_role: actor.remote_role,
        }
    }
}

/// Contents of `main.definition`: settings of the active network scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainDefinition {
    pub port: u16,
    pub tick_rate: u32,
    pub metric_interval: f64,
    pub scene: String,
}

impl From<&Scene> for MainDefinition {
    fn from(scene: &Scene) -> Self {
        Self {
            port: scene.port,
            tick_rate: scene.tick_rate,
            metric_interval: scene.metric_interval,
            scene: scene.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawProperty;
    use crate::templates::ResolvedTemplateDefault;

    #[test]
    fn test_only_replicated_attributes_are_written() {
        let mut actor = ActorConfig::new();
        actor.sync_attributes(&[RawProperty::new("health", 100), RawProperty::new("score", 0)]);
        let health = actor.attribute_mut("health").unwrap();
        health.replicate = true;
        health.replicate_for_owner = false;

        let file = ActorDefinitionFile::from(&actor);
        assert_eq!(file.attributes.len(), 1);
        let health = &file.attributes["health"];
        assert_eq!(health.default, Value::Int(100));
        assert!(!health.initial_only);
        assert!(health.ignore_owner);
    }

    #[test]
    fn test_rpc_arguments_follow_selection() {
        let mut actor = ActorConfig::new();
        actor.sync_attributes(&[RawProperty::new("aim", 0.5), RawProperty::new("fire", false)]);
        let call = actor.add_rpc_call("shoot", RpcTarget::Server).unwrap();
        call.reliable = true;
        call.set_argument_included("aim", true);

        let file = ActorDefinitionFile::from(&actor);
        let shoot = &file.rpc_calls["shoot"];
        assert_eq!(shoot.arguments.len(), 1);
        assert_eq!(shoot.arguments["aim"], ValueType::Float);
        assert!(shoot.reliable);

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["rpc_calls"]["shoot"]["target"], "SERVER");
        assert_eq!(json["rpc_calls"]["shoot"]["arguments"]["aim"], "FLOAT");
        assert_eq!(json["remote_role"], "SIMULATED_PROXY");
    }

    #[test]
    fn test_only_modified_defaults_are_written() {
        let mut actor = ActorConfig::new();
        actor.template_defaults = vec![
            ResolvedTemplateDefault {
                name: "armor".to_string(),
                value_type: ValueType::Int,
                value: Value::Int(5),
                modified: false,
            },
            ResolvedTemplateDefault {
                name: "speed".to_string(),
                value_type: ValueType::Float,
                value: Value::Float(4.0),
                modified: true,
            },
        ];
        actor.ensure_state_groups();

        let file = ActorDefinitionFile::from(&actor);
        assert_eq!(file.defaults.len(), 1);
        assert_eq!(file.defaults["speed"], Value::Float(4.0));
        assert!(file.states["Server"].states[1]);
        assert!(file.states["Client"].states[0]);
    }

    #[test]
    fn test_main_definition_fields() {
        let scene = Scene::new("Arena").with_port(1200);
        let json = serde_json::to_value(MainDefinition::from(&scene)).unwrap();
        assert_eq!(json["port"], 1200);
        assert_eq!(json["tick_rate"], 30);
        assert_eq!(json["metric_interval"], 2.0);
        assert_eq!(json["scene"], "Arena");
    }
}
