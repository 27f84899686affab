//! Scenes, objects and the single active network scene.

use crate::actor::ActorConfig;
use crate::attributes::RawProperty;
use crate::error::DefinitionError;
use crate::templates::TemplateCache;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

fn default_tick_rate() -> u32 {
    30
}

fn default_metric_interval() -> f64 {
    2.0
}

/// One host object. It takes part in replication only while `network` is
/// set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
    #[serde(default)]
    pub network: Option<ActorConfig>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property: RawProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn networked(mut self) -> Self {
        self.set_use_network(true);
        self
    }

    pub fn is_networked(&self) -> bool {
        self.network.is_some()
    }

    /// Enabling keeps an existing configuration; disabling drops it.
    pub fn set_use_network(&mut self, enabled: bool) {
        if enabled {
            self.network.get_or_insert_with(ActorConfig::new);
        } else {
            self.network = None;
        }
    }

    pub fn network(&self) -> Result<&ActorConfig, DefinitionError> {
        self.network
            .as_ref()
            .ok_or_else(|| DefinitionError::NotNetworked(self.name.clone()))
    }

    pub fn network_mut(&mut self) -> Result<&mut ActorConfig, DefinitionError> {
        self.network
            .as_mut()
            .ok_or_else(|| DefinitionError::NotNetworked(self.name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default = "default_metric_interval")]
    pub metric_interval: f64,
    /// Only changed through `Project` so at most one scene carries it.
    #[serde(default)]
    use_network: bool,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: 0,
            tick_rate: default_tick_rate(),
            metric_interval: default_metric_interval(),
            use_network: false,
            objects: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn uses_network(&self) -> bool {
        self.use_network
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn network_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_networked())
    }
}

/// Name of the scene currently used for networking, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveNetworkScene(Option<String>);

impl ActiveNetworkScene {
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is(&self, scene: &str) -> bool {
        self.0.as_deref() == Some(scene)
    }

    fn set(&mut self, scene: Option<String>) {
        self.0 = scene;
    }
}

/// Every scene of a host project plus the active network scene.
///
/// The network flag of a scene and the active scene name change together
/// through `set_use_network`, `remove_scene` and `refresh_active_scene`.
/// A deserialized project must be refreshed before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    active: ActiveNetworkScene,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.name == name)
    }

    pub fn active(&self) -> &ActiveNetworkScene {
        &self.active
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.get().and_then(|name| self.scene(name))
    }

    pub fn object_mut(&mut self, scene: &str, object: &str) -> Result<&mut SceneObject, DefinitionError> {
        self.scene_mut(scene)
            .ok_or_else(|| DefinitionError::SceneNotFound(scene.to_string()))?
            .object_mut(object)
            .ok_or_else(|| DefinitionError::ObjectNotFound(object.to_string()))
    }

    /// Turns networking on or off for `scene`. Enabling a scene disables
    /// every other one so at most one scene is ever active.
    pub fn set_use_network(&mut self, scene: &str, enabled: bool) -> Result<(), DefinitionError> {
        if self.scene(scene).is_none() {
            return Err(DefinitionError::SceneNotFound(scene.to_string()));
        }

        if enabled {
            for other in &mut self.scenes {
                other.use_network = other.name == scene;
            }
            self.active.set(Some(scene.to_string()));
            info!("🌐 Network scene is now {}", scene);
        } else {
            if let Some(target) = self.scene_mut(scene) {
                target.use_network = false;
            }
            if self.active.is(scene) {
                self.active.set(None);
            }
        }

        Ok(())
    }

    pub fn remove_scene(&mut self, scene: &str) -> Result<Scene, DefinitionError> {
        let index = self
            .scenes
            .iter()
            .position(|s| s.name == scene)
            .ok_or_else(|| DefinitionError::SceneNotFound(scene.to_string()))?;

        if self.active.is(scene) {
            self.active.set(None);
        }

        Ok(self.scenes.remove(index))
    }

    /// Reconciles the active scene with the per-scene flags after loading.
    /// The first flagged scene wins; any other flagged scene is reset.
    pub fn refresh_active_scene(&mut self) {
        let mut winner: Option<String> = None;

        for scene in &mut self.scenes {
            if !scene.use_network {
                continue;
            }

            match &winner {
                None => winner = Some(scene.name.clone()),
                Some(active) => {
                    warn!("⚠️ Scene {} also uses networking, keeping {}", scene.name, active);
                    scene.use_network = false;
                }
            }
        }

        self.active.set(winner);
    }

    /// Every networked object with its scene name.
    pub fn network_objects(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.scenes
            .iter()
            .flat_map(|scene| scene.network_objects().map(move |o| (scene.name.as_str(), o)))
    }

    /// Drops the cached import of `path` and marks every object that
    /// attaches it for re-discovery on the next pass. Returns how many
    /// objects were affected.
    pub fn reload_template_module(&mut self, path: &str, cache: &mut TemplateCache) -> usize {
        cache.reload(path);

        let mut affected = 0;
        for scene in &mut self.scenes {
            for object in &mut scene.objects {
                if let Some(actor) = object.network.as_mut() {
                    if actor.mark_module_stale(path) {
                        affected += 1;
                    }
                }
            }
        }

        info!("🔄 Template module {} will be rediscovered for {} object(s)", path, affected);
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new()
            .with_scene(Scene::new("Lobby"))
            .with_scene(Scene::new("Arena").with_object(SceneObject::new("Player").networked()))
    }

    #[test]
    fn test_activating_scene_deactivates_others() {
        let mut project = project();
        project.set_use_network("Lobby", true).unwrap();
        project.set_use_network("Arena", true).unwrap();

        assert_eq!(project.active().get(), Some("Arena"));
        assert!(!project.scene("Lobby").unwrap().uses_network());
        assert!(project.scene("Arena").unwrap().uses_network());
    }

    #[test]
    fn test_disabling_active_scene_clears_it() {
        let mut project = project();
        project.set_use_network("Arena", true).unwrap();

        project.set_use_network("Lobby", false).unwrap();
        assert_eq!(project.active().get(), Some("Arena"));

        project.set_use_network("Arena", false).unwrap();
        assert_eq!(project.active().get(), None);
        assert!(project.set_use_network("Nowhere", true).is_err());
    }

    #[test]
    fn test_removing_active_scene_clears_it() {
        let mut project = project();
        project.set_use_network("Arena", true).unwrap();
        project.remove_scene("Arena").unwrap();
        assert!(project.active_scene().is_none());
    }

    #[test]
    fn test_refresh_keeps_first_flagged_scene() {
        let json = r#"{"scenes":[
            {"name":"Lobby","use_network":true},
            {"name":"Arena","use_network":true}
        ],"active":"Arena"}"#;
        let mut project: Project = serde_json::from_str(json).unwrap();

        project.refresh_active_scene();
        assert_eq!(project.active().get(), Some("Lobby"));
        assert!(!project.scene("Arena").unwrap().uses_network());
    }

    #[test]
    fn test_network_toggle_keeps_configuration() {
        let mut object = SceneObject::new("Crate");
        assert!(object.network().is_err());

        object.set_use_network(true);
        object.network_mut().unwrap().add_template_module("game.props").unwrap();
        object.set_use_network(true);
        assert_eq!(object.network().unwrap().templates.len(), 1);

        object.set_use_network(false);
        assert!(!object.is_networked());
    }

    #[test]
    fn test_network_objects_carry_scene_name() {
        let project = project();
        let objects: Vec<(&str, &str)> = project
            .network_objects()
            .map(|(scene, o)| (scene, o.name.as_str()))
            .collect();
        assert_eq!(objects, vec![("Arena", "Player")]);
    }

    #[test]
    fn test_project_json_defaults() {
        let json = r#"{"scenes":[{"name":"Arena","use_network":true}]}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        let scene = project.scene("Arena").unwrap();
        assert_eq!(scene.tick_rate, 30);
        assert_eq!(scene.metric_interval, 2.0);
        assert_eq!(project.active().get(), None);
        assert!(scene.uses_network());
    }

    #[test]
    fn test_scene_flag_follows_active_scene() {
        let mut project = project();
        project.set_use_network("Lobby", true).unwrap();
        let flagged = |project: &Project| -> Vec<String> {
            project
                .scenes
                .iter()
                .filter(|scene| scene.uses_network())
                .map(|scene| scene.name.clone())
                .collect()
        };
        assert_eq!(flagged(&project), vec!["Lobby"]);

        project.set_use_network("Arena", true).unwrap();
        assert_eq!(flagged(&project), vec!["Arena"]);
        assert_eq!(project.active().get(), Some("Arena"));

        project.remove_scene("Arena").unwrap();
        assert!(flagged(&project).is_empty());
        assert_eq!(project.active().get(), None);

        let reloaded: Project = serde_json::from_str(&serde_json::to_string(&project).unwrap()).unwrap();
        assert_eq!(reloaded, project);
    }
}
