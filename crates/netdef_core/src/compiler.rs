//! Writes definition artifacts for the active network scene.
//!
//! Layout under the output root:
//!
//! ```text
//! <root>/main.definition
//! <root>/<scene>/<object>/actor.definition
//! ```
//!
//! Every scene gets a directory; objects that are no longer networked have
//! theirs removed, but only when the directory is actually listed under the
//! scene directory. Scene and object names that do not map to a single
//! directory (empty, `.`, `..`, or containing a separator) are recorded as
//! failures and never touch the disk. A failure on one object is recorded
//! and the batch goes on; only the root directory and `main.definition` are
//! fatal.

use crate::definition::{ActorDefinitionFile, MainDefinition, ACTOR_DEFINITION_FILE, MAIN_DEFINITION_FILE};
use crate::error::DefinitionError;
use crate::scene::{Project, SceneObject};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A per-object failure that did not stop the batch.
#[derive(Debug)]
pub struct CompileFailure {
    pub path: PathBuf,
    pub error: DefinitionError,
}

#[derive(Debug, Default)]
pub struct CompileReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failures: Vec<CompileFailure>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum CompileOutcome {
    /// Nothing was written because no scene uses networking.
    NoActiveScene,
    Compiled(CompileReport),
}

impl CompileOutcome {
    pub fn report(&self) -> Option<&CompileReport> {
        match self {
            CompileOutcome::Compiled(report) => Some(report),
            CompileOutcome::NoActiveScene => None,
        }
    }
}

pub struct DefinitionCompiler {
    root: PathBuf,
}

impl DefinitionCompiler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_dir(&self, scene: &str, object: &str) -> PathBuf {
        self.root.join(scene).join(object)
    }

    pub fn actor_definition_path(&self, scene: &str, object: &str) -> PathBuf {
        self.object_dir(scene, object).join(ACTOR_DEFINITION_FILE)
    }

    pub fn main_definition_path(&self) -> PathBuf {
        self.root.join(MAIN_DEFINITION_FILE)
    }

    /// Writes the whole definition tree for `project`.
    pub fn compile(&self, project: &Project) -> Result<CompileOutcome, DefinitionError> {
        let Some(active) = project.active_scene() else {
            warn!("⚠️ No network scene exists, nothing to save");
            return Ok(CompileOutcome::NoActiveScene);
        };

        fs::create_dir_all(&self.root).map_err(|e| DefinitionError::io(&self.root, e))?;

        let mut report = CompileReport::default();

        for scene in &project.scenes {
            let scene_dir = self.root.join(&scene.name);
            if !is_directory_name(&scene.name) {
                error!("❌ Skipping scene with unusable name {:?}", scene.name);
                report.failures.push(CompileFailure {
                    path: scene_dir,
                    error: DefinitionError::InvalidName(scene.name.clone()),
                });
                continue;
            }

            if let Err(e) = fs::create_dir_all(&scene_dir) {
                error!("❌ Failed to create scene directory {}: {}", scene_dir.display(), e);
                report.failures.push(CompileFailure {
                    error: DefinitionError::io(&scene_dir, e),
                    path: scene_dir,
                });
                continue;
            }

            let existing = match list_directories(&scene_dir) {
                Ok(existing) => existing,
                Err(e) => {
                    error!("❌ Failed to list {}: {}", scene_dir.display(), e);
                    report.failures.push(CompileFailure {
                        error: DefinitionError::io(&scene_dir, e),
                        path: scene_dir,
                    });
                    continue;
                }
            };

            for object in &scene.objects {
                self.compile_object(&scene.name, object, &existing, &mut report);
            }
        }

        let main_path = self.main_definition_path();
        write_json_atomic(&main_path, &MainDefinition::from(active))?;
        info!("💾 Wrote {} for scene {}", main_path.display(), active.name);

        if report.is_clean() {
            info!("✅ Compiled {} actor definition(s)", report.written.len());
        } else {
            warn!(
                "⚠️ Compiled {} actor definition(s), {} failed",
                report.written.len(),
                report.failures.len()
            );
        }

        Ok(CompileOutcome::Compiled(report))
    }

    fn compile_object(
        &self,
        scene: &str,
        object: &SceneObject,
        existing: &HashSet<OsString>,
        report: &mut CompileReport,
    ) {
        let dir = self.object_dir(scene, &object.name);

        if !is_directory_name(&object.name) {
            error!("❌ Skipping object with unusable name {:?} in scene {}", object.name, scene);
            report.failures.push(CompileFailure {
                path: dir,
                error: DefinitionError::InvalidName(object.name.clone()),
            });
            return;
        }

        let Some(actor) = object.network.as_ref() else {
            if !existing.contains(OsStr::new(&object.name)) {
                return;
            }

            match remove_dir_if_present(&dir) {
                Ok(true) => {
                    debug!("Removed stale definition directory {}", dir.display());
                    report.removed.push(dir);
                }
                Ok(false) => {}
                Err(e) => {
                    error!("❌ Failed to remove {}: {}", dir.display(), e);
                    report.failures.push(CompileFailure {
                        error: DefinitionError::io(&dir, e),
                        path: dir,
                    });
                }
            }
            return;
        };

        let path = dir.join(ACTOR_DEFINITION_FILE);
        let result = fs::create_dir_all(&dir)
            .map_err(|e| DefinitionError::io(&dir, e))
            .and_then(|_| write_json_atomic(&path, &ActorDefinitionFile::from(actor)));

        match result {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                error!("❌ Failed to write {}: {}", path.display(), e);
                report.failures.push(CompileFailure { path, error: e });
            }
        }
    }

    /// Removes the definition directory of one object. Missing directories
    /// are not an error.
    pub fn cleanup(&self, scene: &str, object: &str) -> Result<bool, DefinitionError> {
        for name in [scene, object] {
            if !is_directory_name(name) {
                return Err(DefinitionError::InvalidName(name.to_string()));
            }
        }

        let dir = self.object_dir(scene, object);
        let removed = remove_dir_if_present(&dir).map_err(|e| DefinitionError::io(&dir, e))?;

        if removed {
            info!("🧹 Removed definition directory {}", dir.display());
        }
        Ok(removed)
    }
}

/// Whether `name` maps to exactly one child directory of its parent.
fn is_directory_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| std::path::is_separator(c) || c == '\\' || c == '\0')
}

/// Names of the directories directly under `dir`.
fn list_directories(dir: &Path) -> io::Result<HashSet<OsString>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.insert(entry.file_name());
        }
    }
    Ok(names)
}

fn remove_dir_if_present(dir: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Serializes `value` into a sibling temporary file, then renames it over
/// `path` so readers never observe a partial file.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DefinitionError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| DefinitionError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, json).map_err(|e| DefinitionError::io(&temp, e))?;

    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(DefinitionError::io(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawProperty;
    use crate::scene::Scene;
    use tempfile::TempDir;

    fn project() -> Project {
        let mut project = Project::new().with_scene(
            Scene::new("Arena")
                .with_port(1200)
                .with_object(SceneObject::new("Player").networked())
                .with_object(SceneObject::new("Rock")),
        );
        project.set_use_network("Arena", true).unwrap();
        project
    }

    #[test]
    fn test_no_active_scene_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let compiler = DefinitionCompiler::new(&root);

        let outcome = compiler.compile(&Project::new().with_scene(Scene::new("Arena"))).unwrap();
        assert!(matches!(outcome, CompileOutcome::NoActiveScene));
        assert!(!root.exists());
    }

    #[test]
    fn test_compile_writes_tree() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());

        let outcome = compiler.compile(&project()).unwrap();
        let report = outcome.report().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.written, vec![compiler.actor_definition_path("Arena", "Player")]);

        let main: MainDefinition =
            serde_json::from_slice(&fs::read(compiler.main_definition_path()).unwrap()).unwrap();
        assert_eq!(main.port, 1200);
        assert_eq!(main.scene, "Arena");

        assert!(!compiler.object_dir("Arena", "Rock").exists());
        assert!(!dir.path().join("main.definition.tmp").exists());
    }

    #[test]
    fn test_stale_object_directories_are_removed() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());
        let mut project = project();
        compiler.compile(&project).unwrap();

        project
            .object_mut("Arena", "Player")
            .unwrap()
            .set_use_network(false);
        let outcome = compiler.compile(&project).unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.removed, vec![compiler.object_dir("Arena", "Player")]);
        assert!(!compiler.object_dir("Arena", "Player").exists());
    }

    #[test]
    fn test_failing_object_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());
        let mut project = project();
        let scene = project.scene_mut("Arena").unwrap();
        scene.objects.push(SceneObject::new("Door").networked());

        // A plain file where the object directory should be.
        fs::create_dir_all(dir.path().join("Arena")).unwrap();
        fs::write(compiler.object_dir("Arena", "Player"), b"blocked").unwrap();

        let outcome = compiler.compile(&project).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, compiler.actor_definition_path("Arena", "Player"));
        assert_eq!(report.written, vec![compiler.actor_definition_path("Arena", "Door")]);
        assert!(compiler.main_definition_path().exists());
    }

    #[test]
    fn test_attribute_written_to_actor_definition() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());
        let mut project = project();

        let player = project.object_mut("Arena", "Player").unwrap();
        player.properties.push(RawProperty::new("health", 100));
        let actor = player.network.as_mut().unwrap();
        actor.sync_attributes(&[RawProperty::new("health", 100)]);
        actor.attribute_mut("health").unwrap().replicate = true;

        compiler.compile(&project).unwrap();
        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(compiler.actor_definition_path("Arena", "Player")).unwrap())
                .unwrap();
        assert_eq!(written["attributes"]["health"]["default"], 100);
        assert_eq!(written["attributes"]["health"]["initial_only"], false);
    }

    #[test]
    fn test_unusable_names_never_touch_other_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let compiler = DefinitionCompiler::new(&root);

        let mut project = Project::new()
            .with_scene(Scene::new("Lobby").with_object(SceneObject::new("Guard").networked()))
            .with_scene(
                Scene::new("Arena")
                    .with_object(SceneObject::new(".."))
                    .with_object(SceneObject::new(""))
                    .with_object(SceneObject::new("."))
                    .with_object(SceneObject::new("nested/Rock"))
                    .with_object(SceneObject::new("../Lobby").networked()),
            )
            .with_scene(Scene::new("..").with_object(SceneObject::new("Lobby")));
        project.set_use_network("Lobby", true).unwrap();

        let outcome = compiler.compile(&project).unwrap();
        let report = outcome.report().unwrap();

        assert!(compiler.actor_definition_path("Lobby", "Guard").exists());
        assert!(compiler.main_definition_path().exists());
        assert!(root.join("Arena").is_dir());
        assert!(report.removed.is_empty());
        assert_eq!(report.written, vec![compiler.actor_definition_path("Lobby", "Guard")]);
        assert_eq!(report.failures.len(), 6);
        assert!(report
            .failures
            .iter()
            .all(|failure| matches!(failure.error, DefinitionError::InvalidName(_))));

        // A second pass finds the same tree intact.
        let report = compiler.compile(&project).unwrap();
        assert!(report.report().unwrap().removed.is_empty());
        assert!(compiler.actor_definition_path("Lobby", "Guard").exists());
    }

    #[test]
    fn test_only_listed_directories_are_removed() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());

        // A plain file carrying a non-networked object's name is left alone.
        fs::create_dir_all(dir.path().join("Arena")).unwrap();
        fs::write(compiler.object_dir("Arena", "Rock"), b"keep").unwrap();

        let outcome = compiler.compile(&project()).unwrap();
        let report = outcome.report().unwrap();
        assert!(report.is_clean());
        assert!(report.removed.is_empty());
        assert_eq!(fs::read(compiler.object_dir("Arena", "Rock")).unwrap(), b"keep");
    }

    #[test]
    fn test_cleanup_rejects_unusable_names() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path().join("out"));
        compiler.compile(&project()).unwrap();

        assert!(matches!(compiler.cleanup("Arena", ".."), Err(DefinitionError::InvalidName(_))));
        assert!(matches!(compiler.cleanup("", "Player"), Err(DefinitionError::InvalidName(_))));
        assert!(compiler.actor_definition_path("Arena", "Player").exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let compiler = DefinitionCompiler::new(dir.path());
        compiler.compile(&project()).unwrap();

        assert!(compiler.cleanup("Arena", "Player").unwrap());
        assert!(!compiler.object_dir("Arena", "Player").exists());
        assert!(!compiler.cleanup("Arena", "Player").unwrap());
    }
}
