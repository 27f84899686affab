//! One resolution-and-compile pass over a project.

use crate::actor::ActorConfig;
use crate::attributes::RawProperty;
use crate::compiler::{CompileOutcome, DefinitionCompiler};
use crate::error::DefinitionError;
use crate::scene::Project;
use crate::templates::{TemplateCache, TemplateRules};
use tracing::{debug, info};

/// Brings one object's configuration up to date without touching disk:
/// registry sync, RPC arguments, built-in modules, template import,
/// composition and default state groups, in that order.
pub fn prepare_object(
    actor: &mut ActorConfig,
    properties: &[RawProperty],
    cache: &mut TemplateCache,
    rules: &TemplateRules,
) {
    actor.sync_attributes(properties);
    actor.resolve_rpc_arguments();
    actor.ensure_builtin_modules(rules);
    actor.load_template_modules(cache, rules);
    actor.compose_defaults();
    actor.ensure_state_groups();
}

/// Prepares every networked object of every scene. Returns how many objects
/// were prepared.
pub fn prepare_project(project: &mut Project, cache: &mut TemplateCache, rules: &TemplateRules) -> usize {
    let mut prepared = 0;

    for scene in &mut project.scenes {
        for object in &mut scene.objects {
            let Some(actor) = object.network.as_mut() else {
                continue;
            };

            debug!("Preparing {}/{}", scene.name, object.name);
            prepare_object(actor, &object.properties, cache, rules);
            prepared += 1;
        }
    }

    prepared
}

/// Runs a full pass: prepares every networked object, then compiles the
/// definition tree.
pub fn run_pass(
    project: &mut Project,
    cache: &mut TemplateCache,
    rules: &TemplateRules,
    compiler: &DefinitionCompiler,
) -> Result<CompileOutcome, DefinitionError> {
    let prepared = prepare_project(project, cache, rules);
    info!("🔧 Prepared {} networked object(s)", prepared);

    compiler.compile(project)
}
