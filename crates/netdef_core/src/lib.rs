//! # netdef_core - Network Definition Pipeline
//!
//! Resolves the replication configuration of networked scene objects and
//! compiles it into the definition files a networking runtime loads at
//! startup.
//!
//! ## Pipeline
//!
//! Every pass walks each networked object of each scene:
//!
//! 1. **Attribute registry** ([`attributes`]) mirrors raw properties into
//!    typed descriptors, keeping the designer's replication flags.
//! 2. **RPC resolver** ([`rpc`]) recomputes which attributes each remote
//!    call may carry.
//! 3. **Template composition** ([`templates`]) imports template modules,
//!    discovers their classes and merges the active defaults with designer
//!    overrides.
//! 4. **State groups** ([`states`]) are seeded with the Server and Client
//!    groups.
//! 5. **Compiler** ([`compiler`]) writes `actor.definition` files for the
//!    active network scene plus `main.definition`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netdef_core::{
//!     run_pass, DefinitionCompiler, Project, RegisteredTemplates, Scene, SceneObject,
//!     TemplateCache, TemplateRules,
//! };
//!
//! let mut project = Project::new()
//!     .with_scene(Scene::new("Arena").with_object(SceneObject::new("Player").networked()));
//! project.set_use_network("Arena", true)?;
//!
//! let mut cache = TemplateCache::new(Box::new(RegisteredTemplates::new()));
//! let compiler = DefinitionCompiler::new("network_data");
//! run_pass(&mut project, &mut cache, &TemplateRules::default(), &compiler)?;
//! # Ok::<(), netdef_core::DefinitionError>(())
//! ```
//!
//! ## Concurrency
//!
//! Passes are synchronous and single-threaded. The only background work is
//! the optional [`version::VersionChecker`], which the compiler never waits
//! on.

pub mod actor;
pub mod attributes;
pub mod compiler;
pub mod definition;
pub mod error;
pub mod pipeline;
pub mod rpc;
pub mod scene;
pub mod states;
pub mod templates;
pub mod types;
pub mod version;

pub use actor::ActorConfig;
pub use attributes::{AttributeDescriptor, RawProperty};
pub use compiler::{CompileFailure, CompileOutcome, CompileReport, DefinitionCompiler};
pub use definition::{ActorDefinitionFile, MainDefinition};
pub use error::{DefinitionError, TemplateError, VersionCheckError};
pub use pipeline::{prepare_object, prepare_project, run_pass};
pub use rpc::{ArgumentDescriptor, RpcCall};
pub use scene::{ActiveNetworkScene, Project, Scene, SceneObject};
pub use states::{effective_visibility, NetmodeStateGroup, StateVisibility, STATE_COUNT};
pub use templates::{
    BuiltinModule, LayeredSource, RegisteredTemplates, ResolvedTemplateDefault, SchemaTemplateSource,
    TemplateCache, TemplateModule, TemplateRules, TemplateSource,
};
pub use types::{NetworkRole, RpcTarget, Value, ValueType};
pub use version::{evaluate, read_version_file, HttpVersionSource, VersionCheckResult, VersionChecker, VersionVerdict};
