//! Error types for the definition pipeline.
//!
//! Invariant violations are rejected at the mutation boundary (the methods on
//! `ActorConfig` and `Project`), so the compiler never observes them. Storage
//! failures always carry the path that failed.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Template class {module}.{class} is required and cannot be deactivated")]
    RequiredTemplate { module: String, class: String },

    #[error("Template module is built in and cannot be removed: {0}")]
    BuiltinModule(String),

    #[error("Template module already attached: {0}")]
    DuplicateModule(String),

    #[error("Invalid template module path: {0:?}")]
    InvalidModulePath(String),

    #[error("Template module not attached: {0}")]
    ModuleNotFound(String),

    #[error("Template class not found: {module}.{class}")]
    ClassNotFound { module: String, class: String },

    #[error("No resolved template default named {0}")]
    UnknownDefault(String),

    #[error("Type mismatch for {name}: expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: crate::types::ValueType,
        found: crate::types::ValueType,
    },

    #[error("RPC call already exists: {0}")]
    DuplicateRpc(String),

    #[error("RPC call not found: {0}")]
    RpcNotFound(String),

    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object is not networked: {0}")]
    NotNetworked(String),

    #[error("Name cannot be used as a directory: {0:?}")]
    InvalidName(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error at {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DefinitionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DefinitionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while importing a template module. Always non-fatal to a pass.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template module not found: {0}")]
    NotFound(String),

    #[error("Failed to read template module {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template module {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failures of the remote version check.
#[derive(Error, Debug)]
pub enum VersionCheckError {
    #[error("Version request failed: {0}")]
    Request(String),

    #[error("Invalid version response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read version file {path}: {source}")]
    VersionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
