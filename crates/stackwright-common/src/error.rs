//! Unified error types for the Stackwright workspace.
//!
//! Every library crate returns these variants directly. Errors raised by a
//! child builder travel to the caller unchanged; nothing re-wraps them.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackwrightError {
    /// The infrastructure engine rejected a resource declaration.
    #[error("declaration of {urn} rejected: {message}")]
    Declaration {
        /// URN of the rejected declaration.
        urn: String,
        /// Engine-supplied reason.
        message: String,
    },

    /// An existing-resource lookup failed and the active policy aborts.
    #[error("lookup of {kind} \"{name}\" failed: {message}")]
    Lookup {
        /// Kind of resource being looked up.
        kind: &'static str,
        /// Name that was looked up.
        name: String,
        /// Underlying lookup failure.
        message: String,
    },

    /// A resource with the same logical name already exists under the same parent.
    #[error("duplicate resource: {urn}")]
    DuplicateResource {
        /// URN of the conflicting declaration.
        urn: String,
    },

    /// A stack output with the same name was already exported.
    #[error("duplicate export: {name}")]
    DuplicateExport {
        /// Name of the export.
        name: String,
    },

    /// A referenced resource was never declared in this deployment.
    #[error("unknown resource: {urn}")]
    UnknownResource {
        /// URN that could not be found.
        urn: String,
    },

    /// A resource kind does not expose the requested output property.
    #[error("{urn} has no output named {property}")]
    UnknownOutput {
        /// Resource that was asked for the output.
        urn: String,
        /// Requested output property.
        property: String,
    },

    /// A component tried to publish an output produced outside its subtree.
    #[error(
        "component {component} cannot export {output}: {producer} is not one of its descendants"
    )]
    ForeignOutput {
        /// Component registering the outputs.
        component: String,
        /// Name of the offending output.
        output: String,
        /// URN of the resource that produced the referenced value.
        producer: String,
    },

    /// A deferred value was resolved more than once.
    #[error("output {property} of {urn} is already resolved")]
    AlreadyResolved {
        /// Producer of the deferred value.
        urn: String,
        /// Output property name.
        property: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency detected in resource graph")]
    Cycle,

    /// A caller-supplied parameter is invalid.
    #[error("invalid input {field}: {message}")]
    InvalidInput {
        /// Offending parameter.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML parsing failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackwrightError>;
