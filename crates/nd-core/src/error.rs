//! Error types for nuisdiff

use thiserror::Error;

/// nuisdiff error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid combination of options
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pull definition name not present in the registry
    #[error("Method {name} not allowed, choose one of [{}]", allowed.join(","))]
    UnknownPullDefinition {
        /// Requested name
        name: String,
        /// Registered names
        allowed: Vec<String>,
    },

    /// Sort key name not recognized
    #[error("unknown sort key '{0}', choose one of [ correlation,impact,dnll ] for --sort-by")]
    UnknownSortKey(String),

    /// Output dialect name not recognized
    #[error("unknown output format '{0}', choose one of [ text,latex,twiki,html ]")]
    UnknownDialect(String),

    /// A required stored object is absent from the fit file
    #[error("File {file} does not contain the {what} '{name}'")]
    MissingObject {
        /// Fit file path
        file: String,
        /// Object key
        name: String,
        /// Human readable description
        what: String,
    },

    /// A stored object exists but has the wrong class
    #[error("Object '{name}' in {file} has class {found}, expected {expected}")]
    WrongObjectKind {
        /// Fit file path
        file: String,
        /// Object key
        name: String,
        /// Expected class name
        expected: String,
        /// Class name found
        found: String,
    },

    /// A workspace lacks a pdf or variable referenced by a nuisance parameter
    #[error("Workspace does not provide {kind} '{name}'")]
    MissingWorkspaceObject {
        /// `"pdf"` or `"variable"`
        kind: &'static str,
        /// Object name
        name: String,
    },

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
