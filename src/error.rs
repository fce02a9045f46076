use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed ({status}): {stderr}")]
    #[diagnostic(help("check that VirtualBox is installed and the VM name or UUID is correct"))]
    ExternalCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} output has no '{field}' field")]
    MissingField { command: String, field: String },

    #[error("unknown resource type '{resource_type}'")]
    UnknownResource { resource_type: String },

    #[error("resource '{resource_type}' does not support '{op}'")]
    UnsupportedOperation { resource_type: String, op: String },

    #[error("malformed request: {message}")]
    Protocol { message: String },
}
