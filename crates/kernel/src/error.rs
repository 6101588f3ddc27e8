/// Errors from scene graph operations.
///
/// Every fallible graph operation validates before mutating, so an error
/// always means the graph is unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),
    #[error("node '{node}' ({kind}) has no attribute '{name}'")]
    UnknownAttribute {
        node: String,
        kind: &'static str,
        name: String,
    },
    #[error("invalid value for attribute '{name}' on node '{node}': {reason}")]
    InvalidAttributeValue {
        node: String,
        name: String,
        reason: String,
    },
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),
    #[error("node '{0}' has no clip box child")]
    NoClipVolume(String),
    #[error("invalid node description: {0}")]
    InvalidDescription(String),
    #[error("the scene root cannot be removed")]
    RootRemoval,
}

/// Errors from reading a node description file.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported description format '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}
