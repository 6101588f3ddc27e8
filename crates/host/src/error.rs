use scenegraph_dispatch::DispatchError;
use scenegraph_kernel::{DescriptionError, GraphError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("scene description: {0}")]
    Description(#[from] DescriptionError),

    #[error("config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("node '{node}' has no numeric '{attribute}' attribute")]
    NotDrivable { node: String, attribute: &'static str },
}
