use flowpack_build::BuildError;
use flowpack_container::ContainerError;
use flowpack_core::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackagerError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PackagerError>;
