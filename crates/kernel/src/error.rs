use rtk_active::{ConfigError, PostError};
use rtk_core::Priority;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("no active object at priority {0}")]
    NotRegistered(Priority),
    #[error("post refused: {0}")]
    Post(#[from] PostError),
}
