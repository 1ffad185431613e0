use thiserror::Error;

/// Rejected pool registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolConfigError {
    #[error("at most {max} event pools are supported")]
    TooManyPools { max: usize },
    #[error("pool {index} block size {size} does not exceed the previous block size {previous}")]
    NotAscending {
        index: usize,
        size: usize,
        previous: usize,
    },
    #[error("pool {index} needs at least one block of non-zero size")]
    Empty { index: usize },
    #[error("pool {index} holds {blocks} blocks; the limit is {max}")]
    TooManyBlocks {
        index: usize,
        blocks: usize,
        max: usize,
    },
}
