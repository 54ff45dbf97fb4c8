use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LduCoreError {
    #[error("Invalid matrix dimensions: {0}")]
    InvalidDimensions(String),

    #[error("{what} index {index} out of bounds for {size} unknowns")]
    IndexOutOfBounds {
        what: &'static str, // e.g. "owner", "neighbour"
        index: usize,
        size: usize,
    },
}
