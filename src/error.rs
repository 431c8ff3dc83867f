use thiserror::Error;

/// Errors raised while building a maze field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MazeError {
    /// Both dimensions must be at least one cell.
    #[error("maze dimensions must be positive (rows: {rows}, cols: {cols})")]
    InvalidDimensions { rows: usize, cols: usize },

    /// The grid storage could not be sized or allocated.
    #[error("not enough memory for a {rows}x{cols} maze")]
    ResourceExhausted { rows: usize, cols: usize },
}
