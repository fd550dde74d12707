//! Errors raised while building grids and rendering layers.

/// Errors from world generation.
#[derive(Debug, thiserror::Error)]
pub enum WorldgenError {
    /// A grid or field was requested with a zero dimension.
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    /// A flat buffer did not match the requested field shape.
    #[error("buffer of length {actual} does not fit a {width}x{height} field")]
    ShapeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// A view mode needs a layer that was not generated.
    #[error("layer `{0}` was not generated")]
    MissingLayer(&'static str),
}
