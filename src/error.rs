use thiserror::Error;

pub type Result<T, E = PolygonizeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PolygonizeError {
    /// A quad was about to reference a cell that never received a vertex.
    ///
    /// The surface crossed a grid edge without producing a vertex in every
    /// cell around that edge, so the connectivity can't be trusted.
    #[error("cell {cell:?} has no vertex but borders a sign change along axis {axis}")]
    MissingCellVertex { cell: [usize; 3], axis: usize },

    #[error("expected {expected} control points, got {actual}")]
    InvalidControlPoints { expected: usize, actual: usize },

    #[error("{name} must be at least {min}, got {actual}")]
    InvalidSegmentCount {
        name: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("invalid surface config: {0}")]
    Config(#[from] toml::de::Error),
}
