//! Error types shared by the engine crates.

use crate::MAX_TILE_KINDS;

/// Faults raised while handling an engine command.
///
/// None of these leave the engine in a partial state: the first two are
/// rejected before any mutation, and the cascade limit is reported after the
/// grid has been force-settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("coordinates ({row}, {col}) are outside the grid")]
    InvalidCoordinates { row: i32, col: i32 },

    #[error("cell ({row}, {col}) is empty")]
    EmptyCellOperation { row: i32, col: i32 },

    #[error("cascade did not settle within {limit} passes")]
    CascadeIterationLimitExceeded { limit: u32 },
}

impl EngineError {
    /// Stable machine-readable code, used by the adapter protocol.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidCoordinates { .. } => "invalid_coordinates",
            EngineError::EmptyCellOperation { .. } => "empty_cell",
            EngineError::CascadeIterationLimitExceeded { .. } => "cascade_limit",
        }
    }
}

/// Rejected construction-time configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions {width}x{height} must each be in 1..={max}")]
    Dimensions { width: u8, height: u8, max: u8 },

    #[error("tile kind count {0} must be in 1..={max}", max = MAX_TILE_KINDS)]
    TileKinds(u8),

    #[error("max cascade passes must be at least 1")]
    ZeroCascadeBound,

    #[error("tile source yields {actual} kinds, config expects {expected}")]
    SourceKinds { expected: u8, actual: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::InvalidCoordinates { row: -1, col: 0 }.code(),
            "invalid_coordinates"
        );
        assert_eq!(
            EngineError::EmptyCellOperation { row: 0, col: 0 }.code(),
            "empty_cell"
        );
        assert_eq!(
            EngineError::CascadeIterationLimitExceeded { limit: 4 }.code(),
            "cascade_limit"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidCoordinates { row: 9, col: -2 };
        assert_eq!(err.to_string(), "coordinates (9, -2) are outside the grid");

        let err = ConfigError::TileKinds(0);
        assert_eq!(err.to_string(), "tile kind count 0 must be in 1..=16");
    }
}
