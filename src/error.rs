use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("grid {rows}x{cols} is too small to hold a player and the minimum points")]
    TooSmall { rows: usize, cols: usize },
    #[error("no valid maze after {attempts} attempts")]
    Exhausted { attempts: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridParseError {
    #[error("grid has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed score file: {0}")]
    Json(#[from] serde_json::Error),
}
