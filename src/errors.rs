//! Error types shared across the engine.
//!
//! Everything that can fail does so locally: a bad FEN, a bad move string, a
//! missing book file. None of these are fatal to the UCI loop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square name: {0}")]
    InvalidSquareName(String),

    #[error("invalid move string: {0}")]
    InvalidMoveString(String),

    #[error("move {0} is not legal in the current position")]
    IllegalMove(String),

    #[error("corrupt move description {0:#x}")]
    CorruptMoveDescription(u64),

    #[error("unmake with no prior make: undo stack is empty")]
    EmptyUndoStack,

    #[error("opening book {path}: {source}")]
    BookIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("opening book {path} is not a whole number of 16-byte entries")]
    BookTruncated { path: String },

    #[error("invalid value '{value}' for option {name}")]
    InvalidOptionValue { name: String, value: String },
}

pub type ChessResult<T> = Result<T, ChessError>;
