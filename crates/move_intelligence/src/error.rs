//! Error types for chess-rule lookups.

/// Failures while interpreting positions and moves.
///
/// None of these are fatal to an evaluation: a candidate whose move cannot
/// be classified simply keeps neutral flags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The FEN text could not be parsed or describes an impossible position
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    /// The text is not a move in UCI notation
    #[error("Malformed move: {0}")]
    MalformedMove(String),

    /// The move is well formed but not legal in the position
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// A `position` command that does not follow the UCI grammar
    #[error("Malformed position command: {0}")]
    MalformedCommand(String),
}
