//! Move candidates and their classification flags.

use serde::{Deserialize, Serialize};

/// Score given to forced mates, in pawns.
pub const MATE_SCORE_PAWNS: f64 = 1000.0;

/// Piece types as far as move preferences are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// Side of the board a castling move goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Board-level facts about a move, filled in by a [`crate::ChessRules`]
/// implementation. Defaults describe a quiet move of an unknown piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveFlags {
    /// Piece being moved
    pub piece: Option<PieceKind>,
    pub capture: bool,
    pub check: bool,
    pub castle: Option<CastleSide>,
    pub en_passant: bool,
    /// Piece promoted to, if any
    pub promotion: Option<PieceKind>,
    /// The move pins an enemy piece that was not pinned before
    pub creates_pin: bool,
    /// The move checkmates on the board
    pub delivers_mate: bool,
}

impl MoveFlags {
    pub fn is_castle(&self) -> bool {
        self.castle.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

/// One candidate move with its engine analysis and intelligence bookkeeping.
///
/// `score_cp` and `score_pawns` always describe the same value; update them
/// through [`MoveCandidate::set_score_pawns`] or
/// [`MoveCandidate::apply_modification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCandidate {
    /// Move in UCI notation, e.g. `e2e4` or `e7e8q`
    pub uci: String,
    pub score_cp: i32,
    pub score_pawns: f64,
    pub depth: u32,
    /// Moves to mate, positive when the side to move mates; `None` otherwise
    pub mate_in: Option<i32>,
    /// Principal variation starting with this move
    pub pv: Vec<String>,
    pub nodes: u64,
    pub flags: MoveFlags,

    /// Engine score before the first intelligence pass
    pub original_score_pawns: Option<f64>,
    pub multiplier: f64,
    pub modified: bool,
}

impl MoveCandidate {
    /// Creates a candidate scored in centipawns.
    pub fn new(uci: impl Into<String>, score_cp: i32) -> Self {
        Self {
            uci: uci.into(),
            score_cp,
            score_pawns: f64::from(score_cp) / 100.0,
            depth: 0,
            mate_in: None,
            pv: Vec::new(),
            nodes: 0,
            flags: MoveFlags::default(),
            original_score_pawns: None,
            multiplier: 1.0,
            modified: false,
        }
    }

    /// Creates a candidate reported as mate in `mate_in` moves.
    pub fn with_mate(uci: impl Into<String>, mate_in: i32) -> Self {
        let mut candidate = Self::new(uci, 0);
        candidate.mate_in = Some(mate_in);
        candidate.set_score_pawns(if mate_in < 0 {
            -MATE_SCORE_PAWNS
        } else {
            MATE_SCORE_PAWNS
        });
        candidate
    }

    pub fn with_flags(mut self, flags: MoveFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Origin square, the first two characters of the UCI text.
    pub fn from_square(&self) -> Option<&str> {
        self.uci.get(0..2)
    }

    /// Destination square.
    pub fn to_square(&self) -> Option<&str> {
        self.uci.get(2..4)
    }

    /// Promotion letter, if the UCI text carries one.
    pub fn promotion_char(&self) -> Option<char> {
        self.uci.chars().nth(4)
    }

    /// A non-zero mate score.
    pub fn is_forced_mate(&self) -> bool {
        matches!(self.mate_in, Some(n) if n != 0)
    }

    /// Sets the score in pawns and re-derives centipawns.
    pub fn set_score_pawns(&mut self, pawns: f64) {
        self.score_pawns = pawns;
        self.score_cp = (pawns * 100.0).round() as i32;
    }

    /// Records an intelligence adjustment. The pre-modification score is
    /// captured on the first call only.
    pub fn apply_modification(&mut self, new_score_pawns: f64, multiplier: f64) {
        if !self.modified {
            self.original_score_pawns = Some(self.score_pawns);
        }
        self.set_score_pawns(new_score_pawns);
        self.multiplier = multiplier;
        self.modified = true;
    }

    /// Score the engine reported, ignoring any intelligence adjustment.
    pub fn engine_score_pawns(&self) -> f64 {
        self.original_score_pawns.unwrap_or(self.score_pawns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_stay_consistent() {
        let mut candidate = MoveCandidate::new("e2e4", 35);
        assert_eq!(candidate.score_pawns, 0.35);

        candidate.set_score_pawns(-1.234);
        assert_eq!(candidate.score_cp, -123);
    }

    #[test]
    fn test_original_score_written_once() {
        let mut candidate = MoveCandidate::new("g1f3", 50);
        candidate.apply_modification(0.75, 1.5);
        candidate.apply_modification(1.125, 1.5);

        assert_eq!(candidate.original_score_pawns, Some(0.5));
        assert_eq!(candidate.score_pawns, 1.125);
        assert_eq!(candidate.score_cp, 113);
        assert!(candidate.modified);
    }

    #[test]
    fn test_mate_candidate() {
        let mating = MoveCandidate::with_mate("d8h4", 2);
        assert!(mating.is_forced_mate());
        assert_eq!(mating.score_pawns, MATE_SCORE_PAWNS);

        let mated = MoveCandidate::with_mate("a2a3", -1);
        assert_eq!(mated.score_pawns, -MATE_SCORE_PAWNS);
    }

    #[test]
    fn test_square_accessors() {
        let candidate = MoveCandidate::new("e7e8q", 900);
        assert_eq!(candidate.from_square(), Some("e7"));
        assert_eq!(candidate.to_square(), Some("e8"));
        assert_eq!(candidate.promotion_char(), Some('q'));
        assert_eq!(MoveCandidate::new("e2e4", 0).promotion_char(), None);
    }
}
