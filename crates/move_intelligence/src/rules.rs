//! Chess rules used to classify candidate moves.
//!
//! The evaluator itself never looks at a board. Everything it needs to know
//! about a move arrives as [`MoveFlags`], produced by a [`ChessRules`]
//! implementation. [`ShakmatyRules`] is the implementation used by the
//! server; tests are free to supply their own.

use crate::candidate::{CastleSide, MoveFlags, PieceKind};
use crate::error::RulesError;
use shakmaty::{
    attacks, fen::Fen, uci::UciMove, Bitboard, Board, CastlingMode, CastlingSide, Chess, Color,
    Move, Position, Role,
};
use tracing::debug;

/// Position parsing, move generation and move classification.
pub trait ChessRules: Send + Sync {
    type Position: Clone + Send + Sync;

    /// The standard starting position.
    fn start_position(&self) -> Self::Position;

    /// Parses a FEN string.
    fn parse(&self, fen: &str) -> Result<Self::Position, RulesError>;

    /// Legal moves for the side to move, in UCI notation.
    fn legal_moves(&self, position: &Self::Position) -> Vec<String>;

    /// Describes what `uci` does in `position`.
    fn classify(&self, position: &Self::Position, uci: &str) -> Result<MoveFlags, RulesError>;

    /// Plays `uci` and returns the resulting position.
    fn apply(&self, position: &Self::Position, uci: &str) -> Result<Self::Position, RulesError>;

    /// Full-move number, starting at 1.
    fn fullmove_number(&self, position: &Self::Position) -> u32;
}

/// [`ChessRules`] backed by the `shakmaty` move generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    pub fn new() -> Self {
        Self
    }

    fn to_move(&self, position: &Chess, uci: &str) -> Result<Move, RulesError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| RulesError::MalformedMove(uci.to_string()))?;
        parsed
            .to_move(position)
            .map_err(|_| RulesError::IllegalMove(uci.to_string()))
    }
}

impl ChessRules for ShakmatyRules {
    type Position = Chess;

    fn start_position(&self) -> Chess {
        Chess::default()
    }

    fn parse(&self, fen: &str) -> Result<Chess, RulesError> {
        let parsed: Fen = fen.parse().map_err(|e| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })?;
        parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen {
                fen: fen.to_string(),
                reason: format!("{e}"),
            })
    }

    fn legal_moves(&self, position: &Chess) -> Vec<String> {
        position
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .collect()
    }

    fn classify(&self, position: &Chess, uci: &str) -> Result<MoveFlags, RulesError> {
        let chess_move = self.to_move(position, uci)?;
        let mover = position.turn();

        let mut after = position.clone();
        after.play_unchecked(&chess_move);

        Ok(MoveFlags {
            piece: Some(piece_kind(chess_move.role())),
            capture: chess_move.is_capture(),
            check: after.is_check(),
            castle: chess_move.castling_side().map(castle_side),
            en_passant: chess_move.is_en_passant(),
            promotion: chess_move.promotion().map(piece_kind),
            creates_pin: creates_pin(position.board(), after.board(), mover),
            delivers_mate: after.is_checkmate(),
        })
    }

    fn apply(&self, position: &Chess, uci: &str) -> Result<Chess, RulesError> {
        let chess_move = self.to_move(position, uci)?;
        let mut next = position.clone();
        next.play_unchecked(&chess_move);
        Ok(next)
    }

    fn fullmove_number(&self, position: &Chess) -> u32 {
        position.fullmoves().get()
    }
}

fn piece_kind(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn castle_side(side: CastlingSide) -> CastleSide {
    match side {
        CastlingSide::KingSide => CastleSide::Kingside,
        CastlingSide::QueenSide => CastleSide::Queenside,
    }
}

/// Pieces of `victim` pinned to their king by sliders of `attacker`.
fn pinned_pieces(board: &Board, attacker: Color, victim: Color) -> Bitboard {
    let Some(king) = board.king_of(victim) else {
        return Bitboard::EMPTY;
    };

    let queens = board.by_role(Role::Queen);
    let orthogonal = attacks::rook_attacks(king, Bitboard::EMPTY)
        & (board.by_role(Role::Rook) | queens);
    let diagonal = attacks::bishop_attacks(king, Bitboard::EMPTY)
        & (board.by_role(Role::Bishop) | queens);
    let snipers = (orthogonal | diagonal) & board.by_color(attacker);

    let mut pinned = Bitboard::EMPTY;
    for sniper in snipers {
        let blockers = attacks::between(king, sniper) & board.occupied();
        if blockers.count() == 1 && !(blockers & board.by_color(victim)).is_empty() {
            pinned |= blockers;
        }
    }
    pinned
}

fn creates_pin(before: &Board, after: &Board, mover: Color) -> bool {
    let old = pinned_pieces(before, mover, !mover);
    let new = pinned_pieces(after, mover, !mover);
    !(new & !old).is_empty()
}

/// Follows the `position` commands sent to an engine so that its analysis
/// can be classified against the right board.
pub struct PositionTracker<R: ChessRules> {
    position: Option<R::Position>,
}

impl<R: ChessRules> Default for PositionTracker<R> {
    fn default() -> Self {
        Self { position: None }
    }
}

impl<R: ChessRules> PositionTracker<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last position set, if any.
    pub fn current(&self) -> Option<&R::Position> {
        self.position.as_ref()
    }

    /// Inspects a command on its way to the engine.
    ///
    /// Returns `Ok(true)` when the command set a new position. A command that
    /// cannot be followed clears the tracked position, since the engine's
    /// idea of the board is then unknown.
    pub fn observe(&mut self, rules: &R, command: &str) -> Result<bool, RulesError> {
        let mut tokens = command.split_whitespace();
        match tokens.next() {
            Some("position") => {}
            Some("ucinewgame") => {
                self.position = None;
                return Ok(false);
            }
            _ => return Ok(false),
        }

        match Self::resolve(rules, tokens) {
            Ok(position) => {
                self.position = Some(position);
                Ok(true)
            }
            Err(e) => {
                debug!("Lost track of engine position: {}", e);
                self.position = None;
                Err(e)
            }
        }
    }

    fn resolve<'a>(
        rules: &R,
        mut tokens: impl Iterator<Item = &'a str>,
    ) -> Result<R::Position, RulesError> {
        let mut position = match tokens.next() {
            Some("startpos") => {
                let position = rules.start_position();
                match tokens.next() {
                    None | Some("moves") => {}
                    Some(other) => {
                        return Err(RulesError::MalformedCommand(format!(
                            "unexpected token '{other}' after startpos"
                        )))
                    }
                }
                position
            }
            Some("fen") => {
                let fen: Vec<&str> = tokens.by_ref().take_while(|t| *t != "moves").collect();
                if fen.is_empty() {
                    return Err(RulesError::MalformedCommand("missing FEN".to_string()));
                }
                rules.parse(&fen.join(" "))?
            }
            other => {
                return Err(RulesError::MalformedCommand(format!(
                    "expected startpos or fen, got {other:?}"
                )))
            }
        };

        for uci in tokens {
            position = rules.apply(&position, uci)?;
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ShakmatyRules {
        ShakmatyRules::new()
    }

    #[test]
    fn test_start_position_has_twenty_moves() {
        let rules = rules();
        let start = rules.start_position();
        assert_eq!(rules.legal_moves(&start).len(), 20);
        assert_eq!(rules.fullmove_number(&start), 1);
    }

    #[test]
    fn test_classify_quiet_and_capture() {
        let rules = rules();
        let position = rules
            .parse("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
            .expect("valid fen");

        let capture = rules.classify(&position, "e4d5").expect("legal");
        assert_eq!(capture.piece, Some(PieceKind::Pawn));
        assert!(capture.capture);
        assert!(!capture.check);

        let quiet = rules.classify(&position, "g1f3").expect("legal");
        assert_eq!(quiet.piece, Some(PieceKind::Knight));
        assert!(!quiet.capture);
    }

    #[test]
    fn test_classify_castle_and_check() {
        let rules = rules();
        let position = rules
            .parse("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 20")
            .expect("valid fen");

        let castle = rules.classify(&position, "e1g1").expect("legal");
        assert_eq!(castle.castle, Some(CastleSide::Kingside));
        assert_eq!(castle.piece, Some(PieceKind::King));

        let long = rules.classify(&position, "e1c1").expect("legal");
        assert_eq!(long.castle, Some(CastleSide::Queenside));

        let check = rules.classify(&position, "a1a8").expect("legal");
        assert!(check.check);
        assert!(check.capture);
    }

    #[test]
    fn test_classify_en_passant_and_promotion() {
        let rules = rules();
        let ep = rules
            .parse("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 30")
            .expect("valid fen");
        let flags = rules.classify(&ep, "e5d6").expect("legal");
        assert!(flags.en_passant);
        assert!(flags.capture);

        let promo = rules.parse("8/4P3/8/8/8/8/k7/4K3 w - - 0 50").expect("valid fen");
        let flags = rules.classify(&promo, "e7e8q").expect("legal");
        assert_eq!(flags.promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn test_classify_mate_and_pin() {
        let rules = rules();
        // Scholar's mate.
        let position = rules
            .parse("r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .expect("valid fen");
        let mate = rules.classify(&position, "h5f7").expect("legal");
        assert!(mate.delivers_mate);
        assert!(mate.check);

        // Bb5 pins the c6 knight to the e8 king.
        let position = rules
            .parse("4k3/8/2n5/8/8/8/8/4KB2 w - - 0 30")
            .expect("valid fen");
        let pin = rules.classify(&position, "f1b5").expect("legal");
        assert!(pin.creates_pin);
        let no_pin = rules.classify(&position, "f1c4").expect("legal");
        assert!(!no_pin.creates_pin);
    }

    #[test]
    fn test_classify_rejects_bad_moves() {
        let rules = rules();
        let start = rules.start_position();
        assert_eq!(
            rules.classify(&start, "zz99"),
            Err(RulesError::MalformedMove("zz99".to_string()))
        );
        assert_eq!(
            rules.classify(&start, "e2e5"),
            Err(RulesError::IllegalMove("e2e5".to_string()))
        );
    }

    #[test]
    fn test_tracker_follows_position_commands() {
        let rules = rules();
        let mut tracker = PositionTracker::<ShakmatyRules>::new();

        assert_eq!(tracker.observe(&rules, "go depth 10"), Ok(false));
        assert!(tracker.current().is_none());

        assert_eq!(tracker.observe(&rules, "position startpos moves e2e4 e7e5"), Ok(true));
        let position = tracker.current().expect("tracked");
        assert_eq!(rules.fullmove_number(position), 2);
        assert_eq!(position.turn(), Color::White);

        assert_eq!(
            tracker.observe(&rules, "position fen 4k3/8/8/8/8/8/8/4K2R w K - 0 40 moves e1g1"),
            Ok(true)
        );
        assert_eq!(tracker.current().map(|p| p.turn()), Some(Color::Black));

        assert!(tracker.observe(&rules, "position startpos moves e2e5").is_err());
        assert!(tracker.current().is_none());

        tracker.observe(&rules, "position startpos").expect("startpos");
        tracker.observe(&rules, "ucinewgame").expect("newgame");
        assert!(tracker.current().is_none());
    }
}
