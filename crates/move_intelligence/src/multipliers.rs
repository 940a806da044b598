//! Multiplier arithmetic used by the evaluator.

use crate::candidate::{CastleSide, MoveFlags, PieceKind};
use crate::settings::IntelligenceSettings;

/// Fraction of a multiplier's effect kept in critical positions.
pub const CRITICAL_DAMPING: f64 = 0.3;
/// Positions with fewer legal moves than this are critical.
pub const CRITICAL_MOVE_COUNT: usize = 3;
/// Last full move at which castling counts as "early".
pub const EARLY_CASTLE_LAST_MOVE: u32 = 15;

const SIDE_CASTLE_BONUS: f64 = 1.2;
const EARLY_CASTLE_BONUS: f64 = 1.2;
const QUEEN_PROMOTION_BONUS: f64 = 1.5;
const PIN_BONUS: f64 = 1.1;

/// Product of every preference that applies to a move.
pub fn composite_multiplier(
    flags: &MoveFlags,
    settings: &IntelligenceSettings,
    fullmove: u32,
) -> f64 {
    let mut multiplier = flags
        .piece
        .map(|piece| settings.piece_preference(piece))
        .unwrap_or(1.0);

    if flags.capture {
        multiplier *= settings.capture_preference;
    }

    if let Some(side) = flags.castle {
        multiplier *= castle_multiplier(side, settings, fullmove);
    }

    if flags.en_passant {
        multiplier *= settings.en_passant_preference;
    }

    if let Some(piece) = flags.promotion {
        multiplier *= settings.promotion_preference;
        if settings.always_promote_queen && piece == PieceKind::Queen {
            multiplier *= QUEEN_PROMOTION_BONUS;
        }
    }

    if flags.creates_pin && settings.prefer_pins {
        multiplier *= PIN_BONUS;
    }

    if flags.check {
        multiplier *= settings.aggressiveness_contempt;
    }

    multiplier
}

fn castle_multiplier(side: CastleSide, settings: &IntelligenceSettings, fullmove: u32) -> f64 {
    let mut multiplier = settings.castle_preference;

    if settings.prefer_side_castle && settings.castle_side == Some(side) {
        multiplier *= SIDE_CASTLE_BONUS;
    }

    if settings.prefer_early_castling && fullmove <= EARLY_CASTLE_LAST_MOVE {
        multiplier *= EARLY_CASTLE_BONUS;
    }

    multiplier
}

/// Pulls a multiplier towards 1.0 for critical positions.
pub fn dampen(multiplier: f64) -> f64 {
    if multiplier > 1.0 {
        1.0 + (multiplier - 1.0) * CRITICAL_DAMPING
    } else {
        1.0 - (1.0 - multiplier) * CRITICAL_DAMPING
    }
}

/// Applies a multiplier to an evaluation in pawns.
///
/// A positive evaluation is scaled up by a multiplier above one, a negative
/// one is divided so that a favoured move always becomes less bad.
pub fn apply_multiplier(eval: f64, multiplier: f64, critical: bool) -> f64 {
    if multiplier == 1.0 || eval == 0.0 {
        return eval;
    }

    let multiplier = if critical { dampen(multiplier) } else { multiplier };

    if eval > 0.0 {
        eval * multiplier
    } else {
        eval / multiplier
    }
}
