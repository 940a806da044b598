//! The intelligence evaluator.
//!
//! [`evaluate`] is a pure function: the same candidates, settings and
//! position context always produce the same ranking. The input slice is
//! never modified; callers get a fresh list back.

use crate::candidate::{MoveCandidate, MATE_SCORE_PAWNS};
use crate::multipliers::{apply_multiplier, composite_multiplier, CRITICAL_MOVE_COUNT};
use crate::settings::IntelligenceSettings;
use tracing::{debug, info};

/// Evaluation above which "stay equal" starts giving the advantage back.
pub const STAY_EQUAL_TRIGGER: f64 = 1.5;
/// Lower bound of the score window "stay equal" prefers.
pub const STAY_EQUAL_FLOOR: f64 = 0.5;
/// Distance below the best score that "stay equal" requires.
pub const STAY_EQUAL_MARGIN: f64 = 0.3;

/// Facts about the position the candidates were searched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionContext {
    /// Number of legal moves for the side to move
    pub legal_moves: usize,
    /// Full-move number, starting at 1
    pub fullmove: u32,
}

impl PositionContext {
    pub fn new(legal_moves: usize, fullmove: u32) -> Self {
        Self {
            legal_moves,
            fullmove,
        }
    }

    /// Context for candidates whose position is not known: never critical,
    /// never early in the game.
    pub fn unknown() -> Self {
        Self {
            legal_moves: usize::MAX,
            fullmove: u32::MAX,
        }
    }

    /// Few legal moves means the choice is nearly forced.
    pub fn is_critical(&self) -> bool {
        self.legal_moves < CRITICAL_MOVE_COUNT
    }
}

/// Re-ranks `candidates` according to `settings`.
///
/// The result has the same length as the input. Forced mates are scored
/// absolutely and bypass every multiplier. When the avoidance fallback
/// triggers the untouched input is returned instead.
pub fn evaluate(
    candidates: &[MoveCandidate],
    settings: &IntelligenceSettings,
    context: &PositionContext,
) -> Vec<MoveCandidate> {
    if !settings.enabled {
        return candidates.to_vec();
    }

    let critical = context.is_critical();
    let mut ranked = candidates.to_vec();

    for candidate in ranked.iter_mut() {
        if let Some(mate_in) = candidate.mate_in.filter(|n| *n != 0) {
            let score = if mate_in > 0 {
                MATE_SCORE_PAWNS
            } else {
                -MATE_SCORE_PAWNS
            };
            candidate.set_score_pawns(score);
            continue;
        }

        if settings.checkmate_immediately && candidate.flags.delivers_mate {
            candidate.set_score_pawns(MATE_SCORE_PAWNS);
            continue;
        }

        let multiplier = composite_multiplier(&candidate.flags, settings, context.fullmove);
        let score = apply_multiplier(candidate.score_pawns, multiplier, critical);
        candidate.apply_modification(score, multiplier);
    }

    ranked.sort_by(|a, b| b.score_pawns.total_cmp(&a.score_pawns));

    if settings.stay_equal {
        prefer_equalising_moves(&mut ranked);
    }

    if settings.should_avoid_low_intelligence() {
        let threshold = settings.clamped_threshold();
        if let Some(best) = ranked.first() {
            if best.score_pawns <= threshold {
                info!(
                    "🧠 Intelligence avoided: best score {:.2} <= threshold {:.2}",
                    best.score_pawns, threshold
                );
                return candidates.to_vec();
            }
        }
    }

    ranked
}

fn is_winning_mate(candidate: &MoveCandidate) -> bool {
    candidate.score_pawns >= MATE_SCORE_PAWNS
}

/// Moves candidates that keep a clearly won game close ahead of the rest,
/// without dropping any and without overtaking a winning mate.
fn prefer_equalising_moves(ranked: &mut Vec<MoveCandidate>) {
    let best = ranked
        .iter()
        .filter(|c| !is_winning_mate(c) && !c.is_forced_mate())
        .map(MoveCandidate::engine_score_pawns)
        .fold(f64::NEG_INFINITY, f64::max);

    if best <= STAY_EQUAL_TRIGGER {
        return;
    }

    let ceiling = best - STAY_EQUAL_MARGIN;
    let (mates, rest): (Vec<_>, Vec<_>) = ranked.drain(..).partition(is_winning_mate);
    let (equalising, others): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|c| c.score_pawns > STAY_EQUAL_FLOOR && c.score_pawns < ceiling);

    debug!(
        "Stay-equal promoted {} of {} candidates (eval {:.2})",
        equalising.len(),
        equalising.len() + others.len(),
        best
    );

    ranked.extend(mates);
    ranked.extend(equalising);
    ranked.extend(others);
}
