//! # Move Intelligence
//!
//! Re-ranks the candidate moves a UCI engine produces according to a
//! configurable "personality". The engine's raw evaluation stays the source
//! of truth; the personality nudges it with multipliers for the kind of move
//! being played (captures, castling, checks, piece preferences, ...).
//!
//! ## Pipeline
//!
//! 1. [`AnalysisCollector`] turns `info ... pv ...` lines into
//!    [`MoveCandidate`]s and closes the set on `bestmove`.
//! 2. A [`ChessRules`] implementation classifies each candidate against the
//!    position the engine searched ([`PositionTracker`] follows it).
//! 3. [`evaluate`] applies the multipliers and re-sorts.
//!
//! [`rank_candidates`] runs steps 2 and 3 in one call.
//!
//! ## Determinism
//!
//! [`evaluate`] has no hidden state: the same inputs always give the same
//! output, which is what makes the personality testable.

pub mod analysis;
pub mod candidate;
pub mod error;
pub mod evaluator;
pub mod multipliers;
pub mod rules;
pub mod settings;

pub use analysis::{parse_bestmove, parse_info_line, AnalysisCollector, AnalysisEvent, InfoLine, Score};
pub use candidate::{CastleSide, MoveCandidate, MoveFlags, PieceKind, MATE_SCORE_PAWNS};
pub use error::RulesError;
pub use evaluator::{evaluate, PositionContext};
pub use rules::{ChessRules, PositionTracker, ShakmatyRules};
pub use settings::IntelligenceSettings;

use tracing::debug;

/// Classifies `candidates` in `position` and evaluates them.
///
/// A candidate whose move cannot be classified keeps neutral flags, which
/// gives it a multiplier of 1.0.
pub fn rank_candidates<R: ChessRules>(
    rules: &R,
    position: &R::Position,
    candidates: &[MoveCandidate],
    settings: &IntelligenceSettings,
) -> Vec<MoveCandidate> {
    let classified: Vec<MoveCandidate> = candidates
        .iter()
        .map(|candidate| {
            let mut candidate = candidate.clone();
            match rules.classify(position, &candidate.uci) {
                Ok(flags) => candidate.flags = flags,
                Err(e) => debug!("Leaving {} unclassified: {}", candidate.uci, e),
            }
            candidate
        })
        .collect();

    let context = PositionContext::new(
        rules.legal_moves(position).len(),
        rules.fullmove_number(position),
    );

    evaluate(&classified, settings, &context)
}
