//! Intelligence settings.
//!
//! A flat, serde-friendly description of the "personality" applied on top of
//! the engine's own ranking. Every multiplier defaults to `1.0`, so a default
//! settings block with the master flag switched on is a no-op apart from the
//! bookkeeping on each candidate.

use crate::candidate::{CastleSide, PieceKind};
use serde::{Deserialize, Serialize};

/// Lowest value the avoidance threshold is clamped to.
pub const MIN_AVOIDANCE_THRESHOLD: f64 = -3.0;
/// Highest value the avoidance threshold is clamped to.
pub const MAX_AVOIDANCE_THRESHOLD: f64 = -1.0;

fn default_threshold() -> f64 {
    -1.5
}

fn default_multiplier() -> f64 {
    1.0
}

/// Configuration for the intelligence evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligenceSettings {
    /// Master toggle; when off the evaluator returns its input untouched
    pub enabled: bool,

    /// Fall back to the engine's own ranking when the re-ranked best move
    /// scores at or below `low_intelligence_threshold`
    pub avoid_low_intelligence: bool,
    /// Avoidance threshold in pawns, clamped into [-3.0, -1.0] when used
    #[serde(default = "default_threshold")]
    pub low_intelligence_threshold: f64,

    #[serde(default = "default_multiplier")]
    pub aggressiveness_contempt: f64,
    #[serde(default = "default_multiplier")]
    pub capture_preference: f64,
    #[serde(default = "default_multiplier")]
    pub castle_preference: f64,
    #[serde(default = "default_multiplier")]
    pub en_passant_preference: f64,
    #[serde(default = "default_multiplier")]
    pub promotion_preference: f64,

    #[serde(default = "default_multiplier")]
    pub pawn_preference: f64,
    #[serde(default = "default_multiplier")]
    pub knight_preference: f64,
    #[serde(default = "default_multiplier")]
    pub bishop_preference: f64,
    #[serde(default = "default_multiplier")]
    pub rook_preference: f64,
    #[serde(default = "default_multiplier")]
    pub queen_preference: f64,
    #[serde(default = "default_multiplier")]
    pub king_preference: f64,

    /// Boost castling towards `castle_side`
    pub prefer_side_castle: bool,
    pub castle_side: Option<CastleSide>,

    /// Boost castling during the first fifteen moves
    pub prefer_early_castling: bool,
    /// Boost moves that pin an enemy piece to its king
    pub prefer_pins: bool,
    /// Boost promotions to a queen
    pub always_promote_queen: bool,
    /// Score any move that mates on the board as a forced mate
    pub checkmate_immediately: bool,
    /// When clearly winning, prefer moves that keep the game close
    pub stay_equal: bool,
}

impl Default for IntelligenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            avoid_low_intelligence: false,
            low_intelligence_threshold: default_threshold(),
            aggressiveness_contempt: 1.0,
            capture_preference: 1.0,
            castle_preference: 1.0,
            en_passant_preference: 1.0,
            promotion_preference: 1.0,
            pawn_preference: 1.0,
            knight_preference: 1.0,
            bishop_preference: 1.0,
            rook_preference: 1.0,
            queen_preference: 1.0,
            king_preference: 1.0,
            prefer_side_castle: false,
            castle_side: None,
            prefer_early_castling: false,
            prefer_pins: false,
            always_promote_queen: false,
            checkmate_immediately: false,
            stay_equal: false,
        }
    }
}

impl IntelligenceSettings {
    /// Returns the avoidance threshold clamped into its valid range.
    pub fn clamped_threshold(&self) -> f64 {
        self.low_intelligence_threshold
            .clamp(MIN_AVOIDANCE_THRESHOLD, MAX_AVOIDANCE_THRESHOLD)
    }

    /// Whether the avoidance fallback applies to this evaluation.
    pub fn should_avoid_low_intelligence(&self) -> bool {
        self.enabled && self.avoid_low_intelligence
    }

    /// Multiplier configured for moving a given piece type.
    pub fn piece_preference(&self, piece: PieceKind) -> f64 {
        match piece {
            PieceKind::Pawn => self.pawn_preference,
            PieceKind::Knight => self.knight_preference,
            PieceKind::Bishop => self.bishop_preference,
            PieceKind::Rook => self.rook_preference,
            PieceKind::Queen => self.queen_preference,
            PieceKind::King => self.king_preference,
        }
    }

    /// Checks that every multiplier is a positive, finite number.
    pub fn validate(&self) -> Result<(), String> {
        let multipliers = [
            ("aggressiveness_contempt", self.aggressiveness_contempt),
            ("capture_preference", self.capture_preference),
            ("castle_preference", self.castle_preference),
            ("en_passant_preference", self.en_passant_preference),
            ("promotion_preference", self.promotion_preference),
            ("pawn_preference", self.pawn_preference),
            ("knight_preference", self.knight_preference),
            ("bishop_preference", self.bishop_preference),
            ("rook_preference", self.rook_preference),
            ("queen_preference", self.queen_preference),
            ("king_preference", self.king_preference),
        ];

        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }

        if !self.low_intelligence_threshold.is_finite() {
            return Err("low_intelligence_threshold must be a finite number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_neutral() {
        let settings = IntelligenceSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.low_intelligence_threshold, -1.5);
        for piece in [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
            PieceKind::King,
        ] {
            assert_eq!(settings.piece_preference(piece), 1.0);
        }
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_threshold_clamping() {
        let mut settings = IntelligenceSettings::default();
        settings.low_intelligence_threshold = -7.0;
        assert_eq!(settings.clamped_threshold(), -3.0);
        settings.low_intelligence_threshold = 0.5;
        assert_eq!(settings.clamped_threshold(), -1.0);
        settings.low_intelligence_threshold = -2.25;
        assert_eq!(settings.clamped_threshold(), -2.25);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: IntelligenceSettings = serde_json::from_str(
            r#"{"enabled": true, "capture_preference": 1.4, "castle_side": "queenside"}"#,
        )
        .expect("settings should parse");

        assert!(settings.enabled);
        assert_eq!(settings.capture_preference, 1.4);
        assert_eq!(settings.knight_preference, 1.0);
        assert_eq!(settings.castle_side, Some(CastleSide::Queenside));
        assert_eq!(settings.low_intelligence_threshold, -1.5);
    }

    #[test]
    fn test_validate_rejects_non_positive_multiplier() {
        let mut settings = IntelligenceSettings::default();
        settings.queen_preference = 0.0;
        assert!(settings.validate().is_err());
    }
}
