//! Glue between the engine I/O and the move-intelligence evaluator.
//!
//! Commands on their way to the engine update the tracked position; engine
//! output feeds the analysis collector. When a search finishes the
//! candidates are re-ranked and summarized in one extra `info string` line.

use move_intelligence::{
    rank_candidates, AnalysisCollector, AnalysisEvent, IntelligenceSettings, PositionTracker,
    ShakmatyRules,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Prefix of the line announcing the re-ranked best move.
pub const INTELLIGENCE_LINE_PREFIX: &str = "info string intelligence";

/// Tracks the engine's position and analysis for re-ranking.
pub struct IntelligenceBridge {
    settings: IntelligenceSettings,
    rules: ShakmatyRules,
    tracker: Mutex<PositionTracker<ShakmatyRules>>,
    collector: Mutex<AnalysisCollector>,
}

impl IntelligenceBridge {
    pub fn new(settings: IntelligenceSettings) -> Self {
        Self {
            settings,
            rules: ShakmatyRules::new(),
            tracker: Mutex::new(PositionTracker::new()),
            collector: Mutex::new(AnalysisCollector::new()),
        }
    }

    pub fn settings(&self) -> &IntelligenceSettings {
        &self.settings
    }

    /// Follows a command forwarded to the engine.
    pub async fn observe_command(&self, command: &str) {
        let mut tracker = self.tracker.lock().await;
        match tracker.observe(&self.rules, command) {
            Ok(true) => {
                // A new position starts a new search.
                self.collector.lock().await.reset();
            }
            Ok(false) => {}
            Err(e) => debug!("Position not tracked after '{}': {}", command, e),
        }
    }

    /// Feeds one engine output line.
    ///
    /// # Returns
    ///
    /// The extra line to broadcast when the line closed a search and the
    /// position is known, `None` otherwise.
    pub async fn observe_output(&self, line: &str) -> Option<String> {
        let event = self.collector.lock().await.observe(line);
        let AnalysisEvent::Finished { candidates, .. } = event else {
            return None;
        };

        let tracker = self.tracker.lock().await;
        let Some(position) = tracker.current() else {
            debug!("Search finished without a tracked position; skipping re-ranking");
            return None;
        };

        let ranked = rank_candidates(&self.rules, position, &candidates, &self.settings);
        let best = ranked.first()?;
        if let Some(engine_best) = candidates.first() {
            if engine_best.uci != best.uci {
                info!(
                    "🧠 Re-ranked best move {} over engine choice {}",
                    best.uci, engine_best.uci
                );
            }
        }

        Some(format!(
            "{} bestmove {} score {:.2} original {:.2}",
            INTELLIGENCE_LINE_PREFIX,
            best.uci,
            best.score_pawns,
            best.engine_score_pawns()
        ))
    }

    /// Whether a position is currently tracked.
    pub async fn has_position(&self) -> bool {
        self.tracker.lock().await.current().is_some()
    }
}
