//! Collection of move candidates from a UCI engine's output.
//!
//! The engine reports its search as a stream of `info` lines; with MultiPV
//! enabled each line describes one of several principal variations. The
//! collector keeps the deepest report for every distinct first move and
//! hands the set over once `bestmove` closes the search.

use crate::candidate::MoveCandidate;
use std::collections::HashMap;
use tracing::trace;

/// Number of principal-variation moves kept on each candidate.
pub const PV_PREVIEW_LEN: usize = 5;

/// Engine score attached to an `info` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

/// The fields of an `info` line that matter for ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub time_ms: Option<u64>,
    pub pv: Vec<String>,
}

/// Whether `token` is a move in UCI long algebraic notation.
pub fn is_uci_move(token: &str) -> bool {
    let bytes = token.as_bytes();
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);

    match bytes {
        [f1, r1, f2, r2] => square(*f1, *r1) && square(*f2, *r2),
        [f1, r1, f2, r2, promo] => {
            square(*f1, *r1) && square(*f2, *r2) && matches!(*promo, b'q' | b'r' | b'b' | b'n')
        }
        _ => false,
    }
}

/// Parses an `info` line. Returns `None` for any other line.
pub fn parse_info_line(line: &str) -> Option<InfoLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("info") {
        return None;
    }

    let mut info = InfoLine::default();
    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|v| v.parse().ok()),
            "multipv" => info.multipv = tokens.next().and_then(|v| v.parse().ok()),
            "nodes" => info.nodes = tokens.next().and_then(|v| v.parse().ok()),
            "time" => info.time_ms = tokens.next().and_then(|v| v.parse().ok()),
            "score" => {
                info.score = match (tokens.next(), tokens.next().and_then(|v| v.parse().ok())) {
                    (Some("cp"), Some(value)) => Some(Score::Centipawns(value)),
                    (Some("mate"), Some(value)) => Some(Score::Mate(value)),
                    _ => None,
                };
            }
            "pv" => {
                info.pv = tokens.by_ref().map(str::to_string).collect();
            }
            // Free text runs to the end of the line.
            "string" => break,
            _ => {}
        }
    }

    Some(info)
}

/// Parses a `bestmove` line into its move.
pub fn parse_bestmove(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    tokens
        .next()
        .filter(|m| is_uci_move(m))
        .map(str::to_string)
}

/// What a single engine line did to the collector.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// Not an analysis line, or one without a usable move
    Ignored,
    /// A candidate was added or replaced
    Updated,
    /// `bestmove` arrived; the collected candidates, best first
    Finished {
        best_move: String,
        candidates: Vec<MoveCandidate>,
    },
}

/// Accumulates candidates across one search.
#[derive(Debug, Default)]
pub struct AnalysisCollector {
    candidates: HashMap<String, MoveCandidate>,
}

impl AnalysisCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct moves seen in the current search.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Drops everything collected so far.
    pub fn reset(&mut self) {
        self.candidates.clear();
    }

    /// Feeds one line of engine output.
    pub fn observe(&mut self, line: &str) -> AnalysisEvent {
        if let Some(info) = parse_info_line(line) {
            return self.record(info);
        }

        if let Some(best_move) = parse_bestmove(line) {
            let candidates = self.finish(&best_move);
            return AnalysisEvent::Finished {
                best_move,
                candidates,
            };
        }

        AnalysisEvent::Ignored
    }

    fn record(&mut self, info: InfoLine) -> AnalysisEvent {
        let Some(first) = info.pv.first().filter(|m| is_uci_move(m)) else {
            return AnalysisEvent::Ignored;
        };

        let mut candidate = match info.score {
            Some(Score::Mate(mate_in)) => MoveCandidate::with_mate(first.clone(), mate_in),
            Some(Score::Centipawns(cp)) => MoveCandidate::new(first.clone(), cp),
            None => MoveCandidate::new(first.clone(), 0),
        };
        candidate.depth = info.depth.unwrap_or(0);
        candidate.nodes = info.nodes.unwrap_or(0);
        candidate.pv = info.pv.iter().take(PV_PREVIEW_LEN).cloned().collect();

        if let Some(existing) = self.candidates.get(first) {
            if candidate.depth < existing.depth {
                return AnalysisEvent::Ignored;
            }
        }

        trace!(
            "Candidate {} depth {} score {:.2}",
            candidate.uci,
            candidate.depth,
            candidate.score_pawns
        );
        self.candidates.insert(first.clone(), candidate);
        AnalysisEvent::Updated
    }

    fn finish(&mut self, best_move: &str) -> Vec<MoveCandidate> {
        let mut candidates: Vec<MoveCandidate> = self.candidates.drain().map(|(_, c)| c).collect();

        if candidates.is_empty() {
            candidates.push(MoveCandidate::new(best_move, 0));
        }

        candidates.sort_by(|a, b| {
            b.score_pawns
                .total_cmp(&a.score_pawns)
                .then_with(|| a.uci.cmp(&b.uci))
        });
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uci_move_syntax() {
        assert!(is_uci_move("e2e4"));
        assert!(is_uci_move("a7a8q"));
        assert!(!is_uci_move("e2e9"));
        assert!(!is_uci_move("a7a8k"));
        assert!(!is_uci_move("0000"));
        assert!(!is_uci_move("e2"));
    }

    #[test]
    fn test_parse_full_info_line() {
        let info = parse_info_line(
            "info depth 18 seldepth 24 multipv 2 score cp -35 nodes 123456 nps 900000 time 137 pv e7e5 g1f3 b8c6",
        )
        .expect("info line");

        assert_eq!(info.depth, Some(18));
        assert_eq!(info.multipv, Some(2));
        assert_eq!(info.score, Some(Score::Centipawns(-35)));
        assert_eq!(info.nodes, Some(123456));
        assert_eq!(info.time_ms, Some(137));
        assert_eq!(info.pv, vec!["e7e5", "g1f3", "b8c6"]);
    }

    #[test]
    fn test_parse_mate_and_string_lines() {
        let info = parse_info_line("info depth 5 score mate -3 pv h7h6").expect("info line");
        assert_eq!(info.score, Some(Score::Mate(-3)));

        let text = parse_info_line("info string NNUE evaluation using nn.bin pv e2e4").expect("info line");
        assert!(text.pv.is_empty());

        assert!(parse_info_line("bestmove e2e4").is_none());
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4 ponder e7e5"), Some("e2e4".to_string()));
        assert_eq!(parse_bestmove("bestmove e7e8n"), Some("e7e8n".to_string()));
        assert_eq!(parse_bestmove("bestmove (none)"), None);
        assert_eq!(parse_bestmove("info depth 1"), None);
    }

    #[test]
    fn test_deeper_analysis_replaces_shallower() {
        let mut collector = AnalysisCollector::new();
        collector.observe("info depth 10 multipv 1 score cp 40 pv e2e4 e7e5");
        collector.observe("info depth 10 multipv 2 score cp 20 pv d2d4");
        collector.observe("info depth 12 multipv 1 score cp 25 pv e2e4 c7c5");
        assert_eq!(
            collector.observe("info depth 9 multipv 2 score cp 90 pv d2d4"),
            AnalysisEvent::Ignored
        );
        assert_eq!(collector.len(), 2);

        match collector.observe("bestmove e2e4 ponder c7c5") {
            AnalysisEvent::Finished {
                best_move,
                candidates,
            } => {
                assert_eq!(best_move, "e2e4");
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].uci, "e2e4");
                assert_eq!(candidates[0].depth, 12);
                assert_eq!(candidates[0].score_cp, 25);
                assert_eq!(candidates[0].pv, vec!["e2e4", "c7c5"]);
                assert_eq!(candidates[1].uci, "d2d4");
            }
            other => panic!("expected Finished, got {other:?}"),
        }

        assert!(collector.is_empty());
    }

    #[test]
    fn test_bestmove_without_info_yields_single_candidate() {
        let mut collector = AnalysisCollector::new();
        match collector.observe("bestmove g1f3") {
            AnalysisEvent::Finished { candidates, .. } => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].uci, "g1f3");
                assert_eq!(candidates[0].score_cp, 0);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_pv_preview_is_truncated() {
        let mut collector = AnalysisCollector::new();
        collector.observe("info depth 20 score cp 10 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4");
        match collector.observe("bestmove e2e4") {
            AnalysisEvent::Finished { candidates, .. } => {
                assert_eq!(candidates[0].pv.len(), PV_PREVIEW_LEN);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }
}
