//! Move ranking and quality filter over collected PV slots

use crate::analysis::{AnalysisResult, Quality, RankedMove};
use crate::uci::{Candidate, PvSlots};

/// Candidates further than this from the best line are dropped
pub const PIVOT_WINDOW_CP: u32 = 50;

/// Quality thresholds (centipawn distance from the best line)
const THRESHOLD_GOODEST: u32 = 5;
const THRESHOLD_EXCELLENT: u32 = 25;

/// Label a score relative to the best score.
pub fn quality(best: Option<i32>, cp: i32) -> Quality {
    let Some(best) = best else {
        return Quality::Ok;
    };
    match best.abs_diff(cp) {
        d if d <= THRESHOLD_GOODEST => Quality::Goodest,
        d if d <= THRESHOLD_EXCELLENT => Quality::Excellent,
        _ => Quality::Ok,
    }
}

/// Turn collected slots into the caller-facing result.
///
/// Unscored candidates are dropped, the rest are kept only within
/// [`PIVOT_WINDOW_CP`] of the rank-1 score (when one was seen), then
/// truncated to `limit` in ascending rank order.
pub fn rank(slots: &PvSlots, limit: usize) -> AnalysisResult {
    let best = slots.best_score();

    let best_moves: Vec<RankedMove> = slots
        .candidates()
        .filter_map(|c| c.score.map(|score| (c, score)))
        .filter(|(_, score)| match best {
            Some(best) => best.abs_diff(score.centipawns()) <= PIVOT_WINDOW_CP,
            None => true,
        })
        .take(limit)
        .map(|(c, score)| ranked_move(c, score.centipawns(), score.display(), best))
        .collect();

    AnalysisResult {
        success: true,
        best_moves,
        evaluation: best,
        evaluation_pawns: best.map(|cp| cp as f64 / 100.0).unwrap_or(0.0),
        error: None,
    }
}

fn ranked_move(c: &Candidate, score_cp: i32, score_pawns: String, best: Option<i32>) -> RankedMove {
    RankedMove {
        mv: c.mv.clone(),
        pv: c.pv.clone(),
        score_cp,
        score_pawns,
        quality: quality(best, score_cp),
    }
}
