//! Analysis request and result types shared by the driver, the bridge and
//! the HTTP layer.

use serde::{Deserialize, Serialize};

/// FEN of the standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Limit used when a caller does not ask for a specific number of moves
pub const DEFAULT_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    /// Number of moves wanted, always >= 1
    pub limit: usize,
}

impl AnalysisRequest {
    pub fn new(fen: impl Into<String>, limit: i64) -> Self {
        Self {
            fen: fen.into(),
            limit: limit.max(1) as usize,
        }
    }

    /// Self-test request: starting position, one move.
    pub fn selftest() -> Self {
        Self::new(START_FEN, 1)
    }
}

/// Quality label relative to the best line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Goodest,
    Excellent,
    #[serde(rename = "OK")]
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMove {
    #[serde(rename = "move")]
    pub mv: String,
    pub pv: Vec<String>,
    #[serde(rename = "scoreCP")]
    pub score_cp: i32,
    /// `0.35` style pawn text, or `M3` for mates
    #[serde(rename = "scorePawns")]
    pub score_pawns: String,
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default)]
    pub best_moves: Vec<RankedMove>,
    /// Rank-1 centipawn score, if the engine reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    #[serde(default)]
    pub evaluation_pawns: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            best_moves: Vec::new(),
            evaluation: None,
            evaluation_pawns: 0.0,
            error: Some(message.into()),
        }
    }
}
