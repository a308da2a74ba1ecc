//! UCI `info` line parsing and the per-rank candidate accumulator

/// Score used in place of a centipawn value for forced mates.
pub const MATE_SCORE: i32 = 10_000;

/// Highest MultiPV rank accepted from the engine.
pub const MAX_RANK: usize = 500;

/// Engine evaluation attached to a principal variation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in N (positive = side to move mates)
    Mate(i32),
}

impl Score {
    /// Centipawn value; mates clamp to +/-MATE_SCORE by sign.
    pub fn centipawns(&self) -> i32 {
        match *self {
            Score::Cp(cp) => cp,
            Score::Mate(n) if n > 0 => MATE_SCORE,
            Score::Mate(_) => -MATE_SCORE,
        }
    }

    /// Pawn-equivalent text, e.g. `0.35`, `-1.20` or `M3`.
    pub fn display(&self) -> String {
        match *self {
            Score::Cp(cp) => format!("{:.2}", cp as f64 / 100.0),
            Score::Mate(n) => format!("M{n}"),
        }
    }
}

/// One parsed MultiPV line
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// 1-based MultiPV slot reported by the engine
    pub rank: usize,
    /// First ply of the principal variation
    pub mv: String,
    pub pv: Vec<String>,
    pub score: Option<Score>,
}

impl Candidate {
    pub fn centipawns(&self) -> Option<i32> {
        self.score.map(|s| s.centipawns())
    }

    pub fn mate_distance(&self) -> Option<i32> {
        match self.score {
            Some(Score::Mate(n)) => Some(n),
            _ => None,
        }
    }
}

/// Lenient integer parse: anything malformed reads as zero.
fn parse_int(token: &str) -> i32 {
    token.parse().unwrap_or(0)
}

/// Parse an `info ... multipv N ... score (cp|mate) X ... pv m1 m2 ...` line.
///
/// Returns `None` when the line carries no usable rank or an empty PV.
pub fn parse_info(line: &str) -> Option<Candidate> {
    let mut tokens = line.split_whitespace().peekable();
    let mut rank = None;
    let mut cp = None;
    let mut mate = None;
    let mut pv: Vec<String> = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            "multipv" => {
                if let Some(value) = tokens.next() {
                    rank = Some(parse_int(value));
                }
            }
            "score" => match tokens.peek().copied() {
                Some("cp") => {
                    tokens.next();
                    if let Some(value) = tokens.next() {
                        cp = Some(parse_int(value));
                    }
                }
                Some("mate") => {
                    tokens.next();
                    if let Some(value) = tokens.next() {
                        mate = Some(parse_int(value));
                    }
                }
                _ => {}
            },
            "pv" => {
                // pv consumes the rest of the line
                pv = tokens.by_ref().map(str::to_string).collect();
            }
            _ => {}
        }
    }

    let rank = usize::try_from(rank?).ok()?;
    if rank == 0 || rank > MAX_RANK || pv.is_empty() {
        return None;
    }

    Some(Candidate {
        rank,
        mv: pv[0].clone(),
        score: mate.map(Score::Mate).or(cp.map(Score::Cp)),
        pv,
    })
}

/// Whether a raw engine line should be fed to [`parse_info`].
pub fn is_multipv_info(line: &str) -> bool {
    line.starts_with("info") && line.contains("multipv")
}

/// Sparse slot-by-rank accumulator. Later lines for a rank overwrite earlier
/// (shallower) ones.
#[derive(Debug, Clone, Default)]
pub struct PvSlots {
    slots: Vec<Option<Candidate>>,
    best_score: Option<i32>,
}

impl PvSlots {
    /// Pre-size to the configured number of parallel lines.
    pub fn with_lines(lines: usize) -> Self {
        Self {
            slots: vec![None; lines],
            best_score: None,
        }
    }

    pub fn record(&mut self, candidate: Candidate) {
        let idx = candidate.rank - 1;
        if candidate.rank == 1 {
            if let Some(cp) = candidate.centipawns() {
                self.best_score = Some(cp);
            }
        }
        if self.slots.len() <= idx {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(candidate);
    }

    /// Score of the most recent rank-1 line that carried one.
    pub fn best_score(&self) -> Option<i32> {
        self.best_score
    }

    /// Filled slots in ascending rank order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.slots.iter().flatten()
    }

    /// Number of allocated slots, filled or not
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp_line() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4 e7e5 g1f3";
        let c = parse_info(line).unwrap();
        assert_eq!(c.rank, 1);
        assert_eq!(c.mv, "e2e4");
        assert_eq!(c.pv, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(c.score, Some(Score::Cp(35)));
        assert_eq!(c.mate_distance(), None);
    }

    #[test]
    fn test_parse_mate_line_clamps_score() {
        let c = parse_info("info depth 30 multipv 2 score mate 3 pv d1h5 g7g6").unwrap();
        assert_eq!(c.rank, 2);
        assert_eq!(c.centipawns(), Some(MATE_SCORE));
        assert_eq!(c.mate_distance(), Some(3));
        assert_eq!(c.score.unwrap().display(), "M3");

        let c = parse_info("info multipv 1 score mate -2 pv a2a3").unwrap();
        assert_eq!(c.centipawns(), Some(-MATE_SCORE));
        assert_eq!(c.score.unwrap().display(), "M-2");
    }

    #[test]
    fn test_mate_wins_over_cp_regardless_of_order() {
        let c = parse_info("info multipv 1 score mate 1 score cp 40 pv h5f7").unwrap();
        assert_eq!(c.score, Some(Score::Mate(1)));
    }

    #[test]
    fn test_score_display_two_decimals() {
        assert_eq!(Score::Cp(35).display(), "0.35");
        assert_eq!(Score::Cp(-120).display(), "-1.20");
        assert_eq!(Score::Cp(0).display(), "0.00");
        assert_eq!(Score::Cp(1234).display(), "12.34");
    }

    #[test]
    fn test_line_without_rank_or_pv_is_ignored() {
        assert!(parse_info("info depth 5 score cp 20 pv e2e4").is_none());
        assert!(parse_info("info depth 5 multipv 1 score cp 20").is_none());
        assert!(parse_info("info depth 5 multipv 1 score cp 20 pv").is_none());
    }

    #[test]
    fn test_malformed_numbers_read_as_zero() {
        let c = parse_info("info multipv 1 score cp abc pv e2e4").unwrap();
        assert_eq!(c.score, Some(Score::Cp(0)));
        // rank 0 has no slot
        assert!(parse_info("info multipv x score cp 10 pv e2e4").is_none());
        assert!(parse_info("info multipv 100000 score cp 10 pv e2e4").is_none());
    }

    #[test]
    fn test_extra_whitespace_is_tolerated() {
        let c = parse_info("info  multipv   3  score  cp  -15   pv  c2c4   e7e5 ").unwrap();
        assert_eq!(c.rank, 3);
        assert_eq!(c.pv, vec!["c2c4", "e7e5"]);
        assert_eq!(c.score, Some(Score::Cp(-15)));
    }

    #[test]
    fn test_score_without_kind_is_skipped() {
        let c = parse_info("info multipv 1 score lowerbound pv e2e4").unwrap();
        assert_eq!(c.score, None);
    }

    #[test]
    fn test_is_multipv_info() {
        assert!(is_multipv_info("info depth 1 multipv 1 score cp 3 pv e2e4"));
        assert!(!is_multipv_info("info string NNUE evaluation enabled"));
        assert!(!is_multipv_info("bestmove e2e4 ponder e7e5"));
    }

    #[test]
    fn test_slots_last_write_wins_and_grow() {
        let mut slots = PvSlots::with_lines(1);
        slots.record(parse_info("info depth 1 multipv 1 score cp 10 pv e2e4").unwrap());
        slots.record(parse_info("info depth 1 multipv 3 score cp -5 pv g1f3").unwrap());
        slots.record(parse_info("info depth 9 multipv 1 score cp 22 pv d2d4").unwrap());

        assert_eq!(slots.capacity(), 3);
        assert_eq!(slots.candidates().count(), 2);

        let fresh = PvSlots::with_lines(3);
        assert_eq!(fresh.capacity(), 3);
        assert_eq!(fresh.candidates().count(), 0);
        assert_eq!(slots.best_score(), Some(22));
        let moves: Vec<&str> = slots.candidates().map(|c| c.mv.as_str()).collect();
        assert_eq!(moves, vec!["d2d4", "g1f3"]);
    }

    #[test]
    fn test_unscored_rank_one_keeps_previous_best() {
        let mut slots = PvSlots::with_lines(2);
        slots.record(parse_info("info multipv 1 score cp 10 pv e2e4").unwrap());
        slots.record(parse_info("info multipv 1 pv e2e4 e7e5").unwrap());
        assert_eq!(slots.best_score(), Some(10));
    }
}
