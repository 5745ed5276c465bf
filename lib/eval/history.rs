use crate::chess::Ply;
use crate::eval::Score;
use std::collections::BTreeMap;

/// An append-only record of the evaluation at every ply of a game.
///
/// The current score is a projection of the most recent mutation and is never
/// set independently of the record.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct History {
    scores: BTreeMap<Ply, Score>,
    current: Option<Score>,
}

impl History {
    /// Records the evaluation at the given ply and makes it current.
    pub fn record(&mut self, ply: Ply, score: Score) {
        self.scores.insert(ply, score);
        self.current = Some(score);
    }

    /// Clears the current score without touching the record.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Forgets everything, e.g. when a new game begins.
    pub fn reset(&mut self) {
        self.scores.clear();
        self.current = None;
    }

    /// The evaluation at the given ply.
    ///
    /// A half move that has no evaluation of its own, e.g. one the opponent
    /// just played, falls back to the preceding ply's.
    pub fn lookup(&self, ply: Ply) -> Option<Score> {
        self.scores
            .get(&ply)
            .copied()
            .or_else(|| self.scores.get(&ply.prev()?).copied())
    }

    /// Adopts previously persisted evaluations, viewed at the given ply.
    pub fn restore(&mut self, scores: BTreeMap<Ply, Score>, ply: Ply) {
        self.scores = scores;
        self.current = self.lookup(ply);
    }

    /// The score that mirrors the most recent mutation, if any.
    pub fn current(&self) -> Option<Score> {
        self.current
    }

    /// All recorded evaluations, ordered by ply.
    pub fn scores(&self) -> &BTreeMap<Ply, Score> {
        &self.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn lookup_finds_what_record_stored(ply: Ply, score: Score) {
        let mut history = History::default();
        history.record(ply, score);
        assert_eq!(history.lookup(ply), Some(score));
        assert_eq!(history.current(), Some(score));
    }

    #[proptest]
    fn lookup_falls_back_to_the_preceding_ply(#[strategy(0u32..u32::MAX)] n: u32, score: Score) {
        let mut history = History::default();
        history.record(Ply::new(n), score);
        assert_eq!(history.lookup(Ply::new(n + 1)), Some(score));
    }

    #[proptest]
    fn lookup_does_not_reach_further_back_than_one_ply(
        #[strategy(0u32..u32::MAX - 1)] n: u32,
        score: Score,
    ) {
        let mut history = History::default();
        history.record(Ply::new(n), score);
        assert_eq!(history.lookup(Ply::new(n + 2)), None);
    }

    #[proptest]
    fn record_overwrites_previous_evaluation(ply: Ply, a: Score, b: Score) {
        let mut history = History::default();
        history.record(ply, a);
        history.record(ply, b);
        assert_eq!(history.lookup(ply), Some(b));
    }

    #[proptest]
    fn clear_current_preserves_the_record(ply: Ply, score: Score) {
        let mut history = History::default();
        history.record(ply, score);
        history.clear_current();
        assert_eq!(history.current(), None);
        assert_eq!(history.lookup(ply), Some(score));
    }

    #[proptest]
    fn reset_forgets_everything(ply: Ply, score: Score) {
        let mut history = History::default();
        history.record(ply, score);
        history.reset();
        assert_eq!(history.current(), None);
        assert!(history.scores().is_empty());
    }

    #[proptest]
    fn restore_recomputes_the_current_score(ply: Ply, score: Score) {
        let mut history = History::default();
        history.restore(BTreeMap::from([(ply, score)]), ply);
        assert_eq!(history.current(), Some(score));
    }

    #[proptest]
    fn restore_at_an_unrecorded_ply_clears_the_current_score(
        #[strategy(2u32..)] n: u32,
        score: Score,
    ) {
        let mut history = History::default();
        history.record(Ply::new(0), score);
        history.restore(BTreeMap::from([(Ply::new(0), score)]), Ply::new(n));
        assert_eq!(history.current(), None);
    }
}
