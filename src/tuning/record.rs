use serde::Serialize;

use crate::control::Gains;

/// One evaluated gain vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingRecord {
    pub iteration: usize,
    pub gains: Gains,
    pub score: f64,
}

/// Running minimum of a record sequence, one entry per record.
pub fn best_so_far(records: &[TrainingRecord]) -> Vec<f64> {
    records
        .iter()
        .scan(f64::INFINITY, |best, r| {
            *best = best.min(r.score);
            Some(*best)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_minimum() {
        let records: Vec<TrainingRecord> = [3.0, 5.0, 1.0, 2.0]
            .into_iter()
            .enumerate()
            .map(|(i, score)| TrainingRecord { iteration: i, gains: Gains::default(), score })
            .collect();
        assert_eq!(best_so_far(&records), vec![3.0, 3.0, 1.0, 1.0]);
    }
}
