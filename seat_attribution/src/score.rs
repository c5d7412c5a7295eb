//! Methods working on grades.

use log::{debug, info};
use snafu::prelude::*;

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

/// Mean grade of a histogram. `None` when there is no grade at all.
pub fn average_grade(histogram: &[u64]) -> Option<f64> {
    let n: u64 = histogram.iter().sum();
    if n == 0 {
        return None;
    }
    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(grade, &count)| grade as f64 * count as f64)
        .sum();
    Some(sum / n as f64)
}

/// Median grade of a histogram. `None` when there is no grade at all.
///
/// With an even number of grades, the median is the mean of the two middle
/// grades.
pub fn median_grade(histogram: &[u64]) -> Option<f64> {
    let n: u64 = histogram.iter().sum();
    if n == 0 {
        return None;
    }
    // Grade at a given 0-based position in the sorted list of all the grades.
    let grade_at = |position: u64| {
        let mut seen = 0;
        for (grade, &count) in histogram.iter().enumerate() {
            seen += count;
            if position < seen {
                return grade;
            }
        }
        histogram.len() - 1
    };
    let low = grade_at((n - 1) / 2);
    let high = grade_at(n / 2);
    Some((low + high) as f64 / 2.0)
}

// The candidates sharing the best value. Candidates without grade do not compete.
fn best_candidates<C, F>(tally: &ScoresTally<C>, value: F) -> AttributionResult<Vec<(C, f64)>>
where
    C: Candidate,
    F: Fn(&[u64]) -> Option<f64>,
{
    ensure!(!tally.is_empty(), EmptyTallySnafu);
    let values: Vec<(C, f64)> = tally
        .iter()
        .filter_map(|(c, h)| value(h).map(|v| (c.clone(), v)))
        .collect();
    debug!("best_candidates: {:?}", values);
    let best = values
        .iter()
        .map(|(_, v)| *v)
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
        .context(ZeroVotesSnafu)?;
    Ok(values.into_iter().filter(|(_, v)| *v == best).collect())
}

/// All the seats go to the candidate with the best average grade.
///
/// Ties go to the first candidate in tally order.
#[derive(Debug, Clone, Copy)]
pub struct AverageScore {
    n_seats: u32,
}

pub fn average_score(n_seats: u32) -> AverageScore {
    AverageScore { n_seats }
}

impl<C: Candidate> Attribution<ScoresTally<C>> for AverageScore {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &ScoresTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let mut best = best_candidates(tally, average_grade)?;
        let (winner, average) = best.swap_remove(0);
        info!("AverageScore: {:?} wins with average {}", winner, average);
        Ok(all_seats_to(winner, self.n_seats))
    }
}

/// All the seats go to the candidate with the best median grade.
///
/// Candidates tied on the best median are decided by the contingency, applied
/// to a tally with only these candidates. By default it is the average score.
pub struct MedianScore<C: Candidate> {
    n_seats: u32,
    contingency: Fallback<ScoresTally<C>>,
}

pub fn median_score<C: Candidate>(n_seats: u32) -> MedianScore<C> {
    MedianScore {
        n_seats,
        contingency: Box::new(average_score(n_seats)),
    }
}

impl<C: Candidate> MedianScore<C> {
    pub fn with_contingency(self, contingency: Fallback<ScoresTally<C>>) -> AttributionResult<Self> {
        check_fallback_seats(Some(self.n_seats), contingency.as_ref())?;
        Ok(MedianScore {
            contingency,
            ..self
        })
    }
}

impl<C: Candidate> Attribution<ScoresTally<C>> for MedianScore<C> {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &ScoresTally<C>,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let best = best_candidates(tally, median_grade)?;
        if let [(winner, median)] = best.as_slice() {
            info!("MedianScore: {:?} wins with median {}", winner, median);
            return Ok(all_seats_to(winner.clone(), self.n_seats));
        }
        let tied: Vec<C> = best.into_iter().map(|(c, _)| c).collect();
        info!("MedianScore: tie between {:?}, using the contingency", tied);
        self.contingency.attrib_with(&tally.restrict(&tied), extras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(ngrades: usize, hs: Vec<(&'static str, Vec<u64>)>) -> ScoresTally<&'static str> {
        let mut t = ScoresTally::new(ngrades);
        for (c, h) in hs {
            t.insert(c, h).unwrap();
        }
        t
    }

    #[test]
    fn grades() {
        assert_eq!(average_grade(&[1, 0, 1]), Some(1.0));
        assert_eq!(average_grade(&[0, 0, 0]), None);
        assert_eq!(median_grade(&[1, 1, 1]), Some(1.0));
        // 0, 2, 2, 3
        assert_eq!(median_grade(&[1, 0, 2, 1]), Some(2.0));
        // 0, 3
        assert_eq!(median_grade(&[1, 0, 0, 1]), Some(1.5));
        assert_eq!(median_grade(&[0, 0, 5]), Some(2.0));
    }

    #[test]
    fn average_score_winner() {
        let t = scores(
            3,
            vec![("A", vec![0, 2, 2]), ("B", vec![1, 0, 3]), ("C", vec![4, 0, 0])],
        );
        // A: 6 / 4, B: 6 / 4, C: 0. A comes first.
        assert_eq!(average_score(2).attrib(&t).unwrap().get("A"), Some(&2));
        let t = scores(3, vec![("A", vec![0, 3, 1]), ("B", vec![1, 0, 3])]);
        assert_eq!(average_score(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn median_differs_from_average() {
        // A: 0 0 2 2 2 (median 2, mean 1.2); B: 1 1 1 2 2 (median 1, mean 1.4)
        let t = scores(3, vec![("A", vec![2, 0, 3]), ("B", vec![0, 3, 2])]);
        assert_eq!(median_score(1).attrib(&t).unwrap().get("A"), Some(&1));
        assert_eq!(average_score(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn median_tie_uses_average_on_tied_candidates() {
        let mut c = vec![0; 10];
        c[0] = 3;
        c[9] = 2;
        let mut a = vec![0; 10];
        a[0] = 1;
        a[1] = 2;
        let mut b = vec![0; 10];
        b[1] = 2;
        b[2] = 1;
        // A: 0 1 1 and B: 1 1 2 share the median 1. C: 0 0 0 9 9 has the best
        // average but a median of 0, so it takes no part in the tie break.
        let t = scores(10, vec![("A", a), ("B", b), ("C", c)]);
        assert_eq!(average_score(1).attrib(&t).unwrap().get("C"), Some(&1));
        assert_eq!(median_score(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn median_custom_contingency() {
        let t = scores(3, vec![("A", vec![1, 2, 0]), ("B", vec![0, 2, 1])]);
        let m = median_score(1)
            .with_contingency(Box::new(median_score(1)))
            .unwrap();
        // The nested median ties again and falls back to the average: B.
        assert_eq!(m.attrib(&t).unwrap().get("B"), Some(&1));
        assert!(median_score::<&str>(1)
            .with_contingency(Box::new(average_score(2)))
            .is_err());
    }

    #[test]
    fn candidates_without_grades_do_not_compete() {
        let t = scores(2, vec![("A", vec![0, 0]), ("B", vec![3, 0])]);
        assert_eq!(average_score(1).attrib(&t).unwrap().get("B"), Some(&1));
        let t = scores(2, vec![("A", vec![0, 0])]);
        assert!(matches!(
            average_score(1).attrib(&t),
            Err(AttributionError::ZeroVotes {})
        ));
        assert!(matches!(
            median_score(1).attrib(&ScoresTally::<&str>::new(2)),
            Err(AttributionError::EmptyTally {})
        ));
    }
}
