//! Methods working on ranked ballots.

use log::{debug, info};
use snafu::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

// Position of each candidate in the tally, in order of first appearance.
fn candidate_positions<C: Candidate>(candidates: &[C]) -> HashMap<&C, usize> {
    candidates.iter().enumerate().map(|(idx, c)| (c, idx)).collect()
}

/// Instant-runoff voting.
///
/// The candidate with the fewest first choices is eliminated until one
/// candidate holds a majority of the ballots that are not exhausted. That
/// candidate receives all the seats.
///
/// When several candidates have the fewest first choices, the one that
/// appears last on the ballots (in order of first appearance) is eliminated.
#[derive(Debug, Clone, Copy)]
pub struct InstantRunoff {
    n_seats: u32,
}

pub fn instant_runoff(n_seats: u32) -> InstantRunoff {
    InstantRunoff { n_seats }
}

// First choices among the candidates still running, and the number of
// ballots that are not exhausted.
fn compute_tally<C: Candidate>(
    tally: &OrderTally<C>,
    running: &[C],
    still_valid: &HashSet<&C>,
) -> (Vec<u64>, u64) {
    let positions = candidate_positions(running);
    let mut counts = vec![0; running.len()];
    let mut active = 0;
    for ballot in tally.ballots() {
        if let Some(c) = ballot.ranks.iter().find(|c| still_valid.contains(c)) {
            counts[positions[c]] += ballot.count;
            active += ballot.count;
        }
    }
    (counts, active)
}

impl<C: Candidate> Attribution<OrderTally<C>> for InstantRunoff {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &OrderTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let candidates = tally.candidates();
        ensure!(!candidates.is_empty(), EmptyTallySnafu);
        ensure!(
            tally
                .ballots()
                .iter()
                .any(|b| b.count > 0 && !b.ranks.is_empty()),
            ZeroVotesSnafu
        );
        info!(
            "InstantRunoff: {} ballots, {} candidates",
            tally.total(),
            candidates.len()
        );

        // The candidates that are still running, in order of first appearance.
        let mut running: Vec<C> = candidates.clone();
        let max_rounds = candidates.len();
        for round in 1..=max_rounds {
            let still_valid: HashSet<&C> = running.iter().collect();
            let (counts, active) = compute_tally(tally, &running, &still_valid);
            debug!(
                "InstantRunoff: round {}: {:?}, {} active ballots",
                round,
                running.iter().zip(counts.iter()).collect::<Vec<_>>(),
                active
            );

            if let Some(idx) = counts.iter().position(|&n| 2 * n > active) {
                info!(
                    "InstantRunoff: round {}: {:?} elected with {} of {} votes",
                    round, running[idx], counts[idx], active
                );
                return Ok(all_seats_to(running[idx].clone(), self.n_seats));
            }

            // For loser selection, ties are resolved in reverse order.
            let min_count = counts.iter().copied().min().unwrap_or(0);
            let eliminated = counts
                .iter()
                .rposition(|&n| n == min_count)
                .context(NoConvergenceSnafu { rounds: round })?;
            debug!(
                "InstantRunoff: round {}: eliminating {:?}",
                round, running[eliminated]
            );
            running.remove(eliminated);
        }
        NoConvergenceSnafu { rounds: max_rounds }.fail()
    }
}

/// Borda count.
///
/// On a ballot listing `k` candidates, the last one gets 1 point, the one
/// before 2 points and so on; unlisted candidates get nothing. The highest
/// total receives all the seats, ties going to the candidate that appears
/// first on the ballots.
#[derive(Debug, Clone, Copy)]
pub struct Borda {
    n_seats: u32,
}

pub fn borda(n_seats: u32) -> Borda {
    Borda { n_seats }
}

impl<C: Candidate> Attribution<OrderTally<C>> for Borda {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &OrderTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let candidates = tally.candidates();
        ensure!(!candidates.is_empty(), EmptyTallySnafu);
        let positions = candidate_positions(&candidates);
        let mut points: Vec<u64> = vec![0; candidates.len()];
        for ballot in tally.ballots() {
            let k = ballot.ranks.len() as u64;
            for (rank, c) in ballot.ranks.iter().enumerate() {
                points[positions[c]] += (k - rank as u64) * ballot.count;
            }
        }
        debug!(
            "Borda: points {:?}",
            candidates.iter().zip(points.iter()).collect::<Vec<_>>()
        );
        let mut winner = 0;
        for (idx, &p) in points.iter().enumerate() {
            if p > points[winner] {
                winner = idx;
            }
        }
        info!("Borda: {:?} wins with {} points", candidates[winner], points[winner]);
        Ok(all_seats_to(candidates[winner].clone(), self.n_seats))
    }
}

/// Number of ballots ranking each candidate above each other one.
///
/// `prefer[a][b]` counts the ballots that rank `a` above `b`, with the
/// candidates in order of first appearance. Only pairs of candidates listed
/// together on a ballot are counted.
pub fn pairwise_preferences<C: Candidate>(tally: &OrderTally<C>) -> (Vec<C>, Vec<Vec<u64>>) {
    let candidates = tally.candidates();
    let positions = candidate_positions(&candidates);
    let n = candidates.len();
    let mut prefer = vec![vec![0; n]; n];
    for ballot in tally.ballots() {
        for (i, above) in ballot.ranks.iter().enumerate() {
            for below in ballot.ranks[i + 1..].iter() {
                prefer[positions[above]][positions[below]] += ballot.count;
            }
        }
    }
    (candidates, prefer)
}

/// Condorcet method.
///
/// The winner must be preferred to every other candidate by more than half of
/// the ballots expressing a preference between the two. Without such a
/// candidate the result is a standoff, handed to the contingency if there is
/// one. The ballots are expected to rank every candidate.
pub struct Condorcet<C: Candidate> {
    n_seats: u32,
    contingency: Option<Fallback<OrderTally<C>>>,
}

pub fn condorcet<C: Candidate>(n_seats: u32) -> Condorcet<C> {
    Condorcet {
        n_seats,
        contingency: None,
    }
}

impl<C: Candidate> Condorcet<C> {
    pub fn with_contingency(self, contingency: Fallback<OrderTally<C>>) -> AttributionResult<Self> {
        check_fallback_seats(Some(self.n_seats), contingency.as_ref())?;
        Ok(Condorcet {
            contingency: Some(contingency),
            ..self
        })
    }
}

impl<C: Candidate> Attribution<OrderTally<C>> for Condorcet<C> {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &OrderTally<C>,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let (candidates, prefer) = pairwise_preferences(tally);
        ensure!(!candidates.is_empty(), EmptyTallySnafu);
        debug!("Condorcet: candidates {:?}, preferences {:?}", candidates, prefer);

        // A candidate is out as soon as one opponent is not beaten by a majority
        // of the ballots comparing them.
        let beats = |a: usize, b: usize| prefer[a][b] > prefer[b][a];
        let winner = (0..candidates.len())
            .find(|&a| (0..candidates.len()).all(|b| a == b || beats(a, b)));

        match (winner, &self.contingency) {
            (Some(w), _) => {
                info!("Condorcet: {:?} wins every pairwise comparison", candidates[w]);
                Ok(all_seats_to(candidates[w].clone(), self.n_seats))
            }
            (None, Some(fallback)) => {
                info!("Condorcet: standoff, using the contingency");
                fallback.attrib_with(tally, extras)
            }
            (None, None) => Err(AttributionFailure::Standoff {}.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballots(bs: &[&[&'static str]]) -> OrderTally<&'static str> {
        OrderTally::from_ballots(bs.iter().map(|b| b.to_vec())).unwrap()
    }

    #[test]
    fn instant_runoff_eliminates_the_last_of_a_tie() {
        let _ = env_logger::builder().is_test(true).try_init();
        // Round 1: 1 vote each, C is eliminated; round 2: A has 2 of 3.
        let t = ballots(&[&["A", "B"], &["B", "A"], &["C", "A"]]);
        let res = instant_runoff(1).attrib(&t).unwrap();
        assert_eq!(res.get("A"), Some(&1));
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn instant_runoff_first_round_majority() {
        let t = ballots(&[&["A"], &["A", "B"], &["B"]]);
        assert_eq!(instant_runoff(3).attrib(&t).unwrap().get("A"), Some(&3));
    }

    #[test]
    fn instant_runoff_transfers_and_exhausts() {
        let mut t = OrderTally::new();
        t.add_ballot(vec!["A"], 35).unwrap();
        t.add_ballot(vec!["B"], 40).unwrap();
        t.add_ballot(vec!["C", "B"], 15).unwrap();
        t.add_ballot(vec!["C"], 10).unwrap();
        // C is eliminated, 15 go to B and 10 are exhausted: B has 55 of 90.
        assert_eq!(instant_runoff(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn instant_runoff_candidate_without_first_choice_is_eliminated_first() {
        let t = ballots(&[&["A", "D"], &["A"], &["B", "D"], &["B"], &["C", "D"]]);
        // D has no first choice and goes first; then C; A and B tie, B goes.
        assert_eq!(instant_runoff(1).attrib(&t).unwrap().get("A"), Some(&1));
    }

    #[test]
    fn instant_runoff_empty_tally() {
        let t = ballots(&[&[], &[]]);
        assert!(matches!(
            instant_runoff(1).attrib(&t),
            Err(AttributionError::EmptyTally {})
        ));
    }

    #[test]
    fn instant_runoff_without_counted_ballots() {
        let mut t = OrderTally::new();
        t.add_ballot(vec!["A"], 0).unwrap();
        t.add_ballot(vec!["B", "A"], 0).unwrap();
        t.add_ballot(vec![], 4).unwrap();
        assert!(matches!(
            instant_runoff(1).attrib(&t),
            Err(AttributionError::ZeroVotes {})
        ));
    }

    #[test]
    fn borda_counts_partial_ballots() {
        // A: 3 + 1 = 4, B: 2 + 2 = 4, C: 1, D: 0 (unlisted)
        let t = ballots(&[&["A", "B", "C"], &["B", "A"]]);
        // A and B tie, A appears first.
        assert_eq!(borda(2).attrib(&t).unwrap().get("A"), Some(&2));

        let t = ballots(&[&["A", "B", "C"], &["B", "C", "A"], &["B", "A"]]);
        // A: 3 + 1 + 1 = 5, B: 2 + 3 + 2 = 7, C: 1 + 2 = 3
        assert_eq!(borda(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn borda_weights_ballots_by_count() {
        let mut t = OrderTally::new();
        t.add_ballot(vec!["A", "B"], 1).unwrap();
        t.add_ballot(vec!["B", "A"], 3).unwrap();
        assert_eq!(borda(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn pairwise_counts() {
        let t = ballots(&[&["A", "B", "C"], &["B", "A"]]);
        let (cands, prefer) = pairwise_preferences(&t);
        assert_eq!(cands, vec!["A", "B", "C"]);
        assert_eq!(prefer[0][1], 1);
        assert_eq!(prefer[1][0], 1);
        assert_eq!(prefer[0][2], 1);
        assert_eq!(prefer[2][0], 0);
    }

    #[test]
    fn condorcet_winner() {
        let t = ballots(&[
            &["A", "B", "C"],
            &["B", "A", "C"],
            &["A", "C", "B"],
            &["C", "A", "B"],
        ]);
        assert_eq!(condorcet(1).attrib(&t).unwrap().get("A"), Some(&1));
    }

    #[test]
    fn condorcet_winner_without_plurality() {
        // B is nobody's favorite but beats both A and C.
        let mut t = OrderTally::new();
        t.add_ballot(vec!["A", "B", "C"], 4).unwrap();
        t.add_ballot(vec!["C", "B", "A"], 3).unwrap();
        t.add_ballot(vec!["B", "C", "A"], 2).unwrap();
        assert_eq!(condorcet(1).attrib(&t).unwrap().get("B"), Some(&1));
    }

    #[test]
    fn condorcet_cycle_is_a_standoff() {
        let t = ballots(&[&["A", "B", "C"], &["B", "C", "A"], &["C", "A", "B"]]);
        let err = condorcet(1).attrib(&t).unwrap_err();
        assert_eq!(err.failure(), Some(&AttributionFailure::Standoff {}));
    }

    #[test]
    fn condorcet_pairwise_tie_is_a_standoff() {
        let t = ballots(&[&["A", "B"], &["B", "A"]]);
        assert!(condorcet(1).attrib(&t).unwrap_err().is_failure());
    }

    #[test]
    fn condorcet_contingency() {
        let t = ballots(&[&["A", "B", "C"], &["B", "C", "A"], &["C", "A", "B"], &["A", "C", "B"]]);
        // A > B 3-1, B > C 2-2, C > A 2-2: no winner; Borda picks A.
        let m = condorcet(1).with_contingency(Box::new(borda(1))).unwrap();
        assert_eq!(m.attrib(&t).unwrap().get("A"), Some(&1));
    }
}
