// ********* Tally data structures ***********

use std::{collections::HashSet, fmt::Debug, hash::Hash};

use indexmap::IndexMap;
use snafu::prelude::*;

use crate::error::*;

/// The identity of a candidate.
///
/// The algorithms only ever compare candidates for equality and hash them.
pub trait Candidate: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Candidate for T {}

/// The number of seats attributed to each candidate.
///
/// Only the candidates that receive at least one seat appear in the mapping.
/// The iteration order follows the order of the candidates in the tally.
pub type Seats<C> = IndexMap<C, u32>;

/// The shape of an aggregate of ballots.
pub trait Tally {
    type Candidate: Candidate;
}

/// Number of ballots cast for each candidate.
///
/// The insertion order of the candidates is kept: it is the order used by
/// the methods that need to break ties.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SimpleTally<C: Candidate> {
    counts: IndexMap<C, u64>,
}

impl<C: Candidate> Tally for SimpleTally<C> {
    type Candidate = C;
}

impl<C: Candidate> Default for SimpleTally<C> {
    fn default() -> Self {
        SimpleTally {
            counts: IndexMap::new(),
        }
    }
}

impl<C: Candidate> SimpleTally<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds ballots for a candidate. Adding to an existing candidate accumulates.
    pub fn add(&mut self, candidate: C, count: u64) {
        *self.counts.entry(candidate).or_insert(0) += count;
    }

    pub fn get(&self, candidate: &C) -> u64 {
        self.counts.get(candidate).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (c, *n))
    }

    pub fn candidates(&self) -> impl Iterator<Item = &C> + '_ {
        self.counts.keys()
    }

    pub(crate) fn counts(&self) -> Vec<u64> {
        self.counts.values().copied().collect()
    }

    /// A new tally that only keeps the candidates accepted by the predicate.
    pub fn filter<P>(&self, mut keep: P) -> SimpleTally<C>
    where
        P: FnMut(&C, u64) -> bool,
    {
        SimpleTally {
            counts: self
                .counts
                .iter()
                .filter(|(c, n)| keep(c, **n))
                .map(|(c, n)| (c.clone(), *n))
                .collect(),
        }
    }
}

impl<C: Candidate> FromIterator<(C, u64)> for SimpleTally<C> {
    fn from_iter<I: IntoIterator<Item = (C, u64)>>(iter: I) -> Self {
        let mut tally = SimpleTally::new();
        for (c, n) in iter {
            tally.add(c, n);
        }
        tally
    }
}

/// A ranked ballot and the number of voters who cast it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedBallot<C> {
    /// From the most preferred to the least preferred candidate.
    pub ranks: Vec<C>,
    pub count: u64,
}

/// A collection of ranked ballots.
///
/// A ballot may leave some candidates out: they are unranked, not ranked last.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OrderTally<C: Candidate> {
    ballots: Vec<RankedBallot<C>>,
}

impl<C: Candidate> Tally for OrderTally<C> {
    type Candidate = C;
}

impl<C: Candidate> Default for OrderTally<C> {
    fn default() -> Self {
        OrderTally {
            ballots: Vec::new(),
        }
    }
}

impl<C: Candidate> OrderTally<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tally out of individual ballots, each one counting once.
    pub fn from_ballots<I>(ballots: I) -> AttributionResult<Self>
    where
        I: IntoIterator<Item = Vec<C>>,
    {
        let mut tally = OrderTally::new();
        for ranks in ballots {
            tally.add_ballot(ranks, 1)?;
        }
        Ok(tally)
    }

    /// Adds `count` identical ballots.
    ///
    /// A ballot that ranks the same candidate twice is rejected.
    pub fn add_ballot(&mut self, ranks: Vec<C>, count: u64) -> AttributionResult<()> {
        {
            let mut seen: HashSet<&C> = HashSet::new();
            for c in ranks.iter() {
                ensure!(
                    seen.insert(c),
                    DuplicateRankingSnafu {
                        index: self.ballots.len(),
                        candidate: format!("{:?}", c),
                    }
                );
            }
        }
        self.ballots.push(RankedBallot { ranks, count });
        Ok(())
    }

    pub fn ballots(&self) -> &[RankedBallot<C>] {
        &self.ballots
    }

    /// Total number of ballots, including the empty ones.
    pub fn total(&self) -> u64 {
        self.ballots.iter().map(|b| b.count).sum()
    }

    /// All the candidates that appear on a ballot, in order of first appearance.
    pub fn candidates(&self) -> Vec<C> {
        let mut seen: HashSet<&C> = HashSet::new();
        let mut res: Vec<C> = Vec::new();
        for b in self.ballots.iter() {
            for c in b.ranks.iter() {
                if seen.insert(c) {
                    res.push(c.clone());
                }
            }
        }
        res
    }
}

/// For each candidate, the number of ballots that gave each grade.
///
/// All the histograms have the same length, fixed when the tally is created.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoresTally<C: Candidate> {
    ngrades: usize,
    grades: IndexMap<C, Vec<u64>>,
}

impl<C: Candidate> Tally for ScoresTally<C> {
    type Candidate = C;
}

impl<C: Candidate> ScoresTally<C> {
    pub fn new(ngrades: usize) -> Self {
        ScoresTally {
            ngrades,
            grades: IndexMap::new(),
        }
    }

    pub fn ngrades(&self) -> usize {
        self.ngrades
    }

    /// Sets the histogram of a candidate, replacing any previous one.
    pub fn insert(&mut self, candidate: C, histogram: Vec<u64>) -> AttributionResult<()> {
        ensure!(
            histogram.len() == self.ngrades,
            GradeCountMismatchSnafu {
                candidate: format!("{:?}", candidate),
                expected: self.ngrades,
                actual: histogram.len(),
            }
        );
        self.grades.insert(candidate, histogram);
        Ok(())
    }

    /// Records `count` ballots giving `grade` to the candidate.
    pub fn add_grade(&mut self, candidate: C, grade: usize, count: u64) -> AttributionResult<()> {
        ensure!(
            grade < self.ngrades,
            InvalidConfigSnafu {
                message: format!(
                    "grade {} out of range for {} grades (candidate {:?})",
                    grade, self.ngrades, candidate
                ),
            }
        );
        let ngrades = self.ngrades;
        let histogram = self
            .grades
            .entry(candidate)
            .or_insert_with(|| vec![0; ngrades]);
        histogram[grade] += count;
        Ok(())
    }

    /// The histogram of a candidate. Unknown candidates have no grade at all.
    pub fn histogram(&self, candidate: &C) -> Vec<u64> {
        self.grades
            .get(candidate)
            .cloned()
            .unwrap_or_else(|| vec![0; self.ngrades])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &[u64])> + '_ {
        self.grades.iter().map(|(c, h)| (c, h.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// A sub-tally with only the given candidates.
    pub fn restrict(&self, candidates: &[C]) -> ScoresTally<C> {
        ScoresTally {
            ngrades: self.ngrades,
            grades: candidates
                .iter()
                .map(|c| (c.clone(), self.histogram(c)))
                .collect(),
        }
    }
}

/// Assembles the seat mapping from per-candidate seat counts, in candidate order.
pub(crate) fn seats_from_counts<'a, C, I>(candidates: I, seats: &[u32]) -> Seats<C>
where
    C: Candidate + 'a,
    I: Iterator<Item = &'a C>,
{
    candidates
        .zip(seats.iter())
        .filter(|(_, n)| **n > 0)
        .map(|(c, n)| (c.clone(), *n))
        .collect()
}

/// All the seats go to a single winner.
pub(crate) fn all_seats_to<C: Candidate>(winner: C, n_seats: u32) -> Seats<C> {
    let mut seats = Seats::new();
    if n_seats > 0 {
        seats.insert(winner, n_seats);
    }
    seats
}
