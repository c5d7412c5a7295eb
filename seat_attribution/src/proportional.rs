//! Proportional methods: the rank-index engine, the divisor methods built on
//! top of it, and the largest remainder method.

use log::{debug, info};
use snafu::prelude::*;
use std::{cmp::Ordering, collections::BinaryHeap};

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

/// Score of a candidate holding `seats` seats with `fraction` of the votes.
///
/// It must only depend on its arguments.
pub type RankIndexFunction = fn(f64, u32) -> f64;

/// Divisor applied to the fraction of votes of a candidate holding `seats` seats.
pub type DivisorFunction = fn(u32) -> f64;

// A candidate waiting in the queue for its next seat.
#[derive(Debug, Clone, Copy)]
struct Contender {
    score: f64,
    fraction: f64,
    position: usize,
}

impl Ord for Contender {
    // Highest score first, then the largest share of the votes, then the tally order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then(self.fraction.total_cmp(&other.fraction))
            .then(other.position.cmp(&self.position))
    }
}

impl PartialOrd for Contender {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Contender {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Contender {}

/// Attributes seats one by one to the contender with the highest rank index.
///
/// Only the score of the last winner is recomputed at each step.
pub(crate) struct Awards<'a, F> {
    rank_index: &'a F,
    fractions: Vec<f64>,
    seats: Vec<u32>,
    queue: BinaryHeap<Contender>,
}

impl<'a, F: Fn(f64, u32) -> f64> Awards<'a, F> {
    pub(crate) fn new(fractions: Vec<f64>, rank_index: &'a F) -> Self {
        let queue = fractions
            .iter()
            .enumerate()
            .map(|(position, &fraction)| Contender {
                score: rank_index(fraction, 0),
                fraction,
                position,
            })
            .collect();
        Awards {
            rank_index,
            seats: vec![0; fractions.len()],
            fractions,
            queue,
        }
    }

    pub(crate) fn seats(&self) -> &[u32] {
        &self.seats
    }
}

impl<'a, F: Fn(f64, u32) -> f64> Iterator for Awards<'a, F> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let winner = self.queue.pop()?;
        let position = winner.position;
        self.seats[position] += 1;
        let fraction = self.fractions[position];
        self.queue.push(Contender {
            score: (self.rank_index)(fraction, self.seats[position]),
            fraction,
            position,
        });
        Some(position)
    }
}

/// The share of the votes of each candidate, in tally order.
pub(crate) fn vote_fractions<C: Candidate>(tally: &SimpleTally<C>) -> AttributionResult<Vec<f64>> {
    ensure!(!tally.is_empty(), EmptyTallySnafu);
    let total = tally.total();
    ensure!(total > 0, ZeroVotesSnafu);
    Ok(tally
        .counts()
        .iter()
        .map(|&n| n as f64 / total as f64)
        .collect())
}

/// Proportional method driven by a rank-index function.
#[derive(Debug, Clone, Copy)]
pub struct RankIndexMethod<F> {
    n_seats: u32,
    rank_index: F,
}

pub fn rank_index_method<F>(n_seats: u32, rank_index: F) -> RankIndexMethod<F>
where
    F: Fn(f64, u32) -> f64,
{
    RankIndexMethod {
        n_seats,
        rank_index,
    }
}

impl<C: Candidate, F: Fn(f64, u32) -> f64> Attribution<SimpleTally<C>> for RankIndexMethod<F> {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        info!(
            "RankIndexMethod: attributing {} seats among {} candidates",
            self.n_seats,
            tally.len()
        );
        let fractions = vote_fractions(tally)?;
        let mut awards = Awards::new(fractions, &self.rank_index);
        for seat in 0..self.n_seats {
            if let Some(position) = awards.next() {
                debug!("RankIndexMethod: seat {} -> candidate #{}", seat + 1, position);
            }
        }
        Ok(seats_from_counts(tally.candidates(), awards.seats()))
    }
}

/// The rank index `fraction / divisor(seats)` of a divisor method.
///
/// A zero divisor puts a candidate with votes ahead of every candidate that
/// already holds a seat, and leaves a candidate without votes at zero.
pub fn divisor_rank_index(divisor: DivisorFunction) -> impl Fn(f64, u32) -> f64 + Copy {
    move |fraction, seats| {
        let d = divisor(seats);
        if d == 0.0 {
            if fraction > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            fraction / d
        }
    }
}

pub fn divisor_method(
    n_seats: u32,
    divisor: DivisorFunction,
) -> RankIndexMethod<impl Fn(f64, u32) -> f64 + Copy> {
    rank_index_method(n_seats, divisor_rank_index(divisor))
}

pub fn jefferson_divisor(seats: u32) -> f64 {
    seats as f64 + 1.0
}

pub fn webster_divisor(seats: u32) -> f64 {
    seats as f64 + 0.5
}

/// Geometric mean of `seats` and `seats + 1`. Zero for a candidate without seat.
pub fn huntington_hill_divisor(seats: u32) -> f64 {
    let s = seats as f64;
    (s * (s + 1.0)).sqrt()
}

/// Jefferson / D'Hondt method.
pub fn dhondt(n_seats: u32) -> RankIndexMethod<impl Fn(f64, u32) -> f64 + Copy> {
    divisor_method(n_seats, jefferson_divisor)
}

/// Webster / Sainte-Laguë method.
pub fn sainte_lague(n_seats: u32) -> RankIndexMethod<impl Fn(f64, u32) -> f64 + Copy> {
    divisor_method(n_seats, webster_divisor)
}

/// Huntington-Hill method.
///
/// Every candidate with votes gets a first seat before any candidate gets a
/// second one. If there are more such candidates than seats, the largest ones
/// are served first.
pub fn huntington_hill(n_seats: u32) -> RankIndexMethod<impl Fn(f64, u32) -> f64 + Copy> {
    divisor_method(n_seats, huntington_hill_divisor)
}

/// Hamilton / Hare largest remainder method.
#[derive(Debug, Clone, Copy)]
pub struct LargestRemainder {
    n_seats: u32,
}

pub fn hare(n_seats: u32) -> LargestRemainder {
    LargestRemainder { n_seats }
}

impl<C: Candidate> Attribution<SimpleTally<C>> for LargestRemainder {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        info!(
            "LargestRemainder: attributing {} seats among {} candidates",
            self.n_seats,
            tally.len()
        );
        ensure!(!tally.is_empty(), EmptyTallySnafu);
        let total = tally.total() as u128;
        ensure!(total > 0, ZeroVotesSnafu);

        // Quotas in exact arithmetic: votes * n_seats = whole * total + remainder.
        let n = self.n_seats as u128;
        let quotas: Vec<(u128, u128)> = tally
            .counts()
            .iter()
            .map(|&votes| {
                let q = votes as u128 * n;
                (q / total, q % total)
            })
            .collect();
        let mut seats: Vec<u32> = quotas.iter().map(|(whole, _)| *whole as u32).collect();
        let attributed: u32 = seats.iter().sum();
        let left = self.n_seats - attributed;
        debug!(
            "LargestRemainder: {} seats from whole quotas, {} left to the remainders",
            attributed, left
        );

        // Stable sort: equal remainders keep the tally order.
        let mut by_remainder: Vec<usize> = (0..quotas.len()).collect();
        by_remainder.sort_by(|&a, &b| quotas[b].1.cmp(&quotas[a].1));
        for &position in by_remainder.iter().take(left as usize) {
            seats[position] += 1;
        }
        Ok(seats_from_counts(tally.candidates(), &seats))
    }
}
