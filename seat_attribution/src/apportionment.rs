use log::{debug, info};

use crate::attribution::*;
use crate::error::*;
use crate::proportional::*;
use crate::tally::*;

/// Measures how far an attribution of `seats` is from the `votes`.
///
/// Both slices are in tally order. Lower is better. It must only depend on its
/// arguments.
pub type DisproportionMetric = fn(&[u64], &[u32]) -> f64;

// Exact entitlement of each candidate for the current size of the assembly.
fn entitlements(votes: &[u64], seats: &[u32]) -> Vec<f64> {
    let total_votes: u64 = votes.iter().sum();
    let total_seats: u32 = seats.iter().sum();
    if total_votes == 0 {
        return vec![0.0; votes.len()];
    }
    votes
        .iter()
        .map(|&v| v as f64 * total_seats as f64 / total_votes as f64)
        .collect()
}

/// Mean absolute deviation between the entitlements and the seats.
pub fn mean_absolute_deviation(votes: &[u64], seats: &[u32]) -> f64 {
    if votes.is_empty() {
        return 0.0;
    }
    let deviation: f64 = entitlements(votes, seats)
        .iter()
        .zip(seats.iter())
        .map(|(e, &s)| (e - s as f64).abs())
        .sum();
    deviation / votes.len() as f64
}

/// Least squares index (Gallagher), on shares of votes and seats.
pub fn least_squares_index(votes: &[u64], seats: &[u32]) -> f64 {
    let total_votes: u64 = votes.iter().sum();
    let total_seats: u32 = seats.iter().sum();
    if total_votes == 0 || total_seats == 0 {
        return 0.0;
    }
    let sq: f64 = votes
        .iter()
        .zip(seats.iter())
        .map(|(&v, &s)| {
            let d = v as f64 / total_votes as f64 - s as f64 / total_seats as f64;
            d * d
        })
        .sum();
    (sq / 2.0).sqrt()
}

/// Proportional method that also picks the size of the assembly.
///
/// Seats are awarded one by one as in [`RankIndexMethod`], up to `max_seats`.
/// Among the assemblies of at least `min_seats` seats (and at least one), the
/// least disproportionate one is returned. On equal metric, the smallest
/// assembly wins.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRankIndexMethod<F> {
    min_seats: u32,
    max_seats: u32,
    rank_index: F,
    metric: DisproportionMetric,
}

pub fn bounded_rank_index_method<F>(
    min_seats: u32,
    max_seats: u32,
    rank_index: F,
) -> AttributionResult<BoundedRankIndexMethod<F>>
where
    F: Fn(f64, u32) -> f64,
{
    if min_seats > max_seats {
        return InvalidConfigSnafu {
            message: format!(
                "the minimum number of seats ({}) exceeds the maximum ({})",
                min_seats, max_seats
            ),
        }
        .fail();
    }
    Ok(BoundedRankIndexMethod {
        min_seats,
        max_seats,
        rank_index,
        metric: mean_absolute_deviation,
    })
}

pub fn bounded_divisor_method(
    min_seats: u32,
    max_seats: u32,
    divisor: DivisorFunction,
) -> AttributionResult<BoundedRankIndexMethod<impl Fn(f64, u32) -> f64 + Copy>> {
    bounded_rank_index_method(min_seats, max_seats, divisor_rank_index(divisor))
}

impl<F> BoundedRankIndexMethod<F> {
    pub fn with_metric(self, metric: DisproportionMetric) -> Self {
        BoundedRankIndexMethod { metric, ..self }
    }

    pub fn seat_range(&self) -> (u32, u32) {
        (self.min_seats, self.max_seats)
    }
}

impl<C: Candidate, F: Fn(f64, u32) -> f64> Attribution<SimpleTally<C>> for BoundedRankIndexMethod<F> {
    fn n_seats(&self) -> Option<u32> {
        None
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        info!(
            "BoundedRankIndexMethod: looking for {}..={} seats among {} candidates",
            self.min_seats,
            self.max_seats,
            tally.len()
        );
        if self.max_seats == 0 {
            return Ok(Seats::new());
        }
        let votes = tally.counts();
        let fractions = vote_fractions(tally)?;
        let mut awards = Awards::new(fractions, &self.rank_index);
        let first_scored = self.min_seats.max(1);
        let mut best: Option<(f64, Vec<u32>)> = None;
        for size in 1..=self.max_seats {
            awards.next();
            if size < first_scored {
                continue;
            }
            let disproportion = (self.metric)(&votes, awards.seats());
            debug!(
                "BoundedRankIndexMethod: {} seats, disproportion {}",
                size, disproportion
            );
            let improves = match &best {
                Some((d, _)) => disproportion < *d,
                None => true,
            };
            if improves {
                best = Some((disproportion, awards.seats().to_vec()));
            }
        }
        let seats = best.map(|(_, s)| s).unwrap_or_default();
        Ok(seats_from_counts(tally.candidates(), &seats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(counts: &[(&'static str, u64)]) -> SimpleTally<&'static str> {
        counts.iter().cloned().collect()
    }

    #[test]
    fn single_size_matches_fixed_method() {
        let t = tally(&[("A", 100000), ("B", 80000), ("C", 30000), ("D", 1234)]);
        for k in 0..25 {
            let bounded = bounded_divisor_method(k, k, jefferson_divisor).unwrap();
            assert_eq!(bounded.attrib(&t).unwrap(), dhondt(k).attrib(&t).unwrap());
            let bounded = bounded_divisor_method(k, k, webster_divisor).unwrap();
            assert_eq!(bounded.attrib(&t).unwrap(), sainte_lague(k).attrib(&t).unwrap());
        }
    }

    #[test]
    fn finds_exactly_proportional_assembly() {
        // 3 seats split 2/1 is exact, nothing else below 6 seats is.
        let t = tally(&[("A", 200), ("B", 100)]);
        let m = bounded_divisor_method(1, 5, jefferson_divisor).unwrap();
        let seats = m.attrib(&t).unwrap();
        assert_eq!(seats.get("A"), Some(&2));
        assert_eq!(seats.get("B"), Some(&1));
    }

    #[test]
    fn result_stays_within_range() {
        let t = tally(&[("A", 200), ("B", 100)]);
        let m = bounded_divisor_method(4, 5, jefferson_divisor).unwrap();
        assert_eq!(m.seat_range(), (4, 5));
        let total: u32 = m.attrib(&t).unwrap().values().sum();
        assert!((4..=5).contains(&total));
    }

    #[test]
    fn zero_minimum_does_not_return_empty_assembly() {
        let t = tally(&[("A", 7), ("B", 3)]);
        let m = bounded_divisor_method(0, 10, jefferson_divisor).unwrap();
        let seats = m.attrib(&t).unwrap();
        assert_eq!(seats.get("A"), Some(&7));
        assert_eq!(seats.get("B"), Some(&3));

        let m = bounded_divisor_method(0, 0, jefferson_divisor).unwrap();
        assert!(m.attrib(&t).unwrap().is_empty());
    }

    #[test]
    fn custom_metric() {
        let t = tally(&[("A", 7), ("B", 3)]);
        // Prefer the largest assembly.
        let m = bounded_divisor_method(1, 6, jefferson_divisor)
            .unwrap()
            .with_metric(|_, seats| -(seats.iter().sum::<u32>() as f64));
        assert_eq!(m.attrib(&t).unwrap().values().sum::<u32>(), 6);
    }

    #[test]
    fn metrics() {
        assert_eq!(mean_absolute_deviation(&[2, 1], &[2, 1]), 0.0);
        assert!((mean_absolute_deviation(&[1, 1], &[2, 0]) - 1.0).abs() < 1e-12);
        assert_eq!(least_squares_index(&[2, 1], &[4, 2]), 0.0);
        assert!((least_squares_index(&[1, 1], &[1, 0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(matches!(
            bounded_divisor_method(3, 2, jefferson_divisor),
            Err(AttributionError::InvalidConfig { .. })
        ));
    }
}
