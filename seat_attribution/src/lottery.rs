use log::{debug, info};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::prelude::*;

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

/// Draws every seat independently, with replacement, with a probability
/// proportional to the votes of each candidate.
///
/// The generator comes from the extras when one is given there. Otherwise a
/// generator is seeded from `seed` at every call, so that the same seed always
/// gives the same seats. Without any seed, the thread generator is used.
#[derive(Debug, Clone, Copy)]
pub struct Lottery {
    n_seats: u32,
    seed: Option<u64>,
}

pub fn lottery(n_seats: u32) -> Lottery {
    Lottery {
        n_seats,
        seed: None,
    }
}

impl Lottery {
    pub fn with_seed(self, seed: u64) -> Self {
        Lottery {
            seed: Some(seed),
            ..self
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn draw<C: Candidate, R: Rng + ?Sized>(
        &self,
        tally: &SimpleTally<C>,
        rng: &mut R,
    ) -> AttributionResult<Seats<C>> {
        ensure!(!tally.is_empty(), EmptyTallySnafu);
        let weights = WeightedIndex::new(tally.counts()).ok().context(ZeroVotesSnafu)?;
        let mut seats = vec![0; tally.len()];
        for _ in 0..self.n_seats {
            seats[weights.sample(rng)] += 1;
        }
        debug!("Lottery: drawn {:?}", seats);
        Ok(seats_from_counts(tally.candidates(), &seats))
    }
}

impl<C: Candidate> Attribution<SimpleTally<C>> for Lottery {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        info!(
            "Lottery: drawing {} seats among {} candidates",
            self.n_seats,
            tally.len()
        );
        match (extras.rng.as_deref_mut(), self.seed) {
            (Some(rng), _) => self.draw(tally, rng),
            (None, Some(seed)) => self.draw(tally, &mut StdRng::seed_from_u64(seed)),
            (None, None) => self.draw(tally, &mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(counts: &[(&'static str, u64)]) -> SimpleTally<&'static str> {
        counts.iter().cloned().collect()
    }

    #[test]
    fn draws_all_the_seats() {
        let t = tally(&[("A", 10), ("B", 5), ("C", 1)]);
        let seats = lottery(50).attrib(&t).unwrap();
        assert_eq!(seats.values().sum::<u32>(), 50);
    }

    #[test]
    fn candidates_without_votes_are_never_drawn() {
        let t = tally(&[("A", 0), ("B", 3), ("C", 0)]);
        let seats = lottery(100).with_seed(7).attrib(&t).unwrap();
        assert_eq!(seats.get("B"), Some(&100));
        assert_eq!(seats.len(), 1);
    }

    #[test]
    fn same_seed_same_seats() {
        let t = tally(&[("A", 10), ("B", 10), ("C", 10), ("D", 10)]);
        let m = lottery(20).with_seed(42);
        assert_eq!(m.seed(), Some(42));
        assert_eq!(m.attrib(&t).unwrap(), m.attrib(&t).unwrap());
    }

    #[test]
    fn generator_from_extras_takes_precedence() {
        let t = tally(&[("A", 10), ("B", 10), ("C", 10), ("D", 10)]);
        let seeded = lottery(20).with_seed(42).attrib(&t).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut extras = Extras::with_rng(&mut rng);
        // The seed of the method is ignored, the generator state is shared.
        let first = lottery(20).with_seed(1).attrib_with(&t, &mut extras).unwrap();
        assert_eq!(first, seeded);
        let second = lottery(20).with_seed(42).attrib_with(&t, &mut extras).unwrap();
        assert_eq!(second.values().sum::<u32>(), 20);
    }

    #[test]
    fn degenerate_tallies() {
        assert!(lottery(3).attrib(&tally(&[("A", 1)])).unwrap().get("A") == Some(&3));
        assert!(lottery(0).attrib(&tally(&[("A", 1)])).unwrap().is_empty());
        assert!(matches!(
            lottery(3).attrib(&tally(&[("A", 0), ("B", 0)])),
            Err(AttributionError::ZeroVotes {})
        ));
        assert!(matches!(
            lottery(3).attrib(&SimpleTally::<&str>::new()),
            Err(AttributionError::EmptyTally {})
        ));
    }
}
