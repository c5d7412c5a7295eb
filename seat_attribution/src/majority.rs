use log::info;
use snafu::prelude::*;

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

// The candidate with the most votes. Ties go to the first one in tally order.
fn leader<C: Candidate>(tally: &SimpleTally<C>) -> AttributionResult<(&C, u64)> {
    let mut best: Option<(&C, u64)> = None;
    for (c, n) in tally.iter() {
        match best {
            Some((_, m)) if n <= m => {}
            _ => best = Some((c, n)),
        }
    }
    best.context(EmptyTallySnafu)
}

/// All the seats go to the candidate with the most votes.
#[derive(Debug, Clone, Copy)]
pub struct Plurality {
    n_seats: u32,
}

pub fn plurality(n_seats: u32) -> Plurality {
    Plurality { n_seats }
}

impl<C: Candidate> Attribution<SimpleTally<C>> for Plurality {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        _extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let (winner, count) = leader(tally)?;
        info!("Plurality: leader {:?} with {} votes", winner, count);
        if count == 0 {
            return Err(AttributionFailure::NoSupport {}.into());
        }
        Ok(all_seats_to(winner.clone(), self.n_seats))
    }
}

/// All the seats go to the candidate with strictly more than a fraction of
/// the votes.
///
/// With a fraction of one half, this is the absolute majority rule. When no
/// candidate qualifies, the contingency is used if there is one.
pub struct SuperMajority<C: Candidate> {
    n_seats: u32,
    threshold: f64,
    contingency: Option<Fallback<SimpleTally<C>>>,
}

pub fn super_majority<C: Candidate>(n_seats: u32, threshold: f64) -> AttributionResult<SuperMajority<C>> {
    check_fraction("majority threshold", threshold)?;
    Ok(SuperMajority {
        n_seats,
        threshold,
        contingency: None,
    })
}

/// Absolute majority: more than half of the votes.
pub fn majority<C: Candidate>(n_seats: u32) -> SuperMajority<C> {
    SuperMajority {
        n_seats,
        threshold: 0.5,
        contingency: None,
    }
}

impl<C: Candidate> SuperMajority<C> {
    pub fn with_contingency(self, contingency: Fallback<SimpleTally<C>>) -> AttributionResult<Self> {
        check_fallback_seats(Some(self.n_seats), contingency.as_ref())?;
        Ok(SuperMajority {
            contingency: Some(contingency),
            ..self
        })
    }
}

impl<C: Candidate> Attribution<SimpleTally<C>> for SuperMajority<C> {
    fn n_seats(&self) -> Option<u32> {
        Some(self.n_seats)
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let (winner, count) = leader(tally)?;
        let total = tally.total();
        info!(
            "SuperMajority: leader {:?} with {} of {} votes (needs more than {})",
            winner, count, total, self.threshold
        );
        // Strict comparison: reaching the threshold exactly is not enough.
        if count > 0 && count as f64 / total as f64 > self.threshold {
            return Ok(all_seats_to(winner.clone(), self.n_seats));
        }
        match &self.contingency {
            Some(fallback) => {
                info!("SuperMajority: no qualified winner, using the contingency");
                fallback.attrib_with(tally, extras)
            }
            None => Err(AttributionFailure::NoMajority {
                threshold: self.threshold,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottery::lottery;
    use crate::proportional::dhondt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tally(counts: &[(&'static str, u64)]) -> SimpleTally<&'static str> {
        counts.iter().cloned().collect()
    }

    #[test]
    fn plurality_winner_takes_all() {
        let res = plurality(1).attrib(&tally(&[("A", 5), ("B", 3)])).unwrap();
        assert_eq!(res.get("A"), Some(&1));
        assert_eq!(res.len(), 1);

        let res = plurality(7).attrib(&tally(&[("A", 5), ("B", 30), ("C", 4)])).unwrap();
        assert_eq!(res.get("B"), Some(&7));
    }

    #[test]
    fn plurality_without_support_fails() {
        let err = plurality(1).attrib(&tally(&[("A", 0), ("B", 0)])).unwrap_err();
        assert_eq!(err.failure(), Some(&AttributionFailure::NoSupport {}));
    }

    #[test]
    fn plurality_on_empty_tally_is_an_error() {
        let err = plurality(1).attrib(&SimpleTally::<&str>::new()).unwrap_err();
        assert!(!err.is_failure());
        assert!(matches!(err, AttributionError::EmptyTally {}));
    }

    #[test]
    fn plurality_tie_goes_to_first_candidate() {
        let res = plurality(1).attrib(&tally(&[("B", 4), ("A", 4)])).unwrap();
        assert_eq!(res.get("B"), Some(&1));
    }

    #[test]
    fn majority_needs_more_than_half() {
        let m = majority(1);
        assert_eq!(m.attrib(&tally(&[("A", 6), ("B", 5)])).unwrap().get("A"), Some(&1));
        // Exactly half is not enough.
        let err = m.attrib(&tally(&[("A", 5), ("B", 5)])).unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&AttributionFailure::NoMajority { threshold: 0.5 })
        );
    }

    #[test]
    fn super_majority_boundary() {
        let m = super_majority(1, 0.6).unwrap();
        // 60 % exactly fails, 61 % passes.
        assert!(m.attrib(&tally(&[("A", 60), ("B", 40)])).unwrap_err().is_failure());
        assert_eq!(m.attrib(&tally(&[("A", 61), ("B", 39)])).unwrap().get("A"), Some(&1));

        // 0.57 * 100 is slightly below 57 in floating point.
        let m = super_majority(1, 0.57).unwrap();
        let err = m.attrib(&tally(&[("A", 57), ("B", 43)])).unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&AttributionFailure::NoMajority { threshold: 0.57 })
        );
        assert_eq!(m.attrib(&tally(&[("A", 58), ("B", 42)])).unwrap().get("A"), Some(&1));
    }

    #[test]
    fn super_majority_uses_contingency() {
        let m = super_majority(3, 2.0 / 3.0)
            .unwrap()
            .with_contingency(Box::new(dhondt(3)))
            .unwrap();
        let res = m.attrib(&tally(&[("A", 50), ("B", 50)])).unwrap();
        assert_eq!(res.values().sum::<u32>(), 3);
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn generator_reaches_the_contingency() {
        let t = tally(&[("A", 50), ("B", 50)]);

        let mut rng = StdRng::seed_from_u64(3);
        let expected = lottery(5)
            .attrib_with(&t, &mut Extras::with_rng(&mut rng))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let m = super_majority(5, 0.5)
            .unwrap()
            .with_contingency(Box::new(lottery(5).with_seed(1)))
            .unwrap();
        let seats = m.attrib_with(&t, &mut Extras::with_rng(&mut rng)).unwrap();
        assert_eq!(seats, expected);
    }

    #[test]
    fn super_majority_rejects_bad_configuration() {
        assert!(super_majority::<&str>(1, -0.1).is_err());
        assert!(majority::<&str>(1).with_contingency(Box::new(dhondt(2))).is_err());
    }
}
