use rand::RngCore;

use crate::error::*;
use crate::tally::*;

/// Side-channel passed through every attribution, untouched by the combinators.
///
/// It currently carries the random generator used by the lottery method. A
/// generator passed here is borrowed mutably for the whole call: reusing it
/// across attributions serializes them.
#[derive(Default)]
pub struct Extras<'a> {
    pub rng: Option<&'a mut dyn RngCore>,
}

impl<'a> Extras<'a> {
    pub fn with_rng(rng: &'a mut dyn RngCore) -> Extras<'a> {
        Extras { rng: Some(rng) }
    }
}

/// Converts a tally into seats.
///
/// Implementations are pure with respect to the tally. The only expected
/// failures are reported through [`AttributionError::Failure`].
pub trait Attribution<T: Tally> {
    /// The number of seats always attributed, if it is fixed.
    fn n_seats(&self) -> Option<u32>;

    fn attrib_with(
        &self,
        tally: &T,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<T::Candidate>>;

    fn attrib(&self, tally: &T) -> AttributionResult<Seats<T::Candidate>> {
        self.attrib_with(tally, &mut Extras::default())
    }
}

impl<T: Tally, A: Attribution<T> + ?Sized> Attribution<T> for Box<A> {
    fn n_seats(&self) -> Option<u32> {
        (**self).n_seats()
    }

    fn attrib_with(
        &self,
        tally: &T,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<T::Candidate>> {
        (**self).attrib_with(tally, extras)
    }
}

/// A fallback attribution, called when a method has no result of its own.
pub type Fallback<T> = Box<dyn Attribution<T>>;

/// Checks that a fallback attributes as many seats as the method it backs.
pub(crate) fn check_fallback_seats<T: Tally>(
    n_seats: Option<u32>,
    fallback: &dyn Attribution<T>,
) -> AttributionResult<()> {
    if let (Some(expected), Some(actual)) = (n_seats, fallback.n_seats()) {
        if expected != actual {
            return InvalidConfigSnafu {
                message: format!(
                    "the contingency attributes {} seats instead of {}",
                    actual, expected
                ),
            }
            .fail();
        }
    }
    Ok(())
}

/// Checks that a fraction lies within [0, 1].
pub(crate) fn check_fraction(name: &str, value: f64) -> AttributionResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return InvalidConfigSnafu {
            message: format!("{} must be within [0, 1], got {}", name, value),
        }
        .fail();
    }
    Ok(())
}
