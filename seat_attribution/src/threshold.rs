use log::{debug, info};

use crate::attribution::*;
use crate::error::*;
use crate::tally::*;

/// What to do when no candidate reaches the eligibility threshold.
pub enum Contingency<T: Tally> {
    /// Fail with [`AttributionFailure::BelowThreshold`].
    Fail,
    /// Run the base attribution again on the complete tally.
    Unthresholded,
    /// Run another attribution on the complete tally.
    Delegate(Fallback<T>),
}

/// Only the candidates that received at least a given fraction of the votes
/// take part in the base attribution.
///
/// ```
/// use seat_attribution::*;
///
/// let tally: SimpleTally<&str> = [("A", 60), ("B", 37), ("C", 3)].into_iter().collect();
/// let method = Thresholded::new(dhondt(10), 0.05)?;
/// let seats = method.attrib(&tally)?;
/// assert_eq!(seats.get("C"), None);
/// # Ok::<(), AttributionError>(())
/// ```
pub struct Thresholded<C: Candidate, A> {
    base: A,
    threshold: f64,
    contingency: Contingency<SimpleTally<C>>,
}

impl<C: Candidate, A: Attribution<SimpleTally<C>>> Thresholded<C, A> {
    /// A thresholded attribution that falls back to the unthresholded base.
    pub fn new(base: A, threshold: f64) -> AttributionResult<Self> {
        check_fraction("threshold", threshold)?;
        Ok(Thresholded {
            base,
            threshold,
            contingency: Contingency::Unthresholded,
        })
    }

    pub fn with_contingency(self, contingency: Contingency<SimpleTally<C>>) -> AttributionResult<Self> {
        if let Contingency::Delegate(fallback) = &contingency {
            check_fallback_seats(self.base.n_seats(), fallback.as_ref())?;
        }
        Ok(Thresholded {
            contingency,
            ..self
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<C: Candidate, A: Attribution<SimpleTally<C>>> Attribution<SimpleTally<C>> for Thresholded<C, A> {
    fn n_seats(&self) -> Option<u32> {
        self.base.n_seats()
    }

    fn attrib_with(
        &self,
        tally: &SimpleTally<C>,
        extras: &mut Extras<'_>,
    ) -> AttributionResult<Seats<C>> {
        let total = tally.total();
        if self.threshold == 0.0 || total == 0 {
            return self.base.attrib_with(tally, extras);
        }
        // The share is compared directly: `threshold * total` may round
        // past an exact boundary.
        let eligible = tally.filter(|_, count| count as f64 / total as f64 >= self.threshold);
        debug!(
            "Thresholded: {} of {} candidates at or above {} of the votes",
            eligible.len(),
            tally.len(),
            self.threshold
        );
        if !eligible.is_empty() {
            return self.base.attrib_with(&eligible, extras);
        }
        match &self.contingency {
            Contingency::Fail => Err(AttributionFailure::BelowThreshold {
                threshold: self.threshold,
            }
            .into()),
            Contingency::Unthresholded => {
                info!("Thresholded: no eligible candidate, attributing without threshold");
                self.base.attrib_with(tally, extras)
            }
            Contingency::Delegate(fallback) => {
                info!("Thresholded: no eligible candidate, using the contingency");
                fallback.attrib_with(tally, extras)
            }
        }
    }
}
