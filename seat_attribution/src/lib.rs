/*!
Seat attribution: converts a tally of ballots into seats.

Every method implements [`Attribution`] over one of the three tally shapes:
- [`SimpleTally`]: a count of ballots per candidate
- [`OrderTally`]: ranked ballots, each with a multiplicity
- [`ScoresTally`]: a histogram of grades per candidate

```
use seat_attribution::*;

let tally: SimpleTally<&str> = [("A", 100000), ("B", 80000), ("C", 30000), ("D", 20000)]
    .into_iter()
    .collect();
let seats = dhondt(8).attrib(&tally)?;
assert_eq!(seats.get("A"), Some(&4));
assert_eq!(seats.get("B"), Some(&3));
assert_eq!(seats.get("C"), Some(&1));
assert_eq!(seats.get("D"), None);
# Ok::<(), AttributionError>(())
```

Methods that cannot produce a result return an [`AttributionFailure`] wrapped in
[`AttributionError::Failure`]. Most of them accept a contingency, another
attribution that is used in this case. See the [manual] for the list of methods.
 */

mod apportionment;
mod attribution;
mod error;
mod lottery;
mod majority;
pub mod manual;
mod proportional;
mod ranked;
mod score;
mod tally;
mod threshold;

pub use crate::apportionment::{
    bounded_divisor_method, bounded_rank_index_method, least_squares_index,
    mean_absolute_deviation, BoundedRankIndexMethod, DisproportionMetric,
};
pub use crate::attribution::{Attribution, Extras, Fallback};
pub use crate::error::{AttributionError, AttributionFailure, AttributionResult};
pub use crate::lottery::{lottery, Lottery};
pub use crate::majority::{majority, plurality, super_majority, Plurality, SuperMajority};
pub use crate::proportional::{
    dhondt, divisor_method, divisor_rank_index, hare, huntington_hill, huntington_hill_divisor,
    jefferson_divisor, rank_index_method, sainte_lague, webster_divisor, DivisorFunction,
    LargestRemainder, RankIndexFunction, RankIndexMethod,
};
pub use crate::ranked::{
    borda, condorcet, instant_runoff, pairwise_preferences, Borda, Condorcet, InstantRunoff,
};
pub use crate::score::{
    average_grade, average_score, median_grade, median_score, AverageScore, MedianScore,
};
pub use crate::tally::{Candidate, OrderTally, RankedBallot, ScoresTally, Seats, SimpleTally, Tally};
pub use crate::threshold::{Contingency, Thresholded};
