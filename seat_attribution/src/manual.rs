/*!

This is the long-form manual for `seat_attribution` and `seatattr`.

## Methods

### Proportional methods (simple tallies)

| name            | function                    | notes                                       |
|-----------------|-----------------------------|---------------------------------------------|
| `dhondt`        | [`crate::dhondt`]           | Jefferson divisors `1, 2, 3, ...`           |
| `sainte_lague`  | [`crate::sainte_lague`]     | Webster divisors `0.5, 1.5, 2.5, ...`       |
| `huntington_hill` | [`crate::huntington_hill`] | every candidate with votes gets a seat first |
| `hare`          | [`crate::hare`]             | largest remainder, exact quotas             |
| `bounded`       | [`crate::bounded_divisor_method`] | also picks the size of the assembly   |

The divisor methods award the seats one by one to the candidate with the
highest `fraction / divisor(seats held)`. Equal scores go to the candidate with
more votes, then to the first one in the tally.

The bounded method awards seats the same way up to `maxSeats` and returns the
assembly of at least `minSeats` seats that is the least disproportionate. The
metric is either `mad` (mean absolute deviation between the entitlements and
the seats, the default) or `gallagher` (least squares index).

### Majority methods (simple tallies)

- `plurality`: all the seats go to the candidate with the most votes. It fails
  when nobody received a vote.
- `majority`: all the seats go to the candidate with strictly more than the
  `majority` fraction of the votes (one half by default). Otherwise the
  `contingency` is used, or the attribution fails.

### Ranked methods (order tallies)

- `irv`: instant runoff. The candidate with the fewest first choices is
  eliminated until one candidate has more than half of the active ballots.
- `borda`: on a ballot listing `k` candidates, the first one gets `k` points,
  the next one `k - 1` and so on down to 1. Unranked candidates get nothing.
- `condorcet`: the candidate that beats every other one in pairwise comparisons.
  Otherwise the `contingency` is used, or the attribution fails with a standoff.

### Score methods (scores tallies)

- `average_score`: the candidate with the best mean grade.
- `median_score`: the candidate with the best median grade. Ties are decided by
  the `contingency` (the average score by default) among the tied candidates.

### Lottery (simple tallies)

- `lottery`: every seat is drawn independently with a probability proportional
  to the votes. The `randomSeed` option makes the draw reproducible.

## Thresholds

The proportional and majority methods accept a `threshold`: only the candidates
with at least this fraction of the votes take part. When nobody reaches it, the
`contingency` decides:
- `"unthresholded"` (default): the method runs again on the complete tally
- `"fail"`: the attribution fails
- a nested method description: this method runs on the complete tally

## Input formats

Tallies are read from JSON or CSV files.

### `json`

- simple: `{"A": 10, "B": 3}`
- order: a list of ballots, each either a list of candidates or an object
  `{"ranks": ["A", "B"], "count": 12}`
- scores: `{"ngrades": 3, "grades": {"A": [0, 2, 5], "B": [1, 1, 1]}}`

### `csv`

- simple: one row per candidate, `candidate,count`
- order: one row per ballot. The ranks start at `firstVoteColumnIndex`. When
  `countColumnIndex` is set, this column holds the multiplicity of the ballot.
- scores: one row per candidate, `candidate,grade 0,grade 1,...`

The first row is skipped when it is a header (`firstVoteRowIndex`).

## Configuration

The program reads a configuration file in JSON:

```text
{
  "outputSettings": {
    "contestName": "City council"
  },
  "tallySource": {
    "provider": "json",
    "kind": "simple",
    "filePath": "tally.json"
  },
  "attribution": {
    "method": "dhondt",
    "nSeats": 9,
    "threshold": 0.05,
    "contingency": "fail"
  }
}
```

Paths are relative to the configuration file. The contingency of the `majority`,
`condorcet` and `median_score` methods is a nested method description:

```text
"attribution": {
  "method": "condorcet",
  "nSeats": 1,
  "contingency": { "method": "borda", "nSeats": 1 }
}
```

A contingency must attribute the same number of seats as the method it backs.

 */
