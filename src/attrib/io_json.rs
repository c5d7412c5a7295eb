// Readers for tallies written in JSON.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::attrib::*;

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum JsonBallot {
    Ranks(Vec<String>),
    Counted { ranks: Vec<String>, count: u64 },
}

#[derive(Deserialize, Debug)]
struct JsonScores {
    ngrades: usize,
    grades: IndexMap<String, Vec<u64>>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &str) -> AttribResult<T> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu {})
}

/// `{"A": 10, "B": 3}`. The order of the file is the order of the tally.
pub fn read_json_simple(path: &str) -> AttribResult<SimpleTally<String>> {
    let counts: IndexMap<String, u64> = read_json(path)?;
    debug!("read_json_simple: {:?}", counts);
    Ok(counts.into_iter().collect())
}

/// A list of ballots, each a list of candidates or `{"ranks": [...], "count": n}`.
pub fn read_json_order(path: &str) -> AttribResult<OrderTally<String>> {
    let ballots: Vec<JsonBallot> = read_json(path)?;
    let mut tally = OrderTally::new();
    for ballot in ballots {
        let (ranks, count) = match ballot {
            JsonBallot::Ranks(ranks) => (ranks, 1),
            JsonBallot::Counted { ranks, count } => (ranks, count),
        };
        tally.add_ballot(ranks, count)?;
    }
    info!("read_json_order: {} ballots", tally.total());
    Ok(tally)
}

/// `{"ngrades": 3, "grades": {"A": [0, 2, 5]}}`
pub fn read_json_scores(path: &str) -> AttribResult<ScoresTally<String>> {
    let scores: JsonScores = read_json(path)?;
    let mut tally = ScoresTally::new(scores.ngrades);
    for (candidate, histogram) in scores.grades {
        tally.insert(candidate, histogram)?;
    }
    Ok(tally)
}
