use crate::attrib::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
}

/// The three shapes of tallies that can be read.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyKind {
    Simple,
    Order,
    Scores,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct TallySource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub kind: TallyKind,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    /// Number of grades, for scores tallies read from CSV.
    pub ngrades: Option<usize>,
}

impl TallySource {
    /// The first column holding a rank or a count (0-based). Defaults to the
    /// second column.
    pub fn first_vote_column_index(&self) -> AttribResult<usize> {
        if self._first_vote_column_index.is_none() {
            return Ok(1);
        }
        let x = read_js_int(&self._first_vote_column_index)?;
        Ok(x.saturating_sub(1))
    }

    /// The first row holding data (1-based). Defaults to the row after the header.
    pub fn first_vote_row_index(&self) -> AttribResult<usize> {
        if self._first_vote_row_index.is_none() {
            return Ok(2);
        }
        read_js_int(&self._first_vote_row_index)
    }

    /// The column holding the multiplicity of a ballot (0-based), if any.
    pub fn count_column_index_int(&self) -> AttribResult<Option<usize>> {
        if self.count_column_index.is_some() {
            read_js_int(&self.count_column_index).map(|x| Some(x.saturating_sub(1)))
        } else {
            Ok(None)
        }
    }
}

/// The contingency of a method: a keyword or a nested method.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContingencyConfig {
    Keyword(String),
    Method(Box<MethodConfig>),
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MethodConfig {
    pub method: String,
    #[serde(rename = "nSeats")]
    pub n_seats: Option<u32>,
    #[serde(rename = "minSeats")]
    pub min_seats: Option<u32>,
    #[serde(rename = "maxSeats")]
    pub max_seats: Option<u32>,
    pub threshold: Option<f64>,
    pub contingency: Option<ContingencyConfig>,
    pub majority: Option<f64>,
    pub divisor: Option<String>,
    pub metric: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
}

impl MethodConfig {
    pub fn n_seats(&self) -> AttribResult<u32> {
        self.n_seats.context(MissingOptionSnafu {
            option: "nSeats",
            method: self.method.clone(),
        })
    }

    pub fn random_seed(&self) -> AttribResult<Option<u64>> {
        if self.random_seed.is_some() {
            read_js_int(&self.random_seed).map(|x| Some(x as u64))
        } else {
            Ok(None)
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AttribConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "tallySource")]
    pub tally_source: TallySource,
    pub attribution: MethodConfig,
}

pub fn read_config(path: &str) -> AttribResult<AttribConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: String) -> AttribResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// Numbers may be written as JSON numbers, as strings, or as spreadsheet
// column letters ("A" is 1, "AA" is 27).
fn read_js_int(x: &Option<JSValue>) -> AttribResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase()
                .chars()
                .try_fold(0usize, |acc, c| {
                    acc.checked_mul(26)?.checked_add(c as usize - 'a' as usize + 1)
                })
                .context(ParsingJsonNumberSnafu {})
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_column_indices() {
        assert_eq!(read_js_int(&Some(json!(3))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("3"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("C"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("aa"))).unwrap(), 27);
        assert!(read_js_int(&Some(json!(-1))).is_err());
        assert!(read_js_int(&None).is_err());
        assert!(read_js_int(&Some(json!("Z".repeat(40)))).is_err());
    }

    #[test]
    fn reads_nested_contingencies() {
        let js = json!({
            "method": "condorcet",
            "nSeats": 1,
            "contingency": {"method": "borda", "nSeats": 1}
        });
        let m: MethodConfig = serde_json::from_value(js).unwrap();
        match m.contingency {
            Some(ContingencyConfig::Method(inner)) => assert_eq!(inner.method, "borda"),
            x => panic!("unexpected contingency {:?}", x),
        }

        let js = json!({"method": "dhondt", "nSeats": 3, "threshold": 0.05, "contingency": "fail"});
        let m: MethodConfig = serde_json::from_value(js).unwrap();
        assert_eq!(m.contingency, Some(ContingencyConfig::Keyword("fail".to_string())));
    }

    #[test]
    fn missing_seat_count() {
        let m: MethodConfig = serde_json::from_value(json!({"method": "dhondt"})).unwrap();
        assert!(matches!(m.n_seats(), Err(AttribError::MissingOption { .. })));
    }
}
