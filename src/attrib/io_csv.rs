// Primitives for reading CSV files.

use std::fs::File;

use crate::attrib::*;

fn get_records(
    path: &str,
    cfs: &TallySource,
) -> AttribResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the spreadsheet world
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

fn parse_count(field: &str, lineno: usize) -> AttribResult<u64> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse::<u64>()
        .ok()
        .context(ParsingCountSnafu { lineno, value: field })
}

/// One row per candidate: the name in the first column, the count in the
/// first vote column.
pub fn read_csv_simple(path: &str, cfs: &TallySource) -> AttribResult<SimpleTally<String>> {
    let count_col = cfs.first_vote_column_index()?;
    let (records, row_offset) = get_records(path, cfs)?;
    let mut tally = SimpleTally::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let name = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let count = line.get(count_col).context(CsvLineTooShortSnafu { lineno })?;
        tally.add(name.trim().to_string(), parse_count(count, lineno)?);
    }
    Ok(tally)
}

/// One row per ballot: the candidates from the first vote column, most
/// preferred first. Empty cells are skipped.
pub fn read_csv_order(path: &str, cfs: &TallySource) -> AttribResult<OrderTally<String>> {
    let choices_start_col = cfs.first_vote_column_index()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let (records, row_offset) = get_records(path, cfs)?;
    let mut tally = OrderTally::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let count = match count_idx_o {
            Some(count_idx) => {
                let field = line.get(count_idx).context(CsvLineTooShortSnafu { lineno })?;
                parse_count(field, lineno)?
            }
            None => 1,
        };
        let ranks: Vec<String> = line
            .iter()
            .enumerate()
            .skip(choices_start_col)
            .filter(|(col, _)| Some(*col) != count_idx_o)
            .map(|(_, s)| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        debug!("read_csv_order: lineno: {:?} ranks: {:?}", lineno, ranks);
        if ranks.is_empty() || count == 0 {
            warn!("read_csv_order: line {}: skipping empty ballot", lineno);
            continue;
        }
        tally.add_ballot(ranks, count)?;
    }
    Ok(tally)
}

/// One row per candidate: the name in the first column, then the number of
/// ballots for each grade from the first vote column.
pub fn read_csv_scores(path: &str, cfs: &TallySource) -> AttribResult<ScoresTally<String>> {
    let start_col = cfs.first_vote_column_index()?;
    let ngrades = cfs.ngrades.context(MissingOptionSnafu {
        option: "ngrades",
        method: "csv scores",
    })?;
    let (records, row_offset) = get_records(path, cfs)?;
    let mut tally = ScoresTally::new(ngrades);
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let name = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let histogram = line
            .iter()
            .skip(start_col)
            .map(|s| parse_count(s, lineno))
            .collect::<AttribResult<Vec<u64>>>()?;
        tally.insert(name.trim().to_string(), histogram)?;
    }
    Ok(tally)
}
