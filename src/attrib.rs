use log::{debug, info, warn};

use seat_attribution::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::attrib::config_reader::*;

mod config_reader;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum AttribError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Could not read a number in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file: {source}"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error reading CSV line: {source}"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: could not read the count {value:?}"))]
    ParsingCount { lineno: usize, value: String },
    #[snafu(display(""))]
    MissingParentDir {},
    #[snafu(display("Option {option} is required for {method}"))]
    MissingOption { option: String, method: String },
    #[snafu(display("Method {method} does not apply to {kind} tallies"))]
    UnknownMethod { method: String, kind: String },
    #[snafu(display("{source}"), context(false))]
    Attribution { source: AttributionError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AttribResult<T> = Result<T, AttribError>;

type DynAttribution<T> = Box<dyn Attribution<T>>;

/// A tally, as read from the input.
#[derive(Debug, Clone)]
enum ParsedTally {
    Simple(SimpleTally<String>),
    Order(OrderTally<String>),
    Scores(ScoresTally<String>),
}

fn read_tally(path: &str, provider: &str, cfs: &TallySource) -> AttribResult<ParsedTally> {
    info!("Attempting to read {:?} tally file {:?}", cfs.kind, path);
    let tally = match (provider, cfs.kind) {
        ("json", TallyKind::Simple) => ParsedTally::Simple(io_json::read_json_simple(path)?),
        ("json", TallyKind::Order) => ParsedTally::Order(io_json::read_json_order(path)?),
        ("json", TallyKind::Scores) => ParsedTally::Scores(io_json::read_json_scores(path)?),
        ("csv", TallyKind::Simple) => ParsedTally::Simple(io_csv::read_csv_simple(path, cfs)?),
        ("csv", TallyKind::Order) => ParsedTally::Order(io_csv::read_csv_order(path, cfs)?),
        ("csv", TallyKind::Scores) => ParsedTally::Scores(io_csv::read_csv_scores(path, cfs)?),
        (x, _) => whatever!("Provider not implemented {:?}", x),
    };
    Ok(tally)
}

fn read_divisor(cfg: &MethodConfig) -> AttribResult<DivisorFunction> {
    let divisor: DivisorFunction = match cfg.divisor.as_deref().unwrap_or("jefferson") {
        "jefferson" | "dhondt" => jefferson_divisor,
        "webster" | "sainte_lague" => webster_divisor,
        "huntington_hill" => huntington_hill_divisor,
        x => whatever!("Unknown divisor {:?}", x),
    };
    Ok(divisor)
}

fn read_metric(cfg: &MethodConfig) -> AttribResult<DisproportionMetric> {
    let metric: DisproportionMetric = match cfg.metric.as_deref().unwrap_or("mad") {
        "mad" => mean_absolute_deviation,
        "gallagher" | "least_squares" => least_squares_index,
        x => whatever!("Unknown disproportion metric {:?}", x),
    };
    Ok(metric)
}

// The nested contingency of a method, `None` for the "fail" keyword.
fn nested_contingency(cfg: &MethodConfig) -> AttribResult<Option<&MethodConfig>> {
    match &cfg.contingency {
        Some(ContingencyConfig::Method(inner)) => Ok(Some(inner.as_ref())),
        Some(ContingencyConfig::Keyword(k)) if k == "fail" => Ok(None),
        Some(ContingencyConfig::Keyword(k)) => {
            whatever!("Contingency {:?} is not supported by method {}", k, cfg.method)
        }
        None => Ok(None),
    }
}

fn check_no_threshold(cfg: &MethodConfig) -> AttribResult<()> {
    if cfg.threshold.is_some() {
        whatever!("Method {} does not support a threshold", cfg.method)
    }
    Ok(())
}

fn build_simple(cfg: &MethodConfig) -> AttribResult<DynAttribution<SimpleTally<String>>> {
    let base: DynAttribution<SimpleTally<String>> = match cfg.method.as_str() {
        "dhondt" | "jefferson" => Box::new(dhondt(cfg.n_seats()?)),
        "sainte_lague" | "webster" => Box::new(sainte_lague(cfg.n_seats()?)),
        "huntington_hill" => Box::new(huntington_hill(cfg.n_seats()?)),
        "divisor" => Box::new(divisor_method(cfg.n_seats()?, read_divisor(cfg)?)),
        "hare" | "hamilton" => Box::new(hare(cfg.n_seats()?)),
        "bounded" => {
            let max_seats = cfg.max_seats.context(MissingOptionSnafu {
                option: "maxSeats",
                method: cfg.method.clone(),
            })?;
            let method =
                bounded_divisor_method(cfg.min_seats.unwrap_or(0), max_seats, read_divisor(cfg)?)?
                    .with_metric(read_metric(cfg)?);
            debug!("Method bounded: seat range {:?}", method.seat_range());
            Box::new(method)
        }
        "plurality" => Box::new(plurality(cfg.n_seats()?)),
        "majority" => {
            let mut method = super_majority(cfg.n_seats()?, cfg.majority.unwrap_or(0.5))?;
            if let Some(inner) = nested_contingency(cfg)? {
                method = method.with_contingency(build_simple(inner)?)?;
            }
            Box::new(method)
        }
        "lottery" => {
            let mut method = lottery(cfg.n_seats()?);
            if let Some(seed) = cfg.random_seed()? {
                method = method.with_seed(seed);
            }
            debug!("Method lottery: seed {:?}", method.seed());
            Box::new(method)
        }
        x => {
            return UnknownMethodSnafu {
                method: x,
                kind: "simple",
            }
            .fail()
        }
    };

    let threshold = match cfg.threshold {
        Some(t) => t,
        None => {
            if cfg.contingency.is_some() && cfg.method != "majority" {
                warn!("Method {}: contingency ignored without a threshold", cfg.method);
            }
            return Ok(base);
        }
    };
    // The contingency of a majority belongs to the majority itself.
    let contingency = if cfg.method == "majority" {
        Contingency::Unthresholded
    } else {
        match &cfg.contingency {
            None => Contingency::Unthresholded,
            Some(ContingencyConfig::Keyword(k)) if k == "unthresholded" => Contingency::Unthresholded,
            Some(ContingencyConfig::Keyword(k)) if k == "fail" => Contingency::Fail,
            Some(ContingencyConfig::Keyword(k)) => whatever!("Unknown contingency {:?}", k),
            Some(ContingencyConfig::Method(inner)) => Contingency::Delegate(build_simple(inner)?),
        }
    };
    let method = Thresholded::<String, _>::new(base, threshold)?.with_contingency(contingency)?;
    debug!("Method {}: threshold {}", cfg.method, method.threshold());
    Ok(Box::new(method))
}

fn build_order(cfg: &MethodConfig) -> AttribResult<DynAttribution<OrderTally<String>>> {
    check_no_threshold(cfg)?;
    let method: DynAttribution<OrderTally<String>> = match cfg.method.as_str() {
        "irv" | "instant_runoff" => Box::new(instant_runoff(cfg.n_seats()?)),
        "borda" => Box::new(borda(cfg.n_seats()?)),
        "condorcet" => {
            let mut method = condorcet(cfg.n_seats()?);
            if let Some(inner) = nested_contingency(cfg)? {
                method = method.with_contingency(build_order(inner)?)?;
            }
            Box::new(method)
        }
        x => {
            return UnknownMethodSnafu {
                method: x,
                kind: "order",
            }
            .fail()
        }
    };
    Ok(method)
}

fn build_scores(cfg: &MethodConfig) -> AttribResult<DynAttribution<ScoresTally<String>>> {
    check_no_threshold(cfg)?;
    let method: DynAttribution<ScoresTally<String>> = match cfg.method.as_str() {
        "average_score" => Box::new(average_score(cfg.n_seats()?)),
        "median_score" => {
            let mut method = median_score(cfg.n_seats()?);
            match &cfg.contingency {
                Some(ContingencyConfig::Method(inner)) => {
                    method = method.with_contingency(build_scores(inner)?)?;
                }
                Some(ContingencyConfig::Keyword(k)) => {
                    whatever!("Method median_score needs a method as contingency, got {:?}", k)
                }
                None => {}
            }
            Box::new(method)
        }
        x => {
            return UnknownMethodSnafu {
                method: x,
                kind: "scores",
            }
            .fail()
        }
    };
    Ok(method)
}

fn attribute<T: Tally>(
    method: DynAttribution<T>,
    tally: &T,
) -> AttribResult<Result<Seats<T::Candidate>, AttributionFailure>> {
    match method.attrib(tally) {
        Ok(seats) => Ok(Ok(seats)),
        Err(AttributionError::Failure { source }) => {
            warn!("The attribution failed: {}", source);
            Ok(Err(source))
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs the configured method. Expected failures are part of the outcome.
fn run_attribution(
    cfg: &MethodConfig,
    tally: &ParsedTally,
) -> AttribResult<Result<Seats<String>, AttributionFailure>> {
    match tally {
        ParsedTally::Simple(t) => attribute(build_simple(cfg)?, t),
        ParsedTally::Order(t) => attribute(build_order(cfg)?, t),
        ParsedTally::Scores(t) => attribute(build_scores(cfg)?, t),
    }
}

fn result_to_json(method: &str, outcome: &Result<Seats<String>, AttributionFailure>) -> JSValue {
    match outcome {
        Ok(seats) => {
            let mut js_seats: JSMap<String, JSValue> = JSMap::new();
            for (name, count) in seats.iter() {
                js_seats.insert(name.clone(), json!(count));
            }
            let total: u32 = seats.values().sum();
            json!({"method": method, "seats": js_seats, "totalSeats": total})
        }
        Err(failure) => json!({"method": method, "failure": failure.to_string()}),
    }
}

fn build_summary_js(
    config: &AttribConfig,
    outcome: &Result<Seats<String>, AttributionFailure>,
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
    };
    json!({
        "config": c,
        "results": result_to_json(&config.attribution.method, outcome)
    })
}

fn write_summary(
    pretty_js_stats: &str,
    out: Option<String>,
    root_p: &Path,
    settings: &OutputSettings,
) -> AttribResult<()> {
    let out_path = match (out, &settings.output_directory) {
        (Some(p), _) if p == "stdout" => None,
        (Some(p), _) => Some(p),
        (None, Some(dir)) => {
            let file_name = format!("{}_summary.json", settings.contest_name.replace(' ', "_"));
            Some(root_p.join(dir).join(file_name).display().to_string())
        }
        (None, None) => None,
    };
    match out_path {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(&path, pretty_js_stats).context(WritingFileSnafu { path })
        }
        None => {
            println!("{}", pretty_js_stats);
            Ok(())
        }
    }
}

pub fn run_election(
    config_path: String,
    input: Option<String>,
    input_type: Option<String>,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> AttribResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let tally_path = match input {
        Some(p) => p,
        None => root_p
            .join(&config.tally_source.file_path)
            .display()
            .to_string(),
    };
    let provider = input_type.unwrap_or_else(|| config.tally_source.provider.clone());
    let tally = read_tally(&tally_path, &provider, &config.tally_source)?;
    debug!("tally: {:?}", tally);

    let outcome = run_attribution(&config.attribution, &tally)?;
    info!("outcome: {:?}", outcome);

    // Assemble the final json
    let result_js = build_summary_js(&config, &outcome);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(&pretty_js_stats, out, root_p, &config.output_settings)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }
    Ok(())
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    use snafu::ErrorCompat;

    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
    info!("Running test {}", test_name);
    let res = run_election(
        format!("{}/{}/{}", test_dir, test_name, config_lpath),
        None,
        None,
        Some("stdout".to_string()),
        Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
    );
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(js: JSValue) -> MethodConfig {
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn dhondt_basic() {
        test_wrapper("dhondt_basic");
    }

    #[test]
    fn hare_csv() {
        test_wrapper("hare_csv");
    }

    #[test]
    fn threshold_fail() {
        test_wrapper("threshold_fail");
    }

    #[test]
    fn bounded_gallagher() {
        test_wrapper("bounded_gallagher");
    }

    #[test]
    fn majority_contingency() {
        test_wrapper("majority_contingency");
    }

    #[test]
    fn irv_basic() {
        test_wrapper("irv_basic");
    }

    #[test]
    fn condorcet_fallback() {
        test_wrapper("condorcet_fallback");
    }

    #[test]
    fn median_score_csv() {
        test_wrapper("median_score_csv");
    }

    #[test]
    fn lottery_seeded() {
        let t: SimpleTally<String> = [("A".to_string(), 3), ("B".to_string(), 1)]
            .into_iter()
            .collect();
        let cfg = method(json!({"method": "lottery", "nSeats": 10, "randomSeed": "17"}));
        let first = run_attribution(&cfg, &ParsedTally::Simple(t.clone())).unwrap();
        let second = run_attribution(&cfg, &ParsedTally::Simple(t)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().values().sum::<u32>(), 10);
    }

    #[test]
    fn rejects_methods_for_other_tallies() {
        let t = ParsedTally::Order(OrderTally::new());
        let res = run_attribution(&method(json!({"method": "dhondt", "nSeats": 3})), &t);
        assert!(matches!(res, Err(AttribError::UnknownMethod { .. })));

        let t = ParsedTally::Simple(SimpleTally::new());
        let res = run_attribution(&method(json!({"method": "borda", "nSeats": 1})), &t);
        assert!(matches!(res, Err(AttribError::UnknownMethod { .. })));
    }

    #[test]
    fn rejects_inconsistent_contingency() {
        let t: SimpleTally<String> = [("A".to_string(), 3)].into_iter().collect();
        let cfg = method(json!({
            "method": "majority",
            "nSeats": 1,
            "contingency": {"method": "dhondt", "nSeats": 2}
        }));
        let res = run_attribution(&cfg, &ParsedTally::Simple(t));
        assert!(matches!(
            res,
            Err(AttribError::Attribution {
                source: AttributionError::InvalidConfig { .. }
            })
        ));
    }

    #[test]
    fn threshold_only_for_simple_tallies() {
        let cfg = method(json!({"method": "borda", "nSeats": 1, "threshold": 0.1}));
        assert!(build_order(&cfg).is_err());
    }
}
