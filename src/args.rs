use clap::Parser;

/// This is a seat attribution program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The configuration of the attribution in JSON format: the method, its options and the
    /// location of the tally. See the manual of the seat_attribution crate for the format.
    #[clap(short, long, value_parser)]
    pub config: String,
    /// (file path) A reference file containing the outcome of an attribution in JSON format. If provided, seatattr will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the attribution will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the tally is read from this file instead of the file given in the
    /// configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json or csv) The format of the input. Overrides the provider given in the configuration.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
