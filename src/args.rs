use clap::Parser;

/// This is a ranked choice voting tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON contest configuration: candidates,
    /// tabulation rules and the cast vote record sources. See the manual for
    /// the accepted fields.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, rcvtab
    /// checks that the tabulated output matches the reference and fails on
    /// differences.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the
    /// contest is written in JSON format to the given location. This
    /// overrides the output directory of the configuration file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A ballot file to tabulate with default rules, without a
    /// configuration file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The provider format of the --input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
