use clap::Parser;
use snafu::ErrorCompat;

mod args;
mod rcv;

fn main() {
    let parsed = args::Args::parse();
    if parsed.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    let res = rcv::run_election(
        parsed.config,
        parsed.reference,
        parsed.input,
        parsed.input_type,
        parsed.out,
        false,
    );
    if let Err(e) = res {
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
