use clap::Parser;
use ticksim::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
