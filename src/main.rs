use clap::Parser;
use ichitrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
