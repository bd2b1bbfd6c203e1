//! The executable of the C++ expression evaluator.

use std::process::ExitCode;

use clap::Parser;
use cxxeval_driver::Arguments;

fn main() -> ExitCode {
    env_logger::init();

    cxxeval_driver::run(Arguments::parse())
}
