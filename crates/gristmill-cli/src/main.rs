//! Command-line front end for the gristmill product service.

use std::process;

mod cli;
mod logging;

fn main() {
    let exit_code = cli::run();
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
