//! devbar CLI entry point
//!
//! Delegates everything to the CLI module. Errors have already been
//! written as a JSON line; the process only needs a non-zero exit.

use devbar::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
