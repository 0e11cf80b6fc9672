//! `logline-parse` - print a LogLine document as JSON.
//!
//! Usage:
//!   logline-parse [--config <file>]
//!
//! The LogLine source is read from stdin.

use logline::cli::{init_tracing, run_parse, take_config};
use std::io::{self, Read};

fn main() {
    init_tracing();
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config = match take_config(&mut args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match run_parse(&buf, &config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
