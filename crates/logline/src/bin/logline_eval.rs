//! `logline-eval` - evaluate a binding expression.
//!
//! Usage:
//!   logline-eval [--strict] [--config <file>] '<expression>'
//!
//! The JSON context is read from stdin; empty input means `{}`. Without
//! `--strict` an invalid expression prints `false`.

use logline::cli::{init_tracing, run_eval, take_config};
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
    let strict = match args.iter().position(|a| a == "--strict") {
        Some(idx) => {
            args.remove(idx);
            true
        }
        None => false,
    };
    let Some(expression) = args.first() else {
        eprintln!("First argument must be an expression.");
        std::process::exit(2);
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match run_eval(expression, &buf, strict, &config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
