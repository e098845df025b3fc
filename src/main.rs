#![deny(unsafe_code)]

//! lcdctl — LCD control panel CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = match cli_app::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version arrive as errors that belong on stdout.
            std::process::exit(i32::from(e.use_stderr()));
        }
    };
    if let Err(e) = cli_app::run(&args) {
        eprintln!("lcdctl: {e}");
        std::process::exit(e.exit_code());
    }
}
