//! # envcompose CLI
//!
//! This is the binary entry point for the `envcompose` command-line tool.
//!
//! It parses the command line with `clap` and hands the parsed arguments to
//! the selected command. All composition logic lives in the library crate;
//! the binary only loads a workspace file, calls into the library and prints
//! reports.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
