// SPDX-License-Identifier: Apache-2.0

//! Demo CLI: reads JSON from standard input in small chunks and either
//! collects stream statistics (`parse`) or prints every token
//! (`tokenize`).

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod parse;
mod tokenize;

#[derive(Parser)]
#[command(
    name = "pushjson-demo",
    about = "Demonstrates the pushjson library on JSON read from standard input."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect statistics on a stream of JSON values while parsing it.
    Parse,
    /// Print one comment per token found in the stream.
    Tokenize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Parse) {
        Command::Parse => parse::run(),
        Command::Tokenize => tokenize::run(),
    }
}
