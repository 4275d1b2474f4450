// SPDX-License-Identifier: Apache-2.0

//! `parse` subcommand: drives the statistics parser in lazy mode over a
//! stream of concatenated JSON values, printing a summary after each one.

use std::io::{self, Read};
use std::process::ExitCode;

use demos::stats::StatsStorage;
use pushjson::{ErrorKind, Parser, Status, TokenType, Tokenizer};

use crate::tokenize::report;

const CHUNK_SIZE: usize = 128;

fn datatype_name(token_type: TokenType) -> &'static str {
    match token_type {
        TokenType::Null => "null",
        TokenType::False => "false",
        TokenType::True => "true",
        TokenType::Number => "number",
        TokenType::String => "string",
        TokenType::CloseBracket => "array",
        TokenType::CloseBrace => "object",
        _ => "<unexpected>",
    }
}

fn print_stats(stats: &StatsStorage) {
    println!("General JSON Info:");
    println!("------------------");
    println!("Top-level type:             {}", datatype_name(stats.toplevel_type));
    println!("Max. depth:                 {}", stats.max_depth + 1);
    if matches!(stats.toplevel_type, TokenType::CloseBracket | TokenType::CloseBrace) {
        println!("Max. array item count:      {}", stats.max_array_item_count);
        println!("Max. object property count: {}", stats.max_object_property_count);
        println!();
        println!("Number of Data Types:");
        println!("---------------------");
        println!("Number of objects:  {}", stats.count_of(TokenType::CloseBrace));
        println!("Number of arrays:   {}", stats.count_of(TokenType::CloseBracket));
        println!("Number of strings:  {}", stats.count_of(TokenType::String));
        println!("Number of numbers:  {}", stats.count_of(TokenType::Number));
        println!(
            "Number of booleans: {}",
            stats.count_of(TokenType::False) + stats.count_of(TokenType::True)
        );
        println!("Number of null:     {}", stats.count_of(TokenType::Null));
        println!("Number of keys:     {}", stats.key_count);
        println!("Number of true:     {}", stats.count_of(TokenType::True));
        println!("Number of false:    {}", stats.count_of(TokenType::False));
    }
}

pub fn run() -> ExitCode {
    let mut tokenizer = Tokenizer::new();
    let mut parser = match Parser::new(StatsStorage::new(), true) {
        Ok(parser) => parser,
        Err(err) => {
            report(&err);
            return ExitCode::FAILURE;
        }
    };
    parser.storage.install();

    let mut stdin = io::stdin().lock();
    let mut buf = [0u8; CHUNK_SIZE];
    let mut value_found = false;

    loop {
        let num_read = match stdin.read(&mut buf) {
            Ok(n) => n,
            Err(err) => {
                eprintln!("Read error: {err}.");
                return ExitCode::FAILURE;
            }
        };
        if num_read == 0 {
            return match tokenizer.close(&mut parser) {
                Ok(_) => ExitCode::SUCCESS,
                // a stream of values ends with nothing left over
                Err(err) if err.kind == ErrorKind::NoTokensFound && value_found => {
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    report(&err);
                    ExitCode::FAILURE
                }
            };
        }

        let mut chunk = &buf[..num_read];
        loop {
            match tokenizer.feed(chunk, &mut parser) {
                Ok(Status::DataNeeded) => break,
                Ok(Status::Completed) => {
                    value_found = true;
                    log::debug!("value completed at offset {}", tokenizer.index());
                    print_stats(&parser.storage);
                    println!();

                    // re-prime for the next value in the stream
                    parser.storage.clear();
                    if let Err(err) = parser.reset(true) {
                        report(&err);
                        return ExitCode::FAILURE;
                    }
                    parser.storage.install();

                    // consume whatever of the current chunk remains
                    let rest = tokenizer.resume_offset();
                    if rest < chunk.len() {
                        chunk = &chunk[rest..];
                    } else {
                        break;
                    }
                }
                Err(err) => {
                    report(&err);
                    return ExitCode::FAILURE;
                }
            }
        }
    }
}
