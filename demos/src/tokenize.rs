// SPDX-License-Identifier: Apache-2.0

//! `tokenize` subcommand: one comment line per token, with the decoded
//! value for strings that contain escapes.

use std::io::{self, Read};
use std::process::ExitCode;

use pushjson::{value, Error, ErrorKind, Status, Token, TokenSink, TokenType, Tokenizer};

const CHUNK_SIZE: usize = 128;

fn token_type_name(token_type: TokenType) -> &'static str {
    match token_type {
        TokenType::Error => "error",
        TokenType::None => "<n/a>",
        TokenType::Null => "null",
        TokenType::False => "false",
        TokenType::True => "true",
        TokenType::Number => "number",
        TokenType::String => "string",
        TokenType::OpenBracket => "open_bracket",
        TokenType::OpenBrace => "open_brace",
        TokenType::CloseBracket => "close_bracket",
        TokenType::CloseBrace => "close_brace",
        TokenType::Colon => "colon",
        TokenType::Comma => "comma",
        TokenType::Eos => "eos",
    }
}

struct PrintSink {
    seen_token: bool,
}

impl TokenSink for PrintSink {
    fn eat(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        if token.token_type == TokenType::Eos {
            return if self.seen_token {
                Ok(Status::Completed)
            } else {
                Err(Error::new(ErrorKind::NoTokensFound, token.start_index))
            };
        }
        self.seen_token = true;

        print!(
            "/* type: {} | start_index: {} | length: {} | value: {}",
            token_type_name(token.token_type),
            token.start_index,
            token.bytes.len(),
            String::from_utf8_lossy(token.bytes)
        );

        // show the decoded form when escapes make it differ from the raw one
        let quotes = if token.token_type == TokenType::String { 2 } else { 0 };
        if token.unescaped_length != token.bytes.len() - quotes {
            let mut buf = vec![0u8; token.unescaped_length];
            let Some(written) = value::parse_string(&mut buf, token.bytes, true) else {
                return Err(Error::new(ErrorKind::User(1), token.start_index));
            };
            print!(
                " | unescaped_length: {} | unescaped value: {}",
                written,
                String::from_utf8_lossy(&buf[..written])
            );
        }

        println!(" */");
        Ok(Status::DataNeeded)
    }
}

pub fn run() -> ExitCode {
    let mut tokenizer = Tokenizer::new();
    let mut sink = PrintSink { seen_token: false };
    let mut stdin = io::stdin().lock();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let num_read = match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                let _ = tokenizer.close(&mut sink);
                eprintln!("Read error: {err}.");
                return ExitCode::FAILURE;
            }
        };
        if tokenizer.feed(&buf[..num_read], &mut sink) != Ok(Status::DataNeeded) {
            break;
        }
    }

    match tokenizer.close(&mut sink) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

pub fn report(err: &Error) {
    match err.kind {
        ErrorKind::NoTokensFound => eprintln!("No tokens found."),
        ErrorKind::Syntax => eprintln!("Syntax error at position {}.", err.index),
        ErrorKind::Utf8 => eprintln!("UTF-8 encoding error at position {}.", err.index),
        ErrorKind::MaxDepthExceeded => {
            eprintln!("Maximum depth exceeded at position {}.", err.index)
        }
        _ => eprintln!("Unexpected error: {err}."),
    }
}
