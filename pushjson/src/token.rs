// SPDX-License-Identifier: Apache-2.0

//! Token model and the sink protocol connecting the tokenizer to a consumer.

use core::fmt;

/// Kind of a lexical JSON token.
///
/// Discriminants are load-bearing: the keyword table and per-type statistics
/// index parallel arrays by `token_type as usize - TokenType::Null as usize`,
/// so the ordering of `Null..=String` and of `CloseBracket`/`CloseBrace`
/// must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum TokenType {
    /// Tokenization failed; the latched [`Error`] has the details.
    Error = -1,
    /// No token (initial state, or between top-level values).
    None = 0,
    /// The `null` keyword.
    Null = 1,
    /// The `false` keyword.
    False = 2,
    /// The `true` keyword.
    True = 3,
    /// A number literal.
    Number = 4,
    /// A string literal, quotes included.
    String = 5,
    /// `[`
    OpenBracket = 6,
    /// `{`
    OpenBrace = 7,
    /// `]`
    CloseBracket = 8,
    /// `}`
    CloseBrace = 9,
    /// `:`
    Colon = 10,
    /// `,`
    Comma = 11,
    /// Synthetic end-of-stream marker emitted by [`Tokenizer::close`].
    ///
    /// [`Tokenizer::close`]: crate::Tokenizer::close
    Eos = 12,
}

/// A lexically complete JSON token.
///
/// The token is borrowed for the duration of one [`TokenSink::eat`] call:
/// `bytes` points either into the caller's input chunk or into the
/// tokenizer's spill buffer, and cannot be stored past the call. Copy the
/// bytes out if they must outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    /// Byte offset of the token from the start of the logical stream,
    /// accumulated across all feed calls.
    pub start_index: usize,
    /// The raw token bytes, surrounding quotes included for strings.
    pub bytes: &'a [u8],
    /// For string tokens, the byte length of the decoded UTF-8 value
    /// (quotes excluded); equal to `bytes.len()` for every other token.
    pub unescaped_length: usize,
}

/// Successful outcome of a feed step or a sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More input may follow.
    DataNeeded,
    /// A complete top-level value (or the end of the stream) was recognized.
    Completed,
}

/// Classification of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream ended before any token was seen.
    NoTokensFound,
    /// The context stack refused another frame.
    MaxDepthExceeded,
    /// The sink answered the end-of-stream token with [`Status::DataNeeded`].
    NoncompliantSink,
    /// Growing the spill buffer failed.
    OutOfMemory,
    /// A string token contains invalid UTF-8.
    Utf8,
    /// The input violates the JSON grammar.
    Syntax,
    /// Application-defined failure raised by a callback.
    User(i32),
}

/// A parse failure and the stream offset it is attributed to.
///
/// For failures reported by a sink, `index` is rewritten to the offending
/// token's start before the error is latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub index: usize,
}

impl Error {
    pub fn new(kind: ErrorKind, index: usize) -> Self {
        Error { kind, index }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::NoTokensFound => write!(f, "no tokens found (offset {})", self.index),
            ErrorKind::MaxDepthExceeded => {
                write!(f, "maximum nesting depth exceeded at offset {}", self.index)
            }
            ErrorKind::NoncompliantSink => {
                write!(f, "sink did not complete at end of stream (offset {})", self.index)
            }
            ErrorKind::OutOfMemory => {
                write!(f, "out of memory buffering a token at offset {}", self.index)
            }
            ErrorKind::Utf8 => write!(f, "invalid UTF-8 sequence at offset {}", self.index),
            ErrorKind::Syntax => write!(f, "syntax error at offset {}", self.index),
            ErrorKind::User(code) => {
                write!(f, "application error {} at offset {}", code, self.index)
            }
        }
    }
}

impl core::error::Error for Error {}

/// Downstream consumer of the token stream.
pub trait TokenSink {
    /// Consume one token.
    ///
    /// Return [`Status::DataNeeded`] to keep tokenizing, or
    /// [`Status::Completed`] to stop the current feed normally (the
    /// tokenizer then records where the next value may start). Errors abort
    /// the parse; the tokenizer latches them and replays the same error on
    /// every later call.
    fn eat(&mut self, token: &Token<'_>) -> Result<Status, Error>;
}

/// Sink that ignores every token.
///
/// Useful for validating input without observing it. Entirely empty input is
/// still reported: if the first token is already end-of-stream, `eat`
/// returns [`ErrorKind::NoTokensFound`].
#[derive(Debug, Default)]
pub struct NullSink {
    seen_token: bool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenSink for NullSink {
    fn eat(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        if token.token_type == TokenType::Eos {
            if self.seen_token {
                Ok(Status::Completed)
            } else {
                Err(Error::new(ErrorKind::NoTokensFound, token.start_index))
            }
        } else {
            self.seen_token = true;
            Ok(Status::DataNeeded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_keyword_offsets() {
        assert_eq!(TokenType::Null as usize - TokenType::Null as usize, 0);
        assert_eq!(TokenType::False as usize - TokenType::Null as usize, 1);
        assert_eq!(TokenType::True as usize - TokenType::Null as usize, 2);
        assert_eq!(TokenType::CloseBrace as usize, TokenType::CloseBracket as usize + 1);
    }

    #[test]
    fn test_null_sink_empty_stream() {
        let mut sink = NullSink::new();
        let eos = Token {
            token_type: TokenType::Eos,
            start_index: 0,
            bytes: &[],
            unescaped_length: 0,
        };
        assert_eq!(sink.eat(&eos), Err(Error::new(ErrorKind::NoTokensFound, 0)));
    }

    #[test]
    fn test_null_sink_completes_after_tokens() {
        let mut sink = NullSink::new();
        let token = Token {
            token_type: TokenType::Null,
            start_index: 0,
            bytes: b"null",
            unescaped_length: 4,
        };
        assert_eq!(sink.eat(&token), Ok(Status::DataNeeded));
        let eos = Token {
            token_type: TokenType::Eos,
            start_index: 4,
            bytes: &[],
            unescaped_length: 0,
        };
        assert_eq!(sink.eat(&eos), Ok(Status::Completed));
    }

    #[test]
    fn test_error_display_carries_position() {
        let err = Error::new(ErrorKind::Syntax, 17);
        assert_eq!(std::format!("{}", err), "syntax error at offset 17");
    }
}
