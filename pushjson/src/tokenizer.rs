// SPDX-License-Identifier: Apache-2.0

//! Byte-level JSON lexer that can be suspended at any chunk boundary.
//!
//! The tokenizer consumes input through [`Tokenizer::feed`] one byte at a
//! time and hands finished tokens to a [`TokenSink`]. A token interrupted by
//! the end of a chunk is copied into an internal spill buffer, so when it
//! finally completes the sink always sees one contiguous byte span — the
//! caller never has to buffer input itself.

use alloc::vec::Vec;

use log::trace;

use crate::token::{Error, ErrorKind, Status, Token, TokenSink, TokenType};
use crate::unicode::{
    hex_digit_value, is_high_surrogate, is_low_surrogate, combine_surrogates, utf8_size,
    validate_utf8_sequence, REPLACEMENT_LEN,
};

/// Spill buffer capacity reserved up front by [`Tokenizer::new`].
pub const DEFAULT_SPILL_CAPACITY: usize = 256;

// Keyword spellings, indexed by `token_type as usize - TokenType::Null as usize`.
const KEYWORD_LOOKUP: [&[u8]; 3] = [b"null", b"false", b"true"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BetweenTokens,
    Keyword,
    Str(Str),
    Number(Num),
    Eos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Str {
    Plain,
    Escape,
    /// Inside `\uXXXX`; `digits` hex digits accumulated into `acc` so far.
    Unicode { digits: u8, acc: u16 },
    /// A high surrogate is pending; the next byte decides whether a low
    /// surrogate escape follows.
    MaybeLowSurrogate,
    /// A high surrogate is pending and a `\` was seen; only `u` continues
    /// the pair.
    MaybeLowSurrogateEscape,
    /// Inside a multi-byte UTF-8 sequence of `total` bytes, `len` collected.
    Utf8Tail { seq: [u8; 4], len: u8, total: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Num {
    /// After `-`: a digit is mandatory.
    ExpectInt,
    /// In the integer digits.
    Int,
    /// After a leading `0`: only `.`, an exponent or a terminator may follow.
    MaybeFracOrExp,
    /// After `.`: a digit is mandatory.
    ExpectFrac,
    /// In the fraction digits.
    Frac,
    /// After `e`/`E`: sign or digit.
    ExpectExp,
    /// After the exponent sign: a digit is mandatory.
    ExpectExpDigits,
    /// In the exponent digits.
    ExpDigits,
}

/// Where the in-progress token's bytes start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    None,
    /// Offset into the chunk currently being fed.
    Chunk(usize),
    /// The token straddles a chunk boundary and lives in the spill buffer.
    Spill,
}

/// Incremental JSON tokenizer.
///
/// All state needed to resume mid-token survives between [`feed`] calls in
/// the workspace below; the input chunk is only borrowed for the duration of
/// a call.
///
/// [`feed`]: Tokenizer::feed
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    failed: Option<Error>,
    /// Logical offset of the next byte to consume.
    index: usize,
    token_type: TokenType,
    token_start_index: usize,
    /// Running decoded length of the current string token.
    unescaped_length: usize,
    /// Pending high surrogate from a `\uXXXX` escape, 0 when none.
    pending_high: u16,
    anchor: Anchor,
    spill: Vec<u8>,
    /// Offset into the last fed chunk where the next value may start; valid
    /// after `feed` returned [`Status::Completed`].
    resume_offset: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_spill_capacity(DEFAULT_SPILL_CAPACITY)
    }

    /// Create a tokenizer whose spill buffer starts out with the given
    /// capacity. Tokens longer than this still work; the buffer grows.
    pub fn with_spill_capacity(capacity: usize) -> Self {
        Tokenizer {
            state: State::BetweenTokens,
            failed: None,
            index: 0,
            token_type: TokenType::None,
            token_start_index: usize::MAX,
            unescaped_length: 0,
            pending_high: 0,
            anchor: Anchor::None,
            spill: Vec::with_capacity(capacity),
            resume_offset: 0,
        }
    }

    /// Logical byte offset of the next byte to consume, accumulated across
    /// all feeds.
    pub fn index(&self) -> usize {
        self.index
    }

    /// After [`feed`] returned [`Status::Completed`]: the offset within that
    /// chunk of the first byte of any remaining content. Equals the chunk
    /// length when the value ended exactly at the chunk boundary.
    ///
    /// [`feed`]: Tokenizer::feed
    pub fn resume_offset(&self) -> usize {
        self.resume_offset
    }

    /// Restore the initial state for a fresh parse. Spill capacity is kept.
    pub fn reset(&mut self) {
        self.state = State::BetweenTokens;
        self.failed = None;
        self.index = 0;
        self.token_type = TokenType::None;
        self.token_start_index = usize::MAX;
        self.unescaped_length = 0;
        self.pending_high = 0;
        self.anchor = Anchor::None;
        self.spill.clear();
        self.resume_offset = 0;
    }

    /// Consume up to `chunk.len()` bytes, handing finished tokens to `sink`.
    ///
    /// Returns `Ok(Status::DataNeeded)` when the chunk was consumed and more
    /// input may follow, or `Ok(Status::Completed)` when the sink signaled
    /// the end of a value; [`resume_offset`] then tells where parsing
    /// stopped, which allows streaming multiple concatenated JSON values.
    /// Errors are latched: every further `feed` or [`close`] returns the
    /// same error until [`reset`].
    ///
    /// [`resume_offset`]: Tokenizer::resume_offset
    /// [`close`]: Tokenizer::close
    /// [`reset`]: Tokenizer::reset
    pub fn feed<S: TokenSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
    ) -> Result<Status, Error> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        trace!("feed: {} bytes at offset {}", chunk.len(), self.index);

        let mut pos = 0;
        'bytes: while pos < chunk.len() {
            let ch = chunk[pos];
            match self.state {
                State::BetweenTokens => match ch {
                    b' ' | b'\t' | b'\r' | b'\n' => {}
                    b'"' => {
                        self.start_token(TokenType::String, pos);
                        self.unescaped_length = 0;
                        self.pending_high = 0;
                        self.state = State::Str(Str::Plain);
                    }
                    b'-' => {
                        self.start_token(TokenType::Number, pos);
                        self.state = State::Number(Num::ExpectInt);
                    }
                    b'0' => {
                        self.start_token(TokenType::Number, pos);
                        self.state = State::Number(Num::MaybeFracOrExp);
                    }
                    b'1'..=b'9' => {
                        self.start_token(TokenType::Number, pos);
                        self.state = State::Number(Num::Int);
                    }
                    b'n' => {
                        self.start_token(TokenType::Null, pos);
                        self.state = State::Keyword;
                    }
                    b'f' => {
                        self.start_token(TokenType::False, pos);
                        self.state = State::Keyword;
                    }
                    b't' => {
                        self.start_token(TokenType::True, pos);
                        self.state = State::Keyword;
                    }
                    _ => {
                        let Some(token_type) = punctuator_type(ch) else {
                            return Err(self.fail(ErrorKind::Syntax, self.index));
                        };
                        if self.emit_punctuator(token_type, chunk, pos, sink)? == Status::Completed
                        {
                            self.index += 1;
                            return Ok(self.complete(pos + 1));
                        }
                    }
                },

                State::Keyword => {
                    let keyword =
                        KEYWORD_LOOKUP[self.token_type as usize - TokenType::Null as usize];
                    let progress = self.index - self.token_start_index;
                    match keyword.get(progress) {
                        Some(&expected) if ch == expected => {}
                        Some(_) => {
                            return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                        }
                        None => {
                            // Keyword fully matched; this byte must terminate it.
                            if let Some(status) = self.end_scalar(ch, chunk, pos, sink)? {
                                return Ok(status);
                            }
                        }
                    }
                }

                State::Str(Str::Plain) => {
                    if ch & 0x80 == 0 {
                        match ch {
                            b'"' => {
                                match self.finish_token(chunk, pos + 1, sink)? {
                                    Status::Completed => {
                                        self.index += 1;
                                        return Ok(self.complete(pos + 1));
                                    }
                                    Status::DataNeeded => self.state = State::BetweenTokens,
                                }
                            }
                            b'\\' => self.state = State::Str(Str::Escape),
                            0x20.. => self.unescaped_length += 1,
                            _ => {
                                // unescaped control character
                                return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                            }
                        }
                    } else {
                        let total: u8 = match ch {
                            0xC0..=0xDF => 2,
                            0xE0..=0xEF => 3,
                            0xF0..=0xF7 => 4,
                            _ => return Err(self.fail(ErrorKind::Utf8, self.index)),
                        };
                        let mut seq = [0u8; 4];
                        seq[0] = ch;
                        self.state = State::Str(Str::Utf8Tail { seq, len: 1, total });
                    }
                }

                State::Str(Str::Escape) => match ch {
                    b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                        self.unescaped_length += 1;
                        self.state = State::Str(Str::Plain);
                    }
                    b'u' => self.state = State::Str(Str::Unicode { digits: 0, acc: 0 }),
                    _ => return Err(self.fail(ErrorKind::Syntax, self.token_start_index)),
                },

                State::Str(Str::Unicode { digits, acc }) => {
                    let Some(value) = hex_digit_value(ch) else {
                        return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                    };
                    let acc = acc << 4 | value as u16;
                    if digits < 3 {
                        self.state = State::Str(Str::Unicode { digits: digits + 1, acc });
                    } else {
                        self.finish_unicode_escape(acc);
                    }
                }

                State::Str(Str::MaybeLowSurrogate) => {
                    if ch == b'\\' {
                        self.state = State::Str(Str::MaybeLowSurrogateEscape);
                    } else {
                        // The high surrogate stays lone; reprocess this byte
                        // as an ordinary string character.
                        self.unescaped_length += REPLACEMENT_LEN;
                        self.pending_high = 0;
                        self.state = State::Str(Str::Plain);
                        continue 'bytes;
                    }
                }

                State::Str(Str::MaybeLowSurrogateEscape) => {
                    if ch == b'u' {
                        self.state = State::Str(Str::Unicode { digits: 0, acc: 0 });
                    } else {
                        self.unescaped_length += REPLACEMENT_LEN;
                        self.pending_high = 0;
                        self.state = State::Str(Str::Escape);
                        continue 'bytes;
                    }
                }

                State::Str(Str::Utf8Tail { mut seq, len, total }) => {
                    seq[len as usize] = ch;
                    let len = len + 1;
                    if len < total {
                        self.state = State::Str(Str::Utf8Tail { seq, len, total });
                    } else {
                        match validate_utf8_sequence(&seq[..total as usize]) {
                            Some(size) => {
                                self.unescaped_length += size;
                                self.state = State::Str(Str::Plain);
                            }
                            None => {
                                // report at the first byte of the sequence
                                let start = self.index - (total as usize - 1);
                                return Err(self.fail(ErrorKind::Utf8, start));
                            }
                        }
                    }
                }

                State::Number(num) => match (num, ch) {
                    (Num::ExpectInt, b'0') => self.state = State::Number(Num::MaybeFracOrExp),
                    (Num::ExpectInt, b'1'..=b'9') => self.state = State::Number(Num::Int),
                    (Num::Int, b'0'..=b'9') => {}
                    (Num::Int | Num::MaybeFracOrExp, b'.') => {
                        self.state = State::Number(Num::ExpectFrac)
                    }
                    (Num::Int | Num::MaybeFracOrExp, b'e' | b'E') => {
                        self.state = State::Number(Num::ExpectExp)
                    }
                    (Num::ExpectFrac, b'0'..=b'9') => self.state = State::Number(Num::Frac),
                    (Num::Frac, b'0'..=b'9') => {}
                    (Num::Frac, b'e' | b'E') => self.state = State::Number(Num::ExpectExp),
                    (Num::ExpectExp, b'+' | b'-') => {
                        self.state = State::Number(Num::ExpectExpDigits)
                    }
                    (Num::ExpectExp | Num::ExpectExpDigits, b'0'..=b'9') => {
                        self.state = State::Number(Num::ExpDigits)
                    }
                    (Num::ExpDigits, b'0'..=b'9') => {}
                    (Num::Int | Num::MaybeFracOrExp | Num::Frac | Num::ExpDigits, _) => {
                        if let Some(status) = self.end_scalar(ch, chunk, pos, sink)? {
                            return Ok(status);
                        }
                    }
                    (
                        Num::ExpectInt | Num::ExpectFrac | Num::ExpectExp | Num::ExpectExpDigits,
                        _,
                    ) => {
                        return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                    }
                },

                State::Eos => return Err(self.fail(ErrorKind::Syntax, self.index)),
            }

            pos += 1;
            self.index += 1;
        }

        // Chunk consumed.
        match self.state {
            State::BetweenTokens | State::Eos => {
                self.token_type = TokenType::None;
                self.token_start_index = self.index;
                self.anchor = Anchor::None;
            }
            _ => {
                // The token is incomplete; everything received so far must
                // survive until the next feed.
                let pending = match self.anchor {
                    Anchor::Chunk(start) => &chunk[start..],
                    Anchor::Spill | Anchor::None => chunk,
                };
                if let Err(kind) = spill_bytes(&mut self.spill, pending) {
                    return Err(self.fail(kind, self.index));
                }
                self.anchor = Anchor::Spill;
            }
        }
        Ok(Status::DataNeeded)
    }

    /// Signal the end of input: flush a pending number or keyword token,
    /// emit the synthetic end-of-stream token and release the spill buffer.
    ///
    /// In a failed state this replays the stored error; after a successful
    /// close it keeps returning `Ok(Status::Completed)`.
    pub fn close<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> Result<Status, Error> {
        let result = self.close_inner(sink);
        self.spill = Vec::new();
        result
    }

    fn close_inner<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> Result<Status, Error> {
        if let Some(err) = self.failed {
            return Err(err);
        }
        trace!("close at offset {}", self.index);

        match self.state {
            State::BetweenTokens => {}
            State::Eos => return Ok(Status::Completed),
            State::Keyword => {
                let keyword = KEYWORD_LOOKUP[self.token_type as usize - TokenType::Null as usize];
                if self.index - self.token_start_index != keyword.len() {
                    return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                }
                self.finish_token(&[], 0, sink)?;
            }
            State::Number(Num::Int | Num::MaybeFracOrExp | Num::Frac | Num::ExpDigits) => {
                self.finish_token(&[], 0, sink)?;
            }
            State::Str(Str::Utf8Tail { len, .. }) => {
                let start = self.index - len as usize;
                return Err(self.fail(ErrorKind::Utf8, start));
            }
            State::Str(_) | State::Number(_) => {
                return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
            }
        }

        let eos = Token {
            token_type: TokenType::Eos,
            start_index: self.index,
            bytes: &[],
            unescaped_length: 0,
        };
        match sink.eat(&eos) {
            Ok(Status::Completed) => {
                self.token_type = TokenType::Eos;
                self.token_start_index = self.index;
                self.anchor = Anchor::None;
                self.state = State::Eos;
                Ok(Status::Completed)
            }
            Ok(Status::DataNeeded) => Err(self.fail(ErrorKind::NoncompliantSink, self.index)),
            Err(err) => Err(self.fail(err.kind, self.index)),
        }
    }

    fn start_token(&mut self, token_type: TokenType, pos: usize) {
        self.token_type = token_type;
        self.token_start_index = self.index;
        self.anchor = Anchor::Chunk(pos);
    }

    /// Latch an error so later calls replay it.
    fn fail(&mut self, kind: ErrorKind, index: usize) -> Error {
        let err = Error::new(kind, index);
        trace!("failed: {:?}", err);
        self.token_type = TokenType::Error;
        self.token_start_index = index;
        self.anchor = Anchor::None;
        self.failed = Some(err);
        err
    }

    /// Deliver the current token, whose bytes end at `chunk[..end]`, as one
    /// contiguous span.
    fn finish_token<S: TokenSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        end: usize,
        sink: &mut S,
    ) -> Result<Status, Error> {
        if self.anchor == Anchor::Spill && end > 0 {
            // The token began in an earlier chunk; pull in its trailing
            // bytes from the current one.
            if let Err(kind) = spill_bytes(&mut self.spill, &chunk[..end]) {
                return Err(self.fail(kind, self.index));
            }
        }
        let bytes: &[u8] = match self.anchor {
            Anchor::Spill => &self.spill,
            Anchor::Chunk(start) => &chunk[start..end],
            Anchor::None => &[],
        };
        let unescaped_length = if self.token_type == TokenType::String {
            self.unescaped_length
        } else {
            bytes.len()
        };
        debug_assert!(unescaped_length <= bytes.len());
        let token = Token {
            token_type: self.token_type,
            start_index: self.token_start_index,
            bytes,
            unescaped_length,
        };
        let result = sink.eat(&token);
        self.spill.clear();
        match result {
            Ok(status) => Ok(status),
            Err(err) => Err(self.fail(err.kind, self.token_start_index)),
        }
    }

    fn emit_punctuator<S: TokenSink + ?Sized>(
        &mut self,
        token_type: TokenType,
        chunk: &[u8],
        pos: usize,
        sink: &mut S,
    ) -> Result<Status, Error> {
        // Punctuators are single bytes; the straddling-token machinery is
        // never involved.
        let token = Token {
            token_type,
            start_index: self.index,
            bytes: &chunk[pos..pos + 1],
            unescaped_length: 1,
        };
        match sink.eat(&token) {
            Ok(status) => Ok(status),
            Err(err) => Err(self.fail(err.kind, self.index)),
        }
    }

    /// Handle the lookahead byte that terminates a keyword or number token:
    /// whitespace or a punctuator finishes the token, anything else is a
    /// syntax error. Returns `Some` when feeding must stop.
    fn end_scalar<S: TokenSink + ?Sized>(
        &mut self,
        ch: u8,
        chunk: &[u8],
        pos: usize,
        sink: &mut S,
    ) -> Result<Option<Status>, Error> {
        match ch {
            b' ' | b'\t' | b'\r' | b'\n' => match self.finish_token(chunk, pos, sink)? {
                Status::Completed => Ok(Some(self.complete(pos))),
                Status::DataNeeded => {
                    self.state = State::BetweenTokens;
                    Ok(None)
                }
            },
            _ => {
                let Some(token_type) = punctuator_type(ch) else {
                    return Err(self.fail(ErrorKind::Syntax, self.token_start_index));
                };
                if self.finish_token(chunk, pos, sink)? == Status::Completed {
                    return Ok(Some(self.complete(pos)));
                }
                match self.emit_punctuator(token_type, chunk, pos, sink)? {
                    Status::Completed => {
                        self.index += 1;
                        Ok(Some(self.complete(pos + 1)))
                    }
                    Status::DataNeeded => {
                        self.state = State::BetweenTokens;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Fourth hex digit of a `\uXXXX` escape: account for the decoded code
    /// unit, tracking surrogate pairs across escapes.
    fn finish_unicode_escape(&mut self, unit: u16) {
        if is_high_surrogate(unit) {
            if self.pending_high != 0 {
                // two consecutive high surrogates: the earlier one stays lone
                self.unescaped_length += REPLACEMENT_LEN;
            }
            self.pending_high = unit;
            self.state = State::Str(Str::MaybeLowSurrogate);
        } else {
            if self.pending_high != 0 {
                if is_low_surrogate(unit) {
                    let cp = combine_surrogates(self.pending_high, unit);
                    self.unescaped_length += utf8_size(cp);
                } else {
                    self.unescaped_length += REPLACEMENT_LEN;
                    self.unescaped_length += utf8_size(unit as u32);
                }
                self.pending_high = 0;
            } else if is_low_surrogate(unit) {
                // lone low surrogate
                self.unescaped_length += REPLACEMENT_LEN;
            } else {
                self.unescaped_length += utf8_size(unit as u32);
            }
            self.state = State::Str(Str::Plain);
        }
    }

    /// A top-level value finished; remember where the next one may start.
    fn complete(&mut self, next_offset: usize) -> Status {
        trace!("completed at offset {}", self.index);
        self.token_type = TokenType::None;
        self.token_start_index = self.index;
        self.anchor = Anchor::None;
        self.state = State::BetweenTokens;
        self.resume_offset = next_offset;
        Status::Completed
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn punctuator_type(ch: u8) -> Option<TokenType> {
    match ch {
        b':' => Some(TokenType::Colon),
        b',' => Some(TokenType::Comma),
        b'[' => Some(TokenType::OpenBracket),
        b']' => Some(TokenType::CloseBracket),
        b'{' => Some(TokenType::OpenBrace),
        b'}' => Some(TokenType::CloseBrace),
        _ => None,
    }
}

/// Append to the spill buffer, growing it by half-again (retrying with the
/// exact requirement) before giving up.
fn spill_bytes(spill: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ErrorKind> {
    let required = spill
        .len()
        .checked_add(bytes.len())
        .ok_or(ErrorKind::OutOfMemory)?;
    if required > spill.capacity() {
        let target = required.max(spill.capacity() + spill.capacity() / 2);
        if spill.try_reserve_exact(target - spill.len()).is_err()
            && spill.try_reserve_exact(required - spill.len()).is_err()
        {
            return Err(ErrorKind::OutOfMemory);
        }
    }
    spill.extend_from_slice(bytes);
    Ok(())
}
