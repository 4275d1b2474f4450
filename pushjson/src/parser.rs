// SPDX-License-Identifier: Apache-2.0

//! Structural JSON parser: a grammar recognizer layered over the token
//! stream.
//!
//! The parser subscribes to a [`Tokenizer`] as its [`TokenSink`] and enforces
//! value/array/object/member ordering with one dispatch per token. Callers
//! observe parsing through per-scope callbacks stored in [`ParserContext`]
//! frames; the frames live on a context stack whose storage discipline is
//! entirely the caller's, supplied through the [`ContextStack`] trait.
//!
//! [`Tokenizer`]: crate::Tokenizer

use log::trace;

use crate::token::{Error, ErrorKind, Status, Token, TokenSink, TokenType};

/// Grammar dispatch state; which handler consumes the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrammarState {
    TopLevelValue,
    ArrayItemOrEnd,
    ArrayItem,
    ArrayCommaOrEnd,
    ObjectKeyOrEnd,
    ObjectKey,
    ObjectColon,
    ObjectValue,
    ObjectCommaOrEnd,
    ExpectEos,
}

/// Per-scope callback. Receives the caller's whole storage, so state both
/// global and per-frame (through [`ContextStack::peek_context`]) is in
/// reach.
pub type ContextCallback<S> = fn(&mut S, &Token<'_>) -> Result<(), ErrorKind>;

/// Per-depth parser record.
///
/// One frame exists per open scope (top level, array or object). Callers
/// embed this in their own frame struct to attach per-scope state; the
/// parser only ever touches the fields below.
pub struct ParserContext<S> {
    /// Saved dispatch to resume on scope exit; `None` marks a lazy top
    /// level, which completes the parse instead.
    pub(crate) next_eat: Option<GrammarState>,
    /// Called for every finished value in this scope. For arrays and
    /// objects it is called twice: once with the opening token (the new
    /// frame is already on the stack) and once with the closing token (the
    /// inner frame is still on the stack, and is popped right after).
    pub on_value: Option<ContextCallback<S>>,
    /// Called for every object member key in this scope.
    pub on_object_property_name: Option<ContextCallback<S>>,
}

impl<S> ParserContext<S> {
    pub fn new() -> Self {
        ParserContext {
            next_eat: None,
            on_value: None,
            on_object_property_name: None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.next_eat = None;
        self.on_value = None;
        self.on_object_property_name = None;
    }
}

impl<S> Default for ParserContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage discipline for the context stack. The parser never allocates
/// frames; it asks the caller through these three operations.
pub trait ContextStack: Sized {
    /// Make room for a new frame on top of the stack. Return
    /// [`ErrorKind::MaxDepthExceeded`] to refuse further nesting.
    fn push_context(&mut self) -> Result<(), ErrorKind>;

    /// The topmost frame, or the one beneath it when `previous` is true.
    fn peek_context(&mut self, previous: bool) -> &mut ParserContext<Self>;

    /// Discard the topmost frame.
    fn pop_context(&mut self);
}

/// Event-driven structural parser.
///
/// In lazy mode the parser returns [`Status::Completed`] as soon as one
/// top-level value finishes, which lets a caller consume a stream of
/// concatenated JSON values ([`reset`] re-primes for the next one). In
/// greedy mode a single top-level value followed by end-of-stream is
/// required.
///
/// [`reset`]: Parser::reset
pub struct Parser<S: ContextStack> {
    state: GrammarState,
    lazy: bool,
    /// The caller's stack storage, reachable between feeds.
    pub storage: S,
}

impl<S: ContextStack> Parser<S> {
    /// Install the storage and push the fresh top-level context.
    pub fn new(storage: S, lazy: bool) -> Result<Self, Error> {
        let mut parser = Parser {
            state: GrammarState::TopLevelValue,
            lazy,
            storage,
        };
        parser.prime()?;
        Ok(parser)
    }

    /// Re-prime for parsing the next top-level value. The caller restores
    /// its storage to the empty state first; this pushes the new top-level
    /// frame.
    pub fn reset(&mut self, lazy: bool) -> Result<(), Error> {
        self.lazy = lazy;
        self.state = GrammarState::TopLevelValue;
        self.prime()
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn prime(&mut self) -> Result<(), Error> {
        self.storage
            .push_context()
            .map_err(|kind| Error::new(kind, 0))?;
        self.storage.peek_context(false).clear();
        Ok(())
    }

    /// Consume a value-position token.
    fn eat_value(
        &mut self,
        token: &Token<'_>,
        primitive_next: GrammarState,
        complex_next: Option<GrammarState>,
        primitive_status: Status,
        eos_error: ErrorKind,
    ) -> Result<Status, Error> {
        match token.token_type {
            TokenType::Null
            | TokenType::False
            | TokenType::True
            | TokenType::Number
            | TokenType::String => {
                self.fire_on_value(false, token)?;
                self.state = primitive_next;
                Ok(primitive_status)
            }
            TokenType::OpenBracket => {
                self.begin_complex(GrammarState::ArrayItemOrEnd, complex_next, token)
            }
            TokenType::OpenBrace => {
                self.begin_complex(GrammarState::ObjectKeyOrEnd, complex_next, token)
            }
            TokenType::Eos => Err(Error::new(eos_error, token.start_index)),
            _ => Err(Error::new(ErrorKind::Syntax, token.start_index)),
        }
    }

    /// An array or object opens: push a frame and notify the enclosing
    /// scope.
    fn begin_complex(
        &mut self,
        inner: GrammarState,
        complex_next: Option<GrammarState>,
        token: &Token<'_>,
    ) -> Result<Status, Error> {
        self.storage
            .push_context()
            .map_err(|kind| Error::new(kind, token.start_index))?;
        self.storage.peek_context(false).clear();
        self.storage.peek_context(true).next_eat = complex_next;
        self.fire_on_value(true, token)?;
        self.state = inner;
        Ok(Status::DataNeeded)
    }

    /// The matching close token arrived: notify the enclosing scope, pop
    /// the frame and resume (or complete a lazy top level).
    fn end_complex(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        self.fire_on_value(true, token)?;
        let next = self.storage.peek_context(true).next_eat.take();
        self.storage.pop_context();
        match next {
            Some(state) => {
                self.state = state;
                Ok(Status::DataNeeded)
            }
            None => {
                self.state = GrammarState::ExpectEos;
                Ok(Status::Completed)
            }
        }
    }

    fn fire_on_value(&mut self, previous: bool, token: &Token<'_>) -> Result<(), Error> {
        let callback = self.storage.peek_context(previous).on_value;
        if let Some(callback) = callback {
            callback(&mut self.storage, token)
                .map_err(|kind| Error::new(kind, token.start_index))?;
        }
        Ok(())
    }

    fn array_item(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        self.eat_value(
            token,
            GrammarState::ArrayCommaOrEnd,
            Some(GrammarState::ArrayCommaOrEnd),
            Status::DataNeeded,
            ErrorKind::Syntax,
        )
    }

    fn object_key(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        if token.token_type != TokenType::String {
            return Err(Error::new(ErrorKind::Syntax, token.start_index));
        }
        let callback = self.storage.peek_context(false).on_object_property_name;
        if let Some(callback) = callback {
            callback(&mut self.storage, token)
                .map_err(|kind| Error::new(kind, token.start_index))?;
        }
        self.state = GrammarState::ObjectColon;
        Ok(Status::DataNeeded)
    }
}

impl<S: ContextStack> TokenSink for Parser<S> {
    fn eat(&mut self, token: &Token<'_>) -> Result<Status, Error> {
        trace!("eat {:?} in {:?}", token.token_type, self.state);
        match self.state {
            GrammarState::TopLevelValue => {
                let complex_next = if self.lazy {
                    None
                } else {
                    Some(GrammarState::ExpectEos)
                };
                let primitive_status = if self.lazy {
                    Status::Completed
                } else {
                    Status::DataNeeded
                };
                self.eat_value(
                    token,
                    GrammarState::ExpectEos,
                    complex_next,
                    primitive_status,
                    ErrorKind::NoTokensFound,
                )
            }
            GrammarState::ArrayItemOrEnd => {
                if token.token_type == TokenType::CloseBracket {
                    self.end_complex(token)
                } else {
                    self.array_item(token)
                }
            }
            GrammarState::ArrayItem => self.array_item(token),
            GrammarState::ArrayCommaOrEnd => match token.token_type {
                TokenType::Comma => {
                    self.state = GrammarState::ArrayItem;
                    Ok(Status::DataNeeded)
                }
                TokenType::CloseBracket => self.end_complex(token),
                _ => Err(Error::new(ErrorKind::Syntax, token.start_index)),
            },
            GrammarState::ObjectKeyOrEnd => {
                if token.token_type == TokenType::CloseBrace {
                    self.end_complex(token)
                } else {
                    self.object_key(token)
                }
            }
            GrammarState::ObjectKey => self.object_key(token),
            GrammarState::ObjectColon => {
                if token.token_type == TokenType::Colon {
                    self.state = GrammarState::ObjectValue;
                    Ok(Status::DataNeeded)
                } else {
                    Err(Error::new(ErrorKind::Syntax, token.start_index))
                }
            }
            GrammarState::ObjectValue => self.eat_value(
                token,
                GrammarState::ObjectCommaOrEnd,
                Some(GrammarState::ObjectCommaOrEnd),
                Status::DataNeeded,
                ErrorKind::Syntax,
            ),
            GrammarState::ObjectCommaOrEnd => match token.token_type {
                TokenType::Comma => {
                    self.state = GrammarState::ObjectKey;
                    Ok(Status::DataNeeded)
                }
                TokenType::CloseBrace => self.end_complex(token),
                _ => Err(Error::new(ErrorKind::Syntax, token.start_index)),
            },
            GrammarState::ExpectEos => {
                if token.token_type == TokenType::Eos {
                    Ok(Status::Completed)
                } else {
                    Err(Error::new(ErrorKind::Syntax, token.start_index))
                }
            }
        }
    }
}
