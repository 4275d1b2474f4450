// SPDX-License-Identifier: Apache-2.0

//! Incremental, push-style JSON parsing.
//!
//! Input arrives as byte chunks of arbitrary size through
//! [`Tokenizer::feed`]; the tokenizer suspends mid-token at chunk boundaries
//! and resumes when more data arrives, so callers never buffer the input
//! themselves. Finished tokens flow into a [`TokenSink`] — typically the
//! structural [`Parser`], which validates the grammar and drives per-scope
//! user callbacks through a caller-owned context stack.
//!
//! ```
//! use pushjson::{ContextStack, ErrorKind, Parser, ParserContext, Status, Tokenizer};
//!
//! struct Stack(Vec<ParserContext<Stack>>);
//!
//! impl ContextStack for Stack {
//!     fn push_context(&mut self) -> Result<(), ErrorKind> {
//!         self.0.push(ParserContext::new());
//!         Ok(())
//!     }
//!     fn peek_context(&mut self, previous: bool) -> &mut ParserContext<Self> {
//!         let index = self.0.len() - 1 - usize::from(previous);
//!         &mut self.0[index]
//!     }
//!     fn pop_context(&mut self) {
//!         self.0.pop();
//!     }
//! }
//!
//! let mut parser = Parser::new(Stack(Vec::new()), false).unwrap();
//! let mut tokenizer = Tokenizer::new();
//! // chunk boundaries may fall anywhere, even inside a token
//! tokenizer.feed(br#"{"answer""#, &mut parser).unwrap();
//! tokenizer.feed(br#": 42}"#, &mut parser).unwrap();
//! assert_eq!(tokenizer.close(&mut parser), Ok(Status::Completed));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod token;
pub use token::{Error, ErrorKind, NullSink, Status, Token, TokenSink, TokenType};

mod tokenizer;
pub use tokenizer::{Tokenizer, DEFAULT_SPILL_CAPACITY};

mod parser;
pub use parser::{ContextCallback, ContextStack, Parser, ParserContext};

mod unicode;

pub mod value;
