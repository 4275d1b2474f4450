// SPDX-License-Identifier: Apache-2.0

//! Statistics-collecting parser: counts values by type, tracks nesting
//! depth and the largest array/object, all without building a document
//! tree. Each open scope carries an item counter in its stack frame.

use pushjson::{ContextStack, ErrorKind, ParserContext, Token, TokenType};

/// Nesting levels accepted before `push_context` refuses.
pub const MAX_DEPTH: usize = 100;

/// Number of countable token types, `Null` through `Comma`.
const TYPE_SLOTS: usize = TokenType::Eos as usize - TokenType::Null as usize;

pub struct StatsFrame {
    base: ParserContext<StatsStorage>,
    /// Values seen directly in this scope (items or members).
    counter: usize,
}

/// Context-stack storage plus the accumulated statistics.
pub struct StatsStorage {
    frames: Vec<StatsFrame>,
    pub toplevel_type: TokenType,
    /// Deepest container nesting seen (a bare primitive is depth 0).
    pub max_depth: usize,
    pub max_array_item_count: usize,
    pub max_object_property_count: usize,
    /// Per-type counts, indexed by `token_type - TokenType::Null`. Arrays
    /// and objects are counted under their closing token.
    type_counts: [usize; TYPE_SLOTS],
    pub key_count: usize,
}

impl StatsStorage {
    pub fn new() -> Self {
        StatsStorage {
            frames: Vec::with_capacity(MAX_DEPTH),
            toplevel_type: TokenType::None,
            max_depth: 0,
            max_array_item_count: 0,
            max_object_property_count: 0,
            type_counts: [0; TYPE_SLOTS],
            key_count: 0,
        }
    }

    /// Forget everything for the next value in the stream. Call before
    /// [`Parser::reset`], then [`install`] again.
    ///
    /// [`Parser::reset`]: pushjson::Parser::reset
    /// [`install`]: StatsStorage::install
    pub fn clear(&mut self) {
        self.frames.clear();
        self.toplevel_type = TokenType::None;
        self.max_depth = 0;
        self.max_array_item_count = 0;
        self.max_object_property_count = 0;
        self.type_counts = [0; TYPE_SLOTS];
        self.key_count = 0;
    }

    /// Hook the statistics callbacks onto the freshly primed top-level
    /// context.
    pub fn install(&mut self) {
        self.peek_context(false).on_value = Some(on_value_at_toplevel);
        self.peek_context(false).on_object_property_name = Some(on_property_name);
    }

    pub fn count_of(&self, token_type: TokenType) -> usize {
        self.type_counts[token_type as usize - TokenType::Null as usize]
    }

    fn record_type(&mut self, token_type: TokenType) {
        self.type_counts[token_type as usize - TokenType::Null as usize] += 1;
    }
}

impl Default for StatsStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack for StatsStorage {
    fn push_context(&mut self) -> Result<(), ErrorKind> {
        if self.frames.len() >= MAX_DEPTH {
            return Err(ErrorKind::MaxDepthExceeded);
        }
        self.frames.push(StatsFrame {
            base: ParserContext::new(),
            counter: 0,
        });
        Ok(())
    }

    fn peek_context(&mut self, previous: bool) -> &mut ParserContext<Self> {
        let index = self.frames.len() - 1 - usize::from(previous);
        &mut self.frames[index].base
    }

    fn pop_context(&mut self) {
        self.frames.pop();
    }
}

fn on_value_at_toplevel(storage: &mut StatsStorage, token: &Token<'_>) -> Result<(), ErrorKind> {
    // Arrays and objects report twice, opening and closing; the close token
    // type sticks, which is why array/object totals live under the closing
    // token's slot.
    storage.toplevel_type = token.token_type;
    record_value(storage, token)
}

fn on_value_in_scope(storage: &mut StatsStorage, token: &Token<'_>) -> Result<(), ErrorKind> {
    match token.token_type {
        TokenType::OpenBracket | TokenType::OpenBrace => {
            // the fresh frame is already on the stack; the new container is
            // an item of the scope beneath it
            let parent = storage.frames.len() - 2;
            storage.frames[parent].counter += 1;
        }
        // counted when they opened
        TokenType::CloseBracket | TokenType::CloseBrace => {}
        _ => {
            let top = storage.frames.len() - 1;
            storage.frames[top].counter += 1;
        }
    }
    record_value(storage, token)
}

fn on_property_name(storage: &mut StatsStorage, _token: &Token<'_>) -> Result<(), ErrorKind> {
    storage.key_count += 1;
    Ok(())
}

fn record_value(storage: &mut StatsStorage, token: &Token<'_>) -> Result<(), ErrorKind> {
    match token.token_type {
        TokenType::Null
        | TokenType::False
        | TokenType::True
        | TokenType::Number
        | TokenType::String => storage.record_type(token.token_type),

        TokenType::OpenBracket | TokenType::OpenBrace => {
            let top = storage.frames.len() - 1;
            storage.frames[top].base.on_value = Some(on_value_in_scope);
            storage.frames[top].base.on_object_property_name = Some(on_property_name);
            let depth = storage.frames.len() - 1;
            storage.max_depth = storage.max_depth.max(depth);
        }

        TokenType::CloseBracket => {
            let top = storage.frames.len() - 1;
            let items = storage.frames[top].counter;
            storage.max_array_item_count = storage.max_array_item_count.max(items);
            storage.record_type(TokenType::CloseBracket);
        }

        TokenType::CloseBrace => {
            let top = storage.frames.len() - 1;
            let members = storage.frames[top].counter;
            storage.max_object_property_count = storage.max_object_property_count.max(members);
            storage.record_type(TokenType::CloseBrace);
        }

        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushjson::{Parser, Status, Tokenizer};
    use test_log::test;

    fn collect(input: &[u8]) -> StatsStorage {
        let mut parser = Parser::new(StatsStorage::new(), false).unwrap();
        parser.storage.install();
        let mut tokenizer = Tokenizer::new();
        tokenizer.feed(input, &mut parser).unwrap();
        assert_eq!(tokenizer.close(&mut parser), Ok(Status::Completed));
        parser.into_storage()
    }

    #[test]
    fn test_primitive_toplevel() {
        let stats = collect(b"42");
        assert_eq!(stats.toplevel_type, TokenType::Number);
        assert_eq!(stats.max_depth, 0);
        assert_eq!(stats.count_of(TokenType::Number), 1);
    }

    #[test]
    fn test_array_items_counted_once_each() {
        // three items: a primitive, an object and an array
        let stats = collect(br#"[1, {"a": 2}, []]"#);
        assert_eq!(stats.toplevel_type, TokenType::CloseBracket);
        assert_eq!(stats.max_array_item_count, 3);
        assert_eq!(stats.count_of(TokenType::CloseBracket), 2);
        assert_eq!(stats.count_of(TokenType::CloseBrace), 1);
        assert_eq!(stats.key_count, 1);
    }

    #[test]
    fn test_object_member_maximum_tracked_separately() {
        // the largest array has 4 items, the largest object 2 members
        let stats = collect(br#"{"a": [1, 2, 3, 4], "b": {"x": 1, "y": 2}}"#);
        assert_eq!(stats.max_array_item_count, 4);
        assert_eq!(stats.max_object_property_count, 2);
    }

    #[test]
    fn test_depth_of_nested_containers() {
        let stats = collect(br#"{"a": [{"b": [1]}]}"#);
        assert_eq!(stats.max_depth, 4);
    }

    #[test]
    fn test_depth_limit_refused() {
        let mut input = Vec::new();
        input.extend(core::iter::repeat(b'[').take(MAX_DEPTH + 1));
        let mut parser = Parser::new(StatsStorage::new(), false).unwrap();
        parser.storage.install();
        let mut tokenizer = Tokenizer::new();
        let err = tokenizer.feed(&input, &mut parser).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MaxDepthExceeded);
        // the hundredth open bracket is the one that does not fit
        assert_eq!(err.index, MAX_DEPTH - 1);
    }
}
