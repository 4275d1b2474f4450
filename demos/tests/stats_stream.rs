// SPDX-License-Identifier: Apache-2.0

//! End-to-end statistics over a generated ~1 MB document fed in
//! random-size chunks: an array of 1550 objects whose subtrees nest four
//! containers deep and carry 14 keys each.

use demos::stats::StatsStorage;
use pushjson::{Parser, Status, TokenType, Tokenizer};

const OBJECT_COUNT: usize = 1550;
const KEYS_PER_OBJECT: usize = 14;

fn build_document() -> Vec<u8> {
    let mut out = String::from("[\n");
    for i in 0..OBJECT_COUNT {
        let flag = if i % 2 == 0 { "true" } else { "false" };
        out.push_str(&format!(
            concat!(
                "  {{\"id\": {i}, \"flag\": {flag}, \"name\": \"item-{i}\", ",
                "\"tags\": [\"a\", \"b\"], ",
                "\"meta\": {{\"origin\": \"gen\", \"extra\": {{\"a\": 1, \"b\": 2}}}}, ",
                "\"x0\": 0, \"x1\": 1, \"x2\": 2, \"x3\": 3, \"x4\": 4}}"
            ),
            i = i,
            flag = flag
        ));
        if i + 1 < OBJECT_COUNT {
            out.push(',');
        }
        out.push('\n');
    }
    out.push(']');
    out.into_bytes()
}

/// Deterministic xorshift generator for reproducible chunk sizes.
struct Lcg(u64);

impl Lcg {
    fn next_range(&mut self, low: usize, high: usize) -> usize {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        low + (x as usize) % (high - low)
    }
}

fn parse_in_random_chunks(document: &[u8], seed: u64) -> StatsStorage {
    let mut parser = Parser::new(StatsStorage::new(), false).unwrap();
    parser.storage.install();
    let mut tokenizer = Tokenizer::new();

    let mut rng = Lcg(seed);
    let mut rest = document;
    while !rest.is_empty() {
        let take = rng.next_range(4, 128).min(rest.len());
        let (chunk, tail) = rest.split_at(take);
        rest = tail;
        assert_eq!(tokenizer.feed(chunk, &mut parser), Ok(Status::DataNeeded));
    }
    assert_eq!(tokenizer.close(&mut parser), Ok(Status::Completed));
    parser.into_storage()
}

#[test]
fn test_stats_over_randomly_chunked_document() {
    let document = build_document();

    for seed in [0x0123_4567_89AB_CDEFu64, 0xDEAD_BEEF_CAFE_F00Du64] {
        let stats = parse_in_random_chunks(&document, seed);

        assert_eq!(stats.toplevel_type, TokenType::CloseBracket);
        assert_eq!(stats.max_depth, 4);
        assert_eq!(stats.max_array_item_count, OBJECT_COUNT);
        assert_eq!(stats.max_object_property_count, 10);
        assert_eq!(stats.key_count, OBJECT_COUNT * KEYS_PER_OBJECT);

        assert_eq!(stats.count_of(TokenType::Null), 0);
        assert_eq!(stats.count_of(TokenType::True), OBJECT_COUNT / 2);
        assert_eq!(stats.count_of(TokenType::False), OBJECT_COUNT / 2);
        // id, a, b and the five xN members
        assert_eq!(stats.count_of(TokenType::Number), OBJECT_COUNT * 8);
        // name, both tags and origin
        assert_eq!(stats.count_of(TokenType::String), OBJECT_COUNT * 4);
        // each object's tags array, plus the top-level one
        assert_eq!(stats.count_of(TokenType::CloseBracket), OBJECT_COUNT + 1);
        // the object itself, meta and extra
        assert_eq!(stats.count_of(TokenType::CloseBrace), OBJECT_COUNT * 3);
    }
}

#[test]
fn test_stats_match_between_chunkings() {
    let document = build_document();
    let random = parse_in_random_chunks(&document, 7);

    let mut parser = Parser::new(StatsStorage::new(), false).unwrap();
    parser.storage.install();
    let mut tokenizer = Tokenizer::new();
    assert_eq!(
        tokenizer.feed(&document, &mut parser),
        Ok(Status::DataNeeded)
    );
    assert_eq!(tokenizer.close(&mut parser), Ok(Status::Completed));
    let single = parser.into_storage();

    assert_eq!(single.max_depth, random.max_depth);
    assert_eq!(single.max_array_item_count, random.max_array_item_count);
    assert_eq!(
        single.max_object_property_count,
        random.max_object_property_count
    );
    assert_eq!(single.key_count, random.key_count);
    for token_type in [
        TokenType::Null,
        TokenType::False,
        TokenType::True,
        TokenType::Number,
        TokenType::String,
        TokenType::CloseBracket,
        TokenType::CloseBrace,
    ] {
        assert_eq!(single.count_of(token_type), random.count_of(token_type));
    }
}

#[test]
fn test_lazy_stream_of_generated_values() {
    // three values back to back, statistics reset between completions
    let mut document = Vec::new();
    document.extend_from_slice(b"{\"a\": [1, 2]} ");
    document.extend_from_slice(b"[true, false] ");
    document.extend_from_slice(b"\"done\"");

    let mut parser = Parser::new(StatsStorage::new(), true).unwrap();
    parser.storage.install();
    let mut tokenizer = Tokenizer::new();

    let mut toplevel_types = Vec::new();
    let mut rest: &[u8] = &document;
    loop {
        match tokenizer.feed(rest, &mut parser).unwrap() {
            Status::Completed => {
                toplevel_types.push(parser.storage.toplevel_type);
                rest = &rest[tokenizer.resume_offset()..];
                parser.storage.clear();
                parser.reset(true).unwrap();
                parser.storage.install();
            }
            Status::DataNeeded => break,
        }
    }

    assert_eq!(
        toplevel_types,
        [TokenType::CloseBrace, TokenType::CloseBracket, TokenType::String]
    );
}
