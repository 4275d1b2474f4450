// SPDX-License-Identifier: Apache-2.0

//! Round trips between printed JSON primitives and the value helpers.

use pushjson::value;

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

#[test]
fn test_integer_round_trips() {
    let mut rng = Lcg(0x9E37_79B9_7F4A_7C15);
    for _ in 0..1000 {
        let value = rng.next() as i64;
        let text = value.to_string();
        assert_eq!(value::parse_i64(text.as_bytes()), Some(value), "{text}");

        let narrowed = (value as i32) as i64;
        let text = narrowed.to_string();
        assert_eq!(
            value::parse_i32(text.as_bytes()).map(i64::from),
            Some(narrowed),
            "{text}"
        );

        let unsigned = rng.next();
        let text = unsigned.to_string();
        assert_eq!(value::parse_u64(text.as_bytes()), Some(unsigned), "{text}");
    }
}

#[test]
fn test_integer_boundaries_round_trip() {
    for value in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1, i64::MAX] {
        let text = value.to_string();
        assert_eq!(value::parse_i64(text.as_bytes()), Some(value));
    }
    for value in [i32::MIN, i32::MAX] {
        let text = value.to_string();
        assert_eq!(value::parse_i32(text.as_bytes()), Some(value));
    }
    for value in [0u64, u64::MAX] {
        let text = value.to_string();
        assert_eq!(value::parse_u64(text.as_bytes()), Some(value));
    }
}

#[test]
fn test_double_round_trips_exactly() {
    // shortest-round-trip printing guarantees bit-exact re-parsing
    let mut rng = Lcg(0xB5AD_4ECE_DA1C_E2A9);
    let mut checked = 0;
    while checked < 1000 {
        let bits = rng.next();
        let value = f64::from_bits(bits);
        if !value.is_finite() {
            continue;
        }
        checked += 1;
        let text = format!("{value:e}");
        // JSON has no infinity literal, so the text form is always a number
        let reparsed = value::parse_f64(text.as_bytes()).unwrap_or_else(|| panic!("{text}"));
        assert_eq!(reparsed.to_bits(), value.to_bits(), "{text}");
    }
}

#[test]
fn test_float_round_trips_within_type() {
    let mut rng = Lcg(0x1357_9BDF_2468_ACE0);
    let mut checked = 0;
    while checked < 1000 {
        let value = f32::from_bits(rng.next() as u32);
        if !value.is_finite() {
            continue;
        }
        checked += 1;
        let text = format!("{value:e}");
        let reparsed = value::parse_f32(text.as_bytes()).unwrap_or_else(|| panic!("{text}"));
        assert_eq!(reparsed.to_bits(), value.to_bits(), "{text}");
    }
}

#[test]
fn test_int_overflow_is_rejected_not_wrapped() {
    // a value only u64 can hold
    let text = b"9223372036854775808";
    assert_eq!(value::parse_i64(text), None);
    assert_eq!(value::parse_i32(text), None);
    assert_eq!(value::parse_u64(text), Some(9223372036854775808));
}

#[test]
fn test_nul_escape_decodes_to_one_byte() {
    let mut buf = [0xFFu8; 4];
    let written = value::parse_string(&mut buf, br#""\u0000""#, false).unwrap();
    assert_eq!(written, 1);
    assert_eq!(buf[0], 0);
}
