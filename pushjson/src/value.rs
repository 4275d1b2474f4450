// SPDX-License-Identifier: Apache-2.0

//! Conversions from finished token bytes to native values.
//!
//! These helpers are pure functions over the byte span of a token the sink
//! has already received. They are deliberately lenient about details the
//! tokenizer has already checked (leading zeros, for instance), but never
//! about bounds: every write into a caller buffer is checked and failure is
//! reported instead of truncation.

use alloc::vec::Vec;
use core::str;

use crate::unicode::{
    combine_surrogates, hex_digit_value, is_high_surrogate, is_low_surrogate, REPLACEMENT,
};

macro_rules! define_unsigned_parser {
    ($(#[$meta:meta])* $name:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(bytes: &[u8]) -> Option<$ty> {
            if bytes.is_empty() {
                return None;
            }
            let mut value: $ty = 0;
            for &byte in bytes {
                let digit = match byte {
                    b'0'..=b'9' => (byte - b'0') as $ty,
                    _ => return None,
                };
                value = value.checked_mul(10)?.checked_add(digit)?;
            }
            Some(value)
        }
    };
}

macro_rules! define_signed_parser {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $uty:ty, $unsigned:ident) => {
        $(#[$meta])*
        pub fn $name(bytes: &[u8]) -> Option<$ty> {
            let (negative, digits) = match bytes {
                [b'-', rest @ ..] => (true, rest),
                _ => (false, bytes),
            };
            let magnitude = $unsigned(digits)?;
            if magnitude <= <$ty>::MAX as $uty {
                let value = magnitude as $ty;
                Some(if negative { -value } else { value })
            } else if negative && magnitude == (<$ty>::MAX as $uty) + 1 {
                Some(<$ty>::MIN)
            } else {
                None
            }
        }
    };
}

define_unsigned_parser!(
    /// Parse the decimal digits of a number token as a `u32`.
    ///
    /// Rejects anything but plain digits (no sign, no fraction, no
    /// exponent) and values out of range.
    parse_u32, u32
);
define_unsigned_parser!(
    /// Parse the decimal digits of a number token as a `u64`.
    parse_u64, u64
);
define_signed_parser!(
    /// Parse a number token as an `i32`, accepting an optional leading `-`.
    ///
    /// The full range is representable, `i32::MIN` included.
    parse_i32, i32, u32, parse_u32
);
define_signed_parser!(
    /// Parse a number token as an `i64`, accepting an optional leading `-`.
    parse_i64, i64, u64, parse_u64
);

/// Decimal separator used by the float helpers.
///
/// Inputs written with a non-default separator (for instance `3,14` from a
/// comma locale) are normalized before parsing. The default is `.`, which
/// makes the helpers locale-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalPoint(pub u8);

impl Default for DecimalPoint {
    fn default() -> Self {
        DecimalPoint(b'.')
    }
}

/// Parse a number token as an `f32`.
pub fn parse_f32(bytes: &[u8]) -> Option<f32> {
    parse_f32_with(DecimalPoint::default(), bytes)
}

/// Parse a number token as an `f32`, treating `decimal_point` as the
/// separator.
pub fn parse_f32_with(decimal_point: DecimalPoint, bytes: &[u8]) -> Option<f32> {
    with_normalized(decimal_point, bytes, |text| text.parse::<f32>().ok())
        .filter(|value| value.is_finite())
}

/// Parse a number token as an `f64`.
pub fn parse_f64(bytes: &[u8]) -> Option<f64> {
    parse_f64_with(DecimalPoint::default(), bytes)
}

/// Parse a number token as an `f64`, treating `decimal_point` as the
/// separator.
pub fn parse_f64_with(decimal_point: DecimalPoint, bytes: &[u8]) -> Option<f64> {
    with_normalized(decimal_point, bytes, |text| text.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Hand the token to `parse` with the first occurrence of the configured
/// separator rewritten to `.`. Short tokens stay on the stack; longer ones
/// take a heap copy.
fn with_normalized<T>(
    decimal_point: DecimalPoint,
    bytes: &[u8],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    if bytes.is_empty() {
        return None;
    }
    if decimal_point.0 == b'.' || !bytes.contains(&decimal_point.0) {
        return parse(str::from_utf8(bytes).ok()?);
    }

    const FIXED: usize = 24;
    let mut fixed = [0u8; FIXED];
    let mut heap;
    let buf = if bytes.len() <= FIXED {
        fixed[..bytes.len()].copy_from_slice(bytes);
        &mut fixed[..bytes.len()]
    } else {
        heap = Vec::from(bytes);
        &mut heap[..]
    };
    for byte in buf.iter_mut() {
        if *byte == decimal_point.0 {
            *byte = b'.';
            break;
        }
    }
    parse(str::from_utf8(buf).ok()?)
}

/// Decode the raw bytes of a string token (quotes included) into `dest`.
///
/// Returns the number of bytes written, which for a token produced by the
/// tokenizer equals its `unescaped_length`. Surrogate pairs written as
/// `\uXXXX\uXXXX` combine into one codepoint. A lone surrogate fails the
/// decode unless `replace_lone_surrogates` is set, in which case it becomes
/// U+FFFD. Returns `None` on malformed input or when `dest` is too small.
pub fn parse_string(dest: &mut [u8], token: &[u8], replace_lone_surrogates: bool) -> Option<usize> {
    let inner = token.strip_prefix(b"\"")?.strip_suffix(b"\"")?;

    let mut written = 0usize;
    let mut i = 0usize;
    while i < inner.len() {
        let byte = inner[i];
        if byte != b'\\' {
            write_byte(dest, &mut written, byte)?;
            i += 1;
            continue;
        }
        i += 1;
        let &escape = inner.get(i)?;
        i += 1;
        let unescaped = match escape {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let unit = parse_hex4(inner.get(i..i + 4)?)?;
                i += 4;
                let mut cp = unit as u32;
                if is_high_surrogate(unit) {
                    if inner.get(i) == Some(&b'\\') && inner.get(i + 1) == Some(&b'u') {
                        let low = parse_hex4(inner.get(i + 2..i + 6)?)?;
                        if is_low_surrogate(low) {
                            cp = combine_surrogates(unit, low);
                            i += 6;
                        } else if !replace_lone_surrogates {
                            return None;
                        }
                    } else if !replace_lone_surrogates {
                        return None;
                    }
                } else if is_low_surrogate(unit) && !replace_lone_surrogates {
                    return None;
                }
                write_code_point(dest, &mut written, cp)?;
                continue;
            }
            _ => return None,
        };
        write_byte(dest, &mut written, unescaped)?;
    }
    Some(written)
}

fn parse_hex4(digits: &[u8]) -> Option<u16> {
    let mut value = 0u16;
    for &byte in digits {
        value = value << 4 | hex_digit_value(byte)? as u16;
    }
    Some(value)
}

fn write_byte(dest: &mut [u8], written: &mut usize, byte: u8) -> Option<()> {
    let slot = dest.get_mut(*written)?;
    *slot = byte;
    *written += 1;
    Some(())
}

fn write_code_point(dest: &mut [u8], written: &mut usize, cp: u32) -> Option<()> {
    // lone surrogates that survive with replacement enabled become U+FFFD
    let cp = if (0xD800..=0xDFFF).contains(&cp) {
        REPLACEMENT
    } else {
        cp
    };
    let ch = char::from_u32(cp)?;
    let end = written.checked_add(ch.len_utf8())?;
    let slot = dest.get_mut(*written..end)?;
    ch.encode_utf8(slot);
    *written = end;
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32_simple() {
        assert_eq!(parse_u32(b"0"), Some(0));
        assert_eq!(parse_u32(b"42"), Some(42));
        assert_eq!(parse_u32(b"007"), Some(7));
        assert_eq!(parse_u32(b"4294967295"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_u32_rejects() {
        assert_eq!(parse_u32(b""), None);
        assert_eq!(parse_u32(b"-1"), None);
        assert_eq!(parse_u32(b"+1"), None);
        assert_eq!(parse_u32(b"1.5"), None);
        assert_eq!(parse_u32(b"4294967296"), None);
    }

    #[test]
    fn test_parse_i32_limits() {
        assert_eq!(parse_i32(b"2147483647"), Some(i32::MAX));
        assert_eq!(parse_i32(b"-2147483648"), Some(i32::MIN));
        assert_eq!(parse_i32(b"2147483648"), None);
        assert_eq!(parse_i32(b"-2147483649"), None);
    }

    #[test]
    fn test_parse_i32_rejects_sign_only() {
        assert_eq!(parse_i32(b"-"), None);
        assert_eq!(parse_i32(b"+5"), None);
    }

    #[test]
    fn test_parse_u64_limits() {
        assert_eq!(parse_u64(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64(b"18446744073709551616"), None);
    }

    #[test]
    fn test_parse_i64_limits() {
        assert_eq!(parse_i64(b"9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_i64(b"-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_i64(b"9223372036854775808"), None);
        assert_eq!(parse_i64(b"-9223372036854775809"), None);
    }

    #[test]
    fn test_parse_f64_simple() {
        assert_eq!(parse_f64(b"0"), Some(0.0));
        assert_eq!(parse_f64(b"0.12"), Some(0.12));
        assert_eq!(parse_f64(b"-12.5e+3"), Some(-12500.0));
        assert_eq!(parse_f64(b"1E2"), Some(100.0));
    }

    #[test]
    fn test_parse_f64_rejects() {
        assert_eq!(parse_f64(b""), None);
        assert_eq!(parse_f64(b"1.5x"), None);
        assert_eq!(parse_f64(b" 1"), None);
        // out of range rather than silently infinite
        assert_eq!(parse_f64(b"1e999"), None);
        assert_eq!(parse_f64(b"-1e999"), None);
    }

    #[test]
    fn test_parse_f64_decimal_point() {
        let comma = DecimalPoint(b',');
        assert_eq!(parse_f64_with(comma, b"3,14"), Some(3.14));
        // plain integers are unaffected
        assert_eq!(parse_f64_with(comma, b"314"), Some(314.0));
        // only the first separator is rewritten
        assert_eq!(parse_f64_with(comma, b"3,1,4"), None);
    }

    #[test]
    fn test_parse_f64_decimal_point_long_token() {
        let comma = DecimalPoint(b',');
        let token = b"123456789012345678901234567,5";
        assert!(token.len() > 24);
        assert_eq!(
            parse_f64_with(comma, token),
            Some(123456789012345678901234567.5)
        );
    }

    #[test]
    fn test_parse_f32_range() {
        assert_eq!(parse_f32(b"1.5"), Some(1.5));
        // overflows f32 but not f64
        assert_eq!(parse_f32(b"1e39"), None);
        assert_eq!(parse_f64(b"1e39"), Some(1e39));
    }

    #[test]
    fn test_parse_string_plain_and_escapes() {
        let mut buf = [0u8; 32];
        let n = parse_string(&mut buf, br#""a\"b\\c\/d\b\f\n\r\t""#, false).unwrap();
        assert_eq!(&buf[..n], b"a\"b\\c/d\x08\x0C\n\r\t");
    }

    #[test]
    fn test_parse_string_unicode_escape() {
        let mut buf = [0u8; 8];
        let n = parse_string(&mut buf, br#""\u0041\u03B1""#, false).unwrap();
        assert_eq!(&buf[..n], "A\u{3B1}".as_bytes());
    }

    #[test]
    fn test_parse_string_surrogate_pair() {
        let mut buf = [0u8; 8];
        let n = parse_string(&mut buf, br#""\uD800\uDC00""#, false).unwrap();
        assert_eq!(&buf[..n], [0xF0, 0x90, 0x80, 0x80]);
    }

    #[test]
    fn test_parse_string_lone_high_surrogate_replaced() {
        let mut buf = [0u8; 8];
        let n = parse_string(&mut buf, br#""\uD800x""#, true).unwrap();
        assert_eq!(&buf[..n], [0xEF, 0xBF, 0xBD, 0x78]);
    }

    #[test]
    fn test_parse_string_lone_surrogates_rejected_without_replacement() {
        let mut buf = [0u8; 8];
        assert_eq!(parse_string(&mut buf, br#""\uD800x""#, false), None);
        assert_eq!(parse_string(&mut buf, br#""\uDC37""#, false), None);
    }

    #[test]
    fn test_parse_string_two_high_surrogates_pair_with_second() {
        // the first high surrogate stays lone and becomes U+FFFD; the
        // second pairs with the low surrogate into U+10437
        let mut buf = [0u8; 8];
        let n = parse_string(&mut buf, br#""\uD800\uD801\uDC37""#, true).unwrap();
        assert_eq!(&buf[..n], [0xEF, 0xBF, 0xBD, 0xF0, 0x90, 0x90, 0xB7]);
    }

    #[test]
    fn test_parse_string_high_surrogate_then_bmp_escape() {
        let mut buf = [0u8; 8];
        let n = parse_string(&mut buf, br#""\uD800A""#, true).unwrap();
        assert_eq!(&buf[..n], [0xEF, 0xBF, 0xBD, b'A']);
    }

    #[test]
    fn test_parse_string_requires_quotes() {
        let mut buf = [0u8; 8];
        assert_eq!(parse_string(&mut buf, b"abc", false), None);
        assert_eq!(parse_string(&mut buf, b"\"abc", false), None);
        assert_eq!(parse_string(&mut buf, b"\"", false), None);
    }

    #[test]
    fn test_parse_string_truncated_escape() {
        let mut buf = [0u8; 8];
        assert_eq!(parse_string(&mut buf, br#""\""#, false), None);
        assert_eq!(parse_string(&mut buf, br#""\u00""#, false), None);
    }

    #[test]
    fn test_parse_string_refuses_overrun() {
        let mut buf = [0u8; 2];
        assert_eq!(parse_string(&mut buf, br#""abc""#, false), None);
        let mut buf = [0u8; 3];
        assert_eq!(parse_string(&mut buf, br#""abc""#, false), Some(3));
    }

    #[test]
    fn test_parse_string_multibyte_passthrough() {
        let token = "\"héllo €\"".as_bytes();
        let mut buf = [0u8; 16];
        let n = parse_string(&mut buf, token, false).unwrap();
        assert_eq!(&buf[..n], "héllo €".as_bytes());
    }
}
