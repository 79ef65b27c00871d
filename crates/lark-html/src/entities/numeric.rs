//! [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)

/// Largest valid code point. Accumulation stops growing past this and the
/// reference is flagged as overflowed.
pub const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// "If the number is one of the numbers in the first column of the following
/// table, then find the row with that number in the first column, and set the
/// character reference code to the number in the second column of that row."
///
/// Indexed by `codepoint - 0x80`. Entries that map to themselves are C1
/// controls with no Windows-1252 meaning.
const WINDOWS_1252_C1: [u32; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, //
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x008D, 0x017D, 0x008F, //
    0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, //
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

/// Accumulate one digit into a numeric reference value, saturating and
/// flagging `overflow` once the value passes [`MAX_CODEPOINT`].
pub const fn accumulate(codepoint: u32, digit: u32, base: u32, overflow: &mut bool) -> u32 {
    if *overflow {
        return codepoint;
    }
    let next = codepoint * base + digit;
    if next > MAX_CODEPOINT {
        *overflow = true;
        return MAX_CODEPOINT;
    }
    next
}

/// Map an accumulated numeric reference to the character it produces.
///
/// - 0x80..=0x9F go through the Windows-1252 table.
/// - CR becomes LF.
/// - NUL, surrogates, noncharacters, disallowed C0/C1 controls and
///   overflowed values become U+FFFD.
#[must_use]
pub fn resolve_numeric(codepoint: u32, overflow: bool) -> char {
    if overflow || codepoint > MAX_CODEPOINT {
        return char::REPLACEMENT_CHARACTER;
    }
    let codepoint = match codepoint {
        0x80..=0x9F => WINDOWS_1252_C1[(codepoint - 0x80) as usize],
        0x0D => 0x0A,
        other => other,
    };
    let disallowed = matches!(
        codepoint,
        0x00 | 0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F | 0xD800..=0xDFFF | 0xFDD0..=0xFDEF
    ) || codepoint & 0xFFFE == 0xFFFE;
    if disallowed {
        return char::REPLACEMENT_CHARACTER;
    }
    char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_1252_remap() {
        assert_eq!(resolve_numeric(0x80, false), '\u{20AC}');
        assert_eq!(resolve_numeric(0x99, false), '\u{2122}');
        // Unmapped C1 controls stay disallowed.
        assert_eq!(resolve_numeric(0x81, false), '\u{FFFD}');
    }

    #[test]
    fn test_disallowed_codepoints() {
        assert_eq!(resolve_numeric(0, false), '\u{FFFD}');
        assert_eq!(resolve_numeric(0xD800, false), '\u{FFFD}');
        assert_eq!(resolve_numeric(0xFFFE, false), '\u{FFFD}');
        assert_eq!(resolve_numeric(0x1_FFFF, false), '\u{FFFD}');
        assert_eq!(resolve_numeric(0x0B, false), '\u{FFFD}');
        assert_eq!(resolve_numeric(0x41, true), '\u{FFFD}');
    }

    #[test]
    fn test_carriage_return_becomes_line_feed() {
        assert_eq!(resolve_numeric(0x0D, false), '\n');
        assert_eq!(resolve_numeric(0x09, false), '\t');
    }

    #[test]
    fn test_accumulate_overflow_saturates() {
        let mut overflow = false;
        let mut value = 0;
        for digit in [1, 1, 1, 4, 1, 1, 2] {
            value = accumulate(value, digit, 10, &mut overflow);
        }
        assert_eq!(value, MAX_CODEPOINT);
        assert!(overflow);
    }
}
