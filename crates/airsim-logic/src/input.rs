//! Numeric text fields for C0, S and K.
//!
//! The host owns the text boxes; these functions decide what a box may
//! contain and what number it means.

/// Longest text a numeric field accepts.
pub const MAX_FIELD_LEN: usize = 10;

/// Whether `ch` may be appended to a field currently holding `current`.
///
/// Digits are always allowed, a single `.` anywhere, and `-` only as the
/// first character.
pub fn accepts_char(current: &str, ch: char) -> bool {
    if current.len() >= MAX_FIELD_LEN {
        return false;
    }
    match ch {
        '0'..='9' => true,
        '.' => !current.contains('.'),
        '-' => current.is_empty(),
        _ => false,
    }
}

/// Numeric value of a field. Empty, sign-only and unparseable text is 0.
pub fn parse_numeric(text: &str) -> f32 {
    let text = text.trim();
    match text {
        "" | "-" | "." | "-." => 0.0,
        _ => text
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
    }
}

/// Fixed-precision label text, e.g. `format_fixed(3.14159, 2) == "3.14"`.
pub fn format_fixed(value: f32, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// Initial-concentration field: value clamped to ≥ 0, plus the text to
/// write back into the field when the value had to be corrected.
pub fn sanitize_initial_concentration(text: &str) -> (f32, Option<String>) {
    let value = parse_numeric(text);
    if value < 0.0 {
        (0.0, Some(format_fixed(0.0, 1)))
    } else {
        (value, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_digits_and_one_point() {
        assert!(accepts_char("", '4'));
        assert!(accepts_char("4", '.'));
        assert!(!accepts_char("4.2", '.'));
        assert!(!accepts_char("4", 'e'));
    }

    #[test]
    fn test_minus_only_first() {
        assert!(accepts_char("", '-'));
        assert!(!accepts_char("3", '-'));
    }

    #[test]
    fn test_length_cap() {
        assert!(!accepts_char("1234567890", '1'));
    }

    #[test]
    fn test_parse_degenerate_text() {
        for text in ["", "-", ".", "-.", "abc", "1e40"] {
            assert_eq!(parse_numeric(text), 0.0, "{:?}", text);
        }
        assert_eq!(parse_numeric("12.5"), 12.5);
        assert_eq!(parse_numeric("-3"), -3.0);
        assert_eq!(parse_numeric(".5"), 0.5);
    }

    #[test]
    fn test_sanitize_negative_c0() {
        assert_eq!(
            sanitize_initial_concentration("-20"),
            (0.0, Some("0.0".to_string()))
        );
        assert_eq!(sanitize_initial_concentration(""), (0.0, None));
        assert_eq!(sanitize_initial_concentration("80"), (80.0, None));
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(36.787_94, 2), "36.79");
        assert_eq!(format_fixed(12.0, 0), "12");
        assert_eq!(format_fixed(0.005, 3), "0.005");
    }
}
