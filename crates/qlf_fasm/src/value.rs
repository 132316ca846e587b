//! FASM value literals: plain decimal or Verilog-style `[width]'(h|b|d|o)digits`.

use qlf_common::BitValue;

/// Widest value or bit range accepted: two RAM blocks of 9216 bits.
pub const MAX_VALUE_WIDTH: u32 = 2 * 9216;

/// Parses a FASM value literal.
///
/// `_` separators are allowed anywhere among the digits. A sized literal
/// takes its declared width; an unsized one takes the width of its digits
/// (or the minimal width, for decimal).
///
/// # Errors
///
/// Returns a message describing the first problem found.
pub fn parse_value(text: &str) -> Result<BitValue, String> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();

    let Some((width, based)) = cleaned.split_once('\'') else {
        return BitValue::from_decimal_str(&cleaned)
            .ok_or_else(|| format!("invalid number '{text}'"));
    };

    let width = if width.is_empty() {
        None
    } else {
        match width.parse::<u32>() {
            Ok(w) if w > MAX_VALUE_WIDTH => {
                return Err(format!("width {w} in '{text}' exceeds {MAX_VALUE_WIDTH} bits"))
            }
            Ok(w) if w > 0 => Some(w),
            _ => return Err(format!("invalid width in '{text}'")),
        }
    };

    let mut chars = based.chars();
    let base = chars.next().map(|c| c.to_ascii_lowercase());
    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(format!("missing digits in '{text}'"));
    }
    let value = match base {
        Some('h') => BitValue::from_hex_str(digits),
        Some('b') => BitValue::from_binary_str(digits),
        Some('o') => BitValue::from_octal_str(digits),
        Some('d') => BitValue::from_decimal_str(digits),
        _ => return Err(format!("invalid base in '{text}': expected h, b, d or o")),
    }
    .ok_or_else(|| format!("invalid digits in '{text}'"))?;

    match width {
        Some(width) if value.significant_bits() > width => Err(format!(
            "value '{text}' does not fit in {width} bits"
        )),
        Some(width) => Ok(value.resized(width)),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal() {
        let v = parse_value("10").unwrap();
        assert_eq!(v.to_u64(), Some(10));
        assert_eq!(v.width(), 4);
    }

    #[test]
    fn sized_hex() {
        let v = parse_value("8'hA5").unwrap();
        assert_eq!(v.width(), 8);
        assert_eq!(v.to_u64(), Some(0xA5));
    }

    #[test]
    fn sized_binary_zero_extends() {
        let v = parse_value("6'b101").unwrap();
        assert_eq!(v.width(), 6);
        assert_eq!(v.to_u64(), Some(0b101));
    }

    #[test]
    fn uppercase_base() {
        assert_eq!(parse_value("4'HF").unwrap().to_u64(), Some(0xF));
        assert_eq!(parse_value("3'O7").unwrap().to_u64(), Some(7));
    }

    #[test]
    fn sized_decimal() {
        let v = parse_value("16'd300").unwrap();
        assert_eq!(v.width(), 16);
        assert_eq!(v.to_u64(), Some(300));
    }

    #[test]
    fn unsized_based() {
        let v = parse_value("'hff").unwrap();
        assert_eq!(v.width(), 8);
        assert_eq!(v.to_u64(), Some(0xFF));
    }

    #[test]
    fn underscores_ignored() {
        assert_eq!(parse_value("16'hde_ad").unwrap().to_u64(), Some(0xDEAD));
        assert_eq!(parse_value("1_000").unwrap().to_u64(), Some(1000));
    }

    #[test]
    fn leading_zero_digits_beyond_width_fit() {
        let v = parse_value("4'h0f").unwrap();
        assert_eq!(v.width(), 4);
        assert_eq!(v.to_u64(), Some(0xF));
    }

    #[test]
    fn oversized_width_rejected() {
        let err = parse_value("4000000000'h1").unwrap_err();
        assert!(err.contains("exceeds 18432 bits"), "{err}");
        assert_eq!(parse_value("18432'h1").unwrap().width(), 18432);
    }

    #[test]
    fn overflowing_width_rejected() {
        let err = parse_value("4'h1f").unwrap_err();
        assert_eq!(err, "value '4'h1f' does not fit in 4 bits");
    }

    #[test]
    fn wide_hex() {
        let digits = "f".repeat(2304);
        let v = parse_value(&format!("9216'h{digits}")).unwrap();
        assert_eq!(v.width(), 9216);
        assert_eq!(v.significant_bits(), 9216);
    }

    #[test]
    fn errors() {
        assert!(parse_value("").is_err());
        assert!(parse_value("abc").is_err());
        assert!(parse_value("4'").is_err());
        assert!(parse_value("4'x1").is_err());
        assert!(parse_value("0'h1").is_err());
        assert!(parse_value("x'h1").is_err());
        assert!(parse_value("4'b102").is_err());
    }
}
