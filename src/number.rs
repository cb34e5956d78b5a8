//! Conversions between stack tokens and numbers.
//!
//! Every value on the stack is text, so each numeric operator reads its
//! operands with [`parse_float`] (or [`parse_int`] for base conversions) and
//! writes its result back with [`format_number`]. Parsing is permissive: a
//! token that is not a number becomes NaN and the NaN flows through any later
//! arithmetic rather than stopping evaluation.

/// Reads the longest decimal prefix of `token`.
///
/// Leading whitespace and a sign are accepted, `Infinity` is recognised, and
/// trailing garbage is ignored (`"12abc"` reads as 12). A token with no digits
/// in front reads as NaN.
pub fn parse_float(token: &str) -> f64 {
    let (sign, rest) = split_sign(token.trim_start());
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let count_digits = |from: usize| bytes[from.min(bytes.len())..].iter()
        .take_while(|byte| byte.is_ascii_digit())
        .count();

    let integer_digits = count_digits(0);
    let mut end = integer_digits;
    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = count_digits(end + 1);
        end += 1 + fraction_digits;
    }
    if integer_digits + fraction_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = count_digits(exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    rest[..end].trim_end_matches('.')
        .parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

/// Reads the longest run of `radix` digits at the front of `token`.
///
/// Hexadecimal input may carry a `0x` prefix. Fractions are not supported;
/// reading stops at the first character that is not a digit.
pub fn parse_int(token: &str, radix: u32) -> f64 {
    let (sign, mut rest) = split_sign(token.trim_start());
    if radix == 16 {
        if let Some(stripped) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = stripped;
        }
    }

    let mut value = None;
    for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
        value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
    }

    value.map_or(f64::NAN, |value| sign * value)
}

fn split_sign(token: &str) -> (f64, &str) {
    match token.as_bytes().first() {
        Some(b'-') => (-1.0, &token[1..]),
        Some(b'+') => (1.0, &token[1..]),
        _ => (1.0, token),
    }
}

/// Renders a number the way results are shown on the stack.
///
/// Integral values have no fraction, very large and very small magnitudes use
/// exponent notation with an explicit sign (`1e+21`, `1e-7`).
pub fn format_number(value: f64) -> String {
    if let Some(special) = format_special(value) {
        return special;
    }
    if value == 0.0 {
        return "0".to_owned();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
            _ => formatted,
        };
    }

    value.to_string()
}

/// Renders a number in base 2, 8 or 16, including any fractional part.
pub fn format_radix(value: f64, radix: u32) -> String {
    if radix == 10 {
        return format_number(value);
    }
    if let Some(special) = format_special(value) {
        return special;
    }

    let base = f64::from(radix);
    let magnitude = value.abs();
    let mut integer = magnitude.trunc();
    let mut fraction = magnitude - integer;

    let mut digits = vec![];
    loop {
        digits.push(radix_digit((integer % base) as u32, radix));
        integer = (integer / base).trunc();
        if integer < 1.0 { break; }
    }
    if value < 0.0 {
        digits.push('-');
    }
    digits.reverse();

    if fraction > 0.0 {
        digits.push('.');
        // Power-of-two radices expand a double exactly, so this ends well
        // before the cap.
        for _ in 0..1100 {
            fraction *= base;
            let digit = fraction.trunc();
            digits.push(radix_digit(digit as u32, radix));
            fraction -= digit;
            if fraction == 0.0 { break; }
        }
    }

    digits.into_iter().collect()
}

fn radix_digit(digit: u32, radix: u32) -> char {
    char::from_digit(digit, radix).unwrap_or('?')
}

fn format_special(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("NaN".to_owned())
    } else if value == f64::INFINITY {
        Some("Infinity".to_owned())
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity".to_owned())
    } else {
        None
    }
}

/// Wraps a number to a two's-complement 32-bit integer.
///
/// All bitwise operators work on this representation. NaN and the infinities
/// become 0.
pub fn to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

/// Rounds to the nearest integer, halves toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}
