//! Lenient text-to-number coercion for form inputs.
//!
//! Form inputs are free text. Numbers are read the way a browser form reads
//! them: leading whitespace is skipped and the longest numeric prefix wins,
//! so `" 8px"` is `8` and `"3.7"` read as an integer is `3`.

/// Parse the leading decimal integer of `input`.
///
/// Returns `None` when no digit follows the optional sign. Values outside
/// the `i64` range saturate.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = split_sign(trimmed);

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for ch in digits.chars() {
        let Some(d) = ch.to_digit(10) else {
            break;
        };
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(d));
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Parse the leading decimal float of `input` (sign, digits, optional
/// fraction, optional exponent).
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

/// Read a whole trimmed string as a number, the way a select box value is
/// promoted before persisting. Blank or non-numeric text yields `None`.
pub fn parse_number(input: &str) -> Option<serde_json::Number> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(int.into());
    }
    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    serde_json::Number::from_f64(float)
}

fn split_sign(input: &str) -> (bool, &str) {
    if let Some(rest) = input.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = input.strip_prefix('+') {
        (false, rest)
    } else {
        (false, input)
    }
}
