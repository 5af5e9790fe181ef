//! Number parsing for EPE bills.
//!
//! Amounts use `.` as thousands separator and `,` as decimal separator,
//! optionally prefixed with `$` and padded with `*` (`$***1.234,56`).

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an amount such as `1.234,56` or `$***789,00`.
///
/// Strips every `$` and `*`, drops every `.` and turns the first `,` into the
/// decimal point. The longest leading run of digits with at most one point
/// is parsed and anything after it is ignored, so `3.780,00,` reads as
/// 3780.00. Returns `None` when that run holds no digit.
pub fn parse_currency(s: &str) -> Option<Decimal> {
    let stripped: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '*' | '.'))
        .collect();
    let normalized = stripped.replacen(',', ".", 1);

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in normalized.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => break,
        }
        end += c.len_utf8();
    }
    if !seen_digit {
        return None;
    }

    let number = normalized[..end].trim_end_matches('.');
    if number.starts_with('.') {
        Decimal::from_str(&format!("0{}", number)).ok()
    } else {
        Decimal::from_str(number).ok()
    }
}

/// Parse an integer count such as a kWh quantity or number of days.
pub fn parse_count(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

/// Format an amount the way the bills print it (`1.234,56`).
pub fn format_currency(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = digits.split_once('.') else {
        return s;
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}
