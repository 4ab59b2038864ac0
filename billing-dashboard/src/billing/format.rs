use time::{format_description::FormatItem, macros::format_description, Date};

const LABEL_DATE: &[FormatItem<'static>] = format_description!("[day] [month repr:short] [year]");

/// Fixed two-decimal rendering; never prints `-0.00`.
pub fn format_fixed(value: f64) -> String {
    let s = format!("{value:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

pub fn format_money(currency_label: &str, value: f64) -> String {
    format!("{currency_label} {}", format_fixed(value))
}

/// `01 Mar 2024`
pub fn format_label_date(date: Date) -> String {
    date.format(LABEL_DATE).unwrap_or_else(|_| date.to_string())
}

/// Lenient number parsing for form inputs: the longest numeric prefix is
/// used, anything unparseable reads as 0.
pub fn parse_amount(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
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

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
