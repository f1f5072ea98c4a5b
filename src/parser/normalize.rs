use std::sync::LazyLock;

use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap());
static MULTIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[0-9]+(?:\.[0-9]+)?)\s?(?:x|times)$").unwrap());

/// Clean a metric label. Only whitespace is touched; `+`, `%` and other
/// punctuation in names are kept as-is.
pub fn clean_metric_name(raw: &str) -> String {
    let replaced = raw.replace('\u{a0}', " ");
    WS_RE.replace_all(replaced.trim(), " ").into_owned()
}

/// Normalize a raw table cell into a numeric token, or `""` when the cell
/// holds no usable number.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    if trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("n/a") {
        return String::new();
    }

    let spaced = trimmed.replace('\u{a0}', " ");
    let collapsed = WS_RE.replace_all(&spaced, " ");
    let mut val = collapsed.replace(',', "");

    if let Some(pct) = val.strip_suffix('%') {
        return percent_to_fraction(pct).unwrap_or_default();
    }

    if val.len() >= 2 && val.starts_with('(') && val.ends_with(')') {
        val = format!("-{}", &val[1..val.len() - 1]);
    }

    val = val.replace('+', "");

    let lower = val.to_lowercase();
    if let Some(caps) = MULTIPLE_RE.captures(&lower) {
        return caps[1].to_string();
    }

    if NUMBER_RE.is_match(&val) {
        val
    } else {
        String::new()
    }
}

/// Divide a decimal string by 100 by moving the point, so `"0.35"` gives
/// `"0.0035"` with no binary float rounding on the way.
fn percent_to_fraction(num: &str) -> Option<String> {
    let num = num.trim();
    let num = num.strip_prefix('+').unwrap_or(num);
    if !NUMBER_RE.is_match(num) {
        return None;
    }
    let (negative, digits) = match num.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, num),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));

    let padded = format!("{:0>3}", int);
    let split = padded.len() - 2;
    let int_part = match padded[..split].trim_start_matches('0') {
        "" => "0",
        s => s,
    };
    let frac_part = format!("{}{}", &padded[split..], frac);
    let frac_part = frac_part.trim_end_matches('0');

    let body = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    };
    if negative && body != "0" {
        Some(format!("-{body}"))
    } else {
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentheses_are_negative() {
        assert_eq!(normalize("(123)"), "-123");
        assert_eq!(normalize("(1,234.5)"), "-1234.5");
    }

    #[test]
    fn percent_becomes_fraction() {
        assert_eq!(normalize("16.8%"), "0.168");
        assert_eq!(normalize("5%"), "0.05");
        assert_eq!(normalize("-2.5 %"), "-0.025");
        assert_eq!(normalize("0.35%"), "0.0035");
        assert_eq!(normalize("100%"), "1");
        assert_eq!(normalize("1,234.5%"), "12.345");
        assert_eq!(normalize("abc%"), "");
        assert_eq!(normalize("%"), "");
    }

    #[test]
    fn multiple_suffix_is_stripped() {
        assert_eq!(normalize("2.3x"), "2.3");
        assert_eq!(normalize("1.5 times"), "1.5");
        assert_eq!(normalize("4X"), "4");
    }

    #[test]
    fn empty_markers() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("-"), "");
        assert_eq!(normalize("N/A"), "");
        assert_eq!(normalize("n/a"), "");
        assert_eq!(normalize("\u{a0}"), "");
    }

    #[test]
    fn separators_and_spacing() {
        assert_eq!(normalize("1,234.5"), "1234.5");
        assert_eq!(normalize("2,15,000"), "215000");
        assert_eq!(normalize("\u{a0} 1,234 \u{a0}"), "1234");
        assert_eq!(normalize("+12.4"), "12.4");
    }

    #[test]
    fn garbage_is_dropped() {
        assert_eq!(normalize("Raw PDF"), "");
        assert_eq!(normalize("12 34"), "");
        assert_eq!(normalize("1.2.3"), "");
        assert_eq!(normalize("()"), "");
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        assert_eq!(normalize("\u{967}%"), "");
        assert_eq!(normalize("\u{661}\u{662}\u{663}"), "");
        assert_eq!(normalize("(\u{967}\u{968})"), "");
        assert_eq!(normalize("\u{967}x"), "");
        assert_eq!(normalize("1\u{967}.5%"), "");
    }

    #[test]
    fn idempotent_on_clean_output() {
        for raw in ["(123)", "16.8%", "2.3x", "1,234.5", "0.05", "-7", "42", "-0%"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn metric_names_keep_punctuation() {
        assert_eq!(clean_metric_name("  Sales\u{a0}+ "), "Sales +");
        assert_eq!(clean_metric_name("Net Profit   + Other\nIncome"), "Net Profit + Other Income");
        assert_eq!(clean_metric_name("OPM %"), "OPM %");
    }
}
