//! RINEX line rendering helpers
const HEADER_BODY_WIDTH: usize = 60;

/// Pads the body to 60 columns and appends the header record tag
pub(crate) fn fmt_rinex(content: &str, marker: &str) -> String {
    let content = content.get(..HEADER_BODY_WIDTH).unwrap_or(content);
    format!("{:<60}{}", content, marker)
}

/// COMMENT record rendering, splitting oversized bodies over
/// several lines
pub(crate) fn fmt_comment(content: &str) -> String {
    let mut string = String::new();
    let mut rem = content;
    loop {
        let take = rem.len().min(HEADER_BODY_WIDTH);
        string.push_str(&fmt_rinex(&rem[..take], "COMMENT"));
        rem = &rem[take..];
        if rem.is_empty() {
            return string;
        }
        string.push('\n');
    }
}

/// Fixed width scientific notation with a `0.xxx` mantissa. V2.10
/// bodies carry the FORTRAN `D` exponent marker, V3.04 navigation
/// bodies an `E`.
pub(crate) fn fmt_exp(value: f64, width: usize, precision: usize, marker: char) -> String {
    if value == 0.0 {
        let zero = format!("0.{}{}+00", "0".repeat(precision), marker);
        return format!("{:>w$}", zero, w = width);
    }
    let mut exponent = value.abs().log10().floor() as i32 + 1;
    let mut mantissa = value / 10.0_f64.powi(exponent);
    // rounding may push the mantissa back up to 1.0
    let scale = 10.0_f64.powi(precision as i32);
    if (mantissa.abs() * scale).round() >= scale {
        mantissa /= 10.0;
        exponent += 1;
    }
    let body = format!("{:.p$}{}{:+03}", mantissa, marker, exponent, p = precision);
    format!("{:>w$}", body, w = width)
}

/// [fmt_exp] with the `D` marker the correction records use
pub(crate) fn fmt_d(value: f64, width: usize, precision: usize) -> String {
    fmt_exp(value, width, precision, 'D')
}
