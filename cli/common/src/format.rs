//! Formatting for run summaries.

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use kvx_cli_common::format_number;
///
/// assert_eq!(format_number(0), "0");
/// assert_eq!(format_number(999), "999");
/// assert_eq!(format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a per-second rate, or `-` when the elapsed time is zero.
///
/// # Examples
///
/// ```
/// use kvx_cli_common::format_rate;
///
/// assert_eq!(format_rate(5000, 2.0), "2,500/sec");
/// assert_eq!(format_rate(10, 0.0), "-");
/// ```
pub fn format_rate(count: u64, secs: f64) -> String {
    if secs > 0.0 {
        format!("{}/sec", format_number((count as f64 / secs) as u64))
    } else {
        "-".to_string()
    }
}
