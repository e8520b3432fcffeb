use std::time::Duration;

/// Parses a compact duration such as `90s`, `12h` or `1d6h`.
///
/// Each component is a run of digits followed by one of `s`, `m`, `h` or
/// `d`. Returns `None` for malformed input or on overflow.
///
/// ```
/// use std::time::Duration;
/// use nyx_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    let mut chars = input.trim().chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }
        if digits.is_empty() {
            return None;
        }

        let value: u64 = digits.parse().ok()?;
        let unit = match chars.next()? {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return None,
        };

        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    Some(Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("3h"), Some(Duration::from_secs(3 * 3600)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(
            parse_duration("1d2h3m4s"),
            Some(Duration::from_secs(86_400 + 7200 + 180 + 4))
        );
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("10w"), None);
        assert_eq!(parse_duration("99999999999999999999999d"), None);
    }

    #[test]
    fn test_parse_duration_empty_is_zero() {
        assert_eq!(parse_duration(""), Some(Duration::ZERO));
    }
}
