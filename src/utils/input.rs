//! Parsing of user-entered numbers.

use crate::{Error, Result};

/// Parse a strictly positive number such as a size in MB or a bitrate.
///
/// Unlike a lenient parse, junk input is rejected instead of becoming zero.
pub fn parse_positive(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| Error::ParseFailure(format!("'{}' as a number", trimmed)))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(Error::ParseFailure(format!(
            "'{}': must be greater than zero",
            trimmed
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("10").unwrap(), 10.0);
        assert_eq!(parse_positive(" 7.5 ").unwrap(), 7.5);
    }

    #[test]
    fn test_parse_positive_rejects_junk() {
        for text in ["", "abc", "0", "-3", "inf", "NaN"] {
            assert!(
                matches!(parse_positive(text), Err(Error::ParseFailure(_))),
                "{} should be rejected",
                text
            );
        }
    }
}
